//! Permalink slug generation
//!
//! Slugs look like `alex-tan-k3v9q0zd`: a lowercase ASCII stem derived
//! from the target name plus a random suffix. Uniqueness is enforced by
//! the store; callers retry with a fresh suffix on collision.

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Maximum length of the name-derived stem
pub const MAX_STEM_LEN: usize = 24;

/// Length of the random suffix
pub const SUFFIX_LEN: usize = 8;

/// Generate a new slug for a confession addressed to `target_name`
pub fn generate(target_name: &str) -> String {
    let suffix = random_suffix(SUFFIX_LEN);
    let stem = stem(target_name);
    if stem.is_empty() {
        suffix
    } else {
        format!("{}-{}", stem, suffix)
    }
}

/// True if `slug` only contains characters safe in a URL path segment
pub fn is_url_safe(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn stem(target_name: &str) -> String {
    let mut stem = String::with_capacity(MAX_STEM_LEN);
    let mut pending_dash = false;

    for c in target_name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !stem.is_empty() {
                if stem.len() + 1 >= MAX_STEM_LEN {
                    break;
                }
                stem.push('-');
            }
            pending_dash = false;
            if stem.len() >= MAX_STEM_LEN {
                break;
            }
            stem.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    stem
}

fn random_suffix(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect()
}
