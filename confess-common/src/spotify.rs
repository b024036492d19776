//! Spotify link helpers
//!
//! Accepts web links (`https://open.spotify.com/track/<id>?si=...`,
//! including locale prefixes such as `/intl-id/track/<id>`) and URIs
//! (`spotify:track:<id>`).

use once_cell::sync::Lazy;
use regex::Regex;

static TRACK_PATTERNS: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        Regex::new(r"spotify\.com/(?:[A-Za-z-]+/)?track/([A-Za-z0-9]+)").expect("valid regex"),
        Regex::new(r"spotify:track:([A-Za-z0-9]+)").expect("valid regex"),
    ]
});

/// Extract the track id from a Spotify link, if it is one
pub fn extract_embed_id(url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }

    TRACK_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(url))
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}

/// Build the embeddable player URL for a track id
pub fn embed_url(track_id: &str) -> String {
    format!("https://open.spotify.com/embed/track/{}?utm_source=generator", track_id)
}
