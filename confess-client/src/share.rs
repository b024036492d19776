//! Permalinks and share text

use confess_common::Confession;

/// Characters of the message included in share text
pub const SHARE_EXCERPT_CHARS: usize = 100;

/// `<site>/confession/<slug>`
pub fn permalink(site_url: &str, slug: &str) -> String {
    format!("{}/confession/{}", site_url.trim_end_matches('/'), slug)
}

/// Payload handed to a share sheet or copied to the clipboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub url: String,
}

impl SharePayload {
    pub fn for_confession(confession: &Confession, site_url: &str) -> Self {
        let excerpt: String = confession.message.chars().take(SHARE_EXCERPT_CHARS).collect();
        Self {
            title: format!("Confess untuk {}", confession.target_name),
            text: format!("{}...", excerpt),
            url: permalink(site_url, &confession.unique_slug),
        }
    }
}
