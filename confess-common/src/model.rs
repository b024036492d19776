//! Confession record model
//!
//! Field names match the `confessions` table columns so records
//! round-trip through the hosted REST service without renaming.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::spotify;

/// A published (or admin-visible) confession
///
/// Immutable after creation except for `views`, `like_count`, and deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Confession {
    /// Server-assigned unique id
    pub id: Uuid,
    /// Recipient name as displayed ("To ...")
    pub target_name: String,
    /// Message body
    pub message: String,
    /// Raw song link entered by the author
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub song_url: Option<String>,
    /// Spotify track id derived from `song_url`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub song_embed_id: Option<String>,
    #[serde(default = "default_approved", deserialize_with = "bool_or_null")]
    pub is_approved: bool,
    /// Set once at submission when a valid code was embedded
    #[serde(default, deserialize_with = "bool_or_null")]
    pub is_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_code: Option<String>,
    /// Server-assigned creation time
    pub created_at: DateTime<Utc>,
    /// Permalink slug, globally unique
    pub unique_slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub like_count: Option<i64>,
    /// Client-observed; not authoritative
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_has_liked: Option<bool>,
}

impl Confession {
    /// Whether a song link was attached (admin "With Song" badge)
    pub fn has_song(&self) -> bool {
        self.song_url
            .as_deref()
            .map(|url| !url.trim().is_empty())
            .unwrap_or(false)
    }

    /// Embeddable player URL, if the song link resolved to a Spotify track
    pub fn song_embed_url(&self) -> Option<String> {
        self.song_embed_id.as_deref().map(spotify::embed_url)
    }

    /// Case-insensitive substring match on target name or message
    ///
    /// `needle_lower` must already be lowercased.
    pub fn matches(&self, needle_lower: &str) -> bool {
        needle_lower.is_empty()
            || self.target_name.to_lowercase().contains(needle_lower)
            || self.message.to_lowercase().contains(needle_lower)
    }
}

/// Client-assigned fields of a new confession (insert payload)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewConfession {
    pub target_name: String,
    pub message: String,
    pub song_url: Option<String>,
    pub song_embed_id: Option<String>,
    pub is_approved: bool,
    pub is_verified: bool,
    pub dev_code: Option<String>,
}

fn default_approved() -> bool {
    true
}

/// PostgREST returns `null` for unset boolean columns
fn bool_or_null<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Confession {
        Confession {
            id: Uuid::new_v4(),
            target_name: "Alex".to_string(),
            message: "I still think about the rooftop".to_string(),
            song_url: None,
            song_embed_id: None,
            is_approved: true,
            is_verified: false,
            dev_code: None,
            created_at: Utc::now(),
            unique_slug: "alex-3k9d0a1b".to_string(),
            views: None,
            like_count: None,
            user_has_liked: None,
        }
    }

    #[test]
    fn test_deserialize_minimal_row() {
        let row = json!({
            "id": "6f1c1d52-3f7e-4c1f-9a55-0f0c5bde2f10",
            "target_name": "Sam",
            "message": "hi",
            "is_approved": true,
            "is_verified": null,
            "created_at": "2024-02-14T08:30:00.000000+00:00",
            "unique_slug": "sam-aaaa1111",
            "extra_column": 42
        });

        let confession: Confession = serde_json::from_value(row).expect("row should parse");
        assert_eq!(confession.target_name, "Sam");
        assert!(!confession.is_verified);
        assert_eq!(confession.like_count, None);
        assert_eq!(confession.views, None);
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let confession = sample();
        assert!(confession.matches("alex"));
        assert!(confession.matches("rooftop"));
        assert!(confession.matches(""));
        assert!(!confession.matches("basement"));
    }

    #[test]
    fn test_has_song_ignores_blank_url() {
        let mut confession = sample();
        assert!(!confession.has_song());

        confession.song_url = Some("   ".to_string());
        assert!(!confession.has_song());

        confession.song_url = Some("https://open.spotify.com/track/abc".to_string());
        assert!(confession.has_song());
    }

    #[test]
    fn test_song_embed_url() {
        let mut confession = sample();
        confession.song_embed_id = Some("4uLU6hMCjMI75M1A2tKUQC".to_string());
        assert_eq!(
            confession.song_embed_url().as_deref(),
            Some("https://open.spotify.com/embed/track/4uLU6hMCjMI75M1A2tKUQC?utm_source=generator")
        );
    }
}
