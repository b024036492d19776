//! Confession submission form
//!
//! Holds raw input, offers live verification feedback, and builds the
//! insert payload. Verification is always recomputed from the submitted
//! target name, never taken from an earlier preview.

use confess_common::{spotify, Confession, Error, NewConfession, Result};
use confess_common::{Verification, VerificationCodes};
use tracing::{error, info};

use crate::gateway::ConfessionGateway;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfessionForm {
    pub target_name: String,
    pub message: String,
    /// Optional Spotify link
    pub song_url: String,
}

impl ConfessionForm {
    pub fn new(
        target_name: impl Into<String>,
        message: impl Into<String>,
        song_url: impl Into<String>,
    ) -> Self {
        Self {
            target_name: target_name.into(),
            message: message.into(),
            song_url: song_url.into(),
        }
    }

    /// Live verification feedback for the current target-name input
    pub fn verification_preview(&self, codes: &VerificationCodes) -> Verification {
        codes.parse(&self.target_name)
    }

    /// Whether the submit action should be enabled
    pub fn is_submittable(&self) -> bool {
        !self.target_name.trim().is_empty() && !self.message.trim().is_empty()
    }

    /// Check required fields and resolve verification
    pub fn validate(&self, codes: &VerificationCodes) -> Result<Verification> {
        if self.target_name.trim().is_empty() {
            return Err(Error::Validation("Recipient name is required".to_string()));
        }
        if self.message.trim().is_empty() {
            return Err(Error::Validation("Message is required".to_string()));
        }

        let verification = codes.parse(&self.target_name);
        if verification.target_name.is_empty() {
            return Err(Error::Validation(
                "Recipient name is required after the code".to_string(),
            ));
        }
        Ok(verification)
    }

    /// Build the insert payload from the current input
    pub fn build(&self, codes: &VerificationCodes) -> Result<NewConfession> {
        let verification = self.validate(codes)?;

        let song_url = Some(self.song_url.trim())
            .filter(|url| !url.is_empty())
            .map(str::to_string);
        let song_embed_id = song_url.as_deref().and_then(spotify::extract_embed_id);

        Ok(NewConfession {
            target_name: verification.target_name,
            message: self.message.trim().to_string(),
            song_url,
            song_embed_id,
            is_approved: true,
            is_verified: verification.verified,
            dev_code: verification.verified.then_some(verification.code),
        })
    }

    /// Validate, insert, and clear the form on success
    ///
    /// Validation failures never reach the gateway. On a remote failure
    /// the input is kept so the user can try again.
    pub async fn submit<G: ConfessionGateway>(
        &mut self,
        gateway: &G,
        codes: &VerificationCodes,
    ) -> Result<Confession> {
        let record = self.build(codes)?;

        match gateway.create(record).await {
            Ok(confession) => {
                info!(
                    id = %confession.id,
                    verified = confession.is_verified,
                    "Confession submitted"
                );
                self.clear();
                Ok(confession)
            }
            Err(e) => {
                error!(error = %e, "Error submitting confession");
                Err(e)
            }
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_fields_fail_validation() {
        let codes = VerificationCodes::default();

        let form = ConfessionForm::new("   ", "hello", "");
        assert!(!form.is_submittable());
        assert!(matches!(form.validate(&codes), Err(Error::Validation(_))));

        let form = ConfessionForm::new("Alex", " \n ", "");
        assert!(matches!(form.build(&codes), Err(Error::Validation(_))));
    }

    #[test]
    fn test_code_only_name_is_rejected() {
        let codes = VerificationCodes::default();
        let form = ConfessionForm::new("{LOVECODE2024}", "hello", "");
        assert!(form.is_submittable());
        assert!(matches!(form.build(&codes), Err(Error::Validation(_))));
    }

    #[test]
    fn test_build_plain_payload() {
        let codes = VerificationCodes::default();
        let form = ConfessionForm::new("  Alex ", "  miss you  ", "  ");

        let payload = form.build(&codes).expect("valid form");
        assert_eq!(
            payload,
            NewConfession {
                target_name: "Alex".to_string(),
                message: "miss you".to_string(),
                song_url: None,
                song_embed_id: None,
                is_approved: true,
                is_verified: false,
                dev_code: None,
            }
        );
    }

    #[test]
    fn test_build_verified_payload_with_song() {
        let codes = VerificationCodes::default();
        let form = ConfessionForm::new(
            "{lovecode2024} Alex",
            "this one is for you",
            "https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC?si=x",
        );

        let payload = form.build(&codes).expect("valid form");
        assert_eq!(payload.target_name, "Alex");
        assert!(payload.is_verified);
        assert_eq!(payload.dev_code.as_deref(), Some("LOVECODE2024"));
        assert_eq!(payload.song_embed_id.as_deref(), Some("4uLU6hMCjMI75M1A2tKUQC"));
        assert!(payload.song_url.is_some());
    }

    #[test]
    fn test_non_spotify_link_is_kept_without_embed() {
        let codes = VerificationCodes::default();
        let form = ConfessionForm::new("Alex", "hi", "https://example.com/song");
        let payload = form.build(&codes).expect("valid form");
        assert_eq!(payload.song_url.as_deref(), Some("https://example.com/song"));
        assert_eq!(payload.song_embed_id, None);
    }

    #[test]
    fn test_invalid_code_kept_verbatim() {
        let codes = VerificationCodes::default();
        let form = ConfessionForm::new("{BADCODE} Alex", "hi", "");

        let preview = form.verification_preview(&codes);
        assert!(!preview.verified);

        let payload = form.build(&codes).expect("valid form");
        assert_eq!(payload.target_name, "{BADCODE} Alex");
        assert!(!payload.is_verified);
        assert_eq!(payload.dev_code, None);
    }
}
