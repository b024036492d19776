//! Verification-code parsing for the target-name field
//!
//! A target name may start with a bracketed access code, e.g.
//! `{LOVECODE2024} Alex`. A recognized code marks the confession as
//! verified and is stripped from the name. Unrecognized codes strip
//! nothing: the input is kept verbatim (trimmed) as the name.
//!
//! The allow-list ships with the client, so anyone can read it. A
//! deployment that cares about the badge should check codes server-side.

use std::collections::HashSet;

/// Codes accepted when no configuration overrides them
pub const DEFAULT_VERIFICATION_CODES: &[&str] = &["LOVECODE2024", "DEVACCESS", "CONFESSWORLD"];

/// Result of parsing a raw target-name input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub verified: bool,
    /// Normalized code, empty unless verified
    pub code: String,
    /// Name to persist
    pub target_name: String,
}

impl Verification {
    fn unverified(input: &str) -> Self {
        Self {
            verified: false,
            code: String::new(),
            target_name: input.trim().to_string(),
        }
    }
}

/// Allow-list of verification codes (stored uppercase)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationCodes {
    codes: HashSet<String>,
}

impl VerificationCodes {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let codes = codes
            .into_iter()
            .map(|code| normalize(code.as_ref()))
            .filter(|code| !code.is_empty())
            .collect();
        Self { codes }
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains(&normalize(code))
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Parse a raw target-name input against this allow-list
    ///
    /// Pure; called on every edit for live feedback and once more on the
    /// submitted value.
    pub fn parse(&self, input: &str) -> Verification {
        let trimmed = input.trim();

        let Some(after_open) = trimmed.strip_prefix('{') else {
            return Verification::unverified(trimmed);
        };
        let Some(close) = after_open.find('}') else {
            return Verification::unverified(trimmed);
        };

        let code = normalize(&after_open[..close]);
        if code.is_empty() || !self.codes.contains(&code) {
            return Verification::unverified(trimmed);
        }

        Verification {
            verified: true,
            code,
            target_name: after_open[close + 1..].trim().to_string(),
        }
    }
}

impl Default for VerificationCodes {
    fn default() -> Self {
        Self::new(DEFAULT_VERIFICATION_CODES)
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_uppercase()
}
