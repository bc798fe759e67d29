//! Soulmark verification tokens.
//!
//! A soulmark is an opaque per-transaction token issued by the payment side.
//! Only a masked excerpt may ever leave the system (confirmation emails, logs).

use core::fmt;

use serde::{Deserialize, Serialize};

/// Placeholder shown when no soulmark is available.
pub const MISSING_SOULMARK: &str = "N/A";

/// Tokens shorter than this are shown verbatim.
const MASK_MIN_LEN: usize = 10;
const MASK_PREFIX_LEN: usize = 6;
const MASK_SUFFIX_LEN: usize = 4;
const MASK_ELLIPSIS: char = '…';

/// Errors that can occur when parsing a [`Soulmark`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SoulmarkError {
    /// The token is empty or only whitespace.
    #[error("soulmark cannot be empty")]
    Empty,
}

/// An opaque soulmark verification token.
///
/// `Debug` and `Display` both print the masked form; use
/// [`Soulmark::expose`] when the full token is genuinely needed (persisting
/// it in the registry).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Soulmark(String);

impl Soulmark {
    /// Parse a soulmark, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`SoulmarkError::Empty`] if nothing remains after trimming.
    pub fn parse(s: &str) -> Result<Self, SoulmarkError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SoulmarkError::Empty);
        }
        Ok(Self(s.to_owned()))
    }

    /// The full token.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// The display-safe excerpt of this token.
    #[must_use]
    pub fn masked(&self) -> String {
        mask_soulmark(Some(&self.0))
    }
}

impl fmt::Debug for Soulmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Soulmark").field(&self.masked()).finish()
    }
}

impl fmt::Display for Soulmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

/// Mask a soulmark for display.
///
/// - absent or empty: `"N/A"`
/// - fewer than 10 characters: returned verbatim
/// - otherwise: first 6 characters, `…`, last 4 characters
///
/// Lengths are counted in characters, not bytes.
#[must_use]
pub fn mask_soulmark(soulmark: Option<&str>) -> String {
    let Some(token) = soulmark.filter(|s| !s.is_empty()) else {
        return MISSING_SOULMARK.to_string();
    };

    let len = token.chars().count();
    if len < MASK_MIN_LEN {
        return token.to_string();
    }

    let prefix: String = token.chars().take(MASK_PREFIX_LEN).collect();
    let suffix: String = token.chars().skip(len - MASK_SUFFIX_LEN).collect();
    format!("{prefix}{MASK_ELLIPSIS}{suffix}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_long_token() {
        assert_eq!(mask_soulmark(Some("ABCDEFGHIJKLMNOP")), "ABCDEF…MNOP");
    }

    #[test]
    fn test_mask_short_token_verbatim() {
        assert_eq!(mask_soulmark(Some("short")), "short");
        assert_eq!(mask_soulmark(Some("123456789")), "123456789");
    }

    #[test]
    fn test_mask_boundary_ten_chars() {
        assert_eq!(mask_soulmark(Some("0123456789")), "012345…6789");
    }

    #[test]
    fn test_mask_missing() {
        assert_eq!(mask_soulmark(None), "N/A");
        assert_eq!(mask_soulmark(Some("")), "N/A");
    }

    #[test]
    fn test_mask_counts_characters() {
        // 12 characters, several of them multi-byte
        let token = "ééééééABCDEF";
        assert_eq!(mask_soulmark(Some(token)), "éééééé…CDEF");
    }

    #[test]
    fn test_parse_rejects_blank() {
        assert_eq!(Soulmark::parse("  "), Err(SoulmarkError::Empty));
    }

    #[test]
    fn test_debug_and_display_are_masked() {
        let soulmark = Soulmark::parse("SM1234567890").unwrap();
        assert_eq!(soulmark.to_string(), "SM1234…7890");
        let debug = format!("{soulmark:?}");
        assert!(!debug.contains("SM1234567890"));
        assert_eq!(soulmark.expose(), "SM1234567890");
    }
}
