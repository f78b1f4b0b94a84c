//! Validated primitive types shared across the clinic crates.
//!
//! Values arriving from the CLI, the REST surface or form input are wrapped once at the boundary
//! so downstream code can assume they are well-formed.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, thiserror::Error)]
pub enum TextError {
    #[error("value is blank")]
    Empty,
}

#[derive(Debug, thiserror::Error)]
pub enum IdError {
    #[error("invalid EMR identifier: '{0}'")]
    Invalid(String),
}

/// Free text that is never blank: usernames, comments, result values.
///
/// Surrounding whitespace is dropped when the value is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyText(String);

impl NonEmptyText {
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        match input.as_ref().trim() {
            "" => Err(TextError::Empty),
            text => Ok(Self(text.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for NonEmptyText {
    type Error = TextError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NonEmptyText> for String {
    fn from(text: NonEmptyText) -> Self {
        text.0
    }
}

/// Identifier of an OpenMRS object (order, concept, patient, location, stock item, ...).
///
/// OpenMRS mostly uses hyphenated RFC 4122 UUIDs, but the concept dictionary also carries legacy
/// 36-character ids such as `5089AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA`, so no UUID layout is
/// enforced. What is guaranteed:
/// - 1 to 64 ASCII characters after trimming
/// - only `0-9`, `a-z`, `A-Z` and `-`
///
/// That makes the value safe to splice into a REST path such as `/order/{uuid}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmrUuid(String);

impl EmrUuid {
    const MAX_LEN: usize = 64;

    /// Validates an externally supplied identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::Invalid`] if the trimmed input is empty, too long, or contains
    /// characters outside `[0-9A-Za-z-]`.
    pub fn parse(input: &str) -> Result<Self, IdError> {
        let trimmed = input.trim();
        if Self::is_valid(trimmed) {
            return Ok(Self(trimmed.to_owned()));
        }
        Err(IdError::Invalid(input.to_owned()))
    }

    /// Returns true if `input` (untrimmed) is acceptable as an identifier.
    pub fn is_valid(input: &str) -> bool {
        !input.is_empty()
            && input.len() <= Self::MAX_LEN
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'-'))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmrUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EmrUuid {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for EmrUuid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EmrUuid {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EmrUuid> for String {
    fn from(id: EmrUuid) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_input() {
        let text = NonEmptyText::new("  haemoglobin  ").expect("valid text");
        assert_eq!(text.as_str(), "haemoglobin");
        let json: NonEmptyText = serde_json::from_str("\" high \"").expect("valid json");
        assert_eq!(json.to_string(), "high");
    }

    #[test]
    fn non_empty_text_rejects_whitespace() {
        assert!(matches!(NonEmptyText::new(" \t\n"), Err(TextError::Empty)));
        assert!(serde_json::from_str::<NonEmptyText>("\"  \"").is_err());
    }

    #[test]
    fn emr_uuid_accepts_rfc_and_legacy_concept_ids() {
        let rfc = EmrUuid::parse("52a447d3-a64a-11e3-9aeb-50e549534c5e").expect("rfc uuid");
        assert_eq!(rfc.to_string(), "52a447d3-a64a-11e3-9aeb-50e549534c5e");

        let legacy = EmrUuid::parse("5089AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA").expect("legacy id");
        assert_eq!(legacy.as_str(), "5089AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA");
    }

    #[test]
    fn emr_uuid_rejects_path_characters() {
        for bad in ["", "   ", "../order", "abc/def", "abc?v=full", "abc def"] {
            assert!(EmrUuid::parse(bad).is_err(), "{bad:?} should be rejected");
        }
        assert!(EmrUuid::parse(&"a".repeat(65)).is_err());
    }

    #[test]
    fn emr_uuid_deserialize_validates() {
        let ok: EmrUuid = serde_json::from_str("\"abc-123\"").expect("valid id");
        assert_eq!(ok.as_str(), "abc-123");
        assert!(serde_json::from_str::<EmrUuid>("\"a/b\"").is_err());
    }
}
