//! Slide id type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// A validated slide identifier.
///
/// Slide ids are opaque, server-assigned keys. Hosted stores issue UUIDs;
/// local archives accept any filesystem-safe key, so the format is kept
/// deliberately loose.
///
/// # Example
///
/// ```
/// use micrarium_core::SlideId;
///
/// let id = SlideId::new("8d6f1c2e-4b0a-4f64-9a11-2f6a7c90d3aa").unwrap();
/// assert_eq!(id.as_str(), "8d6f1c2e-4b0a-4f64-9a11-2f6a7c90d3aa");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlideId(String);

impl SlideId {
    /// Create a new slide id from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid slide id.
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    /// Returns the slide id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> Result<(), Error> {
        // Slide id rules:
        // - 1-64 characters
        // - Can contain: a-z, A-Z, 0-9, ., -, _
        // - Cannot be "." or ".." (ids double as archive file names)

        if s.is_empty() {
            return Err(InvalidInputError::SlideId {
                value: s.to_string(),
                reason: "cannot be empty".to_string(),
            }
            .into());
        }

        if s.len() > 64 {
            return Err(InvalidInputError::SlideId {
                value: s.to_string(),
                reason: "exceeds maximum length of 64 characters".to_string(),
            }
            .into());
        }

        if s == "." || s == ".." {
            return Err(InvalidInputError::SlideId {
                value: s.to_string(),
                reason: "cannot be '.' or '..'".to_string(),
            }
            .into());
        }

        for c in s.chars() {
            if !c.is_ascii_alphanumeric() && c != '.' && c != '-' && c != '_' {
                return Err(InvalidInputError::SlideId {
                    value: s.to_string(),
                    reason: format!("contains invalid character '{}'", c),
                }
                .into());
            }
        }

        Ok(())
    }
}

impl fmt::Display for SlideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SlideId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SlideId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<SlideId> for String {
    fn from(id: SlideId) -> Self {
        id.0
    }
}

impl AsRef<str> for SlideId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
