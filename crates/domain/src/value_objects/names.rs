//! Validated element name newtype
//!
//! An element name is the primary key of an element within a session:
//! - Non-empty after trimming
//! - At most 100 characters
//! - Case-sensitive ("Fire" and "fire" are different elements)

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Maximum length for element names
const MAX_ELEMENT_NAME_LENGTH: usize = 100;

/// A validated element name (non-empty, <=100 chars, trimmed)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ElementName(String);

impl ElementName {
    /// Create a new validated element name.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if:
    /// - The name is empty after trimming
    /// - The name exceeds 100 characters after trimming
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("Element name cannot be empty"));
        }
        if trimmed.chars().count() > MAX_ELEMENT_NAME_LENGTH {
            return Err(DomainError::validation(format!(
                "Element name cannot exceed {} characters",
                MAX_ELEMENT_NAME_LENGTH
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Interpret a generated proposal.
    ///
    /// Blank text means "these elements do not react" and yields `Ok(None)`.
    pub fn from_proposal(raw: &str) -> Result<Option<Self>, DomainError> {
        if raw.trim().is_empty() {
            return Ok(None);
        }
        Self::new(raw).map(Some)
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ElementName {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<&str> for ElementName {
    type Error = DomainError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ElementName> for String {
    fn from(name: ElementName) -> String {
        name.0
    }
}

impl AsRef<str> for ElementName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
