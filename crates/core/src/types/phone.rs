//! Brazilian mobile phone number type.

use core::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Brazilian mobile number: optional `+55`, area code (optionally in
/// parentheses or with a trunk `0`), then eight digits or a nine-digit
/// mobile number starting with 9. Single spaces and a dash are tolerated.
static BR_MOBILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:\+?55 ?[1-9]{2} ?|\+?55 ?\([1-9]{2}\) ?|0[1-9]{2} ?|\([1-9]{2}\) ?|[1-9]{2} ?)(?:\d{4}-?\d{4}|9[1-9]\d{3}-?\d{4})$",
    )
    .expect("Invalid regex")
});

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("phone must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// Not a Brazilian mobile number.
    #[error("phone is not a valid Brazilian mobile number")]
    InvalidFormat,
}

/// A Brazilian mobile phone number, stored as entered (trimmed).
///
/// ```
/// use gestao_vendas_core::Phone;
///
/// assert!(Phone::parse("(11) 98765-4321").is_ok());
/// assert!(Phone::parse("+55 21 99876-5432").is_ok());
/// assert!(Phone::parse("12345").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Maximum stored length.
    pub const MAX_LENGTH: usize = 20;

    /// Parse a phone number.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, longer than
    /// [`Self::MAX_LENGTH`], or not a Brazilian mobile number.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let s = s.trim();

        if s.is_empty() {
            return Err(PhoneError::Empty);
        }

        if s.chars().count() > Self::MAX_LENGTH {
            return Err(PhoneError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if !BR_MOBILE_RE.is_match(s) {
            return Err(PhoneError::InvalidFormat);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the phone number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Phone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
