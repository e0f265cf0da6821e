//! Purchase key type.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors that can occur when parsing a [`PurchaseKey`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum PurchaseKeyError {
    /// The input string is empty.
    #[error("purchase key cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("purchase key must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains characters outside `[0-9a-zA-Z-]`.
    #[error("purchase key contains invalid characters")]
    InvalidCharacters,
}

/// An opaque per-order key issued at checkout.
///
/// The purchase key appears on receipts and is folded into the signed
/// token's canonical bytes, which ties every download link to one specific
/// checkout. It is not a secret on its own - the HMAC signature is what
/// makes a link unforgeable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PurchaseKey(String);

impl PurchaseKey {
    /// Maximum length of a purchase key.
    pub const MAX_LENGTH: usize = 64;

    /// Generate a fresh random purchase key.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Parse a `PurchaseKey` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, longer than 64 characters,
    /// or contains characters outside `[0-9a-zA-Z-]`.
    pub fn parse(s: &str) -> Result<Self, PurchaseKeyError> {
        if s.is_empty() {
            return Err(PurchaseKeyError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(PurchaseKeyError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if !s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(PurchaseKeyError::InvalidCharacters);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the key as a byte slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for PurchaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PurchaseKey {
    type Err = PurchaseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for PurchaseKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
