//! Signed token encoding and verification.
//!
//! Tokens are HMAC-SHA256 over [`DownloadRequest::canonical_string`],
//! hex-encoded. They are never stored: verification re-derives the expected
//! token from the request and the active signing secret and compares in
//! constant time.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::request::DownloadRequest;

type HmacSha256 = Hmac<Sha256>;

/// Hex length of an HMAC-SHA256 token.
const TOKEN_HEX_LENGTH: usize = 64;

/// Why a token failed verification.
///
/// Internal logging only. Clients see the same deny response for every
/// variant so the failure mode cannot be probed.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// The request's expiry is in the past.
    #[error("token expired")]
    Expired,
    /// The token is not a 64-character hex string.
    #[error("token malformed")]
    Malformed,
    /// The signature does not match the request.
    #[error("token signature mismatch")]
    Mismatch,
}

/// A signed download token.
///
/// Equality against the re-derived token (plus the expiry check) is the
/// sole validity test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignedToken(String);

impl SignedToken {
    /// Parse a token from its wire form.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Malformed`] unless the input is exactly 64
    /// lowercase hex characters.
    pub fn parse(s: &str) -> Result<Self, TokenError> {
        if s.len() != TOKEN_HEX_LENGTH {
            return Err(TokenError::Malformed);
        }
        if !s.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()) {
            return Err(TokenError::Malformed);
        }
        Ok(Self(s.to_owned()))
    }

    /// The token as it appears in a URL.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SignedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sign a download request with the active secret.
///
/// Deterministic and side-effect free: equal requests under the same secret
/// always yield the same token.
#[must_use]
pub fn encode(request: &DownloadRequest, secret: &[u8]) -> SignedToken {
    let mut mac =
        HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(request.canonical_string().as_bytes());
    SignedToken(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a token against a request, with a reason code for logging.
///
/// Checks, in order: wire format, expiry against `now`, then the signature
/// in constant time. The expected token is derived before the format check
/// so a malformed token costs the same as a mismatched one, and the
/// comparison never short-circuits on a prefix match, so response timing
/// does not leak how many leading bytes were correct.
///
/// # Errors
///
/// Returns the first failing check as a [`TokenError`].
pub fn check(
    token: &str,
    request: &DownloadRequest,
    secret: &[u8],
    now: DateTime<Utc>,
) -> Result<(), TokenError> {
    let expected = encode(request, secret);

    let token = SignedToken::parse(token)?;

    if now > request.expires_at() {
        return Err(TokenError::Expired);
    }

    if bool::from(expected.0.as_bytes().ct_eq(token.0.as_bytes())) {
        Ok(())
    } else {
        Err(TokenError::Mismatch)
    }
}

/// Verify a token against a request.
///
/// Total function: malformed tokens, expired requests, and signature
/// mismatches all return `false`, never an error.
#[must_use]
pub fn verify(token: &str, request: &DownloadRequest, secret: &[u8], now: DateTime<Utc>) -> bool {
    check(token, request, secret, now).is_ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::types::{Email, FileKey, OrderId, PriceVariantId, ProductId, PurchaseKey};

    const SECRET: &[u8] = b"8fQ2mv0Zr6Lq9Xw1Jd5Tn3Yb7Ck4Ps0A";

    fn request_at(expires_at: DateTime<Utc>) -> DownloadRequest {
        DownloadRequest::new(
            OrderId::new(101),
            Email::parse("buyer@example.com").unwrap(),
            ProductId::new(10),
            Some(PriceVariantId::new(2)),
            FileKey::new(0),
            expires_at,
            PurchaseKey::parse("deadbeefcafe").unwrap(),
            "s4lt",
        )
        .unwrap()
    }

    #[test]
    fn test_roundtrip_before_expiry() {
        let now = Utc::now();
        let request = request_at(now + Duration::hours(1));
        let token = encode(&request, SECRET);

        assert!(verify(token.as_str(), &request, SECRET, now));
        // Valid exactly at the expiry instant.
        assert!(verify(token.as_str(), &request, SECRET, request.expires_at()));
    }

    #[test]
    fn test_expired_token_rejected() {
        let now = Utc::now();
        let request = request_at(now - Duration::seconds(1));
        let token = encode(&request, SECRET);

        assert_eq!(
            check(token.as_str(), &request, SECRET, now),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let now = Utc::now();
        let request = request_at(now + Duration::hours(1));
        let token = encode(&request, b"a-completely-different-secret-00");

        assert_eq!(
            check(token.as_str(), &request, SECRET, now),
            Err(TokenError::Mismatch)
        );
    }

    #[test]
    fn test_any_field_change_invalidates() {
        let now = Utc::now();
        let expires = now + Duration::hours(1);
        let original = request_at(expires);
        let token = encode(&original, SECRET);

        let email = Email::parse("buyer@example.com").unwrap();
        let key = PurchaseKey::parse("deadbeefcafe").unwrap();

        let mutations = [
            // order id
            DownloadRequest::new(
                OrderId::new(102),
                email.clone(),
                ProductId::new(10),
                Some(PriceVariantId::new(2)),
                FileKey::new(0),
                expires,
                key.clone(),
                "s4lt",
            ),
            // product id
            DownloadRequest::new(
                OrderId::new(101),
                email.clone(),
                ProductId::new(11),
                Some(PriceVariantId::new(2)),
                FileKey::new(0),
                expires,
                key.clone(),
                "s4lt",
            ),
            // price variant
            DownloadRequest::new(
                OrderId::new(101),
                email.clone(),
                ProductId::new(10),
                None,
                FileKey::new(0),
                expires,
                key.clone(),
                "s4lt",
            ),
            // file key
            DownloadRequest::new(
                OrderId::new(101),
                email.clone(),
                ProductId::new(10),
                Some(PriceVariantId::new(2)),
                FileKey::new(1),
                expires,
                key.clone(),
                "s4lt",
            ),
            // expiry
            DownloadRequest::new(
                OrderId::new(101),
                email.clone(),
                ProductId::new(10),
                Some(PriceVariantId::new(2)),
                FileKey::new(0),
                expires + Duration::hours(1),
                key.clone(),
                "s4lt",
            ),
            // nonce
            DownloadRequest::new(
                OrderId::new(101),
                email,
                ProductId::new(10),
                Some(PriceVariantId::new(2)),
                FileKey::new(0),
                expires,
                key,
                "other",
            ),
        ];

        for mutated in mutations {
            let mutated = mutated.unwrap();
            assert_eq!(
                check(token.as_str(), &mutated, SECRET, now),
                Err(TokenError::Mismatch),
                "mutation should invalidate: {}",
                mutated.canonical_string()
            );
        }
    }

    #[test]
    fn test_malformed_tokens_rejected_without_panic() {
        let now = Utc::now();
        let request = request_at(now + Duration::hours(1));

        for bad in [
            "",
            "zz",
            "not-hex-at-all",
            &"a".repeat(63),
            &"a".repeat(65),
            &"G".repeat(64),
            &"A".repeat(64), // uppercase hex is not our wire form
        ] {
            assert_eq!(
                check(bad, &request, SECRET, now),
                Err(TokenError::Malformed),
                "should be malformed: {bad:?}"
            );
            assert!(!verify(bad, &request, SECRET, now));
        }
    }

    #[test]
    fn test_encode_is_deterministic() {
        let request = request_at(Utc::now() + Duration::hours(1));
        assert_eq!(encode(&request, SECRET), encode(&request, SECRET));
    }
}
