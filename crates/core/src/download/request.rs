//! The canonical download request descriptor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Email, FileKey, OrderId, PriceVariantId, ProductId, PurchaseKey};

/// Errors constructing a [`DownloadRequest`].
///
/// Callers verifying a token should collapse these to a plain deny; the
/// variants exist for internal logging only.
#[derive(thiserror::Error, Debug, Clone)]
pub enum DownloadRequestError {
    /// The nonce is longer than [`DownloadRequest::MAX_NONCE_LENGTH`].
    #[error("nonce must be at most {max} characters")]
    NonceTooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The nonce contains characters that would make the canonical byte
    /// string ambiguous.
    #[error("nonce contains invalid characters")]
    NonceInvalidCharacters,
}

/// Everything a signed download URL asserts, in one immutable value.
///
/// The request defines the exact byte string that gets signed: two logically
/// equal requests always produce identical canonical bytes regardless of how
/// they were built, because [`DownloadRequest::canonical_string`] fixes the
/// field order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    order_id: OrderId,
    email: Email,
    product_id: ProductId,
    price_variant_id: Option<PriceVariantId>,
    file_key: FileKey,
    expires_at: DateTime<Utc>,
    purchase_key: PurchaseKey,
    nonce: String,
}

impl DownloadRequest {
    /// Maximum length of the nonce salt.
    pub const MAX_NONCE_LENGTH: usize = 64;

    /// Build a request descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if the nonce is over-long or contains characters
    /// outside `[0-9a-zA-Z_-]`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        order_id: OrderId,
        email: Email,
        product_id: ProductId,
        price_variant_id: Option<PriceVariantId>,
        file_key: FileKey,
        expires_at: DateTime<Utc>,
        purchase_key: PurchaseKey,
        nonce: impl Into<String>,
    ) -> Result<Self, DownloadRequestError> {
        let nonce = nonce.into();

        if nonce.len() > Self::MAX_NONCE_LENGTH {
            return Err(DownloadRequestError::NonceTooLong {
                max: Self::MAX_NONCE_LENGTH,
            });
        }

        // The canonical string joins fields with `&` and `=`; an
        // unconstrained nonce could forge a field boundary.
        if !nonce
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(DownloadRequestError::NonceInvalidCharacters);
        }

        Ok(Self {
            order_id,
            email,
            product_id,
            price_variant_id,
            file_key,
            expires_at,
            purchase_key,
            nonce,
        })
    }

    /// The canonical byte string that gets signed.
    ///
    /// Field order is fixed; `price` is empty for variant-less requests so
    /// that `Some(id)` and `None` can never collide.
    #[must_use]
    pub fn canonical_string(&self) -> String {
        let price = self
            .price_variant_id
            .map(|id| id.to_string())
            .unwrap_or_default();

        format!(
            "order={}&email={}&product={}&price={}&file={}&expire={}&key={}&nonce={}",
            self.order_id,
            self.email,
            self.product_id,
            price,
            self.file_key,
            self.expires_at.timestamp(),
            self.purchase_key,
            self.nonce,
        )
    }

    #[must_use]
    pub const fn order_id(&self) -> OrderId {
        self.order_id
    }

    #[must_use]
    pub const fn email(&self) -> &Email {
        &self.email
    }

    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product_id
    }

    #[must_use]
    pub const fn price_variant_id(&self) -> Option<PriceVariantId> {
        self.price_variant_id
    }

    #[must_use]
    pub const fn file_key(&self) -> FileKey {
        self.file_key
    }

    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    #[must_use]
    pub const fn purchase_key(&self) -> &PurchaseKey {
        &self.purchase_key
    }

    #[must_use]
    pub fn nonce(&self) -> &str {
        &self.nonce
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request(variant: Option<i32>) -> DownloadRequest {
        DownloadRequest::new(
            OrderId::new(101),
            Email::parse("buyer@example.com").unwrap(),
            ProductId::new(10),
            variant.map(PriceVariantId::new),
            FileKey::new(0),
            Utc.with_ymd_and_hms(2026, 9, 1, 12, 0, 0).unwrap(),
            PurchaseKey::parse("k1e2y3").unwrap(),
            "n0nce",
        )
        .unwrap()
    }

    #[test]
    fn test_canonical_string_fixed_order() {
        let req = request(Some(2));
        let expire = req.expires_at().timestamp();
        assert_eq!(
            req.canonical_string(),
            format!(
                "order=101&email=buyer@example.com&product=10&price=2&file=0&expire={expire}&key=k1e2y3&nonce=n0nce"
            ),
        );
    }

    #[test]
    fn test_canonical_string_empty_price_for_no_variant() {
        let canonical = request(None).canonical_string();
        assert!(canonical.contains("&price=&"));
    }

    #[test]
    fn test_variant_changes_canonical_bytes() {
        assert_ne!(
            request(Some(1)).canonical_string(),
            request(Some(2)).canonical_string()
        );
        assert_ne!(
            request(Some(1)).canonical_string(),
            request(None).canonical_string()
        );
    }

    #[test]
    fn test_nonce_too_long_rejected() {
        let result = DownloadRequest::new(
            OrderId::new(1),
            Email::parse("buyer@example.com").unwrap(),
            ProductId::new(1),
            None,
            FileKey::new(0),
            Utc::now(),
            PurchaseKey::generate(),
            "a".repeat(65),
        );
        assert!(matches!(
            result,
            Err(DownloadRequestError::NonceTooLong { .. })
        ));
    }

    #[test]
    fn test_nonce_field_boundary_characters_rejected() {
        for nonce in ["a&b", "a=b", "a b"] {
            let result = DownloadRequest::new(
                OrderId::new(1),
                Email::parse("buyer@example.com").unwrap(),
                ProductId::new(1),
                None,
                FileKey::new(0),
                Utc::now(),
                PurchaseKey::generate(),
                nonce,
            );
            assert!(matches!(
                result,
                Err(DownloadRequestError::NonceInvalidCharacters)
            ));
        }
    }

    #[test]
    fn test_empty_nonce_allowed() {
        // Links minted before nonces were introduced verify with an empty salt.
        let result = DownloadRequest::new(
            OrderId::new(1),
            Email::parse("buyer@example.com").unwrap(),
            ProductId::new(1),
            None,
            FileKey::new(0),
            Utc::now(),
            PurchaseKey::generate(),
            "",
        );
        assert!(result.is_ok());
    }
}
