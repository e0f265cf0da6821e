//! Signed download URL construction.
//!
//! The URL is the wire format: its query parameters carry every field of
//! the [`DownloadRequest`] in the clear, plus the token that signs them.
//! The server rebuilds the request from the parameters and re-derives the
//! token; nothing about a link is stored.

use std::collections::HashMap;

use chrono::{TimeZone as _, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use url::Url;

use copperleaf_core::download::{DownloadRequest, token};
use copperleaf_core::{Email, FileKey, OrderId, PriceVariantId, ProductId, PurchaseKey};

/// Query parameter names, shared by minting and verification.
pub mod params {
    pub const ORDER: &str = "order";
    pub const EMAIL: &str = "email";
    pub const PRODUCT: &str = "product";
    pub const PRICE_ID: &str = "price_id";
    pub const FILE_KEY: &str = "file_key";
    pub const EXPIRE: &str = "expire";
    pub const KEY: &str = "key";
    pub const NONCE: &str = "nonce";
    pub const TOKEN: &str = "token";
}

/// A fresh random nonce salt for a new link.
#[must_use]
pub fn fresh_nonce() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

/// Build a signed download URL on `base_url`.
///
/// # Errors
///
/// Returns `url::ParseError` if `base_url` does not parse.
pub fn signed_download_url(
    base_url: &str,
    request: &DownloadRequest,
    secret: &[u8],
) -> Result<Url, url::ParseError> {
    let token = token::encode(request, secret);

    let mut url = Url::parse(base_url)?;
    url.set_path("/download");

    {
        let mut query = url.query_pairs_mut();
        query.clear();
        query.append_pair(params::ORDER, &request.order_id().to_string());
        query.append_pair(params::EMAIL, request.email().as_str());
        query.append_pair(params::PRODUCT, &request.product_id().to_string());
        if let Some(price_id) = request.price_variant_id() {
            query.append_pair(params::PRICE_ID, &price_id.to_string());
        }
        query.append_pair(params::FILE_KEY, &request.file_key().to_string());
        query.append_pair(params::EXPIRE, &request.expires_at().timestamp().to_string());
        query.append_pair(params::KEY, request.purchase_key().as_str());
        if !request.nonce().is_empty() {
            query.append_pair(params::NONCE, request.nonce());
        }
        query.append_pair(params::TOKEN, token.as_str());
    }

    Ok(url)
}

/// Reconstruct the request and token from a minted URL.
///
/// Returns `None` on any missing or unparseable parameter. Inverse of
/// [`signed_download_url`]; used by the CLI to verify pasted links.
#[must_use]
pub fn parse_signed_url(url: &Url) -> Option<(DownloadRequest, String)> {
    let query: HashMap<String, String> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let order_id = query.get(params::ORDER)?.parse::<i32>().ok()?;
    let email = Email::parse(query.get(params::EMAIL)?).ok()?;
    let product_id = query.get(params::PRODUCT)?.parse::<i32>().ok()?;

    let price_variant_id = match query.get(params::PRICE_ID).map(String::as_str) {
        None | Some("") => None,
        Some(raw) => Some(PriceVariantId::new(raw.parse::<i32>().ok()?)),
    };

    let file_key = query.get(params::FILE_KEY)?.parse::<u32>().ok()?;
    let expire = query.get(params::EXPIRE)?.parse::<i64>().ok()?;
    let expires_at = Utc.timestamp_opt(expire, 0).single()?;
    let purchase_key = PurchaseKey::parse(query.get(params::KEY)?).ok()?;
    let nonce = query.get(params::NONCE).cloned().unwrap_or_default();
    let token = query.get(params::TOKEN)?.clone();

    let request = DownloadRequest::new(
        OrderId::new(order_id),
        email,
        ProductId::new(product_id),
        price_variant_id,
        FileKey::new(file_key),
        expires_at,
        purchase_key,
        nonce,
    )
    .ok()?;

    Some((request, token))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use std::collections::HashMap;

    use copperleaf_core::{Email, FileKey, OrderId, PriceVariantId, ProductId, PurchaseKey};

    const SECRET: &[u8] = b"0Qf8mZv2rL6q9wX1dJ5nT3bY7kC4sP0A";

    fn request() -> DownloadRequest {
        // Whole-second expiry: the wire format carries a unix timestamp.
        DownloadRequest::new(
            OrderId::new(101),
            Email::parse("buyer@example.com").unwrap(),
            ProductId::new(10),
            Some(PriceVariantId::new(2)),
            FileKey::new(0),
            Utc.timestamp_opt(1_893_456_000, 0).single().unwrap(),
            PurchaseKey::parse("k1e2y3").unwrap(),
            fresh_nonce(),
        )
        .unwrap()
    }

    fn query_map(url: &Url) -> HashMap<String, String> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_url_carries_every_request_field() {
        let request = request();
        let url = signed_download_url("https://downloads.example.com", &request, SECRET).unwrap();
        let query = query_map(&url);

        assert_eq!(url.path(), "/download");
        assert_eq!(query.get(params::ORDER).unwrap(), "101");
        assert_eq!(query.get(params::EMAIL).unwrap(), "buyer@example.com");
        assert_eq!(query.get(params::PRODUCT).unwrap(), "10");
        assert_eq!(query.get(params::PRICE_ID).unwrap(), "2");
        assert_eq!(query.get(params::FILE_KEY).unwrap(), "0");
        assert_eq!(query.get(params::KEY).unwrap(), "k1e2y3");
        assert_eq!(query.get(params::NONCE).unwrap(), request.nonce());
        assert!(query.contains_key(params::TOKEN));
    }

    #[test]
    fn test_minted_token_verifies() {
        let request = request();
        let url = signed_download_url("https://downloads.example.com", &request, SECRET).unwrap();
        let query = query_map(&url);

        let token = query.get(params::TOKEN).unwrap();
        assert!(token::verify(token, &request, SECRET, Utc::now()));
    }

    #[test]
    fn test_price_id_omitted_when_absent() {
        let request = DownloadRequest::new(
            OrderId::new(101),
            Email::parse("buyer@example.com").unwrap(),
            ProductId::new(10),
            None,
            FileKey::new(0),
            Utc::now() + Duration::hours(1),
            PurchaseKey::parse("k1e2y3").unwrap(),
            "",
        )
        .unwrap();
        let url = signed_download_url("https://downloads.example.com", &request, SECRET).unwrap();
        let query = query_map(&url);

        assert!(!query.contains_key(params::PRICE_ID));
        assert!(!query.contains_key(params::NONCE));
    }

    #[test]
    fn test_parse_is_inverse_of_mint() {
        let request = request();
        let url = signed_download_url("https://downloads.example.com", &request, SECRET).unwrap();

        let (parsed, token) = parse_signed_url(&url).unwrap();
        assert_eq!(parsed, request);
        assert!(token::verify(&token, &parsed, SECRET, Utc::now()));
    }

    #[test]
    fn test_parse_rejects_missing_token() {
        let mut url = Url::parse("https://downloads.example.com/download").unwrap();
        url.query_pairs_mut()
            .append_pair(params::ORDER, "1")
            .append_pair(params::EMAIL, "buyer@example.com")
            .append_pair(params::PRODUCT, "10")
            .append_pair(params::FILE_KEY, "0")
            .append_pair(params::EXPIRE, "1780000000")
            .append_pair(params::KEY, "k1e2y3");

        assert!(parse_signed_url(&url).is_none());
    }

    #[test]
    fn test_fresh_nonce_is_url_safe() {
        let nonce = fresh_nonce();
        assert_eq!(nonce.len(), 16);
        assert!(nonce.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(signed_download_url("not a url", &request(), SECRET).is_err());
    }
}
