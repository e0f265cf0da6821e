//! The download endpoint: verify a signed link, then stream the file.
//!
//! Failures before the access decision all collapse to the uniform 403,
//! including backend failures during order lookup. Once access is granted,
//! a failure to produce the file is a plain server error.

use std::path::{Component, Path};

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, Request, header};
use axum::response::Response;
use chrono::TimeZone as _;
use chrono::Utc;
use secrecy::ExposeSecret;
use serde::Deserialize;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use copperleaf_core::download::{
    AccessDecision, Catalog, DenyReason, DownloadRequest, OrderStore, TokenError, token,
};
use copperleaf_core::{Email, FileKey, Order, OrderId, PriceVariantId, ProductId, PurchaseKey};

use crate::db::{CatalogRepository, OrderRepository, ProductFile};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Raw query parameters of a signed download link.
///
/// Everything arrives as an optional string so that a missing or mangled
/// parameter produces the same deny as a forged one, never a 400.
#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    order: Option<String>,
    email: Option<String>,
    product: Option<String>,
    price_id: Option<String>,
    file_key: Option<String>,
    expire: Option<String>,
    key: Option<String>,
    nonce: Option<String>,
    token: Option<String>,
}

/// Rebuild the signed request from the query string.
///
/// Returns `None` on any missing or unparseable field; the caller turns
/// that into the uniform deny.
fn parse_request(params: &DownloadParams) -> Option<DownloadRequest> {
    let order_id = params.order.as_deref()?.parse::<i32>().ok()?;
    let email = Email::parse(params.email.as_deref()?).ok()?;
    let product_id = params.product.as_deref()?.parse::<i32>().ok()?;

    let price_variant_id = match params.price_id.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(PriceVariantId::new(raw.parse::<i32>().ok()?)),
    };

    let file_key = params.file_key.as_deref()?.parse::<u32>().ok()?;
    let expire = params.expire.as_deref()?.parse::<i64>().ok()?;
    let expires_at = Utc.timestamp_opt(expire, 0).single()?;
    let purchase_key = PurchaseKey::parse(params.key.as_deref()?).ok()?;
    let nonce = params.nonce.clone().unwrap_or_default();

    DownloadRequest::new(
        OrderId::new(order_id),
        email,
        ProductId::new(product_id),
        price_variant_id,
        FileKey::new(file_key),
        expires_at,
        purchase_key,
        nonce,
    )
    .ok()
}

/// GET /download - verify the signed link and stream the file.
pub async fn download(
    State(state): State<AppState>,
    Query(params): Query<DownloadParams>,
) -> Result<Response> {
    let Some(request) = parse_request(&params) else {
        return Err(AppError::deny(DenyReason::MalformedRequest));
    };
    let Some(token) = params.token.as_deref() else {
        return Err(AppError::deny(DenyReason::MalformedRequest));
    };

    // Signature first: nothing past this line runs for forged links.
    let secret = state.secret().current_signing_secret();
    token::check(
        token,
        &request,
        secret.expose_secret().as_bytes(),
        state.clock().now(),
    )
    .map_err(|err| {
        AppError::deny(match err {
            TokenError::Expired => DenyReason::ExpiredToken,
            TokenError::Malformed => DenyReason::MalformedRequest,
            TokenError::Mismatch => DenyReason::SignatureMismatch,
        })
    })?;

    let order = load_order_or_deny(&OrderRepository::new(state.pool()), request.order_id()).await?;

    // The link binds to one buyer: the signed email and purchase key must
    // match the order on record.
    if order.email != *request.email() || order.purchase_key != *request.purchase_key() {
        return Err(AppError::deny(DenyReason::OrderNotFound));
    }

    let catalog_repo = CatalogRepository::new(state.pool());
    let catalog = match catalog_repo
        .snapshot_for(request.product_id(), request.price_variant_id())
        .await
    {
        Ok(catalog) => catalog,
        Err(err) => {
            tracing::error!(error = %err, "catalog lookup failed");
            return Err(AppError::deny(DenyReason::FileNotFound));
        }
    };

    match state.evaluator().evaluate(
        &order,
        &catalog,
        request.product_id(),
        request.price_variant_id(),
    ) {
        AccessDecision::Granted => {}
        AccessDecision::Denied(reason) => return Err(AppError::deny(reason)),
    }

    // A signed link whose file key points past the product's file list is
    // still just a deny.
    if !catalog.has_file(
        request.product_id(),
        request.price_variant_id(),
        request.file_key(),
    ) {
        return Err(AppError::deny(DenyReason::FileNotFound));
    }

    // Access is granted from here on; failures are ours, not the caller's.
    let file = catalog_repo
        .file_by_key(
            request.product_id(),
            request.price_variant_id(),
            request.file_key(),
        )
        .await?
        .ok_or_else(|| AppError::deny(DenyReason::FileNotFound))?;

    tracing::info!(
        order_id = %request.order_id(),
        product_id = %request.product_id(),
        file = %file.display_name,
        "download granted"
    );

    serve_file(&state, &file).await
}

/// Load the order, collapsing a missing order and an unreachable store
/// into the same deny. The endpoint never reports its own health to the
/// caller.
async fn load_order_or_deny(store: &impl OrderStore, id: OrderId) -> Result<Order> {
    match store.find_order(id).await {
        Ok(Some(order)) => Ok(order),
        Ok(None) => Err(AppError::deny(DenyReason::OrderNotFound)),
        Err(err) => {
            tracing::error!(error = %err, "order lookup failed");
            Err(AppError::deny(DenyReason::OrderNotFound))
        }
    }
}

/// Stream a product file from the configured files directory.
async fn serve_file(state: &AppState, file: &ProductFile) -> Result<Response> {
    let relative = Path::new(&file.storage_path);

    // Stored paths are relative to the files directory; refuse anything
    // that climbs out of it.
    if relative.is_absolute()
        || relative
            .components()
            .any(|c| matches!(c, Component::ParentDir))
    {
        tracing::error!(path = %file.storage_path, "refusing non-relative storage path");
        return Err(AppError::Internal("invalid storage path".to_string()));
    }

    let path = state.config().files_dir.join(relative);

    let response = match ServeFile::new(&path).oneshot(Request::new(Body::empty())).await {
        Ok(response) => response,
        Err(err) => return Err(AppError::Internal(format!("file read failed: {err}"))),
    };

    // A purchased file missing from disk is an operational fault, not an
    // access question.
    if !response.status().is_success() {
        tracing::error!(
            status = %response.status(),
            path = %path.display(),
            "purchased file unavailable on disk"
        );
        return Err(AppError::Internal("file unavailable".to_string()));
    }

    let mut response = response.map(Body::new);
    let disposition = format!(
        "attachment; filename=\"{}\"",
        sanitize_filename(&file.display_name)
    );
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, value);
    }

    Ok(response)
}

/// Keep the advertised filename header-safe.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_control() || c == '"' || c == '\\' {
                '_'
            } else {
                c
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use copperleaf_core::download::StoreError;

    fn params() -> DownloadParams {
        DownloadParams {
            order: Some("101".to_string()),
            email: Some("buyer@example.com".to_string()),
            product: Some("10".to_string()),
            price_id: Some("2".to_string()),
            file_key: Some("0".to_string()),
            expire: Some("1780000000".to_string()),
            key: Some("k1e2y3".to_string()),
            nonce: Some("s4lt".to_string()),
            token: Some("a".repeat(64)),
        }
    }

    #[test]
    fn test_parse_request_roundtrip() {
        let request = parse_request(&params()).unwrap();
        assert_eq!(request.order_id(), OrderId::new(101));
        assert_eq!(request.product_id(), ProductId::new(10));
        assert_eq!(request.price_variant_id(), Some(PriceVariantId::new(2)));
        assert_eq!(request.file_key(), FileKey::new(0));
        assert_eq!(request.expires_at().timestamp(), 1_780_000_000);
        assert_eq!(request.nonce(), "s4lt");
    }

    #[test]
    fn test_missing_field_is_no_request() {
        let mut p = params();
        p.order = None;
        assert!(parse_request(&p).is_none());
    }

    #[test]
    fn test_non_numeric_fields_rejected() {
        let mut p = params();
        p.order = Some("abc".to_string());
        assert!(parse_request(&p).is_none());

        let mut p = params();
        p.expire = Some("soon".to_string());
        assert!(parse_request(&p).is_none());

        let mut p = params();
        p.file_key = Some("-1".to_string());
        assert!(parse_request(&p).is_none());
    }

    #[test]
    fn test_empty_price_id_means_no_variant() {
        let mut p = params();
        p.price_id = Some(String::new());
        assert_eq!(parse_request(&p).unwrap().price_variant_id(), None);

        p.price_id = None;
        assert_eq!(parse_request(&p).unwrap().price_variant_id(), None);
    }

    #[test]
    fn test_missing_nonce_is_empty_salt() {
        let mut p = params();
        p.nonce = None;
        assert_eq!(parse_request(&p).unwrap().nonce(), "");
    }

    #[test]
    fn test_sanitize_filename_strips_header_breakers() {
        assert_eq!(sanitize_filename("report.pdf"), "report.pdf");
        assert_eq!(sanitize_filename("a\"b\\c\nd"), "a_b_c_d");
    }

    struct UnreachableStore;

    impl OrderStore for UnreachableStore {
        async fn find_order(&self, _id: OrderId) -> std::result::Result<Option<Order>, StoreError> {
            Err(StoreError("connection refused".to_string()))
        }
    }

    struct EmptyStore;

    impl OrderStore for EmptyStore {
        async fn find_order(&self, _id: OrderId) -> std::result::Result<Option<Order>, StoreError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_store_failure_collapses_to_deny() {
        // An unreachable store must look exactly like a missing order.
        let unreachable = load_order_or_deny(&UnreachableStore, OrderId::new(1))
            .await
            .unwrap_err();
        let missing = load_order_or_deny(&EmptyStore, OrderId::new(1))
            .await
            .unwrap_err();

        for err in [unreachable, missing] {
            assert!(matches!(
                err,
                AppError::AccessDenied(DenyReason::OrderNotFound)
            ));
        }
    }
}
