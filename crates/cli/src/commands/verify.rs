//! Verify a pasted signed download URL offline.
//!
//! # Usage
//!
//! ```bash
//! copperleaf-cli verify "https://downloads.example.com/download?order=..."
//! ```
//!
//! Checks the token signature and expiry against the configured signing
//! secret without touching the database. A valid token does not guarantee
//! the order still grants access; the server decides that when the link
//! is used.
//!
//! # Environment Variables
//!
//! - `DELIVERY_SIGNING_SECRET` - Must match the secret the link was
//!   minted under

use chrono::Utc;
use thiserror::Error;
use url::Url;

use copperleaf_core::download::token;
use copperleaf_delivery::signed_url;

/// Errors that can occur while verifying a link.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// The URL did not parse.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The URL's query parameters do not form a download request.
    #[error("URL is missing or mangling download parameters")]
    Malformed,
}

/// Verify a signed download URL and report the result.
///
/// # Errors
///
/// Returns a `VerifyError` if the secret is missing or the URL cannot be
/// parsed into a request. An invalid token is reported, not an error.
pub fn check(raw_url: &str) -> Result<(), VerifyError> {
    dotenvy::dotenv().ok();

    let secret = std::env::var("DELIVERY_SIGNING_SECRET")
        .map_err(|_| VerifyError::MissingEnvVar("DELIVERY_SIGNING_SECRET"))?;

    let url = Url::parse(raw_url)?;
    let (request, token) = signed_url::parse_signed_url(&url).ok_or(VerifyError::Malformed)?;

    #[allow(clippy::print_stdout)]
    match token::check(&token, &request, secret.as_bytes(), Utc::now()) {
        Ok(()) => {
            println!(
                "valid: order {} product {} file {} expires {}",
                request.order_id(),
                request.product_id(),
                request.file_key(),
                request.expires_at().to_rfc3339(),
            );
        }
        Err(err) => {
            println!("invalid: {err}");
        }
    }

    Ok(())
}
