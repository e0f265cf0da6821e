//! Signing-secret seam.

use secrecy::SecretString;

/// Source of the active signing secret.
///
/// Exactly one secret is active at a time; rotation happens out-of-band and
/// immediately invalidates tokens minted under the previous secret (no
/// grace window).
pub trait SecretProvider: Send + Sync {
    /// The currently active signing secret.
    fn current_signing_secret(&self) -> SecretString;
}

/// A provider holding one fixed secret, loaded from configuration.
pub struct StaticSecret(SecretString);

impl StaticSecret {
    #[must_use]
    pub const fn new(secret: SecretString) -> Self {
        Self(secret)
    }
}

impl SecretProvider for StaticSecret {
    fn current_signing_secret(&self) -> SecretString {
        self.0.clone()
    }
}

impl std::fmt::Debug for StaticSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StaticSecret").field(&"[REDACTED]").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_static_secret_returns_configured_value() {
        let provider = StaticSecret::new(SecretString::from("s3cret-bytes"));
        assert_eq!(
            provider.current_signing_secret().expose_secret(),
            "s3cret-bytes"
        );
    }

    #[test]
    fn test_debug_redacts() {
        let provider = StaticSecret::new(SecretString::from("s3cret-bytes"));
        let debug = format!("{provider:?}");
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("REDACTED"));
    }
}
