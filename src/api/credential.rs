//! PAT-based credential adapter for the Azure DevOps API.

use azure_core::credentials::{AccessToken, Secret, TokenCredential, TokenRequestOptions};
use secrecy::{ExposeSecret, SecretString};

/// Personal access token credential for Azure DevOps.
///
/// Wraps a PAT in a `SecretString` and presents it through the
/// `TokenCredential` interface that `azure_devops_rust_api` expects.
///
/// # Example
///
/// ```rust,no_run
/// use witkit::api::PatCredential;
/// use secrecy::SecretString;
/// use std::sync::Arc;
///
/// let pat = SecretString::from("your-pat-token".to_string());
/// let credential = Arc::new(PatCredential::new(pat));
/// ```
#[derive(Clone)]
pub struct PatCredential {
    pat: SecretString,
}

impl PatCredential {
    /// Creates a new PAT credential from a SecretString.
    pub fn new(pat: SecretString) -> Self {
        Self { pat }
    }
}

impl std::fmt::Debug for PatCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatCredential")
            .field("pat", &"[REDACTED]")
            .finish()
    }
}

#[async_trait::async_trait]
impl TokenCredential for PatCredential {
    /// Returns the PAT as an access token.
    ///
    /// The client library handles the Basic auth encoding internally, so the
    /// raw PAT is returned here with a far-future expiry (PATs do not rotate
    /// through an OAuth flow).
    async fn get_token(
        &self,
        _scopes: &[&str],
        _options: Option<TokenRequestOptions<'_>>,
    ) -> azure_core::error::Result<AccessToken> {
        Ok(AccessToken::new(
            Secret::new(self.pat.expose_secret().to_string()),
            time::OffsetDateTime::now_utc() + time::Duration::days(365),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// # Credential Redaction
    ///
    /// Tests that the PAT never appears in debug output.
    ///
    /// ## Test Scenario
    /// - Creates a credential and formats it with the Debug trait
    ///
    /// ## Expected Outcome
    /// - Output contains [REDACTED] and never the token value
    #[test]
    fn test_debug_redacts_pat() {
        let credential = PatCredential::new(SecretString::from("test-pat".to_string()));
        let debug = format!("{credential:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("test-pat"));
    }

    /// # Token Retrieval
    ///
    /// Tests that the credential returns the PAT as a token.
    ///
    /// ## Test Scenario
    /// - Creates a PatCredential and requests a token
    ///
    /// ## Expected Outcome
    /// - The token secret equals the PAT value
    #[test]
    fn test_get_token() {
        let credential = PatCredential::new(SecretString::from("test-pat-value".to_string()));
        let token = tokio_test::block_on(credential.get_token(&[], None)).unwrap();
        assert_eq!(token.token.secret(), "test-pat-value");
    }
}
