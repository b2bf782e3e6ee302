use secrecy::{ExposeSecret, SecretString};

use crate::error::{RemoteRenderingError, Result};

/// Credential types supported by the Remote Rendering SDK.
///
/// Token acquisition against the Mixed Reality STS is out of scope for this
/// crate; callers either supply the account key directly or a token they
/// have already acquired.
#[derive(Clone)]
pub enum RemoteRenderingCredential {
    /// Account key authentication.
    AccountKey(SecretString),

    /// A pre-acquired access token.
    AccessToken(SecretString),
}

impl RemoteRenderingCredential {
    /// Create a credential from the `AZURE_REMOTE_RENDERING_ACCOUNT_KEY`
    /// environment variable.
    pub fn from_env() -> Result<Self> {
        match std::env::var("AZURE_REMOTE_RENDERING_ACCOUNT_KEY") {
            Ok(key) if !key.is_empty() => Ok(Self::AccountKey(SecretString::from(key))),
            _ => Err(RemoteRenderingError::MissingConfig(
                "no credential configured. Set AZURE_REMOTE_RENDERING_ACCOUNT_KEY or pass a \
                 credential explicitly."
                    .into(),
            )),
        }
    }

    /// Create an account key credential.
    pub fn account_key(key: impl Into<String>) -> Self {
        Self::AccountKey(SecretString::from(key.into()))
    }

    /// Create a credential from a pre-acquired access token.
    pub fn access_token(token: impl Into<String>) -> Self {
        Self::AccessToken(SecretString::from(token.into()))
    }

    /// Resolve the credential to an authorization header value.
    pub fn resolve(&self) -> String {
        match self {
            Self::AccountKey(key) => format!("Bearer {}", key.expose_secret()),
            Self::AccessToken(token) => format!("Bearer {}", token.expose_secret()),
        }
    }
}

impl std::fmt::Debug for RemoteRenderingCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AccountKey(_) => write!(f, "RemoteRenderingCredential::AccountKey(****)"),
            Self::AccessToken(_) => write!(f, "RemoteRenderingCredential::AccessToken(****)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_key_resolves_to_bearer_header() {
        let credential = RemoteRenderingCredential::account_key("my-key");
        assert_eq!(credential.resolve(), "Bearer my-key");
    }

    #[test]
    fn access_token_resolves_to_bearer_header() {
        let credential = RemoteRenderingCredential::access_token("sts-token");
        assert_eq!(credential.resolve(), "Bearer sts-token");
    }

    #[test]
    fn debug_redacts_secret() {
        let credential = RemoteRenderingCredential::account_key("super-secret");
        let rendered = format!("{:?}", credential);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("****"));
    }
}
