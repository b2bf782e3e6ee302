//! Continuation tokens for suspending and resuming pollers.
//!
//! A token is the base64 encoding of `"<version>:<account_id>:<resource_id>"`.
//! Only the identifier pair crosses the token boundary; a resumed poller
//! re-fetches fresh resource state instead of trusting serialized object
//! graphs from an earlier process.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::error::{RemoteRenderingError, Result};

/// The token wire-format version this client produces and accepts.
pub const TOKEN_VERSION: &str = "1";

/// The decoded contents of a continuation token: just enough to re-issue
/// the status probe for the operation's resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuationToken {
    pub account_id: String,
    pub resource_id: String,
}

impl ContinuationToken {
    /// Create a token for the given account/resource pair.
    pub fn new(account_id: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            resource_id: resource_id.into(),
        }
    }

    /// Encode as an opaque string handed to callers.
    pub fn encode(&self) -> String {
        let raw = format!("{}:{}:{}", TOKEN_VERSION, self.account_id, self.resource_id);
        BASE64.encode(raw.as_bytes())
    }

    /// Decode an opaque token string.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteRenderingError::Compatibility`] when the token was
    /// produced by a different client version, and a schema error when the
    /// token is not of the expected shape at all.
    pub fn decode(token: &str) -> Result<Self> {
        let bytes = BASE64.decode(token).map_err(|_| {
            RemoteRenderingError::Schema("continuation token is not valid base64".into())
        })?;
        let raw = String::from_utf8(bytes).map_err(|_| {
            RemoteRenderingError::Schema("continuation token is not valid UTF-8".into())
        })?;

        let mut parts = raw.splitn(3, ':');
        let (version, account_id, resource_id) = match (parts.next(), parts.next(), parts.next()) {
            (Some(v), Some(a), Some(r)) if !a.is_empty() && !r.is_empty() => (v, a, r),
            _ => {
                return Err(RemoteRenderingError::Schema(
                    "continuation token does not have the shape '<version>:<account_id>:<resource_id>'"
                        .into(),
                ))
            }
        };

        if version != TOKEN_VERSION {
            return Err(RemoteRenderingError::Compatibility(
                "cannot continue from continuation token from a different/newer client version"
                    .into(),
            ));
        }

        Ok(Self::new(account_id, resource_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let token = ContinuationToken::new("account-1", "conversion-42");
        let decoded = ContinuationToken::decode(&token.encode()).expect("should decode");
        assert_eq!(decoded, token);
    }

    #[test]
    fn encodes_versioned_triple() {
        let token = ContinuationToken::new("acc", "res");
        let raw = String::from_utf8(BASE64.decode(token.encode()).unwrap()).unwrap();
        assert_eq!(raw, "1:acc:res");
    }

    #[test]
    fn rejects_version_mismatch() {
        let raw = BASE64.encode(b"2:acc:res");
        let err = ContinuationToken::decode(&raw).unwrap_err();
        assert!(matches!(err, RemoteRenderingError::Compatibility(_)));
        assert!(err.to_string().contains("different/newer client version"));
    }

    #[test]
    fn rejects_garbage() {
        let err = ContinuationToken::decode("!!not base64!!").unwrap_err();
        assert!(matches!(err, RemoteRenderingError::Schema(_)));
    }

    #[test]
    fn rejects_missing_fields() {
        let raw = BASE64.encode(b"1:only-account");
        let err = ContinuationToken::decode(&raw).unwrap_err();
        assert!(matches!(err, RemoteRenderingError::Schema(_)));
    }

    #[test]
    fn resource_id_may_contain_colons() {
        // splitn keeps everything after the second separator together.
        let raw = BASE64.encode(b"1:acc:res:with:colons");
        let decoded = ContinuationToken::decode(&raw).expect("should decode");
        assert_eq!(decoded.resource_id, "res:with:colons");
    }
}
