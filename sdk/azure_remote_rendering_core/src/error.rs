//! Error types for the Azure Remote Rendering SDK.
//!
//! Service failures are classified by HTTP status code through a small
//! mapping table (see [`map_error`]). The table is shared by the paging and
//! polling engines and is always consulted *before* any attempt to
//! deserialize a response body, so an error payload is never parsed as if it
//! were a success payload.

use std::collections::HashMap;

use thiserror::Error;

/// Errors that can occur when interacting with the Remote Rendering service.
#[derive(Error, Debug)]
pub enum RemoteRenderingError {
    /// The service rejected the credentials (HTTP 401).
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The requested resource does not exist (HTTP 404).
    #[error("resource not found: {0}")]
    NotFound(String),

    /// The request conflicts with existing state (HTTP 409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Any other non-success response. Carries the status code and raw body.
    #[error("HTTP error: {status} - {body}")]
    HttpResponse { status: u16, body: String },

    /// A successfully-deserialized body is missing an expected field.
    ///
    /// This indicates a contract mismatch between client and service and is
    /// never transient.
    #[error("unexpected response shape: {0}")]
    Schema(String),

    /// A required strategy option was not supplied by the caller.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A continuation token was produced by a different client version.
    #[error("incompatible continuation token: {0}")]
    Compatibility(String),

    /// A polling deadline or probe budget was exhausted before the
    /// operation reached a terminal status.
    #[error("polling did not complete within the configured bound after {probes} probe(s)")]
    PollingTimeout { probes: u32 },

    /// The HTTP request failed at the transport level.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A request or response body could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The endpoint URL is invalid.
    #[error("invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    /// A required configuration value is missing.
    #[error("missing configuration: {0}")]
    MissingConfig(String),
}

/// Result type alias for Remote Rendering operations.
pub type Result<T> = std::result::Result<T, RemoteRenderingError>;

/// Semantic classification of a failing HTTP status code.
///
/// Used as the value side of the status-code mapping table. Callers can
/// override individual entries per operation; overrides win over the
/// defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Authentication,
    NotFound,
    Conflict,
    /// Fall through to the generic [`RemoteRenderingError::HttpResponse`].
    Http,
}

/// The default status-code table: 401, 404 and 409 get dedicated error
/// variants; everything else falls through to the generic HTTP error.
fn default_error_kind(status: u16) -> Option<ErrorKind> {
    match status {
        401 => Some(ErrorKind::Authentication),
        404 => Some(ErrorKind::NotFound),
        409 => Some(ErrorKind::Conflict),
        _ => None,
    }
}

/// Map a non-success status code to an error, merging caller overrides over
/// the default table.
///
/// The body is carried as raw text; it has deliberately not been
/// deserialized at this point.
pub fn map_error(
    status: u16,
    body: &str,
    overrides: &HashMap<u16, ErrorKind>,
) -> RemoteRenderingError {
    let kind = overrides
        .get(&status)
        .copied()
        .or_else(|| default_error_kind(status))
        .unwrap_or(ErrorKind::Http);

    let message = format!("status {}: {}", status, body);
    match kind {
        ErrorKind::Authentication => RemoteRenderingError::Authentication(message),
        ErrorKind::NotFound => RemoteRenderingError::NotFound(message),
        ErrorKind::Conflict => RemoteRenderingError::Conflict(message),
        ErrorKind::Http => RemoteRenderingError::HttpResponse {
            status,
            body: body.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_maps_auth_not_found_conflict() {
        let overrides = HashMap::new();

        assert!(matches!(
            map_error(401, "denied", &overrides),
            RemoteRenderingError::Authentication(_)
        ));
        assert!(matches!(
            map_error(404, "missing", &overrides),
            RemoteRenderingError::NotFound(_)
        ));
        assert!(matches!(
            map_error(409, "exists", &overrides),
            RemoteRenderingError::Conflict(_)
        ));
    }

    #[test]
    fn unmapped_status_falls_through_to_http() {
        let overrides = HashMap::new();

        let err = map_error(503, "unavailable", &overrides);
        match err {
            RemoteRenderingError::HttpResponse { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "unavailable");
            }
            other => panic!("expected HttpResponse, got {:?}", other),
        }
    }

    #[test]
    fn caller_override_wins_over_default() {
        let mut overrides = HashMap::new();
        overrides.insert(404, ErrorKind::Conflict);

        assert!(matches!(
            map_error(404, "taken", &overrides),
            RemoteRenderingError::Conflict(_)
        ));
    }

    #[test]
    fn caller_override_can_add_new_entries() {
        let mut overrides = HashMap::new();
        overrides.insert(410, ErrorKind::NotFound);

        assert!(matches!(
            map_error(410, "gone", &overrides),
            RemoteRenderingError::NotFound(_)
        ));
    }

    #[test]
    fn error_messages_carry_status_and_body() {
        let err = map_error(401, "token expired", &HashMap::new());
        let rendered = err.to_string();
        assert!(rendered.contains("401"));
        assert!(rendered.contains("token expired"));
    }
}
