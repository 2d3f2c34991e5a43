//! Error types for the SharePoint provider

use bridge_traits::http::HttpResponse;
use serde::Deserialize;
use thiserror::Error;

/// Microsoft Graph provider errors
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Token rejected or missing permissions (401/403)
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Item does not exist (404)
    #[error("Item not found: {0}")]
    NotFound(String),

    /// Request throttled (429)
    #[error("Throttled by Microsoft Graph, retry after {retry_after_seconds} seconds")]
    Throttled { retry_after_seconds: u64 },

    /// Any other non-2xx response
    #[error("Microsoft Graph API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Transport failure
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Bearer token could not be obtained
    #[error("Token acquisition failed: {0}")]
    Auth(#[from] core_auth::AuthError),
}

/// Result type for SharePoint operations
pub type Result<T> = std::result::Result<T, ProviderError>;

#[derive(Debug, Deserialize)]
struct GraphErrorEnvelope {
    error: GraphErrorBody,
}

#[derive(Debug, Deserialize)]
struct GraphErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl ProviderError {
    /// Map a non-2xx Graph response to an error.
    ///
    /// The message is Graph's `error.message` when the body is a Graph error
    /// envelope, otherwise the raw body.
    pub fn from_response(response: &HttpResponse) -> Self {
        let raw = String::from_utf8_lossy(&response.body).into_owned();
        let message = serde_json::from_slice::<GraphErrorEnvelope>(&response.body)
            .ok()
            .and_then(|envelope| envelope.error.message)
            .unwrap_or(raw);

        match response.status {
            401 | 403 => ProviderError::AuthenticationFailed(message),
            404 => ProviderError::NotFound(message),
            429 => ProviderError::Throttled {
                retry_after_seconds: response
                    .header("Retry-After")
                    .and_then(|value| value.trim().parse().ok())
                    .unwrap_or(0),
            },
            status_code => ProviderError::ApiError {
                status_code,
                message,
            },
        }
    }
}

impl From<bridge_traits::error::BridgeError> for ProviderError {
    fn from(error: bridge_traits::error::BridgeError) -> Self {
        ProviderError::NetworkError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::collections::HashMap;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            ProviderError::from_response(&response(401, "")),
            ProviderError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            ProviderError::from_response(&response(403, "")),
            ProviderError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            ProviderError::from_response(&response(404, "")),
            ProviderError::NotFound(_)
        ));
        assert!(matches!(
            ProviderError::from_response(&response(500, "boom")),
            ProviderError::ApiError { status_code: 500, .. }
        ));
    }

    #[test]
    fn test_graph_error_message_is_extracted() {
        let body = r#"{"error":{"code":"itemNotFound","message":"The resource could not be found."}}"#;
        let error = ProviderError::from_response(&response(404, body));

        assert_eq!(
            error.to_string(),
            "Item not found: The resource could not be found."
        );
    }

    #[test]
    fn test_raw_body_when_not_an_envelope() {
        let error = ProviderError::from_response(&response(502, "Bad Gateway"));

        assert_eq!(
            error.to_string(),
            "Microsoft Graph API error (status 502): Bad Gateway"
        );
    }

    #[test]
    fn test_throttled_reads_retry_after() {
        let mut throttled = response(429, "");
        throttled
            .headers
            .insert("retry-after".to_string(), "12".to_string());

        assert!(matches!(
            ProviderError::from_response(&throttled),
            ProviderError::Throttled {
                retry_after_seconds: 12
            }
        ));
        assert!(matches!(
            ProviderError::from_response(&response(429, "")),
            ProviderError::Throttled {
                retry_after_seconds: 0
            }
        ));
    }
}
