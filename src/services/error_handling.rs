use thiserror::Error;
use tracing::{debug, warn};

use crate::services::http_client::Backend;

pub type Result<T, E = MsmError> = std::result::Result<T, E>;

/// Errors raised below the table controller. None of these reach the
/// controller itself: data sources are wrapped by `fetch_or_empty`.
#[derive(Error, Debug)]
pub enum MsmError {
    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },

    #[error("Malformed response from {endpoint}: {reason}")]
    MalformedResponse { endpoint: String, reason: String },

    #[error("No base URL configured for the {backend} backend")]
    MissingBaseUrl { backend: Backend },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication failed: {reason}")]
    Authentication { reason: String },

    #[error("Data source error: {message}")]
    Source { message: String },
}

impl MsmError {
    pub fn source_failure(message: impl Into<String>) -> Self {
        MsmError::Source {
            message: message.into(),
        }
    }

    pub fn malformed(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        MsmError::MalformedResponse {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Transport-level failures a later attempt may not repeat.
    pub fn is_transient(&self) -> bool {
        match self {
            MsmError::Http { source, .. } => source.is_timeout() || source.is_connect(),
            MsmError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Structured logging helpers
pub struct LogHelper;

impl LogHelper {
    pub fn log_fetch_failure(query_key: &str, limit: usize, offset: usize, error: &MsmError) {
        warn!(
            query_key = %query_key,
            limit = limit,
            offset = offset,
            transient = error.is_transient(),
            error = %error,
            "Data source failed, presenting an empty page"
        );
    }

    pub fn log_stale_response(query_key: &str, request_key: &str) {
        debug!(
            query_key = %query_key,
            request_key = %request_key,
            "Discarding response for superseded parameters"
        );
    }
}

/// User-friendly error messages
pub struct UserErrorFormatter;

impl UserErrorFormatter {
    pub fn format_for_ui(error: &MsmError) -> String {
        match error {
            MsmError::MissingBaseUrl { backend } => {
                format!("The {backend} service is not configured.")
            }
            MsmError::Configuration { message } => format!("Configuration error: {message}"),
            MsmError::Authentication { .. } => {
                "Sign-in failed. Check your credentials and try again.".to_string()
            }
            MsmError::Status { status, .. } if *status == 401 || *status == 403 => {
                "You don't have permission to perform this action.".to_string()
            }
            MsmError::Http { .. } | MsmError::Status { .. } => {
                "Network connection error. Please try again.".to_string()
            }
            _ => "An unexpected error occurred. Please try again.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_formatting() {
        let error = MsmError::MissingBaseUrl {
            backend: Backend::Golam,
        };

        let formatted = UserErrorFormatter::format_for_ui(&error);
        assert!(formatted.contains("golam"));
    }

    #[test]
    fn test_status_transience() {
        let server = MsmError::Status {
            url: "http://api/table/items/".to_string(),
            status: 503,
        };
        let client = MsmError::Status {
            url: "http://api/table/items/".to_string(),
            status: 404,
        };

        assert!(server.is_transient());
        assert!(!client.is_transient());
        assert!(!MsmError::source_failure("boom").is_transient());
    }

    #[test]
    fn test_option_list_failures_have_a_message() {
        let unreachable = MsmError::Status {
            url: "http://api/table/filters/statuses/".to_string(),
            status: 502,
        };
        let malformed = MsmError::malformed("/table/filters/statuses/", "not a list");

        assert!(UserErrorFormatter::format_for_ui(&unreachable).contains("Network"));
        assert!(UserErrorFormatter::format_for_ui(&malformed).contains("unexpected"));
    }

    #[test]
    fn test_forbidden_message() {
        let error = MsmError::Status {
            url: "http://api/users".to_string(),
            status: 403,
        };
        assert!(UserErrorFormatter::format_for_ui(&error).contains("permission"));
    }
}
