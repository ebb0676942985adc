//! Error type shared by every backend call.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// No bearer token in the credential store. The request was not sent.
    #[error("Authentication token not found. Please log in first.")]
    MissingToken,

    /// Transport-level failure (DNS, connect, timeout, TLS).
    #[error("{0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("{message} (HTTP {status})")]
    Backend { status: u16, message: String },

    /// The backend answered 2xx but the body was not valid JSON.
    #[error("Server returned malformed data: {0}")]
    InvalidPayload(String),

    #[error("Credential store error: {0}")]
    Storage(String),

    /// Input rejected locally. Nothing was sent.
    #[error("{0}")]
    Invalid(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// `true` for failures that mean the stored token should not be trusted.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            ApiError::MissingToken | ApiError::Backend { status: 401 | 403, .. }
        )
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_message_includes_status() {
        let err = ApiError::Backend {
            status: 500,
            message: "Sorry, you are not allowed to do that.".into(),
        };
        assert_eq!(
            err.to_string(),
            "Sorry, you are not allowed to do that. (HTTP 500)"
        );
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn auth_failures_are_classified() {
        assert!(ApiError::MissingToken.is_auth_failure());
        assert!(ApiError::Backend {
            status: 403,
            message: "forbidden".into()
        }
        .is_auth_failure());
        assert!(!ApiError::Network("down".into()).is_auth_failure());
    }

    #[test]
    fn local_validation_has_no_status() {
        let err = ApiError::Invalid("Camp name cannot be empty".into());
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "Camp name cannot be empty");
        assert!(!err.is_auth_failure());
    }
}
