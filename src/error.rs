use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to the hosted backend.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("failed to reach backend: {0}")]
    Network(#[source] reqwest::Error),
    #[error("backend rejected credentials ({0})")]
    Unauthorized(StatusCode),
    #[error("document {0} not found")]
    NotFound(String),
    #[error("backend rejected the request {status}: {body}")]
    Rejected { status: StatusCode, body: String },
    #[error("backend error {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("invalid backend response: {0}")]
    Decode(String),
    #[error("invalid backend URL: {0}")]
    InvalidUrl(String),
}

impl RemoteError {
    /// Map a non-success response to an error. `id` names the document a
    /// request addressed; a 404 without one (a missing collection) is a plain
    /// status error.
    pub fn from_status(status: StatusCode, body: String, id: Option<&str>) -> Self {
        match (status, id) {
            (StatusCode::NOT_FOUND, Some(id)) => RemoteError::NotFound(id.to_string()),
            (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => {
                RemoteError::Unauthorized(status)
            }
            (StatusCode::NOT_FOUND | StatusCode::TOO_MANY_REQUESTS, _) => {
                RemoteError::Status { status, body }
            }
            (s, _) if s.is_client_error() => RemoteError::Rejected { status, body },
            _ => RemoteError::Status { status, body },
        }
    }
}
