use http::StatusCode;
use thiserror::Error;

/// Result type alias for relay operations
pub type Result<T, E = RelayError> = std::result::Result<T, E>;

/// Errors that end the handling of a form submission
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Authentication Failed.")]
    Unauthorized,

    #[error("Failed to read request body: {0}")]
    RequestBodyError(String),

    #[error("{0}")]
    InvalidSubmission(#[from] serde_json::Error),

    /// The downstream API answered with a non-200 status
    #[error("{reason}")]
    DownstreamRejected { status: StatusCode, reason: String },

    /// The downstream API answered 200 but reported a processing exception
    #[error("An error occurred after submitting the case.")]
    DownstreamSilentFailure { is_processed: String },

    #[error("Downstream request failed: {0}")]
    DownstreamRequestFailed(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RelayError {
    /// Status code reported to the form client
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::Unauthorized => StatusCode::UNAUTHORIZED,
            RelayError::DownstreamRejected { status, .. } => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short tag used for logging and metrics
    pub fn outcome(&self) -> &'static str {
        match self {
            RelayError::Unauthorized => "unauthorized",
            RelayError::RequestBodyError(_) | RelayError::InvalidSubmission(_) => "invalid_body",
            RelayError::DownstreamRejected { .. } => "downstream_rejected",
            RelayError::DownstreamSilentFailure { .. } => "downstream_silent_failure",
            RelayError::DownstreamRequestFailed(_) => "downstream_unreachable",
            RelayError::InternalError(_) | RelayError::Io(_) => "internal_error",
        }
    }
}
