use thiserror::Error;

/// Transport-level errors for calls against the scheduling service.
///
/// Responses that arrive but fail to decode are distinguished from
/// transport failures so callers can treat a malformed payload as a
/// server-side contract violation rather than a connectivity problem.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Server error ({status}): {body}")]
    Server { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ApiError {
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }
}
