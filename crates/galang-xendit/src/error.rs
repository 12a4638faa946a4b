use thiserror::Error;

/// Errors that can occur while talking to the Xendit API
#[derive(Error, Debug)]
pub enum XenditError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Xendit API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Xendit rejected the API key")]
    Unauthorized,

    #[error("Request failed after {retries} retries: {last_error}")]
    RetriesExhausted { retries: usize, last_error: String },

    #[error("Invalid response from Xendit: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl XenditError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            XenditError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            XenditError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Whether Xendit certainly did not act on the request.
    ///
    /// Only these failures may be resent for non-idempotent calls like invoice creation.
    pub fn was_not_processed(&self) -> bool {
        match self {
            XenditError::Http(e) => e.is_connect(),
            XenditError::Api { status, .. } => *status == 429,
            _ => false,
        }
    }
}
