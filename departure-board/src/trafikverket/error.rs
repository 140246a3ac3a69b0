//! Trafikverket client error types.

/// Errors from the Trafikverket client.
#[derive(Debug, thiserror::Error)]
pub enum TrafikverketError {
    /// The client is missing something it needs before it can send anything.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The request itself is unusable (e.g. an empty station signature).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No response arrived before the deadline; the request was aborted.
    #[error("request aborted after {timeout_ms} ms (timeout). Check network or API status.")]
    Timeout { timeout_ms: u64 },

    /// The API answered with an error status (or an embedded error document).
    #[error("API error {status}: {status_text}\n{body}")]
    Remote {
        status: u16,
        status_text: String,
        body: String,
    },

    /// A successful status whose body could not be parsed as JSON.
    #[error("could not parse response as JSON: {message}\n{body}")]
    ResponseFormat { message: String, body: String },

    /// Connection-level failure before any status was received.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl TrafikverketError {
    /// Whether the caller may reasonably try the same request again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Http(_))
    }

    /// Whether this is a remote error whose body mentions `needle`.
    pub fn remote_body_contains(&self, needle: &str) -> bool {
        match self {
            Self::Remote { body, .. } => body.contains(needle),
            _ => false,
        }
    }
}
