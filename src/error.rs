use thiserror::Error;

/// Errors surfaced by the client library.
///
/// Session operations propagate these to the caller; the search
/// controller absorbs them into `SearchState` instead of re-throwing.
#[derive(Debug, Error)]
pub enum Error {
    /// The bearer token could not be decoded into identity claims.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// A search response was neither a bare array nor a `{data: [...]}` envelope.
    #[error("unexpected search response shape: {0}")]
    InvalidResponseShape(String),

    /// Transport-level failure: connectivity, DNS, request timeout.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Token slot or config file IO failed.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Human-readable one-liner for status lines and prompts.
    pub fn summary(&self) -> String {
        match self {
            Error::Network(e) if e.is_timeout() => "request timed out".to_string(),
            Error::Network(_) => "could not reach the server".to_string(),
            Error::Api { status, .. } => format!("server rejected the request ({status})"),
            other => other.to_string(),
        }
    }
}
