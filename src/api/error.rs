// src/api/error.rs
// Normalized errors at the HTTP boundary. Every transport failure collapses
// to a {message, status} shape here; call sites pick the reaction (surface,
// retry, or ignore) based on category.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-2xx response from the backend.
    #[error("{message} (status {status})")]
    Http { status: u16, message: String },

    /// The request never produced a response (DNS, connect, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// 2xx response whose body did not match the expected contract.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Client-side validation; never reaches the network layer.
    #[error("{0}")]
    InvalidInput(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Not-found is the expected-empty condition on "get configuration"
    /// style endpoints; it must not be retried or surfaced as an error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Worth retrying: the backend never saw the request, or fell over.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Network(_) => true,
            ApiError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
