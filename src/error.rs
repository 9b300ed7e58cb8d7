//! Status client error types

/// Errors from the backend status endpoint.
#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    /// The backend has not recorded the transaction yet (HTTP 404).
    /// Recoverable: the reconciler treats it like a still-pending response.
    #[error("transaction not yet recorded by the backend")]
    NotFound,

    /// The backend returned a non-2xx status other than 404.
    #[error("status endpoint returned {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Api {
        status: u16,
        /// Display text extracted from the error body (`message` or
        /// `detail`), when present.
        message: Option<String>,
    },

    /// HTTP transport failure or malformed response body.
    #[error("status request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl StatusError {
    /// Only a 404 is recoverable; everything else stops polling for good.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, StatusError::NotFound)
    }

    /// Best available human-readable message, in priority order:
    /// backend-provided, then transport, then a generic fallback.
    pub fn display_message(&self) -> String {
        match self {
            StatusError::Api {
                message: Some(message),
                ..
            } => message.clone(),
            StatusError::Api { status, .. } => {
                format!("Payment verification failed (HTTP {status})")
            }
            StatusError::Http(source) => source.to_string(),
            StatusError::NotFound => "Transaction not found".to_string(),
        }
    }
}
