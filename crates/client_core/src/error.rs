use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("invalid api base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("invalid query state: {0}")]
    InvalidQuery(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl CatalogError {
    /// Whether the same request could plausibly succeed later. Used for notice wording only.
    pub fn is_transient(&self) -> bool {
        match self {
            CatalogError::Transport(_) => true,
            CatalogError::Status { status, .. } => {
                *status >= 500 || *status == 408 || *status == 429
            }
            _ => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            CatalogError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            return CatalogError::Decode(value.to_string());
        }
        if let Some(status) = value.status() {
            return CatalogError::Status {
                status: status.as_u16(),
                message: value.to_string(),
            };
        }
        if value.is_timeout() {
            return CatalogError::Transport(format!("timed out: {value}"));
        }
        CatalogError::Transport(value.to_string())
    }
}
