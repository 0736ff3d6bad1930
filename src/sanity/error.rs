//! Errors raised while talking to the CMS

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("failed to decode CMS response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("post {slug} could not be decoded: {source}")]
    InvalidPost {
        slug: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid image reference: {0}")]
    InvalidImageRef(String),

    #[error("a write token is required to create documents")]
    MissingToken,
}

impl ContentError {
    /// The CMS answered, but one document is unusable
    pub fn is_invalid_post(&self) -> bool {
        matches!(self, ContentError::InvalidPost { .. })
    }
}

pub type Result<T> = std::result::Result<T, ContentError>;
