use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Request to `{url}` failed: HTTP {status} - {body}")]
    Transport {
        url: String,
        status: u16,
        body: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed table: {0}")]
    MalformedDocument(String),

    #[error("Epic `{0}` not found in the existing table")]
    UnknownKey(String),

    #[error("Page `{page_id}` was modified since version {expected} was read")]
    VersionConflict { page_id: String, expected: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
