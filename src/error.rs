use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImporterError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed batch: {0}")]
    MalformedBatch(String),

    #[error("Site registry returned no sites to match against")]
    EmptySiteCatalog,

    #[error("Registry API error: {message}")]
    Api { message: String },
}

pub type Result<T> = std::result::Result<T, ImporterError>;
