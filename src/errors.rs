use thiserror::Error;

use crate::llm::LlmError;

#[derive(Error, Debug)]
pub enum PostRagError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Generation error: {0}")]
    Llm(#[from] LlmError),

    #[error("Invalid request: {0}")]
    InvalidInput(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PostRagError>;
