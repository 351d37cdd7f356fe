use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Upload session not found: {0}")]
    SessionNotFound(String),

    #[error("Upload session expired: {0}")]
    SessionExpired(String),

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Chunk index {index} out of range (total {total})")]
    ChunkOutOfRange { index: i64, total: i64 },

    #[error("File too large: {size} bytes exceeds limit of {limit}")]
    FileTooLarge { size: i64, limit: i64 },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
