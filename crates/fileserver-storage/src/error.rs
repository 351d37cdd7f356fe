use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Chunk {index} missing during assembly")]
    ChunkMissing { index: i64 },

    #[error("Assembled size {actual} does not match declared size {expected}")]
    SizeMismatch { expected: i64, actual: i64 },

    #[error("Blob not found: {0}")]
    BlobNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
