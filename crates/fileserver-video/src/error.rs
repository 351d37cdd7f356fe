use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("ffprobe/ffmpeg not available: {0}")]
    ToolUnavailable(String),

    #[error("Probe failed: {0}")]
    ProbeFailed(String),

    #[error("No video stream in {0}")]
    NoVideoStream(String),

    #[error("Thumbnail generation failed: {0}")]
    ThumbnailFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed probe output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
