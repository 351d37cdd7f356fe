pub mod error;
pub mod processor;

// Re-exports
pub use error::{Error, Result};
pub use processor::{ProbeResult, VideoProcessor};
