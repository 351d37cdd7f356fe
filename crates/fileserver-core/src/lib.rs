pub mod config;
pub mod error;
pub mod file;
pub mod tracker;
pub mod upload;

// Re-exports
pub use config::{Config, DatabaseConfig, ServerConfig, StorageConfig, VideoConfig};
pub use error::{Error, Result};
pub use file::{sanitize_filename, FileEntry, FileKind, FileStatus, VideoMeta};
pub use tracker::UploadTracker;
pub use upload::{UploadSession, UploadStatus};
