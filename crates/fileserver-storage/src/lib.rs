pub mod error;
pub mod store;

// Re-exports
pub use error::{Error, Result};
pub use store::{FileStore, StoredBlob, WholeFileWriter};
