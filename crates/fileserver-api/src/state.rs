use std::sync::Arc;

use fileserver_core::{Config, UploadTracker};
use fileserver_db::Database;
use fileserver_storage::FileStore;
use fileserver_video::VideoProcessor;

#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<Config>,
    pub db: Arc<Database>,
    pub store: Arc<FileStore>,
    pub tracker: UploadTracker,
    pub video: Arc<VideoProcessor>,
}
