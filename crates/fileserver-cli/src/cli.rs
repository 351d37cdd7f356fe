use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "fileserver")]
#[command(about = "Internal file server admin tool", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database URL (overrides configuration)
    #[arg(long, env = "FILESERVER__DATABASE__URL")]
    pub database_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database schema and storage directories
    Init,

    /// List recently uploaded files
    List {
        /// Maximum number of files to show
        #[arg(long, default_value_t = 20)]
        limit: i64,

        /// Filename substring filter
        #[arg(long)]
        query: Option<String>,
    },

    /// Show aggregate storage statistics
    Stats,

    /// Remove expired upload sessions and orphaned chunk directories
    Gc,

    /// Delete a stored file
    Rm {
        /// File id
        id: String,
    },
}
