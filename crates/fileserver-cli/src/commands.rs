use anyhow::Result;

use crate::cli::Commands;
use fileserver_db::Database;
use fileserver_storage::FileStore;

pub async fn execute(command: Commands, db: Database, store: FileStore) -> Result<()> {
    match command {
        Commands::Init => {
            println!("Initializing database schema...");
            db.init_schema().await?;
            println!("Creating storage directories...");
            store.init().await?;
            println!("✓ Ready");
        }

        Commands::List { limit, query } => {
            let files = db.list_files(limit, 0, query.as_deref()).await?;

            if files.is_empty() {
                println!("No files");
                return Ok(());
            }

            println!(
                "{:<36}  {:>12}  {:<9}  {:<20}  {}",
                "ID", "SIZE", "KIND", "UPLOADED", "FILENAME"
            );
            for file in files {
                println!(
                    "{:<36}  {:>12}  {:<9}  {:<20}  {}",
                    file.id,
                    human_size(file.size),
                    file.kind,
                    file.uploaded_at.format("%Y-%m-%d %H:%M:%S"),
                    file.filename
                );
            }
        }

        Commands::Stats => {
            let stats = db.get_aggregate_stats().await?;

            println!("Files:            {}", stats.total_files);
            println!(
                "Stored bytes:     {}",
                human_size(stats.total_bytes.unwrap_or(0))
            );
            println!("Videos:           {}", stats.video_files);
            println!(
                "Total downloads:  {}",
                stats.total_downloads.unwrap_or(0)
            );
            println!("Active uploads:   {}", stats.active_upload_sessions);
        }

        Commands::Gc => {
            // Expired sessions still in the database
            let expired = db.expired_sessions().await?;
            for session in &expired {
                println!("Removing expired session {} ({})", session.id, session.filename);
                db.delete_session(&session.id).await?;
                store.remove_session_dir(&session.id).await?;
            }

            // Chunk directories the database no longer knows about
            let mut orphans = 0;
            for upload_id in store.list_session_dirs().await? {
                if db.get_session(&upload_id).await?.is_none() {
                    println!("Removing orphaned chunk directory {}", upload_id);
                    store.remove_session_dir(&upload_id).await?;
                    orphans += 1;
                }
            }

            println!(
                "✓ Removed {} expired sessions, {} orphaned directories",
                expired.len(),
                orphans
            );
        }

        Commands::Rm { id } => {
            let record = match db.get_file(&id).await? {
                Some(record) => record,
                None => {
                    eprintln!("File not found: {}", id);
                    std::process::exit(1);
                }
            };

            db.delete_file(&id).await?;
            store.remove(&record.storage_path).await?;
            if let Some(thumb) = &record.thumbnail_path {
                store.remove(thumb).await?;
            }

            println!("✓ Deleted {} ({})", record.filename, id);
        }
    }

    Ok(())
}

fn human_size(bytes: i64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(0), "0 B");
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KiB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MiB");
        assert_eq!(human_size(3 * 1024 * 1024 * 1024), "3.0 GiB");
    }
}
