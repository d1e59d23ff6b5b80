//! Backup command implementation.

use cairn_store::{RecordStore, StoreConfig};
use std::fs;
use std::path::Path;
use tracing::info;

/// Runs the backup command: copies the store file verbatim into the
/// destination folder under a timestamped name.
pub fn run(path: &Path, destination: &Path) -> Result<(), Box<dyn std::error::Error>> {
    info!("Backing up {:?}", path);

    if !destination.exists() {
        fs::create_dir_all(destination)?;
    }

    let config = StoreConfig::default().create_if_missing(false);
    let store = RecordStore::open(path, config)?;
    let backup_path = store.backup(destination)?;
    store.close()?;

    println!("Backup created");
    println!("  Source: {}", path.display());
    println!("  Copy:   {}", backup_path.display());
    println!("  Size:   {} bytes", backup_path.metadata()?.len());
    Ok(())
}
