//! Inspect command implementation.

use cairn_store::{RecordStore, StoreConfig};
use std::path::Path;

/// Runs the inspect command.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !path.is_file() {
        return Err(format!("No store file found at {:?}", path).into());
    }
    let file_size = path.metadata()?.len();

    let config = StoreConfig::default().create_if_missing(false);
    let store = RecordStore::open(path, config)?;
    let tables = store.table_names()?;

    println!("Cairn Store Inspection");
    println!("======================");
    println!();
    println!("Path: {}", path.display());
    println!("Size: {}", format_size(file_size));
    println!();
    if tables.is_empty() {
        println!("No tables.");
    } else {
        println!("Tables:");
        for table in &tables {
            let rows = store.count_rows(table)?;
            println!("  {table}: {rows} rows");
        }
    }

    store.close()?;
    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} bytes")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
