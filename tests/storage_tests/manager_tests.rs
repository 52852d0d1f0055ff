//! Tests for StorageManager
//!
//! These tests verify:
//! - Discovering existing tables in creation order
//! - Ordering by parsed generation, with foreign names first
//! - Skipping corrupt leftovers instead of failing startup
//! - Cleaning up temp files from interrupted flushes
//! - Publishing flushed tables under the final extension only

use std::path::{Path, PathBuf};

use bytes::Bytes;
use polarkv::memtable::MemTable;
use polarkv::storage::StorageManager;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_storage() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().to_path_buf();
    (temp_dir, path)
}

fn create_memtable_with_entries(entries: &[(&'static [u8], &'static [u8])]) -> MemTable {
    let mut memtable = MemTable::new();
    for (key, value) in entries {
        memtable.upsert(Bytes::from_static(*key), Bytes::from_static(*value));
    }
    memtable
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}

fn files_with_extension(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(extension))
        .collect();
    files.sort();
    files
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_empty_directory() {
    let (_temp, path) = setup_temp_storage();

    let manager = StorageManager::open(&path).unwrap();

    assert_eq!(manager.table_count(), 0);
    assert_eq!(manager.dir(), path.as_path());
}

#[test]
fn test_open_missing_directory_fails() {
    let (_temp, path) = setup_temp_storage();

    assert!(StorageManager::open(&path.join("missing")).is_err());
}

#[test]
fn test_open_existing_directory() {
    let (_temp, path) = setup_temp_storage();

    // First open - create some SSTables
    {
        let mut manager = StorageManager::open(&path).unwrap();

        let memtable = create_memtable_with_entries(&[(b"k1", b"v1")]);
        manager.flush(memtable.rows()).unwrap();

        let memtable = create_memtable_with_entries(&[(b"k2", b"v2")]);
        manager.flush(memtable.rows()).unwrap();

        assert_eq!(manager.table_count(), 2);
    }

    // Second open - should discover existing SSTables, oldest first
    {
        let manager = StorageManager::open(&path).unwrap();
        let tables = manager.tables();

        assert_eq!(tables.len(), 2);
        assert!(tables[0].get(b"k1").is_some());
        assert!(tables[1].get(b"k2").is_some());
    }
}

#[test]
fn test_open_skips_invalid_tables() {
    let (_temp, path) = setup_temp_storage();
    {
        let mut manager = StorageManager::open(&path).unwrap();
        let memtable = create_memtable_with_entries(&[(b"good", b"1")]);
        manager.flush(memtable.rows()).unwrap();
    }

    std::fs::write(path.join("00000000000000000001.db"), b"").unwrap();
    std::fs::write(path.join("00000000000000000002.db"), b"\x00\x00\x00\x09").unwrap();

    let manager = StorageManager::open(&path).unwrap();

    assert_eq!(manager.table_count(), 1);
    assert!(manager.tables()[0].get(b"good").is_some());
}

#[test]
fn test_open_removes_temp_files() {
    let (_temp, path) = setup_temp_storage();
    let leftover = path.join("00000000000000000005.tmp");
    std::fs::write(&leftover, b"half written").unwrap();

    let manager = StorageManager::open(&path).unwrap();

    assert_eq!(manager.table_count(), 0);
    assert!(!leftover.exists());
}

#[test]
fn test_open_ignores_other_files_and_directories() {
    let (_temp, path) = setup_temp_storage();
    std::fs::write(path.join("notes.txt"), b"hello").unwrap();
    std::fs::create_dir(path.join("nested.db")).unwrap();

    let manager = StorageManager::open(&path).unwrap();

    assert_eq!(manager.table_count(), 0);
    assert!(path.join("notes.txt").exists());
}

#[test]
fn test_open_orders_by_generation_not_name() {
    let (_temp, path) = setup_temp_storage();

    // String order would be 10, 1700000000000, 9, legacy
    {
        let mut manager = StorageManager::open(&path).unwrap();
        for name in ["10.db", "legacy.db", "9.db", "1700000000000.db"] {
            let memtable = create_memtable_with_entries(&[(b"k", b"v")]);
            let table = manager.flush(memtable.rows()).unwrap();
            std::fs::rename(table.path(), path.join(name)).unwrap();
        }
    }

    let manager = StorageManager::open(&path).unwrap();
    let order: Vec<_> = manager.tables().iter().map(|table| file_name(table.path())).collect();

    assert_eq!(order, vec!["legacy.db", "9.db", "10.db", "1700000000000.db"]);
}

#[test]
fn test_open_orders_foreign_names_by_name() {
    let (_temp, path) = setup_temp_storage();

    {
        let mut manager = StorageManager::open(&path).unwrap();
        for name in ["zeta.db", "alpha.db"] {
            let memtable = create_memtable_with_entries(&[(b"k", b"v")]);
            let table = manager.flush(memtable.rows()).unwrap();
            std::fs::rename(table.path(), path.join(name)).unwrap();
        }
        let memtable = create_memtable_with_entries(&[(b"k", b"v")]);
        manager.flush(memtable.rows()).unwrap();
    }

    let manager = StorageManager::open(&path).unwrap();
    let order: Vec<_> = manager.tables().iter().map(|table| file_name(table.path())).collect();

    assert_eq!(order.len(), 3);
    assert_eq!(&order[..2], &["alpha.db", "zeta.db"]);
}

// =============================================================================
// Flush Tests
// =============================================================================

#[test]
fn test_flush_single_memtable() {
    let (_temp, path) = setup_temp_storage();
    let mut manager = StorageManager::open(&path).unwrap();

    let memtable = create_memtable_with_entries(&[
        (b"apple", b"red"),
        (b"banana", b"yellow"),
        (b"cherry", b"red"),
    ]);

    let table = manager.flush(memtable.rows()).unwrap();

    assert_eq!(table.len(), 3);
    assert_eq!(manager.table_count(), 1);
    assert_eq!(files_with_extension(&path, "db").len(), 1);
    assert!(files_with_extension(&path, "tmp").is_empty());
}

#[test]
fn test_flush_with_tombstones() {
    let (_temp, path) = setup_temp_storage();
    let mut manager = StorageManager::open(&path).unwrap();

    let mut memtable = MemTable::new();
    memtable.upsert(Bytes::from_static(b"key1"), Bytes::from_static(b"value1"));
    memtable.remove(Bytes::from_static(b"key2"));
    memtable.upsert(Bytes::from_static(b"key3"), Bytes::from_static(b"value3"));

    let table = manager.flush(memtable.rows()).unwrap();

    assert_eq!(table.len(), 3); // Includes tombstone
    assert!(table.get(b"key2").unwrap().is_tombstone());
}

#[test]
fn test_flush_round_trip_matches_memtable() {
    let (_temp, path) = setup_temp_storage();
    let mut manager = StorageManager::open(&path).unwrap();

    let mut memtable = MemTable::new();
    for i in 0..200 {
        let key = Bytes::from(format!("key{:04}", i));
        if i % 7 == 0 {
            memtable.remove(key);
        } else {
            memtable.upsert(key, Bytes::from(format!("value{}", i)));
        }
    }

    let table = manager.flush(memtable.rows()).unwrap();

    let written: Vec<_> = memtable.rows().cloned().collect();
    let read: Vec<_> = table.iter_from(b"").collect();
    assert_eq!(read, written);
}

#[test]
fn test_flush_names_are_ordered() {
    let (_temp, path) = setup_temp_storage();
    let mut manager = StorageManager::open(&path).unwrap();

    for i in 0..5u8 {
        let mut memtable = MemTable::new();
        memtable.upsert(Bytes::from(vec![i]), Bytes::from_static(b"v"));
        manager.flush(memtable.rows()).unwrap();
    }

    // Name order is creation order
    let files = files_with_extension(&path, "db");
    let tables = manager.tables();
    assert_eq!(files.len(), 5);
    for (file, table) in files.iter().zip(tables.iter()) {
        assert_eq!(file, table.path());
    }
}

#[test]
fn test_flush_after_restart_sorts_after_existing_tables() {
    let (_temp, path) = setup_temp_storage();

    // A table from "the future" forces the next generation past it
    {
        let mut manager = StorageManager::open(&path).unwrap();
        let memtable = create_memtable_with_entries(&[(b"k", b"v")]);
        let table = manager.flush(memtable.rows()).unwrap();
        std::fs::rename(table.path(), path.join("99999999999999999990.db")).unwrap();
    }

    let mut manager = StorageManager::open(&path).unwrap();
    let memtable = create_memtable_with_entries(&[(b"k2", b"v2")]);
    let table = manager.flush(memtable.rows()).unwrap();

    assert_eq!(table.path(), path.join("99999999999999999991.db"));
}

#[test]
fn test_flush_publishes_durable_entry() {
    let (_temp, path) = setup_temp_storage();

    let published = {
        let mut manager = StorageManager::open(&path).unwrap();
        let memtable = create_memtable_with_entries(&[(b"k", b"v")]);
        let table = manager.flush(memtable.rows()).unwrap();
        table.path().to_path_buf()
    };

    // Only the final name exists once flush returns
    assert_eq!(files_with_extension(&path, "db"), vec![published.clone()]);
    assert!(files_with_extension(&path, "tmp").is_empty());

    let manager = StorageManager::open(&path).unwrap();
    assert_eq!(manager.tables()[0].path(), published.as_path());
    assert!(manager.tables()[0].get(b"k").is_some());
}
