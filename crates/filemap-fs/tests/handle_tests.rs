//! Tests for the flat file handle

use assert_fs::TempDir;
use assert_fs::prelude::*;
use filemap_fs::{FileHandle, FlatHandle};
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use rstest::rstest;

#[test]
fn test_flat_handle_read_missing_file_is_empty() {
    let temp = TempDir::new().unwrap();
    let handle = FlatHandle::new(temp.path().join("absent"));

    assert!(!handle.exists());
    assert_eq!(handle.read().unwrap(), "");
}

#[test]
fn test_flat_handle_write_then_read() {
    let temp = TempDir::new().unwrap();
    let mut handle = FlatHandle::new(temp.path().join("hosts"));

    handle.write("127.0.0.1 localhost\n").unwrap();

    assert!(handle.exists());
    assert_eq!(handle.read().unwrap(), "127.0.0.1 localhost\n");
}

#[rstest]
#[case::existing_file_copies_sibling(true)]
#[case::missing_file_is_noop(false)]
fn test_flat_handle_backup(#[case] file_exists: bool) {
    let temp = TempDir::new().unwrap();
    let file = temp.child("hosts");
    if file_exists {
        file.write_str("original\n").unwrap();
    }

    let handle = FlatHandle::new(file.path());
    assert!(handle.supports_backup());
    handle.backup().unwrap();

    let backup = temp.child("hosts.bak");
    if file_exists {
        backup.assert(predicate::str::contains("original"));
    } else {
        backup.assert(predicate::path::missing());
    }
}

#[test]
fn test_flat_handle_remove() {
    let temp = TempDir::new().unwrap();
    let file = temp.child("hosts");
    file.write_str("content").unwrap();

    let mut handle = FlatHandle::new(file.path());
    handle.remove().unwrap();

    file.assert(predicate::path::missing());
}

#[test]
fn test_flat_handle_remove_missing_file_errors() {
    let temp = TempDir::new().unwrap();
    let mut handle = FlatHandle::new(temp.path().join("absent"));

    assert!(handle.remove().is_err());
}
