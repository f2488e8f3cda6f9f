//! Exercises the real filesystem: directory listing, stat, symlinks.
//! Kept out of the unit-test tree since every case here touches a real
//! `tempfile::tempdir()` rather than just exercising in-memory logic.

use std::path::PathBuf;

use epm_fs::{make_directory_all, stat, symlink, EntryKind};

#[test]
fn list_directory_excludes_dot_entries() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a"), b"").unwrap();
    std::fs::create_dir(dir.path().join("b")).unwrap();
    let mut names = epm_fs::list_directory(dir.path()).unwrap();
    names.sort();
    assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn stat_reports_file_kind_and_size() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("f.txt");
    std::fs::write(&file, b"hello").unwrap();
    let s = stat(&file).unwrap();
    assert_eq!(s.size, Some(5));
    assert_eq!(s.kind, Some(EntryKind::File));
    assert!(s.symlink.is_none());
}

#[cfg(unix)]
#[test]
fn stat_distinguishes_symlink_from_target() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("target.txt");
    std::fs::write(&target, b"hi").unwrap();
    let link = dir.path().join("link");
    symlink("target.txt", &link).unwrap();

    let s = stat(&link).unwrap();
    assert_eq!(s.symlink, Some(PathBuf::from("target.txt")));
    assert_eq!(s.kind, Some(EntryKind::File));
}

#[test]
fn make_directory_all_tolerates_existing_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a/b/c");
    make_directory_all(&nested).unwrap();
    make_directory_all(&nested).unwrap();
    assert!(nested.is_dir());
}
