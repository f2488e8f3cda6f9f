//! Exercises real `git2::Repository` objects on disk: init, revparse,
//! reset. Kept out of the unit-test tree since every case here touches a
//! real `tempfile::tempdir()` repository rather than just exercising
//! in-memory logic.

use epm_git::{init, reset, revparse, ResetMode};

#[test]
fn init_creates_repo_with_origin_remote() {
    let dir = tempfile::tempdir().unwrap();
    init(dir.path(), "https://example.invalid/repo.git").unwrap();
    let repo = git2::Repository::open(dir.path()).unwrap();
    let remote = repo.find_remote("origin").unwrap();
    assert_eq!(remote.url(), Some("https://example.invalid/repo.git"));
}

#[test]
fn revparse_resolves_head() {
    let dir = tempfile::tempdir().unwrap();
    let repo = git2::Repository::init(dir.path()).unwrap();
    let sig = git2::Signature::now("test", "test@example.invalid").unwrap();
    let tree_id = {
        let mut index = repo.index().unwrap();
        index.write_tree().unwrap()
    };
    let tree = repo.find_tree(tree_id).unwrap();
    let commit_id = repo
        .commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[])
        .unwrap();

    let resolved = revparse(dir.path(), None).unwrap();
    assert_eq!(resolved, commit_id.to_string());
}

#[test]
fn reset_hard_moves_head() {
    let dir = tempfile::tempdir().unwrap();
    let repo = git2::Repository::init(dir.path()).unwrap();
    let sig = git2::Signature::now("test", "test@example.invalid").unwrap();
    let tree_id = repo.index().unwrap().write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let first = repo.commit(Some("HEAD"), &sig, &sig, "first", &tree, &[]).unwrap();
    let first_commit = repo.find_commit(first).unwrap();
    let second = repo
        .commit(Some("HEAD"), &sig, &sig, "second", &tree, &[&first_commit])
        .unwrap();

    reset(dir.path(), &first.to_string(), ResetMode::Hard).unwrap();
    assert_eq!(revparse(dir.path(), None).unwrap(), first.to_string());
    let _ = second;
}
