use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::Error;

/// The kind of a stat'd filesystem entry, as reported to the host layer.
///
/// Anything that is neither a regular file nor a directory (device nodes,
/// FIFOs, sockets) reports as `None` at the `EntryKind` call site, matching
/// the original `lstat`-backed implementation which only distinguished
/// `file` and `dir`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

/// Metadata about a single filesystem entry, following `lstat` semantics on
/// the leaf: a symlink reports its own link target distinctly from the
/// metadata of whatever it points at.
#[derive(Debug, Clone)]
pub struct Stat {
    pub abs_path: PathBuf,
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
    pub size: Option<u64>,
    pub kind: Option<EntryKind>,
    pub symlink: Option<PathBuf>,
}

/// Resolve `path` to an absolute, symlink-free path for every component
/// except possibly the leaf, which is left untouched so a symlink's own
/// identity survives canonicalization of its containing directory.
fn absolute_path(path: &Path) -> std::io::Result<PathBuf> {
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(leaf)) if !parent.as_os_str().is_empty() => {
            Ok(fs::canonicalize(parent)?.join(leaf))
        }
        _ => fs::canonicalize(&path),
    }
}

/// `stat(path)`: lstat the leaf, then (unless the leaf is itself a symlink
/// whose target can't be followed) stat through to report size/mtime/kind
/// for the followed entry.
pub fn stat(path: impl AsRef<Path>) -> Result<Stat, Error> {
    let path = path.as_ref();
    let lstat = fs::symlink_metadata(path).map_err(|e| Error::io("stat", path, e))?;
    let abs_path = absolute_path(path).map_err(|e| Error::io("stat", path, e))?;

    let symlink = if lstat.file_type().is_symlink() {
        Some(fs::read_link(path).map_err(|e| Error::io("stat", path, e))?)
    } else {
        None
    };

    // If the leaf is a symlink, refresh the metadata by following it so
    // size/mtime/kind describe the target, not the link itself. A dangling
    // target still yields a usable `Stat` with `modified`/`size`/`kind`
    // left as `None`.
    let followed = if symlink.is_some() {
        fs::metadata(path).ok()
    } else {
        Some(lstat)
    };

    let Some(followed) = followed else {
        return Ok(Stat {
            abs_path,
            path: path.to_path_buf(),
            modified: None,
            size: None,
            kind: None,
            symlink,
        });
    };

    let kind = if followed.is_file() {
        Some(EntryKind::File)
    } else if followed.is_dir() {
        Some(EntryKind::Dir)
    } else {
        None
    };

    Ok(Stat {
        abs_path,
        path: path.to_path_buf(),
        modified: followed.modified().ok(),
        size: Some(followed.len()),
        kind,
        symlink,
    })
}
