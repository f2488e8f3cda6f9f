//! Unicode-safe filesystem primitives shared by every other core crate:
//! directory listing, stat, symlink/chmod, process cwd, advisory locking
//! and the terminal-device queries the host surface exposes alongside them.
//!
//! Every public entry point takes and returns UTF-8 paths. On platforms
//! whose filesystem API is natively UTF-16 (Windows), the conversion
//! happens inside `std`/`fs_err` already; a path that can't round-trip
//! through UTF-8 is reported as [`Error::InvalidUnicode`] rather than
//! silently mangled.

pub mod error;
mod lock;
mod stat;
mod term;

use std::path::{Path, PathBuf};

pub use error::Error;
pub use lock::advisory_lock;
pub use stat::{EntryKind, Stat};
pub use term::{terminal_flush, terminal_width};

/// List the entries of a directory, excluding `.` and `..`. `std::fs`
/// already omits both on every supported platform, so this is a thin,
/// UTF-8-checked wrapper.
pub fn list_directory(path: impl AsRef<Path>) -> Result<Vec<String>, Error> {
    let path = path.as_ref();
    let mut names = Vec::new();
    for entry in fs_err::read_dir(path).map_err(|e| Error::io("ls", path, e))? {
        let entry = entry.map_err(|e| Error::io("ls", path, e))?;
        let name = entry.file_name();
        names.push(name.into_string().map_err(|name| Error::InvalidUnicode {
            path: path.join(name),
        })?);
    }
    Ok(names)
}

/// Create a single directory. The parent must already exist — callers that
/// want `mkdir -p` semantics should use [`make_directory_all`].
pub fn make_directory(path: impl AsRef<Path>) -> Result<(), Error> {
    let path = path.as_ref();
    fs_err::create_dir(path).map_err(|e| Error::io("mkdir", path, e))
}

/// Create `path` and every missing ancestor, as `mkdir -p` would. Existing
/// directories anywhere in the prefix are tolerated; any other failure is
/// fatal. Used by the archive extractor and the store layout to stage
/// output files whose parent tree doesn't exist yet.
pub fn make_directory_all(path: impl AsRef<Path>) -> Result<(), Error> {
    let path = path.as_ref();
    fs_err::create_dir_all(path).map_err(|e| Error::io("mkdir", path, e))
}

/// Remove a single, empty directory.
pub fn remove_directory(path: impl AsRef<Path>) -> Result<(), Error> {
    let path = path.as_ref();
    fs_err::remove_dir(path).map_err(|e| Error::io("rmdir", path, e))
}

/// Atomically rename `from` to `to`, the way a staged extraction directory
/// is promoted into the content-addressed store. Falls back to copy+remove
/// when the two paths straddle a filesystem boundary, since `rename(2)`
/// refuses cross-device moves.
pub fn rename(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<(), Error> {
    let from = from.as_ref();
    let to = to.as_ref();
    match fs_err::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
            copy_recursive(from, to).map_err(|e| Error::io("rename", from, e))?;
            fs_err::remove_dir_all(from)
                .or_else(|_| fs_err::remove_file(from))
                .map_err(|e| Error::io("rename", from, e))
        }
        Err(e) => Err(Error::io("rename", from, e)),
    }
}

fn copy_recursive(from: &Path, to: &Path) -> std::io::Result<()> {
    let metadata = std::fs::symlink_metadata(from)?;
    if metadata.is_dir() {
        std::fs::create_dir_all(to)?;
        for entry in std::fs::read_dir(from)? {
            let entry = entry?;
            copy_recursive(&entry.path(), &to.join(entry.file_name()))?;
        }
    } else if metadata.file_type().is_symlink() {
        let target = std::fs::read_link(from)?;
        symlink_os(&target, to)?;
    } else {
        std::fs::copy(from, to)?;
    }
    Ok(())
}

/// `stat(path)`.
pub fn stat(path: impl AsRef<Path>) -> Result<Stat, Error> {
    stat::stat(path)
}

/// Create a symbolic link at `linkpath` pointing at `target`. `target` is
/// not required to exist: archives routinely contain a symlink entry
/// before the file it points at.
pub fn symlink(target: impl AsRef<Path>, linkpath: impl AsRef<Path>) -> Result<(), Error> {
    let linkpath = linkpath.as_ref();
    symlink_os(target.as_ref(), linkpath).map_err(|e| Error::io("create symlink", linkpath, e))
}

#[cfg(unix)]
fn symlink_os(target: &Path, linkpath: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, linkpath)
}

#[cfg(windows)]
fn symlink_os(target: &Path, linkpath: &Path) -> std::io::Result<()> {
    // We don't know ahead of time whether `target` names a file or a
    // directory (it may not exist yet, as when extracting an archive out
    // of order), so try the file form first and fall back to the
    // directory form.
    std::os::windows::fs::symlink_file(target, linkpath)
        .or_else(|_| std::os::windows::fs::symlink_dir(target, linkpath))
}

/// Chmod a file. On Windows this can only toggle the read-only bit; any
/// other mode bits are ignored, matching the platform's actual capability.
#[cfg(unix)]
pub fn chmod(path: impl AsRef<Path>, mode: u32) -> Result<(), Error> {
    use std::os::unix::fs::PermissionsExt;
    let path = path.as_ref();
    let perms = std::fs::Permissions::from_mode(mode);
    fs_err::set_permissions(path, perms).map_err(|e| Error::io("chmod", path, e))
}

#[cfg(windows)]
pub fn chmod(path: impl AsRef<Path>, mode: u32) -> Result<(), Error> {
    let path = path.as_ref();
    let mut perms = fs_err::metadata(path)
        .map_err(|e| Error::io("chmod", path, e))?
        .permissions();
    // The owner-write bit is the only one Windows can represent.
    perms.set_readonly(mode & 0o200 == 0);
    fs_err::set_permissions(path, perms).map_err(|e| Error::io("chmod", path, e))
}

/// Change the process's current working directory.
pub fn change_directory(path: impl AsRef<Path>) -> Result<(), Error> {
    let path = path.as_ref();
    std::env::set_current_dir(path).map_err(|e| Error::io("chdir", path, e))
}

/// The process's current working directory.
pub fn current_directory() -> Result<PathBuf, Error> {
    std::env::current_dir().map_err(|e| Error::io("pwd", ".", e))
}
