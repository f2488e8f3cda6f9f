use std::io;
use std::path::Path;

use fs2::FileExt;
use tracing::error;

use crate::error::Error;

/// A held advisory lock. Unlocked and closed on drop, on every exit path —
/// success, an early return, or a panic unwinding through the caller.
struct LockGuard {
    file: fs_err::File,
    path: std::path::PathBuf,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(source) = self.file.file().unlock() {
            error!(path = %self.path.display(), %source, "failed to release advisory lock");
        }
    }
}

fn open_for_lock(path: &Path) -> io::Result<fs_err::File> {
    if path.is_dir() {
        fs_err::File::open(path)
    } else {
        fs_err::OpenOptions::new().create(true).write(true).truncate(false).open(path)
    }
}

/// Acquire an exclusive advisory lock on `path`, run `body` while holding
/// it, and release the lock before returning — regardless of whether `body`
/// succeeded.
///
/// A non-blocking attempt is made first; if it would block and `on_wait` is
/// supplied, it fires once before falling back to a blocking acquisition.
pub fn advisory_lock<T, E>(
    path: impl AsRef<Path>,
    body: impl FnOnce(&Path) -> Result<T, E>,
    on_wait: Option<impl FnOnce()>,
) -> Result<T, Error>
where
    E: std::error::Error + Send + Sync + 'static,
{
    let path = path.as_ref();
    let file = open_for_lock(path).map_err(|e| Error::io("flock", path, e))?;

    if let Err(source) = file.file().try_lock_exclusive() {
        if source.kind() != io::ErrorKind::WouldBlock {
            return Err(Error::io("flock", path, source));
        }
        if let Some(on_wait) = on_wait {
            on_wait();
        }
        file.file().lock_exclusive().map_err(|e| Error::io("flock", path, e))?;
    }

    let guard = LockGuard { file, path: path.to_path_buf() };
    let result = body(path);
    drop(guard);

    result.map_err(|e| Error::Body(Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn runs_body_and_releases_lock() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join("lockfile");
        std::fs::write(&lock_path, b"").unwrap();

        let ran = AtomicUsize::new(0);
        let result: Result<(), Error> = advisory_lock(
            &lock_path,
            |_| -> Result<(), std::convert::Infallible> {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
            None::<fn()>,
        );
        assert!(result.is_ok());
        assert_eq!(ran.load(Ordering::SeqCst), 1);

        // The lock must be free again: a second acquisition must not block.
        let second = advisory_lock(
            &lock_path,
            |_| -> Result<(), std::convert::Infallible> { Ok(()) },
            None::<fn()>,
        );
        assert!(second.is_ok());
    }

    #[test]
    fn propagates_body_error() {
        #[derive(Debug, thiserror::Error)]
        #[error("boom")]
        struct Boom;

        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join("lockfile");
        std::fs::write(&lock_path, b"").unwrap();

        let result: Result<(), Error> = advisory_lock(&lock_path, |_| Err(Boom), None::<fn()>);
        assert!(matches!(result, Err(Error::Body(_))));
    }
}
