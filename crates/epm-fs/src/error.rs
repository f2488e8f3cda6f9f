use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Every fallible operation in this crate fails with one of these, each
/// carrying the path it was operating on and the underlying OS message.
#[derive(Debug, Error)]
pub enum Error {
    #[error("can't {op} {path}: {source}", path = .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("can't convert path {path} to a valid unicode string")]
    InvalidUnicode { path: PathBuf },

    #[error("lock body failed: {0}")]
    Body(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }
}
