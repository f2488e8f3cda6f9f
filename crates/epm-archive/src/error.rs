use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("can't extract {path}: path exceeds the platform's path length limit", path = .path.display())]
    PathTooLong { path: PathBuf },

    #[error("unrecognized archive format for {path}", path = .path.display())]
    UnknownFormat { path: PathBuf },

    #[error("can't {op} {path}: {source}", path = .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("can't read zip archive {path}: {source}", path = .path.display())]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
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
