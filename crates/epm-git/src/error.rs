use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("can't {op} {path}: {source}", path = .path.display())]
    Git {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    #[error("'{reference}' did not resolve to a commit in {path}", path = .path.display())]
    UnresolvedRef { path: PathBuf, reference: String },

    #[error("'{reference}' is an odd-length hex prefix, which can never be a unique abbreviation")]
    OddHexPrefix { reference: String },
}

impl Error {
    pub(crate) fn git(op: &'static str, path: impl Into<PathBuf>, source: git2::Error) -> Self {
        Self::Git {
            op,
            path: path.into(),
            source,
        }
    }
}
