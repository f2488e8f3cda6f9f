use thiserror::Error;

/// One error type for the whole registry boundary, so an embedder never
/// needs to know which module crate an entry point happened to call into.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Fs(#[from] epm_fs::Error),

    #[error(transparent)]
    Hash(#[from] epm_hash::Error),

    #[error(transparent)]
    Archive(#[from] epm_archive::Error),

    #[error(transparent)]
    Git(#[from] epm_git::Error),

    #[error(transparent)]
    Http(#[from] epm_http::Error),

    #[error(transparent)]
    Scheduler(#[from] epm_scheduler::Error),

    #[error("failed to start the entry-point runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("no entry point named {0:?}")]
    UnknownEntryPoint(String),

    #[error("{op}: expected {expected} argument(s), got {actual}")]
    WrongArgumentCount { op: &'static str, expected: usize, actual: usize },

    #[error("{op}: argument {index} should be {expected}")]
    WrongArgumentType { op: &'static str, index: usize, expected: &'static str },
}
