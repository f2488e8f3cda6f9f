use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Git(#[from] epm_git::Error),

    #[error(transparent)]
    Http(#[from] epm_http::Error),

    #[error("git worker thread panicked or was dropped before completing")]
    WorkerLost,
}
