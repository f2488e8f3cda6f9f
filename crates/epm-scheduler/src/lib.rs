//! Bridges the blocking git worker and the async HTTP client onto one
//! `tokio` current-thread runtime.
//!
//! A caller on the main (blocking) coroutine runs an operation inline: it
//! occupies the only thread until done, same as the original's "blocking
//! mode" path. A caller on a task coroutine gets the non-blocking path —
//! `fetch` hands the work to a worker thread and polls it between yields,
//! `get` runs as its own spawned task — so the current-thread runtime's
//! single active task at a time still advances everything else in turn.
//! An `.await` that would otherwise block is exactly the yield-back-to-
//! scheduler point the design calls for; `tokio`'s reactor plays the host
//! scheduler's role.

pub mod error;

use std::path::PathBuf;
use std::time::Duration;

pub use error::Error;
pub use epm_git::{GitProgress, ResetMode};
pub use epm_http::{FetchState, Response, Scheme};

/// Which coroutine is driving the call: the main blocking one, or a
/// cooperative task that must not stall the reactor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    Blocking,
    Task,
}

/// How often a `Task` caller polls the git worker thread for progress.
const GIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// `init` has no blocking/non-blocking distinction worth preserving: it's
/// a handful of local filesystem calls, always run inline.
pub fn init(path: &std::path::Path, url: &str) -> Result<(), Error> {
    epm_git::init(path, url).map_err(Error::Git)
}

pub fn reset(path: &std::path::Path, commit_ref: &str, mode: ResetMode) -> Result<(), Error> {
    epm_git::reset(path, commit_ref, mode).map_err(Error::Git)
}

pub fn revparse(path: &std::path::Path, reference: Option<&str>) -> Result<String, Error> {
    epm_git::revparse(path, reference).map_err(Error::Git)
}

/// Runs a `fetch`, dispatching inline or to a worker thread per `caller`.
pub async fn fetch(
    path: PathBuf,
    refspec: Option<String>,
    full_depth: bool,
    no_verify: bool,
    caller: Caller,
    mut on_progress: impl FnMut(GitProgress) + Send + 'static,
) -> Result<String, Error> {
    match caller {
        Caller::Blocking => {
            epm_git::fetch_inline(&path, refspec.as_deref(), full_depth, no_verify, on_progress)
                .map_err(Error::Git)
        }
        Caller::Task => {
            let (ctx, handle) = epm_git::fetch_threaded(path, refspec, full_depth, no_verify);

            let poller = {
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    while !ctx.is_complete() {
                        if let Some(progress) = ctx.take_if_updated() {
                            on_progress(progress);
                        }
                        tokio::time::sleep(GIT_POLL_INTERVAL).await;
                    }
                    // Drain any final update recorded between the last
                    // poll and `complete` being set.
                    if let Some(progress) = ctx.take_if_updated() {
                        on_progress(progress);
                    }
                })
            };

            let result = tokio::task::spawn_blocking(move || handle.join())
                .await
                .map_err(|_| Error::WorkerLost)?
                .map_err(|_| {
                    tracing::error!("git worker thread panicked during fetch");
                    Error::WorkerLost
                })?;

            let _ = poller.await;
            result.map_err(Error::Git)
        }
    }
}

/// Issues a GET, running it as its own task when `caller` is cooperative
/// so the current-thread runtime can keep servicing other work between
/// its socket/TLS yields.
pub async fn get(
    scheme: Scheme,
    host: String,
    port: u16,
    request_target: String,
    sink: impl std::io::Write + Send + 'static,
    caller: Caller,
    on_progress: impl FnMut(FetchState, u64, Option<u64>) + Send + 'static,
) -> Result<Response, Error> {
    match caller {
        Caller::Blocking => epm_http::get(scheme, &host, port, &request_target, sink, on_progress)
            .await
            .map_err(Error::Http),
        Caller::Task => {
            let handle = tokio::spawn(async move {
                epm_http::get(scheme, &host, port, &request_target, sink, on_progress).await
            });
            handle.await.map_err(|_| Error::WorkerLost)?.map_err(Error::Http)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn init_then_revparse_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let repo = git2::Repository::init(dir.path()).unwrap();
        let signature = git2::Signature::now("tester", "tester@example.com").unwrap();
        let tree_id = {
            let mut index = repo.index().unwrap();
            index.write_tree().unwrap()
        };
        let tree = repo.find_tree(tree_id).unwrap();
        repo.commit(Some("HEAD"), &signature, &signature, "first", &tree, &[])
            .unwrap();
        drop(repo);

        let head = revparse(dir.path(), None).unwrap();
        assert_eq!(head.len(), 40);
    }
}
