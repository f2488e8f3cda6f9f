//! Git worker: `init`/`fetch`/`reset`/`revparse` over `git2` (libgit2).
//!
//! `fetch` comes in two shapes mirroring how the caller is scheduled: the
//! inline form is for a caller already on the driving coroutine/thread and
//! invokes the progress callback directly from libgit2's own
//! `transfer_progress` handler; the threaded form is for a caller on a
//! cooperative task that must not block the reactor — it spawns the fetch
//! onto a worker thread and hands back a [`GitFetchContext`] the driver
//! polls between yields.

pub mod error;
mod progress;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;

pub use error::Error;
pub use progress::{GitFetchContext, GitProgress};

/// `reset`'s working-tree/index update mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetMode {
    Soft,
    Mixed,
    Hard,
}

impl ResetMode {
    fn to_git2(self) -> git2::ResetType {
        match self {
            Self::Soft => git2::ResetType::Soft,
            Self::Mixed => git2::ResetType::Mixed,
            Self::Hard => git2::ResetType::Hard,
        }
    }
}

/// Create a repository at `path` with a remote named `origin` pointing at
/// `url`. Nothing is fetched; call [`fetch_inline`] or [`fetch_threaded`]
/// separately.
pub fn init(path: impl AsRef<Path>, url: &str) -> Result<(), Error> {
    let path = path.as_ref();
    let repo = git2::Repository::init(path).map_err(|e| Error::git("init", path, e))?;
    repo.remote("origin", url)
        .map_err(|e| Error::git("init", path, e))?;
    Ok(())
}

/// Rejects a hex string shorter than a full 40-char commit id whose length
/// is odd: libgit2's own abbreviation matching has no such restriction, but
/// an odd number of nibbles can never spell out whole bytes, so it can
/// never be a real prefix of a hex-encoded id. A unique 7-char hex prefix
/// must fail here rather than being handed to `revparse_single`, which
/// would otherwise happily resolve it.
fn reject_odd_hex_prefix(reference: &str) -> Result<(), Error> {
    if reference.len() < 40 && reference.len() % 2 == 1 && reference.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::OddHexPrefix { reference: reference.to_string() });
    }
    Ok(())
}

/// `commit_ref` may be a full 40-hex commit id, a unique hex prefix (an
/// even number of nibbles, length >= 3), or a symbolic reference;
/// `repo.revparse_single` resolves all three once the odd-length case is
/// ruled out up front.
pub fn reset(path: impl AsRef<Path>, commit_ref: &str, mode: ResetMode) -> Result<(), Error> {
    let path = path.as_ref();
    reject_odd_hex_prefix(commit_ref)?;
    let repo = git2::Repository::open(path).map_err(|e| Error::git("reset", path, e))?;
    let object = repo
        .revparse_single(commit_ref)
        .map_err(|e| Error::git("reset", path, e))?;
    repo.reset(&object, mode.to_git2(), None)
        .map_err(|e| Error::git("reset", path, e))
}

/// Resolve `reference` (default `HEAD`) to its 40-hex commit id.
pub fn revparse(path: impl AsRef<Path>, reference: Option<&str>) -> Result<String, Error> {
    let path = path.as_ref();
    let reference = reference.unwrap_or("HEAD");
    reject_odd_hex_prefix(reference)?;
    let repo = git2::Repository::open(path).map_err(|e| Error::git("revparse", path, e))?;
    let object = repo
        .revparse_single(reference)
        .map_err(|e| Error::git("revparse", path, e))?;
    object
        .into_commit()
        .map(|c| c.id().to_string())
        .map_err(|_| Error::UnresolvedRef {
            path: path.to_path_buf(),
            reference: reference.to_string(),
        })
}

/// libgit2's default credential chain as the corpus's `axi-git`-adjacent
/// code resolves it: the repository/global credential helper first (covers
/// stored HTTPS tokens), falling back to the ssh-agent for `git@`-style
/// URLs. No interactive prompting — there is no terminal to prompt on for
/// this worker.
fn credential_callback(
    config: git2::Config,
) -> impl FnMut(&str, Option<&str>, git2::CredentialType) -> Result<git2::Cred, git2::Error> + 'static {
    move |url, username, allowed| {
        if allowed.contains(git2::CredentialType::SSH_KEY) {
            if let Some(username) = username {
                if let Ok(cred) = git2::Cred::ssh_key_from_agent(username) {
                    return Ok(cred);
                }
            }
        }
        git2::Cred::credential_helper(&config, url, username)
    }
}

fn base_callbacks(no_verify: bool) -> Result<git2::RemoteCallbacks<'static>, Error> {
    let config = git2::Config::open_default().map_err(|e| Error::git("fetch", ".", e))?;
    let mut callbacks = git2::RemoteCallbacks::new();
    callbacks.credentials(credential_callback(config));
    if no_verify {
        callbacks.certificate_check(|_cert, _host| Ok(git2::CertificateCheckStatus::CertificateOk));
    }
    Ok(callbacks)
}

struct FetchArgs<'a> {
    path: &'a Path,
    refspec: Option<&'a str>,
    full_depth: bool,
    no_verify: bool,
}

fn run_fetch(args: &FetchArgs, mut callbacks: git2::RemoteCallbacks<'static>, on_progress: impl FnMut(GitProgress) + 'static) -> Result<String, Error> {
    let repo = git2::Repository::open(args.path).map_err(|e| Error::git("fetch", args.path, e))?;
    let mut remote = repo
        .find_remote("origin")
        .map_err(|e| Error::git("fetch", args.path, e))?;

    let mut on_progress = on_progress;
    callbacks.transfer_progress(move |progress| {
        on_progress(GitProgress::from(progress));
        true
    });

    let mut fetch_options = git2::FetchOptions::new();
    fetch_options
        .remote_callbacks(callbacks)
        .download_tags(git2::AutotagOption::All)
        .depth(if args.full_depth { 0 } else { 1 });

    let refspecs: Vec<&str> = args.refspec.into_iter().collect();
    remote
        .fetch(&refspecs, Some(&mut fetch_options), None)
        .map_err(|e| Error::git("fetch", args.path, e))?;

    // `fetch` disconnects the transport when it returns, so reconnect
    // (read-only, no progress wiring needed) purely to ask for the
    // remote's HEAD symref.
    let connect_callbacks = base_callbacks(args.no_verify)?;
    remote
        .connect_auth(git2::Direction::Fetch, Some(connect_callbacks), None)
        .map_err(|e| Error::git("fetch", args.path, e))?;
    let default_branch = remote
        .default_branch()
        .map_err(|e| Error::git("fetch", args.path, e))?;
    remote.disconnect().ok();

    let default_branch = default_branch.as_str().unwrap_or_default();
    Ok(default_branch
        .strip_prefix("refs/heads/")
        .unwrap_or(default_branch)
        .to_string())
}

/// Run on the caller's own thread: used when the caller is the main
/// coroutine and can afford to block until the fetch completes.
pub fn fetch_inline(
    path: impl AsRef<Path>,
    refspec: Option<&str>,
    full_depth: bool,
    no_verify: bool,
    on_progress: impl FnMut(GitProgress) + 'static,
) -> Result<String, Error> {
    let path = path.as_ref();
    let args = FetchArgs {
        path,
        refspec,
        full_depth,
        no_verify,
    };
    let callbacks = base_callbacks(no_verify)?;
    run_fetch(&args, callbacks, on_progress)
}

/// Spawn the fetch on a worker thread and return a context the driving
/// coroutine polls via [`GitFetchContext::take_if_updated`] between
/// yields, plus the join handle to collect the final result once
/// [`GitFetchContext::is_complete`] is `true`.
pub fn fetch_threaded(
    path: PathBuf,
    refspec: Option<String>,
    full_depth: bool,
    no_verify: bool,
) -> (Arc<GitFetchContext>, JoinHandle<Result<String, Error>>) {
    let context = Arc::new(GitFetchContext::new());
    let worker_context = Arc::clone(&context);

    let handle = std::thread::spawn(move || {
        let args = FetchArgs {
            path: &path,
            refspec: refspec.as_deref(),
            full_depth,
            no_verify,
        };
        let result = base_callbacks(no_verify).and_then(|callbacks| {
            let progress_context = Arc::clone(&worker_context);
            run_fetch(&args, callbacks, move |p| progress_context.record(p))
        });
        worker_context.mark_complete();
        result
    });

    (context, handle)
}
