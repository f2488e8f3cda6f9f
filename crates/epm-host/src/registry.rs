use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use epm_scheduler::Caller;

use crate::error::Error;
use crate::value::{arg_int, arg_path, arg_str, opt_bool, opt_callback, opt_str, Value};

type Entry = Box<dyn Fn(&[Value]) -> Result<Value, Error> + Send + Sync>;

/// Maps every host-callable entry point by name to a boxed closure over
/// [`Value`]. An embedding language looks names up here instead of this
/// crate knowing anything about that language's own calling convention.
pub struct Registry {
    entries: HashMap<&'static str, Entry>,
    no_verify: Arc<AtomicBool>,
    trace_enabled: Arc<AtomicBool>,
    started: Instant,
    runtime: tokio::runtime::Runtime,
}

impl Registry {
    /// Builds the full entry-point table. The single-threaded `tokio`
    /// runtime backing `fetch`/`get` is created lazily here rather than
    /// per call, matching git2's library init: cheap to hold, expensive
    /// to keep rebuilding.
    pub fn new() -> Result<Self, Error> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(Error::Runtime)?;

        let no_verify = Arc::new(AtomicBool::new(false));
        let trace_enabled = Arc::new(AtomicBool::new(false));
        let mut entries: HashMap<&'static str, Entry> = HashMap::new();

        entries.insert("ls", Box::new(entry_ls));
        entries.insert("stat", Box::new(entry_stat));
        entries.insert("mkdir", Box::new(entry_mkdir));
        entries.insert("rmdir", Box::new(entry_rmdir));
        entries.insert("hash", Box::new(entry_hash));
        entries.insert("tcflush", Box::new(entry_tcflush));
        entries.insert("tcwidth", Box::new(entry_tcwidth));
        entries.insert("symlink", Box::new(entry_symlink));
        entries.insert("chmod", Box::new(entry_chmod));
        entries.insert("init", Box::new(entry_init));
        entries.insert("reset", Box::new(entry_reset));
        entries.insert("revparse", Box::new(entry_revparse));
        entries.insert("extract", Box::new(entry_extract));
        entries.insert("chdir", Box::new(entry_chdir));
        entries.insert("pwd", Box::new(entry_pwd));
        entries.insert("flock", Box::new(entry_flock));
        entries.insert("setenv", Box::new(entry_setenv));

        {
            let started = Instant::now();
            entries.insert("time", Box::new(move |_args| Ok(Value::Int(started.elapsed().as_secs_f64() as i64))));
        }

        {
            let trace_enabled = Arc::clone(&trace_enabled);
            entries.insert(
                "trace",
                Box::new(move |args| {
                    let on = args.first().is_some_and(|v| matches!(v, Value::Bool(true)));
                    trace_enabled.store(on, Ordering::Relaxed);
                    tracing::info!(on, "trace toggled");
                    Ok(Value::Bool(trace_enabled.load(Ordering::Relaxed)))
                }),
            );
        }

        {
            let no_verify = Arc::clone(&no_verify);
            entries.insert("certs", Box::new(move |args| entry_certs(args, &no_verify)));
        }

        {
            let handle = runtime.handle().clone();
            let no_verify = Arc::clone(&no_verify);
            entries.insert("fetch", Box::new(move |args| entry_fetch(args, &handle, &no_verify)));
        }

        {
            let handle = runtime.handle().clone();
            entries.insert("get", Box::new(move |args| entry_get(args, &handle)));
        }

        Ok(Self { entries, no_verify, trace_enabled, started: Instant::now(), runtime })
    }

    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, Error> {
        let entry = self.entries.get(name).ok_or_else(|| Error::UnknownEntryPoint(name.to_string()))?;
        entry(args)
    }

    pub fn entry_point_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.keys().copied().collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn no_verify(&self) -> bool {
        self.no_verify.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn trace_enabled(&self) -> bool {
        self.trace_enabled.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    /// Handle to the runtime backing `fetch`/`get`, for a caller (like the
    /// bootstrap binary) that wants to run its own async work on it too.
    #[must_use]
    pub fn runtime(&self) -> &tokio::runtime::Runtime {
        &self.runtime
    }
}

fn entry_ls(args: &[Value]) -> Result<Value, Error> {
    let path = arg_path(args, "ls", 0)?;
    let names = epm_fs::list_directory(path)?;
    Ok(Value::List(names.into_iter().map(Value::Str).collect()))
}

fn entry_stat(args: &[Value]) -> Result<Value, Error> {
    let path = arg_path(args, "stat", 0)?;
    match epm_fs::stat(path) {
        Ok(stat) => Ok(Value::Table(vec![
            ("abs_path".to_string(), Value::Path(stat.abs_path)),
            ("path".to_string(), Value::Path(stat.path)),
            (
                "size".to_string(),
                stat.size.map_or(Value::Nil, |size| Value::Int(i64::try_from(size).unwrap_or(i64::MAX))),
            ),
            (
                "kind".to_string(),
                match stat.kind {
                    Some(epm_fs::EntryKind::File) => Value::Str("file".to_string()),
                    Some(epm_fs::EntryKind::Dir) => Value::Str("dir".to_string()),
                    None => Value::Nil,
                },
            ),
            ("symlink".to_string(), stat.symlink.map_or(Value::Nil, Value::Path)),
        ])),
        Err(epm_fs::Error::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => Ok(Value::Nil),
        Err(source) => Err(source.into()),
    }
}

fn entry_mkdir(args: &[Value]) -> Result<Value, Error> {
    let path = arg_path(args, "mkdir", 0)?;
    epm_fs::make_directory(path)?;
    Ok(Value::Nil)
}

fn entry_rmdir(args: &[Value]) -> Result<Value, Error> {
    let path = arg_path(args, "rmdir", 0)?;
    epm_fs::remove_directory(path)?;
    Ok(Value::Nil)
}

fn entry_hash(args: &[Value]) -> Result<Value, Error> {
    let data = arg_str(args, "hash", 0)?;
    let kind = opt_str(args, 1).unwrap_or("string");
    let digest = match kind {
        "file" => epm_hash::hash_file(Path::new(data))?,
        _ => epm_hash::hash_bytes(data.as_bytes()),
    };
    Ok(Value::Str(digest))
}

fn entry_tcflush(args: &[Value]) -> Result<Value, Error> {
    let fd = i32::try_from(arg_int(args, "tcflush", 0)?).unwrap_or(-1);
    epm_fs::terminal_flush(fd)?;
    Ok(Value::Nil)
}

fn entry_tcwidth(args: &[Value]) -> Result<Value, Error> {
    let fd = i32::try_from(arg_int(args, "tcwidth", 0)?).unwrap_or(-1);
    let width = epm_fs::terminal_width(fd)?;
    Ok(Value::Int(i64::from(width)))
}

fn entry_symlink(args: &[Value]) -> Result<Value, Error> {
    let target = arg_path(args, "symlink", 0)?;
    let linkpath = arg_path(args, "symlink", 1)?;
    epm_fs::symlink(target, linkpath)?;
    Ok(Value::Nil)
}

fn entry_chmod(args: &[Value]) -> Result<Value, Error> {
    let path = arg_path(args, "chmod", 0)?;
    let mode = u32::try_from(arg_int(args, "chmod", 1)?).unwrap_or(0o644);
    epm_fs::chmod(path, mode)?;
    Ok(Value::Nil)
}

fn entry_init(args: &[Value]) -> Result<Value, Error> {
    let path = arg_path(args, "init", 0)?;
    let url = arg_str(args, "init", 1)?;
    epm_scheduler::init(path, url)?;
    Ok(Value::Nil)
}

fn entry_reset(args: &[Value]) -> Result<Value, Error> {
    let path = arg_path(args, "reset", 0)?;
    let commit_ref = arg_str(args, "reset", 1)?;
    let mode = match opt_str(args, 2).unwrap_or("mixed") {
        "soft" => epm_scheduler::ResetMode::Soft,
        "hard" => epm_scheduler::ResetMode::Hard,
        _ => epm_scheduler::ResetMode::Mixed,
    };
    epm_scheduler::reset(path, commit_ref, mode)?;
    Ok(Value::Nil)
}

fn entry_revparse(args: &[Value]) -> Result<Value, Error> {
    let path = arg_path(args, "revparse", 0)?;
    let reference = opt_str(args, 1);
    let hex = epm_scheduler::revparse(path, reference)?;
    Ok(Value::Str(hex))
}

fn entry_extract(args: &[Value]) -> Result<Value, Error> {
    let src = arg_path(args, "extract", 0)?;
    let dst = arg_path(args, "extract", 1)?;
    epm_archive::extract(src, dst)?;
    Ok(Value::Nil)
}

fn entry_chdir(args: &[Value]) -> Result<Value, Error> {
    let path = arg_path(args, "chdir", 0)?;
    epm_fs::change_directory(path)?;
    Ok(Value::Nil)
}

fn entry_pwd(_args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Path(epm_fs::current_directory()?))
}

fn entry_flock(args: &[Value]) -> Result<Value, Error> {
    let path = arg_path(args, "flock", 0)?;
    let body = opt_callback(args, 1).ok_or(Error::WrongArgumentCount { op: "flock", expected: 2, actual: args.len() })?;
    let err_handler = opt_callback(args, 2);
    let wait_handler = opt_callback(args, 3);

    let result = epm_fs::advisory_lock(
        path,
        move |_path| -> Result<(), std::convert::Infallible> {
            body(&[]);
            Ok(())
        },
        wait_handler.map(|wait_handler| move || wait_handler(&[])),
    );

    match result {
        Ok(()) => Ok(Value::Nil),
        Err(source) => {
            if let Some(err_handler) = err_handler {
                err_handler(&[Value::Str(source.to_string())]);
            }
            Err(source.into())
        }
    }
}

fn entry_setenv(args: &[Value]) -> Result<Value, Error> {
    let key = arg_str(args, "setenv", 0)?;
    let value = arg_str(args, "setenv", 1)?;
    #[allow(unsafe_code)]
    // SAFETY: the entry points run on a single-threaded registry; nothing
    // else in this process reads/writes the environment concurrently.
    unsafe {
        std::env::set_var(key, value);
    }
    Ok(Value::Nil)
}

fn entry_certs(args: &[Value], no_verify: &Arc<AtomicBool>) -> Result<Value, Error> {
    let kind = arg_str(args, "certs", 0)?;
    let path = opt_str(args, 1).map(Path::new);
    match kind {
        "dir" => {
            let path = path.ok_or(Error::WrongArgumentCount { op: "certs", expected: 2, actual: args.len() })?;
            epm_http::certs(epm_http::CertKind::Dir(path))?;
        }
        "file" => {
            let path = path.ok_or(Error::WrongArgumentCount { op: "certs", expected: 2, actual: args.len() })?;
            epm_http::certs(epm_http::CertKind::File(path))?;
        }
        "system" => epm_http::certs(epm_http::CertKind::System)?,
        "noverify" => epm_http::certs(epm_http::CertKind::NoVerify)?,
        _ => return Err(Error::WrongArgumentType { op: "certs", index: 0, expected: "dir|file|system|noverify" }),
    }
    no_verify.store(kind == "noverify", Ordering::Relaxed);
    Ok(Value::Nil)
}

fn entry_fetch(args: &[Value], handle: &tokio::runtime::Handle, no_verify: &Arc<AtomicBool>) -> Result<Value, Error> {
    let path: PathBuf = arg_path(args, "fetch", 0)?.to_path_buf();
    let on_progress = opt_callback(args, 1);
    let refspec = opt_str(args, 2).map(str::to_string);
    let full_depth = opt_bool(args, 3);
    let no_verify = no_verify.load(Ordering::Relaxed);

    let report = move |progress: epm_scheduler::GitProgress| {
        if let Some(on_progress) = &on_progress {
            let as_int = |n: usize| Value::Int(i64::try_from(n).unwrap_or(i64::MAX));
            on_progress(&[Value::List(vec![
                as_int(progress.received_bytes),
                as_int(progress.total_objects),
                as_int(progress.indexed_objects),
                as_int(progress.received_objects),
                as_int(progress.local_objects),
                as_int(progress.total_deltas),
                as_int(progress.indexed_deltas),
            ])]);
        }
    };

    let default_branch =
        handle.block_on(epm_scheduler::fetch(path, refspec, full_depth, no_verify, Caller::Blocking, report))?;
    Ok(Value::Str(default_branch))
}

fn entry_get(args: &[Value], handle: &tokio::runtime::Handle) -> Result<Value, Error> {
    let scheme_str = arg_str(args, "get", 0)?;
    let scheme = match scheme_str {
        "https" => epm_scheduler::Scheme::Https,
        _ => epm_scheduler::Scheme::Http,
    };
    let host = arg_str(args, "get", 1)?.to_string();
    let port = u16::try_from(arg_int(args, "get", 2)?).unwrap_or(443);
    let request_target = arg_str(args, "get", 3)?.to_string();
    let sink_path = opt_str(args, 4).map(PathBuf::from);
    let on_progress = opt_callback(args, 5);

    let progress = move |_state: epm_scheduler::FetchState, downloaded: u64, total: Option<u64>| {
        if let Some(on_progress) = &on_progress {
            let total = total.map_or(Value::Nil, |t| Value::Int(i64::try_from(t).unwrap_or(i64::MAX)));
            on_progress(&[Value::Int(i64::try_from(downloaded).unwrap_or(i64::MAX)), total]);
        }
    };

    let (response, body) = match &sink_path {
        Some(sink_path) => {
            let file = fs_err::File::create(sink_path).map_err(|source| {
                Error::Fs(epm_fs::Error::Io { op: "open", path: sink_path.clone(), source })
            })?;
            let response = handle.block_on(epm_scheduler::get(
                scheme,
                host,
                port,
                request_target,
                file,
                Caller::Blocking,
                progress,
            ))?;
            (response, None)
        }
        None => {
            let sink = SharedBuf::default();
            let response = handle.block_on(epm_scheduler::get(
                scheme,
                host,
                port,
                request_target,
                sink.clone(),
                Caller::Blocking,
                progress,
            ))?;
            let bytes = sink.into_inner();
            (response, Some(bytes))
        }
    };

    let headers = Value::Table(response.headers.into_iter().map(|(k, v)| (k, Value::Str(v))).collect());
    let body_value = match body {
        Some(bytes) if response.status == 200 => {
            Value::Str(String::from_utf8_lossy(&bytes).into_owned())
        }
        _ => Value::Nil,
    };
    Ok(Value::List(vec![body_value, headers]))
}

/// A `Write` sink shared between the caller and the blocked-on future, so
/// the buffered response body survives past the end of the `get` call —
/// `epm_scheduler::get` requires its sink to be `'static` (it may run as
/// its own spawned task), which rules out borrowing a local `Vec<u8>`.
#[derive(Clone, Default)]
struct SharedBuf(Arc<std::sync::Mutex<Vec<u8>>>);

impl SharedBuf {
    fn into_inner(self) -> Vec<u8> {
        Arc::try_unwrap(self.0)
            .map(|m| m.into_inner().unwrap_or_else(std::sync::PoisonError::into_inner))
            .unwrap_or_default()
    }
}

impl std::io::Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_entry_point_is_reported() {
        let registry = Registry::new().unwrap();
        let err = registry.call("frobnicate", &[]).unwrap_err();
        assert!(matches!(err, Error::UnknownEntryPoint(name) if name == "frobnicate"));
    }

    #[test]
    fn ls_lists_directory_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a"), b"").unwrap();

        let registry = Registry::new().unwrap();
        let result = registry.call("ls", &[Value::Path(dir.path().to_path_buf())]).unwrap();
        let Value::List(names) = result else { panic!("expected a list") };
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn hash_of_empty_string_matches_known_digest() {
        let registry = Registry::new().unwrap();
        let result = registry.call("hash", &[Value::Str(String::new())]).unwrap();
        assert!(matches!(result, Value::Str(s) if s == "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"));
    }

    #[test]
    fn mkdir_then_rmdir_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("child");

        let registry = Registry::new().unwrap();
        registry.call("mkdir", &[Value::Path(nested.clone())]).unwrap();
        assert!(nested.is_dir());
        registry.call("rmdir", &[Value::Path(nested.clone())]).unwrap();
        assert!(!nested.exists());
    }

    #[test]
    fn stat_of_missing_path_is_nil() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Registry::new().unwrap();
        let result = registry.call("stat", &[Value::Path(dir.path().join("missing"))]).unwrap();
        assert!(matches!(result, Value::Nil));
    }

    #[test]
    fn entry_point_names_are_sorted_and_complete() {
        let registry = Registry::new().unwrap();
        let names = registry.entry_point_names();
        assert!(names.is_sorted());
        for expected in ["ls", "stat", "hash", "fetch", "get", "certs", "flock"] {
            assert!(names.contains(&expected), "missing entry point {expected}");
        }
    }
}
