//! Streaming SHA-256, the way every other core crate verifies content:
//! `hash_bytes`/`hash_file` for the one-shot case, [`Hasher`] for callers
//! that are already streaming bytes somewhere else (the HTTP sink, the
//! archive writer) and want a running digest without a second read pass.

pub mod error;

use std::io::{Read, Write};
use std::path::Path;

use sha2::{Digest, Sha256};

pub use error::Error;

const CHUNK_SIZE: usize = 4096;

/// SHA-256 over `data`, as 64 lowercase hex characters.
pub fn hash_bytes(data: impl AsRef<[u8]>) -> String {
    to_hex(Sha256::new().chain_update(data).finalize())
}

/// SHA-256 over the contents of the file at `path`, streamed in
/// 4096-byte chunks. A file that can't be opened is a reported error; a
/// file that changes under us mid-read (truncated, appended to) simply
/// hashes whatever bytes were actually read — there is no integrity
/// check against a prior stat.
pub fn hash_file(path: impl AsRef<Path>) -> Result<String, Error> {
    let path = path.as_ref();
    let mut file = fs_err::File::open(path).map_err(|source| Error::OpenFile {
        path: path.to_path_buf(),
        source,
    })?;

    let mut hasher = Hasher::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let len = match file.read(&mut buf) {
            Ok(0) => break,
            Ok(len) => len,
            Err(source) if source.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(Error::OpenFile {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        hasher.update(&buf[..len]);
    }
    Ok(hasher.finish())
}

/// A running SHA-256 digest that also forwards every byte it's given to
/// an inner [`Write`]r — lets a caller hash a download as it writes it to
/// disk, rather than hashing the file again afterward.
pub struct Hasher<W = std::io::Sink> {
    inner: Sha256,
    sink: W,
}

impl Hasher<std::io::Sink> {
    /// A bare digest with nowhere else to write to.
    pub fn new() -> Self {
        Self {
            inner: Sha256::new(),
            sink: std::io::sink(),
        }
    }
}

impl Default for Hasher<std::io::Sink> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Hasher<W> {
    /// A digest that tees every updated byte range into `sink`.
    pub fn with_sink(sink: W) -> Self {
        Self {
            inner: Sha256::new(),
            sink,
        }
    }

    /// Feed `data` into both the digest and the sink. Only the sink write
    /// can fail; digesting itself is infallible.
    pub fn write_update(&mut self, data: &[u8]) -> std::io::Result<()> {
        self.inner.update(data);
        self.sink.write_all(data)
    }

    /// Feed `data` into the digest only, without touching the sink.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Consume the digest, returning the 64-char lowercase hex digest and
    /// the underlying sink.
    pub fn finish_with_sink(self) -> (String, W) {
        (to_hex(self.inner.finalize()), self.sink)
    }
}

impl Hasher<std::io::Sink> {
    /// Consume the digest, returning the 64-char lowercase hex digest.
    pub fn finish(self) -> String {
        to_hex(self.inner.finalize())
    }
}

fn to_hex(digest: impl AsRef<[u8]>) -> String {
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_matches_known_digest() {
        assert_eq!(
            hash_bytes(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn abc_matches_known_digest() {
        assert_eq!(
            hash_bytes("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn hash_file_matches_hash_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.bin");
        let contents = vec![7u8; 10_000];
        std::fs::write(&path, &contents).unwrap();
        assert_eq!(hash_file(&path).unwrap(), hash_bytes(&contents));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = hash_file("/nonexistent/path/should/not/exist").unwrap_err();
        assert!(matches!(err, Error::OpenFile { .. }));
    }

    #[test]
    fn streaming_hasher_matches_one_shot() {
        let mut sink = Vec::new();
        let mut hasher = Hasher::with_sink(&mut sink);
        hasher.write_update(b"ab").unwrap();
        hasher.write_update(b"c").unwrap();
        let (digest, sink) = hasher.finish_with_sink();
        assert_eq!(digest, hash_bytes("abc"));
        assert_eq!(sink, b"abc");
    }
}
