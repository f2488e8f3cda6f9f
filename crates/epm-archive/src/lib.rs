//! Format-sniffing archive extraction. [`extract`] infers zip/tar/tar.gz/
//! tar.xz from substrings in the source filename, same as the original
//! tool did, and unpacks into a destination directory with the platform's
//! `mkdir -p` semantics for missing parent directories.

pub mod error;
mod kind;
mod tar;
mod zip;

use std::path::Path;

pub use error::Error;
pub use kind::ArchiveKind;

/// Platforms impose a hard ceiling on path length (260 on legacy Windows,
/// 4096 on Linux); check up front so a too-long source path fails clearly
/// rather than partway through extraction.
const MAX_PATH_LEN: usize = 4096;

pub fn extract(source: impl AsRef<Path>, destination: impl AsRef<Path>) -> Result<(), Error> {
    let source = source.as_ref();
    let destination = destination.as_ref();

    if source.as_os_str().len() > MAX_PATH_LEN {
        return Err(Error::PathTooLong {
            path: source.to_path_buf(),
        });
    }

    epm_fs::make_directory_all(destination)
        .map_err(|e| Error::io("mkdir", destination, io_error(e)))?;

    match ArchiveKind::detect(source)? {
        ArchiveKind::Zip => zip::extract(source, destination),
        ArchiveKind::Tar => {
            let file = fs_err::File::open(source).map_err(|e| Error::io("extract", source, e))?;
            tar::extract(file, destination)
        }
        ArchiveKind::TarGz => extract_via_intermediate(source, destination, strip_one_suffix, |f| {
            Box::new(flate2::read::GzDecoder::new(f))
        }),
        ArchiveKind::TarXz => extract_via_intermediate(source, destination, strip_one_suffix, |f| {
            // `new_multi_decoder` decodes concatenated xz streams back to
            // back, matching the original's `CONCATENATED` decoder flag.
            Box::new(xz2::read::XzDecoder::new_multi_decoder(f))
        }),
    }
}

/// `source.tar.gz` → `source.tar`, `source.tgz` → `source.tar`: drop the
/// compression suffix, keeping (or introducing) the `.tar` one.
fn strip_one_suffix(source: &Path) -> std::path::PathBuf {
    let name = source.to_string_lossy();
    let stripped = name
        .strip_suffix(".tgz")
        .map(|base| format!("{base}.tar"))
        .or_else(|| name.strip_suffix(".txz").map(|base| format!("{base}.tar")))
        .or_else(|| name.strip_suffix(".gz").map(str::to_string))
        .or_else(|| name.strip_suffix(".xz").map(str::to_string))
        .unwrap_or_else(|| format!("{name}.tar"));
    source.with_file_name(stripped)
}

fn extract_via_intermediate(
    source: &Path,
    destination: &Path,
    intermediate_name: impl Fn(&Path) -> std::path::PathBuf,
    decoder: impl FnOnce(fs_err::File) -> Box<dyn std::io::Read>,
) -> Result<(), Error> {
    let compressed = fs_err::File::open(source).map_err(|e| Error::io("extract", source, e))?;
    let intermediate = intermediate_name(source);

    {
        let mut reader = decoder(compressed);
        let mut out =
            fs_err::File::create(&intermediate).map_err(|e| Error::io("extract", &intermediate, e))?;
        std::io::copy(&mut reader, &mut out).map_err(|e| Error::io("extract", &intermediate, e))?;
    }

    let result = {
        let file = fs_err::File::open(&intermediate).map_err(|e| Error::io("extract", &intermediate, e))?;
        tar::extract(file, destination)
    };

    fs_err::remove_file(&intermediate).map_err(|e| Error::io("extract", &intermediate, e))?;
    result
}

fn io_error(e: epm_fs::Error) -> std::io::Error {
    match e {
        epm_fs::Error::Io { source, .. } => source,
        other => std::io::Error::other(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tgz_to_tar() {
        assert_eq!(
            strip_one_suffix(Path::new("/x/a.tgz")),
            std::path::PathBuf::from("/x/a.tar")
        );
        assert_eq!(
            strip_one_suffix(Path::new("/x/a.tar.gz")),
            std::path::PathBuf::from("/x/a.tar")
        );
        assert_eq!(
            strip_one_suffix(Path::new("/x/a.tar.xz")),
            std::path::PathBuf::from("/x/a.tar")
        );
    }

    #[test]
    fn rejects_oversized_source_path() {
        let huge = "a".repeat(MAX_PATH_LEN + 1);
        let err = extract(&huge, tempfile::tempdir().unwrap().path()).unwrap_err();
        assert!(matches!(err, Error::PathTooLong { .. }));
    }
}
