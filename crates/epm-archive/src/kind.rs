use std::path::Path;

use crate::error::Error;

/// Archive format, sniffed once from the source filename rather than
/// re-matched at every dispatch point. Order matters: `sample.tar.gz`
/// matches both a `.tar` and a `.gz` substring, so the gzip check runs
/// before the bare-tar fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarGz,
    TarXz,
    Tar,
}

impl ArchiveKind {
    pub fn detect(path: &Path) -> Result<Self, Error> {
        let name = path.to_string_lossy();
        if name.contains(".zip") {
            Ok(Self::Zip)
        } else if name.contains(".gz") || name.contains(".tgz") {
            Ok(Self::TarGz)
        } else if name.contains(".xz") || name.contains(".txz") {
            Ok(Self::TarXz)
        } else if name.contains(".tar") {
            Ok(Self::Tar)
        } else {
            Err(Error::UnknownFormat {
                path: path.to_path_buf(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_every_known_extension() {
        assert_eq!(ArchiveKind::detect(Path::new("x.zip")).unwrap(), ArchiveKind::Zip);
        assert_eq!(ArchiveKind::detect(Path::new("x.tar.gz")).unwrap(), ArchiveKind::TarGz);
        assert_eq!(ArchiveKind::detect(Path::new("x.tgz")).unwrap(), ArchiveKind::TarGz);
        assert_eq!(ArchiveKind::detect(Path::new("x.tar.xz")).unwrap(), ArchiveKind::TarXz);
        assert_eq!(ArchiveKind::detect(Path::new("x.txz")).unwrap(), ArchiveKind::TarXz);
        assert_eq!(ArchiveKind::detect(Path::new("x.tar")).unwrap(), ArchiveKind::Tar);
    }

    #[test]
    fn rejects_unknown_extension() {
        assert!(matches!(
            ArchiveKind::detect(Path::new("x.rar")),
            Err(Error::UnknownFormat { .. })
        ));
    }
}
