use std::io::{self, Read};
use std::path::Path;

use tar::EntryType;

use crate::error::Error;

/// Iterate USTar records, applying whatever PAX (`x`/`g`) or GNU
/// long-name/long-link (`L`/`K`) overrides preceded each entry — the
/// `tar` crate resolves these against the raw records before handing us
/// an entry, so `entry.path()`/`entry.link_name()` already reflect the
/// overridden name rather than the truncated 100-byte header field.
pub fn extract(reader: impl Read, dst: &Path) -> Result<(), Error> {
    let mut archive = tar::Archive::new(reader);
    for entry in archive.entries().map_err(|e| Error::io("extract", dst, e))? {
        let mut entry = entry.map_err(|e| Error::io("extract", dst, e))?;
        let relative = entry
            .path()
            .map_err(|e| Error::io("extract", dst, e))?
            .into_owned();
        let target = dst.join(&relative);

        match entry.header().entry_type() {
            EntryType::Directory => {
                epm_fs::make_directory_all(&target).map_err(|e| Error::io("mkdir", &target, io_error(e)))?;
            }
            EntryType::Symlink => {
                let link_target = entry
                    .link_name()
                    .map_err(|e| Error::io("extract", &target, e))?
                    .map(|c| c.into_owned())
                    .unwrap_or_default();
                if let Some(parent) = target.parent() {
                    epm_fs::make_directory_all(parent).map_err(|e| Error::io("mkdir", parent, io_error(e)))?;
                }
                epm_fs::symlink(&link_target, &target).map_err(|e| Error::io("symlink", &target, io_error(e)))?;
            }
            EntryType::Regular | EntryType::Continuous => {
                if let Some(parent) = target.parent() {
                    epm_fs::make_directory_all(parent).map_err(|e| Error::io("mkdir", parent, io_error(e)))?;
                }
                let mut out =
                    fs_err::File::create(&target).map_err(|e| Error::io("extract", &target, e))?;
                io::copy(&mut entry, &mut out).map_err(|e| Error::io("extract", &target, e))?;
                drop(out);
                if let Ok(mode) = entry.header().mode() {
                    epm_fs::chmod(&target, mode).map_err(|e| Error::io("chmod", &target, io_error(e)))?;
                }
            }
            // Character/block devices, FIFOs and the like: the original
            // extractor never wrote these, so neither do we.
            _ => {}
        }
    }
    Ok(())
}

fn io_error(e: epm_fs::Error) -> io::Error {
    match e {
        epm_fs::Error::Io { source, .. } => source,
        other => io::Error::other(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_regular_files_and_directories() {
        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_ustar();
        header.set_size(5);
        header.set_mode(0o644);
        header.set_entry_type(EntryType::Regular);
        header.set_cksum();
        builder.append_data(&mut header, "dir/file.txt", &b"hello"[..]).unwrap();
        let bytes = builder.into_inner().unwrap();

        let dst = tempfile::tempdir().unwrap();
        extract(&bytes[..], dst.path()).unwrap();

        assert_eq!(std::fs::read(dst.path().join("dir/file.txt")).unwrap(), b"hello");
    }
}
