use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::Error;

pub fn extract(src: &Path, dst: &Path) -> Result<(), Error> {
    let file = fs_err::File::open(src).map_err(|e| Error::io("extract", src, e))?;
    // A second handle, used only to read the raw external-attributes
    // field of a DOS-origin entry's central directory record — `unix_mode`
    // covers the Unix case but the `zip` crate has no equivalent getter
    // for the FAT attribute byte, so that one field is read back by hand.
    let mut attrs_file = fs_err::File::open(src).map_err(|e| Error::io("extract", src, e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|source| Error::Zip {
        path: src.to_path_buf(),
        source,
    })?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|source| Error::Zip {
            path: src.to_path_buf(),
            source,
        })?;

        // `enclosed_name` rejects absolute paths and `..` components,
        // which the USTar/PAX path guards the sibling tar extractor gets
        // by construction have no equivalent for in the zip central
        // directory.
        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!(entry = entry.name(), "skipping zip entry with unsafe path");
            continue;
        };
        let target = dst.join(relative);

        if entry.is_dir() {
            epm_fs::make_directory_all(&target).map_err(|e| Error::io("mkdir", &target, io_error(e)))?;
            continue;
        }

        if let Some(parent) = target.parent() {
            epm_fs::make_directory_all(parent).map_err(|e| Error::io("mkdir", parent, io_error(e)))?;
        }

        let mut out = fs_err::File::create(&target).map_err(|e| Error::io("extract", &target, e))?;
        io::copy(&mut entry, &mut out).map_err(|e| Error::io("extract", &target, e))?;
        drop(out);

        let mode = derived_mode(&entry, &mut attrs_file);
        epm_fs::chmod(&target, mode).map_err(|e| Error::io("chmod", &target, io_error(e)))?;
    }

    Ok(())
}

/// FAT attribute bits, as packed into the low byte of a DOS-origin
/// entry's external attributes (PKZIP APPNOTE central directory record).
const DOS_ATTR_READONLY: u32 = 0x01;
const DOS_ATTR_DIRECTORY: u32 = 0x10;

/// Offset of the 4-byte external-attributes field within a central
/// directory file header, counting from its signature.
const EXTERNAL_ATTRIBUTES_OFFSET: u64 = 38;

/// A unix-built zip stores the real mode in the upper 16 bits of the
/// external attributes, which `unix_mode` already extracts. A DOS-built
/// zip carries no unix mode at all — just the FAT read-only and
/// directory bits in the attributes' low byte — so those are translated
/// into `0o444`/`0o644`/`0o755` by hand, per the original behaviour.
fn derived_mode(entry: &zip::read::ZipFile, attrs_file: &mut fs_err::File) -> u32 {
    if let Some(mode) = entry.unix_mode() {
        return mode;
    }

    let is_dir = entry.is_dir();
    match read_dos_attributes(attrs_file, entry.central_header_start()) {
        Ok(attrs) => {
            let is_dir = is_dir || attrs & DOS_ATTR_DIRECTORY != 0;
            let read_only = attrs & DOS_ATTR_READONLY != 0;
            match (is_dir, read_only) {
                (true, _) => 0o755,
                (false, true) => 0o444,
                (false, false) => 0o644,
            }
        }
        Err(source) => {
            tracing::warn!(
                entry = entry.name(),
                %source,
                "couldn't read DOS external attributes, defaulting permissions"
            );
            if is_dir { 0o755 } else { 0o644 }
        }
    }
}

fn read_dos_attributes(file: &mut fs_err::File, central_header_start: u64) -> io::Result<u32> {
    file.seek(SeekFrom::Start(central_header_start + EXTERNAL_ATTRIBUTES_OFFSET))?;
    let mut buf = [0u8; 4];
    file.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf) & 0xFF)
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
    use std::io::Write;

    #[test]
    fn extracts_files_and_directories() {
        let src_dir = tempfile::tempdir().unwrap();
        let archive_path = src_dir.path().join("a.zip");
        {
            let file = std::fs::File::create(&archive_path).unwrap();
            let mut writer = zip::ZipWriter::new(file);
            let options = zip::write::SimpleFileOptions::default();
            writer.add_directory("sub/", options).unwrap();
            writer.start_file("sub/hello.txt", options).unwrap();
            writer.write_all(b"hi there").unwrap();
            writer.finish().unwrap();
        }

        let dst = tempfile::tempdir().unwrap();
        extract(&archive_path, dst.path()).unwrap();

        let extracted = dst.path().join("sub/hello.txt");
        assert_eq!(std::fs::read(&extracted).unwrap(), b"hi there");
    }
}
