//! Peeking into submitted archives without unpacking them.
use std::fs::File;
use std::path::Path;

use common::fixes::FixKind;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("not an archive: {0}")]
    NotArchive(String),
    #[error("archive unpacks to {size} bytes, over the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },
    #[error("bad zip file: {0}")]
    BadZip(#[from] zip::result::ZipError),
    #[error("bad 7z file: {0}")]
    Bad7z(#[from] sevenz_rust::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Names of every entry (directories included) in the `.zip` or `.7z` at `path`.
///
/// Fails with [`ArchiveError::TooLarge`] when the entries add up to more than
/// `max_unpacked` bytes. Blocking, run it off the async runtime.
pub fn member_names(path: &Path, max_unpacked: u64) -> Result<Vec<String>, ArchiveError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (names, size) = match FixKind::of(&name) {
        Some(FixKind::Zip) => zip_members(path)?,
        Some(FixKind::SevenZip) => seven_zip_members(path)?,
        _ => return Err(ArchiveError::NotArchive(name)),
    };
    if size > max_unpacked {
        return Err(ArchiveError::TooLarge {
            size,
            limit: max_unpacked,
        });
    }
    Ok(names)
}

fn zip_members(path: &Path) -> Result<(Vec<String>, u64), ArchiveError> {
    let mut archive = zip::ZipArchive::new(File::open(path)?)?;
    let mut names = Vec::with_capacity(archive.len());
    let mut size = 0u64;
    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i)?;
        size = size.saturating_add(entry.size());
        names.push(entry.name().to_string());
    }
    Ok((names, size))
}

fn seven_zip_members(path: &Path) -> Result<(Vec<String>, u64), ArchiveError> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    let archive = sevenz_rust::Archive::read(&mut file, len, &[])?;
    let size = archive
        .files
        .iter()
        .fold(0u64, |acc, e| acc.saturating_add(e.size));
    let names = archive.files.into_iter().map(|e| e.name).collect();
    Ok((names, size))
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Write;
    use std::path::Path;

    use common::fixes::archive_members_valid;
    use sevenz_rust::{SevenZArchiveEntry, SevenZWriter};
    use zip::write::SimpleFileOptions;

    use super::{member_names, ArchiveError};

    const GOOD: &str = "1b3e4c1a-7d2f-4a55-9b7e-0f3c2d1e4a5b";

    /// Build a zip with one small entry per name.
    pub(crate) fn zip_bytes(names: &[&str]) -> Vec<u8> {
        let mut w = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for name in names {
            if name.ends_with('/') {
                w.add_directory(*name, SimpleFileOptions::default()).unwrap();
            } else {
                w.start_file(*name, SimpleFileOptions::default()).unwrap();
                w.write_all(b"hello").unwrap();
            }
        }
        w.finish().unwrap().into_inner()
    }

    /// Build a 7z with one small entry per name, names ending in `/` become directories.
    pub(crate) fn seven_zip_bytes(names: &[&str]) -> Vec<u8> {
        let mut w = SevenZWriter::new(std::io::Cursor::new(Vec::new())).unwrap();
        for name in names {
            let mut entry = SevenZArchiveEntry::new();
            entry.name = name.trim_end_matches('/').to_string();
            if name.ends_with('/') {
                entry.is_directory = true;
                w.push_archive_entry::<&[u8]>(entry, None).unwrap();
            } else {
                w.push_archive_entry(entry, Some(&b"hello"[..])).unwrap();
            }
        }
        w.finish().unwrap().into_inner()
    }

    fn write(dir: &Path, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let p = dir.join(name);
        std::fs::write(&p, bytes).unwrap();
        p
    }

    #[test]
    fn test_lists_zip_members() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(
            dir.path(),
            "fix.zip",
            &zip_bytes(&["a/", "a/b.txt", "c.json"]),
        );
        assert_eq!(
            member_names(&p, u64::MAX).unwrap(),
            vec!["a/", "a/b.txt", "c.json"]
        );
    }

    #[test]
    fn test_zip_over_limit() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(dir.path(), "fix.zip", &zip_bytes(&["a.txt", "b.txt"]));
        // two entries of five bytes each
        assert!(matches!(
            member_names(&p, 9),
            Err(ArchiveError::TooLarge { size: 10, limit: 9 })
        ));
        assert!(member_names(&p, 10).is_ok());
    }

    #[test]
    fn test_rejects_other_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(dir.path(), "fix.rar", &zip_bytes(&["a.txt"]));
        assert!(matches!(
            member_names(&p, u64::MAX),
            Err(ArchiveError::NotArchive(n)) if n == "fix.rar"
        ));
    }

    #[test]
    fn test_corrupt_zip() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(dir.path(), "fix.zip", b"definitely not a zip");
        assert!(matches!(
            member_names(&p, u64::MAX),
            Err(ArchiveError::BadZip(_))
        ));
    }

    #[test]
    fn test_lists_7z_members() {
        let dir = tempfile::tempdir().unwrap();
        let meta = format!("{}/meta.yaml", GOOD);
        let p = write(
            dir.path(),
            "fix.7z",
            &seven_zip_bytes(&[format!("{}/", GOOD).as_str(), meta.as_str()]),
        );
        let names = member_names(&p, u64::MAX).unwrap();
        assert_eq!(names, vec![GOOD.to_string(), meta]);
        assert!(archive_members_valid(&names));
    }

    #[test]
    fn test_7z_with_stray_member_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let meta = format!("{}/meta.yaml", GOOD);
        let p = write(
            dir.path(),
            "fix.7z",
            &seven_zip_bytes(&[meta.as_str(), "readme.txt"]),
        );
        let names = member_names(&p, u64::MAX).unwrap();
        assert_eq!(names, vec![meta, "readme.txt".to_string()]);
        assert!(!archive_members_valid(&names));
    }

    #[test]
    fn test_7z_over_limit() {
        let dir = tempfile::tempdir().unwrap();
        let meta = format!("{}/meta.yaml", GOOD);
        let p = write(dir.path(), "fix.7z", &seven_zip_bytes(&[meta.as_str()]));
        assert!(matches!(
            member_names(&p, 4),
            Err(ArchiveError::TooLarge { size: 5, limit: 4 })
        ));
    }

    #[test]
    fn test_corrupt_7z() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(dir.path(), "fix.7z", b"definitely not a 7z archive either");
        assert!(matches!(
            member_names(&p, u64::MAX),
            Err(ArchiveError::Bad7z(_))
        ));
    }
}
