//! Scanning files and folders into ordered lists of records.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Seek};
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use crate::generic::{decode_directories, detect, FileType};
use crate::normalize::normalize;
use crate::record::FileRecord;
use crate::types::{Error, Result};

/// The outcome of scanning a single file.
#[derive(Debug)]
pub enum Scanned {
    /// The file was recognized and its metadata summarized.
    Recognized { file_type: FileType, record: FileRecord },
    /// The file does not have a supported image signature.
    Unknown(FileRecord),
    /// The file could not be read or decoded; the record carries its name only.
    Degraded { record: FileRecord, error: Error },
}

impl Scanned {
    pub fn record(&self) -> &FileRecord {
        match *self {
            Scanned::Recognized { ref record, .. } => record,
            Scanned::Unknown(ref record) => record,
            Scanned::Degraded { ref record, .. } => record,
        }
    }

    pub fn into_record(self) -> FileRecord {
        match self {
            Scanned::Recognized { record, .. } => record,
            Scanned::Unknown(record) => record,
            Scanned::Degraded { record, .. } => record,
        }
    }

    /// Returns the detected file type, if the file was recognized.
    pub fn file_type(&self) -> Option<FileType> {
        match *self {
            Scanned::Recognized { file_type, .. } => Some(file_type),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match *self {
            Scanned::Degraded { ref error, .. } => Some(error),
            _ => None,
        }
    }

    #[inline]
    pub fn is_degraded(&self) -> bool {
        self.error().is_some()
    }
}

/// Returns the last component of a path as a string.
pub fn base_name(path: &Path) -> String {
    match path.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => path.display().to_string(),
    }
}

fn extract<R: BufRead + Seek>(name: &str, r: &mut R) -> Result<Scanned> {
    let file_type = detect(r);
    if file_type == FileType::Unknown {
        return Ok(Scanned::Unknown(FileRecord::name_only(name)));
    }

    let directories = decode_directories(r, file_type)?;
    for dir in &directories {
        trace!(file = name, directory = dir.name(), tags = dir.tags().count(), "decoded directory");
    }

    let record = normalize(file_type, &directories, name, r)?;
    Ok(Scanned::Recognized { file_type, record })
}

fn degrade(name: String, error: Error) -> Scanned {
    warn!(file = %name, "cannot summarize image metadata: {}", error);
    Scanned::Degraded {
        record: FileRecord::name_only(name),
        error,
    }
}

/// Classifies and summarizes an already opened stream positioned at the start of a file.
pub fn classify_and_extract_from<R: BufRead + Seek>(name: &str, r: &mut R) -> Scanned {
    match extract(name, r) {
        Ok(scanned) => scanned,
        Err(e) => degrade(name.to_owned(), e),
    }
}

/// Classifies and summarizes a single file.
///
/// This never fails: files which cannot be opened or decoded produce a degraded record
/// which carries the file name only. The file is closed before this function returns.
pub fn classify_and_extract<P: AsRef<Path>>(path: P) -> Scanned {
    let path = path.as_ref();
    let name = base_name(path);

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => return degrade(name, e.into()),
    };
    let scanned = classify_and_extract_from(&name, &mut BufReader::new(file));
    debug!(
        file = %path.display(),
        mime_type = scanned.file_type().and_then(FileType::mime_type).unwrap_or("unknown"),
        "scanned"
    );
    scanned
}

/// Scans the given files in order, producing exactly one result per path.
pub fn scan_paths<I, P>(paths: I) -> Vec<Scanned>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    paths.into_iter().map(classify_and_extract).collect()
}

/// Lists the regular files directly inside a folder, sorted by name.
///
/// Only a folder which cannot be listed at all is an error; entries which cannot be read
/// are skipped.
pub fn list_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(Error::InvalidPath(dir.to_path_buf()));
    }
    let entries = fs::read_dir(dir)?.map(|entry| entry.map(|e| e.path()));
    Ok(regular_files(entries))
}

fn regular_files<I: IntoIterator<Item = io::Result<PathBuf>>>(entries: I) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => paths.push(path),
            Ok(_) => {}
            Err(e) => warn!("skipping unreadable folder entry: {}", e),
        }
    }
    paths.sort();
    paths
}

/// Scans all regular files directly inside a folder.
///
/// A folder which does not exist is an error reported before any file is read; failures
/// of individual files are reported through their `Scanned` results instead.
pub fn scan_folder<P: AsRef<Path>>(dir: P) -> Result<Vec<Scanned>> {
    let paths = list_files(dir)?;
    debug!("scanning {} files", paths.len());
    Ok(scan_paths(paths))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreadable_entries_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let b = dir.path().join("b.png");
        let a = dir.path().join("a.png");
        fs::write(&b, b"").unwrap();
        fs::write(&a, b"").unwrap();

        let entries = vec![
            Ok(b.clone()),
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "entry is gone")),
            Ok(dir.path().to_path_buf()),
            Ok(a.clone()),
        ];
        assert_eq!(regular_files(entries), vec![a, b]);
    }

    #[test]
    fn base_name_is_the_last_component() {
        assert_eq!(base_name(Path::new("/photos/2001/owl.jpg")), "owl.jpg");
        assert_eq!(base_name(Path::new("owl.jpg")), "owl.jpg");
    }
}
