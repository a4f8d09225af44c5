/// In-memory [`FileAccess`] backend over a path → bytes map.
///
/// The workhorse behind unit tests and the extraction target for the ZIP
/// backend. Paths are stored exactly as inserted (forward-slash,
/// package-relative).
use std::collections::BTreeMap;
use std::io::{Cursor, Read};

use super::{FileAccess, FileAccessError, FileAccessErrorKind, FileOperation};

/// A package held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileAccess {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryFileAccess {
    /// Creates an empty package.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts (or replaces) a file.
    ///
    /// Leading `./` and `/` are normalized away so lookups through the
    /// contract behave uniformly.
    pub fn insert(&mut self, path: impl Into<String>, bytes: Vec<u8>) {
        self.files.insert(normalize(&path.into()), bytes);
    }

    /// Number of files in the package.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if the package holds no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FromIterator<(String, Vec<u8>)> for MemoryFileAccess {
    fn from_iter<I: IntoIterator<Item = (String, Vec<u8>)>>(iter: I) -> Self {
        let mut fa = Self::new();
        for (path, bytes) in iter {
            fa.insert(path, bytes);
        }
        fa
    }
}

fn normalize(path: &str) -> String {
    path.trim_start_matches("./").trim_start_matches('/').to_owned()
}

impl FileAccess for MemoryFileAccess {
    fn list(&self, prefix: &str) -> Result<Vec<String>, FileAccessError> {
        let prefix = normalize(prefix);
        let paths = self
            .files
            .keys()
            .filter(|p| {
                prefix.is_empty()
                    || p.starts_with(&format!("{}/", prefix.trim_end_matches('/')))
            })
            .cloned()
            .collect();
        Ok(paths)
    }

    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(&normalize(path))
    }

    fn open(&self, path: &str) -> Result<Box<dyn Read + '_>, FileAccessError> {
        let key = normalize(path);
        match self.files.get(&key) {
            Some(bytes) => Ok(Box::new(Cursor::new(bytes.as_slice()))),
            None => Err(FileAccessError::new(
                key,
                FileOperation::Read,
                FileAccessErrorKind::NotFound,
            )),
        }
    }

    fn root_path(&self) -> &str {
        "memory:"
    }

    fn total_size(&self) -> Option<u64> {
        Some(self.files.values().map(|b| b.len() as u64).sum())
    }
}
