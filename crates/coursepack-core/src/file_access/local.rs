/// Local-directory [`FileAccess`] backend.
///
/// Rooted at a directory; every path on the contract resolves strictly
/// inside it. Join-time traversal checks reject `..` segments and absolute
/// paths before the filesystem is consulted, so a hostile manifest cannot
/// read outside the package even on backends without canonical-path
/// support.
use std::fs;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use super::{FileAccess, FileAccessError, FileAccessErrorKind, FileOperation};

/// A package rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalFileAccess {
    root: PathBuf,
    root_display: String,
}

impl LocalFileAccess {
    /// Creates a backend rooted at `root`.
    ///
    /// Fails when `root` is not an existing directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, FileAccessError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(FileAccessError::new(
                root.to_string_lossy(),
                FileOperation::Probe,
                FileAccessErrorKind::NotFound,
            ));
        }
        let root_display = root.to_string_lossy().into_owned();
        Ok(Self { root, root_display })
    }

    /// Joins `path` under the root, rejecting escapes.
    fn safe_join(&self, path: &str) -> Result<PathBuf, FileAccessError> {
        let relative = Path::new(path.trim_start_matches("./"));
        let mut joined = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => joined.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(FileAccessError::new(
                        path,
                        FileOperation::Probe,
                        FileAccessErrorKind::OutsideRoot,
                    ));
                }
            }
        }
        Ok(joined)
    }

    fn walk(
        &self,
        dir: &Path,
        prefix: &str,
        out: &mut Vec<String>,
    ) -> Result<(), FileAccessError> {
        let entries = fs::read_dir(dir).map_err(|e| {
            FileAccessError::new(prefix, FileOperation::List, io_kind(&e))
        })?;
        for entry in entries {
            let entry = entry.map_err(|e| {
                FileAccessError::new(prefix, FileOperation::List, io_kind(&e))
            })?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let child_rel = if prefix.is_empty() {
                name
            } else {
                format!("{prefix}/{name}")
            };
            let path = entry.path();
            if path.is_dir() {
                self.walk(&path, &child_rel, out)?;
            } else {
                out.push(child_rel);
            }
        }
        Ok(())
    }
}

fn io_kind(e: &std::io::Error) -> FileAccessErrorKind {
    match e.kind() {
        std::io::ErrorKind::NotFound => FileAccessErrorKind::NotFound,
        std::io::ErrorKind::PermissionDenied => FileAccessErrorKind::PermissionDenied,
        _ => FileAccessErrorKind::Io(e.to_string()),
    }
}

impl FileAccess for LocalFileAccess {
    fn list(&self, prefix: &str) -> Result<Vec<String>, FileAccessError> {
        let normalized = prefix.trim_matches('/');
        let dir = self.safe_join(normalized)?;
        let mut out = Vec::new();
        self.walk(&dir, normalized, &mut out)?;
        out.sort();
        Ok(out)
    }

    fn exists(&self, path: &str) -> bool {
        match self.safe_join(path) {
            Ok(joined) => joined.is_file(),
            Err(_) => false,
        }
    }

    fn open(&self, path: &str) -> Result<Box<dyn Read + '_>, FileAccessError> {
        let joined = self.safe_join(path)?;
        let file = fs::File::open(&joined)
            .map_err(|e| FileAccessError::new(path, FileOperation::Read, io_kind(&e)))?;
        Ok(Box::new(file))
    }

    fn root_path(&self) -> &str {
        &self.root_display
    }

    fn total_size(&self) -> Option<u64> {
        let mut paths = Vec::new();
        self.walk(&self.root, "", &mut paths).ok()?;
        let mut total = 0u64;
        for rel in paths {
            let joined = self.safe_join(&rel).ok()?;
            total += fs::metadata(joined).ok()?.len();
        }
        Some(total)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use std::fs;

    use super::*;

    fn scratch_package() -> (tempfile::TempDir, LocalFileAccess) {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("content")).expect("mkdir");
        fs::write(dir.path().join("imsmanifest.xml"), "<manifest/>").expect("write");
        fs::write(dir.path().join("content/index.html"), "<html/>").expect("write");
        let fa = LocalFileAccess::new(dir.path()).expect("backend");
        (dir, fa)
    }

    #[test]
    fn lists_recursively_with_forward_slashes() {
        let (_dir, fa) = scratch_package();
        let paths = fa.list("").expect("list");
        assert_eq!(
            paths,
            vec!["content/index.html".to_owned(), "imsmanifest.xml".to_owned()]
        );
    }

    #[test]
    fn rejects_traversal() {
        let (_dir, fa) = scratch_package();
        assert!(!fa.exists("../outside.txt"));
        let err = match fa.open("../../etc/passwd") {
            Err(err) => err,
            Ok(_) => panic!("must refuse"),
        };
        assert_eq!(err.kind, FileAccessErrorKind::OutsideRoot);
    }

    #[test]
    fn opens_and_reads() {
        let (_dir, fa) = scratch_package();
        let mut reader = fa.open("content/index.html").expect("open");
        let mut text = String::new();
        reader.read_to_string(&mut text).expect("read");
        assert_eq!(text, "<html/>");
        assert!(fa.total_size().expect("size") > 0);
    }

    #[test]
    fn missing_root_is_an_error() {
        let err = LocalFileAccess::new("/nonexistent/package/root").expect_err("must fail");
        assert_eq!(err.kind, FileAccessErrorKind::NotFound);
    }
}
