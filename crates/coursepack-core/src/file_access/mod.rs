/// The read-only byte-access contract between the parsing core and package
/// storage.
///
/// Every component above this module reaches package bytes exclusively
/// through [`FileAccess`]; nothing in the core may assume a local
/// filesystem. Paths on the contract are forward-slash, package-relative,
/// and case-sensitive; the case-insensitive manifest probing historic
/// content requires is concentrated in [`find_case_insensitive`].
///
/// Backends provided here: [`LocalFileAccess`] over a rooted directory,
/// [`MemoryFileAccess`] over an in-memory map, and (behind the `zip`
/// feature) [`ZipFileAccess`] over a ZIP archive with decompression caps.
pub mod local;
pub mod memory;
#[cfg(feature = "zip")]
pub mod zip;

use std::fmt;
use std::io::Read;

pub use local::LocalFileAccess;
pub use memory::MemoryFileAccess;
#[cfg(feature = "zip")]
pub use zip::{ZipFileAccess, ZipLimits};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// The operation a backend was performing when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileOperation {
    /// Enumerating paths under a prefix.
    List,
    /// Opening or reading a file's bytes.
    Read,
    /// Probing for existence.
    Probe,
}

impl fmt::Display for FileOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => f.write_str("list"),
            Self::Read => f.write_str("read"),
            Self::Probe => f.write_str("probe"),
        }
    }
}

/// Why a backend operation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileAccessErrorKind {
    /// The path does not exist in the package.
    NotFound,
    /// The backend denied access.
    PermissionDenied,
    /// A decompression or size cap was exceeded.
    ///
    /// Carries the cap that was hit, in the unit of that cap (bytes for the
    /// per-file cap, ratio for the expansion cap).
    LimitExceeded {
        /// Human-readable name of the limit (`"max_decompressed_file_size"`
        /// or `"max_expansion_ratio"`).
        limit: &'static str,
        /// The configured cap value.
        cap: u64,
    },
    /// A path tried to escape the package root.
    OutsideRoot,
    /// Any other I/O failure, with the underlying message.
    Io(String),
}

impl fmt::Display for FileAccessErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("not found"),
            Self::PermissionDenied => f.write_str("permission denied"),
            Self::LimitExceeded { limit, cap } => {
                write!(f, "limit exceeded: {limit} (cap {cap})")
            }
            Self::OutsideRoot => f.write_str("path escapes the package root"),
            Self::Io(message) => write!(f, "i/o error: {message}"),
        }
    }
}

/// A backend-level failure, carrying the path and operation that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAccessError {
    /// The package-relative path involved.
    pub path: String,
    /// The operation in progress.
    pub operation: FileOperation,
    /// The underlying cause.
    pub kind: FileAccessErrorKind,
}

impl FileAccessError {
    /// Constructs a [`FileAccessError`].
    pub fn new(
        path: impl Into<String>,
        operation: FileOperation,
        kind: FileAccessErrorKind,
    ) -> Self {
        Self {
            path: path.into(),
            operation,
            kind,
        }
    }

    /// Convenience constructor for a not-found read failure.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::new(path, FileOperation::Read, FileAccessErrorKind::NotFound)
    }
}

impl fmt::Display for FileAccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed for \"{}\": {}", self.operation, self.path, self.kind)
    }
}

impl std::error::Error for FileAccessError {}

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

/// Read-only access to an opaque package tree.
///
/// Paths are forward-slash separated and relative to the package root; the
/// empty string denotes the root itself. Implementations must release any
/// handle they open before each method returns — the core never retains a
/// stream past the call in which it was opened.
pub trait FileAccess {
    /// Enumerates every file path under `prefix` (recursively).
    ///
    /// An empty prefix lists the whole package. Directories themselves are
    /// not listed, only files.
    fn list(&self, prefix: &str) -> Result<Vec<String>, FileAccessError>;

    /// Returns `true` if `path` names an existing file.
    ///
    /// Probe failures (backend unreachable, permission) report `false`;
    /// existence checks are used by validation rules, which must not abort
    /// the pass.
    fn exists(&self, path: &str) -> bool;

    /// Opens `path` for reading.
    fn open(&self, path: &str) -> Result<Box<dyn Read + '_>, FileAccessError>;

    /// The backend's notion of the package root, for diagnostics only.
    fn root_path(&self) -> &str;

    /// Total size in bytes of the package contents, when the backend can
    /// answer cheaply.
    fn total_size(&self) -> Option<u64>;
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Reads the full contents of `path` into a byte vector.
///
/// The stream is opened and released within this call.
pub fn read_bytes(fa: &dyn FileAccess, path: &str) -> Result<Vec<u8>, FileAccessError> {
    let mut reader = fa.open(path)?;
    let mut buffer = Vec::new();
    reader
        .read_to_end(&mut buffer)
        .map_err(|e| FileAccessError::new(path, FileOperation::Read, FileAccessErrorKind::Io(e.to_string())))?;
    Ok(buffer)
}

/// Reads `path` as UTF-8 text, stripping a leading BOM if present.
///
/// Invalid UTF-8 is an I/O-kind failure here; callers in the binding layer
/// map it onto a manifest parse error with the offending path.
pub fn read_to_string(fa: &dyn FileAccess, path: &str) -> Result<String, FileAccessError> {
    let bytes = read_bytes(fa, path)?;
    let text = String::from_utf8(bytes).map_err(|e| {
        FileAccessError::new(
            path,
            FileOperation::Read,
            FileAccessErrorKind::Io(format!("invalid UTF-8: {e}")),
        )
    })?;
    Ok(match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_owned(),
        None => text,
    })
}

/// Finds a file named `name` (case-insensitively) directly under `dir`.
///
/// Returns the path in its on-the-wire casing so subsequent reads hit the
/// backend verbatim. `dir` is `""` for the package root. Matching is
/// restricted to the immediate directory; nested paths do not match.
pub fn find_case_insensitive(
    fa: &dyn FileAccess,
    dir: &str,
    name: &str,
) -> Result<Option<String>, FileAccessError> {
    let entries = fa.list(dir)?;
    let wanted = name.to_ascii_lowercase();
    let dir_prefix = if dir.is_empty() {
        String::new()
    } else {
        format!("{}/", dir.trim_end_matches('/'))
    };

    for entry in entries {
        let Some(rest) = entry.strip_prefix(&dir_prefix) else {
            continue;
        };
        if rest.contains('/') {
            continue;
        }
        if rest.to_ascii_lowercase() == wanted {
            return Ok(Some(entry));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    fn memory_fixture() -> MemoryFileAccess {
        let mut fa = MemoryFileAccess::new();
        fa.insert("IMSMANIFEST.XML", b"<manifest/>".to_vec());
        fa.insert("content/index.html", b"<html></html>".to_vec());
        fa.insert("content/media/clip.mp4", vec![0u8; 16]);
        fa
    }

    #[test]
    fn case_insensitive_lookup_returns_wire_casing() {
        let fa = memory_fixture();
        let found = find_case_insensitive(&fa, "", "imsmanifest.xml").expect("list succeeds");
        assert_eq!(found.as_deref(), Some("IMSMANIFEST.XML"));
    }

    #[test]
    fn case_insensitive_lookup_does_not_descend() {
        let fa = memory_fixture();
        let found = find_case_insensitive(&fa, "", "index.html").expect("list succeeds");
        assert_eq!(found, None);

        let found = find_case_insensitive(&fa, "content", "INDEX.HTML").expect("list succeeds");
        assert_eq!(found.as_deref(), Some("content/index.html"));
    }

    #[test]
    fn read_to_string_strips_bom() {
        let mut fa = MemoryFileAccess::new();
        fa.insert("a.txt", b"\xef\xbb\xbfhello".to_vec());
        assert_eq!(read_to_string(&fa, "a.txt").expect("reads"), "hello");
    }

    #[test]
    fn read_to_string_rejects_bad_utf8() {
        let mut fa = MemoryFileAccess::new();
        fa.insert("bad.txt", vec![0xff, 0xfe, 0x00]);
        let err = read_to_string(&fa, "bad.txt").expect_err("must fail");
        assert!(matches!(err.kind, FileAccessErrorKind::Io(_)));
    }
}
