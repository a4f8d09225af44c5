/// ZIP-archive [`FileAccess`] backend with zip-bomb defenses.
///
/// Extraction is eager: the archive is expanded into an in-memory map at
/// construction, enforcing both caps as it goes, so cap violations surface
/// immediately and the steady-state read path never touches the archive
/// again. Backends that must stream very large packages implement
/// [`FileAccess`] directly instead.
use std::io::{Read, Seek};

use super::memory::MemoryFileAccess;
use super::{FileAccess, FileAccessError, FileAccessErrorKind, FileOperation};

/// Decompression caps applied while expanding an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZipLimits {
    /// Maximum decompressed size of any single entry, in bytes.
    pub max_decompressed_file_size: u64,
    /// Maximum ratio of total decompressed bytes to total compressed bytes.
    pub max_expansion_ratio: u32,
}

impl Default for ZipLimits {
    /// 100 MB per file, 200:1 total expansion.
    fn default() -> Self {
        Self {
            max_decompressed_file_size: 100_000_000,
            max_expansion_ratio: 200,
        }
    }
}

/// A package backed by a ZIP archive, fully expanded in memory.
#[derive(Debug, Clone)]
pub struct ZipFileAccess {
    inner: MemoryFileAccess,
    root_display: String,
}

impl ZipFileAccess {
    /// Expands `reader` with the default [`ZipLimits`].
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self, FileAccessError> {
        Self::with_limits(reader, ZipLimits::default())
    }

    /// Expands `reader`, enforcing `limits` entry by entry.
    pub fn with_limits<R: Read + Seek>(
        reader: R,
        limits: ZipLimits,
    ) -> Result<Self, FileAccessError> {
        let mut archive = ::zip::ZipArchive::new(reader).map_err(|e| {
            FileAccessError::new("", FileOperation::List, FileAccessErrorKind::Io(e.to_string()))
        })?;

        let mut inner = MemoryFileAccess::new();
        let mut total_compressed: u64 = 0;
        let mut total_decompressed: u64 = 0;

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index).map_err(|e| {
                FileAccessError::new(
                    format!("entry #{index}"),
                    FileOperation::Read,
                    FileAccessErrorKind::Io(e.to_string()),
                )
            })?;
            if entry.is_dir() {
                continue;
            }

            // Entry names are attacker-controlled; only mangled-name-safe
            // entries become package paths.
            let Some(name) = entry.enclosed_name() else {
                return Err(FileAccessError::new(
                    entry.name(),
                    FileOperation::Read,
                    FileAccessErrorKind::OutsideRoot,
                ));
            };
            let path = name.to_string_lossy().replace('\\', "/");

            if entry.size() > limits.max_decompressed_file_size {
                return Err(FileAccessError::new(
                    path,
                    FileOperation::Read,
                    FileAccessErrorKind::LimitExceeded {
                        limit: "max_decompressed_file_size",
                        cap: limits.max_decompressed_file_size,
                    },
                ));
            }

            // The declared size is not trusted; the read itself is capped.
            let mut bytes = Vec::with_capacity(entry.size() as usize);
            let read = (&mut entry)
                .take(limits.max_decompressed_file_size + 1)
                .read_to_end(&mut bytes)
                .map_err(|e| {
                    FileAccessError::new(
                        path.clone(),
                        FileOperation::Read,
                        FileAccessErrorKind::Io(e.to_string()),
                    )
                })?;
            if read as u64 > limits.max_decompressed_file_size {
                return Err(FileAccessError::new(
                    path,
                    FileOperation::Read,
                    FileAccessErrorKind::LimitExceeded {
                        limit: "max_decompressed_file_size",
                        cap: limits.max_decompressed_file_size,
                    },
                ));
            }

            total_compressed += entry.compressed_size();
            total_decompressed += read as u64;
            if total_decompressed > total_compressed.max(1) * u64::from(limits.max_expansion_ratio)
            {
                return Err(FileAccessError::new(
                    path,
                    FileOperation::Read,
                    FileAccessErrorKind::LimitExceeded {
                        limit: "max_expansion_ratio",
                        cap: u64::from(limits.max_expansion_ratio),
                    },
                ));
            }

            inner.insert(path, bytes);
        }

        Ok(Self {
            inner,
            root_display: "zip:".to_owned(),
        })
    }
}

impl FileAccess for ZipFileAccess {
    fn list(&self, prefix: &str) -> Result<Vec<String>, FileAccessError> {
        self.inner.list(prefix)
    }

    fn exists(&self, path: &str) -> bool {
        self.inner.exists(path)
    }

    fn open(&self, path: &str) -> Result<Box<dyn Read + '_>, FileAccessError> {
        self.inner.open(path)
    }

    fn root_path(&self) -> &str {
        &self.root_display
    }

    fn total_size(&self) -> Option<u64> {
        self.inner.total_size()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use std::io::{Cursor, Write};

    use zip::write::SimpleFileOptions;

    use super::*;

    fn build_zip(entries: &[(&str, &[u8])]) -> Cursor<Vec<u8>> {
        let mut writer = ::zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(::zip::CompressionMethod::Deflated);
        for (name, bytes) in entries {
            writer.start_file(*name, options).expect("start entry");
            writer.write_all(bytes).expect("write entry");
        }
        let cursor = writer.finish().expect("finish archive");
        Cursor::new(cursor.into_inner())
    }

    #[test]
    fn expands_and_serves_entries() {
        let cursor = build_zip(&[
            ("imsmanifest.xml", b"<manifest/>".as_slice()),
            ("content/index.html", b"<html/>".as_slice()),
        ]);
        let fa = ZipFileAccess::from_reader(cursor).expect("expand");
        assert!(fa.exists("content/index.html"));
        let mut text = String::new();
        fa.open("imsmanifest.xml")
            .expect("open")
            .read_to_string(&mut text)
            .expect("read");
        assert_eq!(text, "<manifest/>");
    }

    #[test]
    fn per_file_cap_is_enforced() {
        let big = vec![0u8; 4096];
        let cursor = build_zip(&[("big.bin", big.as_slice())]);
        let limits = ZipLimits {
            max_decompressed_file_size: 1024,
            max_expansion_ratio: 10_000,
        };
        let err = ZipFileAccess::with_limits(cursor, limits).expect_err("must hit cap");
        assert!(matches!(
            err.kind,
            FileAccessErrorKind::LimitExceeded {
                limit: "max_decompressed_file_size",
                ..
            }
        ));
    }

    #[test]
    fn expansion_ratio_cap_is_enforced() {
        // Highly compressible payload: 2 MB of zeros deflates to ~2 KB.
        let zeros = vec![0u8; 2_000_000];
        let cursor = build_zip(&[("zeros.bin", zeros.as_slice())]);
        let limits = ZipLimits {
            max_decompressed_file_size: 100_000_000,
            max_expansion_ratio: 3,
        };
        let err = ZipFileAccess::with_limits(cursor, limits).expect_err("must hit ratio");
        assert!(matches!(
            err.kind,
            FileAccessErrorKind::LimitExceeded {
                limit: "max_expansion_ratio",
                ..
            }
        ));
    }
}
