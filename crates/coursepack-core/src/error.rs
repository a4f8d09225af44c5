/// The closed error taxonomy for the parsing pipeline.
///
/// Five kinds, mirroring the pipeline stages: backend file access,
/// detection, manifest parsing, reference resolution, and validation.
/// Every error carries a diagnostic metadata bag (`serde_json` map) so
/// callers can attach and inspect context — which plugin probed, which
/// file failed, what was expected — without the type system growing a
/// field per fact.
///
/// Parsers recover locally from recoverable data defects (missing optional
/// fields, case-mismatched filenames) and propagate
/// [`ParseError::ManifestParse`] only for structural defects. The
/// validator never propagates: it always returns a result, and the
/// top-level facade wraps error-severity findings into
/// [`ParseError::Validation`] on request.
use std::fmt;

use serde_json::{Map, Value};

use crate::file_access::FileAccessError;
use crate::validation::ValidationResult;

/// Diagnostic context bag attached to every error kind.
pub type ErrorMetadata = Map<String, Value>;

// ---------------------------------------------------------------------------
// DetectionError
// ---------------------------------------------------------------------------

/// Failure to determine the module type of a package.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionError {
    /// Every registered plugin declined the package.
    Unknown {
        /// Diagnostic context (plugins consulted, paths probed).
        metadata: ErrorMetadata,
    },
    /// A probe found its marker file but could not make sense of it.
    Malformed {
        /// The file the probe was examining.
        file: String,
        /// What went wrong.
        cause: String,
        /// Diagnostic context.
        metadata: ErrorMetadata,
    },
    /// The probe itself failed at the backend.
    FileAccess(FileAccessError),
}

impl DetectionError {
    /// An [`DetectionError::Unknown`] with an empty metadata bag.
    pub fn unknown() -> Self {
        Self::Unknown {
            metadata: ErrorMetadata::new(),
        }
    }

    /// A [`DetectionError::Malformed`] with an empty metadata bag.
    pub fn malformed(file: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::Malformed {
            file: file.into(),
            cause: cause.into(),
            metadata: ErrorMetadata::new(),
        }
    }

    /// Read access to the metadata bag.
    pub fn metadata(&self) -> Option<&ErrorMetadata> {
        match self {
            Self::Unknown { metadata } | Self::Malformed { metadata, .. } => Some(metadata),
            Self::FileAccess(_) => None,
        }
    }

    /// Inserts a diagnostic key, returning `self` for chaining.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        match &mut self {
            Self::Unknown { metadata } | Self::Malformed { metadata, .. } => {
                metadata.insert(key.into(), value);
            }
            Self::FileAccess(_) => {}
        }
        self
    }
}

impl fmt::Display for DetectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown { .. } => f.write_str("no detector plugin recognised the package"),
            Self::Malformed { file, cause, .. } => {
                write!(f, "detection found \"{file}\" but could not read it: {cause}")
            }
            Self::FileAccess(e) => write!(f, "detection probe failed: {e}"),
        }
    }
}

impl std::error::Error for DetectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FileAccess(e) => Some(e),
            Self::Unknown { .. } | Self::Malformed { .. } => None,
        }
    }
}

impl From<FileAccessError> for DetectionError {
    fn from(e: FileAccessError) -> Self {
        Self::FileAccess(e)
    }
}

// ---------------------------------------------------------------------------
// ManifestParseError
// ---------------------------------------------------------------------------

/// A structural failure while binding a manifest document.
///
/// Malformed XML, bad UTF-8, an unparsable number in a position the schema
/// requires — anything the binding layer cannot recover from by applying a
/// default. Missing optional fields are never a parse error.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestParseError {
    /// Package-relative path of the offending document.
    pub file: String,
    /// Byte offset of the defect, where the underlying reader can say.
    pub byte_offset: Option<usize>,
    /// Human-readable description of the defect.
    pub cause: String,
    /// Diagnostic context.
    pub metadata: ErrorMetadata,
}

impl ManifestParseError {
    /// Constructs a [`ManifestParseError`] without an offset.
    pub fn new(file: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            byte_offset: None,
            cause: cause.into(),
            metadata: ErrorMetadata::new(),
        }
    }

    /// Attaches a byte offset.
    pub fn at_offset(mut self, offset: usize) -> Self {
        self.byte_offset = Some(offset);
        self
    }

    /// Inserts a diagnostic key, returning `self` for chaining.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

impl fmt::Display for ManifestParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.byte_offset {
            Some(offset) => {
                write!(f, "failed to parse \"{}\" at byte {offset}: {}", self.file, self.cause)
            }
            None => write!(f, "failed to parse \"{}\": {}", self.file, self.cause),
        }
    }
}

impl std::error::Error for ManifestParseError {}

// ---------------------------------------------------------------------------
// ResolutionError
// ---------------------------------------------------------------------------

/// A reference-resolution failure the validator cannot carry as an issue.
///
/// Almost everything the resolver finds becomes a validation issue; this
/// type exists for the few defects that leave no coherent model to
/// validate.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionError {
    /// What failed to resolve.
    pub message: String,
    /// Diagnostic context.
    pub metadata: ErrorMetadata,
}

impl ResolutionError {
    /// Constructs a [`ResolutionError`].
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            metadata: ErrorMetadata::new(),
        }
    }

    /// Inserts a diagnostic key, returning `self` for chaining.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reference resolution failed: {}", self.message)
    }
}

impl std::error::Error for ResolutionError {}

// ---------------------------------------------------------------------------
// ParseError
// ---------------------------------------------------------------------------

/// The top-level error union returned by the parse facade.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The storage backend failed.
    FileAccess(FileAccessError),
    /// The module type could not be determined.
    Detection(DetectionError),
    /// A manifest document was structurally unreadable.
    ManifestParse(ManifestParseError),
    /// Reference resolution failed unrecoverably.
    Resolution(ResolutionError),
    /// Parsing succeeded but validation found error-severity issues
    /// (strict mode only).
    Validation {
        /// What was being validated, for diagnostics.
        context: String,
        /// The full result, for inspection.
        result: ValidationResult,
        /// Diagnostic context.
        metadata: ErrorMetadata,
    },
}

impl ParseError {
    /// Wraps a [`ValidationResult`] carrying errors.
    pub fn validation(context: impl Into<String>, result: ValidationResult) -> Self {
        Self::Validation {
            context: context.into(),
            result,
            metadata: ErrorMetadata::new(),
        }
    }

    /// The validation result, when this is a validation failure.
    pub fn validation_result(&self) -> Option<&ValidationResult> {
        match self {
            Self::Validation { result, .. } => Some(result),
            Self::FileAccess(_)
            | Self::Detection(_)
            | Self::ManifestParse(_)
            | Self::Resolution(_) => None,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileAccess(e) => write!(f, "{e}"),
            Self::Detection(e) => write!(f, "{e}"),
            Self::ManifestParse(e) => write!(f, "{e}"),
            Self::Resolution(e) => write!(f, "{e}"),
            Self::Validation { context, result, .. } => write!(
                f,
                "validation of {context} found {} error(s)",
                result.errors().count()
            ),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FileAccess(e) => Some(e),
            Self::Detection(e) => Some(e),
            Self::ManifestParse(e) => Some(e),
            Self::Resolution(e) => Some(e),
            Self::Validation { .. } => None,
        }
    }
}

impl From<FileAccessError> for ParseError {
    fn from(e: FileAccessError) -> Self {
        Self::FileAccess(e)
    }
}

impl From<DetectionError> for ParseError {
    fn from(e: DetectionError) -> Self {
        Self::Detection(e)
    }
}

impl From<ManifestParseError> for ParseError {
    fn from(e: ManifestParseError) -> Self {
        Self::ManifestParse(e)
    }
}

impl From<ResolutionError> for ParseError {
    fn from(e: ResolutionError) -> Self {
        Self::Resolution(e)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use serde_json::json;

    use super::*;

    #[test]
    fn detection_metadata_chaining() {
        let err = DetectionError::malformed("imsmanifest.xml", "unexpected end of stream")
            .with_metadata("plugin", json!("scorm"));
        let metadata = err.metadata().expect("has bag");
        assert_eq!(metadata.get("plugin"), Some(&json!("scorm")));
        assert!(err.to_string().contains("imsmanifest.xml"));
    }

    #[test]
    fn manifest_parse_display_includes_offset() {
        let err = ManifestParseError::new("cmi5.xml", "unclosed element").at_offset(421);
        assert_eq!(
            err.to_string(),
            "failed to parse \"cmi5.xml\" at byte 421: unclosed element"
        );
    }

    #[test]
    fn parse_error_source_chain() {
        use std::error::Error as _;
        let inner = crate::file_access::FileAccessError::not_found("a.bin");
        let err = ParseError::from(inner.clone());
        let source = err.source().expect("has source");
        assert_eq!(source.to_string(), inner.to_string());
    }
}
