/// Manifest serialization.
///
/// Event-driven writers over `quick_xml::Writer`, one per XML format.
/// The writers exist for the semantic round-trip guarantee: a manifest
/// written here re-parses to an equal model, with every vocabulary token
/// emitted verbatim. They emit only what the model carries — fields that
/// equal their schema default are omitted, which the binding layer
/// restores on re-parse.
pub mod cmi5;
pub mod scorm;

use std::fmt;

pub use cmi5::write_cmi5;
pub use scorm::write_scorm;

/// Serialization failure (I/O through the in-memory writer, or a model
/// that cannot be expressed, which indicates a bug upstream).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteError {
    /// What failed.
    pub message: String,
}

impl WriteError {
    pub(crate) fn new(message: impl fmt::Display) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "manifest serialization failed: {}", self.message)
    }
}

impl std::error::Error for WriteError {}
