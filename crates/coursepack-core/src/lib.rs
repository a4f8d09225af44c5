#![deny(clippy::print_stdout, clippy::print_stderr)]

//! Core library for parsing and validating eLearning content packages.
//!
//! Four packaging specifications are supported — SCORM 1.2, SCORM 2004
//! (2nd/3rd/4th editions), AICC (CMI001), and cmi5/Tin Can — behind one
//! pipeline: detect → parse → resolve → validate → project. Packages are
//! reached exclusively through the [`file_access::FileAccess`] contract
//! (local directory, in-memory map, ZIP archive, or your own backend);
//! the output is a typed manifest tree, a structured
//! [`validation::ValidationResult`], and a uniform
//! [`metadata::ModuleMetadata`] summary ready for LMS ingestion.
//!
//! The crate is synchronous and runtime-agnostic: one package per call,
//! no shared mutable state, no tasks spawned. Async backends wrap their
//! own runtime below the file-access contract.

pub mod api;
pub mod detect;
pub mod enums;
pub mod error;
pub mod file_access;
pub mod metadata;
pub mod model;
pub mod newtypes;
pub mod parse;
pub mod prereq;
pub mod resolve;
pub mod validation;
pub mod writer;

pub use api::{detect as detect_module, parse, parse_with, validate, ParseOptions};
pub use detect::{DetectorPlugin, DetectorRegistry};
pub use enums::{
    LaunchMethod, ModuleType, MoveOn, Scorm2004Edition, ScormType, SequencingLevel,
};
pub use error::{
    DetectionError, ErrorMetadata, ManifestParseError, ParseError, ResolutionError,
};
pub use file_access::{
    FileAccess, FileAccessError, FileAccessErrorKind, FileOperation, LocalFileAccess,
    MemoryFileAccess, find_case_insensitive,
};
#[cfg(feature = "zip")]
pub use file_access::{ZipFileAccess, ZipLimits};
pub use metadata::{ManifestModel, MetadataFragment, ModuleMetadata};
pub use model::{AiccManifest, Cmi5Manifest, ScormManifest};
pub use newtypes::{Iso8601Duration, Measure, NewtypeError, ObjectiveWeight};
pub use prereq::{evaluate as evaluate_prerequisite, render as render_prerequisite, PrereqExpr};
pub use resolve::{ActivityNode, ActivityTree, ResolvedScorm, resolve_scorm};
pub use validation::{
    IssueCode, Severity, ValidationIssue, ValidationMode, ValidationResult, ValidationRule,
};
pub use writer::{write_cmi5, write_scorm, WriteError};

/// Returns the current version of the coursepack-core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
