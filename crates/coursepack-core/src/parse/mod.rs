/// The binding layer: wire documents to typed manifests.
///
/// One submodule per wire format (`scorm`, `cmi5` for XML; `aicc` over the
/// `ini` reader), plus the shared roxmltree helpers in [`xml`].
///
/// Binding policy, uniform across formats:
/// - structural defects (malformed syntax, bad encoding, an unparsable
///   number where the schema requires one) fail fast with a
///   [`crate::error::ManifestParseError`];
/// - missing optional fields become `None` or the schema's default;
/// - range violations on spec-constrained numerics are *captured* as
///   validation issues and the field left absent, so parsing never
///   panics and the validator reports them in context.
pub mod aicc;
pub mod cmi5;
pub mod ini;
pub mod scorm;
pub mod xml;

pub use aicc::parse_aicc;
pub use cmi5::parse_cmi5;
pub use scorm::{parse_scorm, ScormParseOutput};
