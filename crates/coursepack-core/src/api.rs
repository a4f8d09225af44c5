/// The public parse facade: detect → parse → resolve → validate → project.
///
/// One package per call, strictly sequenced, no shared mutable state —
/// concurrent parses of distinct packages are safe. The validator stage
/// never fails; the facade decides what error-severity findings mean:
/// strict mode refuses the package ([`ParseError::Validation`]), lenient
/// mode returns the metadata with every finding embedded in the
/// composite.
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::detect::{self, tincan_present};
use crate::enums::ModuleType;
use crate::error::{DetectionError, ParseError};
use crate::file_access::{self, FileAccess};
use crate::metadata::{
    project_aicc, project_cmi5, project_scorm, MetadataFragment, ModuleMetadata,
};
use crate::parse::{parse_aicc, parse_cmi5, parse_scorm};
use crate::resolve::resolve_scorm;
use crate::validation::rules_aicc::validate_aicc;
use crate::validation::rules_cmi5::validate_cmi5;
use crate::validation::rules_path::{validate_paths, PathEntry};
use crate::validation::rules_scorm::{validate_scorm, ScormContext};
use crate::validation::{
    IssueCode, Severity, ValidationIssue, ValidationMode, ValidationResult,
};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Knobs recognised by [`parse_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Validation mode; strict refuses packages with error findings.
    pub mode: ValidationMode,
    /// Per-file decompression cap for archive-backed packages, in bytes.
    ///
    /// Enforced by [`crate::file_access::ZipFileAccess`]; carried here so
    /// callers can build the backend from the same options value.
    pub max_decompressed_file_size: u64,
    /// Total expansion-ratio cap for archive-backed packages.
    pub max_expansion_ratio: u32,
    /// Probe manifest filenames case-insensitively (historic content
    /// ships `IMSMANIFEST.XML` and worse).
    pub case_insensitive_manifest_lookup: bool,
    /// Fetch the external metadata document `adlcp:location` points at.
    pub resolve_external_metadata: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            mode: ValidationMode::Strict,
            max_decompressed_file_size: 100_000_000,
            max_expansion_ratio: 200,
            case_insensitive_manifest_lookup: true,
            resolve_external_metadata: true,
        }
    }
}

#[cfg(feature = "zip")]
impl From<&ParseOptions> for crate::file_access::ZipLimits {
    fn from(options: &ParseOptions) -> Self {
        Self {
            max_decompressed_file_size: options.max_decompressed_file_size,
            max_expansion_ratio: options.max_expansion_ratio,
        }
    }
}

// ---------------------------------------------------------------------------
// Facade
// ---------------------------------------------------------------------------

/// Detects the package's module type with the built-in plugin registry.
pub fn detect(fa: &dyn FileAccess) -> Result<ModuleType, DetectionError> {
    detect::detect(fa)
}

/// Parses a package in strict mode.
pub fn parse(fa: &dyn FileAccess) -> Result<ModuleMetadata, ParseError> {
    parse_with(&ParseOptions::default(), fa)
}

/// Parses a package with explicit options.
pub fn parse_with(
    options: &ParseOptions,
    fa: &dyn FileAccess,
) -> Result<ModuleMetadata, ParseError> {
    let (mut metadata, result) = parse_pipeline(options, fa)?;

    if options.mode == ValidationMode::Strict && !result.is_valid() {
        return Err(ParseError::validation(
            format!("{} package \"{}\"", metadata.module_type, metadata.identifier),
            result,
        ));
    }

    if !result.is_empty() {
        metadata.composite.push(validation_fragment(&result));
    }
    Ok(metadata)
}

/// Parse-then-validate: always returns a result, never an error.
///
/// Packages that cannot be parsed at all yield a single
/// [`IssueCode::PackageUnparseable`] error carrying the parse failure
/// text, so the operation totalizes.
pub fn validate(fa: &dyn FileAccess) -> ValidationResult {
    match parse_pipeline(&ParseOptions::default(), fa) {
        Ok((_, result)) => result,
        Err(e) => ValidationResult::of(ValidationIssue {
            severity: Severity::Error,
            code: IssueCode::PackageUnparseable,
            message: e.to_string(),
            location: "package".to_owned(),
            suggested_fix: None,
        }),
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

fn parse_pipeline(
    options: &ParseOptions,
    fa: &dyn FileAccess,
) -> Result<(ModuleMetadata, ValidationResult), ParseError> {
    let module_type = detect::detect(fa)?;
    debug!(module_type = %module_type, root = fa.root_path(), "parsing package");

    match module_type {
        ModuleType::Scorm12 | ModuleType::Scorm2004(_) => scorm_pipeline(options, fa),
        ModuleType::Aicc => aicc_pipeline(options, fa),
        ModuleType::Cmi5 => cmi5_pipeline(options, fa),
    }
}

fn scorm_pipeline(
    options: &ParseOptions,
    fa: &dyn FileAccess,
) -> Result<(ModuleMetadata, ValidationResult), ParseError> {
    let output = parse_scorm(fa, options.mode, options.case_insensitive_manifest_lookup)?;
    let resolution = resolve_scorm(&output.manifest, output.module_type, Some(fa), options.mode);

    let mut result = output.captured.clone();
    result = result.merge(resolution.issues.clone());
    let ctx = ScormContext {
        manifest: &output.manifest,
        module_type: output.module_type,
        resolution: &resolution,
    };
    result = result.merge(validate_scorm(&ctx, options.mode));

    // Path safety over every path the manifest mentions.
    let mut entries: Vec<PathEntry> = Vec::new();
    for resource in &output.manifest.resources {
        if let Some(href) = &resource.href {
            entries.push(PathEntry::internal(
                href.clone(),
                format!("resource[@identifier='{}']/@href", resource.identifier),
            ));
        }
        for file in &resource.files {
            entries.push(PathEntry::internal(
                file.href.clone(),
                format!(
                    "resource[@identifier='{}']/file[@href='{}']",
                    resource.identifier, file.href
                ),
            ));
        }
    }
    if let Some(location) = output
        .manifest
        .metadata
        .as_ref()
        .and_then(|m| m.location.clone())
    {
        entries.push(PathEntry::internal(location, "metadata/adlcp:location"));
    }
    result = result.merge(validate_paths(&entries, options.mode));

    // External metadata fetch (adlcp:location).
    let mut fragments = Vec::new();
    if options.resolve_external_metadata {
        if let Some((fragment, issue)) = external_metadata(&output, fa, options.mode) {
            if let Some(fragment) = fragment {
                fragments.push(fragment);
            }
            if let Some(issue) = issue {
                result.push(issue);
            }
        }
    }

    let xapi_enabled = tincan_present(fa);
    let metadata = project_scorm(output, &resolution, xapi_enabled, fragments);
    Ok((metadata, result))
}

/// Fetches the `adlcp:location` metadata document once.
///
/// Returns the fragment when found, or the missing-file warning when the
/// manifest points at nothing; `None` when no location is declared or it
/// is unsafe (the path rules already report that).
fn external_metadata(
    output: &crate::parse::ScormParseOutput,
    fa: &dyn FileAccess,
    mode: ValidationMode,
) -> Option<(Option<MetadataFragment>, Option<ValidationIssue>)> {
    let location = output.manifest.metadata.as_ref()?.location.as_deref()?;
    if !crate::validation::rules_path::is_safe_package_path(location) {
        return None;
    }
    match file_access::read_to_string(fa, location) {
        Ok(document) => {
            let mut values = Map::new();
            values.insert("location".to_owned(), json!(location));
            values.insert("document".to_owned(), Value::String(document));
            Some((
                Some(MetadataFragment {
                    name: "externalMetadata".to_owned(),
                    values,
                }),
                None,
            ))
        }
        Err(_) => Some((
            None,
            Some(ValidationIssue::warning(
                mode,
                IssueCode::ScormExternalMetadataMissing,
                format!("external metadata \"{location}\" is not in the package"),
                "metadata/adlcp:location",
            )),
        )),
    }
}

fn aicc_pipeline(
    options: &ParseOptions,
    fa: &dyn FileAccess,
) -> Result<(ModuleMetadata, ValidationResult), ParseError> {
    let manifest = parse_aicc(fa)?;
    let mut result = validate_aicc(&manifest, options.mode);

    // AU launch paths may legitimately be web URLs (web launch), but must
    // not escape the package when they are relative.
    let entries: Vec<PathEntry> = manifest
        .assignable_units
        .iter()
        .filter(|au| !au.file_name.is_empty())
        .map(|au| {
            PathEntry::external_ok(
                au.file_name.clone(),
                format!(
                    "{}.au[System_ID='{}']/File_Name",
                    manifest.package_name, au.system_id
                ),
            )
        })
        .collect();
    result = result.merge(validate_paths(&entries, options.mode));

    Ok((project_aicc(manifest), result))
}

fn cmi5_pipeline(
    options: &ParseOptions,
    fa: &dyn FileAccess,
) -> Result<(ModuleMetadata, ValidationResult), ParseError> {
    let output = parse_cmi5(fa, options.mode, options.case_insensitive_manifest_lookup)?;
    let mut result = output.captured.clone();
    result = result.merge(validate_cmi5(&output.manifest, options.mode));

    let entries: Vec<PathEntry> = output
        .manifest
        .assignable_units()
        .into_iter()
        .filter(|au| !au.url.is_empty())
        .map(|au| PathEntry::external_ok(au.url.clone(), format!("au[@id='{}']/url", au.id)))
        .collect();
    result = result.merge(validate_paths(&entries, options.mode));

    Ok((project_cmi5(output), result))
}

fn validation_fragment(result: &ValidationResult) -> MetadataFragment {
    let mut values = Map::new();
    values.insert(
        "issues".to_owned(),
        serde_json::to_value(&result.issues).unwrap_or(Value::Null),
    );
    values.insert("isValid".to_owned(), Value::Bool(result.is_valid()));
    MetadataFragment {
        name: "validation".to_owned(),
        values,
    }
}
