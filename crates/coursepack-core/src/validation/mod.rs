/// Issue types and rule dispatch for the package validation engine.
///
/// This module defines [`Severity`], [`IssueCode`], [`ValidationIssue`],
/// [`ValidationResult`], [`ValidationMode`], and the [`ValidationRule`]
/// trait. The per-specification rule sets live in the sibling `rules_*`
/// modules and are folded together with [`ValidationResult::merge`], which
/// is associative with identity [`ValidationResult::valid`] — validation
/// output aggregates like a monoid, and the engine never fails fast.
///
/// The string form of every [`IssueCode`] is the versioned public API of
/// the validator: codes are never renamed without a deprecation cycle.
pub mod rules_aicc;
pub mod rules_cmi5;
pub mod rules_path;
pub mod rules_scorm;
pub mod rules_sequencing;

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

#[cfg(test)]
mod tests;

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// The severity level of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// The package is non-conformant; ingestion should be refused in
    /// strict mode.
    Error,
    /// Suspect but ingestable.
    Warning,
    /// Informational observation.
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("ERROR"),
            Self::Warning => f.write_str("WARNING"),
            Self::Info => f.write_str("INFO"),
        }
    }
}

// ---------------------------------------------------------------------------
// ValidationMode
// ---------------------------------------------------------------------------

/// Global validation mode.
///
/// Strict surfaces every rule's issue at its declared severity. Lenient
/// downgrades structural-but-non-launch-affecting errors to warnings; the
/// path-safety rules are never downgraded in either mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Every issue at its declared severity (the default).
    #[default]
    Strict,
    /// Non-launch-affecting structural errors downgraded to warnings.
    Lenient,
}

// ---------------------------------------------------------------------------
// IssueCode
// ---------------------------------------------------------------------------

/// Machine-readable identifier for a validation rule finding.
///
/// [`IssueCode::code`] returns the stable string form, prefixed by the
/// specification the rule belongs to (`SCORM12_`, `SCORM2004_`, `AICC_`,
/// `CMI5_`); the path-safety codes are specification-independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum IssueCode {
    // --- SCORM 1.2 ---
    /// Manifest identifier empty or missing.
    Scorm12MissingIdentifier,
    /// No `<organizations>` element or no organizations listed.
    Scorm12MissingOrganizations,
    /// `organizations/@default` names no listed organization.
    Scorm12InvalidDefaultOrganization,
    /// No `<resources>` element or no resources listed.
    Scorm12MissingResources,
    /// An `item/@identifierref` resolves to no resource.
    Scorm12MissingResourceRef,
    /// An identifier is reused across manifest/organization/item/resource
    /// scopes.
    Scorm12DuplicateIdentifier,
    /// An organization contains no item with an `identifierref`.
    Scorm12NoLaunchableItem,
    /// A referenced resource has no `href`.
    Scorm12MissingResourceHref,
    /// A resource is not referenced by any item or dependency.
    Scorm12OrphanedResource,
    /// A referenced file does not exist in the package.
    Scorm12MissingFile,
    /// Resource dependencies form a cycle.
    Scorm12DependencyCycle,
    /// `adlcp:masteryscore` outside `[0, 100]`.
    Scorm12InvalidMasteryScore,
    /// `adlcp:prerequisites` expression failed to parse.
    Scorm12InvalidPrerequisites,

    // --- SCORM 2004 ---
    /// Manifest identifier empty or missing.
    Scorm2004MissingIdentifier,
    /// No `<organizations>` element or no organizations listed.
    Scorm2004MissingOrganizations,
    /// `organizations/@default` names no listed organization.
    Scorm2004InvalidDefaultOrganization,
    /// No `<resources>` element or no resources listed.
    Scorm2004MissingResources,
    /// An `item/@identifierref` resolves to no resource.
    Scorm2004MissingResourceRef,
    /// An identifier is reused across manifest/organization/item/resource
    /// scopes.
    Scorm2004DuplicateIdentifier,
    /// An organization contains no item with an `identifierref`.
    Scorm2004NoLaunchableItem,
    /// A referenced resource has no `href`.
    Scorm2004MissingResourceHref,
    /// A resource is not referenced by any item or dependency.
    Scorm2004OrphanedResource,
    /// A referenced file does not exist in the package.
    Scorm2004MissingFile,
    /// Resource dependencies form a cycle.
    Scorm2004DependencyCycle,
    /// A sequencing block is structurally inconsistent (e.g. an
    /// `atLeastCount` rollup rule without `minimumCount`).
    Scorm2004InvalidSequencing,
    /// A normalized measure outside `[-1, 1]`.
    Scorm2004InvalidMeasure,
    /// An `objectiveMeasureWeight` outside `[0, 1]`.
    Scorm2004InvalidObjectiveWeight,
    /// A negative or unparsable `attemptLimit`.
    Scorm2004InvalidAttemptLimit,
    /// More than one local objective writes the same global objective.
    Scorm2004DuplicateGlobalObjective,
    /// A sequencing `IDRef` names no collection entry.
    Scorm2004UnresolvedSequencingRef,
    /// Sequencing `IDRef` indirection forms a cycle.
    Scorm2004SequencingRefCycle,
    /// `adlcp:location` points at a metadata file the package lacks.
    ScormExternalMetadataMissing,

    // --- AICC ---
    /// `Course_ID` missing from the `.crs` / `.des` data.
    AiccMissingCourseId,
    /// A course-structure member references no known AU or block.
    AiccUnknownAuReference,
    /// An AU has no `.des` descriptor record.
    AiccMissingDescriptor,
    /// A `.pre` expression failed to parse.
    AiccInvalidPrerequisite,
    /// A `.pre` expression names an unknown AU or block.
    AiccUnknownPrerequisiteRef,
    /// An AU record has no launch `File_Name`.
    AiccMissingLaunchFile,

    // --- cmi5 ---
    /// The course has no title.
    Cmi5MissingTitle,
    /// An AU declares no `launchMethod`.
    Cmi5MissingLaunchMethod,
    /// An AU has no launch `url`.
    Cmi5MissingLaunchUrl,
    /// A course/block/AU id is not an absolute IRI.
    Cmi5InvalidActivityIri,
    /// An AU `masteryScore` outside `[0, 1]`.
    Cmi5InvalidMasteryScore,
    /// Two AUs share an id.
    Cmi5DuplicateAuId,

    // --- Path safety (never downgraded, never disabled) ---
    /// A package path contains a `..` segment.
    UnsafePathTraversal,
    /// A package path is absolute.
    UnsafeAbsolutePath,
    /// A package path carries a URL scheme pointing outside the package.
    UnsafeExternalUrl,

    // --- Facade ---
    /// The package could not be parsed at all; emitted by the
    /// validate-facade so the operation still totalizes.
    PackageUnparseable,
}

impl IssueCode {
    /// Returns the stable string form of the code.
    pub fn code(self) -> &'static str {
        match self {
            Self::Scorm12MissingIdentifier => "SCORM12_MISSING_IDENTIFIER",
            Self::Scorm12MissingOrganizations => "SCORM12_MISSING_ORGANIZATIONS",
            Self::Scorm12InvalidDefaultOrganization => "SCORM12_INVALID_DEFAULT_ORGANIZATION",
            Self::Scorm12MissingResources => "SCORM12_MISSING_RESOURCES",
            Self::Scorm12MissingResourceRef => "SCORM12_MISSING_RESOURCE_REF",
            Self::Scorm12DuplicateIdentifier => "SCORM12_DUPLICATE_IDENTIFIER",
            Self::Scorm12NoLaunchableItem => "SCORM12_NO_LAUNCHABLE_ITEM",
            Self::Scorm12MissingResourceHref => "SCORM12_MISSING_RESOURCE_HREF",
            Self::Scorm12OrphanedResource => "SCORM12_ORPHANED_RESOURCE",
            Self::Scorm12MissingFile => "SCORM12_MISSING_FILE",
            Self::Scorm12DependencyCycle => "SCORM12_DEPENDENCY_CYCLE",
            Self::Scorm12InvalidMasteryScore => "SCORM12_INVALID_MASTERY_SCORE",
            Self::Scorm12InvalidPrerequisites => "SCORM12_INVALID_PREREQUISITES",
            Self::Scorm2004MissingIdentifier => "SCORM2004_MISSING_IDENTIFIER",
            Self::Scorm2004MissingOrganizations => "SCORM2004_MISSING_ORGANIZATIONS",
            Self::Scorm2004InvalidDefaultOrganization => "SCORM2004_INVALID_DEFAULT_ORGANIZATION",
            Self::Scorm2004MissingResources => "SCORM2004_MISSING_RESOURCES",
            Self::Scorm2004MissingResourceRef => "SCORM2004_MISSING_RESOURCE_REF",
            Self::Scorm2004DuplicateIdentifier => "SCORM2004_DUPLICATE_IDENTIFIER",
            Self::Scorm2004NoLaunchableItem => "SCORM2004_NO_LAUNCHABLE_ITEM",
            Self::Scorm2004MissingResourceHref => "SCORM2004_MISSING_RESOURCE_HREF",
            Self::Scorm2004OrphanedResource => "SCORM2004_ORPHANED_RESOURCE",
            Self::Scorm2004MissingFile => "SCORM2004_MISSING_FILE",
            Self::Scorm2004DependencyCycle => "SCORM2004_DEPENDENCY_CYCLE",
            Self::Scorm2004InvalidSequencing => "SCORM2004_INVALID_SEQUENCING",
            Self::Scorm2004InvalidMeasure => "SCORM2004_INVALID_MEASURE",
            Self::Scorm2004InvalidObjectiveWeight => "SCORM2004_INVALID_OBJECTIVE_WEIGHT",
            Self::Scorm2004InvalidAttemptLimit => "SCORM2004_INVALID_ATTEMPT_LIMIT",
            Self::Scorm2004DuplicateGlobalObjective => "SCORM2004_DUPLICATE_GLOBAL_OBJECTIVE",
            Self::Scorm2004UnresolvedSequencingRef => "SCORM2004_UNRESOLVED_SEQUENCING_REF",
            Self::Scorm2004SequencingRefCycle => "SCORM2004_SEQUENCING_REF_CYCLE",
            Self::ScormExternalMetadataMissing => "SCORM_EXTERNAL_METADATA_MISSING",
            Self::AiccMissingCourseId => "AICC_MISSING_COURSE_ID",
            Self::AiccUnknownAuReference => "AICC_UNKNOWN_AU_REFERENCE",
            Self::AiccMissingDescriptor => "AICC_MISSING_DESCRIPTOR",
            Self::AiccInvalidPrerequisite => "AICC_INVALID_PREREQUISITE",
            Self::AiccUnknownPrerequisiteRef => "AICC_UNKNOWN_PREREQUISITE_REF",
            Self::AiccMissingLaunchFile => "AICC_MISSING_LAUNCH_FILE",
            Self::Cmi5MissingTitle => "CMI5_MISSING_TITLE",
            Self::Cmi5MissingLaunchMethod => "CMI5_MISSING_LAUNCH_METHOD",
            Self::Cmi5MissingLaunchUrl => "CMI5_MISSING_LAUNCH_URL",
            Self::Cmi5InvalidActivityIri => "CMI5_INVALID_ACTIVITY_IRI",
            Self::Cmi5InvalidMasteryScore => "CMI5_INVALID_MASTERY_SCORE",
            Self::Cmi5DuplicateAuId => "CMI5_DUPLICATE_AU_ID",
            Self::UnsafePathTraversal => "UNSAFE_PATH_TRAVERSAL",
            Self::UnsafeAbsolutePath => "UNSAFE_ABSOLUTE_PATH",
            Self::UnsafeExternalUrl => "UNSAFE_EXTERNAL_URL",
            Self::PackageUnparseable => "PACKAGE_UNPARSEABLE",
        }
    }

    /// Parses the stable string form back into a code.
    pub fn from_code(s: &str) -> Option<Self> {
        ALL_CODES.iter().copied().find(|c| c.code() == s)
    }

    /// Returns `true` when lenient mode reports this error as a warning.
    ///
    /// Only structural findings that do not affect the launch path are in
    /// the set; the `UNSAFE_*` security codes never are.
    pub fn downgradeable_in_lenient(self) -> bool {
        matches!(
            self,
            Self::Scorm12DuplicateIdentifier
                | Self::Scorm2004DuplicateIdentifier
                | Self::Scorm12MissingFile
                | Self::Scorm2004MissingFile
                | Self::AiccMissingDescriptor
                | Self::Cmi5DuplicateAuId
        )
    }
}

/// Every code, in catalog order. Used by `from_code` and the catalog test.
const ALL_CODES: &[IssueCode] = &[
    IssueCode::Scorm12MissingIdentifier,
    IssueCode::Scorm12MissingOrganizations,
    IssueCode::Scorm12InvalidDefaultOrganization,
    IssueCode::Scorm12MissingResources,
    IssueCode::Scorm12MissingResourceRef,
    IssueCode::Scorm12DuplicateIdentifier,
    IssueCode::Scorm12NoLaunchableItem,
    IssueCode::Scorm12MissingResourceHref,
    IssueCode::Scorm12OrphanedResource,
    IssueCode::Scorm12MissingFile,
    IssueCode::Scorm12DependencyCycle,
    IssueCode::Scorm12InvalidMasteryScore,
    IssueCode::Scorm12InvalidPrerequisites,
    IssueCode::Scorm2004MissingIdentifier,
    IssueCode::Scorm2004MissingOrganizations,
    IssueCode::Scorm2004InvalidDefaultOrganization,
    IssueCode::Scorm2004MissingResources,
    IssueCode::Scorm2004MissingResourceRef,
    IssueCode::Scorm2004DuplicateIdentifier,
    IssueCode::Scorm2004NoLaunchableItem,
    IssueCode::Scorm2004MissingResourceHref,
    IssueCode::Scorm2004OrphanedResource,
    IssueCode::Scorm2004MissingFile,
    IssueCode::Scorm2004DependencyCycle,
    IssueCode::Scorm2004InvalidSequencing,
    IssueCode::Scorm2004InvalidMeasure,
    IssueCode::Scorm2004InvalidObjectiveWeight,
    IssueCode::Scorm2004InvalidAttemptLimit,
    IssueCode::Scorm2004DuplicateGlobalObjective,
    IssueCode::Scorm2004UnresolvedSequencingRef,
    IssueCode::Scorm2004SequencingRefCycle,
    IssueCode::ScormExternalMetadataMissing,
    IssueCode::AiccMissingCourseId,
    IssueCode::AiccUnknownAuReference,
    IssueCode::AiccMissingDescriptor,
    IssueCode::AiccInvalidPrerequisite,
    IssueCode::AiccUnknownPrerequisiteRef,
    IssueCode::AiccMissingLaunchFile,
    IssueCode::Cmi5MissingTitle,
    IssueCode::Cmi5MissingLaunchMethod,
    IssueCode::Cmi5MissingLaunchUrl,
    IssueCode::Cmi5InvalidActivityIri,
    IssueCode::Cmi5InvalidMasteryScore,
    IssueCode::Cmi5DuplicateAuId,
    IssueCode::UnsafePathTraversal,
    IssueCode::UnsafeAbsolutePath,
    IssueCode::UnsafeExternalUrl,
    IssueCode::PackageUnparseable,
];

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for IssueCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for IssueCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_code(&s).ok_or_else(|| de::Error::custom(format!("unknown issue code {s:?}")))
    }
}

// ---------------------------------------------------------------------------
// ValidationIssue
// ---------------------------------------------------------------------------

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    /// How serious the finding is.
    pub severity: Severity,
    /// The stable catalog code.
    pub code: IssueCode,
    /// Human-readable explanation.
    pub message: String,
    /// Where in the package/manifest the finding anchors, XPath-style for
    /// XML documents and `file[record]` style for AICC.
    pub location: String,
    /// A suggested remedial edit, when one is obvious.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
}

impl ValidationIssue {
    /// Constructs an issue at the code's mode-adjusted severity.
    ///
    /// `declared` is the rule's severity in strict mode; lenient mode
    /// downgrades errors whose code is in the downgrade set.
    pub fn new(
        declared: Severity,
        mode: ValidationMode,
        code: IssueCode,
        message: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        let severity = match (declared, mode) {
            (Severity::Error, ValidationMode::Lenient) if code.downgradeable_in_lenient() => {
                Severity::Warning
            }
            (s, ValidationMode::Strict | ValidationMode::Lenient) => s,
        };
        Self {
            severity,
            code,
            message: message.into(),
            location: location.into(),
            suggested_fix: None,
        }
    }

    /// An error-severity issue (subject to lenient downgrade).
    pub fn error(
        mode: ValidationMode,
        code: IssueCode,
        message: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Error, mode, code, message, location)
    }

    /// A warning-severity issue.
    pub fn warning(
        mode: ValidationMode,
        code: IssueCode,
        message: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Warning, mode, code, message, location)
    }

    /// Attaches a suggested fix.
    pub fn with_fix(mut self, fix: impl Into<String>) -> Self {
        self.suggested_fix = Some(fix.into());
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level_char = match self.severity {
            Severity::Error => 'E',
            Severity::Warning => 'W',
            Severity::Info => 'I',
        };
        write!(
            f,
            "[{level_char}] {} {}: {}",
            self.code, self.location, self.message
        )
    }
}

// ---------------------------------------------------------------------------
// ValidationResult
// ---------------------------------------------------------------------------

/// The collected output of a validation pass.
///
/// `merge` concatenates issue lists preserving order, is associative, and
/// has [`ValidationResult::valid`] as identity — results fold cleanly
/// across rule sets and pipeline stages. Issue order is not contractual.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// All issues produced during the pass.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// The identity element: no issues.
    pub fn valid() -> Self {
        Self::default()
    }

    /// Wraps a pre-built issue list.
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    /// A result holding exactly one issue.
    pub fn of(issue: ValidationIssue) -> Self {
        Self {
            issues: vec![issue],
        }
    }

    /// Concatenates `other`'s issues after this result's.
    pub fn merge(mut self, other: Self) -> Self {
        self.issues.extend(other.issues);
        self
    }

    /// Appends a single issue in place.
    pub fn push(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Iterates error-severity issues.
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
    }

    /// Iterates warning-severity issues.
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
    }

    /// Iterates info-severity issues.
    pub fn infos(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Info)
    }

    /// Iterates issues carrying the given code.
    pub fn by_code(&self, code: IssueCode) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |i| i.code == code)
    }

    /// `true` when no error-severity issue is present.
    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }

    /// Total number of issues.
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// `true` when there are no issues at all.
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ValidationRule
// ---------------------------------------------------------------------------

/// A single stateless, idempotent validation rule over a target type.
///
/// Rules are pure: the same target yields the same issues. The registries
/// in the `rules_*` modules box rules as trait objects and
/// [`run_rules`] folds their results with [`ValidationResult::merge`].
pub trait ValidationRule<T: ?Sized> {
    /// Human-readable rule name, for diagnostics.
    fn name(&self) -> &'static str;

    /// Inspects `target` and returns the findings.
    fn validate(&self, target: &T, mode: ValidationMode) -> ValidationResult;
}

/// Runs `rules` over `target`, folding results in registry order.
pub fn run_rules<T: ?Sized>(
    rules: &[Box<dyn ValidationRule<T> + '_>],
    target: &T,
    mode: ValidationMode,
) -> ValidationResult {
    rules
        .iter()
        .fold(ValidationResult::valid(), |acc, rule| {
            acc.merge(rule.validate(target, mode))
        })
}
