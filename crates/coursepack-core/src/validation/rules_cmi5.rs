/// Validation rules for cmi5 (and Tin Can) course structures.
///
/// Identifiers in xAPI course structures are IRIs and double as activity
/// ids on the wire, so their well-formedness (absolute, schemed, no
/// whitespace) is an error, not a nicety.
use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::cmi5::{Cmi5Manifest, Cmi5Node};

use super::{
    run_rules, IssueCode, ValidationIssue, ValidationMode, ValidationResult, ValidationRule,
};

/// Builds the cmi5 rule registry.
pub fn cmi5_rules<'a>() -> Vec<Box<dyn ValidationRule<Cmi5Manifest> + 'a>> {
    vec![
        Box::new(CourseTitleRule),
        Box::new(LaunchMethodRule),
        Box::new(LaunchUrlRule),
        Box::new(ActivityIriRule),
        Box::new(DuplicateAuIdRule),
    ]
}

/// Runs the full cmi5 rule set.
pub fn validate_cmi5(manifest: &Cmi5Manifest, mode: ValidationMode) -> ValidationResult {
    run_rules(&cmi5_rules(), manifest, mode)
}

// An absolute IRI: scheme, colon, at least one more non-space character,
// and no whitespace anywhere.
static ABSOLUTE_IRI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[A-Za-z][A-Za-z0-9+.-]*:[^\\s]+$").unwrap_or_else(|_| {
        // Never reached: the pattern above is always valid.
        Regex::new("a^").unwrap_or_else(|_| {
            Regex::new(".").unwrap_or_else(|_| unreachable!("regex engine broken"))
        })
    })
});

/// Returns `true` for a well-formed absolute IRI.
pub fn is_absolute_iri(candidate: &str) -> bool {
    if !ABSOLUTE_IRI_RE.is_match(candidate) {
        return false;
    }
    // "https://" passes the shape check but has an empty hier-part.
    candidate
        .split_once(':')
        .is_some_and(|(_, rest)| !rest.trim_start_matches('/').is_empty())
}

// ---------------------------------------------------------------------------
// Course title
// ---------------------------------------------------------------------------

/// The course must carry a non-empty title.
pub struct CourseTitleRule;

impl ValidationRule<Cmi5Manifest> for CourseTitleRule {
    fn name(&self) -> &'static str {
        "course-title"
    }

    fn validate(&self, manifest: &Cmi5Manifest, mode: ValidationMode) -> ValidationResult {
        if manifest.course.title.trim().is_empty() {
            return ValidationResult::of(
                ValidationIssue::error(
                    mode,
                    IssueCode::Cmi5MissingTitle,
                    "course has no title",
                    "courseStructure/course/title",
                )
                .with_fix("add a <title><langstring> to the course"),
            );
        }
        ValidationResult::valid()
    }
}

// ---------------------------------------------------------------------------
// Launch method
// ---------------------------------------------------------------------------

/// Every AU should declare its `launchMethod`.
///
/// The schema default (`AnyWindow`) keeps this a warning: the package
/// launches either way, but authoring tools that omit the attribute
/// routinely meant `OwnWindow`.
pub struct LaunchMethodRule;

impl ValidationRule<Cmi5Manifest> for LaunchMethodRule {
    fn name(&self) -> &'static str {
        "launch-method"
    }

    fn validate(&self, manifest: &Cmi5Manifest, mode: ValidationMode) -> ValidationResult {
        let mut result = ValidationResult::valid();
        for au in manifest.assignable_units() {
            if au.launch_method.is_none() {
                result.push(ValidationIssue::warning(
                    mode,
                    IssueCode::Cmi5MissingLaunchMethod,
                    format!("AU \"{}\" declares no launchMethod", au.id),
                    format!("au[@id='{}']/@launchMethod", au.id),
                ));
            }
        }
        result
    }
}

// ---------------------------------------------------------------------------
// Launch URL
// ---------------------------------------------------------------------------

/// Every AU must carry a launch `url`.
pub struct LaunchUrlRule;

impl ValidationRule<Cmi5Manifest> for LaunchUrlRule {
    fn name(&self) -> &'static str {
        "launch-url"
    }

    fn validate(&self, manifest: &Cmi5Manifest, mode: ValidationMode) -> ValidationResult {
        let mut result = ValidationResult::valid();
        for au in manifest.assignable_units() {
            if au.url.trim().is_empty() {
                result.push(ValidationIssue::error(
                    mode,
                    IssueCode::Cmi5MissingLaunchUrl,
                    format!("AU \"{}\" has no launch url", au.id),
                    format!("au[@id='{}']/url", au.id),
                ));
            }
        }
        result
    }
}

// ---------------------------------------------------------------------------
// Activity IRIs
// ---------------------------------------------------------------------------

/// Course, block, and AU ids must be absolute IRIs.
pub struct ActivityIriRule;

impl ValidationRule<Cmi5Manifest> for ActivityIriRule {
    fn name(&self) -> &'static str {
        "activity-iri"
    }

    fn validate(&self, manifest: &Cmi5Manifest, mode: ValidationMode) -> ValidationResult {
        let mut result = ValidationResult::valid();
        let mut check = |id: &str, location: String| {
            if !is_absolute_iri(id) {
                result.push(ValidationIssue::error(
                    mode,
                    IssueCode::Cmi5InvalidActivityIri,
                    format!("\"{id}\" is not an absolute IRI"),
                    location,
                ));
            }
        };

        check(
            &manifest.course.id,
            "courseStructure/course/@id".to_owned(),
        );
        fn walk(
            nodes: &[Cmi5Node],
            check: &mut impl FnMut(&str, String),
        ) {
            for node in nodes {
                match node {
                    Cmi5Node::Block(block) => {
                        check(&block.id, format!("block[@id='{}']/@id", block.id));
                        walk(&block.children, check);
                    }
                    Cmi5Node::Au(au) => check(&au.id, format!("au[@id='{}']/@id", au.id)),
                }
            }
        }
        walk(&manifest.nodes, &mut check);
        result
    }
}

// ---------------------------------------------------------------------------
// Duplicate AU ids
// ---------------------------------------------------------------------------

/// AU ids must be unique; LMSs key runtime state on them.
pub struct DuplicateAuIdRule;

impl ValidationRule<Cmi5Manifest> for DuplicateAuIdRule {
    fn name(&self) -> &'static str {
        "duplicate-au-id"
    }

    fn validate(&self, manifest: &Cmi5Manifest, mode: ValidationMode) -> ValidationResult {
        let mut result = ValidationResult::valid();
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        for au in manifest.assignable_units() {
            if !seen.insert(&au.id) {
                result.push(ValidationIssue::error(
                    mode,
                    IssueCode::Cmi5DuplicateAuId,
                    format!("AU id \"{}\" appears more than once", au.id),
                    format!("au[@id='{}']", au.id),
                ));
            }
        }
        result
    }
}
