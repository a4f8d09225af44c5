#![allow(clippy::expect_used)]

use super::*;

fn issue(severity: Severity, code: IssueCode, message: &str) -> ValidationIssue {
    ValidationIssue {
        severity,
        code,
        message: message.to_owned(),
        location: "test".to_owned(),
        suggested_fix: None,
    }
}

#[test]
fn severity_display() {
    assert_eq!(Severity::Error.to_string(), "ERROR");
    assert_eq!(Severity::Warning.to_string(), "WARNING");
    assert_eq!(Severity::Info.to_string(), "INFO");
}

#[test]
fn code_catalog_is_unique_and_stable() {
    let mut seen = std::collections::BTreeSet::new();
    for code in ALL_CODES {
        assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        assert_eq!(IssueCode::from_code(code.code()), Some(*code));
    }
    // Spot-check the strings consumers key on.
    assert_eq!(
        IssueCode::Scorm12MissingResourceRef.code(),
        "SCORM12_MISSING_RESOURCE_REF"
    );
    assert_eq!(
        IssueCode::Scorm2004InvalidSequencing.code(),
        "SCORM2004_INVALID_SEQUENCING"
    );
    assert_eq!(
        IssueCode::Cmi5MissingLaunchMethod.code(),
        "CMI5_MISSING_LAUNCH_METHOD"
    );
    assert_eq!(IssueCode::Cmi5MissingTitle.code(), "CMI5_MISSING_TITLE");
    assert_eq!(IssueCode::UnsafePathTraversal.code(), "UNSAFE_PATH_TRAVERSAL");
    assert_eq!(IssueCode::UnsafeAbsolutePath.code(), "UNSAFE_ABSOLUTE_PATH");
    assert_eq!(IssueCode::UnsafeExternalUrl.code(), "UNSAFE_EXTERNAL_URL");
}

#[test]
fn unsafe_codes_never_downgrade() {
    for code in [
        IssueCode::UnsafePathTraversal,
        IssueCode::UnsafeAbsolutePath,
        IssueCode::UnsafeExternalUrl,
    ] {
        assert!(!code.downgradeable_in_lenient());
        let lenient = ValidationIssue::error(ValidationMode::Lenient, code, "m", "l");
        assert_eq!(lenient.severity, Severity::Error);
    }
}

#[test]
fn lenient_downgrades_only_the_listed_codes() {
    let downgraded = ValidationIssue::error(
        ValidationMode::Lenient,
        IssueCode::Scorm12DuplicateIdentifier,
        "m",
        "l",
    );
    assert_eq!(downgraded.severity, Severity::Warning);

    let kept = ValidationIssue::error(
        ValidationMode::Strict,
        IssueCode::Scorm12DuplicateIdentifier,
        "m",
        "l",
    );
    assert_eq!(kept.severity, Severity::Error);

    let title = ValidationIssue::error(ValidationMode::Lenient, IssueCode::Cmi5MissingTitle, "m", "l");
    assert_eq!(title.severity, Severity::Error);
}

#[test]
fn merge_is_associative_with_identity() {
    let a = ValidationResult::of(issue(
        Severity::Error,
        IssueCode::Scorm12MissingResources,
        "a",
    ));
    let b = ValidationResult::of(issue(
        Severity::Warning,
        IssueCode::Scorm12OrphanedResource,
        "b",
    ));
    let c = ValidationResult::of(issue(Severity::Info, IssueCode::PackageUnparseable, "c"));

    let left = a.clone().merge(b.clone()).merge(c.clone());
    let right = a.clone().merge(b.clone().merge(c.clone()));
    assert_eq!(left, right);

    assert_eq!(ValidationResult::valid().merge(a.clone()), a);
    assert_eq!(a.clone().merge(ValidationResult::valid()), a);
}

#[test]
fn projections_filter_by_severity() {
    let result = ValidationResult::from_issues(vec![
        issue(Severity::Error, IssueCode::Scorm12MissingResources, "e"),
        issue(Severity::Warning, IssueCode::Scorm12OrphanedResource, "w"),
        issue(Severity::Warning, IssueCode::AiccMissingDescriptor, "w2"),
        issue(Severity::Info, IssueCode::PackageUnparseable, "i"),
    ]);
    assert_eq!(result.errors().count(), 1);
    assert_eq!(result.warnings().count(), 2);
    assert_eq!(result.infos().count(), 1);
    assert_eq!(result.len(), 4);
    assert!(!result.is_valid());
    assert!(!result.is_empty());
    assert_eq!(
        result.by_code(IssueCode::AiccMissingDescriptor).count(),
        1
    );
}

#[test]
fn empty_result_is_valid() {
    let result = ValidationResult::valid();
    assert!(result.is_valid());
    assert!(result.is_empty());
    assert_eq!(result.len(), 0);
}

#[test]
fn issue_display_compact_form() {
    let display = issue(
        Severity::Error,
        IssueCode::Scorm12MissingResourceRef,
        "item references unknown resource \"ghost\"",
    )
    .to_string();
    assert_eq!(
        display,
        "[E] SCORM12_MISSING_RESOURCE_REF test: item references unknown resource \"ghost\""
    );
}

#[test]
fn issue_serde_round_trip() {
    let original = issue(Severity::Warning, IssueCode::Scorm12OrphanedResource, "w")
        .with_fix("remove the resource");
    let json = serde_json::to_string(&original).expect("serializes");
    assert!(json.contains("\"SCORM12_ORPHANED_RESOURCE\""));
    assert!(json.contains("\"WARNING\""));
    let back: ValidationIssue = serde_json::from_str(&json).expect("round-trips");
    assert_eq!(back, original);
}

#[test]
fn run_rules_folds_in_registry_order() {
    struct Fixed(&'static str, IssueCode);
    impl ValidationRule<()> for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }
        fn validate(&self, _target: &(), mode: ValidationMode) -> ValidationResult {
            ValidationResult::of(ValidationIssue::error(mode, self.1, self.0, "l"))
        }
    }

    let rules: Vec<Box<dyn ValidationRule<()>>> = vec![
        Box::new(Fixed("one", IssueCode::Scorm12MissingResources)),
        Box::new(Fixed("two", IssueCode::Scorm12MissingOrganizations)),
    ];
    let result = run_rules(&rules, &(), ValidationMode::Strict);
    assert_eq!(result.issues[0].code, IssueCode::Scorm12MissingResources);
    assert_eq!(result.issues[1].code, IssueCode::Scorm12MissingOrganizations);
}
