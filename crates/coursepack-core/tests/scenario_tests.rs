//! End-to-end scenarios over the committed fixture packages.
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use coursepack_core::enums::{ModuleType, Scorm2004Edition, SequencingLevel};
use coursepack_core::file_access::{LocalFileAccess, MemoryFileAccess};
use coursepack_core::validation::{IssueCode, Severity, ValidationMode};
use coursepack_core::{api, prereq, ParseError, ParseOptions};

fn fixture(name: &str) -> LocalFileAccess {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    LocalFileAccess::new(root).expect("fixture directory exists")
}

// ---------------------------------------------------------------------------
// S1 — SCORM 1.2 happy path
// ---------------------------------------------------------------------------

#[test]
fn scorm12_happy_path() {
    let fa = fixture("scorm12-basic");
    assert_eq!(api::detect(&fa).expect("detects"), ModuleType::Scorm12);

    let metadata = api::parse(&fa).expect("parses clean");
    assert_eq!(metadata.module_type, ModuleType::Scorm12);
    assert_eq!(metadata.title, "Test Course");
    assert_eq!(metadata.launch_url, "content/index.html");
    assert_eq!(metadata.identifier, "com.example.scorm12.basic");
    assert_eq!(metadata.version.as_deref(), Some("1.0"));
    assert_eq!(metadata.sequencing_level, SequencingLevel::None);
    assert!(!metadata.has_sequencing);
    assert!(!metadata.xapi_enabled);
    assert!(metadata.global_objective_ids.is_empty());

    let result = api::validate(&fa);
    assert!(result.is_valid());
    assert!(result.is_empty());
}

// ---------------------------------------------------------------------------
// S2 — missing resource reference
// ---------------------------------------------------------------------------

fn ghost_ref_package() -> MemoryFileAccess {
    let mut fa = MemoryFileAccess::new();
    fa.insert(
        "imsmanifest.xml",
        br#"<?xml version="1.0"?>
<manifest identifier="com.example.ghost" version="1.0"
    xmlns="http://www.imsproject.org/xsd/imscp_rootv1p1p2"
    xmlns:adlcp="http://www.adlnet.org/xsd/adlcp_rootv1p2">
  <metadata><schema>ADL SCORM</schema><schemaversion>1.2</schemaversion></metadata>
  <organizations default="org1">
    <organization identifier="org1">
      <title>Test Course</title>
      <item identifier="item1" identifierref="ghost">
        <title>Lesson One</title>
      </item>
    </organization>
  </organizations>
  <resources>
    <resource identifier="resource_1" type="webcontent" adlcp:scormtype="sco" href="content/index.html">
      <file href="content/index.html"/>
    </resource>
  </resources>
</manifest>"#
            .to_vec(),
    );
    fa.insert("content/index.html", b"<html></html>".to_vec());
    fa
}

#[test]
fn missing_resource_ref_is_exactly_one_error() {
    let fa = ghost_ref_package();
    let result = api::validate(&fa);
    assert!(!result.is_valid());

    let errors: Vec<_> = result.errors().collect();
    assert_eq!(errors.len(), 1, "errors: {errors:?}");
    let error = errors[0];
    assert_eq!(error.code, IssueCode::Scorm12MissingResourceRef);
    assert_eq!(error.code.code(), "SCORM12_MISSING_RESOURCE_REF");
    assert_eq!(
        error.location,
        "organization[@identifier='org1']/item[@identifier='item1']/@identifierref"
    );

    // The now-unreferenced resource is only a warning.
    assert_eq!(
        result.by_code(IssueCode::Scorm12OrphanedResource).count(),
        1
    );
}

// ---------------------------------------------------------------------------
// S3 — path traversal
// ---------------------------------------------------------------------------

#[test]
fn path_traversal_is_flagged_regardless_of_existence() {
    let mut fa = MemoryFileAccess::new();
    fa.insert(
        "imsmanifest.xml",
        br#"<manifest identifier="com.example.escape"
    xmlns:adlcp="http://www.adlnet.org/xsd/adlcp_v1p3"
    xmlns:imsss="http://www.imsglobal.org/xsd/imsss">
  <metadata><schemaversion>2004 3rd Edition</schemaversion></metadata>
  <organizations default="org1">
    <organization identifier="org1">
      <title>Escape</title>
      <item identifier="item1" identifierref="r1"><title>I</title></item>
    </organization>
  </organizations>
  <resources>
    <resource identifier="r1" type="webcontent" adlcp:scormType="sco" href="../../../etc/passwd"/>
  </resources>
</manifest>"#
            .to_vec(),
    );

    assert_eq!(
        api::detect(&fa).expect("detects"),
        ModuleType::Scorm2004(Scorm2004Edition::Third)
    );
    let result = api::validate(&fa);
    assert!(!result.is_valid());
    let traversals: Vec<_> = result.by_code(IssueCode::UnsafePathTraversal).collect();
    assert_eq!(traversals.len(), 1);
    assert_eq!(traversals[0].severity, Severity::Error);
    // No missing-file noise for a path that was never probed.
    assert_eq!(result.by_code(IssueCode::Scorm2004MissingFile).count(), 0);
}

// ---------------------------------------------------------------------------
// S4 — AICC prerequisite expression
// ---------------------------------------------------------------------------

#[test]
fn prerequisite_parse_and_evaluate() {
    let expr = prereq::parse("A & (B | ~C)").expect("parses");
    assert_eq!(
        expr,
        prereq::PrereqExpr::And(vec![
            prereq::PrereqExpr::Identifier("A".to_owned()),
            prereq::PrereqExpr::Or(vec![
                prereq::PrereqExpr::Identifier("B".to_owned()),
                prereq::PrereqExpr::Not(Box::new(prereq::PrereqExpr::Identifier(
                    "C".to_owned()
                ))),
            ]),
        ])
    );

    let env = |a: bool, b: bool, c: bool| -> BTreeMap<String, bool> {
        [
            ("A".to_owned(), a),
            ("B".to_owned(), b),
            ("C".to_owned(), c),
        ]
        .into_iter()
        .collect()
    };
    assert!(prereq::evaluate(&expr, &env(true, false, false)));
    assert!(!prereq::evaluate(&expr, &env(false, true, false)));
}

// ---------------------------------------------------------------------------
// S5 — SCORM 2004 sequencing
// ---------------------------------------------------------------------------

#[test]
fn random_test_sequencing_classifies_full() {
    let fa = fixture("scorm2004-randomtest");
    assert_eq!(
        api::detect(&fa).expect("detects"),
        ModuleType::Scorm2004(Scorm2004Edition::Third)
    );

    let metadata = api::parse(&fa).expect("parses clean");
    assert!(metadata.has_sequencing);
    assert_eq!(metadata.sequencing_level, SequencingLevel::Full);
    assert_eq!(
        metadata.global_objective_ids.iter().collect::<Vec<_>>(),
        vec!["com.scorm.golfsamples.sequencing.randomtest.content_completed"]
    );
    assert_eq!(
        metadata.launch_url,
        "shared/launchpage.html?content=playing"
    );

    // The posttest item carries exactly two pre-condition and three
    // post-condition rules.
    let manifest = match &metadata.manifest {
        coursepack_core::ManifestModel::Scorm(manifest) => manifest,
        other => panic!("unexpected manifest payload: {other:?}"),
    };
    let resolution = coursepack_core::resolve_scorm(
        manifest,
        metadata.module_type,
        None,
        ValidationMode::Strict,
    );
    let posttest = resolution.item_by_id["posttest_item"];
    let sequencing = resolution.tree.nodes[posttest]
        .sequencing
        .as_ref()
        .expect("posttest sequencing");
    let rules = sequencing.sequencing_rules.as_ref().expect("rules");
    assert_eq!(rules.pre_condition.len(), 2);
    assert_eq!(rules.post_condition.len(), 3);
    assert_eq!(rules.exit_condition.len(), 0);

    // attemptLimit=2 and onEachNewAttempt randomization on the bank item.
    let bank = resolution.item_by_id["test_bank_item"];
    let bank_sequencing = resolution.tree.nodes[bank]
        .sequencing
        .as_ref()
        .expect("bank sequencing");
    assert_eq!(
        bank_sequencing
            .limit_conditions
            .as_ref()
            .and_then(|l| l.attempt_limit),
        Some(2)
    );
    let randomization = bank_sequencing
        .randomization_controls
        .as_ref()
        .expect("randomization");
    assert_eq!(
        randomization.randomization_timing,
        coursepack_core::enums::RandomizationTiming::OnEachNewAttempt
    );
    assert!(randomization.reorder_children);

    assert!(api::validate(&fa).is_valid());
}

// ---------------------------------------------------------------------------
// S6 — cmi5 missing title, strict vs lenient
// ---------------------------------------------------------------------------

fn untitled_cmi5_package() -> MemoryFileAccess {
    let mut fa = MemoryFileAccess::new();
    fa.insert(
        "cmi5.xml",
        br#"<courseStructure xmlns="https://w3id.org/xapi/profiles/cmi5/v1/CourseStructure.xsd">
  <course id="https://example.org/course/untitled"/>
  <au id="https://example.org/au/1" launchMethod="AnyWindow" moveOn="Completed">
    <title><langstring>Only AU</langstring></title>
    <url>au/index.html</url>
  </au>
</courseStructure>"#
            .to_vec(),
    );
    fa.insert("au/index.html", b"<html></html>".to_vec());
    fa
}

#[test]
fn cmi5_missing_title_strict_refuses_lenient_embeds() {
    let fa = untitled_cmi5_package();
    assert_eq!(api::detect(&fa).expect("detects"), ModuleType::Cmi5);

    let result = api::validate(&fa);
    assert_eq!(result.by_code(IssueCode::Cmi5MissingTitle).count(), 1);
    assert!(!result.is_valid());

    let strict = api::parse(&fa);
    match strict {
        Err(ParseError::Validation { result, .. }) => {
            assert_eq!(result.by_code(IssueCode::Cmi5MissingTitle).count(), 1);
        }
        other => panic!("expected validation failure, got {other:?}"),
    }

    let lenient = api::parse_with(
        &ParseOptions {
            mode: ValidationMode::Lenient,
            ..ParseOptions::default()
        },
        &fa,
    )
    .expect("lenient returns metadata");
    assert_eq!(lenient.title, "");
    assert!(lenient.xapi_enabled);
    let validation = lenient
        .composite
        .iter()
        .find(|f| f.name == "validation")
        .expect("validation fragment");
    let issues = validation.values["issues"]
        .as_array()
        .expect("issues array");
    assert!(
        issues
            .iter()
            .any(|i| i["code"] == "CMI5_MISSING_TITLE" && i["severity"] == "ERROR"),
        "issues: {issues:?}"
    );
}

// ---------------------------------------------------------------------------
// AICC end to end
// ---------------------------------------------------------------------------

#[test]
fn aicc_package_end_to_end() {
    let fa = fixture("aicc-basic");
    assert_eq!(api::detect(&fa).expect("detects"), ModuleType::Aicc);

    let metadata = api::parse(&fa).expect("parses clean");
    assert_eq!(metadata.module_type, ModuleType::Aicc);
    assert_eq!(metadata.title, "Aircraft Maintenance Basics");
    assert_eq!(metadata.identifier, "MAINT_101");
    assert_eq!(metadata.launch_url, "lessons/safety.html");
    assert_eq!(
        metadata.description.as_deref(),
        Some("Introductory maintenance procedures for line technicians.")
    );
    assert_eq!(metadata.sequencing_level, SequencingLevel::None);
    // One AU declares 00:30:00.
    assert_eq!(
        metadata.duration.map(|d| d.as_duration().as_secs()),
        Some(1_800)
    );
    assert!(api::validate(&fa).is_valid());
}

// ---------------------------------------------------------------------------
// Case-insensitive manifest lookup
// ---------------------------------------------------------------------------

#[test]
fn uppercase_manifest_is_found() {
    let mut fa = MemoryFileAccess::new();
    fa.insert(
        "IMSMANIFEST.XML",
        br#"<manifest identifier="m">
  <metadata><schemaversion>1.2</schemaversion></metadata>
  <organizations default="org1">
    <organization identifier="org1"><title>T</title>
      <item identifier="i1" identifierref="r1"><title>I</title></item>
    </organization>
  </organizations>
  <resources><resource identifier="r1" href="a.html"><file href="a.html"/></resource></resources>
</manifest>"#
            .to_vec(),
    );
    fa.insert("a.html", b"<html></html>".to_vec());
    let metadata = api::parse(&fa).expect("parses");
    assert_eq!(metadata.module_type, ModuleType::Scorm12);
    assert_eq!(metadata.launch_url, "a.html");
}

// ---------------------------------------------------------------------------
// Unparseable packages totalize through validate()
// ---------------------------------------------------------------------------

#[test]
fn unparseable_package_yields_issue_not_panic() {
    let fa = MemoryFileAccess::new();
    let result = api::validate(&fa);
    assert!(!result.is_valid());
    assert_eq!(result.by_code(IssueCode::PackageUnparseable).count(), 1);
}
