/// Validation rules for AICC packages.
///
/// AICC identifiers are case-insensitive everywhere, so every lookup in
/// these rules lowercases before comparing. The course-structure rows
/// define the set of known blocks; an element referenced anywhere must
/// be either an AU record or a block that itself has a structure row.
use std::collections::BTreeSet;

use crate::model::aicc::{AiccManifest, ROOT_BLOCK};
use crate::prereq;

use super::{
    run_rules, IssueCode, ValidationIssue, ValidationMode, ValidationResult, ValidationRule,
};

/// Builds the AICC rule registry.
pub fn aicc_rules<'a>() -> Vec<Box<dyn ValidationRule<AiccManifest> + 'a>> {
    vec![
        Box::new(CourseIdRule),
        Box::new(AuReferencesRule),
        Box::new(DescriptorPresenceRule),
        Box::new(LaunchFileRule),
        Box::new(PrerequisiteRule),
    ]
}

/// Runs the full AICC rule set.
pub fn validate_aicc(manifest: &AiccManifest, mode: ValidationMode) -> ValidationResult {
    run_rules(&aicc_rules(), manifest, mode)
}

/// Known structure elements: every AU's `System_ID`, every descriptor's,
/// and every block that has a structure row, lowercased.
fn known_elements(manifest: &AiccManifest) -> BTreeSet<String> {
    let mut known: BTreeSet<String> = BTreeSet::new();
    known.insert(ROOT_BLOCK.to_owned());
    for au in &manifest.assignable_units {
        known.insert(au.system_id.to_ascii_lowercase());
    }
    for descriptor in &manifest.descriptors {
        known.insert(descriptor.system_id.to_ascii_lowercase());
    }
    for row in &manifest.structure {
        known.insert(row.block.to_ascii_lowercase());
    }
    known
}

// ---------------------------------------------------------------------------
// Course id
// ---------------------------------------------------------------------------

/// `Course_ID` must be present in the course descriptor data.
pub struct CourseIdRule;

impl ValidationRule<AiccManifest> for CourseIdRule {
    fn name(&self) -> &'static str {
        "course-id"
    }

    fn validate(&self, manifest: &AiccManifest, mode: ValidationMode) -> ValidationResult {
        if manifest.course.course_id.trim().is_empty() {
            return ValidationResult::of(ValidationIssue::error(
                mode,
                IssueCode::AiccMissingCourseId,
                "course has no Course_ID",
                format!("{}.crs[Course]/Course_ID", manifest.package_name),
            ));
        }
        ValidationResult::valid()
    }
}

// ---------------------------------------------------------------------------
// Structure references
// ---------------------------------------------------------------------------

/// Every course-structure member must reference a known AU or block.
pub struct AuReferencesRule;

impl ValidationRule<AiccManifest> for AuReferencesRule {
    fn name(&self) -> &'static str {
        "au-references"
    }

    fn validate(&self, manifest: &AiccManifest, mode: ValidationMode) -> ValidationResult {
        let known = known_elements(manifest);
        let mut result = ValidationResult::valid();
        for row in &manifest.structure {
            for member in &row.members {
                if !known.contains(&member.to_ascii_lowercase()) {
                    result.push(ValidationIssue::error(
                        mode,
                        IssueCode::AiccUnknownAuReference,
                        format!(
                            "structure row \"{}\" references unknown element \"{member}\"",
                            row.block
                        ),
                        format!("{}.cst[block='{}']", manifest.package_name, row.block),
                    ));
                }
            }
        }
        result
    }
}

// ---------------------------------------------------------------------------
// Descriptor coverage
// ---------------------------------------------------------------------------

/// Every AU should have a `.des` record.
pub struct DescriptorPresenceRule;

impl ValidationRule<AiccManifest> for DescriptorPresenceRule {
    fn name(&self) -> &'static str {
        "descriptor-presence"
    }

    fn validate(&self, manifest: &AiccManifest, mode: ValidationMode) -> ValidationResult {
        let mut result = ValidationResult::valid();
        for au in &manifest.assignable_units {
            if manifest.descriptor_by_id(&au.system_id).is_none() {
                result.push(ValidationIssue::error(
                    mode,
                    IssueCode::AiccMissingDescriptor,
                    format!("AU \"{}\" has no descriptor record", au.system_id),
                    format!("{}.des[System_ID='{}']", manifest.package_name, au.system_id),
                ));
            }
        }
        result
    }
}

// ---------------------------------------------------------------------------
// Launch file
// ---------------------------------------------------------------------------

/// Every AU must name a launch file.
pub struct LaunchFileRule;

impl ValidationRule<AiccManifest> for LaunchFileRule {
    fn name(&self) -> &'static str {
        "launch-file"
    }

    fn validate(&self, manifest: &AiccManifest, mode: ValidationMode) -> ValidationResult {
        let mut result = ValidationResult::valid();
        for au in &manifest.assignable_units {
            if au.file_name.trim().is_empty() {
                result.push(ValidationIssue::error(
                    mode,
                    IssueCode::AiccMissingLaunchFile,
                    format!("AU \"{}\" has no File_Name", au.system_id),
                    format!("{}.au[System_ID='{}']", manifest.package_name, au.system_id),
                ));
            }
        }
        result
    }
}

// ---------------------------------------------------------------------------
// Prerequisites
// ---------------------------------------------------------------------------

/// `.pre` expressions must parse, and every identifier they name must be
/// a known AU or block (unknown identifiers are a warning; historic
/// content routinely references retired lessons).
pub struct PrerequisiteRule;

impl ValidationRule<AiccManifest> for PrerequisiteRule {
    fn name(&self) -> &'static str {
        "prerequisites"
    }

    fn validate(&self, manifest: &AiccManifest, mode: ValidationMode) -> ValidationResult {
        let known = known_elements(manifest);
        let mut result = ValidationResult::valid();
        for row in &manifest.prerequisites {
            let location = format!(
                "{}.pre[structure_element='{}']",
                manifest.package_name, row.structure_element
            );
            match prereq::parse(&row.prerequisite) {
                Err(e) => {
                    result.push(ValidationIssue::error(
                        mode,
                        IssueCode::AiccInvalidPrerequisite,
                        format!("prerequisite expression does not parse: {e}"),
                        location,
                    ));
                }
                Ok(expression) => {
                    for identifier in expression.identifiers() {
                        if !known.contains(&identifier.to_ascii_lowercase()) {
                            result.push(ValidationIssue::warning(
                                mode,
                                IssueCode::AiccUnknownPrerequisiteRef,
                                format!("prerequisite references unknown element \"{identifier}\""),
                                location.clone(),
                            ));
                        }
                    }
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use crate::model::aicc::{AssignableUnit, CourseInfo, CourseStructureRow, PrerequisiteRow};

    use super::*;

    fn manifest() -> AiccManifest {
        AiccManifest {
            package_name: "pkg".to_owned(),
            course: CourseInfo {
                course_id: "C1".to_owned(),
                course_title: "T".to_owned(),
                ..CourseInfo::default()
            },
            descriptors: Vec::new(),
            assignable_units: vec![AssignableUnit {
                system_id: "A1".to_owned(),
                file_name: "a1.html".to_owned(),
                ..AssignableUnit::default()
            }],
            structure: vec![CourseStructureRow {
                block: "root".to_owned(),
                members: vec!["A1".to_owned()],
            }],
            objective_relations: Vec::new(),
            prerequisites: Vec::new(),
        }
    }

    #[test]
    fn clean_manifest_only_warns_about_descriptors() {
        let result = validate_aicc(&manifest(), ValidationMode::Strict);
        // No .des records: one descriptor error, nothing else.
        assert_eq!(result.len(), 1);
        assert_eq!(result.by_code(IssueCode::AiccMissingDescriptor).count(), 1);
    }

    #[test]
    fn missing_course_id_is_an_error() {
        let mut m = manifest();
        m.course.course_id = String::new();
        let result = validate_aicc(&m, ValidationMode::Strict);
        assert_eq!(result.by_code(IssueCode::AiccMissingCourseId).count(), 1);
        assert!(!result.is_valid());
    }

    #[test]
    fn unknown_structure_member_is_an_error() {
        let mut m = manifest();
        m.structure[0].members.push("GHOST".to_owned());
        let result = validate_aicc(&m, ValidationMode::Strict);
        assert_eq!(result.by_code(IssueCode::AiccUnknownAuReference).count(), 1);
    }

    #[test]
    fn structure_references_are_case_insensitive() {
        let mut m = manifest();
        m.structure[0].members = vec!["a1".to_owned()];
        let result = validate_aicc(&m, ValidationMode::Strict);
        assert_eq!(result.by_code(IssueCode::AiccUnknownAuReference).count(), 0);
    }

    #[test]
    fn bad_prerequisite_errors_unknown_ref_warns() {
        let mut m = manifest();
        m.prerequisites = vec![
            PrerequisiteRow {
                structure_element: "A1".to_owned(),
                prerequisite: "A1 &".to_owned(),
            },
            PrerequisiteRow {
                structure_element: "A1".to_owned(),
                prerequisite: "ghost_au".to_owned(),
            },
        ];
        let result = validate_aicc(&m, ValidationMode::Strict);
        assert_eq!(result.by_code(IssueCode::AiccInvalidPrerequisite).count(), 1);
        assert_eq!(
            result
                .by_code(IssueCode::AiccUnknownPrerequisiteRef)
                .count(),
            1
        );
    }

    #[test]
    fn lenient_downgrades_missing_descriptor() {
        let result = validate_aicc(&manifest(), ValidationMode::Lenient);
        assert!(result.is_valid());
        assert_eq!(result.warnings().count(), 1);
    }
}
