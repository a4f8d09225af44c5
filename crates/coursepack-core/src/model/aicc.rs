/// The AICC (CMI001) course interchange model.
///
/// AICC packages are a family of INI/CSV descriptor files sharing a stem
/// name: `.crs` (course), `.des` (descriptors), `.au` (assignable units),
/// `.cst` (course structure), plus the optional `.ort` (objective
/// relations) and `.pre` (prerequisites). The model keeps each file's
/// records as parsed; the tree shape is derived from the course-structure
/// rows by the resolver.
use serde::{Deserialize, Serialize};

use crate::newtypes::Iso8601Duration;

/// The root identifier every course-structure file uses for the course
/// itself, compared case-insensitively.
pub const ROOT_BLOCK: &str = "root";

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// A parsed AICC package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiccManifest {
    /// The shared stem of the descriptor files (e.g. `"course01"` for
    /// `course01.crs` …).
    pub package_name: String,
    /// `[Course]` + `[Course_Description]` blocks of the `.crs` file.
    pub course: CourseInfo,
    /// `.des` records, one per AU or block.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub descriptors: Vec<Descriptor>,
    /// `.au` records.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assignable_units: Vec<AssignableUnit>,
    /// `.cst` rows: parent followed by members.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub structure: Vec<CourseStructureRow>,
    /// `.ort` rows, when the file is present.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub objective_relations: Vec<ObjectiveRelation>,
    /// `.pre` rows, when the file is present.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prerequisites: Vec<PrerequisiteRow>,
}

impl AiccManifest {
    /// Looks up an assignable unit by `System_ID`, case-insensitively
    /// (AICC identifiers are case-insensitive throughout).
    pub fn au_by_id(&self, system_id: &str) -> Option<&AssignableUnit> {
        self.assignable_units
            .iter()
            .find(|au| au.system_id.eq_ignore_ascii_case(system_id))
    }

    /// Looks up a descriptor record by `System_ID`, case-insensitively.
    pub fn descriptor_by_id(&self, system_id: &str) -> Option<&Descriptor> {
        self.descriptors
            .iter()
            .find(|d| d.system_id.eq_ignore_ascii_case(system_id))
    }

    /// The first AU in course-structure order, which defines the launch
    /// URL. Falls back to the first `.au` record when the structure file
    /// lists none.
    pub fn first_au(&self) -> Option<&AssignableUnit> {
        for row in &self.structure {
            for member in &row.members {
                if let Some(au) = self.au_by_id(member) {
                    return Some(au);
                }
            }
        }
        self.assignable_units.first()
    }
}

// ---------------------------------------------------------------------------
// .crs
// ---------------------------------------------------------------------------

/// Course-level metadata from the `.crs` file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseInfo {
    /// `Course_ID`.
    #[serde(default)]
    pub course_id: String,
    /// `Course_Title`.
    #[serde(default)]
    pub course_title: String,
    /// `Course_Creator`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_creator: Option<String>,
    /// `Course_System` (e.g. `"HTML"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_system: Option<String>,
    /// `Level`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    /// `Total_AUs`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_aus: Option<u32>,
    /// `Total_Blocks`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_blocks: Option<u32>,
    /// `Version` of the CMI guidelines the files conform to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// `Max_Fields_CST`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_fields_cst: Option<u32>,
    /// `[Course_Description]` free text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// .des
// ---------------------------------------------------------------------------

/// One descriptor record from the `.des` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    /// `System_ID` — joins this record to `.au` / `.cst` rows.
    pub system_id: String,
    /// `Developer_ID`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub developer_id: Option<String>,
    /// `Title`.
    #[serde(default)]
    pub title: String,
    /// `Description`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// .au
// ---------------------------------------------------------------------------

/// One assignable-unit record from the `.au` file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignableUnit {
    /// `System_ID`.
    pub system_id: String,
    /// `Command_Line` — arguments appended at launch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_line: Option<String>,
    /// `File_Name` — the launch path or URL.
    #[serde(default)]
    pub file_name: String,
    /// `Max_Score`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_score: Option<f64>,
    /// `Mastery_Score`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mastery_score: Option<f64>,
    /// `Max_Time_Allowed` (`HH:MM:SS`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_time_allowed: Option<Iso8601Duration>,
    /// `Time_Limit_Action` (free-form in CMI001; kept lexical).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit_action: Option<String>,
    /// `System_Vendor`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_vendor: Option<String>,
    /// `Core_Vendor` launch data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub core_vendor: Option<String>,
    /// `Type` of the AU.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub au_type: Option<String>,
    /// `Web_Launch` parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_launch: Option<String>,
    /// `AU_Password`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub au_password: Option<String>,
}

// ---------------------------------------------------------------------------
// .cst / .ort / .pre
// ---------------------------------------------------------------------------

/// One `.cst` row: a parent (`"root"` or a block `System_ID`) followed by
/// its member ids in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseStructureRow {
    /// The parent element (`"root"` for the course itself).
    pub block: String,
    /// Member `System_ID`s, in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
}

/// One `.ort` row: an objective and the elements it relates to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveRelation {
    /// The objective identifier.
    pub objective_id: String,
    /// Related AU / block `System_ID`s.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
}

/// One `.pre` row: a structure element and its prerequisite expression.
///
/// The expression is kept lexical here; [`crate::prereq`] parses it into
/// an AST, and validation resolves the identifiers it names against the
/// AU/block tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrerequisiteRow {
    /// The element the prerequisite gates (`structure_element` column).
    pub structure_element: String,
    /// The raw prerequisite expression (`prerequisite` column).
    pub prerequisite: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest_fixture() -> AiccManifest {
        AiccManifest {
            package_name: "course01".to_owned(),
            course: CourseInfo {
                course_id: "C1".to_owned(),
                course_title: "Sample".to_owned(),
                ..CourseInfo::default()
            },
            descriptors: vec![Descriptor {
                system_id: "A1".to_owned(),
                developer_id: None,
                title: "Lesson 1".to_owned(),
                description: None,
            }],
            assignable_units: vec![
                AssignableUnit {
                    system_id: "A1".to_owned(),
                    file_name: "lesson1.html".to_owned(),
                    ..AssignableUnit::default()
                },
                AssignableUnit {
                    system_id: "A2".to_owned(),
                    file_name: "lesson2.html".to_owned(),
                    ..AssignableUnit::default()
                },
            ],
            structure: vec![CourseStructureRow {
                block: ROOT_BLOCK.to_owned(),
                members: vec!["A2".to_owned(), "A1".to_owned()],
            }],
            objective_relations: Vec::new(),
            prerequisites: Vec::new(),
        }
    }

    #[test]
    fn au_lookup_is_case_insensitive() {
        let manifest = manifest_fixture();
        assert!(manifest.au_by_id("a1").is_some());
        assert!(manifest.descriptor_by_id("A1").is_some());
        assert!(manifest.au_by_id("A3").is_none());
    }

    #[test]
    fn first_au_follows_structure_order() {
        let manifest = manifest_fixture();
        assert_eq!(
            manifest.first_au().map(|au| au.system_id.as_str()),
            Some("A2")
        );
    }

    #[test]
    fn first_au_falls_back_to_record_order() {
        let mut manifest = manifest_fixture();
        manifest.structure.clear();
        assert_eq!(
            manifest.first_au().map(|au| au.system_id.as_str()),
            Some("A1")
        );
    }
}
