/// The LMS-facing metadata projection.
///
/// [`ModuleMetadata`] is the uniform summary every module type reduces
/// to: shared lifecycle fields up front, the typed manifest preserved as
/// a tagged payload, and spec-specific extras in [`MetadataFragment`]
/// key/value bags so consumers that only care about the common shape
/// never match on the payload.
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::enums::{ModuleType, SequencingLevel};
use crate::model::aicc::AiccManifest;
use crate::model::cmi5::Cmi5Manifest;
use crate::model::scorm::ScormManifest;
use crate::model::sequencing::Sequencing;
use crate::newtypes::Iso8601Duration;
use crate::parse::cmi5::Cmi5ParseOutput;
use crate::parse::scorm::ScormParseOutput;
use crate::resolve::ResolvedScorm;

// ---------------------------------------------------------------------------
// Shapes
// ---------------------------------------------------------------------------

/// The typed manifest payload, tagged by family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ManifestModel {
    /// SCORM 1.2 / 2004 content package.
    Scorm(ScormManifest),
    /// AICC descriptor family.
    Aicc(AiccManifest),
    /// cmi5 / Tin Can course structure.
    Cmi5(Cmi5Manifest),
}

/// An open key/value bag of spec-specific metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataFragment {
    /// Fragment name (`"scorm"`, `"externalMetadata"`, `"validation"`, …).
    pub name: String,
    /// Arbitrary JSON values.
    pub values: Map<String, Value>,
}

impl MetadataFragment {
    /// Builds a fragment from an iterator of key/value pairs.
    pub fn new(
        name: impl Into<String>,
        values: impl IntoIterator<Item = (String, Value)>,
    ) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().collect(),
        }
    }
}

/// The uniform module summary an LMS ingests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleMetadata {
    /// The typed manifest this summary was derived from.
    pub manifest: ManifestModel,
    /// Which specification the package conforms to.
    pub module_type: ModuleType,
    /// `true` for cmi5/Tin Can modules, and for SCORM packages shipping a
    /// companion `tincan.xml`.
    pub xapi_enabled: bool,
    /// Course title.
    pub title: String,
    /// Course description, when the package carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The launch URL, package-relative (or absolute for web-launched
    /// AICC/cmi5 units). Empty when the package declares none — the
    /// validation result carries the corresponding error.
    pub launch_url: String,
    /// The package identifier.
    pub identifier: String,
    /// Declared package version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Total declared duration, when any item carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<Iso8601Duration>,
    /// Spec-specific key/value bags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub composite: Vec<MetadataFragment>,
    /// `true` when any IMSSS sequencing is present (SCORM 2004 only).
    pub has_sequencing: bool,
    /// How much of the sequencing machinery the package uses.
    pub sequencing_level: SequencingLevel,
    /// The global objective namespace the package writes.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub global_objective_ids: BTreeSet<String>,
}

// ---------------------------------------------------------------------------
// Sequencing classification
// ---------------------------------------------------------------------------

/// Classifies how much sequencing machinery a SCORM 2004 package uses.
///
/// `Full` when any block declares sequencing rules, rollup rules, or
/// randomization controls; `Minimal` when only control mode or delivery
/// controls appear; `None` otherwise.
pub fn classify_sequencing<'a>(
    blocks: impl Iterator<Item = &'a Sequencing>,
) -> SequencingLevel {
    let mut level = SequencingLevel::None;
    for block in blocks {
        if block.has_rules() {
            return SequencingLevel::Full;
        }
        if block.control_mode.is_some() || block.delivery_controls.is_some() {
            level = SequencingLevel::Minimal;
        }
    }
    level
}

// ---------------------------------------------------------------------------
// Projections
// ---------------------------------------------------------------------------

/// Projects a parsed and resolved SCORM package.
pub fn project_scorm(
    output: ScormParseOutput,
    resolution: &ResolvedScorm,
    xapi_enabled: bool,
    extra_fragments: Vec<MetadataFragment>,
) -> ModuleMetadata {
    let manifest = output.manifest;
    let is_2004 = matches!(output.module_type, ModuleType::Scorm2004(_));

    let (has_sequencing, sequencing_level) = if is_2004 {
        let org_blocks = manifest
            .organizations
            .list
            .iter()
            .filter_map(|o| o.sequencing.as_ref());
        let node_blocks = resolution
            .tree
            .nodes
            .iter()
            .filter_map(|n| n.sequencing.as_ref());
        let blocks: Vec<&Sequencing> = org_blocks.chain(node_blocks).collect();
        (
            !blocks.is_empty(),
            classify_sequencing(blocks.into_iter()),
        )
    } else {
        (false, SequencingLevel::None)
    };

    let title = manifest
        .default_organization()
        .map(|o| o.title.clone())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| manifest.identifier.clone());

    let mut composite = vec![scorm_fragment(&manifest, output.module_type)];
    composite.extend(extra_fragments);

    ModuleMetadata {
        module_type: output.module_type,
        xapi_enabled,
        title,
        description: None,
        launch_url: output.launch_url.unwrap_or_default(),
        identifier: manifest.identifier.clone(),
        version: manifest.version.clone(),
        duration: output.duration,
        composite,
        has_sequencing,
        sequencing_level,
        global_objective_ids: resolution.global_objective_ids.clone(),
        manifest: ManifestModel::Scorm(manifest),
    }
}

fn scorm_fragment(manifest: &ScormManifest, module_type: ModuleType) -> MetadataFragment {
    let mut values = Map::new();
    values.insert("moduleType".to_owned(), Value::String(module_type.as_str().to_owned()));
    if let Some(metadata) = &manifest.metadata {
        if let Some(schema) = &metadata.schema {
            values.insert("schema".to_owned(), Value::String(schema.clone()));
        }
        if let Some(schema_version) = &metadata.schema_version {
            values.insert(
                "schemaVersion".to_owned(),
                Value::String(schema_version.clone()),
            );
        }
    }
    MetadataFragment {
        name: "scorm".to_owned(),
        values,
    }
}

/// Projects a parsed AICC package.
pub fn project_aicc(manifest: AiccManifest) -> ModuleMetadata {
    let launch_url = manifest
        .first_au()
        .map(|au| au.file_name.clone())
        .unwrap_or_default();
    let duration = manifest
        .assignable_units
        .iter()
        .filter_map(|au| au.max_time_allowed)
        .reduce(Iso8601Duration::saturating_add);

    let title = if manifest.course.course_title.is_empty() {
        manifest.course.course_id.clone()
    } else {
        manifest.course.course_title.clone()
    };
    let identifier = if manifest.course.course_id.is_empty() {
        manifest.package_name.clone()
    } else {
        manifest.course.course_id.clone()
    };

    let mut values = Map::new();
    values.insert(
        "packageName".to_owned(),
        Value::String(manifest.package_name.clone()),
    );
    if let Some(creator) = &manifest.course.course_creator {
        values.insert("courseCreator".to_owned(), Value::String(creator.clone()));
    }
    if let Some(system) = &manifest.course.course_system {
        values.insert("courseSystem".to_owned(), Value::String(system.clone()));
    }

    ModuleMetadata {
        module_type: ModuleType::Aicc,
        xapi_enabled: false,
        title,
        description: manifest.course.description.clone(),
        launch_url,
        identifier,
        version: manifest.course.version.clone(),
        duration,
        composite: vec![MetadataFragment {
            name: "aicc".to_owned(),
            values,
        }],
        has_sequencing: false,
        sequencing_level: SequencingLevel::None,
        global_objective_ids: BTreeSet::new(),
        manifest: ManifestModel::Aicc(manifest),
    }
}

/// Projects a parsed cmi5 / Tin Can course structure.
pub fn project_cmi5(output: Cmi5ParseOutput) -> ModuleMetadata {
    let manifest = output.manifest;
    let launch_url = manifest
        .first_au()
        .map(|au| au.url.clone())
        .unwrap_or_default();

    let mut values = Map::new();
    values.insert(
        "document".to_owned(),
        Value::String(output.manifest_path.clone()),
    );
    if let Some(au) = manifest.first_au() {
        if let Some(move_on) = au.move_on {
            values.insert(
                "moveOn".to_owned(),
                Value::String(move_on.as_str().to_owned()),
            );
        }
        if let Some(score) = au.mastery_score {
            if let Some(number) = serde_json::Number::from_f64(score.value()) {
                values.insert("masteryScore".to_owned(), Value::Number(number));
            }
        }
    }

    ModuleMetadata {
        module_type: ModuleType::Cmi5,
        xapi_enabled: true,
        title: manifest.course.title.clone(),
        description: manifest.course.description.clone(),
        launch_url,
        identifier: manifest.course.id.clone(),
        version: None,
        duration: None,
        composite: vec![MetadataFragment {
            name: "cmi5".to_owned(),
            values,
        }],
        has_sequencing: false,
        sequencing_level: SequencingLevel::None,
        global_objective_ids: BTreeSet::new(),
        manifest: ManifestModel::Cmi5(manifest),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use crate::model::sequencing::{
        ControlMode, RandomizationControls, SequencingRules,
    };

    use super::*;

    #[test]
    fn classify_none_without_blocks() {
        assert_eq!(
            classify_sequencing(std::iter::empty()),
            SequencingLevel::None
        );
    }

    #[test]
    fn classify_minimal_for_control_mode_only() {
        let block = Sequencing {
            control_mode: Some(ControlMode::default()),
            ..Sequencing::default()
        };
        assert_eq!(
            classify_sequencing([&block].into_iter()),
            SequencingLevel::Minimal
        );
    }

    #[test]
    fn classify_full_for_rules_or_randomization() {
        let with_rules = Sequencing {
            sequencing_rules: Some(SequencingRules {
                pre_condition: vec![crate::model::sequencing::SequencingRule {
                    conditions: Default::default(),
                    action: crate::enums::RuleActionType::Skip,
                }],
                ..SequencingRules::default()
            }),
            ..Sequencing::default()
        };
        assert_eq!(
            classify_sequencing([&with_rules].into_iter()),
            SequencingLevel::Full
        );

        let with_randomization = Sequencing {
            randomization_controls: Some(RandomizationControls::default()),
            ..Sequencing::default()
        };
        let minimal_then_full = [
            &Sequencing {
                control_mode: Some(ControlMode::default()),
                ..Sequencing::default()
            },
            &with_randomization,
        ];
        assert_eq!(
            classify_sequencing(minimal_then_full.into_iter()),
            SequencingLevel::Full
        );
    }
}
