/// The SCORM content-packaging model, shared by 1.2 and 2004.
///
/// The tree mirrors `imsmanifest.xml`: manifest → organizations → nested
/// items, plus the flat resource list. SCORM 2004 carries the IMSSS
/// extensions ([`super::sequencing`]) on items and organizations and a
/// manifest-level sequencing collection of reusable blocks.
///
/// SCORM 1.2-only adlcp fields (`masteryscore`, `prerequisites`,
/// `datafromlms`) and 2004-only ones (`completionThreshold`, `dataFromLMS`)
/// live side by side here; which set a given document may use is the
/// validator's concern, not the model's.
use serde::{Deserialize, Serialize};

use crate::enums::{ScormType, TimeLimitAction};
use crate::model::sequencing::Sequencing;
use crate::newtypes::{Iso8601Duration, ObjectiveWeight};

fn is_true(b: &bool) -> bool {
    *b
}

fn default_true() -> bool {
    true
}

fn is_false(b: &bool) -> bool {
    !*b
}

// ---------------------------------------------------------------------------
// Manifest root
// ---------------------------------------------------------------------------

/// A parsed `imsmanifest.xml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScormManifest {
    /// `manifest/@identifier`.
    pub identifier: String,

    /// `manifest/@version`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// `<metadata>` header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ManifestMetadata>,

    /// `<organizations>`.
    pub organizations: Organizations,

    /// `<resources>` children.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Resource>,

    /// `<imsss:sequencingCollection>` entries (SCORM 2004 only); each
    /// carries an `id` other blocks reference through `IDRef`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sequencing_collection: Vec<Sequencing>,
}

impl ScormManifest {
    /// The default organization, when the `default` reference resolves.
    pub fn default_organization(&self) -> Option<&Organization> {
        self.organizations.default_organization()
    }

    /// Looks up a resource by identifier (first match wins).
    pub fn resource_by_id(&self, identifier: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.identifier == identifier)
    }

    /// Looks up a sequencing-collection entry by its `ID`.
    pub fn collection_entry(&self, id: &str) -> Option<&Sequencing> {
        self.sequencing_collection
            .iter()
            .find(|s| s.id.as_deref() == Some(id))
    }
}

/// The `<metadata>` header of a manifest.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestMetadata {
    /// `<schema>` text, normally `"ADL SCORM"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// `<schemaversion>` text (`"1.2"`, `"CAM 1.3"`, `"2004 3rd Edition"`,
    /// `"2004 4th Edition"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    /// `<adlcp:location>` — package-relative path of an external metadata
    /// document fetched once during parse.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

// ---------------------------------------------------------------------------
// Organizations
// ---------------------------------------------------------------------------

/// `<organizations>` with its default reference.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organizations {
    /// `@default` — identifier of the default organization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// `<organization>` children.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub list: Vec<Organization>,
}

impl Organizations {
    /// Resolves the default organization: the one `@default` names, or the
    /// first in document order when the attribute is absent.
    pub fn default_organization(&self) -> Option<&Organization> {
        match &self.default {
            Some(id) => self.list.iter().find(|o| &o.identifier == id),
            None => self.list.first(),
        }
    }
}

/// One `<organization>` — a navigation tree over the shared resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    /// `@identifier`.
    pub identifier: String,
    /// `<title>` text.
    #[serde(default)]
    pub title: String,
    /// Child `<item>` elements.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Item>,
    /// `<imsss:sequencing>` on the organization (SCORM 2004).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequencing: Option<Sequencing>,
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// One `<item>` node in an organization tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// `@identifier`.
    pub identifier: String,
    /// `<title>` text.
    #[serde(default)]
    pub title: String,
    /// `@identifierref` — reference into the resource list. Leaf items
    /// carrying one are launchable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier_ref: Option<String>,
    /// `@parameters` — appended to the resolved launch URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<String>,
    /// `@isvisible`, default `true`.
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub is_visible: bool,
    /// `<adlcp:masteryscore>` (SCORM 1.2; 0–100).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mastery_score: Option<f64>,
    /// `<adlcp:prerequisites>` (SCORM 1.2; AICC-script expression).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prerequisites: Option<String>,
    /// `<adlcp:datafromlms>` / `<adlcp:dataFromLMS>` launch data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_from_lms: Option<String>,
    /// `<adlcp:maxtimeallowed>` / `<adlcp:attemptAbsoluteDurationLimit>`
    /// equivalent carried on 1.2 items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_time_allowed: Option<Iso8601Duration>,
    /// `<adlcp:timelimitaction>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit_action: Option<TimeLimitAction>,
    /// `<adlcp:completionThreshold>` (SCORM 2004 4th edition).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_threshold: Option<CompletionThreshold>,
    /// Nested `<item>` children.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Item>,
    /// `<imsss:sequencing>` (SCORM 2004).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequencing: Option<Sequencing>,
}

impl Item {
    /// A minimal item with the mandated defaults applied.
    pub fn new(identifier: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            title: title.into(),
            identifier_ref: None,
            parameters: None,
            is_visible: true,
            mastery_score: None,
            prerequisites: None,
            data_from_lms: None,
            max_time_allowed: None,
            time_limit_action: None,
            completion_threshold: None,
            items: Vec::new(),
            sequencing: None,
        }
    }

    /// Returns `true` when this item has no children.
    pub fn is_leaf(&self) -> bool {
        self.items.is_empty()
    }

    /// Depth-first iteration over this item and all descendants.
    pub fn descendants(&self) -> Vec<&Item> {
        let mut out = vec![self];
        let mut index = 0;
        while index < out.len() {
            let current = out[index];
            out.extend(current.items.iter());
            index += 1;
        }
        out
    }
}

/// `<adlcp:completionThreshold>`.
///
/// `minProgressMeasure` defaults to `1.0` (fully complete required) when
/// the attribute is absent; the model keeps absence observable and the
/// accessor applies the default.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionThreshold {
    /// `@completedByMeasure`, default `false`.
    #[serde(default, skip_serializing_if = "is_false")]
    pub completed_by_measure: bool,
    /// `@minProgressMeasure` in `[0, 1]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_progress_measure: Option<ObjectiveWeight>,
    /// `@progressWeight` in `[0, 1]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_weight: Option<ObjectiveWeight>,
}

impl CompletionThreshold {
    /// The effective minimum progress measure: declared value or `1.0`.
    pub fn effective_min_progress_measure(&self) -> ObjectiveWeight {
        self.min_progress_measure
            .unwrap_or_else(ObjectiveWeight::full)
    }
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// One `<resource>` — a file bundle referenced by items or other resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// `@identifier`.
    pub identifier: String,
    /// `@type`, normally `"webcontent"`.
    #[serde(rename = "type", default)]
    pub resource_type: String,
    /// `adlcp:scormType` (`adlcp:scormtype` in 1.2), default `sco`.
    #[serde(default)]
    pub scorm_type: ScormType,
    /// `@href` — package-relative launch path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// `@xml:base` prefix applied to `href` and file paths.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xml_base: Option<String>,
    /// `<file>` children.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<ResourceFile>,
    /// `<dependency>` children.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,
}

/// One `<file>` inside a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceFile {
    /// `@href` — package-relative path.
    pub href: String,
}

/// One `<dependency>` — a reference to a sibling resource whose files this
/// resource also needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    /// `@identifierref`.
    pub identifier_ref: String,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    fn org_with_items() -> Organization {
        let mut parent = Item::new("parent", "Module");
        parent.items = vec![Item::new("a", "A"), Item::new("b", "B")];
        Organization {
            identifier: "org1".to_owned(),
            title: "Course".to_owned(),
            items: vec![parent],
            sequencing: None,
        }
    }

    #[test]
    fn default_organization_by_reference() {
        let orgs = Organizations {
            default: Some("org2".to_owned()),
            list: vec![
                Organization {
                    identifier: "org1".to_owned(),
                    title: String::new(),
                    items: Vec::new(),
                    sequencing: None,
                },
                Organization {
                    identifier: "org2".to_owned(),
                    title: String::new(),
                    items: Vec::new(),
                    sequencing: None,
                },
            ],
        };
        assert_eq!(
            orgs.default_organization().map(|o| o.identifier.as_str()),
            Some("org2")
        );
    }

    #[test]
    fn default_organization_falls_back_to_first() {
        let orgs = Organizations {
            default: None,
            list: vec![org_with_items()],
        };
        assert_eq!(
            orgs.default_organization().map(|o| o.identifier.as_str()),
            Some("org1")
        );
    }

    #[test]
    fn descendants_are_depth_ordered() {
        let org = org_with_items();
        let ids: Vec<_> = org.items[0]
            .descendants()
            .iter()
            .map(|i| i.identifier.as_str())
            .collect();
        assert_eq!(ids, vec!["parent", "a", "b"]);
        assert!(!org.items[0].is_leaf());
        assert!(org.items[0].items[0].is_leaf());
    }

    #[test]
    fn completion_threshold_default_is_full() {
        let threshold = CompletionThreshold::default();
        assert_eq!(threshold.effective_min_progress_measure().value(), 1.0);
    }

    #[test]
    fn item_serde_omits_defaults() {
        let item = Item::new("item1", "Lesson");
        let json = serde_json::to_string(&item).expect("serializes");
        assert!(!json.contains("isVisible"));
        let back: Item = serde_json::from_str(&json).expect("round-trips");
        assert!(back.is_visible);
        assert_eq!(back, item);
    }
}
