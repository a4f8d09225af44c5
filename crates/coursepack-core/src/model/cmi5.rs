/// The cmi5 course-structure model (`cmi5.xml`).
///
/// A course plus a tree of blocks and assignable units. Identifiers are
/// IRIs; their well-formedness is a validation rule. Tin Can
/// (`tincan.xml`) packages are bound into the same shape — one block-less
/// course with an AU per activity — so both xAPI flavors share the
/// downstream pipeline.
use serde::{Deserialize, Serialize};

use crate::enums::{LaunchMethod, MoveOn};
use crate::newtypes::ObjectiveWeight;

/// A parsed cmi5 (or Tin Can) course structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cmi5Manifest {
    /// The `<course>` header.
    pub course: Cmi5Course,
    /// Top-level blocks and AUs, in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<Cmi5Node>,
}

impl Cmi5Manifest {
    /// Depth-first iteration over every AU in the structure.
    pub fn assignable_units(&self) -> Vec<&Cmi5Au> {
        fn walk<'a>(nodes: &'a [Cmi5Node], out: &mut Vec<&'a Cmi5Au>) {
            for node in nodes {
                match node {
                    Cmi5Node::Au(au) => out.push(au),
                    Cmi5Node::Block(block) => walk(&block.children, out),
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.nodes, &mut out);
        out
    }

    /// The first AU in document order; its `url` is the launch URL.
    pub fn first_au(&self) -> Option<&Cmi5Au> {
        self.assignable_units().first().copied()
    }
}

/// The `<course>` element.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cmi5Course {
    /// `@id` — an IRI identifying the course.
    pub id: String,
    /// `<title>` text (first langstring).
    #[serde(default)]
    pub title: String,
    /// `<description>` text (first langstring).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One node of the course structure: a nested block or an AU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Cmi5Node {
    /// `<block>`.
    Block(Cmi5Block),
    /// `<au>`.
    Au(Cmi5Au),
}

/// A `<block>` grouping element.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cmi5Block {
    /// `@id` — an IRI.
    pub id: String,
    /// `<title>` text.
    #[serde(default)]
    pub title: String,
    /// `<description>` text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Nested blocks and AUs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Cmi5Node>,
}

/// An `<au>` (assignable unit).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cmi5Au {
    /// `@id` — an IRI; doubles as the xAPI activity id.
    pub id: String,
    /// `<title>` text.
    #[serde(default)]
    pub title: String,
    /// `<description>` text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `<url>` — the launch URL, relative to the package root or absolute.
    #[serde(default)]
    pub url: String,
    /// `@launchMethod`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_method: Option<LaunchMethod>,
    /// `@moveOn`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_on: Option<MoveOn>,
    /// `@masteryScore` in `[0, 1]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mastery_score: Option<ObjectiveWeight>,
    /// `<launchParameters>` text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_parameters: Option<String>,
    /// `<entitlementKey>` text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entitlement_key: Option<String>,
    /// `@activityType`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignable_units_flatten_depth_first() {
        let manifest = Cmi5Manifest {
            course: Cmi5Course {
                id: "https://example.org/course/1".to_owned(),
                title: "Course".to_owned(),
                description: None,
            },
            nodes: vec![
                Cmi5Node::Block(Cmi5Block {
                    id: "https://example.org/block/1".to_owned(),
                    title: "Block".to_owned(),
                    description: None,
                    children: vec![Cmi5Node::Au(Cmi5Au {
                        id: "https://example.org/au/1".to_owned(),
                        url: "au1/index.html".to_owned(),
                        ..Cmi5Au::default()
                    })],
                }),
                Cmi5Node::Au(Cmi5Au {
                    id: "https://example.org/au/2".to_owned(),
                    url: "au2/index.html".to_owned(),
                    ..Cmi5Au::default()
                }),
            ],
        };
        let ids: Vec<_> = manifest
            .assignable_units()
            .iter()
            .map(|au| au.id.as_str())
            .collect();
        assert_eq!(
            ids,
            vec!["https://example.org/au/1", "https://example.org/au/2"]
        );
        assert_eq!(
            manifest.first_au().map(|au| au.url.as_str()),
            Some("au1/index.html")
        );
    }
}
