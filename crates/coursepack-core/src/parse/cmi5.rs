/// Binding of `cmi5.xml` (and `tincan.xml`) into [`Cmi5Manifest`].
///
/// cmi5 course structures are bound faithfully; Tin Can descriptors are
/// folded into the same model — one course, one AU per `<activity>` —
/// because both are xAPI course structures and every downstream stage
/// (validation, projection) treats them identically.
use tracing::debug;

use crate::error::{ManifestParseError, ParseError};
use crate::file_access::{self, FileAccess};
use crate::enums::{LaunchMethod, MoveOn};
use crate::model::cmi5::{Cmi5Au, Cmi5Block, Cmi5Course, Cmi5Manifest, Cmi5Node};
use crate::newtypes::ObjectiveWeight;
use crate::parse::xml::{
    attr_string, child, child_text, children, f64_attr, parse_document, required_attr,
};
use crate::validation::{IssueCode, Severity, ValidationIssue, ValidationMode, ValidationResult};

/// The cmi5 course-structure filename.
pub const CMI5_FILE: &str = "cmi5.xml";
/// The Tin Can descriptor filename.
pub const TINCAN_FILE: &str = "tincan.xml";

/// Output of the cmi5/Tin Can binding.
#[derive(Debug, Clone)]
pub struct Cmi5ParseOutput {
    /// The typed course structure.
    pub manifest: Cmi5Manifest,
    /// The document the binding read (`cmi5.xml` or `tincan.xml`).
    pub manifest_path: String,
    /// Issues captured during binding (range violations).
    pub captured: ValidationResult,
}

/// Parses the package's xAPI course structure.
///
/// Prefers `cmi5.xml`; falls back to `tincan.xml` when absent.
pub fn parse_cmi5(
    fa: &dyn FileAccess,
    mode: ValidationMode,
    case_insensitive: bool,
) -> Result<Cmi5ParseOutput, ParseError> {
    let locate = |name: &str| -> Result<Option<String>, crate::file_access::FileAccessError> {
        if fa.exists(name) {
            return Ok(Some(name.to_owned()));
        }
        if case_insensitive {
            return file_access::find_case_insensitive(fa, "", name);
        }
        Ok(None)
    };

    let (path, tincan) = match locate(CMI5_FILE)? {
        Some(path) => (path, false),
        None => match locate(TINCAN_FILE)? {
            Some(path) => (path, true),
            None => {
                return Err(
                    ManifestParseError::new(CMI5_FILE, "course structure file not found").into(),
                );
            }
        },
    };

    let text = file_access::read_to_string(fa, &path)
        .map_err(|e| ManifestParseError::new(&path, e.to_string()))?;
    debug!(path = %path, tincan, "binding xAPI course structure");
    if tincan {
        parse_tincan_text(&path, &text).map_err(Into::into)
    } else {
        parse_cmi5_text(&path, &text, mode).map_err(Into::into)
    }
}

/// Parses cmi5 course-structure text.
pub fn parse_cmi5_text(
    file: &str,
    text: &str,
    mode: ValidationMode,
) -> Result<Cmi5ParseOutput, ManifestParseError> {
    let doc = parse_document(file, text)?;
    let root = doc.root_element();
    if root.tag_name().name() != "courseStructure" {
        return Err(ManifestParseError::new(
            file,
            format!(
                "root element is <{}>, expected <courseStructure>",
                root.tag_name().name()
            ),
        ));
    }

    let mut captured = ValidationResult::valid();

    let course_node = child(root, "course")
        .ok_or_else(|| ManifestParseError::new(file, "missing <course> element"))?;
    let course = Cmi5Course {
        id: required_attr(file, course_node, "id")?,
        title: lang_text(course_node, "title").unwrap_or_default(),
        description: lang_text(course_node, "description"),
    };

    let mut nodes = Vec::new();
    for node in root.children().filter(|n| n.is_element()) {
        match node.tag_name().name() {
            "block" => nodes.push(Cmi5Node::Block(bind_block(file, node, mode, &mut captured)?)),
            "au" => nodes.push(Cmi5Node::Au(bind_au(file, node, mode, &mut captured)?)),
            _ => {}
        }
    }

    Ok(Cmi5ParseOutput {
        manifest: Cmi5Manifest { course, nodes },
        manifest_path: file.to_owned(),
        captured,
    })
}

fn bind_block(
    file: &str,
    node: roxmltree::Node<'_, '_>,
    mode: ValidationMode,
    captured: &mut ValidationResult,
) -> Result<Cmi5Block, ManifestParseError> {
    let id = required_attr(file, node, "id")?;
    let mut children_nodes = Vec::new();
    for c in node.children().filter(|n| n.is_element()) {
        match c.tag_name().name() {
            "block" => children_nodes.push(Cmi5Node::Block(bind_block(file, c, mode, captured)?)),
            "au" => children_nodes.push(Cmi5Node::Au(bind_au(file, c, mode, captured)?)),
            _ => {}
        }
    }
    Ok(Cmi5Block {
        id,
        title: lang_text(node, "title").unwrap_or_default(),
        description: lang_text(node, "description"),
        children: children_nodes,
    })
}

fn bind_au(
    file: &str,
    node: roxmltree::Node<'_, '_>,
    mode: ValidationMode,
    captured: &mut ValidationResult,
) -> Result<Cmi5Au, ManifestParseError> {
    let id = required_attr(file, node, "id")?;

    let mastery_score = match f64_attr(file, node, "masteryScore")? {
        None => None,
        Some(v) => match ObjectiveWeight::new(v) {
            Ok(w) => Some(w),
            Err(e) => {
                captured.push(ValidationIssue::new(
                    Severity::Error,
                    mode,
                    IssueCode::Cmi5InvalidMasteryScore,
                    e.to_string(),
                    format!("au[@id='{id}']/@masteryScore"),
                ));
                None
            }
        },
    };

    Ok(Cmi5Au {
        url: child_text(node, "url").unwrap_or_default(),
        title: lang_text(node, "title").unwrap_or_default(),
        description: lang_text(node, "description"),
        launch_method: attr_string(node, "launchMethod")
            .and_then(|s| LaunchMethod::from_token(&s)),
        move_on: attr_string(node, "moveOn").and_then(|s| MoveOn::from_token(&s)),
        mastery_score,
        launch_parameters: child_text(node, "launchParameters"),
        entitlement_key: child_text(node, "entitlementKey"),
        activity_type: attr_string(node, "activityType"),
        id,
    })
}

/// First `<langstring>` under the named child (cmi5 titles/descriptions
/// are language maps; the first entry is the projection's pick).
fn lang_text(node: roxmltree::Node<'_, '_>, local: &str) -> Option<String> {
    let container = child(node, local)?;
    let strings = children(container, "langstring");
    if strings.is_empty() {
        // Tolerate bare text where content omits the langstring wrapper.
        return crate::parse::xml::text(container);
    }
    strings.into_iter().find_map(crate::parse::xml::text)
}

// ---------------------------------------------------------------------------
// Tin Can
// ---------------------------------------------------------------------------

/// Parses `tincan.xml` into the shared model: one AU per `<activity>`.
pub fn parse_tincan_text(file: &str, text: &str) -> Result<Cmi5ParseOutput, ManifestParseError> {
    let doc = parse_document(file, text)?;
    let root = doc.root_element();
    if root.tag_name().name() != "tincan" {
        return Err(ManifestParseError::new(
            file,
            format!("root element is <{}>, expected <tincan>", root.tag_name().name()),
        ));
    }

    let activities = child(root, "activities")
        .ok_or_else(|| ManifestParseError::new(file, "missing <activities> element"))?;

    let mut nodes = Vec::new();
    let mut course: Option<Cmi5Course> = None;
    for activity in children(activities, "activity") {
        let id = required_attr(file, activity, "id")?;
        let title = child_text(activity, "name").unwrap_or_default();
        let description = child_text(activity, "description");
        if course.is_none() {
            course = Some(Cmi5Course {
                id: id.clone(),
                title: title.clone(),
                description: description.clone(),
            });
        }
        nodes.push(Cmi5Node::Au(Cmi5Au {
            id,
            title,
            description,
            url: child_text(activity, "launch").unwrap_or_default(),
            launch_method: None,
            move_on: None,
            mastery_score: None,
            launch_parameters: None,
            entitlement_key: None,
            activity_type: attr_string(activity, "type"),
        }));
    }

    let course = course
        .ok_or_else(|| ManifestParseError::new(file, "tincan.xml lists no activities"))?;

    Ok(Cmi5ParseOutput {
        manifest: Cmi5Manifest { course, nodes },
        manifest_path: file.to_owned(),
        captured: ValidationResult::valid(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    const COURSE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<courseStructure xmlns="https://w3id.org/xapi/profiles/cmi5/v1/CourseStructure.xsd">
  <course id="https://example.org/course/geology">
    <title><langstring lang="en-US">Geology 101</langstring></title>
    <description><langstring lang="en-US">Rocks and such</langstring></description>
  </course>
  <block id="https://example.org/block/1">
    <title><langstring>Unit 1</langstring></title>
    <au id="https://example.org/au/1" moveOn="CompletedAndPassed" masteryScore="0.8"
        launchMethod="OwnWindow">
      <title><langstring>Minerals</langstring></title>
      <url>au1/index.html</url>
      <launchParameters>mode=review</launchParameters>
    </au>
  </block>
  <au id="https://example.org/au/2" moveOn="Completed">
    <title><langstring>Quiz</langstring></title>
    <url>au2/index.html?lang=en</url>
  </au>
</courseStructure>"#;

    #[test]
    fn binds_course_structure() {
        let out = parse_cmi5_text("cmi5.xml", COURSE, ValidationMode::Strict).expect("parses");
        assert_eq!(out.manifest.course.title, "Geology 101");
        assert_eq!(
            out.manifest.course.description.as_deref(),
            Some("Rocks and such")
        );
        let aus = out.manifest.assignable_units();
        assert_eq!(aus.len(), 2);
        assert_eq!(aus[0].launch_method, Some(LaunchMethod::OwnWindow));
        assert_eq!(aus[0].move_on, Some(MoveOn::CompletedAndPassed));
        assert_eq!(aus[0].mastery_score.map(ObjectiveWeight::value), Some(0.8));
        assert_eq!(aus[0].launch_parameters.as_deref(), Some("mode=review"));
        assert_eq!(
            out.manifest.first_au().map(|au| au.url.as_str()),
            Some("au1/index.html")
        );
    }

    #[test]
    fn missing_title_is_not_structural() {
        let xml = r#"<courseStructure><course id="https://example.org/c"/></courseStructure>"#;
        let out = parse_cmi5_text("cmi5.xml", xml, ValidationMode::Strict).expect("parses");
        assert_eq!(out.manifest.course.title, "");
    }

    #[test]
    fn out_of_range_mastery_score_is_captured() {
        let xml = r#"<courseStructure>
  <course id="https://example.org/c"><title><langstring>C</langstring></title></course>
  <au id="https://example.org/au/1" masteryScore="1.5"><url>a.html</url></au>
</courseStructure>"#;
        let out = parse_cmi5_text("cmi5.xml", xml, ValidationMode::Strict).expect("parses");
        assert_eq!(out.captured.len(), 1);
        assert_eq!(out.captured.issues[0].code, IssueCode::Cmi5InvalidMasteryScore);
        assert_eq!(out.manifest.assignable_units()[0].mastery_score, None);
    }

    #[test]
    fn tincan_binds_to_shared_model() {
        let xml = r#"<tincan xmlns="http://projecttincan.com/tincan.xsd">
  <activities>
    <activity id="https://example.org/activity/1" type="http://adlnet.gov/expapi/activities/course">
      <name>My xAPI Course</name>
      <description lang="en-US">Course things</description>
      <launch lang="en-us">index_lms.html</launch>
    </activity>
  </activities>
</tincan>"#;
        let out = parse_tincan_text("tincan.xml", xml).expect("parses");
        assert_eq!(out.manifest.course.title, "My xAPI Course");
        assert_eq!(
            out.manifest.first_au().map(|au| au.url.as_str()),
            Some("index_lms.html")
        );
    }
}
