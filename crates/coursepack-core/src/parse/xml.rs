/// Shared roxmltree helpers for the XML binding layers.
///
/// SCORM content in the wild is notoriously loose about namespace usage —
/// manifests exist with default-namespaced adlcp elements, prefixed
/// imscp elements, and everything in between. Element and attribute
/// lookups here therefore match by *local name* across namespaces, and
/// the namespace constants are used only where disambiguation matters
/// (edition sniffing, IMSSS detection).
use roxmltree::{Document, Node};

use crate::error::ManifestParseError;

// ---------------------------------------------------------------------------
// Namespace URIs
// ---------------------------------------------------------------------------

/// IMS content packaging, SCORM 1.2 flavor.
pub const NS_IMSCP_12: &str = "http://www.imsproject.org/xsd/imscp_rootv1p1p2";
/// IMS content packaging, SCORM 2004 flavor.
pub const NS_IMSCP_2004: &str = "http://www.imsglobal.org/xsd/imscp_v1p1";
/// ADL content packaging extensions, SCORM 1.2.
pub const NS_ADLCP_12: &str = "http://www.adlnet.org/xsd/adlcp_rootv1p2";
/// ADL content packaging extensions, SCORM 2004.
pub const NS_ADLCP_2004: &str = "http://www.adlnet.org/xsd/adlcp_v1p3";
/// ADL sequencing extensions.
pub const NS_ADLSEQ: &str = "http://www.adlnet.org/xsd/adlseq_v1p3";
/// ADL navigation extensions.
pub const NS_ADLNAV: &str = "http://www.adlnet.org/xsd/adlnav_v1p3";
/// IMS Simple Sequencing.
pub const NS_IMSSS: &str = "http://www.imsglobal.org/xsd/imsss";
/// cmi5 course structure.
pub const NS_CMI5: &str = "https://w3id.org/xapi/profiles/cmi5/v1/CourseStructure.xsd";

/// Parses `text` into a DOM, mapping syntax failures onto
/// [`ManifestParseError`] with the roxmltree position folded into the
/// cause.
pub fn parse_document<'a>(file: &str, text: &'a str) -> Result<Document<'a>, ManifestParseError> {
    Document::parse(text).map_err(|e| ManifestParseError::new(file, e.to_string()))
}

/// Returns `true` when any element or declared namespace in the document
/// belongs to `namespace`.
pub fn uses_namespace(doc: &Document<'_>, namespace: &str) -> bool {
    doc.root_element()
        .namespaces()
        .any(|ns| ns.uri() == namespace)
        || doc
            .root()
            .descendants()
            .any(|n| n.is_element() && n.tag_name().namespace() == Some(namespace))
}

/// First child element with the given local name, any namespace.
pub fn child<'a, 'input>(node: Node<'a, 'input>, local: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == local)
}

/// All child elements with the given local name, any namespace, in
/// document order.
pub fn children<'a, 'input>(node: Node<'a, 'input>, local: &str) -> Vec<Node<'a, 'input>> {
    node.children()
        .filter(|c| c.is_element() && c.tag_name().name() == local)
        .collect()
}

/// Trimmed text content of a node, `None` when empty.
pub fn text(node: Node<'_, '_>) -> Option<String> {
    let joined: String = node
        .children()
        .filter_map(|c| c.text())
        .collect::<String>();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

/// Trimmed text of the first child element with the given local name.
pub fn child_text(node: Node<'_, '_>, local: &str) -> Option<String> {
    child(node, local).and_then(text)
}

/// Attribute value by local name, any namespace.
///
/// Prefers the unnamespaced attribute when both forms are present.
pub fn attr<'a>(node: Node<'a, '_>, local: &str) -> Option<&'a str> {
    if let Some(value) = node.attribute(local) {
        return Some(value);
    }
    node.attributes()
        .find(|a| a.name() == local)
        .map(|a| a.value())
}

/// Attribute value as an owned, trimmed string; `None` when absent or
/// blank.
pub fn attr_string(node: Node<'_, '_>, local: &str) -> Option<String> {
    attr(node, local)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Required attribute, or a [`ManifestParseError`] naming the element.
pub fn required_attr(
    file: &str,
    node: Node<'_, '_>,
    local: &str,
) -> Result<String, ManifestParseError> {
    attr_string(node, local).ok_or_else(|| {
        ManifestParseError::new(
            file,
            format!(
                "element <{}> is missing required attribute \"{local}\"",
                node.tag_name().name()
            ),
        )
    })
}

/// XML Schema boolean lexical space: `true`/`false`/`1`/`0`.
///
/// Unrecognised text is `None`; callers apply the field's schema default.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Boolean attribute with a schema default.
pub fn bool_attr(node: Node<'_, '_>, local: &str, default: bool) -> bool {
    attr(node, local).and_then(parse_bool).unwrap_or(default)
}

/// Numeric attribute parsed as `f64`; unparsable text is a structural
/// defect.
pub fn f64_attr(
    file: &str,
    node: Node<'_, '_>,
    local: &str,
) -> Result<Option<f64>, ManifestParseError> {
    match attr(node, local).map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse::<f64>().map(Some).map_err(|_| {
            ManifestParseError::new(
                file,
                format!(
                    "attribute \"{local}\" on <{}> is not a number: {raw:?}",
                    node.tag_name().name()
                ),
            )
        }),
    }
}

/// Numeric attribute parsed as `u32` (non-negative integer positions).
pub fn u32_attr(
    file: &str,
    node: Node<'_, '_>,
    local: &str,
) -> Result<Option<u32>, ManifestParseError> {
    match attr(node, local).map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse::<u32>().map(Some).map_err(|_| {
            ManifestParseError::new(
                file,
                format!(
                    "attribute \"{local}\" on <{}> is not a non-negative integer: {raw:?}",
                    node.tag_name().name()
                ),
            )
        }),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    const SAMPLE: &str = r#"<root xmlns:adlcp="http://www.adlnet.org/xsd/adlcp_v1p3">
        <item identifier="i1" adlcp:scormType="asset" isvisible="false" count="3"/>
        <title> Hello </title>
        <title>Second</title>
    </root>"#;

    #[test]
    fn child_and_text_by_local_name() {
        let doc = parse_document("sample.xml", SAMPLE).expect("parses");
        let root = doc.root_element();
        assert_eq!(child_text(root, "title").as_deref(), Some("Hello"));
        assert_eq!(children(root, "title").len(), 2);
        assert!(child(root, "ghost").is_none());
    }

    #[test]
    fn attr_matches_any_namespace() {
        let doc = parse_document("sample.xml", SAMPLE).expect("parses");
        let item = child(doc.root_element(), "item").expect("item");
        assert_eq!(attr(item, "scormType"), Some("asset"));
        assert_eq!(attr(item, "identifier"), Some("i1"));
        assert_eq!(bool_attr(item, "isvisible", true), false);
        assert_eq!(
            u32_attr("sample.xml", item, "count").expect("number"),
            Some(3)
        );
    }

    #[test]
    fn bad_number_is_structural() {
        let doc =
            parse_document("f.xml", r#"<r limit="soon"/>"#).expect("parses");
        let err = u32_attr("f.xml", doc.root_element(), "limit").expect_err("must fail");
        assert!(err.to_string().contains("limit"));
    }

    #[test]
    fn namespace_probe() {
        let doc = parse_document("sample.xml", SAMPLE).expect("parses");
        assert!(uses_namespace(&doc, NS_ADLCP_2004));
        assert!(!uses_namespace(&doc, NS_IMSSS));
    }

    #[test]
    fn malformed_document_reports_file() {
        let err = parse_document("broken.xml", "<a><b></a>").expect_err("must fail");
        assert!(err.to_string().contains("broken.xml"));
    }
}
