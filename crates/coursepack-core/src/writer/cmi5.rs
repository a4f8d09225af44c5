/// Serialization of [`Cmi5Manifest`] back to `cmi5.xml`.
use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::model::cmi5::{Cmi5Au, Cmi5Block, Cmi5Manifest, Cmi5Node};

use super::WriteError;

/// Serializes `manifest` as a `cmi5.xml` course structure.
pub fn write_cmi5(manifest: &Cmi5Manifest) -> Result<String, WriteError> {
    let mut emitter = Emitter {
        writer: Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2),
    };
    emitter.document(manifest)?;
    let bytes = emitter.writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(WriteError::new)
}

struct Emitter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl Emitter {
    fn document(&mut self, manifest: &Cmi5Manifest) -> Result<(), WriteError> {
        self.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut root = BytesStart::new("courseStructure");
        root.push_attribute((
            "xmlns",
            "https://w3id.org/xapi/profiles/cmi5/v1/CourseStructure.xsd",
        ));
        self.event(Event::Start(root))?;

        let mut course = BytesStart::new("course");
        course.push_attribute(("id", manifest.course.id.as_str()));
        self.event(Event::Start(course))?;
        self.lang_element("title", &manifest.course.title)?;
        if let Some(description) = &manifest.course.description {
            self.lang_element("description", description)?;
        }
        self.end("course")?;

        for node in &manifest.nodes {
            self.node(node)?;
        }
        self.end("courseStructure")
    }

    fn node(&mut self, node: &Cmi5Node) -> Result<(), WriteError> {
        match node {
            Cmi5Node::Block(block) => self.block(block),
            Cmi5Node::Au(au) => self.au(au),
        }
    }

    fn block(&mut self, block: &Cmi5Block) -> Result<(), WriteError> {
        let mut start = BytesStart::new("block");
        start.push_attribute(("id", block.id.as_str()));
        self.event(Event::Start(start))?;
        self.lang_element("title", &block.title)?;
        if let Some(description) = &block.description {
            self.lang_element("description", description)?;
        }
        for child in &block.children {
            self.node(child)?;
        }
        self.end("block")
    }

    fn au(&mut self, au: &Cmi5Au) -> Result<(), WriteError> {
        let mut start = BytesStart::new("au");
        start.push_attribute(("id", au.id.as_str()));
        if let Some(method) = au.launch_method {
            start.push_attribute(("launchMethod", method.as_str()));
        }
        if let Some(move_on) = au.move_on {
            start.push_attribute(("moveOn", move_on.as_str()));
        }
        if let Some(score) = au.mastery_score {
            start.push_attribute(("masteryScore", format!("{}", score.value()).as_str()));
        }
        if let Some(activity_type) = &au.activity_type {
            start.push_attribute(("activityType", activity_type.as_str()));
        }
        self.event(Event::Start(start))?;
        self.lang_element("title", &au.title)?;
        if let Some(description) = &au.description {
            self.lang_element("description", description)?;
        }
        self.text_element("url", &au.url)?;
        if let Some(parameters) = &au.launch_parameters {
            self.text_element("launchParameters", parameters)?;
        }
        if let Some(key) = &au.entitlement_key {
            self.text_element("entitlementKey", key)?;
        }
        self.end("au")
    }

    // -- primitives --------------------------------------------------------

    fn event(&mut self, event: Event<'_>) -> Result<(), WriteError> {
        self.writer.write_event(event).map_err(WriteError::new)
    }

    fn end(&mut self, name: &str) -> Result<(), WriteError> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn text_element(&mut self, name: &str, text: &str) -> Result<(), WriteError> {
        self.event(Event::Start(BytesStart::new(name)))?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn lang_element(&mut self, name: &str, text: &str) -> Result<(), WriteError> {
        self.event(Event::Start(BytesStart::new(name)))?;
        self.text_element("langstring", text)?;
        self.end(name)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use crate::parse::cmi5::parse_cmi5_text;
    use crate::validation::ValidationMode;

    use super::*;

    #[test]
    fn write_then_parse_is_identity_on_the_model() {
        let source = r#"<courseStructure>
  <course id="https://example.org/course/rt">
    <title><langstring>Round Trip</langstring></title>
    <description><langstring>All the parts</langstring></description>
  </course>
  <block id="https://example.org/block/1">
    <title><langstring>Unit</langstring></title>
    <au id="https://example.org/au/1" launchMethod="OwnWindow" moveOn="CompletedOrPassed"
        masteryScore="0.75">
      <title><langstring>Lesson</langstring></title>
      <url>au1/index.html</url>
      <launchParameters>mode=normal</launchParameters>
    </au>
  </block>
</courseStructure>"#;
        let first = parse_cmi5_text("cmi5.xml", source, ValidationMode::Strict).expect("parses");
        let written = write_cmi5(&first.manifest).expect("serializes");
        assert!(written.contains("moveOn=\"CompletedOrPassed\""));
        assert!(written.contains("launchMethod=\"OwnWindow\""));
        let second =
            parse_cmi5_text("cmi5.xml", &written, ValidationMode::Strict).expect("re-parses");
        assert_eq!(second.manifest, first.manifest);
    }
}
