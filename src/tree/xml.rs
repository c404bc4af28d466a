//! XML to [`RawNode`] conversion.
//!
//! The mapping follows the familiar "xmltodict" layout that vendor tooling
//! produces, so paths read the same as in vendor documentation:
//!
//! - the document becomes a map with a single entry for the root element
//! - attributes become `@name` entries
//! - repeated child elements become a [`RawNode::Seq`]
//! - an element with only text becomes [`RawNode::Text`]
//! - text of an element that also has attributes or children becomes `#text`
//! - an empty element becomes [`RawNode::Absent`]

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{RawMap, RawNode};
use crate::error::ExtractionCause;

struct Frame {
    name: String,
    map: RawMap,
    text: String,
}

impl Frame {
    fn open(element: &BytesStart<'_>) -> Result<Self, ExtractionCause> {
        let name = std::str::from_utf8(element.name().as_ref())?.to_string();
        let mut map = RawMap::new();
        for attribute in element.attributes() {
            let attribute = attribute?;
            let key = std::str::from_utf8(attribute.key.as_ref())?;
            let value = attribute.unescape_value()?;
            map.insert(format!("@{key}"), RawNode::text(value.into_owned()));
        }
        Ok(Self {
            name,
            map,
            text: String::new(),
        })
    }

    fn finish(self) -> (String, RawNode) {
        let text = self.text.trim();
        let node = if self.map.is_empty() {
            if text.is_empty() {
                RawNode::Absent
            } else {
                RawNode::text(text)
            }
        } else {
            let mut map = self.map;
            if !text.is_empty() {
                map.insert("#text", RawNode::text(text));
            }
            RawNode::Map(map)
        };
        (self.name, node)
    }
}

/// Parse an XML document into a tree.
pub fn parse_xml(xml: &str) -> Result<RawNode, ExtractionCause> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut document = RawMap::new();

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => stack.push(Frame::open(e)?),
            Event::Empty(ref e) => {
                let (name, node) = Frame::open(e)?.finish();
                attach(&mut stack, &mut document, name, node);
            }
            Event::Text(ref e) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&e.unescape()?);
                }
            }
            Event::CData(e) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(_) => {
                let frame = stack.pop().ok_or_else(|| {
                    ExtractionCause::InvalidContainer("unbalanced XML end tag".to_string())
                })?;
                let (name, node) = frame.finish();
                attach(&mut stack, &mut document, name, node);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(ExtractionCause::InvalidContainer(format!(
            "XML ended with {} unclosed element(s)",
            stack.len()
        )));
    }
    if document.is_empty() {
        return Err(ExtractionCause::MissingMetadata(
            "XML document has no root element".to_string(),
        ));
    }

    Ok(RawNode::Map(document))
}

fn attach(stack: &mut [Frame], document: &mut RawMap, name: String, node: RawNode) {
    match stack.last_mut() {
        Some(parent) => parent.map.append(name, node),
        None => document.append(name, node),
    }
}
