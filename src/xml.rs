//! XML to JSON transcoding for expense payloads.
//!
//! The mapping is structural and schema-less:
//!
//! - the document becomes an object keyed by the root element name
//! - child elements become object keys, repeated siblings collapse into an array
//!   in document order
//! - text content becomes a string value (no numeric coercion)
//! - an element with no children and no text maps to `""`
//! - text mixed with child elements is kept under the `"content"` key
//!
//! Attributes, comments, processing instructions and doctype declarations are
//! dropped.

use quick_xml::{Reader, events::Event};
use serde_json::{Map, Value};

use crate::{Res, error::GatewayError, utils};

const CONTENT_KEY: &str = "content";

struct Frame {
    name: String,
    children: Map<String, Value>,
    text: String,
}

impl Frame {
    fn new(name: String) -> Self {
        Frame {
            name,
            children: Map::new(),
            text: String::new(),
        }
    }

    // Text is accumulated raw across entity, CDATA and comment boundaries and
    // trimmed only here, once per element.
    fn into_value(self) -> Value {
        let text = self.text.trim();
        if self.children.is_empty() {
            return Value::String(text.to_string());
        }

        let mut children = self.children;
        if !text.is_empty() {
            insert_child(&mut children, CONTENT_KEY.to_string(), Value::String(text.to_string()));
        }
        Value::Object(children)
    }
}

fn insert_child(map: &mut Map<String, Value>, key: String, value: Value) {
    match map.get_mut(&key) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            map.insert(key, value);
        }
    }
}

fn element_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

/// Parses an XML document into its JSON value.
pub fn xml_to_value(xml: &str) -> Res<Value> {
    let mut reader = Reader::from_str(xml);

    let mut root = Map::new();
    let mut stack: Vec<Frame> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => stack.push(Frame::new(element_name(e.name().as_ref()))),
            Event::Empty(e) => {
                let name = element_name(e.name().as_ref());
                let parent = stack.last_mut().map_or(&mut root, |f| &mut f.children);
                insert_child(parent, name, Value::String(String::new()));
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| GatewayError::Xml("closing tag without opening tag".into()))?;
                let name = frame.name.clone();
                let value = frame.into_value();
                let parent = stack.last_mut().map_or(&mut root, |f| &mut f.children);
                insert_child(parent, name, value);
            }
            Event::Text(e) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&e.unescape()?);
                }
            }
            Event::CData(e) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(GatewayError::Xml(format!(
            "unexpected end of document, <{}> is not closed",
            open.name
        )));
    }

    Ok(Value::Object(root))
}

/// Converts an XML document into JSON text indented with four spaces.
pub fn xml_to_json(xml: &str) -> Res<String> {
    let value = xml_to_value(xml)?;
    utils::to_indented_json(&value)
}
