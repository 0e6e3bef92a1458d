//! XML payload normalization
//!
//! The body is event-parsed into a small element tree, declared paths are
//! mapped onto fields, and subtrees under the document root that no declared
//! path touches are preserved in `extra` keyed by their tag name.

use crate::{
    Error, Result,
    normalize::{FieldOutcome, apply_kind_str, shape::{FieldSource, Shape}},
    types::NormalizedResult,
};
use quick_xml::Reader;
use quick_xml::events::Event;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// One parsed element
#[derive(Debug, Clone, Default)]
struct XmlNode {
    name: String,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<XmlNode>,
}

/// Normalize an XML body against the declared shape
pub fn normalize_xml(body: &str, shape: &Shape) -> Result<NormalizedResult> {
    let tree = parse_tree(body)?;
    let doc_root = tree.children.first();

    let mut result = NormalizedResult::new();
    let mut consumed: HashSet<String> = HashSet::new();

    for field in &shape.fields {
        let FieldSource::XmlPath(path) = &field.source else {
            continue;
        };

        if let Some(segment) = path.split('/').next()
            && !segment.starts_with('@')
        {
            consumed.insert(segment.to_string());
        }

        match doc_root.and_then(|root| resolve_path(root, path)) {
            Some(raw) => match apply_kind_str(field, &raw)? {
                FieldOutcome::Value(value) => {
                    result.fields.insert(field.name.clone(), value);
                }
                FieldOutcome::Demote(raw) => {
                    result.extra.insert(field.name.clone(), Value::String(raw));
                }
            },
            None if field.required => {
                return Err(Error::parse(
                    &field.name,
                    path,
                    "required element missing from XML payload",
                ));
            }
            None => {}
        }
    }

    if let Some(root) = doc_root {
        for child in &root.children {
            if !consumed.contains(&child.name) {
                push_extra(&mut result.extra, &child.name, node_to_value(child));
            }
        }
    }

    Ok(result)
}

/// Event-parse the body into an element tree under a synthetic root
fn parse_tree(body: &str) -> Result<XmlNode> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut stack = vec![XmlNode::default()];

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                stack.push(XmlNode {
                    name: String::from_utf8_lossy(e.name().as_ref()).to_string(),
                    attrs: read_attrs(e),
                    text: String::new(),
                    children: Vec::new(),
                });
            }
            Ok(Event::Empty(ref e)) => {
                let node = XmlNode {
                    name: String::from_utf8_lossy(e.name().as_ref()).to_string(),
                    attrs: read_attrs(e),
                    text: String::new(),
                    children: Vec::new(),
                };
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(node);
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&e.unescape().unwrap_or_default());
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(node) = stack.last_mut() {
                    node.text
                        .push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::End(_)) => {
                if stack.len() > 1
                    && let Some(node) = stack.pop()
                    && let Some(parent) = stack.last_mut()
                {
                    parent.children.push(node);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::parse(
                    "document",
                    "xml",
                    format!("parse error at position {}: {:?}", reader.buffer_position(), e),
                ));
            }
            _ => {}
        }
    }

    if stack.len() != 1 {
        return Err(Error::parse("document", "xml", "unclosed elements"));
    }
    Ok(stack.remove(0))
}

fn read_attrs(e: &quick_xml::events::BytesStart<'_>) -> Vec<(String, String)> {
    e.attributes()
        .flatten()
        .map(|attr| {
            let name = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr
                .unescape_value()
                .map(|v| v.to_string())
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).to_string());
            (name, value)
        })
        .collect()
}

/// Resolve a slash-separated path with an optional `@attr` leaf
fn resolve_path(root: &XmlNode, path: &str) -> Option<String> {
    let mut node = root;
    let segments: Vec<&str> = path.split('/').collect();

    for (index, segment) in segments.iter().enumerate() {
        if let Some(attr) = segment.strip_prefix('@') {
            // Attribute leaves terminate the walk
            if index != segments.len() - 1 {
                return None;
            }
            return node
                .attrs
                .iter()
                .find(|(name, _)| name == attr)
                .map(|(_, value)| value.clone());
        }
        node = node.children.iter().find(|child| child.name == *segment)?;
    }

    let text = node.text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Serialize an unmapped subtree for the extra map
fn node_to_value(node: &XmlNode) -> Value {
    if node.children.is_empty() && node.attrs.is_empty() {
        return Value::String(node.text.trim().to_string());
    }

    let mut map = Map::new();
    for (name, value) in &node.attrs {
        map.insert(format!("@{}", name), Value::String(value.clone()));
    }
    let text = node.text.trim();
    if !text.is_empty() {
        map.insert("#text".to_string(), Value::String(text.to_string()));
    }
    for child in &node.children {
        push_extra(&mut map, &child.name, node_to_value(child));
    }
    Value::Object(map)
}

/// Insert preserving repeated keys as arrays
fn push_extra(map: &mut Map<String, Value>, key: &str, value: Value) {
    match map.get_mut(key) {
        None => {
            map.insert(key.to_string(), value);
        }
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
    }
}
