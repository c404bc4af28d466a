//! # Raw vendor metadata trees
//!
//! Every vendor container is parsed into a [`RawNode`]: an untyped tree of
//! ordered maps, sequences and scalars. CZI and LIF embed XML, which is
//! converted by [`xml::parse_xml`]; ND2 embeds a binary descriptor decoded by
//! [`crate::formats::nd2`] into the same shape.
//!
//! Any path through a vendor tree may legitimately stop early. The
//! [`navigate`] helpers therefore return `Option` rather than erroring, and
//! extractors turn absence into [`crate::schema::Field::Missing`].

pub mod navigate;
pub mod xml;


use std::borrow::Cow;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::units::format_float;

pub use navigate::{as_list, attr, descendants, find_attr, path_get, text_at};
pub use xml::parse_xml;

/// One node of a vendor metadata tree.
#[derive(Debug, Clone, PartialEq)]
pub enum RawNode {
    /// Explicitly empty node (empty XML element, void ND2 value)
    Absent,
    /// Boolean scalar
    Bool(bool),
    /// Integer scalar
    Int(i64),
    /// Floating point scalar
    Float(f64),
    /// Text scalar
    Text(String),
    /// Ordered sequence
    Seq(Vec<RawNode>),
    /// Ordered key/value map
    Map(RawMap),
}

impl RawNode {
    /// Create a text node.
    pub fn text(value: impl Into<String>) -> Self {
        RawNode::Text(value.into())
    }

    /// True for [`RawNode::Absent`].
    pub fn is_absent(&self) -> bool {
        matches!(self, RawNode::Absent)
    }

    /// Borrow the map if this node is one.
    pub fn as_map(&self) -> Option<&RawMap> {
        match self {
            RawNode::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a direct child of a map node.
    pub fn get(&self, key: &str) -> Option<&RawNode> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Walk a key path from this node. See [`navigate::path_get`].
    pub fn path(&self, keys: &[&str]) -> Option<&RawNode> {
        path_get(self, keys)
    }

    /// Scalar value rendered as text.
    ///
    /// Maps carrying a `#text` entry (XML elements with attributes) yield that
    /// text. Sequences, plain maps and `Absent` yield `None`.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            RawNode::Text(s) => Some(Cow::Borrowed(s.as_str())),
            RawNode::Int(i) => Some(Cow::Owned(i.to_string())),
            RawNode::Float(f) => Some(Cow::Owned(format_float(*f))),
            RawNode::Bool(b) => Some(Cow::Owned(b.to_string())),
            RawNode::Map(map) => map.get("#text").and_then(RawNode::as_text),
            RawNode::Absent | RawNode::Seq(_) => None,
        }
    }

    /// Numeric value of a scalar node, parsing text when needed.
    ///
    /// Non-finite values are treated as unparsable.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            RawNode::Int(i) => *i as f64,
            RawNode::Float(f) => *f,
            RawNode::Text(s) => s.trim().parse::<f64>().ok()?,
            RawNode::Map(map) => return map.get("#text").and_then(RawNode::as_f64),
            _ => return None,
        };
        value.is_finite().then_some(value)
    }
}

impl From<RawMap> for RawNode {
    fn from(map: RawMap) -> Self {
        RawNode::Map(map)
    }
}

/// An insertion-ordered map of vendor keys to nodes.
///
/// Vendor trees are small and order matters for document-order searches,
/// so this is a plain vector of entries with linear lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMap {
    entries: Vec<(String, RawNode)>,
}

impl RawMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a key.
    pub fn get(&self, key: &str) -> Option<&RawNode> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// True when the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Insert a value, replacing any previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: RawNode) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Insert a value; a repeated key collects its values into a sequence.
    ///
    /// This is how repeated XML child elements and repeated descriptor
    /// entries become lists.
    pub fn append(&mut self, key: impl Into<String>, value: RawNode) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, RawNode::Seq(items))) => items.push(value),
            Some((_, existing)) => {
                let first = std::mem::replace(existing, RawNode::Absent);
                *existing = RawNode::Seq(vec![first, value]);
            }
            None => self.entries.push((key, value)),
        }
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawNode)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, RawNode)> for RawMap {
    fn from_iter<I: IntoIterator<Item = (K, RawNode)>>(iter: I) -> Self {
        let mut map = RawMap::new();
        for (key, value) in iter {
            map.append(key, value);
        }
        map
    }
}

impl Serialize for RawNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RawNode::Absent => serializer.serialize_none(),
            RawNode::Bool(b) => serializer.serialize_bool(*b),
            RawNode::Int(i) => serializer.serialize_i64(*i),
            RawNode::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            RawNode::Float(_) => serializer.serialize_none(),
            RawNode::Text(s) => serializer.serialize_str(s),
            RawNode::Seq(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            RawNode::Map(map) => map.serialize(serializer),
        }
    }
}

impl Serialize for RawMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            out.serialize_entry(key, value)?;
        }
        out.end()
    }
}
