//! # Normalized metadata schema
//!
//! Every vendor extractor reduces its native tree to the same vocabulary of
//! [`NormalizedField`]s. A field holds either one value or one value per
//! channel (in document channel order), and each value is either present or
//! [`Field::Missing`]. Missing values become the `"N/A"` sentinel only when
//! rendered or serialized, so internal code can pattern-match instead of
//! comparing strings.
//!
//! The Schema Assembler ([`assemble`]) turns an extractor's unordered
//! [`FieldSet`] into a [`MetadataOutput`] whose keys and order are fixed per
//! vendor by the lists in [`fields`].

pub mod fields;

#[cfg(test)]
mod tests;

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use log::debug;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::formats::FileFormat;
use crate::units::{format_float, NOT_AVAILABLE};

/// A present scalar value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// Integer (pixel counts, dimension sizes)
    Int(i64),
    /// Floating point value in the unit implied by the field name
    Float(f64),
    /// Free text
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(v) => f.write_str(&format_float(*v)),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

/// One value of a field: present, or missing.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// Absent, unparsable or placeholder source value
    Missing,
    /// A real value
    Present(Scalar),
}

impl Field {
    /// A present float.
    pub fn float(value: f64) -> Self {
        Field::Present(Scalar::Float(value))
    }

    /// A present integer.
    pub fn int(value: i64) -> Self {
        Field::Present(Scalar::Int(value))
    }

    /// A text value; empty or whitespace-only text is missing.
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            Field::Missing
        } else {
            Field::Present(Scalar::Text(value))
        }
    }

    /// Text value from an optional string.
    pub fn from_text(value: Option<impl Into<String>>) -> Self {
        value.map(Field::text).unwrap_or(Field::Missing)
    }

    /// True for [`Field::Missing`].
    pub fn is_missing(&self) -> bool {
        matches!(self, Field::Missing)
    }

    /// Numeric value; text is parsed when it looks like a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Field::Present(Scalar::Int(i)) => Some(*i as f64),
            Field::Present(Scalar::Float(v)) => v.is_finite().then_some(*v),
            Field::Present(Scalar::Text(s)) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            Field::Missing => None,
        }
    }

    /// Text of a present value (numbers rendered).
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Field::Present(Scalar::Text(s)) => Some(Cow::Borrowed(s.as_str())),
            Field::Present(other) => Some(Cow::Owned(other.to_string())),
            Field::Missing => None,
        }
    }

    /// Keep the first present value of `self` and `fallback`.
    pub fn or_else(self, fallback: impl FnOnce() -> Field) -> Field {
        match self {
            Field::Missing => fallback(),
            present => present,
        }
    }

    /// Infer a field from its rendered text: the sentinel is missing, and a
    /// number is read only when it renders back to the same text ("007" and
    /// "2.30" stay text). Anything else is text.
    pub fn from_rendered(text: &str) -> Self {
        let text = text.trim();
        if text == NOT_AVAILABLE || text.is_empty() {
            return Field::Missing;
        }
        let number = match text.parse::<i64>() {
            Ok(i) => Some(Field::int(i)),
            Err(_) => text.parse::<f64>().ok().filter(|v| v.is_finite()).map(Field::float),
        };
        match number {
            Some(field) if field.to_string() == text => field,
            _ => Field::text(text),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Missing => f.write_str(NOT_AVAILABLE),
            Field::Present(scalar) => scalar.fmt(f),
        }
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Field::Missing => serializer.serialize_str(NOT_AVAILABLE),
            Field::Present(Scalar::Int(i)) => serializer.serialize_i64(*i),
            Field::Present(Scalar::Float(v)) if v.is_finite() => serializer.serialize_f64(*v),
            Field::Present(Scalar::Float(_)) => serializer.serialize_str(NOT_AVAILABLE),
            Field::Present(Scalar::Text(s)) => serializer.serialize_str(s),
        }
    }
}

/// The value of a [`NormalizedField`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// One value for the whole document
    Single(Field),
    /// One value per channel, in document channel order
    PerChannel(Vec<Field>),
}

impl FieldValue {
    /// A single missing value.
    pub fn missing() -> Self {
        FieldValue::Single(Field::Missing)
    }

    /// The single value, if this is not a per-channel list.
    pub fn as_single(&self) -> Option<&Field> {
        match self {
            FieldValue::Single(field) => Some(field),
            FieldValue::PerChannel(_) => None,
        }
    }

    /// The per-channel values, if this is a list.
    pub fn as_list(&self) -> Option<&[Field]> {
        match self {
            FieldValue::PerChannel(items) => Some(items),
            FieldValue::Single(_) => None,
        }
    }

    /// True for a single missing value.
    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Single(Field::Missing))
    }
}

impl From<Field> for FieldValue {
    fn from(field: Field) -> Self {
        FieldValue::Single(field)
    }
}

impl From<Vec<Field>> for FieldValue {
    fn from(items: Vec<Field>) -> Self {
        FieldValue::PerChannel(items)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Single(field) => field.fmt(f),
            FieldValue::PerChannel(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.fmt(f)?;
                }
                Ok(())
            }
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Single(field) => field.serialize(serializer),
            FieldValue::PerChannel(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

/// A named entry of the output schema.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedField {
    /// Stable, vendor-independent field name; the unit is part of the name
    pub name: String,
    /// The value
    pub value: FieldValue,
}

/// Ordered field-name to value mapping handed to callers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataOutput {
    fields: Vec<NormalizedField>,
}

impl MetadataOutput {
    /// Create an empty output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field, replacing an existing field of the same name in place.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(existing) => existing.value = value,
            None => self.fields.push(NormalizedField { name, value }),
        }
    }

    /// Look up a field value by name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    /// Look up a single-valued field. Unknown names and per-channel fields
    /// yield `None`.
    pub fn single(&self, name: &str) -> Option<&Field> {
        self.get(name).and_then(FieldValue::as_single)
    }

    /// Look up a per-channel field.
    pub fn list(&self, name: &str) -> Option<&[Field]> {
        self.get(name).and_then(FieldValue::as_list)
    }

    /// Iterate fields in order.
    pub fn iter(&self) -> impl Iterator<Item = &NormalizedField> {
        self.fields.iter()
    }

    /// Field names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the output has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for MetadataOutput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for field in &self.fields {
            map.serialize_entry(&field.name, &field.value)?;
        }
        map.end()
    }
}

/// Unordered field values produced by an extractor, before assembly.
#[derive(Debug, Default)]
pub struct FieldSet {
    values: HashMap<&'static str, FieldValue>,
}

impl FieldSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field value.
    pub fn set(&mut self, name: &'static str, value: impl Into<FieldValue>) {
        self.values.insert(name, value.into());
    }

    /// Read back a value already set.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// True when `name` holds anything but a single missing value.
    pub fn is_set(&self, name: &str) -> bool {
        self.values.get(name).is_some_and(|value| !value.is_missing())
    }

    /// Move every value of `other` into this set, replacing existing ones.
    pub fn merge(&mut self, other: FieldSet) {
        self.values.extend(other.values);
    }
}

/// Order an extractor's fields by the vendor's declared field list.
///
/// Declared fields the extractor did not set are missing. Values set under
/// undeclared names are dropped.
pub fn assemble(format: FileFormat, mut set: FieldSet) -> MetadataOutput {
    let mut output = MetadataOutput::new();
    for &name in fields::field_order(format) {
        let value = set.values.remove(name).unwrap_or_else(FieldValue::missing);
        output.push(name, value);
    }
    for name in set.values.keys() {
        debug!("Dropping undeclared {} field {:?}", format, name);
    }
    output
}
