//! Content objects and their attribute values.
//!
//! The indexing pipeline never assumes a fixed object shape. Anything that can
//! answer "do you have attribute X" and "what is attribute X" can be indexed,
//! so repository types implement [`ContentObject`] directly and ad-hoc data
//! can use the insertion-ordered [`Document`].

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, FixedOffset, TimeZone};

use crate::error::SyncError;

/// A single attribute value read from a content object.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Timestamp in any offset; rendered as UTC on the wire
    Date(DateTime<FixedOffset>),
    /// Sequence value, rendered as one field entry per element
    List(Vec<AttrValue>),
}

impl AttrValue {
    pub fn is_list(&self) -> bool {
        matches!(self, AttrValue::List(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert a JSON value, returning `Ok(None)` for `null`.
    ///
    /// Nested objects have no field representation and are rejected.
    pub fn from_json(value: &serde_json::Value) -> Result<Option<Self>, SyncError> {
        use serde_json::Value;

        let converted = match value {
            Value::Null => return Ok(None),
            Value::Bool(b) => AttrValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => AttrValue::Int(i),
                None => AttrValue::Float(n.as_f64().ok_or_else(|| {
                    SyncError::InvalidInput(format!("number out of range: {}", n))
                })?),
            },
            Value::String(s) => AttrValue::Text(s.clone()),
            Value::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(v) = Self::from_json(item)? {
                        values.push(v);
                    }
                }
                AttrValue::List(values)
            }
            Value::Object(_) => {
                return Err(SyncError::InvalidInput(
                    "nested objects cannot be indexed as field values".to_string(),
                ))
            }
        };
        Ok(Some(converted))
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Text(s)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        AttrValue::Int(i)
    }
}

impl From<i32> for AttrValue {
    fn from(i: i32) -> Self {
        AttrValue::Int(i64::from(i))
    }
}

impl From<f64> for AttrValue {
    fn from(f: f64) -> Self {
        AttrValue::Float(f)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for AttrValue {
    fn from(dt: DateTime<Tz>) -> Self {
        AttrValue::Date(dt.fixed_offset())
    }
}

impl<T: Into<AttrValue>> From<Vec<T>> for AttrValue {
    fn from(items: Vec<T>) -> Self {
        AttrValue::List(items.into_iter().map(Into::into).collect())
    }
}

/// Capability interface for anything that can be indexed.
pub trait ContentObject {
    /// Value of the named attribute, or `None` when it is not set.
    fn attribute(&self, name: &str) -> Option<AttrValue>;

    /// Names of every attribute currently set, in a stable order.
    fn attribute_names(&self) -> Vec<String>;

    fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }
}

/// Insertion-ordered attribute bag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    attributes: Vec<(String, AttrValue)>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Set an attribute, replacing any previous value in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<AttrValue> {
        let pos = self.attributes.iter().position(|(n, _)| n == name)?;
        Some(self.attributes.remove(pos).1)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Build a document from a JSON object; `null` members are skipped.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, SyncError> {
        let object = value
            .as_object()
            .ok_or_else(|| SyncError::InvalidInput("document must be a JSON object".to_string()))?;

        let mut doc = Document::new();
        for (name, raw) in object {
            if let Some(v) = AttrValue::from_json(raw)? {
                doc.set(name.clone(), v);
            }
        }
        Ok(doc)
    }
}

impl ContentObject for Document {
    fn attribute(&self, name: &str) -> Option<AttrValue> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    fn attribute_names(&self) -> Vec<String> {
        self.attributes.iter().map(|(n, _)| n.clone()).collect()
    }
}

impl ContentObject for BTreeMap<String, AttrValue> {
    fn attribute(&self, name: &str) -> Option<AttrValue> {
        self.get(name).cloned()
    }

    fn attribute_names(&self) -> Vec<String> {
        self.keys().cloned().collect()
    }
}

impl ContentObject for HashMap<String, AttrValue> {
    fn attribute(&self, name: &str) -> Option<AttrValue> {
        self.get(name).cloned()
    }

    // HashMap iteration order is random; sort for stable request bytes.
    fn attribute_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.keys().cloned().collect();
        names.sort();
        names
    }
}

impl<T: ContentObject + ?Sized> ContentObject for &T {
    fn attribute(&self, name: &str) -> Option<AttrValue> {
        (**self).attribute(name)
    }

    fn attribute_names(&self) -> Vec<String> {
        (**self).attribute_names()
    }
}
