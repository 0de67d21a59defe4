//! Data preparation: content object attributes to wire-ready field values.
//!
//! Preparation is pure. It reads the requested attributes, coerces each value
//! according to the schema field kind and returns an ordered mapping of field
//! name to rendered strings. Nothing here touches the network.

use chrono::{DateTime, FixedOffset, Utc};

use solr_client::{FieldKind, Schema};
use solr_types::{AttrValue, ContentObject};

use crate::error::MarshalError;

/// Wire format of date fields: UTC, millisecond precision, `Z` suffix.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Field name to rendered value(s), in preparation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreparedData {
    fields: Vec<(String, Vec<String>)>,
}

impl PreparedData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Add a field ahead of all others.
    pub fn prepend(&mut self, name: impl Into<String>, values: Vec<String>) {
        self.fields.insert(0, (name.into(), values));
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn push(&mut self, name: String, values: Vec<String>) {
        self.fields.push((name, values));
    }
}

/// Marshals content objects against an optional schema.
#[derive(Debug, Clone, Copy)]
pub struct DataPreparer<'a> {
    schema: Option<&'a Schema>,
    access_control_fields: &'a [String],
}

impl<'a> DataPreparer<'a> {
    /// `access_control_fields` lists the fields whose values get `:` replaced
    /// by `$`.
    pub fn new(schema: Option<&'a Schema>, access_control_fields: &'a [String]) -> Self {
        Self {
            schema,
            access_control_fields,
        }
    }

    /// Prepare `object` for an add request.
    ///
    /// Without `attributes` every schema field the object has set is used
    /// (every set attribute when there is no schema). With `attributes`,
    /// exactly those names are used, in the given order.
    pub fn prepare<O: ContentObject + ?Sized>(
        &self,
        object: &O,
        attributes: Option<&[&str]>,
    ) -> Result<PreparedData, MarshalError> {
        let names: Vec<String> = match (attributes, self.schema) {
            (Some(list), _) => {
                let mut names: Vec<String> = Vec::with_capacity(list.len());
                for name in list {
                    if !names.iter().any(|n| n == name) {
                        names.push(name.to_string());
                    }
                }
                names
            }
            (None, Some(schema)) => schema.field_names().map(str::to_string).collect(),
            (None, None) => object.attribute_names(),
        };

        let mut data = PreparedData::new();
        for name in names {
            let Some(value) = object.attribute(&name) else {
                continue;
            };
            let values = self.render(&name, &value)?;
            if !values.is_empty() {
                data.push(name, values);
            }
        }
        Ok(data)
    }

    /// Render one attribute value into its field entries.
    pub fn render(&self, field: &str, value: &AttrValue) -> Result<Vec<String>, MarshalError> {
        let kind = self
            .schema
            .map(|s| s.kind_of(field))
            .unwrap_or_default();

        let mut values = Vec::new();
        flatten(field, kind, value, &mut values)?;

        if self.is_access_control_field(field) {
            for v in &mut values {
                *v = v.replace(':', "$");
            }
        }
        Ok(values)
    }

    /// Whether `field` gets `:` replaced by `$`.
    pub fn is_access_control_field(&self, field: &str) -> bool {
        self.access_control_fields.iter().any(|f| f == field)
    }
}

fn flatten(
    field: &str,
    kind: FieldKind,
    value: &AttrValue,
    out: &mut Vec<String>,
) -> Result<(), MarshalError> {
    match value {
        AttrValue::List(items) => {
            for item in items {
                flatten(field, kind, item, out)?;
            }
        }
        scalar => out.push(render_scalar(field, kind, scalar)?),
    }
    Ok(())
}

fn render_scalar(field: &str, kind: FieldKind, value: &AttrValue) -> Result<String, MarshalError> {
    let rendered = match value {
        AttrValue::Date(dt) => format_date(dt),
        AttrValue::Text(s) if kind == FieldKind::Date => match DateTime::parse_from_rfc3339(s) {
            Ok(dt) => format_date(&dt),
            Err(_) => s.clone(),
        },
        AttrValue::Text(s) => s.clone(),
        AttrValue::Int(i) => i.to_string(),
        AttrValue::Float(f) => {
            if !f.is_finite() {
                return Err(MarshalError::new(field, format!("non-finite number {}", f)));
            }
            // Debug keeps the fractional part: 42.0 stays "42.0".
            format!("{:?}", f)
        }
        AttrValue::Bool(b) => b.to_string(),
        AttrValue::List(_) => {
            return Err(MarshalError::new(field, "nested sequence in scalar position"))
        }
    };
    Ok(rendered)
}

/// Render a timestamp in the engine's UTC millisecond format.
pub fn format_date(dt: &DateTime<FixedOffset>) -> String {
    dt.with_timezone(&Utc).format(DATE_FORMAT).to_string()
}
