//! Engine schema: field name to type and multiplicity.
//!
//! Parsed once from the engine's schema.xml and read-only afterwards.
//! Only the parts the update path needs are kept:
//! - `<fieldType name=".." class=".." multiValued="..">` for the field kind
//! - `<field name=".." type=".." multiValued=".." required="..">`
//! - `<uniqueKey>` and `<defaultSearchField>`
//!
//! `<dynamicField>` and `<copyField>` declarations are ignored.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader as XmlReader;

use crate::error::SchemaError;

/// Value kind of a schema field, as far as marshalling is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldKind {
    #[default]
    String,
    Number,
    Boolean,
    Date,
    Text,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Date => "date",
            FieldKind::Text => "text",
        }
    }

    /// Map a field type class (e.g. `solr.TrieDateField`) to its kind.
    pub fn from_class(class: &str) -> Self {
        let short = class.rsplit('.').next().unwrap_or(class).to_ascii_lowercase();
        let bare = short
            .strip_prefix("trie")
            .or_else(|| short.strip_prefix("sortable"))
            .unwrap_or(&short);

        if bare.contains("date") {
            FieldKind::Date
        } else if bare.starts_with("bool") {
            FieldKind::Boolean
        } else if bare.contains("text") {
            FieldKind::Text
        } else if ["int", "long", "float", "double", "currency"]
            .iter()
            .any(|n| bare.starts_with(n))
        {
            FieldKind::Number
        } else {
            FieldKind::String
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata for one declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: String,
    pub kind: FieldKind,
    pub multi_valued: bool,
    pub required: bool,
    /// Name of the declared field type
    pub type_name: String,
}

impl FieldInfo {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            multi_valued: false,
            required: false,
            type_name: kind.as_str().to_string(),
        }
    }

    pub fn multi_valued(mut self) -> Self {
        self.multi_valued = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Immutable field mapping in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<FieldInfo>,
    index: HashMap<String, usize>,
    unique_key: Option<String>,
    default_search_field: Option<String>,
}

impl Schema {
    /// Build a schema directly from field declarations.
    pub fn from_fields(fields: impl IntoIterator<Item = FieldInfo>) -> Self {
        let mut schema = Schema::default();
        for field in fields {
            schema.push(field);
        }
        schema
    }

    pub fn with_unique_key(mut self, key: impl Into<String>) -> Self {
        self.unique_key = Some(key.into());
        self
    }

    fn push(&mut self, field: FieldInfo) {
        match self.index.get(&field.name) {
            // Later declarations win, as in the engine.
            Some(&pos) => self.fields[pos] = field,
            None => {
                self.index.insert(field.name.clone(), self.fields.len());
                self.fields.push(field);
            }
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.index.get(name).map(|&pos| &self.fields[pos])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Kind of the named field; undeclared fields are plain strings.
    pub fn kind_of(&self, name: &str) -> FieldKind {
        self.field(name).map(|f| f.kind).unwrap_or_default()
    }

    /// Multiplicity of the named field; undeclared fields are single-valued.
    pub fn is_multi_valued(&self, name: &str) -> bool {
        self.field(name).map(|f| f.multi_valued).unwrap_or(false)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldInfo> {
        self.fields.iter()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn unique_key(&self) -> Option<&str> {
        self.unique_key.as_deref()
    }

    pub fn default_search_field(&self) -> Option<&str> {
        self.default_search_field.as_deref()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parse a schema.xml document.
    pub fn parse(xml: &str) -> Result<Self, SchemaError> {
        let mut reader = XmlReader::from_str(xml);
        reader.trim_text(true);
        let mut buf = Vec::new();

        let mut seen_root = false;
        let mut types: HashMap<String, (FieldKind, bool)> = HashMap::new();
        let mut raw_fields: Vec<RawField> = Vec::new();
        let mut text_target: Option<TextTarget> = None;
        let mut unique_key = None;
        let mut default_search_field = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                    b"schema" => seen_root = true,
                    b"fieldType" | b"fieldtype" => {
                        let attrs = read_attributes(e)?;
                        if let Some(name) = attrs.get("name") {
                            let kind = attrs
                                .get("class")
                                .map(|c| FieldKind::from_class(c))
                                .unwrap_or_default();
                            let multi = attrs.get("multiValued").map(|v| is_true(v)).unwrap_or(false);
                            types.insert(name.clone(), (kind, multi));
                        }
                    }
                    b"field" => {
                        let mut attrs = read_attributes(e)?;
                        let name = attrs.remove("name").ok_or_else(|| {
                            SchemaError::Malformed(format!(
                                "<field> without name at byte {}",
                                reader.buffer_position()
                            ))
                        })?;
                        raw_fields.push(RawField {
                            name,
                            type_name: attrs.remove("type").unwrap_or_default(),
                            multi_valued: attrs.remove("multiValued").map(|v| is_true(&v)),
                            required: attrs.remove("required").map(|v| is_true(&v)).unwrap_or(false),
                        });
                    }
                    b"uniqueKey" => text_target = Some(TextTarget::UniqueKey),
                    b"defaultSearchField" => text_target = Some(TextTarget::DefaultSearchField),
                    _ => {}
                },
                Ok(Event::Text(t)) => {
                    if let Some(target) = text_target {
                        let value = t
                            .unescape()
                            .map_err(|e| SchemaError::Malformed(e.to_string()))?
                            .trim()
                            .to_string();
                        match target {
                            TextTarget::UniqueKey => unique_key = Some(value),
                            TextTarget::DefaultSearchField => default_search_field = Some(value),
                        }
                    }
                }
                Ok(Event::End(_)) => text_target = None,
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(SchemaError::Malformed(format!(
                        "XML error at byte {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {}
            }
            buf.clear();
        }

        if !seen_root {
            return Err(SchemaError::Malformed("missing <schema> root element".to_string()));
        }
        if raw_fields.is_empty() {
            return Err(SchemaError::Malformed("schema declares no fields".to_string()));
        }

        let mut schema = Schema::default();
        for raw in raw_fields {
            // Fields referencing an unknown type fall back to string.
            let (kind, type_multi) = types.get(&raw.type_name).copied().unwrap_or_default();
            schema.push(FieldInfo {
                name: raw.name,
                kind,
                multi_valued: raw.multi_valued.unwrap_or(type_multi),
                required: raw.required,
                type_name: raw.type_name,
            });
        }
        schema.unique_key = unique_key.filter(|k| !k.is_empty());
        schema.default_search_field = default_search_field.filter(|k| !k.is_empty());
        Ok(schema)
    }
}

#[derive(Debug, Clone, Copy)]
enum TextTarget {
    UniqueKey,
    DefaultSearchField,
}

struct RawField {
    name: String,
    type_name: String,
    multi_valued: Option<bool>,
    required: bool,
}

fn read_attributes(e: &BytesStart<'_>) -> Result<HashMap<String, String>, SchemaError> {
    let mut attrs = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| SchemaError::Malformed(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| SchemaError::Malformed(err.to_string()))?
            .into_owned();
        attrs.insert(key, value);
    }
    Ok(attrs)
}

fn is_true(value: &str) -> bool {
    matches!(value.trim(), "true" | "on" | "yes" | "1")
}
