//! Field schema: the declarative description of one editable value plus the
//! normalizer that turns wire data into it.
//!
//! Normalization never fails. A malformed schema degrades to whatever can be
//! rendered:
//! - entries without a usable `name` are dropped
//! - `displayName` falls back to `name`
//! - `options` falls back to an empty list
//! - unknown `typeId` codes become free-form text fields
//! - later duplicates of a name are dropped (first one wins)
//!
//! ```ignore
//! use forms::schema::{FieldDescriptor, FieldType};
//!
//! let theme = FieldDescriptor::new("theme", FieldType::Enum)
//!     .display_name("Theme")
//!     .options(["Light", "Dark", "System"])
//!     .value("Dark");
//! ```
use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};
use tracing::{debug, warn};

/// Kind of value a field holds. Drives widget dispatch in [`crate::control`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum FieldType {
    #[strum(to_string = "String", serialize = "text")]
    String,
    #[strum(
        to_string = "Number",
        serialize = "numeric",
        serialize = "int",
        serialize = "integer",
        serialize = "float"
    )]
    Number,
    #[strum(to_string = "Boolean", serialize = "bool", serialize = "checkbox")]
    Boolean,
    #[strum(to_string = "Date")]
    Date,
    #[strum(to_string = "Enum", serialize = "select", serialize = "choice")]
    Enum,
}

impl FieldType {
    /// Resolve a wire `typeId`. Anything unrecognised (including non-string
    /// codes) maps to the free-form [`FieldType::String`].
    pub fn from_type_id(type_id: Option<&Value>) -> Self {
        match type_id {
            Some(Value::String(code)) => code.trim().parse().unwrap_or_else(|_| {
                debug!(type_id = %code, "unknown field type, using free-form text");
                FieldType::String
            }),
            Some(Value::Null) | None => FieldType::String,
            Some(other) => {
                debug!(type_id = %other, "non-string field type, using free-form text");
                FieldType::String
            }
        }
    }
}

/// A normalized field. Produced by [`normalize`]; everything downstream may
/// rely on `name` being non-empty and unique within its schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: String,
    pub display_name: String,
    #[serde(rename = "typeId")]
    pub field_type: FieldType,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub options: Vec<String>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            field_type,
            value: Value::Null,
            options: Vec::new(),
        }
    }

    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = value.into();
        self
    }

    pub fn options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Text form of the current value, as used to seed text controls.
    pub fn value_text(&self) -> String {
        value_text(&self.value)
    }
}

const DISPLAY_NAME_KEYS: &[&str] = &["displayName", "display_name"];
const TYPE_ID_KEYS: &[&str] = &["typeId", "type_id", "type"];

/// Wire shape of a field as delivered by `getSettings`. Every member is
/// optional; [`normalize`] decides what survives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawField {
    pub name: Option<Value>,
    pub display_name: Option<Value>,
    pub type_id: Option<Value>,
    pub value: Value,
    pub options: Option<Value>,
}

impl RawField {
    /// Read one wire entry. Keys may come in several spellings; when more
    /// than one is present the first in priority order wins.
    pub fn from_map(entry: &Map<String, Value>) -> Self {
        let pick = |keys: &[&str]| keys.iter().find_map(|k| entry.get(*k)).cloned();
        Self {
            name: pick(&["name"]),
            display_name: pick(DISPLAY_NAME_KEYS),
            type_id: pick(TYPE_ID_KEYS),
            value: pick(&["value"]).unwrap_or(Value::Null),
            options: pick(&["options"]),
        }
    }
}

impl<'de> Deserialize<'de> for RawField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entry = Map::deserialize(deserializer)?;
        Ok(Self::from_map(&entry))
    }
}

/// Normalize a decoded field list.
pub fn normalize(raw: Vec<RawField>) -> Vec<FieldDescriptor> {
    let mut seen = HashSet::new();
    let mut fields = Vec::with_capacity(raw.len());

    for entry in raw {
        let name = match entry.name.as_ref().and_then(Value::as_str).map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => continue,
        };
        if !seen.insert(name.clone()) {
            warn!(field = %name, "duplicate field name in schema, keeping the first");
            continue;
        }

        let display_name = match entry.display_name.as_ref().and_then(Value::as_str) {
            Some(label) if !label.trim().is_empty() => label.to_string(),
            _ => name.clone(),
        };

        let options = match entry.options {
            Some(Value::Array(items)) => items
                .iter()
                .filter(|item| !item.is_null())
                .map(value_text)
                .collect(),
            _ => Vec::new(),
        };

        fields.push(FieldDescriptor {
            field_type: FieldType::from_type_id(entry.type_id.as_ref()),
            name,
            display_name,
            value: entry.value,
            options,
        });
    }

    fields
}

/// Normalize a raw JSON payload. Anything that is not an array yields an
/// empty schema; array entries that are not objects are skipped.
pub fn normalize_value(payload: &Value) -> Vec<FieldDescriptor> {
    let Some(items) = payload.as_array() else {
        if !payload.is_null() {
            warn!("schema payload is not a list, rendering an empty form");
        }
        return Vec::new();
    };

    let raw = items
        .iter()
        .filter_map(|item| match item.as_object() {
            Some(entry) => Some(RawField::from_map(entry)),
            None => {
                debug!(entry = %item, "skipping undecodable schema entry");
                None
            }
        })
        .collect();

    normalize(raw)
}

/// Text form of a JSON value: strings verbatim, `null` as empty, everything
/// else in its JSON spelling.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn drops_empty_names_and_defaults_display_name() {
        let fields = normalize_value(&json!([
            { "name": "", "typeId": "String" },
            { "name": "   ", "typeId": "String" },
            { "typeId": "Number" },
            { "name": "nick", "typeId": "String", "value": "bob" },
        ]));

        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "nick");
        assert_eq!(fields[0].display_name, "nick");
        assert_eq!(fields[0].options, Vec::<String>::new());
    }

    #[test]
    fn type_ids_are_case_insensitive_with_aliases() {
        let ty = |code: &str| FieldType::from_type_id(Some(&json!(code)));
        assert_eq!(ty("number"), FieldType::Number);
        assert_eq!(ty("INTEGER"), FieldType::Number);
        assert_eq!(ty("bool"), FieldType::Boolean);
        assert_eq!(ty("Date"), FieldType::Date);
        assert_eq!(ty("select"), FieldType::Enum);
        assert_eq!(ty("text"), FieldType::String);
    }

    #[test]
    fn unknown_type_falls_back_to_string() {
        assert_eq!(
            FieldType::from_type_id(Some(&json!("colour-picker"))),
            FieldType::String
        );
        assert_eq!(FieldType::from_type_id(Some(&json!(7))), FieldType::String);
        assert_eq!(FieldType::from_type_id(None), FieldType::String);
    }

    #[test]
    fn duplicate_names_keep_first() {
        let fields = normalize_value(&json!([
            { "name": "a", "typeId": "String", "value": "first" },
            { "name": "a", "typeId": "Number", "value": 2 },
        ]));
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].value, json!("first"));
        assert_eq!(fields[0].field_type, FieldType::String);
    }

    #[test]
    fn options_are_stringified_and_nulls_dropped() {
        let fields = normalize_value(&json!([
            { "name": "size", "typeId": "Enum", "options": [1, "two", null, true] },
            { "name": "broken", "typeId": "Enum", "options": "not-a-list" },
        ]));
        assert_eq!(fields[0].options, vec!["1", "two", "true"]);
        assert!(fields[1].options.is_empty());
    }

    #[test]
    fn repeated_key_spellings_keep_the_entry() {
        let fields = normalize_value(&json!([
            { "name": "volume", "type": "String", "typeId": "Number", "value": 3 },
            { "name": "nick", "displayName": "Nick", "display_name": "Nickname" },
            { "name": "size", "type_id": "Enum", "type": "Boolean", "options": ["S", "M"] },
        ]));
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].field_type, FieldType::Number);
        assert_eq!(fields[0].value, json!(3));
        assert_eq!(fields[1].display_name, "Nick");
        assert_eq!(fields[2].field_type, FieldType::Enum);
    }

    #[test]
    fn raw_field_deserializes_through_the_same_rules() {
        let raw: RawField =
            serde_json::from_value(json!({ "name": "a", "type": "Date", "typeId": "Boolean" }))
                .unwrap();
        assert_eq!(raw.type_id, Some(json!("Boolean")));
        assert_eq!(raw.value, Value::Null);
    }

    #[test]
    fn non_list_payloads_are_empty() {
        assert!(normalize_value(&json!({ "name": "x" })).is_empty());
        assert!(normalize_value(&Value::Null).is_empty());
        let fields = normalize_value(&json!(["junk", 4, { "name": "ok" }]));
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field_type, FieldType::String);
    }

    #[test]
    fn builder_matches_normalized_shape() {
        let built = FieldDescriptor::new("theme", FieldType::Enum)
            .display_name("Theme")
            .options(["Light", "Dark"])
            .value("Dark");
        let normalized = normalize_value(&json!([{
            "name": "theme",
            "displayName": "Theme",
            "typeId": "Enum",
            "options": ["Light", "Dark"],
            "value": "Dark",
        }]));
        assert_eq!(normalized, vec![built]);
    }
}
