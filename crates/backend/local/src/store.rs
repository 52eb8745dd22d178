//! Stored setting values, layered over the declared schema defaults.
use std::fs;
use std::path::{Path, PathBuf};

use forms::{FieldDescriptor, FieldType};
use serde_json::{Map, Value};
use tracing::{debug, error, info};

use crate::errors::BackendError;

#[derive(Debug)]
pub struct SettingsStore {
    schema: Vec<FieldDescriptor>,
    values: Map<String, Value>,
    path: Option<PathBuf>,
}

impl SettingsStore {
    pub fn in_memory(schema: Vec<FieldDescriptor>) -> Self {
        Self {
            schema,
            values: Map::new(),
            path: None,
        }
    }

    /// Open the store backed by `path`. A missing file means nothing has
    /// been saved yet; stored keys the schema no longer declares are ignored.
    pub fn open(schema: Vec<FieldDescriptor>, path: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let path = path.into();
        let mut values = if path.exists() {
            let data = fs::read_to_string(&path)?;
            match serde_json::from_str::<Value>(&data)? {
                Value::Object(map) => map,
                _ => return Err(BackendError::invalid("settings file must hold an object")),
            }
        } else {
            Map::new()
        };
        values.retain(|k, _| schema.iter().any(|f| f.name == *k));
        debug!(path = %path.display(), stored = values.len(), "settings store opened");
        Ok(Self {
            schema,
            values,
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Declared fields with their current values.
    pub fn fields(&self) -> Vec<FieldDescriptor> {
        self.schema
            .iter()
            .map(|f| {
                let mut field = f.clone();
                if let Some(v) = self.values.get(&f.name) {
                    field.value = v.clone();
                }
                field
            })
            .collect()
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Validate and store `params`. Nothing is written unless every entry
    /// passes.
    pub fn save(&mut self, params: &Value) -> Result<usize, BackendError> {
        let Value::Object(incoming) = params else {
            return Err(BackendError::invalid("saveSettings expects an object"));
        };
        for (name, value) in incoming {
            let field = self
                .schema
                .iter()
                .find(|f| f.name == *name)
                .ok_or_else(|| BackendError::invalid(format!("Unknown setting '{name}'")))?;
            check_value(field, value)?;
        }

        let previous = self.values.clone();
        for (name, value) in incoming {
            self.values.insert(name.clone(), value.clone());
        }
        if let Err(e) = self.persist() {
            error!(error = %e, "persisting settings failed");
            self.values = previous;
            return Err(e);
        }
        info!(saved = incoming.len(), "settings stored");
        Ok(incoming.len())
    }

    fn persist(&self) -> Result<(), BackendError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(&self.values)?)?;
        Ok(())
    }
}

/// Type check a value against its field. `null` is accepted everywhere: it
/// is what the form sends for unparseable numbers and empty selections.
fn check_value(field: &FieldDescriptor, value: &Value) -> Result<(), BackendError> {
    let ok = match (field.field_type, value) {
        (_, Value::Null) => true,
        (FieldType::Number, v) => v.is_number(),
        (FieldType::Boolean, v) => v.is_boolean(),
        (FieldType::Enum, Value::String(s)) if !field.options.is_empty() => {
            field.options.iter().any(|o| o == s)
        }
        (FieldType::String | FieldType::Date | FieldType::Enum, v) => v.is_string(),
    };
    if ok {
        Ok(())
    } else {
        Err(BackendError::invalid(format!(
            "Invalid value for '{}': {value}",
            field.display_name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn store() -> SettingsStore {
        SettingsStore::in_memory(vec![
            FieldDescriptor::new("theme", FieldType::Enum)
                .options(["Light", "Dark"])
                .value("Light"),
            FieldDescriptor::new("size", FieldType::Number).value(12),
        ])
    }

    #[test]
    fn saved_values_override_defaults() {
        let mut s = store();
        s.save(&json!({ "theme": "Dark" })).unwrap();
        let fields = s.fields();
        assert_eq!(fields[0].value, json!("Dark"));
        assert_eq!(fields[1].value, json!(12));
    }

    #[test]
    fn rejects_unknown_names_and_bad_types_atomically() {
        let mut s = store();
        assert!(s.save(&json!({ "theme": "Dark", "colour": "red" })).is_err());
        assert!(s.save(&json!({ "size": "big" })).is_err());
        assert!(s.save(&json!({ "theme": "Sepia" })).is_err());
        assert!(s.save(&json!(["theme"])).is_err());
        assert_eq!(s.value("theme"), None);
    }

    #[test]
    fn null_is_always_accepted() {
        let mut s = store();
        assert_eq!(s.save(&json!({ "theme": null, "size": null })).unwrap(), 2);
        assert_eq!(s.value("size"), Some(&Value::Null));
    }
}
