//! Declared settings schema.
use std::fs;
use std::path::Path;

use forms::{FieldDescriptor, FieldType, normalize_value};
use serde_json::Value;
use tracing::info;

use crate::errors::BackendError;

/// Schema used when no schema file is configured.
pub fn default_schema() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("displayName", FieldType::String)
            .display_name("Display name")
            .value(""),
        FieldDescriptor::new("theme", FieldType::Enum)
            .display_name("Theme")
            .options(["Light", "Dark", "System"])
            .value("System"),
        FieldDescriptor::new("language", FieldType::Enum)
            .display_name("Language")
            .options(["English", "Deutsch", "Français", "Español", "Italiano"])
            .value("English"),
        FieldDescriptor::new("fontSize", FieldType::Number)
            .display_name("Font size")
            .value(14),
        FieldDescriptor::new("notifications", FieldType::Boolean)
            .display_name("Notifications")
            .value(true),
        FieldDescriptor::new("birthday", FieldType::Date).display_name("Birthday"),
    ]
}

/// Read a schema from a JSON file holding a field list. The list is
/// normalized like any schema coming off the wire.
pub fn load_schema(path: &Path) -> Result<Vec<FieldDescriptor>, BackendError> {
    let data = fs::read_to_string(path)?;
    let raw: Value = serde_json::from_str(&data)?;
    let fields = normalize_value(&raw);
    info!(path = %path.display(), fields = fields.len(), "schema loaded");
    Ok(fields)
}
