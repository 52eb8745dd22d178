//! Value codec: reads typed values back out of live controls.
//!
//! Extraction never fails and never touches the controls, so it is safe to
//! run for Apply and again for OK. Bad input degrades to `null`.
use std::collections::HashMap;

use serde_json::{Map, Number, Value};

use crate::control::{ControlBinding, ControlState};
use crate::schema::{FieldDescriptor, FieldType};

/// Build the `fieldName → value` map for a save call. Fields without a
/// binding are omitted.
pub fn extract_values(
    bindings: &[ControlBinding],
    fields: &[FieldDescriptor],
) -> Map<String, Value> {
    let by_name: HashMap<&str, &ControlBinding> =
        bindings.iter().map(|b| (b.field_name(), b)).collect();

    let mut out = Map::new();
    for field in fields {
        let Some(binding) = by_name.get(field.name.as_str()) else {
            continue;
        };
        out.insert(field.name.clone(), extract_one(field.field_type, binding.state()));
    }
    out
}

fn extract_one(field_type: FieldType, state: &ControlState) -> Value {
    match state {
        ControlState::Text { value, .. } if field_type == FieldType::Number => parse_number(value),
        ControlState::Text { value, .. } => Value::String(value.clone()),
        ControlState::Check { checked } => Value::Bool(*checked),
        ControlState::Choice { options, selected } => selected
            .and_then(|i| options.get(i))
            .map(|o| Value::String(o.clone()))
            .unwrap_or(Value::Null),
    }
}

/// Parse numeric text. Integral values that fit `i64` stay integers so `30`
/// round-trips as `30` rather than `30.0`.
pub fn parse_number(text: &str) -> Value {
    let Ok(parsed) = text.trim().parse::<f64>() else {
        return Value::Null;
    };
    if !parsed.is_finite() {
        return Value::Null;
    }
    if parsed.fract() == 0.0 && parsed >= i64::MIN as f64 && parsed < i64::MAX as f64 {
        return Value::Number(Number::from(parsed as i64));
    }
    Number::from_f64(parsed).map(Value::Number).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::create_controls;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn numbers_parse_or_null() {
        assert_eq!(parse_number("30"), json!(30));
        assert_eq!(parse_number(" 2.5 "), json!(2.5));
        assert_eq!(parse_number("-4"), json!(-4));
        assert_eq!(parse_number(""), Value::Null);
        assert_eq!(parse_number("thirty"), Value::Null);
        assert_eq!(parse_number("inf"), Value::Null);
        assert_eq!(parse_number("NaN"), Value::Null);
    }

    #[test]
    fn untouched_controls_reproduce_values() {
        let fields = vec![
            FieldDescriptor::new("nick", FieldType::String).value("bob"),
            FieldDescriptor::new("age", FieldType::Number).value(30),
            FieldDescriptor::new("alerts", FieldType::Boolean).value(true),
            FieldDescriptor::new("born", FieldType::Date).value("1990-01-02"),
            FieldDescriptor::new("theme", FieldType::Enum)
                .options(["Light", "Dark", "System"])
                .value("Dark"),
        ];
        let bindings = create_controls(&fields);
        let values = extract_values(&bindings, &fields);
        assert_eq!(
            Value::Object(values),
            json!({
                "nick": "bob",
                "age": 30,
                "alerts": true,
                "born": "1990-01-02",
                "theme": "Dark",
            })
        );
    }

    #[test]
    fn unselected_radio_and_missing_binding() {
        let fields = vec![
            FieldDescriptor::new("theme", FieldType::Enum)
                .options(["Light", "Dark"])
                .value("Sepia"),
            FieldDescriptor::new("orphan", FieldType::String),
        ];
        let bindings = create_controls(&fields[..1]);
        let values = extract_values(&bindings, &fields);
        assert_eq!(Value::Object(values), json!({ "theme": null }));
    }

    #[test]
    fn extraction_does_not_mutate() {
        let fields = vec![FieldDescriptor::new("age", FieldType::Number).value("x")];
        let bindings = create_controls(&fields);
        let snapshot = bindings.clone();
        let _ = extract_values(&bindings, &fields);
        let _ = extract_values(&bindings, &fields);
        assert_eq!(bindings, snapshot);
    }
}
