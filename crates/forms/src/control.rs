//! Control factory: maps a normalized field onto a widget variant and the
//! live state that backs it.
//!
//! Dispatch:
//! - `String`  → text input seeded with the value's text form
//! - `Number`  → number input (text with numeric intent, validated only on extraction)
//! - `Boolean` → checkbox seeded with the value's truthiness
//! - `Date`    → date input (text with a placeholder hint, no format check)
//! - `Enum`    → radio group for up to [`ENUM_RADIO_MAX`] options, combo box above that;
//!   an enum without options degrades to a plain text input
use serde::Serialize;
use serde_json::Value;
use strum::Display;
use tracing::debug;

use crate::schema::{FieldDescriptor, FieldType, value_text};

/// Largest option count still rendered as a radio group.
pub const ENUM_RADIO_MAX: usize = 3;

/// Height of one control row (and of each radio option).
pub const ROW_HEIGHT: u32 = 20;

/// Placeholder shown in empty date inputs.
pub const DATE_PLACEHOLDER: &str = "YYYY-MM-DD";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
pub enum WidgetVariant {
    TextInput,
    NumberInput,
    CheckBox,
    DateInput,
    RadioGroup,
    ComboBox,
}

impl WidgetVariant {
    /// Variants edited through a single-line text editor.
    pub fn is_textual(self) -> bool {
        matches!(
            self,
            WidgetVariant::TextInput | WidgetVariant::NumberInput | WidgetVariant::DateInput
        )
    }

    pub fn is_choice(self) -> bool {
        matches!(self, WidgetVariant::RadioGroup | WidgetVariant::ComboBox)
    }
}

/// Live state of a control. This is the "handle" a form owns for each field.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlState {
    Text {
        value: String,
        placeholder: Option<String>,
    },
    Check {
        checked: bool,
    },
    Choice {
        options: Vec<String>,
        selected: Option<usize>,
    },
}

/// A field bound to its control. Owned by exactly one form.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlBinding {
    field_name: String,
    label: String,
    variant: WidgetVariant,
    state: ControlState,
}

impl ControlBinding {
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn variant(&self) -> WidgetVariant {
        self.variant
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    /// Vertical space the control needs: one row per radio option, one row
    /// for everything else.
    pub fn height(&self) -> u32 {
        match (&self.variant, &self.state) {
            (WidgetVariant::RadioGroup, ControlState::Choice { options, .. }) => {
                options.len().max(1) as u32 * ROW_HEIGHT
            }
            _ => ROW_HEIGHT,
        }
    }

    // --- Text ----------------------------------------------------------------------------------

    pub fn text(&self) -> Option<&str> {
        match &self.state {
            ControlState::Text { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn placeholder(&self) -> Option<&str> {
        match &self.state {
            ControlState::Text { placeholder, .. } => placeholder.as_deref(),
            _ => None,
        }
    }

    /// Replace the text of a text-like control. Returns false for other controls.
    pub fn set_text(&mut self, text: impl Into<String>) -> bool {
        match &mut self.state {
            ControlState::Text { value, .. } => {
                *value = text.into();
                true
            }
            _ => false,
        }
    }

    // --- Checkbox ------------------------------------------------------------------------------

    pub fn is_checked(&self) -> Option<bool> {
        match self.state {
            ControlState::Check { checked } => Some(checked),
            _ => None,
        }
    }

    pub fn set_checked(&mut self, on: bool) -> bool {
        match &mut self.state {
            ControlState::Check { checked } => {
                *checked = on;
                true
            }
            _ => false,
        }
    }

    pub fn toggle(&mut self) -> bool {
        match &mut self.state {
            ControlState::Check { checked } => {
                *checked = !*checked;
                true
            }
            _ => false,
        }
    }

    // --- Choice --------------------------------------------------------------------------------

    pub fn options(&self) -> &[String] {
        match &self.state {
            ControlState::Choice { options, .. } => options,
            _ => &[],
        }
    }

    pub fn selected_index(&self) -> Option<usize> {
        match self.state {
            ControlState::Choice { selected, .. } => selected,
            _ => None,
        }
    }

    pub fn selected_option(&self) -> Option<&str> {
        match &self.state {
            ControlState::Choice { options, selected } => {
                selected.and_then(|i| options.get(i)).map(String::as_str)
            }
            _ => None,
        }
    }

    /// Select by index; out-of-range indices are ignored.
    pub fn select(&mut self, index: usize) -> bool {
        match &mut self.state {
            ControlState::Choice { options, selected } if index < options.len() => {
                *selected = Some(index);
                true
            }
            _ => false,
        }
    }

    pub fn select_option(&mut self, option: &str) -> bool {
        let index = self.options().iter().position(|o| o == option);
        index.is_some_and(|i| self.select(i))
    }

    /// Move the selection by `dir` steps, wrapping around. An unselected
    /// control starts from the first option.
    pub fn cycle(&mut self, dir: i32) -> bool {
        let len = self.options().len();
        if len == 0 {
            return false;
        }
        let next = match self.selected_index() {
            Some(cur) => (cur as i32 + dir).rem_euclid(len as i32) as usize,
            None => 0,
        };
        self.select(next)
    }

    /// Single-line text shown for the control in compact renderings.
    pub fn display_value(&self) -> String {
        match &self.state {
            ControlState::Text { value, placeholder } => {
                if value.is_empty() {
                    placeholder.clone().unwrap_or_default()
                } else {
                    value.clone()
                }
            }
            ControlState::Check { checked } => {
                if *checked {
                    "[x]".into()
                } else {
                    "[ ]".into()
                }
            }
            ControlState::Choice { .. } => self.selected_option().unwrap_or("").to_string(),
        }
    }
}

/// Build the control for a single field.
pub fn create_control(field: &FieldDescriptor) -> ControlBinding {
    let (variant, state) = match field.field_type {
        FieldType::String => (WidgetVariant::TextInput, text_state(field, None)),
        FieldType::Number => (WidgetVariant::NumberInput, text_state(field, None)),
        FieldType::Date => (
            WidgetVariant::DateInput,
            text_state(field, Some(DATE_PLACEHOLDER)),
        ),
        FieldType::Boolean => (
            WidgetVariant::CheckBox,
            ControlState::Check {
                checked: truthy(&field.value),
            },
        ),
        FieldType::Enum if field.options.is_empty() => {
            (WidgetVariant::TextInput, text_state(field, None))
        }
        FieldType::Enum => {
            let current = value_text(&field.value);
            let position = field.options.iter().position(|o| *o == current);
            if field.options.len() <= ENUM_RADIO_MAX {
                (
                    WidgetVariant::RadioGroup,
                    ControlState::Choice {
                        options: field.options.clone(),
                        selected: position,
                    },
                )
            } else {
                (
                    WidgetVariant::ComboBox,
                    ControlState::Choice {
                        options: field.options.clone(),
                        selected: position.or(Some(0)),
                    },
                )
            }
        }
    };

    debug!(field = %field.name, %variant, "created control");
    ControlBinding {
        field_name: field.name.clone(),
        label: field.display_name.clone(),
        variant,
        state,
    }
}

/// Build controls for a whole schema, preserving order.
pub fn create_controls(fields: &[FieldDescriptor]) -> Vec<ControlBinding> {
    fields.iter().map(create_control).collect()
}

fn text_state(field: &FieldDescriptor, placeholder: Option<&str>) -> ControlState {
    ControlState::Text {
        value: field.value_text(),
        placeholder: placeholder.map(str::to_string),
    }
}

/// Scripting-style truthiness: `null`, `false`, zero, NaN and the empty
/// string are false; everything else is true.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
