//! Settings form controller (flow layout).
//!
//! Lifecycle: `getSettings` → normalize → controls → flow layout. The footer
//! carries OK / Cancel / Apply. Apply saves and keeps the form open, OK saves
//! and closes on success, Cancel closes without saving. A failed save leaves
//! every control as it was.
//!
//! Saves are not serialized. Each press yields its own [`FormCommand::Save`]
//! and each completion is fed back through [`SettingsForm::finish_save`] in
//! whatever order the calls resolve.
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::codec::extract_values;
use crate::control::{ControlBinding, create_controls};
use crate::errors::{FormError, RpcError};
use crate::layout::flow::{self, FlowGeometry, FlowRow};
use crate::layout::{LayoutTrigger, Size};
use crate::rpc::{RpcClient, SettingsPayload};
use crate::schema::FieldDescriptor;

pub use crate::layout::flow::FooterButton;

/// What the host must do after a footer press.
#[derive(Debug, Clone, PartialEq)]
pub enum FormCommand {
    Save {
        values: Map<String, Value>,
        close: bool,
    },
    Close,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved { close: bool },
    Failed(FormError),
}

#[derive(Debug, Clone)]
pub struct SettingsForm {
    app_name: String,
    user_name: Option<String>,
    fields: Vec<FieldDescriptor>,
    bindings: Vec<ControlBinding>,
    rows: Vec<FlowRow>,
    size: Size,
    geometry: FlowGeometry,
    scroll: u32,
    pending_saves: usize,
    closed: bool,
}

impl SettingsForm {
    /// Fetch the schema and build the form. Refused when the client has no
    /// application name.
    pub async fn open(client: &RpcClient, size: Size) -> Result<Self, FormError> {
        require_app_name(client.app_name())?;
        let payload = client.get_settings().await?;
        Ok(Self::from_payload(client.app_name(), payload, size))
    }

    pub fn from_payload(app_name: impl Into<String>, payload: SettingsPayload, size: Size) -> Self {
        let bindings = create_controls(&payload.fields);
        let rows = bindings
            .iter()
            .map(|b| FlowRow::new(b.field_name(), b.height()))
            .collect::<Vec<_>>();
        let geometry = flow::layout(&rows, size);
        let app_name = app_name.into();
        debug!(app = %app_name, fields = bindings.len(), "settings form built");

        Self {
            app_name,
            user_name: payload.user_name,
            fields: payload.fields,
            bindings,
            rows,
            size,
            geometry,
            scroll: 0,
            pending_saves: 0,
            closed: false,
        }
    }

    pub fn title(&self) -> String {
        match &self.user_name {
            Some(user) => format!("{} Settings ({user})", self.app_name),
            None => format!("{} Settings", self.app_name),
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn bindings(&self) -> &[ControlBinding] {
        &self.bindings
    }

    pub fn binding(&self, field: &str) -> Option<&ControlBinding> {
        self.bindings.iter().find(|b| b.field_name() == field)
    }

    pub fn binding_mut(&mut self, field: &str) -> Option<&mut ControlBinding> {
        self.bindings.iter_mut().find(|b| b.field_name() == field)
    }

    pub fn binding_at_mut(&mut self, index: usize) -> Option<&mut ControlBinding> {
        self.bindings.get_mut(index)
    }

    // --- Layout --------------------------------------------------------------------------------

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn geometry(&self) -> &FlowGeometry {
        &self.geometry
    }

    pub fn resize(&mut self, size: Size, trigger: LayoutTrigger) {
        self.size = size;
        self.relayout(trigger);
    }

    /// Show or hide a field's row. Hidden fields are still saved.
    pub fn set_row_visible(&mut self, field: &str, visible: bool) {
        let mut changed = false;
        for row in self.rows.iter_mut().filter(|r| r.key == field) {
            changed |= row.visible != visible;
            row.visible = visible;
        }
        if changed {
            self.relayout(LayoutTrigger::VisibilityChanged);
        }
    }

    fn relayout(&mut self, trigger: LayoutTrigger) {
        self.geometry = flow::layout(&self.rows, self.size);
        self.scroll = self.scroll.min(self.max_scroll());
        debug!(%trigger, width = self.size.width, height = self.size.height, "settings relayout");
    }

    pub fn scroll(&self) -> u32 {
        self.scroll
    }

    fn max_scroll(&self) -> u32 {
        self.geometry
            .content_height
            .saturating_sub(self.geometry.viewport.height)
    }

    pub fn scroll_by(&mut self, delta: i32) {
        let target = (self.scroll as i64 + delta as i64).clamp(0, self.max_scroll() as i64);
        self.scroll = target as u32;
    }

    /// Scroll just enough to bring `field`'s row into the viewport.
    pub fn scroll_into_view(&mut self, field: &str) {
        let Some(row) = self.geometry.row(field) else {
            return;
        };
        let top = row.label.y.min(row.control.y).max(0) as u32;
        let bottom = row.label.bottom().max(row.control.bottom()).max(0) as u32;
        let view = self.geometry.viewport.height;
        if top < self.scroll {
            self.scroll = top;
        } else if bottom > self.scroll + view {
            self.scroll = (bottom - view).min(self.max_scroll());
        }
    }

    // --- Saving --------------------------------------------------------------------------------

    /// Current values of every bound field.
    pub fn collect(&self) -> Map<String, Value> {
        extract_values(&self.bindings, &self.fields)
    }

    pub fn press(&mut self, button: FooterButton) -> FormCommand {
        match button {
            FooterButton::Cancel => {
                self.closed = true;
                FormCommand::Close
            }
            FooterButton::Ok | FooterButton::Apply => {
                self.pending_saves += 1;
                FormCommand::Save {
                    values: self.collect(),
                    close: button == FooterButton::Ok,
                }
            }
        }
    }

    /// Record the completion of one save started by [`Self::press`].
    pub fn finish_save(&mut self, result: Result<(), RpcError>, close: bool) -> SaveOutcome {
        self.pending_saves = self.pending_saves.saturating_sub(1);
        match result {
            Ok(()) => {
                info!(app = %self.app_name, close, "settings applied");
                if close {
                    self.closed = true;
                }
                SaveOutcome::Saved { close }
            }
            Err(e) => {
                warn!(app = %self.app_name, error = %e, "saving settings failed");
                SaveOutcome::Failed(e.into())
            }
        }
    }

    /// Press a footer button and run the resulting save to completion.
    pub async fn submit(&mut self, client: &RpcClient, button: FooterButton) -> SaveOutcome {
        match self.press(button) {
            FormCommand::Close => SaveOutcome::Saved { close: true },
            FormCommand::Save { values, close } => {
                let result = client.save_settings(values).await;
                self.finish_save(result, close)
            }
        }
    }

    pub fn pending_saves(&self) -> usize {
        self.pending_saves
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

pub(crate) fn require_app_name(app_name: &str) -> Result<(), FormError> {
    if app_name.trim().is_empty() {
        warn!("form opened without an application name");
        return Err(FormError::MissingContext("application name".into()));
    }
    Ok(())
}
