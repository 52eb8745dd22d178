use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use forms::control::ROW_HEIGHT;
use forms::layout::LayoutTrigger;
use forms::layout::flow::MIN_ROW_ADVANCE;
use forms::{
    ControlBinding, FooterButton, FormCommand, RpcError, SaveOutcome, SettingsForm, WidgetVariant,
    WindowId,
};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    widgets::{Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use strum::IntoEnumIterator;
use tui_input::{Input, InputRequest};

use super::{Component, input_request, popup::draw_window_frame};
use crate::{
    action::Action,
    render::CellMetrics,
    tui::{EventResponse, Frame},
};

/// Keyboard focus: a field by binding index, or a footer button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Field(usize),
    Button(FooterButton),
}

pub struct SettingsWindow {
    id: WindowId,
    form: SettingsForm,
    focus: Focus,
    editor: Input,
    cells: CellMetrics,
    content: Option<Rect>,
    focused: bool,
}

impl SettingsWindow {
    pub fn new(id: WindowId, form: SettingsForm, cells: CellMetrics) -> Self {
        let focus = if form.bindings().is_empty() {
            Focus::Button(FooterButton::Cancel)
        } else {
            Focus::Field(0)
        };
        let mut window = Self {
            id,
            form,
            focus,
            editor: Input::default(),
            cells,
            content: None,
            focused: true,
        };
        window.load_editor();
        window
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn form(&self) -> &SettingsForm {
        &self.form
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    /// Feed back the completion of a save started from this window.
    pub fn finish_save(&mut self, result: Result<(), RpcError>, close: bool) -> SaveOutcome {
        self.form.finish_save(result, close)
    }

    pub fn is_closed(&self) -> bool {
        self.form.is_closed()
    }

    fn focus_slots(&self) -> Vec<Focus> {
        (0..self.form.bindings().len())
            .map(Focus::Field)
            .chain(FooterButton::iter().map(Focus::Button))
            .collect()
    }

    fn move_focus(&mut self, dir: i32) {
        let slots = self.focus_slots();
        let cur = slots.iter().position(|s| *s == self.focus).unwrap_or(0) as i32;
        let next = (cur + dir).rem_euclid(slots.len() as i32) as usize;
        self.set_focus(slots[next]);
    }

    fn set_focus(&mut self, focus: Focus) {
        self.focus = focus;
        self.load_editor();
        if let Some(name) = self.focused_binding().map(|b| b.field_name().to_string()) {
            self.form.scroll_into_view(&name);
        }
    }

    fn focused_binding(&self) -> Option<&ControlBinding> {
        match self.focus {
            Focus::Field(i) => self.form.bindings().get(i),
            Focus::Button(_) => None,
        }
    }

    fn focused_binding_mut(&mut self) -> Option<&mut ControlBinding> {
        match self.focus {
            Focus::Field(i) => self.form.binding_at_mut(i),
            Focus::Button(_) => None,
        }
    }

    /// Seed the line editor from the focused text control.
    fn load_editor(&mut self) {
        let text = self.focused_binding().and_then(|b| b.text()).unwrap_or("");
        self.editor = Input::new(text.to_string());
    }

    fn edit(&mut self, request: InputRequest) {
        let _ = self.editor.handle(request);
        let value = self.editor.value().to_string();
        if let Some(binding) = self.focused_binding_mut() {
            binding.set_text(value);
        }
    }

    fn press(&mut self, button: FooterButton) -> Action {
        match self.form.press(button) {
            FormCommand::Save { values, close } => Action::Save {
                window: self.id,
                values,
                close,
            },
            FormCommand::Close => Action::CloseWindow(self.id),
        }
    }

    fn page(&self) -> i32 {
        self.form.geometry().viewport.height.max(MIN_ROW_ADVANCE) as i32
    }

    fn fit(&mut self, content: Rect) {
        if self.content == Some(content) {
            return;
        }
        let trigger = if self.content.is_none() {
            LayoutTrigger::InitialDraw
        } else {
            LayoutTrigger::Resized
        };
        self.content = Some(content);
        self.form.resize(self.cells.size_of(content), trigger);
    }

    /// Focus whatever control sits under a container point; radio options
    /// and checkboxes react to the click as well.
    fn click(&mut self, x: i32, y: i32) -> bool {
        if let Some(button) = self.form.geometry().button_at(x, y) {
            self.set_focus(Focus::Button(button));
            return true;
        }
        let geometry = self.form.geometry();
        if y < 0 || y as u32 >= geometry.viewport.height {
            return false;
        }
        let y = y + self.form.scroll() as i32;
        let hit = geometry
            .rows
            .iter()
            .find(|row| row.control.contains(x, y) || row.label.contains(x, y))
            .map(|row| (row.key.clone(), row.control));
        let Some((key, control)) = hit else {
            return false;
        };
        let Some(index) = self.form.bindings().iter().position(|b| b.field_name() == key) else {
            return false;
        };
        self.set_focus(Focus::Field(index));
        if !control.contains(x, y) {
            return true;
        }
        if let Some(binding) = self.form.binding_at_mut(index) {
            match binding.variant() {
                WidgetVariant::RadioGroup => {
                    binding.select(((y - control.y) / ROW_HEIGHT as i32) as usize);
                }
                WidgetVariant::CheckBox => {
                    binding.toggle();
                }
                WidgetVariant::ComboBox => {
                    binding.cycle(1);
                }
                _ => {}
            }
        }
        true
    }

    fn draw_control(&self, f: &mut Frame<'_>, binding: &ControlBinding, rect: Rect, focused: bool) {
        let base = if focused {
            Style::default().fg(Color::Black).bg(Color::White)
        } else {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        };
        let line = Rect::new(rect.x, rect.y, rect.width, 1);
        match binding.variant() {
            WidgetVariant::TextInput | WidgetVariant::NumberInput | WidgetVariant::DateInput => {
                let empty = binding.text().is_none_or(str::is_empty);
                let style = if empty {
                    base.add_modifier(Modifier::DIM)
                } else {
                    base
                };
                f.render_widget(Paragraph::new(binding.display_value()).style(style), line);
            }
            WidgetVariant::CheckBox => {
                f.render_widget(Paragraph::new(binding.display_value()).style(base), line);
            }
            WidgetVariant::ComboBox => {
                let text = format!("< {} >", binding.display_value());
                f.render_widget(Paragraph::new(text).style(base), line);
            }
            WidgetVariant::RadioGroup => {}
        }
    }
}

impl Component for SettingsWindow {
    fn handle_key_events(&mut self, key: KeyEvent) -> Result<Option<EventResponse<Action>>> {
        let variant = self.focused_binding().map(ControlBinding::variant);
        let action = match (key.code, self.focus) {
            (KeyCode::Tab | KeyCode::Down, _) => {
                self.move_focus(1);
                None
            }
            (KeyCode::BackTab | KeyCode::Up, _) => {
                self.move_focus(-1);
                None
            }
            (KeyCode::Esc, _) => Some(self.press(FooterButton::Cancel)),
            (KeyCode::PageDown, _) => {
                self.form.scroll_by(self.page());
                None
            }
            (KeyCode::PageUp, _) => {
                self.form.scroll_by(-self.page());
                None
            }
            (KeyCode::Enter, Focus::Button(button)) => Some(self.press(button)),
            (KeyCode::Enter, Focus::Field(_)) => {
                self.move_focus(1);
                None
            }
            (KeyCode::Left | KeyCode::Right, Focus::Button(_)) => {
                self.move_focus(if key.code == KeyCode::Left { -1 } else { 1 });
                None
            }
            (KeyCode::Left | KeyCode::Right | KeyCode::Char(' '), Focus::Field(_))
                if variant.is_some_and(WidgetVariant::is_choice) =>
            {
                let dir = if key.code == KeyCode::Left { -1 } else { 1 };
                if let Some(binding) = self.focused_binding_mut() {
                    binding.cycle(dir);
                }
                None
            }
            (KeyCode::Char(' '), Focus::Field(_)) if variant == Some(WidgetVariant::CheckBox) => {
                if let Some(binding) = self.focused_binding_mut() {
                    binding.toggle();
                }
                None
            }
            (KeyCode::Char(' '), Focus::Button(button)) => Some(self.press(button)),
            (_, Focus::Field(_)) if variant.is_some_and(WidgetVariant::is_textual) => {
                let Some(request) = input_request(key) else {
                    return Ok(None);
                };
                self.edit(request);
                None
            }
            _ => return Ok(None),
        };
        Ok(Some(EventResponse::Stop(action.unwrap_or(Action::Render))))
    }

    fn handle_mouse_events(&mut self, mouse: MouseEvent) -> Result<Option<EventResponse<Action>>> {
        let Some(content) = self.content else {
            return Ok(None);
        };
        let Some((x, y)) = self.cells.to_units(mouse.column, mouse.row, content) else {
            return Ok(None);
        };
        let action = match mouse.kind {
            MouseEventKind::ScrollDown => {
                self.form.scroll_by(MIN_ROW_ADVANCE as i32);
                Action::Render
            }
            MouseEventKind::ScrollUp => {
                self.form.scroll_by(-(MIN_ROW_ADVANCE as i32));
                Action::Render
            }
            MouseEventKind::Down(MouseButton::Left) => {
                if !self.click(x, y) {
                    return Ok(None);
                }
                match self.focus {
                    Focus::Button(button) => self.press(button),
                    Focus::Field(_) => Action::Render,
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(EventResponse::Stop(action)))
    }

    fn handle_paste(&mut self, text: &str) -> Result<Option<EventResponse<Action>>> {
        if !self
            .focused_binding()
            .is_some_and(|b| b.variant().is_textual())
        {
            return Ok(None);
        }
        for c in text.chars().filter(|c| !c.is_control()) {
            self.edit(InputRequest::InsertChar(c));
        }
        Ok(Some(EventResponse::Stop(Action::Render)))
    }

    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        let title = self.form.title();
        let content = draw_window_frame(f, area, &title, self.focused);
        self.fit(content);

        let geometry = self.form.geometry().clone();
        let scroll = self.form.scroll();
        let Some(viewport) = self.cells.to_cells(geometry.viewport, content, 0) else {
            return Ok(());
        };

        let mut cursor = None;
        for (index, binding) in self.form.bindings().iter().enumerate() {
            let Some(row) = geometry.row(binding.field_name()) else {
                continue;
            };
            let focused = self.focused && self.focus == Focus::Field(index);

            if let Some(rect) = self.cells.to_cells(row.label, viewport, scroll) {
                let label = Paragraph::new(format!("{}:", binding.label()))
                    .alignment(Alignment::Right)
                    .style(Style::default().fg(Color::Gray));
                f.render_widget(label, Rect::new(rect.x, rect.y, rect.width, 1));
            }

            if binding.variant() == WidgetVariant::RadioGroup {
                for (i, option) in binding.options().iter().enumerate() {
                    let option_rect = forms::Rect::new(
                        row.control.x,
                        row.control.y + (i as u32 * ROW_HEIGHT) as i32,
                        row.control.width,
                        ROW_HEIGHT,
                    );
                    let Some(rect) = self.cells.to_cells(option_rect, viewport, scroll) else {
                        continue;
                    };
                    let mark = if binding.selected_index() == Some(i) {
                        "(*)"
                    } else {
                        "( )"
                    };
                    let style = if focused && binding.selected_index() == Some(i) {
                        Style::default().fg(Color::Black).bg(Color::White)
                    } else {
                        Style::default().fg(Color::White)
                    };
                    f.render_widget(
                        Paragraph::new(format!("{mark} {option}")).style(style),
                        Rect::new(rect.x, rect.y, rect.width, 1),
                    );
                }
                continue;
            }

            let Some(rect) = self.cells.to_cells(row.control, viewport, scroll) else {
                continue;
            };
            self.draw_control(f, binding, rect, focused);
            if focused && binding.variant().is_textual() {
                let offset = (self.editor.visual_cursor() as u16).min(rect.width.saturating_sub(1));
                cursor = Some((rect.x + offset, rect.y));
            }
        }
        if let Some(position) = cursor {
            f.set_cursor_position(position);
        }

        if geometry.scrolls {
            let mut state = ScrollbarState::new(geometry.content_height as usize)
                .viewport_content_length(geometry.viewport.height as usize)
                .position(scroll as usize);
            f.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight),
                viewport,
                &mut state,
            );
        }

        for (button, rect) in &geometry.buttons {
            let Some(cell) = self.cells.to_cells(*rect, content, 0) else {
                continue;
            };
            let style = if self.focused && self.focus == Focus::Button(*button) {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Black).bg(Color::Gray)
            };
            f.render_widget(
                Paragraph::new(button.to_string())
                    .alignment(Alignment::Center)
                    .style(style),
                Rect::new(cell.x, cell.y, cell.width, 1),
            );
        }

        if self.form.pending_saves() > 0 {
            let status = Rect::new(content.x, content.bottom().saturating_sub(1), 12, 1)
                .intersection(content);
            f.render_widget(
                Paragraph::new("Saving...").style(Style::default().fg(Color::Yellow)),
                status,
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forms::{FieldDescriptor, FieldType, SettingsPayload};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn window() -> SettingsWindow {
        let payload = SettingsPayload {
            user_name: Some("ada".into()),
            fields: vec![
                FieldDescriptor::new("theme", FieldType::Enum)
                    .options(["Light", "Dark", "System"])
                    .value("Light"),
                FieldDescriptor::new("nick", FieldType::String).value("bob"),
                FieldDescriptor::new("notify", FieldType::Boolean).value(false),
            ],
        };
        let form = SettingsForm::from_payload("demo", payload, forms::Size::new(600, 400));
        let id = forms::WindowRegistry::new().register("settings");
        SettingsWindow::new(id, form, CellMetrics::new(10, 20))
    }

    fn key(w: &mut SettingsWindow, code: KeyCode) -> Option<EventResponse<Action>> {
        w.handle_key_events(KeyEvent::from(code)).unwrap()
    }

    #[test]
    fn keys_edit_each_control_kind() {
        let mut w = window();
        key(&mut w, KeyCode::Right);
        key(&mut w, KeyCode::Tab);
        key(&mut w, KeyCode::Char('!'));
        key(&mut w, KeyCode::Tab);
        key(&mut w, KeyCode::Char(' '));

        let values = w.form().collect();
        assert_eq!(values["theme"], json!("Dark"));
        assert_eq!(values["nick"], json!("bob!"));
        assert_eq!(values["notify"], json!(true));
    }

    #[test]
    fn ok_button_asks_for_a_closing_save() {
        let mut w = window();
        for _ in 0..3 {
            key(&mut w, KeyCode::Tab);
        }
        match key(&mut w, KeyCode::Enter) {
            Some(EventResponse::Stop(Action::Save { window, values, close })) => {
                assert_eq!(window, w.id());
                assert!(close);
                assert_eq!(values["nick"], json!("bob"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(w.form().pending_saves(), 1);
    }

    #[test]
    fn escape_cancels() {
        let mut w = window();
        let id = w.id();
        assert!(matches!(
            key(&mut w, KeyCode::Esc),
            Some(EventResponse::Stop(Action::CloseWindow(closed))) if closed == id
        ));
        assert!(w.is_closed());
    }

    #[test]
    fn failed_save_keeps_the_window_open() {
        let mut w = window();
        for _ in 0..5 {
            key(&mut w, KeyCode::Tab);
        }
        key(&mut w, KeyCode::Enter);
        let outcome = w.finish_save(Err(RpcError::Server("disk full".into())), false);
        assert!(matches!(outcome, SaveOutcome::Failed(_)));
        assert!(!w.is_closed());
    }

    #[test]
    fn clicking_a_radio_option_selects_it() {
        let mut w = window();
        w.fit(Rect::new(0, 0, 60, 20));
        // Second option of the first row: x 170..370, y 30..50 in device units.
        assert!(w.click(205, 30));
        assert_eq!(w.form().binding("theme").unwrap().selected_option(), Some("Dark"));
    }
}
