use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use forms::layout::LayoutTrigger;
use forms::login::{LOGIN_BUTTONS, LoginButton, LoginField, rows};
use forms::{LoginForm, LoginMode, LoginRequest, WindowId};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    widgets::Paragraph,
};
use tui_input::Input;

use super::{Component, input_request, popup::draw_window_frame};
use crate::{
    action::Action,
    render::CellMetrics,
    tui::{EventResponse, Frame},
};

const FIELDS: [LoginField; 3] = [LoginField::Username, LoginField::Password, LoginField::Confirm];

pub struct LoginWindow {
    id: WindowId,
    form: LoginForm,
    inputs: [Input; 3],
    cells: CellMetrics,
    content: Option<Rect>,
    focused: bool,
    busy: bool,
}

impl LoginWindow {
    pub fn new(id: WindowId, cells: CellMetrics) -> Self {
        Self {
            id,
            form: LoginForm::new(forms::Size::default()),
            inputs: Default::default(),
            cells,
            content: None,
            focused: true,
            busy: false,
        }
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn form(&self) -> &LoginForm {
        &self.form
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn slot(field: LoginField) -> usize {
        FIELDS.iter().position(|f| *f == field).unwrap_or(0)
    }

    fn sync_inputs(&mut self) {
        for field in FIELDS {
            self.inputs[Self::slot(field)] = Input::new(self.form.value(field).to_string());
        }
    }

    /// A request came back with an error: drop the passwords, allow retrying.
    pub fn failed(&mut self) {
        self.busy = false;
        self.form.clear_passwords();
        self.sync_inputs();
    }

    pub fn account_created(&mut self) {
        self.busy = false;
        self.form.account_created();
        self.sync_inputs();
    }

    fn press(&mut self, button: LoginButton) -> Option<Action> {
        if self.busy {
            return None;
        }
        match button {
            LoginButton::Submit => match self.form.submit() {
                Ok(request) => {
                    self.busy = true;
                    Some(Action::Login(request))
                }
                Err(e) => Some(Action::error(&e)),
            },
            LoginButton::ToggleMode => {
                self.form.toggle_mode();
                self.sync_inputs();
                None
            }
            LoginButton::Guest => {
                self.busy = true;
                Some(Action::Login(LoginRequest::Guest))
            }
        }
    }

    /// Keep the form laid out for the current content area.
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

    fn row_text(&self, key: &str) -> Option<(String, Style)> {
        let label = Style::default().fg(Color::Gray);
        let text = match key {
            rows::USERNAME_LABEL => ("Username".to_string(), label),
            rows::PASSWORD_LABEL => ("Password".to_string(), label),
            rows::CONFIRM_LABEL => ("Confirm password".to_string(), label),
            rows::USERNAME | rows::PASSWORD | rows::CONFIRM => {
                let field = match key {
                    rows::USERNAME => LoginField::Username,
                    rows::PASSWORD => LoginField::Password,
                    _ => LoginField::Confirm,
                };
                let value = self.inputs[Self::slot(field)].value();
                let shown = if field == LoginField::Username {
                    value.to_string()
                } else {
                    "*".repeat(value.chars().count())
                };
                let style = if field == self.form.focus() && self.focused {
                    Style::default().fg(Color::Black).bg(Color::White)
                } else {
                    Style::default().fg(Color::White).bg(Color::DarkGray)
                };
                (shown, style)
            }
            _ => return None,
        };
        Some(text)
    }
}

impl Component for LoginWindow {
    fn handle_key_events(&mut self, key: KeyEvent) -> Result<Option<EventResponse<Action>>> {
        let action = match key.code {
            KeyCode::Tab | KeyCode::Down => {
                self.form.focus_next(1);
                None
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.form.focus_next(-1);
                None
            }
            KeyCode::Enter => self.press(LoginButton::Submit),
            KeyCode::F(2) => self.press(LoginButton::ToggleMode),
            KeyCode::F(3) => self.press(LoginButton::Guest),
            _ => {
                let Some(request) = input_request(key) else {
                    return Ok(None);
                };
                let field = self.form.focus();
                let input = &mut self.inputs[Self::slot(field)];
                let _ = input.handle(request);
                let value = input.value().to_string();
                self.form.set_value(field, value);
                None
            }
        };
        Ok(Some(EventResponse::Stop(action.unwrap_or(Action::Render))))
    }

    fn handle_mouse_events(&mut self, mouse: MouseEvent) -> Result<Option<EventResponse<Action>>> {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return Ok(None);
        }
        let Some(content) = self.content else {
            return Ok(None);
        };
        let Some((x, y)) = self.cells.to_units(mouse.column, mouse.row, content) else {
            return Ok(None);
        };
        if let Some(button) = self.form.button_at(x, y) {
            let action = self.press(button).unwrap_or(Action::Render);
            return Ok(Some(EventResponse::Stop(action)));
        }
        for field in FIELDS {
            let hit = self
                .form
                .geometry()
                .row(field.row())
                .is_some_and(|row| row.rect.contains(x, y));
            if hit {
                self.form.set_focus(field);
                return Ok(Some(EventResponse::Stop(Action::Render)));
            }
        }
        Ok(None)
    }

    fn handle_paste(&mut self, text: &str) -> Result<Option<EventResponse<Action>>> {
        let field = self.form.focus();
        let input = &mut self.inputs[Self::slot(field)];
        for c in text.chars().filter(|c| !c.is_control()) {
            let _ = input.handle(tui_input::InputRequest::InsertChar(c));
        }
        let value = input.value().to_string();
        self.form.set_value(field, value);
        Ok(Some(EventResponse::Stop(Action::Render)))
    }

    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        let content = draw_window_frame(f, area, self.form.title(), self.focused);
        self.fit(content);

        let geometry = self.form.geometry().clone();
        for row in &geometry.rows {
            let Some(cell_rect) = self.cells.to_cells(row.rect, content, 0) else {
                continue;
            };
            if row.key == rows::BUTTONS {
                for (cell, button) in row.cells.iter().zip(LOGIN_BUTTONS) {
                    let Some(rect) = self.cells.to_cells(*cell, content, 0) else {
                        continue;
                    };
                    let style = Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD);
                    f.render_widget(
                        Paragraph::new(self.form.button_label(button))
                            .alignment(Alignment::Center)
                            .style(style),
                        rect,
                    );
                }
                continue;
            }
            if let Some((text, style)) = self.row_text(row.key) {
                let line = Rect::new(cell_rect.x, cell_rect.y, cell_rect.width, 1);
                f.render_widget(Paragraph::new(text).style(style), line);
            }
        }

        if self.focused && !self.busy {
            let field = self.form.focus();
            let cursor = self
                .form
                .geometry()
                .row(field.row())
                .and_then(|row| self.cells.to_cells(row.rect, content, 0));
            if let Some(rect) = cursor {
                let offset = self.inputs[Self::slot(field)].visual_cursor() as u16;
                f.set_cursor_position((rect.x + offset.min(rect.width.saturating_sub(1)), rect.y));
            }
        }

        if self.form.mode() == LoginMode::CreateAccount {
            let hint = Rect::new(content.x, content.bottom().saturating_sub(1), content.width, 1);
            f.render_widget(
                Paragraph::new("F2 back to login").style(Style::default().fg(Color::DarkGray)),
                hint,
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn window() -> LoginWindow {
        LoginWindow::new(forms::WindowRegistry::new().register("Login"), CellMetrics::new(8, 16))
    }

    fn typed(w: &mut LoginWindow, text: &str) {
        for c in text.chars() {
            w.handle_key_events(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
                .unwrap();
        }
    }

    #[test]
    fn typing_fills_focused_field_and_enter_submits() {
        let mut w = window();
        typed(&mut w, "ada");
        w.handle_key_events(KeyEvent::from(KeyCode::Tab)).unwrap();
        typed(&mut w, "pw");
        let r = w.handle_key_events(KeyEvent::from(KeyCode::Enter)).unwrap();
        match r {
            Some(EventResponse::Stop(Action::Login(LoginRequest::Login { username, password }))) => {
                assert_eq!(username, "ada");
                assert_eq!(password, "pw");
            }
            other => panic!("unexpected {other:?}"),
        }
        // A second submit while the first is in flight is ignored.
        let r = w.handle_key_events(KeyEvent::from(KeyCode::Enter)).unwrap();
        assert!(matches!(r, Some(EventResponse::Stop(Action::Render))));
    }

    #[test]
    fn mismatch_in_create_mode_alerts_instead_of_sending() {
        let mut w = window();
        w.handle_key_events(KeyEvent::from(KeyCode::F(2))).unwrap();
        typed(&mut w, "ada");
        w.handle_key_events(KeyEvent::from(KeyCode::Tab)).unwrap();
        typed(&mut w, "one");
        w.handle_key_events(KeyEvent::from(KeyCode::Tab)).unwrap();
        typed(&mut w, "two");
        let r = w.handle_key_events(KeyEvent::from(KeyCode::Enter)).unwrap();
        assert!(matches!(r, Some(EventResponse::Stop(Action::Alert { .. }))));
    }

    #[test]
    fn failure_clears_passwords() {
        let mut w = window();
        typed(&mut w, "ada");
        w.handle_key_events(KeyEvent::from(KeyCode::Tab)).unwrap();
        typed(&mut w, "pw");
        w.handle_key_events(KeyEvent::from(KeyCode::Enter)).unwrap();
        w.failed();
        assert_eq!(w.form().value(LoginField::Password), "");
        assert_eq!(w.inputs[1].value(), "");
        assert_eq!(w.inputs[0].value(), "ada");
    }
}
