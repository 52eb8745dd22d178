use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use ratatui::layout::Rect;
use tui_input::InputRequest;

use crate::{
    action::Action,
    tui::{Event, EventResponse, Frame},
};

pub mod alert;
pub mod login_window;
pub mod popup;
pub mod settings_window;
pub mod taskbar;

/// A visual and interactive element of the desk.
///
/// Components receive terminal events, react to actions and draw themselves
/// into the area the desk hands them.
pub trait Component {
    fn handle_events(&mut self, event: &Event) -> Result<Option<EventResponse<Action>>> {
        let r = match event {
            Event::Key(key_event) => self.handle_key_events(*key_event)?,
            Event::Mouse(mouse_event) => self.handle_mouse_events(*mouse_event)?,
            Event::Paste(text) => self.handle_paste(text)?,
            _ => None,
        };
        Ok(r)
    }

    fn handle_key_events(&mut self, _key: KeyEvent) -> Result<Option<EventResponse<Action>>> {
        Ok(None)
    }

    fn handle_mouse_events(&mut self, _mouse: MouseEvent) -> Result<Option<EventResponse<Action>>> {
        Ok(None)
    }

    fn handle_paste(&mut self, _text: &str) -> Result<Option<EventResponse<Action>>> {
        Ok(None)
    }

    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()>;
}

/// Map a key onto a single-line editing request.
pub fn input_request(key: KeyEvent) -> Option<InputRequest> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char(c) if !ctrl => Some(InputRequest::InsertChar(c)),
        KeyCode::Char('u') if ctrl => Some(InputRequest::DeleteLine),
        KeyCode::Char('w') if ctrl => Some(InputRequest::DeletePrevWord),
        KeyCode::Backspace => Some(InputRequest::DeletePrevChar),
        KeyCode::Delete => Some(InputRequest::DeleteNextChar),
        KeyCode::Left => Some(InputRequest::GoToPrevChar),
        KeyCode::Right => Some(InputRequest::GoToNextChar),
        KeyCode::Home => Some(InputRequest::GoToStart),
        KeyCode::End => Some(InputRequest::GoToEnd),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tui_input::Input;

    #[test]
    fn typing_and_deleting() {
        let mut input = Input::default();
        for key in [
            KeyEvent::from(KeyCode::Char('a')),
            KeyEvent::from(KeyCode::Char('b')),
            KeyEvent::from(KeyCode::Backspace),
            KeyEvent::from(KeyCode::Char('c')),
        ] {
            if let Some(req) = input_request(key) {
                let _ = input.handle(req);
            }
        }
        assert_eq!(input.value(), "ac");
        assert!(input_request(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)).is_none());
        assert!(input_request(KeyEvent::from(KeyCode::Tab)).is_none());
    }
}
