use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Paragraph, Wrap},
};

use super::{
    Component,
    popup::{centered_rect_fixed, draw_window_frame},
};
use crate::{
    action::Action,
    tui::{EventResponse, Frame},
};

/// Blocking notification. Swallows every key; Enter or Esc dismisses it.
pub struct AlertPopup {
    title: String,
    message: String,
    min_width: u16,
}

impl AlertPopup {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            min_width: 50,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    fn height(&self, width: u16) -> u16 {
        let text_width = width.saturating_sub(4).max(1) as usize;
        let body: usize = self
            .message
            .lines()
            .map(|l| l.chars().count().div_ceil(text_width).max(1))
            .sum();
        // frame + blank line + hint
        (body + 4).min(u16::MAX as usize) as u16
    }
}

impl Component for AlertPopup {
    fn handle_key_events(&mut self, key: KeyEvent) -> Result<Option<EventResponse<Action>>> {
        let response = match key.code {
            KeyCode::Enter | KeyCode::Esc => EventResponse::Stop(Action::CloseAlert),
            // Modal: nothing reaches the windows below.
            _ => EventResponse::Stop(Action::Tick),
        };
        Ok(Some(response))
    }

    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        if area.width < 5 || area.height < 5 {
            return Ok(());
        }
        let w = self.min_width.min(area.width);
        let dialog = centered_rect_fixed(area, w, self.height(w));
        let inner = draw_window_frame(f, dialog, &self.title, true);

        let mut lines: Vec<Line> = self
            .message
            .lines()
            .map(|l| Line::from(Span::raw(l.to_string())))
            .collect();
        lines.push(Line::raw(""));
        lines.push(
            Line::from(vec![
                Span::styled("Enter", Style::default().fg(Color::White)),
                Span::raw("/"),
                Span::styled("Esc", Style::default().fg(Color::White)),
                Span::raw(": dismiss"),
            ])
            .fg(Color::DarkGray),
        );

        f.render_widget(
            Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true }),
            inner,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_dismisses_other_keys_are_swallowed() {
        let mut alert = AlertPopup::new("Request failed", "backend offline");
        let r = alert.handle_key_events(KeyEvent::from(KeyCode::Enter)).unwrap();
        assert!(matches!(r, Some(EventResponse::Stop(Action::CloseAlert))));
        let r = alert.handle_key_events(KeyEvent::from(KeyCode::Char('x'))).unwrap();
        assert!(matches!(r, Some(EventResponse::Stop(Action::Tick))));
    }

    #[test]
    fn height_grows_with_wrapped_message() {
        let short = AlertPopup::new("t", "one line");
        let long = AlertPopup::new("t", "x".repeat(100));
        assert_eq!(short.height(24), 5);
        assert_eq!(long.height(24), 9);
    }
}
