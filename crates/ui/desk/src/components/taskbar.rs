//! Taskbar: one entry per open window, kept current purely from registry
//! events.
use color_eyre::Result;
use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use forms::{WindowEvent, WindowId};
use ratatui::{
    layout::{Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use super::Component;
use crate::{
    action::Action,
    tui::{EventResponse, Frame},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskbarEntry {
    pub id: WindowId,
    pub title: String,
    pub visible: bool,
    pub active: bool,
}

#[derive(Debug, Default)]
pub struct Taskbar {
    entries: Vec<TaskbarEntry>,
    slots: Vec<(WindowId, Rect)>,
}

impl Taskbar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TaskbarEntry] {
        &self.entries
    }

    pub fn apply(&mut self, event: &WindowEvent) {
        let record = event.record();
        match event {
            WindowEvent::Created(_) => self.entries.push(TaskbarEntry {
                id: record.id,
                title: record.title.clone(),
                visible: record.is_visible(),
                active: record.is_active,
            }),
            WindowEvent::Destroyed(_) => self.entries.retain(|e| e.id != record.id),
            WindowEvent::Activated(_) => {
                for e in &mut self.entries {
                    e.active = e.id == record.id;
                    if e.active {
                        e.visible = true;
                    }
                }
            }
            WindowEvent::Minimized(_) | WindowEvent::Restored(_) => {
                if let Some(e) = self.entries.iter_mut().find(|e| e.id == record.id) {
                    e.visible = record.is_visible();
                    e.active = record.is_active;
                }
            }
        }
    }

    fn label(entry: &TaskbarEntry) -> String {
        if entry.visible {
            format!(" {} ", entry.title)
        } else {
            format!(" ({}) ", entry.title)
        }
    }
}

impl Component for Taskbar {
    fn handle_mouse_events(&mut self, mouse: MouseEvent) -> Result<Option<EventResponse<Action>>> {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return Ok(None);
        }
        let hit = self
            .slots
            .iter()
            .find(|(_, r)| r.contains(Position::new(mouse.column, mouse.row)))
            .map(|(id, _)| EventResponse::Stop(Action::ActivateWindow(*id)));
        Ok(hit)
    }

    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        self.slots.clear();
        let mut spans = Vec::new();
        let mut x = area.x;
        for entry in &self.entries {
            let label = Self::label(entry);
            let width = label.chars().count() as u16;
            if x.saturating_add(width) > area.right() {
                break;
            }
            let style = match (entry.active, entry.visible) {
                (true, _) => Style::default().fg(Color::Black).bg(Color::Cyan),
                (false, true) => Style::default().fg(Color::White).bg(Color::DarkGray),
                (false, false) => Style::default()
                    .fg(Color::Gray)
                    .add_modifier(Modifier::ITALIC),
            };
            self.slots.push((entry.id, Rect::new(x, area.y, width, 1)));
            spans.push(Span::styled(label, style));
            spans.push(Span::raw(" "));
            x = x.saturating_add(width + 1);
        }
        spans.push(Span::styled(
            " F5 minimize  F6 next window  Ctrl+C quit",
            Style::default().fg(Color::DarkGray),
        ));
        f.render_widget(Paragraph::new(Line::from(spans)), area);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forms::WindowRegistry;
    use pretty_assertions::assert_eq;

    fn sync(registry_events: &mut tokio::sync::mpsc::UnboundedReceiver<WindowEvent>, bar: &mut Taskbar) {
        while let Ok(ev) = registry_events.try_recv() {
            bar.apply(&ev);
        }
    }

    #[test]
    fn mirrors_registry_state() {
        let mut registry = WindowRegistry::new();
        let (_, mut rx) = registry.subscribe();
        let mut bar = Taskbar::new();

        let login = registry.register("Login");
        let settings = registry.register("Settings");
        sync(&mut rx, &mut bar);
        assert_eq!(bar.entries().len(), 2);
        assert!(bar.entries()[1].active);
        assert!(!bar.entries()[0].active);

        registry.minimize(settings).unwrap();
        sync(&mut rx, &mut bar);
        assert!(!bar.entries()[1].visible);
        assert!(!bar.entries()[1].active);

        registry.activate(settings).unwrap();
        registry.unregister(login).unwrap();
        sync(&mut rx, &mut bar);
        assert_eq!(
            bar.entries(),
            &[TaskbarEntry {
                id: settings,
                title: "Settings".into(),
                visible: true,
                active: true,
            }]
        );
    }
}
