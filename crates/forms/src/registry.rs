//! Window lifecycle registry.
//!
//! Tracks the open windows and broadcasts every state change to subscribers
//! (a taskbar, typically). The registry is an explicit service: construct one
//! and hand it to whoever opens or observes windows.
//!
//! Events are delivered over unbounded channels in the order the changes
//! happen. Subscribers whose receiver has been dropped are pruned on the next
//! broadcast.
use std::fmt;

use serde::Serialize;
use strum::Display;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, info};

use crate::errors::RegistryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct WindowId(u64);

impl WindowId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SubscriptionId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
pub enum Visibility {
    Visible,
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowRecord {
    pub id: WindowId,
    pub title: String,
    pub visibility: Visibility,
    pub is_active: bool,
}

impl WindowRecord {
    pub fn is_visible(&self) -> bool {
        self.visibility == Visibility::Visible
    }
}

/// State change notification. Each event carries a snapshot of the record
/// taken right after the change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Display)]
pub enum WindowEvent {
    Created(WindowRecord),
    Destroyed(WindowRecord),
    Activated(WindowRecord),
    Minimized(WindowRecord),
    Restored(WindowRecord),
}

impl WindowEvent {
    pub fn record(&self) -> &WindowRecord {
        match self {
            WindowEvent::Created(r)
            | WindowEvent::Destroyed(r)
            | WindowEvent::Activated(r)
            | WindowEvent::Minimized(r)
            | WindowEvent::Restored(r) => r,
        }
    }
}

#[derive(Debug, Default)]
pub struct WindowRegistry {
    windows: Vec<WindowRecord>,
    subscribers: Vec<(SubscriptionId, UnboundedSender<WindowEvent>)>,
    next_window: u64,
    next_subscription: u64,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Observers -----------------------------------------------------------------------------

    pub fn subscribe(&mut self) -> (SubscriptionId, UnboundedReceiver<WindowEvent>) {
        let (tx, rx) = unbounded_channel();
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.subscribers.push((id, tx));
        (id, rx)
    }

    /// Stop delivering to `id`. Returns false if it was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    fn broadcast(&mut self, event: WindowEvent) {
        debug!(event = %event, window = %event.record().id, "window event");
        self.subscribers
            .retain(|(_, tx)| tx.send(event.clone()).is_ok());
    }

    // --- Commands ------------------------------------------------------------------------------

    /// Open a window. The new window becomes the active one.
    pub fn register(&mut self, title: impl Into<String>) -> WindowId {
        self.next_window += 1;
        let id = WindowId(self.next_window);
        let record = WindowRecord {
            id,
            title: title.into(),
            visibility: Visibility::Visible,
            is_active: false,
        };
        info!(window = %id, title = %record.title, "window opened");
        self.windows.push(record.clone());
        self.broadcast(WindowEvent::Created(record));
        // Freshly inserted, so activation cannot miss.
        let _ = self.activate(id);
        id
    }

    pub fn unregister(&mut self, id: WindowId) -> Result<WindowRecord, RegistryError> {
        let index = self.index_of(id)?;
        let record = self.windows.remove(index);
        info!(window = %id, title = %record.title, "window closed");
        self.broadcast(WindowEvent::Destroyed(record.clone()));
        Ok(record)
    }

    /// Bring a window to the front. Hidden windows are restored first; the
    /// previously active window loses focus.
    pub fn activate(&mut self, id: WindowId) -> Result<(), RegistryError> {
        let index = self.index_of(id)?;
        if self.windows[index].visibility == Visibility::Hidden {
            self.restore(id)?;
        }
        if self.windows[index].is_active {
            return Ok(());
        }
        for w in &mut self.windows {
            w.is_active = w.id == id;
        }
        let record = self.windows[index].clone();
        self.broadcast(WindowEvent::Activated(record));
        Ok(())
    }

    /// Hide a window. It also stops being the active one.
    pub fn minimize(&mut self, id: WindowId) -> Result<(), RegistryError> {
        let index = self.index_of(id)?;
        let window = &mut self.windows[index];
        if window.visibility == Visibility::Hidden {
            return Ok(());
        }
        window.visibility = Visibility::Hidden;
        window.is_active = false;
        let record = window.clone();
        self.broadcast(WindowEvent::Minimized(record));
        Ok(())
    }

    /// Show a hidden window again without changing focus.
    pub fn restore(&mut self, id: WindowId) -> Result<(), RegistryError> {
        let index = self.index_of(id)?;
        let window = &mut self.windows[index];
        if window.visibility == Visibility::Visible {
            return Ok(());
        }
        window.visibility = Visibility::Visible;
        let record = window.clone();
        self.broadcast(WindowEvent::Restored(record));
        Ok(())
    }

    // --- Queries -------------------------------------------------------------------------------

    pub fn get(&self, id: WindowId) -> Option<&WindowRecord> {
        self.windows.iter().find(|w| w.id == id)
    }

    pub fn is_visible(&self, id: WindowId) -> Result<bool, RegistryError> {
        self.get(id)
            .map(WindowRecord::is_visible)
            .ok_or(RegistryError::UnknownWindow(id))
    }

    pub fn is_active(&self, id: WindowId) -> Result<bool, RegistryError> {
        self.get(id)
            .map(|w| w.is_active)
            .ok_or(RegistryError::UnknownWindow(id))
    }

    pub fn active(&self) -> Option<WindowId> {
        self.windows.iter().find(|w| w.is_active).map(|w| w.id)
    }

    /// Open windows in registration order.
    pub fn windows(&self) -> &[WindowRecord] {
        &self.windows
    }

    fn index_of(&self, id: WindowId) -> Result<usize, RegistryError> {
        self.windows
            .iter()
            .position(|w| w.id == id)
            .ok_or(RegistryError::UnknownWindow(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn drain(rx: &mut UnboundedReceiver<WindowEvent>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(format!("{}:{}", ev, ev.record().title));
        }
        out
    }

    #[test]
    fn register_creates_then_activates() {
        let mut reg = WindowRegistry::new();
        let (_, mut rx) = reg.subscribe();
        let a = reg.register("Login");
        let b = reg.register("Settings");

        assert_eq!(
            drain(&mut rx),
            vec![
                "Created:Login",
                "Activated:Login",
                "Created:Settings",
                "Activated:Settings"
            ]
        );
        assert_eq!(reg.is_active(a), Ok(false));
        assert_eq!(reg.is_active(b), Ok(true));
        assert_eq!(reg.active(), Some(b));
    }

    #[test]
    fn minimize_hides_and_activate_restores() {
        let mut reg = WindowRegistry::new();
        let id = reg.register("Settings");
        let (_, mut rx) = reg.subscribe();

        reg.minimize(id).unwrap();
        assert_eq!(reg.is_visible(id), Ok(false));
        assert_eq!(reg.is_active(id), Ok(false));
        assert_eq!(reg.active(), None);

        reg.activate(id).unwrap();
        assert_eq!(reg.is_visible(id), Ok(true));
        assert_eq!(reg.is_active(id), Ok(true));
        assert_eq!(
            drain(&mut rx),
            vec!["Minimized:Settings", "Restored:Settings", "Activated:Settings"]
        );
    }

    #[test]
    fn unknown_ids_are_errors() {
        let mut reg = WindowRegistry::new();
        let id = reg.register("x");
        reg.unregister(id).unwrap();
        assert_eq!(reg.activate(id), Err(RegistryError::UnknownWindow(id)));
        assert_eq!(reg.is_visible(id), Err(RegistryError::UnknownWindow(id)));
        assert!(reg.unregister(id).is_err());
        assert!(reg.windows().is_empty());
    }

    #[test]
    fn unsubscribe_and_dropped_receivers_stop_delivery() {
        let mut reg = WindowRegistry::new();
        let (sid, mut rx) = reg.subscribe();
        let (_, dropped) = reg.subscribe();
        drop(dropped);

        reg.register("a");
        assert_eq!(reg.subscribers.len(), 1);
        assert!(reg.unsubscribe(sid));
        assert!(!reg.unsubscribe(sid));
        reg.register("b");
        assert_eq!(drain(&mut rx), vec!["Created:a", "Activated:a"]);
    }
}
