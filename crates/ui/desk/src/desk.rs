//! The desk: owns the windows, the registry that tracks them and the
//! taskbar, and drives everything from a single action channel.
//!
//! Terminal events go to the alert first (it is modal), then the taskbar,
//! then the active window, and finally the global keys. Every RPC runs in its
//! own task and reports back through the same channel, so the UI never
//! blocks on the backend.
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use forms::{
    FormError, LoginRequest, RpcClient, SaveOutcome, SettingsForm, WindowEvent, WindowId,
    WindowRegistry,
};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Margin, Rect},
    style::{Color, Style},
    widgets::{Block, Paragraph},
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::{
    action::Action,
    components::{
        Component,
        alert::AlertPopup,
        login_window::LoginWindow,
        popup::{centered_rect_fixed, render_backdrop},
        settings_window::SettingsWindow,
        taskbar::Taskbar,
    },
    render::CellMetrics,
    tui::{Event, EventResponse, Frame, Tui},
};

/// What the desk shows first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    Login,
    /// Skip the login window and open a guest session.
    Guest,
}

enum DeskWindow {
    Login(LoginWindow),
    Settings(SettingsWindow),
}

impl DeskWindow {
    fn id(&self) -> WindowId {
        match self {
            DeskWindow::Login(w) => w.id(),
            DeskWindow::Settings(w) => w.id(),
        }
    }

    fn component(&mut self) -> &mut dyn Component {
        match self {
            DeskWindow::Login(w) => w,
            DeskWindow::Settings(w) => w,
        }
    }

    fn set_focused(&mut self, focused: bool) {
        match self {
            DeskWindow::Login(w) => w.set_focused(focused),
            DeskWindow::Settings(w) => w.set_focused(focused),
        }
    }

    /// Where the window sits on the desktop.
    fn area(&self, desktop: Rect) -> Rect {
        match self {
            DeskWindow::Login(_) => centered_rect_fixed(desktop, 52, 22),
            DeskWindow::Settings(_) => desktop.inner(Margin::new(2, 1)),
        }
    }
}

pub struct Desk {
    client: RpcClient,
    registry: WindowRegistry,
    window_events: UnboundedReceiver<WindowEvent>,
    windows: Vec<DeskWindow>,
    taskbar: Taskbar,
    alert: Option<AlertPopup>,
    cells: CellMetrics,
    start: StartMode,
    desktop: Rect,
    should_quit: bool,
    action_tx: UnboundedSender<Action>,
    action_rx: UnboundedReceiver<Action>,
}

impl Desk {
    pub fn new(client: RpcClient, cells: CellMetrics, start: StartMode) -> Self {
        let mut registry = WindowRegistry::new();
        let (_, window_events) = registry.subscribe();
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        Self {
            client,
            registry,
            window_events,
            windows: Vec::new(),
            taskbar: Taskbar::new(),
            alert: None,
            cells,
            start,
            desktop: Rect::new(0, 0, 80, 23),
            should_quit: false,
            action_tx,
            action_rx,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        self.open_start_window();

        loop {
            if let Some(event) = tui.next().await {
                self.handle_event(event)?;
            }

            while let Ok(action) = self.action_rx.try_recv() {
                if !action.is_periodic() {
                    debug!("{action:?}");
                }
                match action {
                    Action::Render => self.render(&mut tui)?,
                    Action::Resize(w, h) => {
                        tui.resize(Rect::new(0, 0, w, h))?;
                        self.render(&mut tui)?;
                    }
                    action => self.update(action)?,
                }
            }
            self.sync_taskbar();

            if self.should_quit {
                break;
            }
        }
        tui.exit()?;
        Ok(())
    }

    fn render(&mut self, tui: &mut Tui) -> Result<()> {
        let mut result = Ok(());
        tui.draw(|f| result = self.draw(f))?;
        result
    }

    fn open_start_window(&mut self) {
        match self.start {
            StartMode::Login => self.open_login_window(),
            StartMode::Guest => self.send(Action::Login(LoginRequest::Guest)),
        }
        self.sync_taskbar();
    }

    fn open_login_window(&mut self) {
        let id = self.registry.register("Login");
        self.windows.push(DeskWindow::Login(LoginWindow::new(id, self.cells)));
    }

    fn send(&self, action: Action) {
        self.action_tx.send(action).ok();
    }

    /// Forward a component's answer; true when the event was consumed.
    fn respond(&self, response: Option<EventResponse<Action>>) -> bool {
        match response {
            Some(EventResponse::Continue(action)) => {
                self.send(action);
                false
            }
            Some(EventResponse::Stop(action)) => {
                self.send(action);
                true
            }
            None => false,
        }
    }

    fn handle_event(&mut self, event: Event) -> Result<()> {
        let periodic = match event {
            Event::Tick => Some(Action::Tick),
            Event::Render => Some(Action::Render),
            Event::Resize(w, h) => Some(Action::Resize(w, h)),
            Event::Key(_) | Event::Mouse(_) | Event::Paste(_) => None,
            _ => return Ok(()),
        };
        if let Some(action) = periodic {
            self.send(action);
            return Ok(());
        }

        if let Some(alert) = self.alert.as_mut() {
            let response = alert.handle_events(&event)?;
            self.respond(response);
            return Ok(());
        }

        let response = self.taskbar.handle_events(&event)?;
        if self.respond(response) {
            return Ok(());
        }

        if let Some(window) = self.active_window_mut() {
            let response = window.component().handle_events(&event)?;
            if self.respond(response) {
                return Ok(());
            }
        }

        if let Event::Key(key) = event {
            if let Some(action) = global_key(key) {
                self.send(action);
            }
        }
        Ok(())
    }

    fn active_window_mut(&mut self) -> Option<&mut DeskWindow> {
        let active = self.registry.active()?;
        if !self.registry.is_visible(active).unwrap_or(false) {
            return None;
        }
        self.windows.iter_mut().find(|w| w.id() == active)
    }

    fn sync_taskbar(&mut self) {
        while let Ok(event) = self.window_events.try_recv() {
            self.taskbar.apply(&event);
        }
    }

    fn report(&mut self, err: &FormError) {
        warn!(error = %err, "{}", err.category());
        self.send(Action::error(err));
    }

    fn close_window(&mut self, id: WindowId) {
        if !self.windows.iter().any(|w| w.id() == id) {
            debug!(window = %id, "window already closed");
            return;
        }
        self.windows.retain(|w| w.id() != id);
        if let Err(e) = self.registry.unregister(id) {
            self.report(&FormError::from(e));
        }
    }

    fn login_window_mut(&mut self) -> Option<&mut LoginWindow> {
        self.windows.iter_mut().find_map(|w| match w {
            DeskWindow::Login(login) => Some(login),
            DeskWindow::Settings(_) => None,
        })
    }

    fn settings_window_mut(&mut self, id: WindowId) -> Option<&mut SettingsWindow> {
        self.windows.iter_mut().find_map(|w| match w {
            DeskWindow::Settings(settings) if settings.id() == id => Some(settings),
            _ => None,
        })
    }

    pub fn update(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Tick | Action::Render | Action::Resize(..) => {}
            Action::Quit => self.should_quit = true,
            Action::Alert { title, message } => self.alert = Some(AlertPopup::new(title, message)),
            Action::CloseAlert => self.alert = None,
            Action::MinimizeActive => {
                if let Some(id) = self.registry.active() {
                    if let Err(e) = self.registry.minimize(id) {
                        self.report(&FormError::from(e));
                    }
                }
            }
            Action::CycleWindows => {
                let ids: Vec<WindowId> = self.windows.iter().map(DeskWindow::id).collect();
                let next = match self.registry.active().and_then(|a| ids.iter().position(|id| *id == a)) {
                    Some(i) => ids.get((i + 1) % ids.len()),
                    None => ids.first(),
                };
                if let Some(id) = next.copied() {
                    self.send(Action::ActivateWindow(id));
                }
            }
            Action::ActivateWindow(id) => {
                if let Err(e) = self.registry.activate(id) {
                    self.report(&FormError::from(e));
                }
            }
            Action::CloseWindow(id) => {
                self.close_window(id);
                if self.windows.is_empty() {
                    info!("last window closed");
                    self.should_quit = true;
                }
            }
            Action::Login(request) => {
                let client = self.client.clone();
                let tx = self.action_tx.clone();
                tokio::spawn(async move {
                    let result = request.perform(&client).await;
                    tx.send(Action::LoginFinished { request, result }).ok();
                });
            }
            Action::LoginFinished { request, result } => self.login_finished(request, result),
            Action::OpenSettings => {
                let client = self.client.clone();
                let tx = self.action_tx.clone();
                let size = self.cells.size_of(self.desktop.inner(Margin::new(3, 2)));
                tokio::spawn(async move {
                    let result = SettingsForm::open(&client, size).await.map(Box::new);
                    tx.send(Action::SettingsOpened(result)).ok();
                });
            }
            Action::SettingsOpened(Ok(form)) => {
                let id = self.registry.register(form.title());
                info!(window = %id, fields = form.fields().len(), "settings window opened");
                self.windows
                    .push(DeskWindow::Settings(SettingsWindow::new(id, *form, self.cells)));
            }
            Action::SettingsOpened(Err(e)) => self.report(&e),
            Action::Save { window, values, close } => {
                let client = self.client.clone();
                let tx = self.action_tx.clone();
                tokio::spawn(async move {
                    let result = client.save_settings(values).await;
                    tx.send(Action::SaveFinished { window, close, result }).ok();
                });
            }
            Action::SaveFinished { window, close, result } => {
                let Some(settings) = self.settings_window_mut(window) else {
                    // The window went away under a racing save; its result still counts.
                    match result {
                        Ok(()) => debug!(%window, "save finished after its window closed"),
                        Err(e) => self.report(&FormError::from(e)),
                    }
                    return Ok(());
                };
                match settings.finish_save(result, close) {
                    SaveOutcome::Saved { close: true } => self.send(Action::CloseWindow(window)),
                    SaveOutcome::Saved { close: false } => {}
                    SaveOutcome::Failed(e) => self.report(&e),
                }
            }
        }
        Ok(())
    }

    fn login_finished(&mut self, request: LoginRequest, result: Result<(), FormError>) {
        match (result, &request) {
            (Ok(()), LoginRequest::CreateUser { username, .. }) => {
                info!(user = %username, "account created");
                let message = format!("You can now log in as {username}.");
                if let Some(login) = self.login_window_mut() {
                    login.account_created();
                }
                self.send(Action::alert("Account created", message));
            }
            (Ok(()), _) => {
                info!(user = request.user_name().unwrap_or("guest"), "session started");
                let login = self.login_window_mut().map(|w| w.id());
                if let Some(id) = login {
                    self.close_window(id);
                }
                self.send(Action::OpenSettings);
            }
            (Err(e), _) => {
                if let Some(login) = self.login_window_mut() {
                    login.failed();
                }
                self.report(&e);
            }
        }
    }

    pub fn draw(&mut self, f: &mut Frame<'_>) -> Result<()> {
        let [desktop, bar] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(f.area());
        self.desktop = desktop;
        f.render_widget(Block::default().style(Style::default().bg(Color::Blue)), desktop);

        let active = self
            .registry
            .active()
            .filter(|id| self.registry.is_visible(*id).unwrap_or(false));
        let mut drawn = false;
        for window in &mut self.windows {
            let focused = Some(window.id()) == active && self.alert.is_none();
            window.set_focused(focused);
            if Some(window.id()) == active {
                let area = window.area(desktop);
                window.component().draw(f, area)?;
                drawn = true;
            }
        }
        if !drawn {
            let hint = if self.windows.is_empty() {
                "No open windows. Ctrl+C quits."
            } else {
                "All windows minimized. F6 or a taskbar click brings one back."
            };
            let line = Rect::new(desktop.x, desktop.y + desktop.height / 2, desktop.width, 1);
            f.render_widget(
                Paragraph::new(hint)
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(Color::White).bg(Color::Blue)),
                line.intersection(desktop),
            );
        }

        self.taskbar.draw(f, bar)?;

        if let Some(alert) = self.alert.as_mut() {
            render_backdrop(f, desktop);
            alert.draw(f, desktop)?;
        }
        Ok(())
    }
}

fn global_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Quit),
        KeyCode::F(5) => Some(Action::MinimizeActive),
        KeyCode::F(6) => Some(Action::CycleWindows),
        _ => None,
    }
}
