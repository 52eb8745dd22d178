use forms::{FormError, LoginRequest, RpcError, SettingsForm, WindowId};
use serde_json::{Map, Value};
use strum::Display;

/// Everything that flows through the app's action channel, including the
/// completions of spawned RPC tasks.
#[derive(Debug, Clone, Display)]
pub enum Action {
    Tick,
    Render,
    Resize(u16, u16),
    Quit,
    /// Show a blocking notification.
    Alert { title: String, message: String },
    CloseAlert,
    // Window management
    MinimizeActive,
    CycleWindows,
    ActivateWindow(WindowId),
    CloseWindow(WindowId),
    // Login
    Login(LoginRequest),
    LoginFinished {
        request: LoginRequest,
        result: Result<(), FormError>,
    },
    // Settings
    OpenSettings,
    SettingsOpened(Result<Box<SettingsForm>, FormError>),
    Save {
        window: WindowId,
        values: Map<String, Value>,
        close: bool,
    },
    SaveFinished {
        window: WindowId,
        close: bool,
        result: Result<(), RpcError>,
    },
}

impl Action {
    /// Actions too frequent to be worth a log line.
    pub fn is_periodic(&self) -> bool {
        matches!(self, Action::Tick | Action::Render)
    }

    pub fn alert(title: impl Into<String>, message: impl Into<String>) -> Self {
        Action::Alert {
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(err: &FormError) -> Self {
        Action::alert(err.category(), err.to_string())
    }
}
