use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use forms::rpc::methods;
use forms::{FieldDescriptor, RpcTransport, TransportError};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::errors::BackendError;
use crate::schema::default_schema;
use crate::store::SettingsStore;
use crate::users::UserStore;

/// Guest sessions report this as their user name.
pub const GUEST_NAME: &str = "guest";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    User(String),
    Guest,
}

impl Session {
    pub fn user_name(&self) -> &str {
        match self {
            Session::User(name) => name,
            Session::Guest => GUEST_NAME,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BackendOptions {
    pub users_file: Option<PathBuf>,
    pub settings_file: Option<PathBuf>,
    pub schema: Vec<FieldDescriptor>,
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            users_file: None,
            settings_file: None,
            schema: default_schema(),
        }
    }
}

#[derive(Debug)]
struct State {
    users: UserStore,
    settings: SettingsStore,
    session: Option<Session>,
}

/// Backend serving a single application name. Clones share one state.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    app_name: String,
    state: Arc<Mutex<State>>,
}

impl LocalBackend {
    pub fn new(app_name: impl Into<String>, options: BackendOptions) -> Result<Self, BackendError> {
        let users = match options.users_file {
            Some(path) => UserStore::open(path)?,
            None => UserStore::in_memory(),
        };
        let settings = match options.settings_file {
            Some(path) => SettingsStore::open(options.schema, path)?,
            None => SettingsStore::in_memory(options.schema),
        };
        let app_name = app_name.into();
        info!(app = %app_name, users = users.len(), "local backend ready");
        Ok(Self {
            app_name,
            state: Arc::new(Mutex::new(State {
                users,
                settings,
                session: None,
            })),
        })
    }

    pub fn in_memory(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            state: Arc::new(Mutex::new(State {
                users: UserStore::in_memory(),
                settings: SettingsStore::in_memory(default_schema()),
                session: None,
            })),
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn session(&self) -> Option<Session> {
        self.lock().ok().and_then(|s| s.session.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, TransportError> {
        self.state
            .lock()
            .map_err(|_| TransportError::Failed("backend state poisoned".into()))
    }

    /// Answer one call. Application-level failures become `{ error }` values.
    pub fn handle(&self, app: &str, method: &str, params: Value) -> Result<Value, TransportError> {
        if app != self.app_name {
            warn!(app, "call for unknown application");
            return Ok(json!({ "error": format!("Unknown application '{app}'") }));
        }
        let mut state = self.lock()?;
        debug!(method, "handling call");
        let result = match method {
            methods::GET_SETTINGS => Ok(get_settings(&state)),
            methods::SAVE_SETTINGS => state.settings.save(&params).map(|_| json!({})),
            methods::LOGIN => login(&mut state, &params),
            methods::CREATE_USER => create_user(&mut state, &params),
            methods::LOGIN_AS_GUEST => {
                state.session = Some(Session::Guest);
                info!("guest session started");
                Ok(json!({ "success": true }))
            }
            other => Err(BackendError::invalid(format!("Unknown method '{other}'"))),
        };
        Ok(result.unwrap_or_else(|e| {
            warn!(method, error = %e, "call failed");
            json!({ "success": false, "error": e.to_string() })
        }))
    }
}

/// Calls run on the blocking pool: password hashing takes long enough to
/// stall a single-threaded UI runtime.
#[async_trait]
impl RpcTransport for LocalBackend {
    async fn call(&self, app: &str, method: &str, params: Value) -> Result<Value, TransportError> {
        let backend = self.clone();
        let (app, method) = (app.to_string(), method.to_string());
        tokio::task::spawn_blocking(move || backend.handle(&app, &method, params))
            .await
            .map_err(|e| TransportError::Failed(format!("backend task failed: {e}")))?
    }
}

fn get_settings(state: &State) -> Value {
    json!({
        "userName": state.session.as_ref().map(Session::user_name),
        "fields": state.settings.fields(),
    })
}

fn credentials(params: &Value) -> (&str, &str) {
    (str_param(params, "username"), str_param(params, "password"))
}

fn str_param<'a>(params: &'a Value, key: &str) -> &'a str {
    params.get(key).and_then(Value::as_str).unwrap_or("")
}

fn login(state: &mut State, params: &Value) -> Result<Value, BackendError> {
    let (username, password) = credentials(params);
    if !state.users.verify(username, password)? {
        return Err(BackendError::invalid("Invalid username or password"));
    }
    let username = username.trim().to_string();
    info!(user = %username, "user logged in");
    state.session = Some(Session::User(username));
    Ok(json!({ "success": true }))
}

fn create_user(state: &mut State, params: &Value) -> Result<Value, BackendError> {
    let (username, password) = credentials(params);
    state.users.create(username, password)?;
    Ok(json!({ "success": true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unknown_app_and_method_answer_with_error() {
        let backend = LocalBackend::in_memory("demo");
        let wrong_app = backend.handle("other", methods::GET_SETTINGS, json!({})).unwrap();
        assert!(wrong_app.get("error").is_some());
        let wrong_method = backend.handle("demo", "dropTables", json!({})).unwrap();
        assert_eq!(
            wrong_method.get("error"),
            Some(&json!("Unknown method 'dropTables'"))
        );
    }

    #[test]
    fn guest_session_reports_guest_name() {
        let backend = LocalBackend::in_memory("demo");
        backend.handle("demo", methods::LOGIN_AS_GUEST, json!({})).unwrap();
        assert_eq!(backend.session(), Some(Session::Guest));
        let settings = backend.handle("demo", methods::GET_SETTINGS, json!({})).unwrap();
        assert_eq!(settings.get("userName"), Some(&json!(GUEST_NAME)));
    }
}
