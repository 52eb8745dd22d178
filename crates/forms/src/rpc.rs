//! Typed client over the request/response collaborator.
//!
//! The wire contract is `(appName, method, params) -> result | {error}`. A
//! resolved value with a non-null `error` key and a failed call take the same
//! path: the caller gets an [`RpcError`], shows it and leaves its state alone.
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::errors::{RpcError, TransportError};
use crate::schema::{FieldDescriptor, normalize_value, value_text};

pub mod methods {
    pub const GET_SETTINGS: &str = "getSettings";
    pub const SAVE_SETTINGS: &str = "saveSettings";
    pub const LOGIN: &str = "login";
    pub const CREATE_USER: &str = "createUser";
    pub const LOGIN_AS_GUEST: &str = "loginAsGuest";
}

/// Carries one call to the application backend.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn call(&self, app: &str, method: &str, params: Value) -> Result<Value, TransportError>;
}

/// Response of `getSettings`, already normalized.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPayload {
    pub user_name: Option<String>,
    pub fields: Vec<FieldDescriptor>,
}

#[derive(Clone)]
pub struct RpcClient {
    transport: Arc<dyn RpcTransport>,
    app_name: String,
}

impl fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcClient")
            .field("app_name", &self.app_name)
            .finish_non_exhaustive()
    }
}

impl RpcClient {
    pub fn new(transport: Arc<dyn RpcTransport>, app_name: impl Into<String>) -> Self {
        Self {
            transport,
            app_name: app_name.into(),
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub async fn get_settings(&self) -> Result<SettingsPayload, RpcError> {
        let response = self.call(methods::GET_SETTINGS, json!({})).await?;
        let Value::Object(body) = response else {
            return Err(RpcError::Malformed {
                method: methods::GET_SETTINGS.into(),
                reason: "expected an object".into(),
            });
        };
        let fields = normalize_value(body.get("fields").unwrap_or(&Value::Null));
        let user_name = body
            .get("userName")
            .and_then(Value::as_str)
            .map(str::to_string);
        info!(app = %self.app_name, fields = fields.len(), "settings loaded");
        Ok(SettingsPayload { user_name, fields })
    }

    pub async fn save_settings(&self, values: Map<String, Value>) -> Result<(), RpcError> {
        let count = values.len();
        self.call(methods::SAVE_SETTINGS, Value::Object(values)).await?;
        info!(app = %self.app_name, fields = count, "settings saved");
        Ok(())
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<(), RpcError> {
        let params = json!({ "username": username, "password": password });
        self.call_success(methods::LOGIN, params).await
    }

    pub async fn create_user(&self, username: &str, password: &str) -> Result<(), RpcError> {
        let params = json!({ "username": username, "password": password });
        self.call_success(methods::CREATE_USER, params).await
    }

    pub async fn login_as_guest(&self) -> Result<(), RpcError> {
        self.call_success(methods::LOGIN_AS_GUEST, json!({})).await
    }

    /// Call a method whose response must carry `success: true`.
    async fn call_success(&self, method: &str, params: Value) -> Result<(), RpcError> {
        let response = self.call(method, params).await?;
        if response.get("success").and_then(Value::as_bool) == Some(true) {
            info!(app = %self.app_name, method, "call succeeded");
            Ok(())
        } else {
            warn!(app = %self.app_name, method, "call rejected");
            Err(RpcError::Rejected {
                method: method.to_string(),
            })
        }
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        debug!(app = %self.app_name, method, "rpc call");
        let response = self
            .transport
            .call(&self.app_name, method, params)
            .await
            .inspect_err(|e| warn!(app = %self.app_name, method, error = %e, "transport failure"))?;
        check_error(response)
    }
}

/// Lift an `{ error }` response into [`RpcError::Server`].
fn check_error(response: Value) -> Result<Value, RpcError> {
    match response.get("error") {
        None | Some(Value::Null) => Ok(response),
        Some(message) => {
            let text = value_text(message);
            warn!(error = %text, "server reported an error");
            Err(RpcError::Server(text))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Replays canned responses and records calls.
    struct Canned {
        response: Result<Value, TransportError>,
        calls: Mutex<Vec<(String, String, Value)>>,
    }

    impl Canned {
        fn client(response: Result<Value, TransportError>) -> (RpcClient, Arc<Canned>) {
            let canned = Arc::new(Canned {
                response,
                calls: Mutex::new(Vec::new()),
            });
            (RpcClient::new(canned.clone(), "demo"), canned)
        }
    }

    #[async_trait]
    impl RpcTransport for Canned {
        async fn call(
            &self,
            app: &str,
            method: &str,
            params: Value,
        ) -> Result<Value, TransportError> {
            self.calls
                .lock()
                .unwrap()
                .push((app.into(), method.into(), params));
            self.response.clone()
        }
    }

    #[tokio::test]
    async fn get_settings_normalizes_fields() {
        let (client, canned) = Canned::client(Ok(json!({
            "userName": "ada",
            "fields": [
                { "name": "theme", "typeId": "Enum", "options": ["Light", "Dark"], "value": "Dark" },
                { "name": "" },
            ],
        })));
        let payload = client.get_settings().await.unwrap();
        assert_eq!(payload.user_name.as_deref(), Some("ada"));
        assert_eq!(payload.fields.len(), 1);
        let calls = canned.calls.lock().unwrap();
        assert_eq!(calls[0].0, "demo");
        assert_eq!(calls[0].1, methods::GET_SETTINGS);
    }

    #[tokio::test]
    async fn error_key_and_transport_failure_both_fail() {
        let (client, _) = Canned::client(Ok(json!({ "error": "disk full" })));
        assert_eq!(
            client.save_settings(Map::new()).await,
            Err(RpcError::Server("disk full".into()))
        );

        let (client, _) = Canned::client(Err(TransportError::Unavailable("down".into())));
        assert!(matches!(
            client.save_settings(Map::new()).await,
            Err(RpcError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn null_error_is_success() {
        let (client, _) = Canned::client(Ok(json!({ "error": null })));
        assert_eq!(client.save_settings(Map::new()).await, Ok(()));
    }

    #[tokio::test]
    async fn success_false_without_message_is_rejected() {
        let (client, canned) = Canned::client(Ok(json!({ "success": false })));
        assert_eq!(
            client.login("ada", "pw").await,
            Err(RpcError::Rejected {
                method: methods::LOGIN.into()
            })
        );
        let calls = canned.calls.lock().unwrap();
        assert_eq!(calls[0].2, json!({ "username": "ada", "password": "pw" }));
    }

    #[tokio::test]
    async fn non_object_settings_are_malformed() {
        let (client, _) = Canned::client(Ok(json!([1, 2])));
        assert!(matches!(
            client.get_settings().await,
            Err(RpcError::Malformed { .. })
        ));
    }
}
