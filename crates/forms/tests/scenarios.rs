//! End-to-end form scenarios against a scripted transport.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use forms::layout::LayoutTrigger;
use forms::login::LoginField;
use forms::rpc::methods;
use forms::{
    FooterButton, FormCommand, FormError, LoginForm, RpcClient, RpcError, RpcTransport,
    SaveOutcome, SettingsForm, Size, TransportError, WidgetVariant,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

/// Answers `getSettings` with a fixed schema and records every other call.
/// Saves sleep for a decreasing delay, so later saves overtake earlier ones;
/// a save whose `fail` flag is set answers with an error.
#[derive(Default)]
struct Scripted {
    calls: Mutex<Vec<(String, Value)>>,
    saves: AtomicUsize,
}

#[async_trait]
impl RpcTransport for Scripted {
    async fn call(&self, _app: &str, method: &str, params: Value) -> Result<Value, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), params.clone()));
        match method {
            methods::GET_SETTINGS => Ok(json!({
                "userName": "ada",
                "fields": [
                    { "name": "theme", "displayName": "Theme", "typeId": "Enum",
                      "options": ["Light", "Dark", "System"], "value": "Dark" },
                    { "name": "age", "displayName": "Age", "typeId": "Number", "value": 30 },
                    { "name": "lang", "typeId": "Enum",
                      "options": ["en", "de", "fr", "es"], "value": "pt" },
                ],
            })),
            methods::SAVE_SETTINGS => {
                let n = self.saves.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(40u64.saturating_sub(n as u64 * 30))).await;
                if params.get("fail").is_some() {
                    Ok(json!({ "error": "rejected by server" }))
                } else {
                    Ok(json!({}))
                }
            }
            methods::LOGIN => Err(TransportError::Unavailable("backend offline".into())),
            _ => Ok(json!({ "success": true })),
        }
    }
}

fn client(transport: &Arc<Scripted>, app: &str) -> RpcClient {
    RpcClient::new(transport.clone(), app)
}

#[tokio::test]
async fn theme_radio_round_trips_dark() {
    let transport = Arc::new(Scripted::default());
    let form = SettingsForm::open(&client(&transport, "demo"), Size::new(480, 320))
        .await
        .unwrap();

    let theme = form.binding("theme").unwrap();
    assert_eq!(theme.variant(), WidgetVariant::RadioGroup);
    assert_eq!(theme.selected_option(), Some("Dark"));
    assert_eq!(form.collect().get("theme"), Some(&json!("Dark")));
    assert_eq!(form.title(), "demo Settings (ada)");
}

#[tokio::test]
async fn cleared_number_saves_null() {
    let transport = Arc::new(Scripted::default());
    let rpc = client(&transport, "demo");
    let mut form = SettingsForm::open(&rpc, Size::new(480, 320)).await.unwrap();

    form.binding_mut("age").unwrap().set_text("");
    let outcome = form.submit(&rpc, FooterButton::Apply).await;
    assert_eq!(outcome, SaveOutcome::Saved { close: false });

    let calls = transport.calls.lock().unwrap();
    let (method, params) = calls.last().unwrap();
    assert_eq!(method, methods::SAVE_SETTINGS);
    assert_eq!(params.get("age"), Some(&Value::Null));
}

#[tokio::test]
async fn combo_box_with_unknown_value_selects_first() {
    let transport = Arc::new(Scripted::default());
    let form = SettingsForm::open(&client(&transport, "demo"), Size::new(480, 320))
        .await
        .unwrap();
    let lang = form.binding("lang").unwrap();
    assert_eq!(lang.variant(), WidgetVariant::ComboBox);
    assert_eq!(lang.selected_index(), Some(0));
}

#[tokio::test]
async fn opening_without_app_name_is_refused() {
    let transport = Arc::new(Scripted::default());
    let err = SettingsForm::open(&client(&transport, ""), Size::new(480, 320))
        .await
        .unwrap_err();
    assert!(matches!(err, FormError::MissingContext(_)));
    assert!(transport.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn overlapping_applies_each_report_their_own_result() {
    let transport = Arc::new(Scripted::default());
    let rpc = client(&transport, "demo");
    let mut form = SettingsForm::open(&rpc, Size::new(480, 320)).await.unwrap();

    let FormCommand::Save { values: mut first, close: c1 } = form.press(FooterButton::Apply) else {
        panic!("apply saves");
    };
    first.insert("fail".into(), json!(true));
    let FormCommand::Save { values: second, close: c2 } = form.press(FooterButton::Apply) else {
        panic!("apply saves");
    };
    assert_eq!(form.pending_saves(), 2);

    let (r1, r2) = tokio::join!(rpc.save_settings(first), rpc.save_settings(second));
    // The second save resolves first.
    let o2 = form.finish_save(r2, c2);
    let o1 = form.finish_save(r1, c1);

    assert_eq!(o2, SaveOutcome::Saved { close: false });
    assert_eq!(
        o1,
        SaveOutcome::Failed(FormError::Rpc(RpcError::Server("rejected by server".into())))
    );
    assert_eq!(form.pending_saves(), 0);
    assert!(!form.is_closed());
}

#[tokio::test]
async fn mismatched_confirm_never_reaches_the_network() {
    let transport = Arc::new(Scripted::default());
    let mut login = LoginForm::new(Size::new(320, 240));
    login.toggle_mode();
    login.set_value(LoginField::Username, "ada");
    login.set_value(LoginField::Password, "one");
    login.set_value(LoginField::Confirm, "two");

    assert!(matches!(login.submit(), Err(FormError::Validation(_))));
    assert!(transport.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn transport_failure_and_guest_login() {
    let transport = Arc::new(Scripted::default());
    let rpc = client(&transport, "demo");
    let mut login = LoginForm::new(Size::new(320, 240));
    login.set_value(LoginField::Username, "ada");
    login.set_value(LoginField::Password, "pw");

    let request = login.submit().unwrap();
    let err = request.perform(&rpc).await.unwrap_err();
    assert!(matches!(err, FormError::Rpc(RpcError::Transport(_))));

    assert_eq!(login.guest().perform(&rpc).await, Ok(()));
}

#[test]
fn login_relayout_on_resize_is_trigger_independent() {
    let mut a = LoginForm::new(Size::new(300, 200));
    let mut b = a.clone();
    a.resize(Size::new(400, 500), LayoutTrigger::Resizing);
    b.resize(Size::new(400, 500), LayoutTrigger::Resized);
    assert_eq!(a.geometry(), b.geometry());
    assert!(a.geometry().metrics.scale > 1.0);
}
