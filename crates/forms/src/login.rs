//! Login form controller (proportional layout).
//!
//! Rows, top to bottom: username, password, confirm (account creation only)
//! and a button row. Switching modes shows or hides the confirm rows and
//! recomputes the whole layout.
use strum::Display;
use tracing::{debug, info};

use crate::errors::FormError;
use crate::layout::proportional::{
    self, ProportionalGeometry, ProportionalMinimums, RowKind, RowSpec,
};
use crate::layout::{LayoutTrigger, Size};
use crate::rpc::RpcClient;
use crate::settings_form::require_app_name;

pub mod rows {
    pub const USERNAME_LABEL: &str = "username_label";
    pub const USERNAME: &str = "username";
    pub const PASSWORD_LABEL: &str = "password_label";
    pub const PASSWORD: &str = "password";
    pub const CONFIRM_LABEL: &str = "confirm_label";
    pub const CONFIRM: &str = "confirm";
    pub const BUTTONS: &str = "buttons";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum LoginMode {
    Login,
    CreateAccount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoginField {
    Username,
    Password,
    Confirm,
}

impl LoginField {
    pub fn row(self) -> &'static str {
        match self {
            LoginField::Username => rows::USERNAME,
            LoginField::Password => rows::PASSWORD,
            LoginField::Confirm => rows::CONFIRM,
        }
    }
}

/// Buttons of the bottom row, left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoginButton {
    Submit,
    ToggleMode,
    Guest,
}

pub const LOGIN_BUTTONS: [LoginButton; 3] =
    [LoginButton::Submit, LoginButton::ToggleMode, LoginButton::Guest];

/// A validated request, ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginRequest {
    Login { username: String, password: String },
    CreateUser { username: String, password: String },
    Guest,
}

impl LoginRequest {
    pub async fn perform(&self, client: &RpcClient) -> Result<(), FormError> {
        require_app_name(client.app_name())?;
        match self {
            LoginRequest::Login { username, password } => {
                client.login(username, password).await?
            }
            LoginRequest::CreateUser { username, password } => {
                client.create_user(username, password).await?
            }
            LoginRequest::Guest => client.login_as_guest().await?,
        }
        Ok(())
    }

    /// Name the session runs under once the request succeeds.
    pub fn user_name(&self) -> Option<&str> {
        match self {
            LoginRequest::Login { username, .. } | LoginRequest::CreateUser { username, .. } => {
                Some(username)
            }
            LoginRequest::Guest => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginForm {
    mode: LoginMode,
    username: String,
    password: String,
    confirm: String,
    focus: LoginField,
    size: Size,
    minimums: ProportionalMinimums,
    geometry: ProportionalGeometry,
}

impl LoginForm {
    pub fn new(size: Size) -> Self {
        Self::with_minimums(size, ProportionalMinimums::default())
    }

    pub fn with_minimums(size: Size, minimums: ProportionalMinimums) -> Self {
        let mode = LoginMode::Login;
        let geometry = proportional::layout(&row_specs(mode), size, &minimums);
        Self {
            mode,
            username: String::new(),
            password: String::new(),
            confirm: String::new(),
            focus: LoginField::Username,
            size,
            minimums,
            geometry,
        }
    }

    pub fn mode(&self) -> LoginMode {
        self.mode
    }

    pub fn title(&self) -> &'static str {
        match self.mode {
            LoginMode::Login => "Login",
            LoginMode::CreateAccount => "Create account",
        }
    }

    pub fn button_label(&self, button: LoginButton) -> &'static str {
        match (button, self.mode) {
            (LoginButton::Submit, LoginMode::Login) => "Login",
            (LoginButton::Submit, LoginMode::CreateAccount) => "Create",
            (LoginButton::ToggleMode, LoginMode::Login) => "New account",
            (LoginButton::ToggleMode, LoginMode::CreateAccount) => "Back",
            (LoginButton::Guest, _) => "Guest",
        }
    }

    pub fn value(&self, field: LoginField) -> &str {
        match field {
            LoginField::Username => &self.username,
            LoginField::Password => &self.password,
            LoginField::Confirm => &self.confirm,
        }
    }

    pub fn set_value(&mut self, field: LoginField, value: impl Into<String>) {
        let value = value.into();
        match field {
            LoginField::Username => self.username = value,
            LoginField::Password => self.password = value,
            LoginField::Confirm => self.confirm = value,
        }
    }

    pub fn focus(&self) -> LoginField {
        self.focus
    }

    /// Fields the user can currently reach, in tab order.
    pub fn visible_fields(&self) -> &'static [LoginField] {
        match self.mode {
            LoginMode::Login => &[LoginField::Username, LoginField::Password],
            LoginMode::CreateAccount => {
                &[LoginField::Username, LoginField::Password, LoginField::Confirm]
            }
        }
    }

    pub fn focus_next(&mut self, dir: i32) {
        let fields = self.visible_fields();
        let cur = fields.iter().position(|f| *f == self.focus).unwrap_or(0) as i32;
        let next = (cur + dir).rem_euclid(fields.len() as i32) as usize;
        self.focus = fields[next];
    }

    pub fn set_focus(&mut self, field: LoginField) {
        if self.visible_fields().contains(&field) {
            self.focus = field;
        }
    }

    // --- Layout --------------------------------------------------------------------------------

    pub fn geometry(&self) -> &ProportionalGeometry {
        &self.geometry
    }

    pub fn resize(&mut self, size: Size, trigger: LayoutTrigger) {
        self.size = size;
        self.relayout(trigger);
    }

    fn relayout(&mut self, trigger: LayoutTrigger) {
        self.geometry = proportional::layout(&row_specs(self.mode), self.size, &self.minimums);
        debug!(%trigger, mode = %self.mode, scale = self.geometry.metrics.scale, "login relayout");
    }

    /// Button under a point in container coordinates.
    pub fn button_at(&self, x: i32, y: i32) -> Option<LoginButton> {
        let row = self.geometry.row(rows::BUTTONS)?;
        row.cells
            .iter()
            .position(|cell| cell.contains(x, y))
            .and_then(|i| LOGIN_BUTTONS.get(i).copied())
    }

    // --- Actions -------------------------------------------------------------------------------

    /// Switch between logging in and creating an account. Passwords are
    /// cleared, the username is kept.
    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            LoginMode::Login => LoginMode::CreateAccount,
            LoginMode::CreateAccount => LoginMode::Login,
        };
        self.password.clear();
        self.confirm.clear();
        if !self.visible_fields().contains(&self.focus) {
            self.focus = LoginField::Username;
        }
        info!(mode = %self.mode, "login mode changed");
        self.relayout(LayoutTrigger::VisibilityChanged);
    }

    /// Validate the inputs into a request. Nothing is sent from here, so a
    /// rejected submit never reaches the network.
    pub fn submit(&self) -> Result<LoginRequest, FormError> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(FormError::Validation("Username must not be empty".into()));
        }
        if self.password.is_empty() {
            return Err(FormError::Validation("Password must not be empty".into()));
        }
        match self.mode {
            LoginMode::Login => Ok(LoginRequest::Login {
                username: username.to_string(),
                password: self.password.clone(),
            }),
            LoginMode::CreateAccount => {
                if self.password != self.confirm {
                    return Err(FormError::Validation("Passwords do not match".into()));
                }
                Ok(LoginRequest::CreateUser {
                    username: username.to_string(),
                    password: self.password.clone(),
                })
            }
        }
    }

    pub fn guest(&self) -> LoginRequest {
        LoginRequest::Guest
    }

    /// Drop secrets after a failed attempt.
    pub fn clear_passwords(&mut self) {
        self.password.clear();
        self.confirm.clear();
        self.focus = LoginField::Password;
    }

    /// After an account was created, continue with a plain login.
    pub fn account_created(&mut self) {
        self.mode = LoginMode::Login;
        self.clear_passwords();
        self.relayout(LayoutTrigger::VisibilityChanged);
    }
}

fn row_specs(mode: LoginMode) -> Vec<RowSpec> {
    let hide_confirm = mode != LoginMode::CreateAccount;
    vec![
        RowSpec::new(rows::USERNAME_LABEL, RowKind::Label),
        RowSpec::new(rows::USERNAME, RowKind::Input),
        RowSpec::new(rows::PASSWORD_LABEL, RowKind::Label),
        RowSpec::new(rows::PASSWORD, RowKind::Input),
        RowSpec::new(rows::CONFIRM_LABEL, RowKind::Label).hidden(hide_confirm),
        RowSpec::new(rows::CONFIRM, RowKind::Input).hidden(hide_confirm),
        RowSpec::new(rows::BUTTONS, RowKind::Buttons(LOGIN_BUTTONS.len())),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn filled(mode_create: bool) -> LoginForm {
        let mut form = LoginForm::new(Size::new(320, 200));
        if mode_create {
            form.toggle_mode();
        }
        form.set_value(LoginField::Username, " ada ");
        form.set_value(LoginField::Password, "secret");
        form
    }

    #[test]
    fn confirm_row_only_in_create_mode() {
        let mut form = LoginForm::new(Size::new(320, 200));
        assert!(form.geometry().row(rows::CONFIRM).is_none());
        form.toggle_mode();
        assert!(form.geometry().row(rows::CONFIRM).is_some());
        assert!(form.geometry().row(rows::CONFIRM_LABEL).is_some());
        form.toggle_mode();
        assert!(form.geometry().row(rows::CONFIRM).is_none());
    }

    #[test]
    fn mismatched_passwords_rejected_locally() {
        let mut form = filled(true);
        form.set_value(LoginField::Confirm, "other");
        assert_eq!(
            form.submit(),
            Err(FormError::Validation("Passwords do not match".into()))
        );
        form.set_value(LoginField::Confirm, "secret");
        assert_eq!(
            form.submit(),
            Ok(LoginRequest::CreateUser {
                username: "ada".into(),
                password: "secret".into()
            })
        );
    }

    #[test]
    fn empty_inputs_are_rejected() {
        let mut form = LoginForm::new(Size::new(320, 200));
        assert!(matches!(form.submit(), Err(FormError::Validation(_))));
        form.set_value(LoginField::Username, "ada");
        assert!(matches!(form.submit(), Err(FormError::Validation(_))));
    }

    #[test]
    fn focus_cycles_over_visible_fields() {
        let mut form = LoginForm::new(Size::new(320, 200));
        form.focus_next(1);
        assert_eq!(form.focus(), LoginField::Password);
        form.focus_next(1);
        assert_eq!(form.focus(), LoginField::Username);
        form.set_focus(LoginField::Confirm);
        assert_eq!(form.focus(), LoginField::Username);
        form.toggle_mode();
        form.focus_next(-1);
        assert_eq!(form.focus(), LoginField::Confirm);
    }

    #[test]
    fn toggle_keeps_username_and_clears_passwords() {
        let mut form = filled(false);
        form.toggle_mode();
        assert_eq!(form.value(LoginField::Username), " ada ");
        assert_eq!(form.value(LoginField::Password), "");
        assert_eq!(form.button_label(LoginButton::Submit), "Create");
    }

    #[test]
    fn button_row_hit_testing() {
        let form = LoginForm::new(Size::new(320, 200));
        let cells = form
            .geometry()
            .row(rows::BUTTONS)
            .map(|r| r.cells.clone())
            .unwrap_or_default();
        let last = cells[2];
        assert_eq!(form.button_at(last.x, last.y), Some(LoginButton::Guest));
        assert_eq!(form.button_at(0, 0), None);
    }
}
