//! Schema-driven forms.
//!
//! The crate turns a declarative field list into live controls, lays those
//! controls out inside a resizable container and reads typed values back out
//! for persistence. It does not draw anything: front ends receive geometry and
//! control state and render them on whatever surface they own.
//!
//! Pipeline:
//! - [`schema`]   : normalize raw (possibly malformed) field lists
//! - [`control`]  : map each field to a widget variant with live state
//! - [`layout`]   : flow and proportional layout passes
//! - [`codec`]    : extract typed values from the controls
//! - [`registry`] : window lifecycle registry + event subscriptions
//! - [`rpc`]      : typed client over the request/response collaborator
//!
//! [`settings_form`] and [`login`] compose the pieces into the two forms the
//! desk ships with.

pub mod codec;
pub mod control;
pub mod errors;
pub mod layout;
pub mod login;
pub mod registry;
pub mod rpc;
pub mod schema;
pub mod settings_form;

pub use codec::extract_values;
pub use control::{ControlBinding, ControlState, WidgetVariant, create_control, create_controls};
pub use errors::{FormError, RegistryError, RpcError, TransportError};
pub use layout::{LayoutMetrics, LayoutTrigger, Rect, Size};
pub use login::{LoginButton, LoginField, LoginForm, LoginMode, LoginRequest};
pub use registry::{
    SubscriptionId, Visibility, WindowEvent, WindowId, WindowRecord, WindowRegistry,
};
pub use rpc::{RpcClient, RpcTransport, SettingsPayload};
pub use schema::{FieldDescriptor, FieldType, RawField, normalize, normalize_value};
pub use settings_form::{FooterButton, FormCommand, SaveOutcome, SettingsForm};
