//! In-process implementation of the application backend.
//!
//! [`LocalBackend`] answers the five form calls (`getSettings`,
//! `saveSettings`, `login`, `createUser`, `loginAsGuest`) for a single
//! application. Accounts live in a JSON users file with argon2 hashes, setting
//! values in a JSON settings file. Either file is optional; without one the
//! data only lives as long as the backend.
//!
//! Failures never surface as transport errors: they are answered with an
//! `{ "error": ... }` value, the same way a remote backend would.

pub mod backend;
pub mod errors;
pub mod schema;
pub mod store;
pub mod users;

pub use backend::{BackendOptions, LocalBackend, Session};
pub use errors::BackendError;
pub use schema::{default_schema, load_schema};
pub use store::SettingsStore;
pub use users::UserStore;
