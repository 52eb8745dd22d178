use thiserror::Error;

use crate::registry::WindowId;

/// Failure reported by an [`RpcTransport`](crate::rpc::RpcTransport) before
/// any response value exists (connection refused, channel closed, ...).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport unavailable: {0}")]
    Unavailable(String),

    #[error("request failed: {0}")]
    Failed(String),
}

/// Every way an RPC call can fail. Callers treat all variants the same way:
/// show the message, keep the form as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RpcError {
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// The call resolved but carried an `error` key.
    #[error("{0}")]
    Server(String),

    /// The call resolved with `success: false` and no message.
    #[error("{method} was rejected")]
    Rejected { method: String },

    #[error("malformed response to {method}: {reason}")]
    Malformed { method: String, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown window: {0}")]
    UnknownWindow(WindowId),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    /// A data form was opened without the context it needs; the open is refused.
    #[error("missing required context: {0}")]
    MissingContext(String),

    /// Input rejected locally, before any network call.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl FormError {
    /// Short label used by front ends for notification titles.
    pub fn category(&self) -> &'static str {
        match self {
            FormError::MissingContext(_) => "Cannot open",
            FormError::Validation(_) => "Invalid input",
            FormError::Rpc(_) => "Request failed",
            FormError::Registry(_) => "Window error",
        }
    }
}
