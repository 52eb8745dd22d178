use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("password hashing failed: {0}")]
    Hash(String),

    /// Request rejected by validation. The message is shown to the user as is.
    #[error("{0}")]
    Invalid(String),
}

impl BackendError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        BackendError::Invalid(msg.into())
    }
}
