//! Path context for runtime environment detection and data layout.
//!
//! ```text
//! <base>/
//!   logs/<tool_id>.<timestamp>.log
//!   apps/<app_name>/users.json
//!   apps/<app_name>/settings.json
//!   apps/<app_name>/schema.json
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Identifies the runtime environment where the binary is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEnvironment {
    /// Running via `cargo run` or from a target directory
    Development,
    /// Running as an installed binary
    Production,
}

#[derive(Debug, Clone)]
pub struct PathContext {
    environment: RuntimeEnvironment,
    base_path: Arc<Path>,
    /// Binary identifier, used to name log files (e.g. "desk")
    tool_id: &'static str,
}

impl PathContext {
    /// Detect the environment and pick the platform data directory for
    /// `vendor`.
    pub fn new(vendor: &str, tool_id: &'static str) -> Self {
        let environment = Self::detect_environment();
        let base_path = Self::determine_base_path(environment, vendor);
        Self {
            environment,
            base_path: base_path.into(),
            tool_id,
        }
    }

    /// Use an explicit base directory (tests, `--data-dir`).
    pub fn with_base_path(base_path: PathBuf, tool_id: &'static str) -> Self {
        Self {
            environment: Self::detect_environment(),
            base_path: base_path.into(),
            tool_id,
        }
    }

    fn detect_environment() -> RuntimeEnvironment {
        if let Ok(exe_path) = std::env::current_exe() {
            if exe_path.components().any(|c| c.as_os_str() == "target") {
                return RuntimeEnvironment::Development;
            }
        }
        if std::env::var("CARGO").is_ok() || std::env::var("CARGO_MANIFEST_DIR").is_ok() {
            return RuntimeEnvironment::Development;
        }
        RuntimeEnvironment::Production
    }

    fn determine_base_path(environment: RuntimeEnvironment, vendor: &str) -> PathBuf {
        match environment {
            RuntimeEnvironment::Development => std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(".data"),
            // Falls back to the working directory on platforms without a
            // known data location.
            RuntimeEnvironment::Production => dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(vendor),
        }
    }

    pub fn environment(&self) -> RuntimeEnvironment {
        self.environment
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn tool_id(&self) -> &str {
        self.tool_id
    }

    /// `<base>/apps/`
    pub fn apps_dir(&self) -> PathBuf {
        self.base_path.join("apps")
    }

    /// `<base>/apps/<app_name>/`
    pub fn app_dir(&self, app_name: &str) -> PathBuf {
        self.apps_dir().join(app_name)
    }

    /// Account store of one application.
    pub fn users_file(&self, app_name: &str) -> PathBuf {
        self.app_dir(app_name).join("users.json")
    }

    /// Saved setting values of one application.
    pub fn settings_file(&self, app_name: &str) -> PathBuf {
        self.app_dir(app_name).join("settings.json")
    }

    /// Optional declared schema of one application.
    pub fn schema_file(&self, app_name: &str) -> PathBuf {
        self.app_dir(app_name).join("schema.json")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.base_path.join("logs")
    }

    /// `<base>/logs/<tool_id>.<timestamp>.log`
    pub fn log_file(&self, timestamp: &str) -> PathBuf {
        self.logs_dir()
            .join(format!("{}.{}.log", self.tool_id, timestamp))
    }

    pub fn log_file_now(&self) -> PathBuf {
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
        self.log_file(&timestamp)
    }

    /// Create the shared directories. Per-application directories are made
    /// on first write.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        for dir in [self.base_path.to_path_buf(), self.apps_dir(), self.logs_dir()] {
            if !dir.exists() {
                std::fs::create_dir_all(&dir)?;
            }
        }
        Ok(())
    }
}
