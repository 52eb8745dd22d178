use std::{env, path::Path, path::PathBuf};

use directories::ProjectDirs;
use lazy_static::lazy_static;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::cli::Cli;

pub const DEFAULT_APP_NAME: &str = "demo";

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app_name: String,
    /// Device units covered by one terminal column.
    pub cell_width: u16,
    /// Device units covered by one terminal row.
    pub cell_height: u16,
    #[serde(default)]
    pub users_file: Option<PathBuf>,
    #[serde(default)]
    pub settings_file: Option<PathBuf>,
    #[serde(default)]
    pub schema_file: Option<PathBuf>,
    #[serde(default)]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub config_dir: PathBuf,
}

lazy_static! {
    pub static ref PROJECT_NAME: String = env!("CARGO_CRATE_NAME").to_uppercase().to_string();
    pub static ref DATA_FOLDER: Option<PathBuf> =
        env::var(format!("{}_DATA", PROJECT_NAME.clone()))
            .ok()
            .map(PathBuf::from);
    pub static ref CONFIG_FOLDER: Option<PathBuf> =
        env::var(format!("{}_CONFIG", PROJECT_NAME.clone()))
            .ok()
            .map(PathBuf::from);
}

impl Config {
    pub fn new() -> Result<Self, config::ConfigError> {
        Self::load(&get_config_dir(), &get_data_dir())
    }

    /// Defaults, then `config.json5` / `config.toml` from `config_dir`, then
    /// `DESK_*` environment variables.
    pub fn load(config_dir: &Path, data_dir: &Path) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("app_name", DEFAULT_APP_NAME)?
            .set_default("cell_width", 8)?
            .set_default("cell_height", 16)?
            .set_default("data_dir", data_dir.to_string_lossy().into_owned())?
            .set_default("config_dir", config_dir.to_string_lossy().into_owned())?;

        let config_files = [
            ("config.json5", config::FileFormat::Json5),
            ("config.toml", config::FileFormat::Toml),
        ];
        let mut found_config = false;
        for (file, format) in &config_files {
            let path = config_dir.join(file);
            found_config |= path.exists();
            builder = builder.add_source(config::File::from(path).format(*format).required(false));
        }
        if !found_config {
            debug!(dir = %config_dir.display(), "no configuration file, using defaults");
        }

        builder = builder.add_source(
            config::Environment::with_prefix(&PROJECT_NAME).try_parsing(true),
        );

        let mut cfg: Self = builder.build()?.try_deserialize()?;
        if cfg.cell_width == 0 || cfg.cell_height == 0 {
            warn!("cell size must be positive, falling back to 8x16");
            cfg.cell_width = 8;
            cfg.cell_height = 16;
        }
        Ok(cfg)
    }

    /// Command line flags win over every other source.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(app_name) = &cli.app_name {
            self.app_name = app_name.clone();
        }
        if let Some(data_dir) = &cli.data_dir {
            self.data_dir = data_dir.clone();
        }
    }
}

pub fn get_data_dir() -> PathBuf {
    if let Some(s) = DATA_FOLDER.clone() {
        s
    } else if let Some(proj_dirs) = project_directory() {
        proj_dirs.data_local_dir().to_path_buf()
    } else {
        PathBuf::from(".").join(".data")
    }
}

pub fn get_config_dir() -> PathBuf {
    if let Some(s) = CONFIG_FOLDER.clone() {
        s
    } else if let Some(proj_dirs) = project_directory() {
        proj_dirs.config_local_dir().to_path_buf()
    } else {
        PathBuf::from(".").join(".config")
    }
}

fn project_directory() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "formdesk", env!("CARGO_PKG_NAME"))
}
