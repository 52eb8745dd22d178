use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "desk", version, about = "Schema-driven settings desk")]
pub struct Cli {
    /// Application whose settings are edited
    #[arg(long, global = true)]
    pub app_name: Option<String>,

    /// Data directory (accounts, settings, logs)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Option<Cmd>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    /// Login window first, settings after a successful login
    Run,
    /// Guest session straight into the settings window
    Settings,
    /// Print the normalized schema of a JSON file and the widget picked per field
    Schema { file: PathBuf },
}

impl Cli {
    pub fn command(&self) -> Cmd {
        self.cmd.clone().unwrap_or(Cmd::Run)
    }
}
