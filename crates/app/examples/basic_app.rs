//! Initialise paths and logging into a scratch directory and report where
//! everything went.

use app::{AppBuilder, Application, BoxError};

struct Probe;

impl Application for Probe {
    const TOOL_ID: &'static str = "probe";
}

fn main() -> Result<(), BoxError> {
    let base = std::env::temp_dir().join("formdesk-basic-app");
    let ctx = AppBuilder::<Probe>::new(env!("CARGO_PKG_VERSION"))
        .base_path(Some(base))
        .build()?;

    tracing::info!("hello from the basic app example");

    println!("tool:     {} {}", ctx.tool_id(), ctx.version());
    println!("base:     {}", ctx.path_context().base_path().display());
    println!("log file: {}", ctx.log_file.display());
    Ok(())
}
