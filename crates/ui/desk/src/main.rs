use std::{path::Path, sync::Arc};

use app::{AppBuilder, Application};
use clap::Parser;
use color_eyre::{Result, eyre::eyre};
use forms::{RpcClient, create_controls};
use local_backend::{BackendOptions, LocalBackend, default_schema, load_schema};
use tracing::info;

use crate::{
    cli::{Cli, Cmd},
    config::Config,
    desk::{Desk, StartMode},
    render::CellMetrics,
};

mod action;
mod cli;
mod components;
mod config;
mod desk;
mod errors;
mod render;
mod tui;

struct DeskApp;

impl Application for DeskApp {
    const TOOL_ID: &'static str = "desk";
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    errors::init()?;
    let cli = Cli::parse();
    let mut config = Config::new()?;
    config.apply_cli(&cli);

    let command = cli.command();
    if let Cmd::Schema { file } = &command {
        return print_schema(file);
    }

    let ctx = AppBuilder::<DeskApp>::new(env!("CARGO_PKG_VERSION"))
        .base_path(Some(config.data_dir.clone()))
        .console(false)
        .build()
        .map_err(|e| eyre!("failed to initialise logging: {e}"))?;
    info!(log_file = %ctx.log_file.display(), app = %config.app_name, "desk starting");

    let paths = ctx.path_context();
    let app_name = config.app_name.clone();
    let schema_file = config
        .schema_file
        .clone()
        .unwrap_or_else(|| paths.schema_file(&app_name));
    let schema = if schema_file.exists() {
        load_schema(&schema_file)?
    } else {
        default_schema()
    };
    let options = BackendOptions {
        users_file: Some(
            config
                .users_file
                .clone()
                .unwrap_or_else(|| paths.users_file(&app_name)),
        ),
        settings_file: Some(
            config
                .settings_file
                .clone()
                .unwrap_or_else(|| paths.settings_file(&app_name)),
        ),
        schema,
    };
    let backend = LocalBackend::new(app_name.clone(), options)?;
    let client = RpcClient::new(Arc::new(backend), app_name);

    let start = match command {
        Cmd::Settings => StartMode::Guest,
        _ => StartMode::Login,
    };
    let cells = CellMetrics::new(config.cell_width, config.cell_height);
    Desk::new(client, cells, start).run().await?;
    info!("desk stopped");
    Ok(())
}

/// `desk schema <file>`: the normalized fields and the widget each one gets.
fn print_schema(file: &Path) -> Result<()> {
    let fields = load_schema(file)?;
    let controls = create_controls(&fields);
    println!("{:<24} {:<10} WIDGET", "NAME", "TYPE");
    for (field, control) in fields.iter().zip(&controls) {
        println!(
            "{:<24} {:<10} {}",
            field.name,
            field.field_type.to_string(),
            control.variant()
        );
    }
    Ok(())
}
