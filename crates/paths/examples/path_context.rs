//! Prints the resolved data layout for an application name.
//!
//! `cargo run -p paths --example path_context -- demo`

use paths::{PathContext, RuntimeEnvironment};

fn main() {
    let app_name = std::env::args().nth(1).unwrap_or_else(|| "demo".into());
    let ctx = PathContext::new("formdesk", "desk");

    let mode = match ctx.environment() {
        RuntimeEnvironment::Development => "development",
        RuntimeEnvironment::Production => "production",
    };
    println!("environment: {mode}");
    println!("base:        {}", ctx.base_path().display());
    println!("logs:        {}", ctx.logs_dir().display());
    println!("log file:    {}", ctx.log_file_now().display());
    println!("users:       {}", ctx.users_file(&app_name).display());
    println!("settings:    {}", ctx.settings_file(&app_name).display());
    println!("schema:      {}", ctx.schema_file(&app_name).display());
}
