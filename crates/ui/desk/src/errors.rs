//! Report hooks. Every panic leaves raw mode and the alternate screen before
//! anything is printed, so the report lands on a usable terminal.
use std::panic::PanicHookInfo;
use std::path::Path;
use std::sync::Once;

use color_eyre::{
    Result,
    config::{HookBuilder, PanicHook},
};
use tracing::error;

static HOOKS: Once = Once::new();

pub fn init() -> Result<()> {
    let mut result = Ok(());
    HOOKS.call_once(|| result = install());
    result
}

fn install() -> Result<()> {
    let log_dir = crate::config::get_data_dir().join("logs");
    let (panic_hook, eyre_hook) = hook_builder(&log_dir).try_into_hooks()?;
    eyre_hook.install()?;
    std::panic::set_hook(Box::new(move |info| on_panic(&panic_hook, info)));
    Ok(())
}

fn hook_builder(log_dir: &Path) -> HookBuilder {
    HookBuilder::default()
        .panic_section(format!(
            "The desk crashed. The log files in {} show what it was doing.",
            log_dir.display()
        ))
        .capture_span_trace_by_default(false)
        .display_location_section(false)
        .display_env_section(false)
}

fn on_panic(hook: &PanicHook, info: &PanicHookInfo<'_>) {
    if let Err(e) = crate::tui::restore() {
        error!(error = ?e, "terminal restore failed");
    }

    let report = hook.panic_report(info).to_string();
    error!(report = %strip_ansi_escapes::strip_str(&report), "desk panicked");

    #[cfg(not(debug_assertions))]
    {
        use human_panic::{handle_dump, metadata, print_msg};
        let metadata = metadata!();
        let dump = handle_dump(&metadata, info);
        if print_msg(dump, &metadata).is_err() {
            eprintln!("{report}");
        }
    }

    #[cfg(debug_assertions)]
    {
        better_panic::Settings::auto()
            .most_recent_first(false)
            .lineno_suffix(true)
            .verbosity(better_panic::Verbosity::Full)
            .create_panic_handler()(info);
    }

    std::process::exit(libc::EXIT_FAILURE);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hooks_build_without_installing() {
        hook_builder(Path::new("/data/logs")).try_into_hooks().unwrap();
        assert!(!HOOKS.is_completed());
    }
}
