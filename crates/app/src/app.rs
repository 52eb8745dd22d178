use paths::PathContext;
use std::marker::PhantomData;
use std::path::PathBuf;
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Infrastructure every binary needs: resolved paths and a live log writer.
pub struct AppContext {
    pub path_context: PathContext,
    pub version: &'static str,
    pub log_file: PathBuf,
    /// Flushes the non-blocking log writer when dropped; keep it alive for
    /// the whole run.
    _log_guard: tracing_appender::non_blocking::WorkerGuard,
}

impl AppContext {
    pub fn tool_id(&self) -> &str {
        self.path_context.tool_id()
    }

    pub fn version(&self) -> &'static str {
        self.version
    }

    pub fn path_context(&self) -> &PathContext {
        &self.path_context
    }
}

/// Binary identity. Constants only.
pub trait Application: Sized + 'static {
    const TOOL_ID: &'static str;
    const VENDOR: &'static str = "formdesk";
}

/// Level used when `RUST_LOG` is not set.
pub fn default_level() -> LevelFilter {
    if cfg!(debug_assertions) {
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    }
}

pub struct AppBuilder<A: Application> {
    version: &'static str,
    base_path: Option<PathBuf>,
    console: bool,
    _marker: PhantomData<A>,
}

impl<A: Application> AppBuilder<A> {
    pub fn new(version: &'static str) -> Self {
        Self {
            version,
            base_path: None,
            console: true,
            _marker: PhantomData,
        }
    }

    /// Override the data directory instead of detecting it.
    pub fn base_path(mut self, base_path: Option<PathBuf>) -> Self {
        self.base_path = base_path;
        self
    }

    /// Mirror log lines to stderr. Terminal UIs turn this off so logging
    /// never draws over the screen.
    pub fn console(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }

    /// Resolve paths, create directories and install the global subscriber.
    pub fn build(self) -> Result<AppContext, BoxError> {
        let path_context = match self.base_path {
            Some(base) => PathContext::with_base_path(base, A::TOOL_ID),
            None => PathContext::new(A::VENDOR, A::TOOL_ID),
        };
        path_context.ensure_directories()?;

        let log_file = path_context.log_file_now();
        let file_name = log_file
            .file_name()
            .ok_or("log file path has no file name")?;
        let file_appender = tracing_appender::rolling::never(path_context.logs_dir(), file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let filter = EnvFilter::builder()
            .with_default_directive(default_level().into())
            .from_env_lossy();

        let file_layer = fmt::Layer::default()
            .with_target(false)
            .with_ansi(false)
            .with_writer(non_blocking)
            .boxed();

        let console_layer = self.console.then(|| {
            fmt::Layer::default()
                .with_target(false)
                .with_writer(std::io::stderr)
                .boxed()
        });

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(console_layer)
            .with(tracing_error::ErrorLayer::default())
            .try_init()?;

        tracing::info!(
            tool = A::TOOL_ID,
            version = self.version,
            base = %path_context.base_path().display(),
            "logging initialised"
        );

        Ok(AppContext {
            path_context,
            version: self.version,
            log_file,
            _log_guard: guard,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe;

    impl Application for Probe {
        const TOOL_ID: &'static str = "probe";
    }

    #[test]
    fn builder_defaults() {
        let builder = AppBuilder::<Probe>::new("0.0.1");
        assert!(builder.console);
        assert!(builder.base_path.is_none());
        let builder = builder.console(false).base_path(Some(PathBuf::from("/tmp/x")));
        assert!(!builder.console);
        assert_eq!(builder.base_path, Some(PathBuf::from("/tmp/x")));
        assert_eq!(Probe::VENDOR, "formdesk");
    }

    #[test]
    fn default_level_matches_build_profile() {
        let expected = if cfg!(debug_assertions) {
            LevelFilter::INFO
        } else {
            LevelFilter::WARN
        };
        assert_eq!(default_level(), expected);
    }
}
