//! Logging bootstrap for the measurement tools
//!
//! Console output uses the bracketed format `timestamp [LEVEL] message`.
//! An optional run log is written through a non-blocking appender whose
//! guard is kept for the lifetime of the process.

use errors::{CimError, CimResult};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::Writer, FmtContext, FormatEvent, FormatFields},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Custom format for log level with brackets: `[INFO]`, `[WARN]`, etc.
fn format_level(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "[TRACE]",
        Level::DEBUG => "[DEBUG]",
        Level::INFO => "[INFO]",
        Level::WARN => "[WARN]",
        Level::ERROR => "[ERROR]",
    }
}

/// Custom event formatter that outputs: `timestamp [LEVEL] message`
///
/// Example output: `2026-03-02T00:50:44.809012Z [INFO] Creating measurements for model F1`
struct BracketedLevelFormat;

impl<S, N> FormatEvent<S, N> for BracketedLevelFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let now = chrono::Utc::now();
        write!(writer, "{} ", now.format("%Y-%m-%dT%H:%M:%S%.6fZ"))?;

        let level = *event.metadata().level();
        if writer.has_ansi_escapes() {
            let color = match level {
                Level::TRACE => "\x1b[35m", // magenta
                Level::DEBUG => "\x1b[34m", // blue
                Level::INFO => "\x1b[32m",  // green
                Level::WARN => "\x1b[33m",  // yellow
                Level::ERROR => "\x1b[31m", // red
            };
            write!(writer, "{}{}\x1b[0m ", color, format_level(&level))?;
        } else {
            write!(writer, "{} ", format_level(&level))?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

// Global guards for keeping file writers alive
static GUARDS: OnceLock<Arc<Mutex<Vec<WorkerGuard>>>> = OnceLock::new();

/// Logging setup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Tool name, used in the default run log name
    pub service_name: String,
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Directory of the run log; none is written when unset
    pub log_dir: Option<PathBuf>,
    /// Run log file name override
    pub file_name: Option<String>,
    /// Run log as JSON lines
    pub enable_json: bool,
    /// Console output
    pub console: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "cim-measure".to_string(),
            level: "info".to_string(),
            log_dir: None,
            file_name: None,
            enable_json: false,
            console: true,
        }
    }
}

impl LogConfig {
    /// Run log name: the override, or `{YYYYMMDD}_{service}.log`
    pub fn run_log_name(&self) -> String {
        self.file_name.clone().unwrap_or_else(|| {
            format!(
                "{}_{}.log",
                chrono::Local::now().format("%Y%m%d"),
                self.service_name
            )
        })
    }
}

/// Filter directive: `RUST_LOG` wins over the configured level
fn filter_directive(rust_log: Option<String>, level: &str) -> String {
    match rust_log {
        Some(env) if !env.trim().is_empty() => env,
        _ => level.to_string(),
    }
}

/// Install the global subscriber
pub fn init_with_config(config: &LogConfig) -> CimResult<()> {
    let directive = filter_directive(std::env::var("RUST_LOG").ok(), &config.level);
    let env_filter = EnvFilter::try_new(&directive)
        .map_err(|e| CimError::Logging(format!("invalid filter '{}': {}", directive, e)))?;

    let console_layer = config.console.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .event_format(BracketedLevelFormat)
            .boxed()
    });

    let file_layer = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::never(dir, config.run_log_name());
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);

            let guards = GUARDS.get_or_init(|| Arc::new(Mutex::new(Vec::new())));
            match guards.lock() {
                Ok(mut guards) => guards.push(guard),
                Err(poisoned) => {
                    eprintln!("Warning: GUARDS lock was poisoned, recovering...");
                    poisoned.into_inner().push(guard);
                },
            }

            let layer = if config.enable_json {
                fmt::layer()
                    .json()
                    .with_writer(non_blocking)
                    .with_level(true)
                    .with_target(true)
                    .boxed()
            } else {
                fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .event_format(BracketedLevelFormat)
                    .boxed()
            };
            Some(layer)
        },
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| CimError::Logging(e.to_string()))?;

    if let Some(dir) = &config.log_dir {
        tracing::debug!("Run log: {}", dir.join(config.run_log_name()).display());
    }
    Ok(())
}
