//! Logging and tracing setup for the `pgqa` binary
//!
//! A pretty console layer for development and a JSON file layer with daily
//! rotation. `RUST_LOG` takes precedence over the configured filter.

use std::path::PathBuf;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const DEFAULT_FILTER: &str = "info,pgqa_server=debug,pgqa_core=debug,pgqa_postgres=debug,pgqa_llm=debug,pgqa_analyzer=debug,tower_http=debug";
const PRODUCTION_FILTER: &str = "warn,pgqa_server=info,pgqa_core=info,pgqa_postgres=info,pgqa_llm=info,pgqa_analyzer=info";

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Directory for the rotating JSON log
    pub log_dir: PathBuf,

    pub enable_json_logs: bool,

    pub enable_console_logs: bool,

    /// Include file and line in console output
    pub include_location: bool,

    /// Log span open/close events
    pub enable_spans: bool,

    pub default_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: log_directory(),
            enable_json_logs: true,
            enable_console_logs: true,
            include_location: cfg!(debug_assertions),
            enable_spans: cfg!(debug_assertions),
            default_filter: DEFAULT_FILTER.to_string(),
        }
    }
}

impl LoggingConfig {
    /// Compact console output, JSON file logs
    pub fn production() -> Self {
        Self {
            log_dir: log_directory(),
            enable_json_logs: true,
            enable_console_logs: true,
            include_location: false,
            enable_spans: false,
            default_filter: PRODUCTION_FILTER.to_string(),
        }
    }

    pub fn development() -> Self {
        Self::default()
    }

    /// Console only, for one-shot CLI commands
    pub fn cli() -> Self {
        Self {
            enable_json_logs: false,
            include_location: false,
            enable_spans: false,
            default_filter: "warn".to_string(),
            ..Self::default()
        }
    }

    /// Picks development or production settings from the `debug` flag
    pub fn for_server(debug: bool) -> Self {
        if debug || cfg!(debug_assertions) {
            Self::development()
        } else {
            Self::production()
        }
    }
}

/// Installs the global subscriber. Call once.
pub fn init(config: LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    // NEW fires once per span; ENTER would repeat on every poll of an awaited future.
    let span_events = if config.enable_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let mut layers = Vec::new();

    if config.enable_console_logs {
        let console_layer = fmt::layer()
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_span_events(span_events.clone())
            .with_ansi(true)
            .with_writer(std::io::stderr)
            .with_filter(env_filter.clone())
            .boxed();

        layers.push(console_layer);
    }

    if config.enable_json_logs {
        std::fs::create_dir_all(&config.log_dir)?;
        let file_appender = tracing_appender::rolling::daily(&config.log_dir, "pgqa.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        // The writer flushes on drop; it has to outlive every log call.
        std::mem::forget(guard);

        let json_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_span_events(span_events)
            .with_ansi(false)
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(non_blocking)
            .with_filter(env_filter)
            .boxed();

        layers.push(json_layer);
    }

    tracing_subscriber::registry().with(layers).init();

    tracing::info!(
        log_dir = %config.log_dir.display(),
        json_enabled = config.enable_json_logs,
        console_enabled = config.enable_console_logs,
        "logging initialized"
    );

    Ok(())
}

pub fn log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pgqa")
        .join("logs")
}
