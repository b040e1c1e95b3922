//! Logging setup
//!
//! One `tracing` subscriber per process, configured from the `[logging]`
//! section. `RUST_LOG` wins over the configured level when it is set.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_subscriber::{
    filter::Directive,
    fmt::{self, format::FmtSpan, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error
    pub level: String,
    pub format: LogFormat,
    /// Print source file and line with every event
    pub include_location: bool,
    /// Emit an event with the elapsed time when a span closes
    pub log_span_timings: bool,
    /// Append to this file instead of writing to stderr
    pub log_file_path: Option<PathBuf>,
    /// Extra `EnvFilter` directives, e.g. `reqwest=warn`
    pub filter_directives: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            include_location: false,
            log_span_timings: false,
            log_file_path: None,
            // HTTP internals are noisy at info
            filter_directives: vec!["reqwest=warn".to_string(), "hyper=warn".to_string()],
        }
    }
}

/// Install the global subscriber
///
/// Fails on a malformed directive, an unopenable log file, or when a
/// subscriber is already installed.
pub fn init_logging(
    config: &LoggingConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = config.filter_directives.iter().try_fold(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level)),
        |filter, directive| {
            directive
                .parse::<Directive>()
                .map(|d| filter.add_directive(d))
        },
    )?;

    let writer = match &config.log_file_path {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            BoxMakeWriter::new(std::sync::Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let base = fmt::layer()
        .with_span_events(if config.log_span_timings {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        })
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_writer(writer);

    let layer = match config.format {
        LogFormat::Json => base.json().boxed(),
        LogFormat::Pretty => base.pretty().boxed(),
        LogFormat::Compact => base.compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init()?;

    Ok(())
}

pub mod performance {
    use std::future::Future;
    use std::time::Instant;
    use tracing::Instrument;

    /// Run `future` inside a span and log how long it took
    pub async fn measure_async<F, T>(operation: &str, future: F) -> T
    where
        F: Future<Output = T>,
    {
        let started = Instant::now();
        let output = future
            .instrument(tracing::debug_span!("measure", operation))
            .await;

        tracing::debug!(
            target: "performance",
            operation,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "finished"
        );
        output
    }
}

/// `info` event marking the start of a named operation
#[macro_export]
macro_rules! log_operation_start {
    ($operation:expr $(, $($field:tt)+)?) => {
        $crate::tracing::info!(operation = $operation, $($($field)+,)? "operation started")
    };
}

/// `info` event marking a named operation as done
#[macro_export]
macro_rules! log_operation_success {
    ($operation:expr $(, $($field:tt)+)?) => {
        $crate::tracing::info!(operation = $operation, $($($field)+,)? "operation succeeded")
    };
}

/// `error` event for a failed operation; `$error` must implement `Display`
#[macro_export]
macro_rules! log_operation_error {
    ($operation:expr, $error:expr $(, $($field:tt)+)?) => {
        $crate::tracing::error!(
            operation = $operation,
            error = %$error,
            $($($field)+,)?
            "operation failed"
        )
    };
}
