//! Logging initialization.
//!
//! Installs a `tracing` subscriber whose output goes through a bounded,
//! lossy non-blocking writer, so a slow sink never stalls request handling.
//! The returned [`WorkerGuard`] must be held for the lifetime of the process
//! to flush buffered lines on shutdown.

mod structured_logger;

pub use structured_logger::{Fields, StructuredLogger, TIMESTAMP_FORMAT};

use crate::config::LoggingConfig;
use anyhow::{anyhow, Result};
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, NonBlockingBuilder, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One flat JSON object per line (for log aggregation)
    #[default]
    Json,
    /// Human-readable format for local development
    Pretty,
}

impl LogFormat {
    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" => Some(Self::Pretty),
            _ => None,
        }
    }
}

/// Where log lines are written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LogOutput {
    #[default]
    Stdout,
    File(std::path::PathBuf),
}

impl LogOutput {
    /// `"stdout"` (or empty) selects stdout, anything else is a file path.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "" | "stdout" => Self::Stdout,
            path => Self::File(path.into()),
        }
    }
}

/// Initialize the global logging subscriber.
///
/// # Errors
/// Fails if the log file cannot be opened or a global subscriber is
/// already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    // ---
    let filter = EnvFilter::try_new(&config.filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let (writer, guard) = non_blocking_writer(config)?;

    match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(StructuredLogger::new(env!("CARGO_CRATE_NAME"), writer))
            .try_init()?,
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(writer))
            .try_init()?,
    }

    tracing::info!(
        format = ?config.format,
        output = ?config.output,
        "Logging initialized"
    );
    Ok(guard)
}

fn non_blocking_writer(config: &LoggingConfig) -> Result<(NonBlocking, WorkerGuard)> {
    // ---
    let builder = NonBlockingBuilder::default()
        .lossy(true)
        .buffered_lines_limit(config.queue_capacity);

    Ok(match &config.output {
        LogOutput::Stdout => builder.finish(std::io::stdout()),
        LogOutput::File(path) => builder.finish(file_appender(path)?),
    })
}

fn file_appender(path: &Path) -> Result<RollingFileAppender> {
    // ---
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("log output path has no file name: {}", path.display()))?;
    let directory = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    Ok(RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(directory)?)
}

#[cfg(test)]
pub(crate) mod test_support {
    // ---
    use parking_lot::Mutex;
    use std::io;
    use std::sync::Arc;
    use tracing_subscriber::fmt::MakeWriter;

    /// In-memory sink for asserting on emitted log lines.
    #[derive(Clone, Default)]
    pub(crate) struct CapturedLines(Arc<Mutex<Vec<u8>>>);

    impl CapturedLines {
        // ---
        pub(crate) fn raw(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }

        pub(crate) fn records(&self) -> Vec<serde_json::Value> {
            // ---
            self.raw()
                .lines()
                .map(|line| serde_json::from_str(line).expect("log line is valid JSON"))
                .collect()
        }
    }

    impl io::Write for CapturedLines {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLines {
        type Writer = CapturedLines;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("json"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse("PRETTY"), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::parse("xml"), None);
    }

    #[test]
    fn test_log_output_parse() {
        assert_eq!(LogOutput::parse("stdout"), LogOutput::Stdout);
        assert_eq!(LogOutput::parse(""), LogOutput::Stdout);
        assert_eq!(
            LogOutput::parse("/var/log/app.log"),
            LogOutput::File("/var/log/app.log".into())
        );
    }

    #[test]
    fn test_file_appender_rejects_directory_only_path() {
        assert!(file_appender(Path::new("/")).is_err());
    }
}
