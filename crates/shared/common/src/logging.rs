//! Structured logging.
//!
//! Every `tracing` event is rendered as a [`LogRecord`]: a timestamped,
//! leveled record tagged with the service name, with the event's fields
//! flattened next to the fixed keys. The console always receives records
//! (JSON or pretty); an optional append-only file always receives JSON.

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::{LogConfig, LogFormat};

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Keys owned by [`LogRecord`]; event fields with these names are prefixed.
const RESERVED_KEYS: &[&str] = &["timestamp", "level", "service"];
const RESERVED_PREFIX: &str = "field.";

/// One emitted log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: String,
    pub level: String,
    pub service: String,
    pub message: String,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl LogRecord {
    /// Build a record from a `tracing` event.
    pub fn from_event(service: &str, event: &Event<'_>) -> Self {
        let mut message = String::new();
        let mut metadata = Map::new();
        event.record(&mut FieldVisitor {
            message: &mut message,
            metadata: &mut metadata,
        });

        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            level: event.metadata().level().as_str().to_ascii_lowercase(),
            service: service.to_string(),
            message,
            metadata,
        }
    }

    /// Metadata value by key.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// `<timestamp> [<service>] <level>: <message> <metadata-json>`
    pub fn to_pretty(&self) -> String {
        let head = format!(
            "{} [{}] {}: {}",
            self.timestamp, self.service, self.level, self.message
        );
        if self.metadata.is_empty() {
            return head;
        }
        match serde_json::to_string(&self.metadata) {
            Ok(meta) => format!("{} {}", head, meta),
            Err(_) => head,
        }
    }
}

struct FieldVisitor<'a> {
    message: &'a mut String,
    metadata: &'a mut Map<String, Value>,
}

impl FieldVisitor<'_> {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            *self.message = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
        } else if RESERVED_KEYS.contains(&field.name()) {
            self.metadata
                .insert(format!("{}{}", RESERVED_PREFIX, field.name()), value);
        } else {
            self.metadata.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for FieldVisitor<'_> {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, Value::from(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::from(format!("{:?}", value)));
    }
}

/// Event formatter producing [`LogRecord`] lines.
#[derive(Debug, Clone)]
pub struct RecordFormat {
    service: String,
    format: LogFormat,
}

impl RecordFormat {
    pub fn new(service: impl Into<String>, format: LogFormat) -> Self {
        Self {
            service: service.into(),
            format,
        }
    }
}

impl<S, N> FormatEvent<S, N> for RecordFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let record = LogRecord::from_event(&self.service, event);
        let line = match self.format {
            LogFormat::Json => serde_json::to_string(&record).map_err(|_| fmt::Error)?,
            LogFormat::Pretty => record.to_pretty(),
        };
        writeln!(writer, "{}", line)
    }
}

/// Layer writing [`LogRecord`] lines to `writer`.
pub fn record_layer<S, W>(service: &str, format: LogFormat, writer: W) -> impl Layer<S> + Send + Sync
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer::<S>()
        .event_format(RecordFormat::new(service, format))
        .with_writer(writer)
}

/// Writer that sends bytes to `fallback` when the primary sink fails.
#[derive(Debug)]
pub struct FallbackWriter<W, F = io::Stderr> {
    primary: W,
    fallback: F,
}

impl<W: Write> FallbackWriter<W> {
    pub fn new(primary: W) -> Self {
        Self {
            primary,
            fallback: io::stderr(),
        }
    }
}

impl<W: Write, F: Write> FallbackWriter<W, F> {
    pub fn with_fallback(primary: W, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<W: Write, F: Write> Write for FallbackWriter<W, F> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.primary.write(buf) {
            Ok(n) => Ok(n),
            Err(_) => {
                self.fallback.write_all(buf)?;
                Ok(buf.len())
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.primary.flush().or_else(|_| self.fallback.flush())
    }
}

#[derive(Debug, Error)]
enum LogFileError {
    #[error("invalid log file path: {0}")]
    InvalidPath(String),

    #[error(transparent)]
    Init(#[from] InitError),
}

fn open_log_file(path: &Path) -> Result<RollingFileAppender, LogFileError> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| LogFileError::InvalidPath(path.display().to_string()))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)?;
    Ok(appender)
}

/// Keeps the non-blocking writers alive; dropping it flushes buffered records.
#[must_use = "dropping the guard stops log output"]
#[derive(Default)]
pub struct LogGuard {
    guards: Vec<WorkerGuard>,
}

impl LogGuard {
    /// False for the guard returned by a repeated initialization.
    pub fn is_active(&self) -> bool {
        !self.guards.is_empty()
    }
}

struct Sinks<S> {
    subscriber: S,
    guards: Vec<WorkerGuard>,
    file_error: Option<(PathBuf, LogFileError)>,
}

/// Assemble the subscriber: level filter, console layer over `console`, and
/// the JSON file layer when `config.file` opens.
fn build_sinks<W>(
    service: &str,
    config: &LogConfig,
    console: W,
) -> Sinks<impl Subscriber + Send + Sync + 'static>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let mut guards = Vec::new();
    let mut file_error = None;
    let file_layer = match config.file.as_deref() {
        Some(path) => match open_log_file(path) {
            Ok(appender) => {
                let (writer, guard) = tracing_appender::non_blocking(FallbackWriter::new(appender));
                guards.push(guard);
                Some(record_layer(service, LogFormat::Json, writer))
            }
            Err(err) => {
                file_error = Some((path.to_path_buf(), err));
                None
            }
        },
        None => None,
    };

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(record_layer(service, config.format, console))
        .with(file_layer);

    Sinks {
        subscriber,
        guards,
        file_error,
    }
}

fn report_file_error(path: &Path, err: &LogFileError) {
    tracing::warn!(
        path = %path.display(),
        error = %err,
        "log file unavailable, logging to console only"
    );
}

/// Install the process-wide subscriber.
///
/// Never fails: an unusable log file degrades to console-only output with a
/// warn record, and a second call returns an inactive guard.
pub fn init_logging(service: &str, config: &LogConfig) -> LogGuard {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return LogGuard::default();
    }

    let (console, console_guard) = tracing_appender::non_blocking(io::stdout());
    let Sinks {
        subscriber,
        guards: file_guards,
        file_error,
    } = build_sinks(service, config, console);

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return LogGuard::default();
    }

    if let Some((path, err)) = &file_error {
        report_file_error(path, err);
    }

    let mut guards = vec![console_guard];
    guards.extend(file_guards);
    LogGuard { guards }
}
