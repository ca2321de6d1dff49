//! JSON line logger with a fixed record schema.
//!
//! Every record is a single flat JSON object:
//!
//! ```text
//! {"timestamp":"2024-05-01T12:00:00Z","level":"INFO","message":"...","module":"...", <fields>}
//! ```
//!
//! The logger can be called directly through [`StructuredLogger::log`] and is
//! also a `tracing_subscriber` layer, so every `tracing` event in the process
//! is rendered in the same shape. Fields recorded on enclosing spans are
//! merged into each event, with the event's own fields taking precedence.
//! Writing never fails the caller: if the sink rejects a line it is retried
//! once on stderr and otherwise dropped.

use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::io::Write;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record as SpanRecord};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// Caller-supplied fields appended after the fixed schema.
pub type Fields = Map<String, Value>;

/// Second-precision ISO-8601 in UTC.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

const RESERVED_KEYS: [&str; 4] = ["timestamp", "level", "message", "module"];

#[derive(Serialize)]
struct Record<'a> {
    timestamp: String,
    level: &'a str,
    message: &'a str,
    module: &'a str,
    #[serde(flatten)]
    fields: &'a Fields,
}

/// Emits one JSON object per line to the configured writer.
pub struct StructuredLogger<W> {
    module: String,
    make_writer: W,
}

impl<W> StructuredLogger<W>
where
    W: for<'a> MakeWriter<'a>,
{
    // ---
    /// `module` is reported on records written through [`log`](Self::log);
    /// records coming from `tracing` events use the event's module path.
    pub fn new(module: impl Into<String>, make_writer: W) -> Self {
        // ---
        Self {
            module: module.into(),
            make_writer,
        }
    }

    /// Write one record. Never panics and never returns an error.
    pub fn log(&self, level: Level, message: &str, fields: Fields) {
        self.write_record(level, message, &self.module, fields);
    }

    fn write_record(&self, level: Level, message: &str, module: &str, mut fields: Fields) {
        // ---
        // Fixed fields always win over caller fields with the same name.
        for key in RESERVED_KEYS {
            fields.remove(key);
        }

        let record = Record {
            timestamp: Utc::now().format(TIMESTAMP_FORMAT).to_string(),
            level: level.as_str(),
            message,
            module,
            fields: &fields,
        };

        let Ok(mut line) = serde_json::to_vec(&record) else {
            return;
        };
        line.push(b'\n');

        let mut writer = self.make_writer.make_writer();
        if writer.write_all(&line).and_then(|()| writer.flush()).is_err() {
            let _ = std::io::stderr().write_all(&line);
        }
    }
}

/// Fields of a span, kept in its extensions.
struct SpanFields(Fields);

impl<S, W> Layer<S> for StructuredLogger<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'a> MakeWriter<'a> + 'static,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        // ---
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut visitor = FieldVisitor::default();
        attrs.record(&mut visitor);
        span.extensions_mut().insert(SpanFields(visitor.fields));
    }

    fn on_record(&self, id: &Id, values: &SpanRecord<'_>, ctx: Context<'_, S>) {
        // ---
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut visitor = FieldVisitor::default();
        values.record(&mut visitor);

        let mut extensions = span.extensions_mut();
        match extensions.get_mut::<SpanFields>() {
            Some(SpanFields(fields)) => fields.extend(visitor.fields),
            None => extensions.insert(SpanFields(visitor.fields)),
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        // ---
        let mut fields = Fields::new();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(SpanFields(span_fields)) = span.extensions().get::<SpanFields>() {
                    fields.extend(span_fields.clone());
                }
            }
        }

        let metadata = event.metadata();
        let mut visitor = FieldVisitor {
            message: None,
            fields,
        };
        event.record(&mut visitor);

        let module = metadata.module_path().unwrap_or_else(|| metadata.target());
        self.write_record(
            *metadata.level(),
            visitor.message.as_deref().unwrap_or_default(),
            module,
            visitor.fields,
        );
    }
}

/// Collects event fields into a flat JSON map, splitting out `message`.
#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Fields,
}

impl FieldVisitor {
    // ---
    fn insert(&mut self, field: &Field, value: Value) {
        // ---
        if field.name() == "message" {
            let text = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            self.message = Some(text);
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for FieldVisitor {
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
        self.insert(field, Value::from(format!("{value:?}")));
    }
}
