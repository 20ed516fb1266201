//! Distributed tracing support.
//!
//! # Responsibilities
//! - Extract trace context from incoming requests (W3C `traceparent`)
//! - Create child spans for catalog operations
//! - Close every span exactly once, whatever path the handler takes
//!
//! # Design Decisions
//! - The tracer is a capability passed to handlers (`Arc<dyn Tracer>`), not a
//!   global, so tests can swap in [`RecordingTracer`] or [`NoopTracer`]
//! - [`LogTracer`] reports finished spans as structured `tracing` events
//! - A missing or malformed `traceparent` is not an error for the request;
//!   the span simply becomes a root

use axum::http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// W3C trace context header.
pub const TRACEPARENT: &str = "traceparent";

/// Tag carrying the HTTP status returned for the traced operation.
pub const HTTP_STATUS_CODE: &str = "http.status_code";

/// Identity of a span within a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanContext {
    trace_id: u128,
    span_id: u64,
    sampled: bool,
}

/// Why no parent context could be extracted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TraceError {
    #[error("no traceparent header")]
    Missing,
    #[error("malformed traceparent header")]
    Malformed,
    #[error("unsupported traceparent version {0:?}")]
    UnsupportedVersion(String),
}

impl SpanContext {
    /// Start a new trace.
    pub fn root() -> Self {
        Self {
            trace_id: nonzero_u128(),
            span_id: nonzero_u64(),
            sampled: true,
        }
    }

    /// A new span in the same trace.
    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id,
            span_id: nonzero_u64(),
            sampled: self.sampled,
        }
    }

    /// Parse `00-<trace id>-<span id>-<flags>`.
    pub fn from_traceparent(value: &str) -> Result<Self, TraceError> {
        let parts: Vec<&str> = value.trim().split('-').collect();
        if parts.len() != 4 {
            return Err(TraceError::Malformed);
        }
        if parts[0] != "00" {
            return Err(TraceError::UnsupportedVersion(parts[0].to_string()));
        }
        if parts[1].len() != 32 || parts[2].len() != 16 || parts[3].len() != 2 {
            return Err(TraceError::Malformed);
        }

        let trace_id = u128::from_str_radix(parts[1], 16).map_err(|_| TraceError::Malformed)?;
        let span_id = u64::from_str_radix(parts[2], 16).map_err(|_| TraceError::Malformed)?;
        let flags = u8::from_str_radix(parts[3], 16).map_err(|_| TraceError::Malformed)?;
        if trace_id == 0 || span_id == 0 {
            return Err(TraceError::Malformed);
        }

        Ok(Self {
            trace_id,
            span_id,
            sampled: flags & 0x01 == 0x01,
        })
    }

    pub fn to_traceparent(&self) -> String {
        format!(
            "00-{:032x}-{:016x}-{:02x}",
            self.trace_id,
            self.span_id,
            u8::from(self.sampled)
        )
    }

    pub fn trace_id(&self) -> String {
        format!("{:032x}", self.trace_id)
    }

    pub fn span_id(&self) -> String {
        format!("{:016x}", self.span_id)
    }

    pub fn is_sampled(&self) -> bool {
        self.sampled
    }
}

fn nonzero_u128() -> u128 {
    loop {
        let v: u128 = rand::random();
        if v != 0 {
            return v;
        }
    }
}

fn nonzero_u64() -> u64 {
    loop {
        let v: u64 = rand::random();
        if v != 0 {
            return v;
        }
    }
}

/// Value of a span tag.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Int(i64),
    Bool(bool),
    Str(String),
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Int(v) => write!(f, "{v}"),
            TagValue::Bool(v) => write!(f, "{v}"),
            TagValue::Str(v) => f.write_str(v),
        }
    }
}

impl From<i64> for TagValue {
    fn from(v: i64) -> Self {
        TagValue::Int(v)
    }
}

impl From<u16> for TagValue {
    fn from(v: u16) -> Self {
        TagValue::Int(i64::from(v))
    }
}

impl From<bool> for TagValue {
    fn from(v: bool) -> Self {
        TagValue::Bool(v)
    }
}

impl From<&str> for TagValue {
    fn from(v: &str) -> Self {
        TagValue::Str(v.to_string())
    }
}

impl From<String> for TagValue {
    fn from(v: String) -> Self {
        TagValue::Str(v)
    }
}

/// A unit of traced work.
pub trait Span: Send {
    fn context(&self) -> &SpanContext;

    fn set_tag(&mut self, key: &str, value: TagValue);

    /// Attach one structured log record made of key/value fields.
    fn log_fields(&mut self, fields: &[(&str, &str)]);

    /// Close the span. Callers go through [`OperationSpan`], which calls this
    /// exactly once.
    fn finish(&mut self);
}

/// Creates spans and reads trace context from request headers.
pub trait Tracer: Send + Sync {
    fn extract(&self, headers: &HeaderMap) -> Result<SpanContext, TraceError> {
        let value = headers.get(TRACEPARENT).ok_or(TraceError::Missing)?;
        let value = value.to_str().map_err(|_| TraceError::Malformed)?;
        SpanContext::from_traceparent(value)
    }

    fn start_span(&self, name: &'static str, parent: Option<&SpanContext>) -> Box<dyn Span>;
}

/// Which tracer the service runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TracerKind {
    #[default]
    Log,
    Noop,
}

/// Build the tracer selected in configuration.
pub fn tracer_for(kind: TracerKind) -> Arc<dyn Tracer> {
    match kind {
        TracerKind::Log => Arc::new(LogTracer),
        TracerKind::Noop => Arc::new(NoopTracer),
    }
}

/// Everything recorded on a span by the time it finished.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedSpan {
    pub name: &'static str,
    pub context: SpanContext,
    pub parent: Option<SpanContext>,
    pub tags: Vec<(String, TagValue)>,
    pub logs: Vec<Vec<(String, String)>>,
    pub duration: Duration,
}

impl FinishedSpan {
    /// Last value set for `key`.
    pub fn tag(&self, key: &str) -> Option<&TagValue> {
        self.tags.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Whether any log record contains `key=value`.
    pub fn has_log(&self, key: &str, value: &str) -> bool {
        self.logs
            .iter()
            .any(|record| record.iter().any(|(k, v)| k == key && v == value))
    }

    /// Whether a single log record carries every pair in `fields`.
    pub fn has_log_record(&self, fields: &[(&str, &str)]) -> bool {
        self.logs.iter().any(|record| {
            fields
                .iter()
                .all(|(key, value)| record.iter().any(|(k, v)| k == key && v == value))
        })
    }

    pub fn is_error(&self) -> bool {
        self.has_log("event", "error")
    }
}

/// In-flight span state shared by the concrete tracers.
struct SpanRecord {
    name: &'static str,
    context: SpanContext,
    parent: Option<SpanContext>,
    tags: Vec<(String, TagValue)>,
    logs: Vec<Vec<(String, String)>>,
    started: Instant,
}

impl SpanRecord {
    fn start(name: &'static str, parent: Option<&SpanContext>) -> Self {
        Self {
            name,
            context: parent.map(SpanContext::child).unwrap_or_else(SpanContext::root),
            parent: parent.copied(),
            tags: Vec::new(),
            logs: Vec::new(),
            started: Instant::now(),
        }
    }

    fn set_tag(&mut self, key: &str, value: TagValue) {
        self.tags.push((key.to_string(), value));
    }

    fn log_fields(&mut self, fields: &[(&str, &str)]) {
        self.logs.push(
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
    }

    fn into_finished(self) -> FinishedSpan {
        FinishedSpan {
            name: self.name,
            context: self.context,
            parent: self.parent,
            tags: self.tags,
            logs: self.logs,
            duration: self.started.elapsed(),
        }
    }
}

/// Reports finished spans through the `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTracer;

struct LogSpan {
    record: Option<SpanRecord>,
    context: SpanContext,
}

impl Tracer for LogTracer {
    fn start_span(&self, name: &'static str, parent: Option<&SpanContext>) -> Box<dyn Span> {
        let record = SpanRecord::start(name, parent);
        Box::new(LogSpan {
            context: record.context,
            record: Some(record),
        })
    }
}

impl Span for LogSpan {
    fn context(&self) -> &SpanContext {
        &self.context
    }

    fn set_tag(&mut self, key: &str, value: TagValue) {
        if let Some(record) = self.record.as_mut() {
            record.set_tag(key, value);
        }
    }

    fn log_fields(&mut self, fields: &[(&str, &str)]) {
        if let Some(record) = self.record.as_mut() {
            record.log_fields(fields);
        }
    }

    fn finish(&mut self) {
        let Some(record) = self.record.take() else {
            return;
        };
        let finished = record.into_finished();
        let tags: Vec<String> = finished.tags.iter().map(|(k, v)| format!("{k}={v}")).collect();
        let logs: Vec<String> = finished
            .logs
            .iter()
            .map(|record| {
                record
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();
        let parent_span_id = finished.parent.map(|p| p.span_id());
        let duration_ms = finished.duration.as_millis() as u64;

        if finished.is_error() {
            tracing::warn!(
                span_name = finished.name,
                trace_id = %finished.context.trace_id(),
                span_id = %finished.context.span_id(),
                parent_span_id = ?parent_span_id,
                duration_ms,
                tags = ?tags,
                logs = ?logs,
                "Span finished with error"
            );
        } else {
            tracing::info!(
                span_name = finished.name,
                trace_id = %finished.context.trace_id(),
                span_id = %finished.context.span_id(),
                parent_span_id = ?parent_span_id,
                duration_ms,
                tags = ?tags,
                logs = ?logs,
                "Span finished"
            );
        }
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

struct NoopSpan(SpanContext);

impl Tracer for NoopTracer {
    fn start_span(&self, _name: &'static str, parent: Option<&SpanContext>) -> Box<dyn Span> {
        Box::new(NoopSpan(
            parent.map(SpanContext::child).unwrap_or_else(SpanContext::root),
        ))
    }
}

impl Span for NoopSpan {
    fn context(&self) -> &SpanContext {
        &self.0
    }

    fn set_tag(&mut self, _key: &str, _value: TagValue) {}

    fn log_fields(&mut self, _fields: &[(&str, &str)]) {}

    fn finish(&mut self) {}
}

/// Keeps finished spans in memory for inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingTracer {
    finished: Arc<Mutex<Vec<FinishedSpan>>>,
}

impl RecordingTracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of spans finished so far, in finish order.
    pub fn finished(&self) -> Vec<FinishedSpan> {
        self.finished
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Spans finished under `name`.
    pub fn named(&self, name: &str) -> Vec<FinishedSpan> {
        self.finished().into_iter().filter(|s| s.name == name).collect()
    }
}

struct RecordingSpan {
    record: Option<SpanRecord>,
    context: SpanContext,
    sink: Arc<Mutex<Vec<FinishedSpan>>>,
}

impl Tracer for RecordingTracer {
    fn start_span(&self, name: &'static str, parent: Option<&SpanContext>) -> Box<dyn Span> {
        let record = SpanRecord::start(name, parent);
        Box::new(RecordingSpan {
            context: record.context,
            record: Some(record),
            sink: self.finished.clone(),
        })
    }
}

impl Span for RecordingSpan {
    fn context(&self) -> &SpanContext {
        &self.context
    }

    fn set_tag(&mut self, key: &str, value: TagValue) {
        if let Some(record) = self.record.as_mut() {
            record.set_tag(key, value);
        }
    }

    fn log_fields(&mut self, fields: &[(&str, &str)]) {
        if let Some(record) = self.record.as_mut() {
            record.log_fields(fields);
        }
    }

    fn finish(&mut self) {
        if let Some(record) = self.record.take() {
            self.sink
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(record.into_finished());
        }
    }
}

/// Span around one catalog operation.
///
/// Extracts the caller's context, starts a child span named after the
/// operation, and finishes it when [`OperationSpan::finish`] is called or the
/// guard is dropped, whichever comes first.
pub struct OperationSpan {
    span: Option<Box<dyn Span>>,
    operation: &'static str,
}

impl OperationSpan {
    pub fn start(tracer: &dyn Tracer, headers: &HeaderMap, operation: &'static str) -> Self {
        let parent = match tracer.extract(headers) {
            Ok(ctx) => Some(ctx),
            Err(err) => {
                tracing::debug!(operation, error = %err, "No incoming trace context, starting root span");
                None
            }
        };
        Self {
            span: Some(tracer.start_span(operation, parent.as_ref())),
            operation,
        }
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn context(&self) -> Option<SpanContext> {
        self.span.as_ref().map(|s| *s.context())
    }

    pub fn log_field(&mut self, key: &str, value: &str) {
        self.log_fields(&[(key, value)]);
    }

    /// Append one log record holding all of `fields`.
    pub fn log_fields(&mut self, fields: &[(&str, &str)]) {
        if let Some(span) = self.span.as_mut() {
            span.log_fields(fields);
        }
    }

    /// Tag the status returned on success.
    pub fn succeed(&mut self, status: StatusCode) {
        if let Some(span) = self.span.as_mut() {
            span.set_tag(HTTP_STATUS_CODE, status.as_u16().into());
        }
    }

    /// Record a failure: `event=error`, `message=<message>`, then the status tag.
    pub fn fail(&mut self, status: StatusCode, message: &str) {
        if let Some(span) = self.span.as_mut() {
            span.log_fields(&[("event", "error"), ("message", message)]);
            span.set_tag(HTTP_STATUS_CODE, status.as_u16().into());
        }
    }

    pub fn finish(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if let Some(mut span) = self.span.take() {
            span.finish();
        }
    }
}

impl Drop for OperationSpan {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const PARENT: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(TRACEPARENT, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_traceparent_round_trip() {
        let ctx = SpanContext::from_traceparent(PARENT).unwrap();
        assert_eq!(ctx.trace_id(), "4bf92f3577b34da6a3ce929d0e0e4736");
        assert_eq!(ctx.span_id(), "00f067aa0ba902b7");
        assert!(ctx.is_sampled());
        assert_eq!(ctx.to_traceparent(), PARENT);
    }

    #[test]
    fn test_traceparent_rejections() {
        assert_eq!(
            SpanContext::from_traceparent("01-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01"),
            Err(TraceError::UnsupportedVersion("01".into()))
        );
        for bad in [
            "",
            "garbage",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7",
            "00-00000000000000000000000000000000-00f067aa0ba902b7-01",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-0000000000000000-01",
            "00-4bf92f3577b34da6a3ce929d0e0e473z-00f067aa0ba902b7-01",
            "00-4bf92f-00f067aa0ba902b7-01",
        ] {
            assert_eq!(
                SpanContext::from_traceparent(bad),
                Err(TraceError::Malformed),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_child_keeps_trace() {
        let parent = SpanContext::from_traceparent(PARENT).unwrap();
        let child = parent.child();
        assert_eq!(child.trace_id(), parent.trace_id());
        assert_ne!(child.span_id(), parent.span_id());
    }

    #[test]
    fn test_operation_span_links_to_incoming_context() {
        let tracer = RecordingTracer::new();
        let mut span = OperationSpan::start(&tracer, &headers_with(PARENT), "db_get_products");
        span.succeed(StatusCode::OK);
        span.finish();

        let spans = tracer.finished();
        assert_eq!(spans.len(), 1);
        let s = &spans[0];
        assert_eq!(s.name, "db_get_products");
        assert_eq!(s.context.trace_id(), "4bf92f3577b34da6a3ce929d0e0e4736");
        assert_eq!(s.parent.unwrap().span_id(), "00f067aa0ba902b7");
        assert_eq!(s.tag(HTTP_STATUS_CODE), Some(&TagValue::Int(200)));
        assert!(!s.is_error());
    }

    #[test]
    fn test_bad_context_starts_root_span() {
        let tracer = RecordingTracer::new();
        drop(OperationSpan::start(&tracer, &headers_with("nonsense"), "db_get_product"));
        drop(OperationSpan::start(&tracer, &HeaderMap::new(), "db_get_product"));

        let spans = tracer.named("db_get_product");
        assert_eq!(spans.len(), 2);
        assert!(spans.iter().all(|s| s.parent.is_none()));
    }

    #[test]
    fn test_failure_fields_and_single_finish_on_drop() {
        let tracer = RecordingTracer::new();
        {
            let mut span = OperationSpan::start(&tracer, &HeaderMap::new(), "db_get_product");
            span.fail(StatusCode::NOT_FOUND, "not found");
        }

        let spans = tracer.finished();
        assert_eq!(spans.len(), 1);
        assert!(spans[0].is_error());
        assert!(spans[0].has_log("message", "not found"));
        assert_eq!(spans[0].tag(HTTP_STATUS_CODE), Some(&TagValue::Int(404)));
    }

    #[test]
    fn test_log_fields_share_one_record() {
        let tracer = RecordingTracer::new();
        let mut span = OperationSpan::start(&tracer, &HeaderMap::new(), "db_get_product");
        span.log_fields(&[("event", "string-format"), ("product.id", "abc")]);
        span.log_field("note", "separate");
        span.finish();

        let span = &tracer.finished()[0];
        assert_eq!(span.logs.len(), 2);
        assert!(span.has_log_record(&[("event", "string-format"), ("product.id", "abc")]));
        assert!(!span.has_log_record(&[("event", "string-format"), ("note", "separate")]));
    }

    #[test]
    fn test_noop_tracer_still_propagates() {
        let parent = SpanContext::from_traceparent(PARENT).unwrap();
        let span = NoopTracer.start_span("db_get_products", Some(&parent));
        assert_eq!(span.context().trace_id(), parent.trace_id());
    }
}
