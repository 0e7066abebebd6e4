//! The dependency-record sink and its stock implementations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

use crate::context::QueryContext;

/// One outbound database call, as reported to a [`Tracer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRecord {
    /// Caller-site span identifier. Always empty.
    pub span_id: String,
    /// Driver name of the backend, e.g. `"postgres"`.
    pub dependency_type: &'static str,
    pub service_name: String,
    /// Label of the traced operation, e.g. `"FetchOne"`.
    pub command_name: &'static str,
    pub success: bool,
    pub start: SystemTime,
    pub end: SystemTime,
    /// `None` on success. On failure holds `"error"` and `"query"`.
    pub fields: Option<HashMap<String, String>>,
}

impl DependencyRecord {
    pub fn duration(&self) -> Duration {
        self.end.duration_since(self.start).unwrap_or_default()
    }

    /// Look up a metadata field.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .as_ref()
            .and_then(|fields| fields.get(key))
            .map(String::as_str)
    }
}

/// Accepts one [`DependencyRecord`] per traced database call.
///
/// The call is made synchronously once the database call has finished and
/// before the traced operation returns, so implementations should hand the
/// record off quickly. Transport, batching and retry are up to the
/// implementation.
pub trait Tracer: Send + Sync {
    fn trace_dependency(&self, ctx: &QueryContext, record: DependencyRecord);
}

impl<T: Tracer + ?Sized> Tracer for Arc<T> {
    fn trace_dependency(&self, ctx: &QueryContext, record: DependencyRecord) {
        (**self).trace_dependency(ctx, record)
    }
}

impl<T: Tracer + ?Sized> Tracer for Box<T> {
    fn trace_dependency(&self, ctx: &QueryContext, record: DependencyRecord) {
        (**self).trace_dependency(ctx, record)
    }
}

/// Emits every record as a `tracing` event on target
/// `traced_sea_orm::dependency`.
///
/// Successful calls are logged at INFO, failed calls at WARN. Route the
/// target to your collector with a subscriber layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTracer;

impl Tracer for LogTracer {
    fn trace_dependency(&self, _ctx: &QueryContext, record: DependencyRecord) {
        let duration_ms = record.duration().as_millis() as u64;
        if record.success {
            tracing::info!(
                target: "traced_sea_orm::dependency",
                dependency_type = record.dependency_type,
                service.name = %record.service_name,
                command.name = record.command_name,
                success = true,
                duration_ms,
                "dependency call"
            );
        } else {
            tracing::warn!(
                target: "traced_sea_orm::dependency",
                dependency_type = record.dependency_type,
                service.name = %record.service_name,
                command.name = record.command_name,
                success = false,
                duration_ms,
                error = record.field("error").unwrap_or_default(),
                query = record.field("query").unwrap_or_default(),
                "dependency call failed"
            );
        }
    }
}

/// Discards every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl Tracer for NoopTracer {
    fn trace_dependency(&self, _ctx: &QueryContext, _record: DependencyRecord) {}
}

/// Keeps every record in memory. Meant for tests.
///
/// ```rust
/// use std::sync::Arc;
/// use traced_sea_orm::RecordingTracer;
///
/// let tracer = Arc::new(RecordingTracer::new());
/// assert!(tracer.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct RecordingTracer {
    records: Mutex<Vec<DependencyRecord>>,
}

impl RecordingTracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the records received so far, in arrival order.
    pub fn records(&self) -> Vec<DependencyRecord> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    // A panic while holding the lock leaves the Vec intact.
    fn lock(&self) -> MutexGuard<'_, Vec<DependencyRecord>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Tracer for RecordingTracer {
    fn trace_dependency(&self, _ctx: &QueryContext, record: DependencyRecord) {
        self.lock().push(record);
    }
}
