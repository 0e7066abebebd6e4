//! Timing, span bookkeeping and dependency reporting shared by traced
//! connections and transactions.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use sea_orm::sea_query::Values;
use sea_orm::{ConnectionTrait, DbBackend, DbErr, ExecResult, FromQueryResult, Statement};
use tracing::{field, Instrument, Span};

use crate::config::TracingConfig;
use crate::context::QueryContext;
use crate::driver;
use crate::named::{self, NamedArgs};
use crate::parser::ParsedSql;
use crate::tracer::{DependencyRecord, Tracer};

/// Target of the events printed in verbose mode.
pub const VERBOSE_TARGET: &str = "traced_sea_orm::verbose";

/// A traced database operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FetchOne,
    FetchMany,
    Execute,
    NamedExecute,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::FetchOne => "FetchOne",
            Operation::FetchMany => "FetchMany",
            Operation::Execute => "Execute",
            Operation::NamedExecute => "NamedExecute",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracer, configuration and backend of one traced connection, shared with
/// every transaction begun from it. `backend` is `None` for a disconnected
/// handle.
#[derive(Clone)]
pub(crate) struct Instrumentation {
    tracer: Arc<dyn Tracer>,
    config: Arc<TracingConfig>,
    backend: Option<DbBackend>,
}

impl fmt::Debug for Instrumentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instrumentation")
            .field("config", &self.config)
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

impl Instrumentation {
    pub(crate) fn new(
        tracer: Arc<dyn Tracer>,
        config: TracingConfig,
        backend: Option<DbBackend>,
    ) -> Self {
        Self {
            tracer,
            config: Arc::new(config),
            backend,
        }
    }

    pub(crate) fn config(&self) -> &TracingConfig {
        &self.config
    }

    pub(crate) fn driver_name(&self) -> &'static str {
        self.backend.map_or(driver::DISCONNECTED, driver::driver_name)
    }

    pub(crate) async fn fetch_one<T, C>(
        &self,
        conn: &C,
        ctx: &QueryContext,
        stmt: Statement,
    ) -> Result<T, DbErr>
    where
        T: FromQueryResult,
        C: ConnectionTrait,
    {
        let sql = stmt.sql.clone();
        let values = self.diagnostic_values(|| stmt.values.clone());
        self.run(
            ctx,
            Operation::FetchOne,
            &sql,
            values.as_ref(),
            |_: &T| 1,
            driver::fetch_one(conn, ctx, stmt),
        )
        .await
    }

    pub(crate) async fn fetch_many<T, C>(
        &self,
        conn: &C,
        ctx: &QueryContext,
        stmt: Statement,
    ) -> Result<Vec<T>, DbErr>
    where
        T: FromQueryResult,
        C: ConnectionTrait,
    {
        let sql = stmt.sql.clone();
        let values = self.diagnostic_values(|| stmt.values.clone());
        self.run(
            ctx,
            Operation::FetchMany,
            &sql,
            values.as_ref(),
            |rows: &Vec<T>| rows.len() as u64,
            driver::fetch_many(conn, ctx, stmt),
        )
        .await
    }

    pub(crate) async fn execute<C>(
        &self,
        conn: &C,
        ctx: &QueryContext,
        stmt: Statement,
    ) -> Result<ExecResult, DbErr>
    where
        C: ConnectionTrait,
    {
        let sql = stmt.sql.clone();
        let values = self.diagnostic_values(|| stmt.values.clone());
        self.run(
            ctx,
            Operation::Execute,
            &sql,
            values.as_ref(),
            ExecResult::rows_affected,
            driver::execute(conn, ctx, stmt),
        )
        .await
    }

    /// The reported query text is `sql` as written, with its `:name`
    /// placeholders.
    pub(crate) async fn named_execute<C, A>(
        &self,
        conn: &C,
        ctx: &QueryContext,
        sql: &str,
        args: &A,
    ) -> Result<ExecResult, DbErr>
    where
        C: ConnectionTrait,
        A: NamedArgs + ?Sized,
    {
        let values = self.diagnostic_values(|| {
            let backend = self.backend?;
            named::compile(backend, sql, args)
                .ok()
                .and_then(|stmt| stmt.values)
        });
        self.run(
            ctx,
            Operation::NamedExecute,
            sql,
            values.as_ref(),
            ExecResult::rows_affected,
            driver::named_execute(conn, ctx, self.backend, sql, args),
        )
        .await
    }

    /// Bound values, only when verbose printing or parameter logging wants them.
    fn diagnostic_values(&self, values: impl FnOnce() -> Option<Values>) -> Option<Values> {
        if self.config.verbose || self.config.log_parameters {
            values()
        } else {
            None
        }
    }

    /// Time `call`, record its outcome on a `db.query` span and report exactly
    /// one dependency record. The result is returned untouched.
    async fn run<T, F>(
        &self,
        ctx: &QueryContext,
        operation: Operation,
        sql: &str,
        values: Option<&Values>,
        row_count: fn(&T) -> u64,
        call: F,
    ) -> Result<T, DbErr>
    where
        F: Future<Output = Result<T, DbErr>>,
    {
        let span = self.create_span(operation, sql, values);
        if self.config.verbose {
            self.print_verbose(operation, sql, values);
        }

        let start = SystemTime::now();
        let timer = Instant::now();
        let result = call.instrument(span.clone()).await;
        let elapsed = timer.elapsed();
        let end = start + elapsed;

        self.record_result(&span, &result, elapsed, row_count);
        self.report(ctx, operation, sql, &result, start, end);

        result
    }

    /// Create a tracing span for a database operation.
    fn create_span(&self, operation: Operation, sql: &str, values: Option<&Values>) -> Span {
        let parsed = ParsedSql::parse(sql);

        let span = tracing::info_span!(
            "db.query",
            otel.name = %parsed.span_name(),
            otel.kind = "client",
            db.system = self.backend.map_or(driver::DISCONNECTED, driver::db_system),
            db.operation = parsed.operation.as_str(),
            db.command = self.config.command_name(operation),
            db.sql.table = field::Empty,
            db.statement = field::Empty,
            db.parameters = field::Empty,
            db.rows_affected = field::Empty,
            db.duration_ms = field::Empty,
            db.name = field::Empty,
            service.name = %self.config.service_name,
            otel.status_code = field::Empty,
            error.message = field::Empty,
            slow_query = field::Empty,
        );

        if let Some(table) = &parsed.table {
            span.record("db.sql.table", table.as_str());
        }
        if let Some(db_name) = &self.config.database_name {
            span.record("db.name", db_name.as_str());
        }
        if self.config.log_statements {
            span.record("db.statement", sql);
        }
        if self.config.log_parameters {
            if let Some(values) = values {
                span.record("db.parameters", field::debug(&values.0));
            }
        }

        span
    }

    /// Print the query from a detached task. Without a tokio runtime the
    /// event is emitted inline.
    fn print_verbose(&self, operation: Operation, sql: &str, values: Option<&Values>) {
        let sql = sql.to_owned();
        let args = values.map(|values| values.0.clone()).unwrap_or_default();
        let service = self.config.service_name.clone();
        let print = move || {
            tracing::info!(
                target: VERBOSE_TARGET,
                service_name = %service,
                command = operation.as_str(),
                query = %sql,
                args = ?args,
                "executing query"
            );
        };

        match tokio::runtime::Handle::try_current() {
            // Never joined.
            Ok(handle) => drop(handle.spawn(async move { print() })),
            Err(_) => print(),
        }
    }

    /// Record the result of a database operation in the span.
    fn record_result<T>(
        &self,
        span: &Span,
        result: &Result<T, DbErr>,
        elapsed: Duration,
        row_count: fn(&T) -> u64,
    ) {
        let duration_ms = elapsed.as_millis() as i64;
        span.record("db.duration_ms", duration_ms);

        if elapsed > self.config.slow_query_threshold {
            span.record("slow_query", true);
            let threshold_ms = self.config.slow_query_threshold.as_millis() as i64;
            tracing::warn!(
                parent: span,
                duration_ms = duration_ms,
                threshold_ms = threshold_ms,
                "Slow query detected"
            );
        }

        match result {
            Ok(value) => {
                if self.config.record_row_counts {
                    span.record("db.rows_affected", row_count(value));
                }
                span.record("otel.status_code", "OK");
            }
            Err(e) => {
                span.record("otel.status_code", "ERROR");
                span.record("error.message", e.to_string().as_str());
                tracing::error!(
                    parent: span,
                    error = %e,
                    "Database query failed"
                );
            }
        }
    }

    fn report<T>(
        &self,
        ctx: &QueryContext,
        operation: Operation,
        sql: &str,
        result: &Result<T, DbErr>,
        start: SystemTime,
        end: SystemTime,
    ) {
        let fields = result.as_ref().err().map(|err| {
            HashMap::from([
                ("error".to_string(), err.to_string()),
                ("query".to_string(), sql.to_string()),
            ])
        });

        self.tracer.trace_dependency(
            ctx,
            DependencyRecord {
                span_id: String::new(),
                dependency_type: self.driver_name(),
                service_name: self.config.service_name.clone(),
                command_name: self.config.command_name(operation),
                success: result.is_ok(),
                start,
                end,
                fields,
            },
        );
    }
}
