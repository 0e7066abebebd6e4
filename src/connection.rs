//! Traced database connection wrapper.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    AccessMode, ConnectionTrait, DatabaseConnection, DbErr, ExecResult, FromQueryResult,
    IsolationLevel, Statement, TransactionTrait,
};

use crate::config::TracingConfig;
use crate::context::QueryContext;
use crate::executor::TracedExecutor;
use crate::instrument::Instrumentation;
use crate::named::NamedArgs;
use crate::tracer::Tracer;
use crate::transaction::TracedTransaction;

/// A traced wrapper around SeaORM's `DatabaseConnection`.
///
/// Each [`TracedExecutor`] call is timed and reported to the [`Tracer`] as one
/// dependency record, then its result is handed back unchanged. Dropping the
/// wrapper never closes the pool. To share one wrapper across tasks, put it
/// in an `Arc`.
///
/// A `DatabaseConnection::Disconnected` handle is accepted. Its operations
/// fail with the driver's error and are reported under the
/// `"disconnected"` driver name.
///
/// Transactions begun through [`begin`](TracedConnection::begin) share this
/// connection's tracer and configuration. Beginning one reports nothing.
///
/// # Example
///
/// ```rust,ignore
/// use sea_orm::{Database, Statement};
/// use traced_sea_orm::prelude::*;
///
/// let db = Database::connect("postgres://localhost/mydb").await?;
/// let traced = TracedConnection::new(db, LogTracer, "billing");
///
/// let ctx = QueryContext::background();
/// let invoices: Vec<Invoice> = traced.fetch_many(&ctx, stmt).await?;
/// ```
#[derive(Debug)]
pub struct TracedConnection {
    inner: DatabaseConnection,
    instrumentation: Instrumentation,
}

impl TracedConnection {
    /// Wrap `connection`, reporting to `tracer` under `service_name`.
    pub fn new<T>(connection: DatabaseConnection, tracer: T, service_name: impl Into<String>) -> Self
    where
        T: Tracer + 'static,
    {
        Self::with_config(connection, tracer, TracingConfig::new(service_name))
    }

    /// Wrap `connection` with a full configuration.
    pub fn with_config<T>(connection: DatabaseConnection, tracer: T, config: TracingConfig) -> Self
    where
        T: Tracer + 'static,
    {
        let backend = match &connection {
            DatabaseConnection::Disconnected => None,
            connected => Some(connected.get_database_backend()),
        };
        Self {
            inner: connection,
            instrumentation: Instrumentation::new(Arc::new(tracer), config, backend),
        }
    }

    /// Get a reference to the underlying `DatabaseConnection`.
    pub fn inner(&self) -> &DatabaseConnection {
        &self.inner
    }

    /// Consume the wrapper and return the inner `DatabaseConnection`.
    pub fn into_inner(self) -> DatabaseConnection {
        self.inner
    }

    pub fn config(&self) -> &TracingConfig {
        self.instrumentation.config()
    }

    /// Begin a transaction whose operations are traced like this connection's.
    pub async fn begin(&self) -> Result<TracedTransaction, DbErr> {
        let transaction = self.inner.begin().await?;
        Ok(TracedTransaction::new(transaction, self.instrumentation.clone()))
    }

    /// Begin a transaction with an explicit isolation level and access mode.
    pub async fn begin_with_config(
        &self,
        isolation_level: Option<IsolationLevel>,
        access_mode: Option<AccessMode>,
    ) -> Result<TracedTransaction, DbErr> {
        let transaction = self
            .inner
            .begin_with_config(isolation_level, access_mode)
            .await?;
        Ok(TracedTransaction::new(transaction, self.instrumentation.clone()))
    }

    /// Begin a transaction, panicking if the database refuses.
    ///
    /// # Panics
    ///
    /// Panics with the driver error when the transaction cannot be started.
    pub async fn must_begin(&self) -> TracedTransaction {
        match self.begin().await {
            Ok(transaction) => transaction,
            Err(err) => panic!("failed to begin transaction: {err}"),
        }
    }
}

impl AsRef<DatabaseConnection> for TracedConnection {
    fn as_ref(&self) -> &DatabaseConnection {
        &self.inner
    }
}

#[async_trait]
impl TracedExecutor for TracedConnection {
    fn driver_name(&self) -> &'static str {
        self.instrumentation.driver_name()
    }

    fn service_name(&self) -> &str {
        &self.config().service_name
    }

    async fn fetch_one<T>(&self, ctx: &QueryContext, stmt: Statement) -> Result<T, DbErr>
    where
        T: FromQueryResult + Send,
    {
        self.instrumentation.fetch_one(&self.inner, ctx, stmt).await
    }

    async fn fetch_many<T>(&self, ctx: &QueryContext, stmt: Statement) -> Result<Vec<T>, DbErr>
    where
        T: FromQueryResult + Send,
    {
        self.instrumentation.fetch_many(&self.inner, ctx, stmt).await
    }

    async fn execute(&self, ctx: &QueryContext, stmt: Statement) -> Result<ExecResult, DbErr> {
        self.instrumentation.execute(&self.inner, ctx, stmt).await
    }

    async fn named_execute<A>(
        &self,
        ctx: &QueryContext,
        sql: &str,
        args: &A,
    ) -> Result<ExecResult, DbErr>
    where
        A: NamedArgs + Sync + ?Sized,
    {
        self.instrumentation
            .named_execute(&self.inner, ctx, sql, args)
            .await
    }
}

/// Extension trait for easy wrapping of database connections.
pub trait TracingExt {
    /// Wrap this connection, reporting to `tracer` under `service_name`.
    fn with_tracer<T>(self, tracer: T, service_name: impl Into<String>) -> TracedConnection
    where
        T: Tracer + 'static;

    /// Wrap this connection with a full tracing configuration.
    fn with_tracer_config<T>(self, tracer: T, config: TracingConfig) -> TracedConnection
    where
        T: Tracer + 'static;
}

impl TracingExt for DatabaseConnection {
    fn with_tracer<T>(self, tracer: T, service_name: impl Into<String>) -> TracedConnection
    where
        T: Tracer + 'static,
    {
        TracedConnection::new(self, tracer, service_name)
    }

    fn with_tracer_config<T>(self, tracer: T, config: TracingConfig) -> TracedConnection
    where
        T: Tracer + 'static,
    {
        TracedConnection::with_config(self, tracer, config)
    }
}
