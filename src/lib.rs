//! # traced-sea-orm
//!
//! Dependency-call tracing for SeaORM connections and transactions.
//!
//! Every query issued through a [`TracedConnection`] or [`TracedTransaction`]
//! is timed and reported to a [`Tracer`] as one [`DependencyRecord`]: driver
//! name, service name, operation, success flag, start and end timestamps, and
//! on failure the error message and query text. The query itself is always
//! run by the wrapped SeaORM handle and its result is returned unchanged.
//!
//! ## Features
//!
//! - **One record per call**: success or failure, never zero, never two
//! - **Pluggable sink**: implement [`Tracer`] for your collector, or use
//!   [`LogTracer`] to emit records as `tracing` events
//! - **Cancellation**: every call takes a [`QueryContext`] carrying an optional
//!   cancellation token and deadline
//! - **Named parameters**: `:name` placeholders bound from maps or your own
//!   [`NamedArgs`] types
//! - **Verbose mode**: optional query print from a detached task
//! - **Spans**: `db.query` spans with OpenTelemetry attributes around each call
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sea_orm::{Database, DbBackend, Statement};
//! use traced_sea_orm::prelude::*;
//!
//! let db = Database::connect("postgres://localhost/mydb").await?;
//! let traced = TracedConnection::new(db, LogTracer, "billing");
//!
//! let ctx = QueryContext::background();
//! traced
//!     .named_execute(
//!         &ctx,
//!         "UPDATE invoices SET paid = true WHERE id = :id",
//!         &[("id", sea_orm::Value::from(42))],
//!     )
//!     .await?;
//!
//! let tx = traced.begin().await?;
//! let invoice: Invoice = tx
//!     .fetch_one(&ctx, Statement::from_string(DbBackend::Postgres, "SELECT * FROM invoices LIMIT 1"))
//!     .await?;
//! tx.commit().await?;
//! ```
//!
//! ## Configuration
//!
//! ```rust,ignore
//! use traced_sea_orm::{TracedConnection, TracingConfig};
//!
//! let config = TracingConfig::from_env("billing") // verbose from TRACED_SEA_ORM_VERBOSE
//!     .with_statement_logging(true)
//!     .with_slow_query_threshold(Duration::from_millis(100));
//!
//! let traced = TracedConnection::with_config(db, LogTracer, config);
//! ```
//!
//! ## Span Attributes
//!
//! | Attribute | Description |
//! |-----------|-------------|
//! | `db.system` | "postgresql", "mysql", or "sqlite" |
//! | `db.operation` | SQL operation (SELECT, INSERT, UPDATE, DELETE) |
//! | `db.command` | Traced operation (FetchOne, FetchMany, Execute, NamedExecute) |
//! | `db.sql.table` | Target table name (when detectable) |
//! | `db.statement` | Full SQL query (when enabled) |
//! | `db.parameters` | Bound values (when enabled) |
//! | `db.rows_affected` | Number of rows returned/affected |
//! | `otel.status_code` | "OK" or "ERROR" |
//! | `error.message` | Error details (on failure) |

mod config;
mod connection;
mod context;
mod driver;
mod executor;
mod instrument;
mod named;
mod parser;
mod tracer;
mod transaction;

pub use config::{TracingConfig, VERBOSE_ENV};
pub use connection::{TracedConnection, TracingExt};
pub use context::QueryContext;
pub use driver::driver_name;
pub use executor::TracedExecutor;
pub use instrument::{Operation, VERBOSE_TARGET};
pub use named::{compile as compile_named, NamedArgs};
pub use parser::{extract_table, parse_operation, ParsedSql, SqlOperation};
pub use tracer::{DependencyRecord, LogTracer, NoopTracer, RecordingTracer, Tracer};
pub use transaction::TracedTransaction;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        LogTracer, QueryContext, TracedConnection, TracedExecutor, TracedTransaction, Tracer,
        TracingConfig, TracingExt,
    };
}
