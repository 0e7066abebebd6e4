//! The traced operation set shared by connections and transactions.

use async_trait::async_trait;
use sea_orm::{DbErr, ExecResult, FromQueryResult, Statement};

use crate::context::QueryContext;
use crate::named::NamedArgs;

/// Database operations that report one dependency record per call.
///
/// Implemented by [`TracedConnection`](crate::TracedConnection) and
/// [`TracedTransaction`](crate::TracedTransaction), so repository code can be
/// written once for both:
///
/// ```rust,ignore
/// use sea_orm::{DbErr, Statement};
/// use traced_sea_orm::prelude::*;
///
/// async fn load_user<E: TracedExecutor>(db: &E, id: i32) -> Result<User, DbErr> {
///     let stmt = Statement::from_sql_and_values(
///         sea_orm::DbBackend::Postgres,
///         "SELECT id, name FROM users WHERE id = $1",
///         [id.into()],
///     );
///     db.fetch_one(&QueryContext::background(), stmt).await
/// }
/// ```
///
/// Every method returns exactly what the underlying SeaORM call returned. On
/// failure the tracer receives the error message and the query text; on
/// success it receives no metadata.
#[async_trait]
pub trait TracedExecutor: Send + Sync {
    /// Driver name reported as the dependency type.
    fn driver_name(&self) -> &'static str;

    fn service_name(&self) -> &str;

    /// Fetch exactly one row into `T`.
    ///
    /// No row is an error: `DbErr::RecordNotFound("no rows in result set")`.
    async fn fetch_one<T>(&self, ctx: &QueryContext, stmt: Statement) -> Result<T, DbErr>
    where
        T: FromQueryResult + Send;

    /// Fetch every row into a `Vec<T>`.
    async fn fetch_many<T>(&self, ctx: &QueryContext, stmt: Statement) -> Result<Vec<T>, DbErr>
    where
        T: FromQueryResult + Send;

    /// Execute a statement that returns no rows.
    async fn execute(&self, ctx: &QueryContext, stmt: Statement) -> Result<ExecResult, DbErr>;

    /// Execute `sql` with `:name` placeholders bound from `args`.
    async fn named_execute<A>(
        &self,
        ctx: &QueryContext,
        sql: &str,
        args: &A,
    ) -> Result<ExecResult, DbErr>
    where
        A: NamedArgs + Sync + ?Sized;
}
