//! Untraced database calls that the traced handles delegate to.

use sea_orm::{ConnectionTrait, DbBackend, DbErr, ExecResult, FromQueryResult, Statement};

use crate::context::QueryContext;
use crate::named::{self, NamedArgs};

/// Message of the error returned when a single-row fetch finds no row.
pub(crate) const NO_ROWS: &str = "no rows in result set";

/// Driver name reported for a `DatabaseConnection::Disconnected` handle.
pub const DISCONNECTED: &str = "disconnected";

/// Driver name reported as the dependency type.
pub fn driver_name(backend: DbBackend) -> &'static str {
    match backend {
        DbBackend::Postgres => "postgres",
        DbBackend::MySql => "mysql",
        DbBackend::Sqlite => "sqlite",
    }
}

/// OpenTelemetry `db.system` value for span attributes.
pub(crate) fn db_system(backend: DbBackend) -> &'static str {
    match backend {
        DbBackend::Postgres => "postgresql",
        DbBackend::MySql => "mysql",
        DbBackend::Sqlite => "sqlite",
    }
}

/// Fetch exactly one row. An empty result is `DbErr::RecordNotFound`.
pub(crate) async fn fetch_one<T, C>(conn: &C, ctx: &QueryContext, stmt: Statement) -> Result<T, DbErr>
where
    T: FromQueryResult,
    C: ConnectionTrait,
{
    ctx.run(async {
        T::find_by_statement(stmt)
            .one(conn)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(NO_ROWS.to_owned()))
    })
    .await
}

pub(crate) async fn fetch_many<T, C>(
    conn: &C,
    ctx: &QueryContext,
    stmt: Statement,
) -> Result<Vec<T>, DbErr>
where
    T: FromQueryResult,
    C: ConnectionTrait,
{
    ctx.run(T::find_by_statement(stmt).all(conn)).await
}

pub(crate) async fn execute<C>(conn: &C, ctx: &QueryContext, stmt: Statement) -> Result<ExecResult, DbErr>
where
    C: ConnectionTrait,
{
    ctx.run(conn.execute(stmt)).await
}

/// Bind `:name` placeholders from `args`, then execute.
///
/// `backend` is `None` for a disconnected handle. The SQL then goes to the
/// driver unbound, which refuses it with its own connection error.
pub(crate) async fn named_execute<C, A>(
    conn: &C,
    ctx: &QueryContext,
    backend: Option<DbBackend>,
    sql: &str,
    args: &A,
) -> Result<ExecResult, DbErr>
where
    C: ConnectionTrait,
    A: NamedArgs + ?Sized,
{
    ctx.run(async {
        let stmt = match backend {
            Some(backend) => named::compile(backend, sql, args)?,
            None => Statement::from_string(DbBackend::Postgres, sql),
        };
        conn.execute(stmt).await
    })
    .await
}
