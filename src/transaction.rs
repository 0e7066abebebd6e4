//! Traced transaction wrapper.

use std::fmt;

use async_trait::async_trait;
use sea_orm::{DatabaseTransaction, DbErr, ExecResult, FromQueryResult, Statement};

use crate::context::QueryContext;
use crate::executor::TracedExecutor;
use crate::instrument::Instrumentation;
use crate::named::NamedArgs;

/// A traced wrapper around SeaORM's `DatabaseTransaction`.
///
/// Created by [`TracedConnection::begin`](crate::TracedConnection::begin) and
/// its variants. Operations are traced exactly like the connection's.
/// [`commit`](Self::commit) and [`rollback`](Self::rollback) pass straight
/// through and report nothing. Dropping the wrapper without committing rolls
/// the transaction back, as SeaORM does.
pub struct TracedTransaction {
    inner: DatabaseTransaction,
    instrumentation: Instrumentation,
}

impl TracedTransaction {
    pub(crate) fn new(inner: DatabaseTransaction, instrumentation: Instrumentation) -> Self {
        Self {
            inner,
            instrumentation,
        }
    }

    pub fn inner(&self) -> &DatabaseTransaction {
        &self.inner
    }

    /// Unwrap into the SeaORM transaction. Later calls on it are not traced.
    pub fn into_inner(self) -> DatabaseTransaction {
        self.inner
    }

    pub async fn commit(self) -> Result<(), DbErr> {
        self.inner.commit().await
    }

    pub async fn rollback(self) -> Result<(), DbErr> {
        self.inner.rollback().await
    }
}

impl fmt::Debug for TracedTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracedTransaction")
            .field("instrumentation", &self.instrumentation)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TracedExecutor for TracedTransaction {
    fn driver_name(&self) -> &'static str {
        self.instrumentation.driver_name()
    }

    fn service_name(&self) -> &str {
        &self.instrumentation.config().service_name
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
