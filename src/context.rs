//! Cancellation and deadline context forwarded to every traced operation.

use std::future::Future;
use std::time::Duration;

use sea_orm::DbErr;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

pub(crate) const CANCELED: &str = "context canceled";
pub(crate) const DEADLINE_EXCEEDED: &str = "context deadline exceeded";

/// Carries an optional cancellation token and deadline for a database call.
///
/// Every operation on [`TracedConnection`](crate::TracedConnection) and
/// [`TracedTransaction`](crate::TracedTransaction) takes a context. The driver
/// call races against it: when the token is cancelled or the deadline passes
/// first, the in-flight database future is dropped and the call fails with
/// `DbErr::Custom("context canceled")` or
/// `DbErr::Custom("context deadline exceeded")`.
///
/// Pass [`QueryContext::background()`] when no cancellation is wanted.
///
/// ```rust
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use traced_sea_orm::QueryContext;
///
/// let shutdown = CancellationToken::new();
/// let ctx = QueryContext::with_cancellation(shutdown.child_token())
///     .expires_in(Duration::from_secs(5));
/// assert!(!ctx.is_done());
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    cancel: Option<CancellationToken>,
    deadline: Option<Instant>,
}

impl QueryContext {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context cancelled together with `token`.
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self::background().cancelled_by(token)
    }

    /// A context expiring `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().expires_in(timeout)
    }

    /// A context expiring at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self::background().expires_at(deadline)
    }

    /// Attach a cancellation token, replacing any previous one.
    pub fn cancelled_by(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Attach a deadline. An earlier existing deadline is kept.
    pub fn expires_at(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        });
        self
    }

    /// Attach a deadline `timeout` from now. An earlier existing deadline is kept.
    pub fn expires_in(self, timeout: Duration) -> Self {
        self.expires_at(Instant::now() + timeout)
    }

    pub fn token(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the context is already cancelled or past its deadline.
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// The error a call made under this context would fail with right now.
    pub fn err(&self) -> Option<DbErr> {
        if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Some(DbErr::Custom(CANCELED.to_owned()));
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Some(DbErr::Custom(DEADLINE_EXCEEDED.to_owned()));
        }
        None
    }

    /// Drive `fut` to completion unless the context finishes first.
    pub(crate) async fn run<F, T>(&self, fut: F) -> Result<T, DbErr>
    where
        F: Future<Output = Result<T, DbErr>>,
    {
        if self.cancel.is_none() && self.deadline.is_none() {
            return fut.await;
        }
        if let Some(err) = self.err() {
            return Err(err);
        }

        let cancelled = async {
            match &self.cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            () = cancelled => Err(DbErr::Custom(CANCELED.to_owned())),
            () = expired => Err(DbErr::Custom(DEADLINE_EXCEEDED.to_owned())),
            result = fut => result,
        }
    }
}
