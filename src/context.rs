//! Per-call context: cancellation, deadline, and an optional observer.
//!
//! A [`SearchContext`] is created by the caller for each request and threaded through
//! normalization and execution. It holds no shared mutable state; cloning it shares the
//! same cancellation token and observer.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;

use crate::compiler::QueryShape;
use crate::dsl::CompiledQuery;
use crate::types::SearchResponse;
use crate::{Result, SearchError};

/// Caller-held cancel switch. Clones share state; once cancelled it stays cancelled.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelState>,
}

#[derive(Default)]
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels every call holding this token. Idempotent.
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::SeqCst) {
            self.inner.notify.notify_waiters();
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once [`Self::cancel`] has been called.
    pub async fn cancelled(&self) {
        loop {
            // Register before checking the flag so a concurrent cancel is never missed.
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Side-channel hooks invoked while a query is compiled and executed.
///
/// All methods default to no-ops so implementors only override what they record.
pub trait QueryObserver: Send + Sync {
    fn on_compiled(&self, _shape: QueryShape, _query: &CompiledQuery) {}

    fn on_request(&self, _index: &str, _body: &[u8]) {}

    fn on_backend_error(&self, _index: &str, _status: u16, _body: &str) {}

    fn on_response(&self, _index: &str, _response: &SearchResponse) {}
}

#[derive(Clone, Default)]
pub struct SearchContext {
    cancel: CancelToken,
    deadline: Option<(Instant, Duration)>,
    observer: Option<Arc<dyn QueryObserver>>,
}

impl fmt::Debug for SearchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchContext")
            .field("cancelled", &self.cancel.is_cancelled())
            .field("timeout", &self.deadline.map(|(_, budget)| budget))
            .field("has_observer", &self.observer.is_some())
            .finish()
    }
}

impl SearchContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ties the call to a caller-owned cancellation token.
    pub fn with_cancellation(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Bounds the whole call, starting now. A budget too large to represent as an
    /// instant leaves the call unbounded.
    pub fn with_timeout(mut self, budget: Duration) -> Self {
        self.deadline = Instant::now()
            .checked_add(budget)
            .map(|deadline| (deadline, budget));
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn QueryObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    #[must_use]
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Fails if the call was cancelled or its deadline already passed.
    pub fn ensure_active(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }
        if let Some((deadline, budget)) = self.deadline {
            if Instant::now() >= deadline {
                return Err(SearchError::Timeout { budget });
            }
        }
        Ok(())
    }

    /// Drives `fut` until it completes, the token fires, or the deadline passes.
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let deadline = self.deadline;
        let expiry = async move {
            match deadline {
                Some((at, budget)) => {
                    tokio::time::sleep_until(at).await;
                    budget
                }
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(SearchError::Cancelled),
            budget = expiry => Err(SearchError::Timeout { budget }),
            out = fut => out,
        }
    }

    /// Like [`Self::run`] for futures that cannot fail; `None` means the call was interrupted.
    pub(crate) async fn interruptible<F, T>(&self, fut: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        self.run(async { Ok(fut.await) }).await.ok()
    }

    pub(crate) fn observe(&self, f: impl FnOnce(&dyn QueryObserver)) {
        if let Some(observer) = self.observer.as_deref() {
            f(observer);
        }
    }
}
