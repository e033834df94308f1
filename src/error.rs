//! Error taxonomy for compiling and executing search queries.

use std::time::Duration;

use thiserror::Error;

/// Errors returned by the compiler, executor, and service facade.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Pagination outside the accepted window. Raised before any backend call.
    #[error("disallowed size/offset parameters (offset={offset}, size={size}): {reason}")]
    InvalidParams {
        offset: i64,
        size: i64,
        reason: &'static str,
    },

    /// The compiled document could not be rendered to its wire form.
    #[error("failed to serialize query: {source}")]
    Serialization {
        #[source]
        source: serde_json::Error,
    },

    /// The backend could not be reached.
    #[error("search transport error: {reason}")]
    Transport {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The caller's cancellation token fired before the backend answered.
    #[error("search request cancelled")]
    Cancelled,

    /// The caller's deadline elapsed before the backend answered.
    #[error("search request timed out after {budget:?}")]
    Timeout { budget: Duration },

    /// The backend answered with a non-success status.
    #[error("search query error, code={status}")]
    Backend { status: u16, body: String },

    /// The backend answered with a success status but an unreadable body.
    #[error("decoding search response: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
    },

    /// Client configuration rejected at construction time.
    #[error("invalid client configuration: {reason}")]
    InvalidConfig { reason: String },
}

/// Coarse classification of [`SearchError`] for callers deciding on retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidParams,
    Serialization,
    Transport,
    Backend,
    Decode,
}

impl SearchError {
    pub(crate) fn transport(
        reason: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidParams { .. } | Self::InvalidConfig { .. } => ErrorKind::InvalidParams,
            Self::Serialization { .. } => ErrorKind::Serialization,
            Self::Transport { .. } | Self::Cancelled | Self::Timeout { .. } => ErrorKind::Transport,
            Self::Backend { .. } => ErrorKind::Backend,
            Self::Decode { .. } => ErrorKind::Decode,
        }
    }

    /// Only transport-level failures are worth retrying, and only by a higher layer.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }

    /// HTTP status carried by a backend rejection.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failure reported by a [`crate::HandleResolver`]. Never surfaced to callers of the compiler.
#[derive(Debug, Error)]
#[error("handle resolution failed for {handle}: {reason}")]
pub struct ResolveError {
    pub handle: String,
    pub reason: String,
}

impl ResolveError {
    pub fn new(handle: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SearchError>;
