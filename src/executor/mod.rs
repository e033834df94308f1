//! Query execution against the search backend.
//!
//! [`execute`] serializes a compiled document, submits it through a caller-owned
//! [`SearchBackend`], and maps the outcome onto the crate's error taxonomy. It is
//! single-shot: retry policy belongs to the caller.

use async_trait::async_trait;
use tracing::instrument;

use crate::context::SearchContext;
use crate::dsl::CompiledQuery;
use crate::types::SearchResponse;
use crate::{Result, SearchError};

mod http;

pub use http::HttpSearchBackend;

/// Raw backend answer: status code and undecoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl BackendResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The search request API of a backend cluster.
///
/// Implementations are shared across concurrent calls and must not hold per-call state.
/// Failures to reach the backend are reported as [`SearchError::Transport`]; any HTTP
/// answer, successful or not, is returned as a [`BackendResponse`].
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, index: &str, body: Vec<u8>) -> Result<BackendResponse>;
}

#[instrument(
    target = "skyquery::execute",
    name = "execute",
    skip_all,
    fields(
        index = %index,
        query_bytes = tracing::field::Empty,
        query = tracing::field::Empty,
        hits = tracing::field::Empty,
    )
)]
pub async fn execute<B: SearchBackend + ?Sized>(
    ctx: &SearchContext,
    backend: &B,
    index: &str,
    query: &CompiledQuery,
) -> Result<SearchResponse> {
    ctx.ensure_active()?;
    let body = query.to_json()?;

    let span = tracing::Span::current();
    {
        let text = String::from_utf8_lossy(&body);
        span.record("query_bytes", body.len());
        span.record("query", &*text);
        tracing::info!(target: "skyquery::execute", index, query = %text, "sending query");
    }
    ctx.observe(|o| o.on_request(index, &body));

    let response = ctx.run(backend.search(index, body)).await?;

    if !response.is_success() {
        let raw = String::from_utf8_lossy(&response.body).into_owned();
        tracing::warn!(
            target: "skyquery::execute",
            index,
            status_code = response.status,
            resp = %raw,
            "search query error"
        );
        ctx.observe(|o| o.on_backend_error(index, response.status, &raw));
        return Err(SearchError::Backend {
            status: response.status,
            body: raw,
        });
    }

    let decoded: SearchResponse = serde_json::from_slice(&response.body)
        .map_err(|source| SearchError::Decode { source })?;
    span.record("hits", decoded.len());
    ctx.observe(|o| o.on_response(index, &decoded));

    Ok(decoded)
}
