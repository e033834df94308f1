//! Free-text normalization.
//!
//! A [`QueryNormalizer`] turns the raw user query into the string handed to the
//! backend's text matcher plus any filter clauses it recognised inline. The compiler
//! depends only on that contract. [`SyntaxNormalizer`] is the stock implementation: it
//! lifts `from:<handle>` author tokens into `did` filters, resolving handles through an
//! injected [`HandleResolver`]. Normalization never fails; anything it cannot make sense
//! of stays in the text.

use async_trait::async_trait;

use crate::constants::{FIELD_DID, MATCH_ALL_QUERY};
use crate::context::SearchContext;
use crate::dsl::Clause;
use crate::error::ResolveError;

/// Resolves human-readable handles (`alice.example.com`) to stable actor ids.
#[async_trait]
pub trait HandleResolver: Send + Sync {
    /// `Ok(None)` when the handle is well-formed but unknown.
    async fn resolve_handle(&self, handle: &str) -> Result<Option<String>, ResolveError>;
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedQuery {
    pub query: String,
    pub filters: Vec<Clause>,
}

impl NormalizedQuery {
    /// Text with no extracted filters; empty input becomes the match-all query.
    pub fn text(query: impl Into<String>) -> Self {
        let query = query.into();
        let query = if query.trim().is_empty() {
            MATCH_ALL_QUERY.to_string()
        } else {
            query
        };
        Self {
            query,
            filters: Vec::new(),
        }
    }
}

#[async_trait]
pub trait QueryNormalizer: Send + Sync {
    async fn normalize(&self, ctx: &SearchContext, raw: &str) -> NormalizedQuery;
}

/// Leaves the text untouched apart from the empty-input rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNormalizer;

#[async_trait]
impl QueryNormalizer for NoopNormalizer {
    async fn normalize(&self, _ctx: &SearchContext, raw: &str) -> NormalizedQuery {
        NormalizedQuery::text(raw.trim())
    }
}

#[derive(Debug, Clone)]
pub struct SyntaxNormalizer<R> {
    resolver: R,
}

impl<R: HandleResolver> SyntaxNormalizer<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Actor id for a `from:` token, or `None` if the token should stay literal.
    async fn author_filter(&self, ctx: &SearchContext, token: &str) -> Option<String> {
        let target = token.strip_prefix("from:")?;
        let target = target.strip_prefix('@').unwrap_or(target);
        if target.starts_with("did:") {
            return is_valid_did(target).then(|| target.to_string());
        }

        let handle = target.to_ascii_lowercase();
        if !is_valid_handle(&handle) {
            return None;
        }

        match ctx
            .interruptible(self.resolver.resolve_handle(&handle))
            .await
        {
            Some(Ok(Some(did))) => Some(did),
            Some(Ok(None)) => {
                tracing::debug!(
                    target: "skyquery::normalize",
                    handle = %handle,
                    "handle not found, keeping token as text"
                );
                None
            }
            Some(Err(err)) => {
                tracing::debug!(
                    target: "skyquery::normalize",
                    error = %err,
                    "failed to resolve handle, keeping token as text"
                );
                None
            }
            None => {
                tracing::debug!(
                    target: "skyquery::normalize",
                    handle = %handle,
                    "handle resolution interrupted"
                );
                None
            }
        }
    }
}

#[async_trait]
impl<R: HandleResolver> QueryNormalizer for SyntaxNormalizer<R> {
    async fn normalize(&self, ctx: &SearchContext, raw: &str) -> NormalizedQuery {
        let mut filters = Vec::new();
        let mut kept = Vec::new();

        for token in split_query(raw) {
            match self.author_filter(ctx, token).await {
                Some(did) => filters.push(Clause::term(FIELD_DID, did)),
                None => kept.push(token),
            }
        }

        let mut normalized = NormalizedQuery::text(kept.join(" "));
        normalized.filters = filters;
        normalized
    }
}

/// Splits on spaces outside double quotes; quoted phrases stay one token, quotes included.
pub(crate) fn split_query(raw: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut quoted = false;
    let mut start = None;

    for (i, ch) in raw.char_indices() {
        if ch == '"' {
            quoted = !quoted;
        }
        if ch == ' ' && !quoted {
            if let Some(s) = start.take() {
                tokens.push(&raw[s..i]);
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        tokens.push(&raw[s..]);
    }
    tokens
}

/// `did:<method>:<id>` with a lowercase method.
pub(crate) fn is_valid_did(value: &str) -> bool {
    let mut parts = value.splitn(3, ':');
    let (Some("did"), Some(method), Some(id)) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !method.is_empty()
        && method.bytes().all(|b| b.is_ascii_lowercase())
        && !id.is_empty()
        && !id.ends_with(':')
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b':' | b'%' | b'-'))
}

/// Domain-style handle: two or more labels, alphanumeric with inner hyphens, TLD not
/// starting with a digit.
pub(crate) fn is_valid_handle(value: &str) -> bool {
    if value.is_empty() || value.len() > 253 {
        return false;
    }
    let labels: Vec<&str> = value.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
    });
    let tld_ok = labels
        .last()
        .and_then(|tld| tld.bytes().next())
        .is_some_and(|b| b.is_ascii_alphabetic());
    labels_ok && tld_ok
}
