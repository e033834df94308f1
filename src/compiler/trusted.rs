//! Raw `query_string` passthrough for internal diagnostics.
//!
//! The full Lucene grammar lets a caller write arbitrarily expensive queries and probe
//! any indexed field. It is therefore not an operation of [`super::QueryCompiler`]:
//! using it requires a [`TrustedAccess`] token, which deployment code obtains
//! explicitly at the point where the caller is known to be internal.

use tracing::instrument;

use super::{QueryShape, finish};
use crate::Result;
use crate::constants::FIELD_EVERYTHING;
use crate::context::SearchContext;
use crate::dsl::{Clause, CompiledQuery, Operator, QueryString};
use crate::executor::{SearchBackend, execute};
use crate::types::SearchResponse;

/// Proof that the holder was admitted as an internal caller. Deliberately not `Clone`.
#[derive(Debug)]
pub struct TrustedAccess {
    _private: (),
}

impl TrustedAccess {
    /// Grants access to unrestricted queries. Call only behind an internal-only surface.
    #[must_use]
    pub fn assert_internal_caller() -> Self {
        tracing::info!(target: "skyquery::trusted", "unrestricted query access granted");
        Self { _private: () }
    }
}

#[derive(Debug)]
pub struct TrustedSearch {
    _access: TrustedAccess,
}

impl TrustedSearch {
    #[must_use]
    pub fn new(access: TrustedAccess) -> Self {
        Self { _access: access }
    }

    /// Compiles `expression` verbatim. No paging, filters, or sort: backend defaults apply.
    #[must_use]
    pub fn compile(&self, ctx: &SearchContext, expression: &str) -> CompiledQuery {
        let document = CompiledQuery::new(Clause::QueryString(QueryString {
            query: expression.to_string(),
            default_operator: Operator::And,
            analyze_wildcard: true,
            allow_leading_wildcard: false,
            lenient: true,
            default_field: FIELD_EVERYTHING.to_string(),
        }));
        finish(ctx, QueryShape::Unrestricted, document)
    }

    #[instrument(
        target = "skyquery::search",
        name = "search_unrestricted",
        skip_all,
        fields(index = %index, query = %expression)
    )]
    pub async fn search<B: SearchBackend + ?Sized>(
        &self,
        ctx: &SearchContext,
        backend: &B,
        index: &str,
        expression: &str,
    ) -> Result<SearchResponse> {
        let document = self.compile(ctx, expression);
        execute(ctx, backend, index, &document).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn passthrough_document() {
        let ctx = SearchContext::new();
        let trusted = TrustedSearch::new(TrustedAccess::assert_internal_caller());
        let value = trusted
            .compile(&ctx, "handle:al* AND NOT lang:ja")
            .to_value()
            .unwrap();
        assert_eq!(
            value,
            json!({"query": {"query_string": {
                "query": "handle:al* AND NOT lang:ja",
                "default_operator": "and",
                "analyze_wildcard": true,
                "allow_leading_wildcard": false,
                "lenient": true,
                "default_field": "everything"
            }}})
        );
    }
}
