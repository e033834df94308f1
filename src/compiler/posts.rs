//! Recency-ordered post search.

use chrono::{DateTime, Utc};

use super::{QueryCompiler, QueryShape, finish, terms_filter, text_match};
use crate::Result;
use crate::constants::{FIELD_CREATED_AT, FIELD_DID, FIELD_LANG, FIELD_TAG};
use crate::context::SearchContext;
use crate::dsl::{BoolQuery, Clause, CompiledQuery, RangeBounds, SortKey};
use crate::normalize::QueryNormalizer;
use crate::pagination::Page;
use crate::types::PostSearchQuery;

impl<N: QueryNormalizer> QueryCompiler<N> {
    /// Free-text post search, newest first.
    pub async fn compile_posts(
        &self,
        ctx: &SearchContext,
        query: &str,
        offset: i64,
        size: i64,
    ) -> Result<CompiledQuery> {
        let page = Page::checked(offset, size)?;
        let normalized = self.normalized(ctx, query).await?;

        let mut filters = normalized.filters;
        filters.push(created_at_range(None, None, self.now()));

        Ok(finish(
            ctx,
            QueryShape::Posts,
            posts_document(normalized.query, filters, page),
        ))
    }

    /// Post search with date range and actor/tag/language facets, newest first.
    pub async fn compile_posts_structured(
        &self,
        ctx: &SearchContext,
        q: &PostSearchQuery,
    ) -> Result<CompiledQuery> {
        let page = Page::checked(q.offset, q.size)?;
        let normalized = self.normalized(ctx, &q.query).await?;

        let mut filters = normalized.filters;
        filters.push(created_at_range(q.from, q.to, self.now()));
        filters.extend(terms_filter(FIELD_DID, &q.actors));
        filters.extend(terms_filter(FIELD_TAG, &q.tags));
        filters.extend(terms_filter(FIELD_LANG, &q.langs));

        Ok(finish(
            ctx,
            QueryShape::StructuredPosts,
            posts_document(normalized.query, filters, page),
        ))
    }
}

/// Future-dated records are never returned: the upper bound is `to` or, failing that, now.
fn created_at_range(
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Clause {
    Clause::range(
        FIELD_CREATED_AT,
        RangeBounds {
            gte: from,
            lte: Some(to.unwrap_or(now)),
        },
    )
}

fn posts_document(text: String, filters: Vec<Clause>, page: Page) -> CompiledQuery {
    let query = BoolQuery::must(text_match(text)).with_filters(filters);
    CompiledQuery::new(Clause::Bool(Box::new(query)))
        .sorted_by(SortKey::desc(FIELD_CREATED_AT))
        .paged(Some(page.from), page.size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SearchError;
    use crate::normalize::NoopNormalizer;
    use chrono::TimeZone;
    use serde_json::json;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 30, 0).unwrap()
    }

    fn compiler() -> QueryCompiler<NoopNormalizer> {
        QueryCompiler::new(NoopNormalizer).with_clock(fixed_now)
    }

    #[tokio::test]
    async fn plain_posts_document() {
        let ctx = SearchContext::new();
        let doc = compiler()
            .compile_posts(&ctx, "hello world", 20, 10)
            .await
            .unwrap();
        let value = doc.to_value().unwrap();

        assert_eq!(
            value["query"]["bool"]["must"]["simple_query_string"]["query"],
            json!("hello world")
        );
        assert_eq!(
            value["query"]["bool"]["filter"],
            json!([{"range": {"created_at": {"lte": "2025-06-01T12:30:00.000Z"}}}])
        );
        assert_eq!(value["sort"], json!({"created_at": {"order": "desc"}}));
        assert_eq!(value["from"], json!(20));
        assert_eq!(value["size"], json!(10));
        assert!(value["query"]["bool"].get("should").is_none());
    }

    #[tokio::test]
    async fn explicit_to_replaces_now() {
        let ctx = SearchContext::new();
        let to = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let q = PostSearchQuery::builder().query("x").size(5).until(to).build();
        let doc = compiler().compile_posts_structured(&ctx, &q).await.unwrap();
        let value = doc.to_value().unwrap();
        assert_eq!(
            value["query"]["bool"]["filter"][0]["range"]["created_at"],
            json!({"lte": "2024-03-01T00:00:00.000Z"})
        );
    }

    #[tokio::test]
    async fn facets_in_fixed_order() {
        let ctx = SearchContext::new();
        let q = PostSearchQuery::builder()
            .query("x")
            .size(5)
            .lang("en")
            .tag("rust")
            .actor("did:plc:abc")
            .build();
        let doc = compiler().compile_posts_structured(&ctx, &q).await.unwrap();
        let kinds: Vec<_> = doc.filters().iter().map(Clause::kind).collect();
        assert_eq!(kinds, vec!["range", "terms", "terms", "terms"]);

        let value = doc.to_value().unwrap();
        let filter = &value["query"]["bool"]["filter"];
        assert_eq!(filter[1], json!({"terms": {"did": ["did:plc:abc"]}}));
        assert_eq!(filter[2], json!({"terms": {"tag": ["rust"]}}));
        assert_eq!(filter[3], json!({"terms": {"lang": ["en"]}}));
    }

    #[tokio::test]
    async fn invalid_paging_rejected_before_normalizing() {
        let ctx = SearchContext::new();
        let err = compiler()
            .compile_posts(&ctx, "x", 9_999, 2)
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::InvalidParams { .. }));
    }
}
