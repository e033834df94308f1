//! Profile search ranked by authority score.
//!
//! Text relevance only decides which profiles qualify; ordering comes from `pagerank`.
//! Avatar and banner presence add optional score and the whole bool query is
//! down-weighted, so neither can outrank the authority signal.

use super::{QueryCompiler, QueryShape, finish, terms_filter, text_match};
use crate::Result;
use crate::constants::{
    FIELD_DID, FIELD_HAS_AVATAR, FIELD_HAS_BANNER, FIELD_PAGERANK, PROFILE_RELEVANCE_BOOST,
};
use crate::context::SearchContext;
use crate::dsl::{BoolQuery, Clause, CompiledQuery, SortKey};
use crate::normalize::QueryNormalizer;
use crate::pagination::Page;
use crate::types::ActorSearchQuery;

impl<N: QueryNormalizer> QueryCompiler<N> {
    pub async fn compile_profiles(
        &self,
        ctx: &SearchContext,
        query: &str,
        offset: i64,
        size: i64,
    ) -> Result<CompiledQuery> {
        let page = Page::checked(offset, size)?;
        let normalized = self.normalized(ctx, query).await?;

        Ok(finish(
            ctx,
            QueryShape::Profiles,
            profiles_document(normalized.query, normalized.filters, page),
        ))
    }

    /// Relevance search optionally scoped to the actors in `q.following`.
    pub async fn compile_profiles_structured(
        &self,
        ctx: &SearchContext,
        q: &ActorSearchQuery,
    ) -> Result<CompiledQuery> {
        let page = Page::checked(q.offset, q.size)?;
        let normalized = self.normalized(ctx, &q.query).await?;

        let mut filters = normalized.filters;
        filters.extend(terms_filter(FIELD_DID, &q.following));

        Ok(finish(
            ctx,
            QueryShape::StructuredProfiles,
            profiles_document(normalized.query, filters, page),
        ))
    }
}

fn profiles_document(text: String, filters: Vec<Clause>, page: Page) -> CompiledQuery {
    let boosts = vec![
        Clause::term(FIELD_HAS_AVATAR, true),
        Clause::term(FIELD_HAS_BANNER, true),
    ];
    let query = BoolQuery::must(text_match(text))
        .with_should(boosts, 0)
        .with_filters(filters)
        .with_boost(PROFILE_RELEVANCE_BOOST);

    CompiledQuery::new(Clause::Bool(Box::new(query)))
        .sorted_by(SortKey::desc(FIELD_PAGERANK))
        .paged(Some(page.from), page.size)
}
