//! Prefix matching for search-as-you-type profile lookup.
//!
//! Input is matched as typed, without free-text normalization: the last token is a
//! prefix, earlier tokens must match whole.

use super::{QueryCompiler, QueryShape, finish, terms_filter};
use crate::Result;
use crate::constants::{FIELD_DID, FIELD_PAGERANK, TYPEAHEAD_FIELDS};
use crate::context::SearchContext;
use crate::dsl::{BoolQuery, Clause, CompiledQuery, MultiMatch, MultiMatchKind, Operator, SortKey};
use crate::pagination::Page;
use crate::types::ActorSearchQuery;

impl<N> QueryCompiler<N> {
    /// Top `size` profiles whose typeahead field matches `query` as a prefix.
    pub fn compile_profiles_typeahead(
        &self,
        ctx: &SearchContext,
        query: &str,
        size: i64,
    ) -> Result<CompiledQuery> {
        let page = Page::checked(0, size)?;
        let document = CompiledQuery::new(prefix_match(query))
            .sorted_by(SortKey::desc(FIELD_PAGERANK))
            .paged(None, page.size);

        Ok(finish(ctx, QueryShape::ProfilesTypeahead, document))
    }

    /// Typeahead with paging and an optional `following` scope.
    pub fn compile_profiles_typeahead_structured(
        &self,
        ctx: &SearchContext,
        q: &ActorSearchQuery,
    ) -> Result<CompiledQuery> {
        let page = Page::checked(q.offset, q.size)?;
        let filters = terms_filter(FIELD_DID, &q.following)
            .into_iter()
            .collect();
        let query = BoolQuery::must(prefix_match(&q.query)).with_filters(filters);
        let document = CompiledQuery::new(Clause::Bool(Box::new(query)))
            .sorted_by(SortKey::desc(FIELD_PAGERANK))
            .paged(Some(page.from), page.size);

        Ok(finish(ctx, QueryShape::StructuredProfilesTypeahead, document))
    }
}

fn prefix_match(query: &str) -> Clause {
    Clause::MultiMatch(MultiMatch {
        query: query.to_string(),
        kind: MultiMatchKind::BoolPrefix,
        operator: Operator::And,
        fields: TYPEAHEAD_FIELDS.iter().map(ToString::to_string).collect(),
    })
}
