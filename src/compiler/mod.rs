//! Query compilation.
//!
//! Each request shape has its own compile operation on [`QueryCompiler`]:
//!
//! | shape                  | scoring clause              | sort            |
//! |------------------------|-----------------------------|-----------------|
//! | posts                  | `simple_query_string`       | `created_at` ↓  |
//! | profiles               | `simple_query_string` + boosts | `pagerank` ↓ |
//! | profiles typeahead     | `multi_match` (`bool_prefix`) | `pagerank` ↓  |
//! | unrestricted (trusted) | `query_string`              | backend default |
//!
//! Every operation validates pagination first, then normalizes free text (typeahead
//! excepted), then builds the document. Filters always go into filter context and the
//! scoring clause is the only `must` entry. Compilation holds no state between calls.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::Result;
use crate::constants::{FIELD_EVERYTHING, SIMPLE_QUERY_FLAGS};
use crate::context::SearchContext;
use crate::dsl::{Clause, CompiledQuery, Operator, SimpleQueryString};
use crate::normalize::{NormalizedQuery, QueryNormalizer};
use crate::types::ActorSearchQuery;

mod posts;
mod profiles;
mod trusted;
mod typeahead;

pub use trusted::{TrustedAccess, TrustedSearch};

/// Which compile path produced a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryShape {
    Posts,
    StructuredPosts,
    Profiles,
    StructuredProfiles,
    ProfilesTypeahead,
    StructuredProfilesTypeahead,
    Unrestricted,
}

impl QueryShape {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Posts => "posts",
            Self::StructuredPosts => "structured_posts",
            Self::Profiles => "profiles",
            Self::StructuredProfiles => "structured_profiles",
            Self::ProfilesTypeahead => "profiles_typeahead",
            Self::StructuredProfilesTypeahead => "structured_profiles_typeahead",
            Self::Unrestricted => "unrestricted",
        }
    }
}

impl fmt::Display for QueryShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compiles search requests into backend query documents.
///
/// The normalizer is injected; the clock only exists so the implicit `created_at`
/// upper bound on post searches can be pinned in tests.
#[derive(Debug, Clone)]
pub struct QueryCompiler<N> {
    normalizer: N,
    clock: fn() -> DateTime<Utc>,
}

impl<N> QueryCompiler<N> {
    pub fn new(normalizer: N) -> Self {
        Self {
            normalizer,
            clock: Utc::now,
        }
    }

    /// Replaces the source of "now" used for post date bounds.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn normalizer(&self) -> &N {
        &self.normalizer
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}

impl<N: QueryNormalizer> QueryCompiler<N> {
    /// Routes an actor search to the typeahead or relevance path.
    pub async fn compile_actors(
        &self,
        ctx: &SearchContext,
        q: &ActorSearchQuery,
    ) -> Result<CompiledQuery> {
        if q.typeahead {
            self.compile_profiles_typeahead_structured(ctx, q)
        } else {
            self.compile_profiles_structured(ctx, q).await
        }
    }

    async fn normalized(&self, ctx: &SearchContext, raw: &str) -> Result<NormalizedQuery> {
        let normalized = self.normalizer.normalize(ctx, raw).await;
        ctx.ensure_active()?;
        Ok(normalized)
    }
}

/// Lenient free-text match over the combined field.
pub(crate) fn text_match(query: String) -> Clause {
    Clause::SimpleQueryString(SimpleQueryString {
        query,
        fields: vec![FIELD_EVERYTHING.to_string()],
        flags: SIMPLE_QUERY_FLAGS.to_string(),
        default_operator: Operator::And,
        lenient: true,
        analyze_wildcard: false,
    })
}

/// Membership filter, omitted for an empty set.
pub(crate) fn terms_filter(field: &str, values: &[String]) -> Option<Clause> {
    (!values.is_empty()).then(|| Clause::terms(field, values.to_vec()))
}

pub(crate) fn finish(
    ctx: &SearchContext,
    shape: QueryShape,
    query: CompiledQuery,
) -> CompiledQuery {
    tracing::debug!(
        target: "skyquery::compile",
        shape = %shape,
        filters = query.filters().len(),
        "compiled query"
    );
    ctx.observe(|o| o.on_compiled(shape, &query));
    query
}
