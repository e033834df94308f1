//! Compile-and-execute entry points, one per request shape.
//!
//! Each method opens a span named after its shape, annotated with the index, paging, and
//! facet cardinalities, then compiles the request and hands it to [`execute`]. The
//! backend handle is borrowed per call; the service itself owns only the normalizer.

use tracing::instrument;

use crate::Result;
use crate::compiler::QueryCompiler;
use crate::context::SearchContext;
use crate::executor::{SearchBackend, execute};
use crate::normalize::QueryNormalizer;
use crate::types::{ActorSearchQuery, PostSearchQuery, SearchResponse};

#[derive(Debug, Clone)]
pub struct SearchService<N> {
    compiler: QueryCompiler<N>,
}

impl<N: QueryNormalizer> SearchService<N> {
    pub fn new(normalizer: N) -> Self {
        Self::with_compiler(QueryCompiler::new(normalizer))
    }

    pub fn with_compiler(compiler: QueryCompiler<N>) -> Self {
        Self { compiler }
    }

    pub fn compiler(&self) -> &QueryCompiler<N> {
        &self.compiler
    }

    #[instrument(
        target = "skyquery::search",
        name = "search_posts",
        skip_all,
        fields(index = %index, query = %query, offset = offset, size = size)
    )]
    pub async fn search_posts<B: SearchBackend + ?Sized>(
        &self,
        ctx: &SearchContext,
        backend: &B,
        index: &str,
        query: &str,
        offset: i64,
        size: i64,
    ) -> Result<SearchResponse> {
        let document = self
            .compiler
            .compile_posts(ctx, query, offset, size)
            .await?;
        execute(ctx, backend, index, &document).await
    }

    #[instrument(
        target = "skyquery::search",
        name = "search_posts_structured",
        skip_all,
        fields(
            index = %index,
            query = %q.query,
            offset = q.offset,
            size = q.size,
            has_from = q.from.is_some(),
            has_to = q.to.is_some(),
            actors = q.actors.len(),
            tags = q.tags.len(),
            langs = q.langs.len(),
        )
    )]
    pub async fn search_posts_structured<B: SearchBackend + ?Sized>(
        &self,
        ctx: &SearchContext,
        backend: &B,
        index: &str,
        q: &PostSearchQuery,
    ) -> Result<SearchResponse> {
        let document = self.compiler.compile_posts_structured(ctx, q).await?;
        execute(ctx, backend, index, &document).await
    }

    #[instrument(
        target = "skyquery::search",
        name = "search_profiles",
        skip_all,
        fields(index = %index, query = %query, offset = offset, size = size)
    )]
    pub async fn search_profiles<B: SearchBackend + ?Sized>(
        &self,
        ctx: &SearchContext,
        backend: &B,
        index: &str,
        query: &str,
        offset: i64,
        size: i64,
    ) -> Result<SearchResponse> {
        let document = self
            .compiler
            .compile_profiles(ctx, query, offset, size)
            .await?;
        execute(ctx, backend, index, &document).await
    }

    #[instrument(
        target = "skyquery::search",
        name = "search_profiles_structured",
        skip_all,
        fields(
            index = %index,
            query = %q.query,
            offset = q.offset,
            size = q.size,
            following = q.following.len(),
        )
    )]
    pub async fn search_profiles_structured<B: SearchBackend + ?Sized>(
        &self,
        ctx: &SearchContext,
        backend: &B,
        index: &str,
        q: &ActorSearchQuery,
    ) -> Result<SearchResponse> {
        let document = self.compiler.compile_profiles_structured(ctx, q).await?;
        execute(ctx, backend, index, &document).await
    }

    #[instrument(
        target = "skyquery::search",
        name = "search_profiles_typeahead",
        skip_all,
        fields(index = %index, query = %query, size = size)
    )]
    pub async fn search_profiles_typeahead<B: SearchBackend + ?Sized>(
        &self,
        ctx: &SearchContext,
        backend: &B,
        index: &str,
        query: &str,
        size: i64,
    ) -> Result<SearchResponse> {
        let document = self.compiler.compile_profiles_typeahead(ctx, query, size)?;
        execute(ctx, backend, index, &document).await
    }

    #[instrument(
        target = "skyquery::search",
        name = "search_profiles_typeahead_structured",
        skip_all,
        fields(
            index = %index,
            query = %q.query,
            offset = q.offset,
            size = q.size,
            following = q.following.len(),
        )
    )]
    pub async fn search_profiles_typeahead_structured<B: SearchBackend + ?Sized>(
        &self,
        ctx: &SearchContext,
        backend: &B,
        index: &str,
        q: &ActorSearchQuery,
    ) -> Result<SearchResponse> {
        let document = self
            .compiler
            .compile_profiles_typeahead_structured(ctx, q)?;
        execute(ctx, backend, index, &document).await
    }

    /// Dispatches on `q.typeahead`.
    pub async fn search_actors<B: SearchBackend + ?Sized>(
        &self,
        ctx: &SearchContext,
        backend: &B,
        index: &str,
        q: &ActorSearchQuery,
    ) -> Result<SearchResponse> {
        if q.typeahead {
            self.search_profiles_typeahead_structured(ctx, backend, index, q)
                .await
        } else {
            self.search_profiles_structured(ctx, backend, index, q).await
        }
    }
}
