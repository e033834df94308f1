#![deny(clippy::all, clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![cfg_attr(
    test,
    allow(
        clippy::useless_vec,
        clippy::uninlined_format_args,
        clippy::float_cmp,
        clippy::cast_possible_truncation
    )
)]
#![allow(clippy::module_name_repetitions)]
//
// Documentation lints: internal helpers are self-describing, public APIs still carry docs.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
//
// Pagination values arrive as signed integers from request decoding and are
// range-checked before any conversion.
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
//
// Builders take owned values and return `Self`.
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::unused_async)]

//! Search-query compiler for post and profile search.
//!
//! Structured search requests (free text plus author, tag, language, date-range and
//! social-graph facets) are compiled into boolean query documents for an
//! OpenSearch/Elasticsearch-compatible backend, executed over its search API, and
//! decoded into a typed [`SearchResponse`].
//!
//! The flow for every request shape is the same:
//! pagination guard, free-text normalization, shape-specific compilation, execution.

/// The skyquery-core crate version (matches `Cargo.toml`).
pub const SKYQUERY_CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod compiler;
pub mod constants;
pub mod context;
pub mod dsl;
pub mod error;
pub mod executor;
pub mod normalize;
pub mod pagination;
pub mod service;
pub mod types;

pub use compiler::{QueryCompiler, QueryShape, TrustedAccess, TrustedSearch};
pub use constants::*;
pub use context::{CancelToken, QueryObserver, SearchContext};
pub use dsl::{
    BoolQuery, Clause, CompiledQuery, MultiMatch, MultiMatchKind, Operator, QueryString,
    RangeBounds, SimpleQueryString, SortKey, SortOrder, TermValue,
};
pub use error::{ErrorKind, ResolveError, Result, SearchError};
pub use executor::{BackendResponse, HttpSearchBackend, SearchBackend, execute};
pub use normalize::{
    HandleResolver, NoopNormalizer, NormalizedQuery, QueryNormalizer, SyntaxNormalizer,
};
pub use pagination::{Page, validate};
pub use service::SearchService;
pub use types::{
    ActorSearchQuery, ActorSearchQueryBuilder, ClientConfig, ClientConfigBuilder, HitsEnvelope,
    PostSearchQuery, PostSearchQueryBuilder, PostSearchResult, SearchHit, SearchResponse,
    TotalHits, TotalRelation, UserResult,
};
