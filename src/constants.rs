//! Pagination limits and index schema field names shared by the compiler.

/// Largest accepted result offset.
pub const MAX_OFFSET: i64 = 10_000;
/// Largest accepted page size.
pub const MAX_PAGE_SIZE: i64 = 250;
/// Upper bound on `offset + size`; matches the backend's default result window.
pub const MAX_RESULT_WINDOW: i64 = 10_000;

/// Combined full-text field every post and profile document carries.
pub const FIELD_EVERYTHING: &str = "everything";
/// Record creation time of a post.
pub const FIELD_CREATED_AT: &str = "created_at";
/// Stable actor identifier.
pub const FIELD_DID: &str = "did";
pub const FIELD_TAG: &str = "tag";
pub const FIELD_LANG: &str = "lang";
pub const FIELD_HAS_AVATAR: &str = "has_avatar";
pub const FIELD_HAS_BANNER: &str = "has_banner";
/// Precomputed authority score used to rank profiles.
pub const FIELD_PAGERANK: &str = "pagerank";
/// Search-as-you-type field and its shingle subfields.
pub const TYPEAHEAD_FIELDS: [&str; 3] = ["typeahead", "typeahead._2gram", "typeahead._3gram"];

/// Operator syntax enabled for `simple_query_string` clauses.
pub const SIMPLE_QUERY_FLAGS: &str = "AND|NOT|OR|PHRASE|PRECEDENCE|WHITESPACE";
/// Down-weighting applied to the relevance bool query for profiles.
pub const PROFILE_RELEVANCE_BOOST: f64 = 0.5;
/// Query used when the free-text input carries no terms.
pub const MATCH_ALL_QUERY: &str = "*";

pub(crate) const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;
pub(crate) const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
