//! Public request, response, and configuration types.

pub mod options;
pub mod request;
pub mod search;

pub use options::{BasicAuth, ClientConfig, ClientConfigBuilder};
pub use request::{
    ActorSearchQuery, ActorSearchQueryBuilder, PostSearchQuery, PostSearchQueryBuilder,
};
pub use search::{
    HitsEnvelope, PostSearchResult, SearchHit, SearchResponse, TotalHits, TotalRelation,
    UserResult,
};
