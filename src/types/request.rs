//! Structured search requests accepted from the API layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Post search with optional facets. Empty facet lists emit no filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSearchQuery {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub size: i64,
    /// Inclusive lower bound on `created_at`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`; defaults to compile time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub langs: Vec<String>,
}

impl PostSearchQuery {
    /// Start a fluent builder for `PostSearchQuery`.
    #[must_use]
    pub fn builder() -> PostSearchQueryBuilder {
        PostSearchQueryBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PostSearchQueryBuilder {
    inner: PostSearchQuery,
}

impl PostSearchQueryBuilder {
    pub fn query<S: Into<String>>(mut self, query: S) -> Self {
        self.inner.query = query.into();
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: i64) -> Self {
        self.inner.offset = offset;
        self
    }

    #[must_use]
    pub fn size(mut self, size: i64) -> Self {
        self.inner.size = size;
        self
    }

    #[must_use]
    pub fn since(mut self, from: DateTime<Utc>) -> Self {
        self.inner.from = Some(from);
        self
    }

    #[must_use]
    pub fn until(mut self, to: DateTime<Utc>) -> Self {
        self.inner.to = Some(to);
        self
    }

    pub fn actor<S: Into<String>>(mut self, did: S) -> Self {
        self.inner.actors.push(did.into());
        self
    }

    pub fn tag<S: Into<String>>(mut self, tag: S) -> Self {
        self.inner.tags.push(tag.into());
        self
    }

    pub fn lang<S: Into<String>>(mut self, lang: S) -> Self {
        self.inner.langs.push(lang.into());
        self
    }

    #[must_use]
    pub fn build(self) -> PostSearchQuery {
        self.inner
    }
}

/// Profile search. `typeahead` selects prefix matching instead of relevance matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorSearchQuery {
    #[serde(default)]
    pub query: String,
    /// Restricts results to these actors (the caller's social graph).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub following: Vec<String>,
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub typeahead: bool,
}

impl ActorSearchQuery {
    #[must_use]
    pub fn builder() -> ActorSearchQueryBuilder {
        ActorSearchQueryBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ActorSearchQueryBuilder {
    inner: ActorSearchQuery,
}

impl ActorSearchQueryBuilder {
    pub fn query<S: Into<String>>(mut self, query: S) -> Self {
        self.inner.query = query.into();
        self
    }

    pub fn following<S: Into<String>>(mut self, did: S) -> Self {
        self.inner.following.push(did.into());
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: i64) -> Self {
        self.inner.offset = offset;
        self
    }

    #[must_use]
    pub fn size(mut self, size: i64) -> Self {
        self.inner.size = size;
        self
    }

    #[must_use]
    pub fn typeahead(mut self, enabled: bool) -> Self {
        self.inner.typeahead = enabled;
        self
    }

    #[must_use]
    pub fn build(self) -> ActorSearchQuery {
        self.inner
    }
}
