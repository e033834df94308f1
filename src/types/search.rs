//! Search response envelope decoded from the backend.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Result, SearchError};

/// A single ranked hit. `source` is left untyped; see [`SearchHit::source_as`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_id")]
    pub id: String,
    /// Relevance score. Null when the query sorts on a field instead of score.
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,
    #[serde(rename = "_source", default)]
    pub source: Value,
}

impl SearchHit {
    /// Deserializes the stored document into the caller's schema.
    pub fn source_as<T: DeserializeOwned>(&self) -> Result<T> {
        T::deserialize(&self.source).map_err(|source| SearchError::Decode { source })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TotalRelation {
    Eq,
    Gte,
}

/// Hit count as reported by the backend; may be a lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalHits {
    pub value: u64,
    pub relation: TotalRelation,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HitsEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<TotalHits>,
    #[serde(default)]
    pub max_score: Option<f64>,
    #[serde(default)]
    pub hits: Vec<SearchHit>,
}

/// Backend response. Hits keep the backend's ranking; nothing here re-sorts them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Milliseconds the backend spent on the query.
    pub took: u64,
    pub timed_out: bool,
    pub hits: HitsEnvelope,
}

impl SearchResponse {
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.took)
    }

    #[must_use]
    pub fn hits(&self) -> &[SearchHit] {
        &self.hits.hits
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hits.hits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hits.hits.is_empty()
    }

    /// Document ids in ranked order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.hits.hits.iter().map(|hit| hit.id.as_str())
    }

    #[must_use]
    pub fn total(&self) -> Option<TotalHits> {
        self.hits.total
    }
}

/// Author of an indexed post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResult {
    pub did: String,
    pub handle: String,
}

/// Stored payload of a post document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSearchResult {
    pub tid: String,
    pub cid: String,
    pub user: UserResult,
    pub post: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "took": 12,
        "timed_out": false,
        "_shards": {"total": 1, "successful": 1, "skipped": 0, "failed": 0},
        "hits": {
            "total": {"value": 2, "relation": "eq"},
            "max_score": null,
            "hits": [
                {"_index": "posts", "_id": "b", "_score": null, "sort": [1700000000000],
                 "_source": {"tid": "3k2", "cid": "bafy1", "user": {"did": "did:plc:b", "handle": "bob.test"}, "post": {"text": "hi"}}},
                {"_index": "posts", "_id": "a", "_score": 1.5,
                 "_source": {"tid": "3k1", "cid": "bafy0", "user": {"did": "did:plc:a", "handle": "al.test"}, "post": {}}}
            ]
        }
    }"#;

    #[test]
    fn decodes_backend_body_and_keeps_order() {
        let resp: SearchResponse = serde_json::from_str(BODY).unwrap();
        assert_eq!(resp.elapsed(), Duration::from_millis(12));
        assert!(!resp.timed_out);
        assert_eq!(resp.ids().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(resp.hits()[0].score, None);
        assert_eq!(resp.hits()[1].score, Some(1.5));
        assert_eq!(resp.hits.max_score, None);
        assert_eq!(
            resp.total(),
            Some(TotalHits {
                value: 2,
                relation: TotalRelation::Eq
            })
        );
    }

    #[test]
    fn typed_payload() {
        let resp: SearchResponse = serde_json::from_str(BODY).unwrap();
        let post: PostSearchResult = resp.hits()[0].source_as().unwrap();
        assert_eq!(post.user.handle, "bob.test");
        assert_eq!(post.tid, "3k2");

        let err = resp.hits()[0].source_as::<UserResult>().unwrap_err();
        assert!(matches!(err, SearchError::Decode { .. }));
    }
}
