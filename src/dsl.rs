//! Typed boolean-query documents.
//!
//! Compiled queries are built from a closed set of clause kinds rather than free-form
//! JSON maps, so every document the compiler produces has a well-formed wire shape.
//! Serialization follows the backend's query DSL:
//!
//! ```json
//! {
//!   "query": { "bool": { "must": {..}, "should": [..], "filter": [..],
//!                        "minimum_should_match": 0, "boost": 0.5 } },
//!   "sort": { "created_at": { "order": "desc" } },
//!   "size": 25,
//!   "from": 0
//! }
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::{Result, SearchError};

/// Default boolean operator between query terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    And,
    Or,
}

/// `simple_query_string`: the tolerant query syntax used for user free text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimpleQueryString {
    pub query: String,
    pub fields: Vec<String>,
    pub flags: String,
    pub default_operator: Operator,
    pub lenient: bool,
    pub analyze_wildcard: bool,
}

/// `query_string`: the full Lucene grammar. Only built by the trusted passthrough.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryString {
    pub query: String,
    pub default_operator: Operator,
    pub analyze_wildcard: bool,
    pub allow_leading_wildcard: bool,
    pub lenient: bool,
    pub default_field: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiMatchKind {
    BoolPrefix,
}

/// `multi_match` across several fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiMatch {
    pub query: String,
    #[serde(rename = "type")]
    pub kind: MultiMatchKind,
    pub operator: Operator,
    pub fields: Vec<String>,
}

/// Scalar accepted by a `term` clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TermValue {
    Bool(bool),
    Keyword(String),
}

impl From<bool> for TermValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for TermValue {
    fn from(value: &str) -> Self {
        Self::Keyword(value.to_string())
    }
}

impl From<String> for TermValue {
    fn from(value: String) -> Self {
        Self::Keyword(value)
    }
}

/// Inclusive datetime bounds of a `range` clause.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RangeBounds {
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_datetime"
    )]
    pub gte: Option<DateTime<Utc>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_datetime"
    )]
    pub lte: Option<DateTime<Utc>>,
}

/// Renders datetimes the way records store them: millisecond precision, `Z` suffix.
#[must_use]
pub fn format_datetime(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[allow(clippy::ref_option)]
fn serialize_datetime<S: Serializer>(
    value: &Option<DateTime<Utc>>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(value) => serializer.serialize_str(&format_datetime(value)),
        None => serializer.serialize_none(),
    }
}

/// Boolean combinator. `must` is scored, `should` adds optional score, `filter` only restricts.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BoolQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub must: Option<Box<Clause>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub should: Vec<Clause>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_should_match: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filter: Vec<Clause>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

impl BoolQuery {
    /// A bool query whose sole scoring entry is `clause`.
    #[must_use]
    pub fn must(clause: Clause) -> Self {
        Self {
            must: Some(Box::new(clause)),
            ..Self::default()
        }
    }

    pub fn with_filters(mut self, filters: Vec<Clause>) -> Self {
        self.filter = filters;
        self
    }

    pub fn with_should(mut self, should: Vec<Clause>, minimum_should_match: u32) -> Self {
        self.should = should;
        self.minimum_should_match = Some(minimum_should_match);
        self
    }

    pub fn with_boost(mut self, boost: f64) -> Self {
        self.boost = Some(boost);
        self
    }
}

/// The closed set of clause kinds the compiler emits.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    SimpleQueryString(SimpleQueryString),
    QueryString(QueryString),
    MultiMatch(MultiMatch),
    Term { field: String, value: TermValue },
    Terms { field: String, values: Vec<String> },
    Range { field: String, bounds: RangeBounds },
    Bool(Box<BoolQuery>),
}

impl Clause {
    pub fn term(field: impl Into<String>, value: impl Into<TermValue>) -> Self {
        Self::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn terms(field: impl Into<String>, values: Vec<String>) -> Self {
        Self::Terms {
            field: field.into(),
            values,
        }
    }

    pub fn range(field: impl Into<String>, bounds: RangeBounds) -> Self {
        Self::Range {
            field: field.into(),
            bounds,
        }
    }

    /// Name of the clause in the wire format.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SimpleQueryString(_) => "simple_query_string",
            Self::QueryString(_) => "query_string",
            Self::MultiMatch(_) => "multi_match",
            Self::Term { .. } => "term",
            Self::Terms { .. } => "terms",
            Self::Range { .. } => "range",
            Self::Bool(_) => "bool",
        }
    }
}

/// `{ "<field>": <value> }`
struct FieldEntry<'a, V: ?Sized>(&'a str, &'a V);

impl<V: Serialize + ?Sized> Serialize for FieldEntry<'_, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.0, self.1)?;
        map.end()
    }
}

impl Serialize for Clause {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        let kind = self.kind();
        match self {
            Self::SimpleQueryString(inner) => map.serialize_entry(kind, inner)?,
            Self::QueryString(inner) => map.serialize_entry(kind, inner)?,
            Self::MultiMatch(inner) => map.serialize_entry(kind, inner)?,
            Self::Term { field, value } => map.serialize_entry(kind, &FieldEntry(field, value))?,
            Self::Terms { field, values } => {
                map.serialize_entry(kind, &FieldEntry(field, values.as_slice()))?;
            }
            Self::Range { field, bounds } => {
                map.serialize_entry(kind, &FieldEntry(field, bounds))?;
            }
            Self::Bool(inner) => map.serialize_entry(kind, inner.as_ref())?,
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Single-field sort, serialized as `{ "<field>": { "order": "desc" } }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub order: SortOrder,
}

impl SortKey {
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Desc,
        }
    }
}

#[derive(Serialize)]
struct SortSpec {
    order: SortOrder,
}

impl Serialize for SortKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        FieldEntry(&self.field, &SortSpec { order: self.order }).serialize(serializer)
    }
}

/// A complete search request body. Unset paging and sort fall back to backend defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuery {
    pub query: Clause,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<u64>,
}

impl CompiledQuery {
    #[must_use]
    pub fn new(query: Clause) -> Self {
        Self {
            query,
            sort: None,
            size: None,
            from: None,
        }
    }

    pub fn sorted_by(mut self, sort: SortKey) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn paged(mut self, from: Option<u64>, size: u64) -> Self {
        self.from = from;
        self.size = Some(size);
        self
    }

    /// Root bool query, if the document has one.
    #[must_use]
    pub fn bool_query(&self) -> Option<&BoolQuery> {
        match &self.query {
            Clause::Bool(inner) => Some(&**inner),
            _ => None,
        }
    }

    /// Filter clauses of the root bool query; empty for non-bool documents.
    #[must_use]
    pub fn filters(&self) -> &[Clause] {
        self.bool_query().map_or(&[][..], |b| b.filter.as_slice())
    }

    /// Wire form of the document.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|source| SearchError::Serialization { source })
    }

    pub fn to_value(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(|source| SearchError::Serialization { source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn term_and_terms_wire_shape() {
        let value = serde_json::to_value(Clause::term("has_avatar", true)).unwrap();
        assert_eq!(value, json!({"term": {"has_avatar": true}}));

        let value = serde_json::to_value(Clause::terms(
            "did",
            vec!["did:plc:a".into(), "did:plc:b".into()],
        ))
        .unwrap();
        assert_eq!(value, json!({"terms": {"did": ["did:plc:a", "did:plc:b"]}}));
    }

    #[test]
    fn range_renders_millisecond_utc() {
        let lower = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clause = Clause::range(
            "created_at",
            RangeBounds {
                gte: Some(lower),
                lte: None,
            },
        );
        let value = serde_json::to_value(clause).unwrap();
        assert_eq!(
            value,
            json!({"range": {"created_at": {"gte": "2024-01-01T00:00:00.000Z"}}})
        );
    }

    #[test]
    fn bool_omits_empty_sections() {
        let query = BoolQuery::must(Clause::term("lang", "en"));
        let value = serde_json::to_value(Clause::Bool(Box::new(query))).unwrap();
        assert_eq!(value, json!({"bool": {"must": {"term": {"lang": "en"}}}}));
    }

    #[test]
    fn document_sort_and_paging() {
        let doc = CompiledQuery::new(Clause::term("lang", "ja"))
            .sorted_by(SortKey::desc("pagerank"))
            .paged(Some(10), 5);
        let value = doc.to_value().unwrap();
        assert_eq!(value["sort"], json!({"pagerank": {"order": "desc"}}));
        assert_eq!(value["size"], json!(5));
        assert_eq!(value["from"], json!(10));

        let bare = CompiledQuery::new(Clause::term("lang", "ja")).to_value().unwrap();
        assert!(bare.get("sort").is_none());
        assert!(bare.get("from").is_none());
        assert!(bare.get("size").is_none());
    }

    #[test]
    fn multi_match_kind_is_renamed() {
        let clause = Clause::MultiMatch(MultiMatch {
            query: "ali".into(),
            kind: MultiMatchKind::BoolPrefix,
            operator: Operator::And,
            fields: vec!["typeahead".into()],
        });
        let value = serde_json::to_value(clause).unwrap();
        assert_eq!(value["multi_match"]["type"], json!("bool_prefix"));
        assert_eq!(value["multi_match"]["operator"], json!("and"));
    }
}
