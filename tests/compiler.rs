//! Integration tests for query compilation across all request shapes.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Value, json};
use skyquery_core::{
    ActorSearchQuery, CancelToken, Clause, CompiledQuery, HandleResolver, NoopNormalizer,
    PostSearchQuery, QueryCompiler, QueryObserver, QueryShape, ResolveError, SearchContext,
    SearchError, SyntaxNormalizer, TrustedAccess, TrustedSearch,
};

fn pinned_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 2, 3, 4, 5, 6).unwrap()
}

fn filters(value: &Value) -> &Vec<Value> {
    value["query"]["bool"]["filter"]
        .as_array()
        .expect("filter array")
}

struct DirectoryStub;

#[async_trait]
impl HandleResolver for DirectoryStub {
    async fn resolve_handle(&self, handle: &str) -> Result<Option<String>, ResolveError> {
        match handle {
            "bob.test" => Ok(Some("did:plc:bob".to_string())),
            _ => Err(ResolveError::new(handle, "directory unavailable")),
        }
    }
}

#[tokio::test]
async fn posts_from_without_to_defaults_upper_bound_to_now() {
    let ctx = SearchContext::new();
    let compiler = QueryCompiler::new(NoopNormalizer);
    let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let q = PostSearchQuery::builder()
        .query("eclipse")
        .size(25)
        .since(from)
        .build();

    let before = Utc::now();
    let doc = compiler.compile_posts_structured(&ctx, &q).await.unwrap();
    let after = Utc::now();

    let value = doc.to_value().unwrap();
    let range = &filters(&value)[0]["range"]["created_at"];
    assert_eq!(range["gte"], json!("2024-01-01T00:00:00.000Z"));

    let lte = DateTime::parse_from_rfc3339(range["lte"].as_str().unwrap())
        .unwrap()
        .with_timezone(&Utc);
    assert!(lte >= before - chrono::Duration::milliseconds(1));
    assert!(lte <= after);
}

#[tokio::test]
async fn posts_plain_always_carries_upper_bound() {
    let ctx = SearchContext::new();
    let compiler = QueryCompiler::new(NoopNormalizer).with_clock(pinned_now);
    let doc = compiler.compile_posts(&ctx, "", 0, 10).await.unwrap();
    let value = doc.to_value().unwrap();

    assert_eq!(
        filters(&value),
        &vec![json!({"range": {"created_at": {"lte": "2025-02-03T04:05:06.000Z"}}})]
    );
    assert_eq!(
        value["query"]["bool"]["must"]["simple_query_string"]["query"],
        json!("*")
    );
}

#[tokio::test]
async fn posts_with_only_actor_facet() {
    let ctx = SearchContext::new();
    let compiler = QueryCompiler::new(NoopNormalizer).with_clock(pinned_now);
    let q = PostSearchQuery::builder()
        .query("hello")
        .size(10)
        .actor("did:plc:abc")
        .build();
    let doc = compiler.compile_posts_structured(&ctx, &q).await.unwrap();

    let terms: Vec<&Clause> = doc
        .filters()
        .iter()
        .filter(|c| c.kind() == "terms")
        .collect();
    assert_eq!(terms, vec![&Clause::terms("did", vec!["did:plc:abc".into()])]);

    let value = doc.to_value().unwrap();
    let rendered = serde_json::to_string(&value).unwrap();
    assert!(!rendered.contains("\"tag\""));
    assert!(!rendered.contains("\"lang\""));
}

#[tokio::test]
async fn normalizer_filters_come_first() {
    let ctx = SearchContext::new();
    let compiler =
        QueryCompiler::new(SyntaxNormalizer::new(DirectoryStub)).with_clock(pinned_now);
    let q = PostSearchQuery::builder()
        .query("from:bob.test from:carol.test rust")
        .size(10)
        .lang("en")
        .build();
    let doc = compiler.compile_posts_structured(&ctx, &q).await.unwrap();
    let value = doc.to_value().unwrap();

    assert_eq!(
        value["query"]["bool"]["must"]["simple_query_string"]["query"],
        json!("from:carol.test rust")
    );
    let f = filters(&value);
    assert_eq!(f.len(), 3);
    assert_eq!(f[0], json!({"term": {"did": "did:plc:bob"}}));
    assert!(f[1].get("range").is_some());
    assert_eq!(f[2], json!({"terms": {"lang": ["en"]}}));
}

#[tokio::test]
async fn profile_relevance_boosts_regardless_of_facets() {
    let ctx = SearchContext::new();
    let compiler = QueryCompiler::new(NoopNormalizer);

    let plain = compiler.compile_profiles(&ctx, "alice", 0, 10).await.unwrap();
    let scoped = compiler
        .compile_profiles_structured(
            &ctx,
            &ActorSearchQuery::builder()
                .query("alice")
                .following("did:plc:x")
                .size(10)
                .build(),
        )
        .await
        .unwrap();

    for doc in [plain, scoped] {
        let value = doc.to_value().unwrap();
        let b = &value["query"]["bool"];
        assert_eq!(b["boost"], json!(0.5));
        assert_eq!(b["minimum_should_match"], json!(0));
        assert_eq!(b["should"].as_array().unwrap().len(), 2);
        assert_eq!(value["sort"], json!({"pagerank": {"order": "desc"}}));
    }
}

#[tokio::test]
async fn typeahead_prefix_match_over_three_fields() {
    let ctx = SearchContext::new();
    let compiler = QueryCompiler::new(NoopNormalizer);

    let plain = compiler
        .compile_profiles_typeahead(&ctx, "ali", 10)
        .unwrap()
        .to_value()
        .unwrap();
    let mm = &plain["query"]["multi_match"];
    assert_eq!(mm["type"], json!("bool_prefix"));
    assert_eq!(mm["operator"], json!("and"));
    assert_eq!(
        mm["fields"],
        json!(["typeahead", "typeahead._2gram", "typeahead._3gram"])
    );
    assert!(plain.get("from").is_none());

    let q = ActorSearchQuery::builder()
        .query("ali")
        .following("did:plc:x")
        .size(10)
        .typeahead(true)
        .build();
    let scoped = compiler.compile_actors(&ctx, &q).await.unwrap();
    assert_eq!(
        scoped.filters(),
        &[Clause::terms("did", vec!["did:plc:x".into()])]
    );
    let value = scoped.to_value().unwrap();
    assert_eq!(value["query"]["bool"]["must"]["multi_match"], *mm);
    assert_eq!(value["from"], json!(0));
}

#[tokio::test]
async fn every_shape_rejects_bad_paging() {
    let ctx = SearchContext::new();
    let compiler = QueryCompiler::new(NoopNormalizer);
    let posts = PostSearchQuery::builder().size(251).build();
    let actors = ActorSearchQuery::builder().offset(-1).build();

    let errors = vec![
        compiler.compile_posts(&ctx, "x", 10_000, 1).await.unwrap_err(),
        compiler.compile_posts_structured(&ctx, &posts).await.unwrap_err(),
        compiler.compile_profiles(&ctx, "x", 0, 251).await.unwrap_err(),
        compiler
            .compile_profiles_structured(&ctx, &actors)
            .await
            .unwrap_err(),
        compiler
            .compile_profiles_typeahead(&ctx, "x", -1)
            .unwrap_err(),
        compiler
            .compile_profiles_typeahead_structured(&ctx, &actors)
            .unwrap_err(),
    ];
    for err in errors {
        assert!(matches!(err, SearchError::InvalidParams { .. }), "{err:?}");
    }
}

#[tokio::test]
async fn compilation_is_deterministic() {
    let ctx = SearchContext::new();
    let compiler =
        QueryCompiler::new(SyntaxNormalizer::new(DirectoryStub)).with_clock(pinned_now);
    let q = PostSearchQuery::builder()
        .query("\"solar eclipse\" from:bob.test")
        .offset(50)
        .size(25)
        .tag("astro")
        .lang("en")
        .build();

    let first = compiler.compile_posts_structured(&ctx, &q).await.unwrap();
    let second = compiler.compile_posts_structured(&ctx, &q).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
}

#[derive(Default)]
struct CompileCounter(AtomicUsize);

impl QueryObserver for CompileCounter {
    fn on_compiled(&self, _shape: QueryShape, _query: &CompiledQuery) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

async fn compile_each_normalized_shape(ctx: &SearchContext) -> Vec<SearchError> {
    let compiler =
        QueryCompiler::new(SyntaxNormalizer::new(DirectoryStub)).with_clock(pinned_now);
    let posts = PostSearchQuery::builder()
        .query("from:bob.test rust")
        .size(10)
        .build();
    let actors = ActorSearchQuery::builder().query("alice").size(10).build();

    vec![
        compiler
            .compile_posts(ctx, "from:bob.test rust", 0, 10)
            .await
            .unwrap_err(),
        compiler
            .compile_posts_structured(ctx, &posts)
            .await
            .unwrap_err(),
        compiler
            .compile_profiles(ctx, "alice", 0, 10)
            .await
            .unwrap_err(),
        compiler
            .compile_profiles_structured(ctx, &actors)
            .await
            .unwrap_err(),
    ]
}

#[tokio::test]
async fn cancelled_context_stops_compilation() {
    let token = CancelToken::new();
    token.cancel();
    let counter = Arc::new(CompileCounter::default());
    let ctx = SearchContext::new()
        .with_cancellation(token)
        .with_observer(counter.clone());

    for err in compile_each_normalized_shape(&ctx).await {
        assert!(matches!(err, SearchError::Cancelled), "{err:?}");
    }
    assert_eq!(counter.0.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn expired_deadline_stops_compilation() {
    let counter = Arc::new(CompileCounter::default());
    let ctx = SearchContext::new()
        .with_timeout(Duration::ZERO)
        .with_observer(counter.clone());

    for err in compile_each_normalized_shape(&ctx).await {
        assert!(matches!(err, SearchError::Timeout { .. }), "{err:?}");
    }
    assert_eq!(counter.0.load(Ordering::SeqCst), 0);
}

#[test]
fn unrestricted_requires_trusted_access() {
    let ctx = SearchContext::new();
    let trusted = TrustedSearch::new(TrustedAccess::assert_internal_caller());
    let doc = trusted.compile(&ctx, "lang:en AND text:rust*");

    assert!(doc.sort.is_none());
    assert!(doc.size.is_none());
    assert!(doc.from.is_none());
    let value = doc.to_value().unwrap();
    assert_eq!(value["query"]["query_string"]["analyze_wildcard"], json!(true));
    assert_eq!(
        value["query"]["query_string"]["allow_leading_wildcard"],
        json!(false)
    );
}
