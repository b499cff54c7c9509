//! Integration test verifying that `#[instrument]` annotations produce
//! the expected spans on `MemoryStore` operations and the polling helpers.

#![allow(clippy::expect_used)]

use std::sync::{Arc, Mutex};

use authkv_storage::{
    KeyValueStore, MemoryStore, PrimaryKey, WaitConfig,
    testutil::{collection_spec, make_item},
    waiter,
};
use tracing::Subscriber;
use tracing_subscriber::{layer::SubscriberExt, registry::LookupSpan};

// ---------------------------------------------------------------------------
// Collecting layer: records span names as they are created
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct SpanCollector {
    spans: Arc<Mutex<Vec<String>>>,
}

impl<S> tracing_subscriber::Layer<S> for SpanCollector
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        _attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        if let Some(span) = ctx.span(id) {
            self.spans.lock().expect("lock poisoned").push(span.name().to_owned());
        }
    }
}

fn collect() -> (Arc<Mutex<Vec<String>>>, tracing::subscriber::DefaultGuard) {
    let collector = SpanCollector::default();
    let spans = Arc::clone(&collector.spans);
    let subscriber = tracing_subscriber::registry().with(collector);
    (spans, tracing::subscriber::set_default(subscriber))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn control_plane_operations_create_spans() {
    let (spans, _guard) = collect();

    let store = MemoryStore::new();
    store.create_collection(&collection_spec("clients", "id")).await.expect("create");
    store.describe_collection("clients").await.expect("describe");
    store.delete_collection("clients").await.expect("delete");

    let recorded = spans.lock().expect("lock poisoned");
    for name in ["create_collection", "describe_collection", "delete_collection"] {
        assert!(recorded.iter().any(|s| s == name), "expected a '{name}' span, got: {recorded:?}");
    }
}

#[tokio::test]
async fn data_plane_operations_create_spans() {
    let (spans, _guard) = collect();

    let store = MemoryStore::new();
    store.create_collection(&collection_spec("codes", "code")).await.expect("create");
    store.put_item("codes", make_item("code", "9999", &[])).await.expect("put");
    let key = PrimaryKey::new("code", "9999");
    store.get_item("codes", &key, None).await.expect("get");
    store.delete_item("codes", &key).await.expect("delete");

    let recorded = spans.lock().expect("lock poisoned");
    for name in ["put_item", "get_item", "delete_item"] {
        assert!(recorded.iter().any(|s| s == name), "expected a '{name}' span, got: {recorded:?}");
    }
}

#[tokio::test]
async fn readiness_wait_creates_poll_span() {
    let (spans, _guard) = collect();

    let store = MemoryStore::new();
    store.create_collection(&collection_spec("tokens", "token")).await.expect("create");
    waiter::wait_until_active(&store, "tokens", &WaitConfig::default()).await.expect("wait");

    let recorded = spans.lock().expect("lock poisoned");
    assert!(
        recorded.iter().any(|s| s == "poll_until"),
        "expected a 'poll_until' span, got: {recorded:?}"
    );
}
