//! Span coverage of the repositories, and a check that credentials never
//! end up in span fields.

#![allow(clippy::expect_used)]

use std::sync::{Arc, Mutex};

use authkv_oauth::{
    OAuthStorage,
    testutil::{default_storage, sample_access, sample_authorization, sample_client},
};
use tracing::{Subscriber, field::Field};
use tracing_subscriber::{layer::SubscriberExt, registry::LookupSpan};

#[derive(Default)]
struct FieldRecorder(Vec<String>);

impl tracing::field::Visit for FieldRecorder {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0.push(format!("{}={value:?}", field.name()));
    }
}

#[derive(Clone, Default)]
struct SpanCollector {
    spans: Arc<Mutex<Vec<(String, Vec<String>)>>>,
}

impl<S> tracing_subscriber::Layer<S> for SpanCollector
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        if let Some(span) = ctx.span(id) {
            let mut fields = FieldRecorder::default();
            attrs.record(&mut fields);
            self.spans.lock().expect("lock poisoned").push((span.name().to_owned(), fields.0));
        }
    }
}

fn collect() -> (Arc<Mutex<Vec<(String, Vec<String>)>>>, tracing::subscriber::DefaultGuard) {
    let collector = SpanCollector::default();
    let spans = Arc::clone(&collector.spans);
    let subscriber = tracing_subscriber::registry().with(collector);
    (spans, tracing::subscriber::set_default(subscriber))
}

#[tokio::test]
async fn repository_operations_create_spans_without_credentials() {
    let storage = default_storage().await;
    let (spans, _guard) = collect();

    let client = sample_client();
    storage.create_client(&client).await.expect("create client");
    storage.get_client("1234").await.expect("get client");
    storage.save_authorize(&sample_authorization(&client)).await.expect("save code");
    storage.load_authorize("9999").await.expect("load code");
    storage.save_access(&sample_access(&client)).await.expect("save token");
    storage.load_access("9999").await.expect("load token");
    storage.load_refresh("r9999").await.expect("load refresh");
    storage.remove_refresh("r9999").await.expect("remove refresh");

    let recorded = spans.lock().expect("lock poisoned");
    for name in ["create", "get", "save", "load", "save_access", "load_access", "save_refresh"] {
        assert!(recorded.iter().any(|(s, _)| s == name), "expected a '{name}' span, got: {recorded:?}");
    }
    for (name, fields) in recorded.iter() {
        for field in fields {
            assert!(
                !field.contains("9999") && !field.contains("aabbccdd"),
                "span '{name}' records a credential: {field}"
            );
        }
    }
}

#[tokio::test]
async fn provisioning_creates_wait_spans() {
    let (spans, _guard) = collect();
    let storage = default_storage().await;
    storage.schema().teardown().await.expect("teardown");

    let recorded = spans.lock().expect("lock poisoned");
    for name in ["provision", "teardown", "create_collection", "poll_until"] {
        assert!(recorded.iter().any(|(s, _)| s == name), "expected a '{name}' span, got: {recorded:?}");
    }
}
