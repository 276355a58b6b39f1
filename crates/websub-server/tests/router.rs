//! Router tests for the hub HTTP surface.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use bytes::Bytes;
use serde_json::Value;
use websub_core::{
    HttpClient, HttpResponse, HubDispatcher, MemorySubscriptionStore, SharedStore, TransportError,
};
use websub_server::{create_router, open_store, AppState, ServerConfig};

/// Subscriber double: echoes every challenge and accepts every delivery.
#[derive(Default)]
struct EchoSubscriber {
    posts: AtomicUsize,
}

#[async_trait]
impl HttpClient for EchoSubscriber {
    async fn get(&self, _url: &str, query: &[(&str, &str)]) -> Result<HttpResponse, TransportError> {
        let challenge = query
            .iter()
            .find(|(k, _)| *k == "hub.challenge")
            .map(|(_, v)| v.to_string())
            .unwrap_or_else(|| "<feed/>".to_string());
        Ok(HttpResponse::new(200, challenge))
    }

    async fn post(
        &self,
        _url: &str,
        _headers: &[(&str, &str)],
        _body: Bytes,
    ) -> Result<HttpResponse, TransportError> {
        self.posts.fetch_add(1, Ordering::SeqCst);
        Ok(HttpResponse::new(200, ""))
    }
}

struct Harness {
    server: TestServer,
    dispatcher: HubDispatcher,
    store: SharedStore,
    http: Arc<EchoSubscriber>,
}

fn harness() -> Harness {
    let config = ServerConfig::default().in_memory();
    let store: SharedStore = Arc::new(MemorySubscriptionStore::new());
    let http = Arc::new(EchoSubscriber::default());
    let dispatcher = HubDispatcher::new(&config.hub_config(), store.clone(), http.clone());
    let app = create_router(AppState::new(dispatcher.clone(), config));

    Harness {
        server: TestServer::new(app).unwrap(),
        dispatcher,
        store,
        http,
    }
}

#[tokio::test]
async fn test_root_and_hub_pages() {
    let h = harness();

    let response = h.server.get("/").await;
    response.assert_status_ok();
    response.assert_text("Welcome to my WebSub Hub.");

    let response = h.server.get("/hub").await;
    response.assert_status_ok();
    response.assert_text("Hub");
}

#[tokio::test]
async fn test_subscribe_returns_202_and_verifies() {
    let h = harness();

    let response = h
        .server
        .post("/hub")
        .form(&[
            ("hub.mode", "subscribe"),
            ("hub.callback", "http://sub.example/cb"),
            ("hub.topic", "http://pub.example/t"),
        ])
        .await;
    response.assert_status(StatusCode::ACCEPTED);
    assert!(response.text().is_empty());

    h.dispatcher.wait_idle().await;
    assert!(h
        .store
        .find("http://sub.example/cb", "http://pub.example/t")
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_publish_returns_200_and_delivers() {
    let h = harness();
    h.store
        .upsert("http://sub.example/cb", "http://pub.example/t", None, 0)
        .unwrap();

    let response = h
        .server
        .post("/hub")
        .form(&[("hub.mode", "publish"), ("hub.topic", "http://pub.example/t")])
        .await;
    response.assert_status_ok();
    assert!(response.text().is_empty());

    h.dispatcher.wait_idle().await;
    assert_eq!(h.http.posts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_missing_parameter_is_400() {
    let h = harness();

    let response = h
        .server
        .post("/hub")
        .form(&[("hub.mode", "subscribe"), ("hub.topic", "http://pub.example/t")])
        .expect_failure()
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_text("Missing required parameter value for hub.callback");

    let response = h
        .server
        .post("/hub")
        .form(&[("hub.mode", "unsubscribe"), ("hub.callback", "http://sub.example/cb")])
        .expect_failure()
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_text("Missing required parameter value for hub.topic");
}

#[tokio::test]
async fn test_unsupported_mode_is_400() {
    let h = harness();

    let response = h
        .server
        .post("/hub")
        .form(&[("hub.mode", "fetch")])
        .expect_failure()
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_text("Unsupported value for hub.mode: fetch");

    let response = h
        .server
        .post("/hub")
        .form(&[("hub.topic", "http://pub.example/t")])
        .expect_failure()
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_text("Unsupported value for hub.mode: ");

    assert_eq!(h.dispatcher.in_flight(), 0);
}

#[tokio::test]
async fn test_health_reports_subscriptions() {
    let h = harness();
    h.store.upsert("http://a/cb", "http://pub.example/t", None, 0).unwrap();
    h.store.upsert("http://b/cb", "http://pub.example/t", None, 0).unwrap();

    let response = h.server.get("/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["subscriptions"], 2);
}

#[tokio::test]
async fn test_open_store_backends() {
    let dir = tempfile::tempdir().unwrap();

    let store = open_store(&ServerConfig::new(dir.path())).unwrap();
    store.upsert("http://a/cb", "http://pub.example/t", None, 0).unwrap();
    assert_eq!(store.len().unwrap(), 1);

    let memory = open_store(&ServerConfig::new(dir.path()).in_memory()).unwrap();
    assert!(memory.is_empty().unwrap());
}
