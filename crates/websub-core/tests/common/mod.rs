//! Shared test fixtures: a scripted in-process HTTP capability.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use websub_core::{
    HttpClient, HttpResponse, HubConfig, HubDispatcher, MemorySubscriptionStore, SharedStore,
    TransportError,
};

pub const HUB_URL: &str = "http://hub.example/hub";

/// How a scripted endpoint answers.
#[derive(Debug, Clone)]
pub enum Route {
    /// Subscriber callback that echoes `hub.challenge` and accepts everything else.
    EchoChallenge,
    /// Subscriber callback that answers 200 with the wrong body.
    WrongChallenge,
    /// Fixed response for every request.
    Respond(HttpResponse),
}

/// One outbound call seen by the fake.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: &'static str,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl RecordedCall {
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// In-memory [`HttpClient`]: unknown URLs behave as unreachable hosts.
#[derive(Default)]
pub struct FakeHttp {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeHttp {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn route(&self, url: &str, route: Route) {
        self.routes.lock().insert(url.to_string(), route);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn calls_to(&self, method: &str, url: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method && c.url == url)
            .collect()
    }

    fn answer(&self, call: RecordedCall) -> Result<HttpResponse, TransportError> {
        let route = self.routes.lock().get(&call.url).cloned();
        let challenge = call.query_param("hub.challenge").map(str::to_string);
        let url = call.url.clone();
        self.calls.lock().push(call);

        match route {
            None => Err(TransportError::Request {
                url,
                reason: "connection refused".to_string(),
            }),
            Some(Route::EchoChallenge) => Ok(HttpResponse::new(200, challenge.unwrap_or_default())),
            Some(Route::WrongChallenge) => Ok(HttpResponse::new(200, "not-the-challenge")),
            Some(Route::Respond(response)) => Ok(response),
        }
    }
}

#[async_trait]
impl HttpClient for FakeHttp {
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse, TransportError> {
        self.answer(RecordedCall {
            method: "GET",
            url: url.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            headers: Vec::new(),
            body: Bytes::new(),
        })
    }

    async fn post(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: Bytes,
    ) -> Result<HttpResponse, TransportError> {
        self.answer(RecordedCall {
            method: "POST",
            url: url.to_string(),
            query: Vec::new(),
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body,
        })
    }
}

/// A dispatcher over a fresh in-memory store and the given fake.
pub fn hub(http: &Arc<FakeHttp>) -> (HubDispatcher, SharedStore) {
    let store: SharedStore = Arc::new(MemorySubscriptionStore::new());
    let dispatcher = HubDispatcher::new(&HubConfig::new(HUB_URL), store.clone(), http.clone());
    (dispatcher, store)
}

pub fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
