//! Outbound HTTP capability.
//!
//! The engines only ever need "issue a GET or POST, give me status, headers
//! and body, or tell me nothing came back". [`HttpClient`] is that seam;
//! [`ReqwestHttpClient`] is the production implementation and tests supply
//! their own.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Url;

use crate::error::{Error, TransportError};

/// Default timeout applied to every outbound call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A response received from a remote server, whatever its status.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Response headers in arrival order.
    pub headers: Vec<(String, String)>,
    /// Response body.
    pub body: Bytes,
}

impl HttpResponse {
    /// Create a response with the given status and body.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First value of a header, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Shared, stateless outbound HTTP capability.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Issue a GET, appending `query` to any query already on `url`.
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse, TransportError>;

    /// Issue a POST with the given headers and body.
    async fn post(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: Bytes,
    ) -> Result<HttpResponse, TransportError>;
}

/// Shared HTTP capability handle.
pub type SharedHttpClient = Arc<dyn HttpClient>;

/// [`HttpClient`] backed by a pooled reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Create a client whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("websub-hub/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("failed to build http client: {}", e)))?;
        Ok(Self { client })
    }

    async fn send(
        &self,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<HttpResponse, TransportError> {
        let response = request.send().await.map_err(|e| map_error(url, e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(|e| map_error(url, e))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse, TransportError> {
        let parsed = parse_url(url)?;
        let request = self.client.get(parsed).query(query);
        self.send(url, request).await
    }

    async fn post(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: Bytes,
    ) -> Result<HttpResponse, TransportError> {
        let parsed = parse_url(url)?;
        let mut request = self.client.post(parsed).body(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        self.send(url, request).await
    }
}

fn parse_url(url: &str) -> Result<Url, TransportError> {
    Url::parse(url).map_err(|e| TransportError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

fn map_error(url: &str, err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout {
            url: url.to_string(),
        }
    } else {
        TransportError::Request {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Accept one connection, answer `200 ok` and return the raw request.
    async fn capture_request() -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            while !request_complete(&raw) {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
            }
            socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok")
                .await
                .unwrap();
            String::from_utf8_lossy(&raw).into_owned()
        });

        (base, handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(end) = text.find("\r\n\r\n") else {
            return false;
        };
        let length = text[..end]
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        raw.len() >= end + 4 + length
    }

    #[tokio::test]
    async fn test_get_appends_encoded_query_to_existing_one() {
        let (base, server) = capture_request().await;
        let client = ReqwestHttpClient::new(Duration::from_secs(5)).unwrap();

        let response = client
            .get(
                &format!("{}/cb?existing=1", base),
                &[("hub.mode", "subscribe"), ("hub.topic", "http://pub.example/t?x=1&y=2")],
            )
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body.as_ref(), b"ok");

        let raw = server.await.unwrap();
        let request_line = raw.lines().next().unwrap();
        assert!(request_line.starts_with("GET /cb?existing=1&"), "{}", request_line);
        assert!(request_line.contains("hub.mode=subscribe"), "{}", request_line);
        assert!(
            request_line.contains("hub.topic=http%3A%2F%2Fpub.example%2Ft%3Fx%3D1%26y%3D2"),
            "{}",
            request_line
        );
    }

    #[tokio::test]
    async fn test_post_sends_headers_and_body() {
        let (base, server) = capture_request().await;
        let client = ReqwestHttpClient::new(Duration::from_secs(5)).unwrap();
        let link = "<http://hub.example/hub>; rel=\"hub\", <http://pub.example/t>; rel=\"self\"";

        let response = client
            .post(
                &format!("{}/cb", base),
                &[
                    ("Content-Type", "application/atom+xml"),
                    ("Link", link),
                    ("X-Hub-Signature", "sha256=00ff"),
                ],
                Bytes::from_static(b"<feed/>"),
            )
            .await
            .unwrap();
        assert!(response.is_success());

        let raw = server.await.unwrap();
        let (head, body) = raw.split_once("\r\n\r\n").unwrap();
        let header = |name: &str| {
            head.lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(k, _)| k.trim().eq_ignore_ascii_case(name))
                .map(|(_, v)| v.trim().to_string())
        };

        assert!(head.starts_with("POST /cb "));
        assert_eq!(header("link").as_deref(), Some(link));
        assert_eq!(header("x-hub-signature").as_deref(), Some("sha256=00ff"));
        assert_eq!(header("content-type").as_deref(), Some("application/atom+xml"));
        assert_eq!(body, "<feed/>");
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = HttpResponse::new(200, "x")
            .with_header("Content-Type", "application/atom+xml")
            .with_header("content-type", "text/plain");

        assert_eq!(response.header("content-type"), Some("application/atom+xml"));
        assert_eq!(response.header("CONTENT-TYPE"), Some("application/atom+xml"));
        assert!(response.header("link").is_none());
        assert!(response.is_success());
        assert!(!HttpResponse::new(404, "").is_success());
    }

    #[tokio::test]
    async fn test_invalid_url_is_transport_error() {
        let client = ReqwestHttpClient::new(Duration::from_millis(100)).unwrap();
        let err = client.get("not a url", &[]).await.unwrap_err();
        assert!(matches!(err, TransportError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let client = ReqwestHttpClient::new(Duration::from_millis(500)).unwrap();
        let err = client
            .post("http://127.0.0.1:1/cb", &[("Content-Type", "text/plain")], Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TransportError::Request { .. } | TransportError::Timeout { .. }
        ));
    }
}
