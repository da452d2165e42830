//! Fetch wrapper
//!
//! Thin layer over `reqwest` that sends the AJAX marker headers, enforces a
//! timeout and maps failures onto [`FetchError`]. Redirects are returned to
//! the caller instead of being followed, so a `302` from a delete endpoint
//! counts as success.

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

use crate::constants::http;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout")]
    Timeout,

    #[error("HTTP {status}: {status_text}")]
    Status { status: u16, status_text: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid URL '{url}': {detail}")]
    InvalidUrl { url: String, detail: String },

    #[error("HTTP client initialization failed: {0}")]
    Client(String),
}

/// Response body, decoded as JSON when the server says so
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Body,
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(http::REQUESTED_WITH_HEADER),
            HeaderValue::from_static(http::REQUESTED_WITH_VALUE),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(http::CONTENT_TYPE_JSON));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { client })
    }

    pub async fn get(&self, url: &str) -> Result<Response, FetchError> {
        self.fetch(Method::GET, url).await
    }

    /// Send a request. Success is any 2xx or a 302
    pub async fn fetch(&self, method: Method, url: &str) -> Result<Response, FetchError> {
        let parsed = Url::parse(url).map_err(|e| invalid_url(url, e))?;
        debug!(%method, url = %parsed, "sending request");

        let response = self
            .client
            .request(method, parsed)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout
                } else {
                    FetchError::Network(e.to_string())
                }
            })
            .inspect_err(|e| error!(url, error = %e, "Fetch error"))?;

        let status = response.status();
        debug!(status = status.as_u16(), "response received");
        if !(status.is_success() || status.as_u16() == http::FOUND) {
            return Err(FetchError::Status {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains(http::CONTENT_TYPE_JSON));

        let body = if is_json {
            Body::Json(
                response
                    .json::<Value>()
                    .await
                    .map_err(|e| FetchError::Network(format!("Failed to read response body: {e}")))?,
            )
        } else {
            Body::Text(
                response
                    .text()
                    .await
                    .map_err(|e| FetchError::Network(format!("Failed to read response body: {e}")))?,
            )
        };

        Ok(Response {
            status: status.as_u16(),
            body,
        })
    }
}

/// Resolve an `href` against the page URL, like an anchor's `href` property
pub fn resolve_url(base: &str, href: &str) -> Result<String, FetchError> {
    let base = Url::parse(base).map_err(|e| invalid_url(href, e))?;
    base.join(href)
        .map(String::from)
        .map_err(|e| invalid_url(href, e))
}

fn invalid_url(url: &str, detail: impl std::fmt::Display) -> FetchError {
    FetchError::InvalidUrl {
        url: url.to_string(),
        detail: detail.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve one canned response, returning the base URL and the raw request
    async fn serve_once(response: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });
        (format!("http://{addr}"), handle)
    }

    fn client() -> HttpClient {
        HttpClient::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_json_body_and_headers() {
        let (base, server) = serve_once(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 11\r\n\r\n{\"ok\":true}",
        )
        .await;
        let response = client().get(&format!("{base}/admin/servicio/3/eliminar")).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, Body::Json(serde_json::json!({ "ok": true })));

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("get /admin/servicio/3/eliminar"));
        assert!(request.contains("x-requested-with: xmlhttprequest"));
        assert!(request.contains("content-type: application/json"));
    }

    #[tokio::test]
    async fn test_redirect_is_success() {
        let (base, _server) = serve_once(
            "HTTP/1.1 302 Found\r\nlocation: /admin\r\ncontent-length: 0\r\n\r\n",
        )
        .await;
        let response = client().get(&format!("{base}/eliminar")).await.unwrap();
        assert_eq!(response.status, 302);
        assert_eq!(response.body, Body::Text(String::new()));
    }

    #[tokio::test]
    async fn test_error_status() {
        let (base, _server) =
            serve_once("HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\n\r\n").await;
        let err = client().get(&format!("{base}/nada")).await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP 404: Not Found");
    }

    #[tokio::test]
    async fn test_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let client = HttpClient::new(Duration::from_millis(200)).unwrap();
        let err = client.get(&format!("http://{addr}/lento")).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout));
        assert_eq!(err.to_string(), "Request timeout");
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let err = client().get(&format!("http://{addr}/")).await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let err = client().get("/relativo").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }

    #[test]
    fn test_resolve_url() {
        assert_eq!(
            resolve_url("http://localhost:5000/admin/", "servicio/3/eliminar").unwrap(),
            "http://localhost:5000/admin/servicio/3/eliminar"
        );
        assert_eq!(
            resolve_url("http://localhost:5000/admin/", "/imagen/7/eliminar").unwrap(),
            "http://localhost:5000/imagen/7/eliminar"
        );
        assert!(resolve_url("no es url", "/x").is_err());
    }
}
