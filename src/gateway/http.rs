use serde_json::Value;
use tracing::{debug, warn};

use super::{Gateway, Method};
use crate::config::ClientConfig;
use crate::error::{ErrorKind, RemoteError, RemoteResult};

/// reqwest-backed gateway. Cookies set by the service (the login session)
/// are kept in the client's cookie store and replayed on every call, so
/// clones of one gateway share a session.
#[derive(Clone)]
pub struct HttpGateway {
    base_url: String,
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(config: &ClientConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .cookie_store(true)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "http client build failed, falling back to defaults without cookie store or timeout");
                reqwest::Client::new()
            });

        Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Uses a caller-built client; the caller owns its cookie and timeout setup.
    pub fn with_client(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

impl Gateway for HttpGateway {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> RemoteResult<Value> {
        let url = self.endpoint(path);
        let mut builder = self.client.request(to_reqwest(method), &url);
        if let Some(body) = body.as_ref() {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(%method, %url, error = %e, "request failed before a response");
            RemoteError::transport(format!("request failed: {e}"))
        })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| {
            RemoteError::new(
                ErrorKind::Unknown,
                format!("failed to read response body: {e}"),
                Some(status),
            )
        })?;

        if !(200..300).contains(&status) {
            let err = RemoteError::from_response(status, &text);
            debug!(%method, %url, status, kind = %err.kind, "request rejected");
            return Err(err);
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| {
            RemoteError::new(
                ErrorKind::Unknown,
                format!("invalid JSON response: {e}"),
                Some(status),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn reply(status: &str, content_type: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    fn header_end(raw: &[u8]) -> Option<usize> {
        raw.windows(4).position(|w| w == b"\r\n\r\n")
    }

    /// Serves a single canned response and hands back the raw request.
    async fn serve_once(response: String) -> (HttpGateway, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                if let Some(end) = header_end(&raw) {
                    let head = String::from_utf8_lossy(&raw[..end]).to_lowercase();
                    let body_len = head
                        .lines()
                        .find_map(|line| line.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if raw.len() >= end + 4 + body_len {
                        break;
                    }
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&raw).into_owned()
        });

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let gateway = HttpGateway::with_client(&format!("http://{addr}/api"), client);
        (gateway, handle)
    }

    #[tokio::test]
    async fn delete_without_body_sends_no_content() {
        let (gateway, server) =
            serve_once("HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n".to_string()).await;

        let value = gateway
            .request(Method::Delete, "/wordbooks/7", None)
            .await
            .unwrap();

        assert_eq!(value, Value::Null);
        let request = server.await.unwrap();
        assert!(request.starts_with("DELETE /api/wordbooks/7 HTTP/1.1"));
        assert!(!request.to_lowercase().contains("content-type"));
    }

    #[tokio::test]
    async fn json_body_is_sent_and_parsed() {
        let (gateway, server) = serve_once(reply(
            "201 Created",
            "application/json",
            r#"{"id":4,"name":"verbs"}"#,
        ))
        .await;

        let value = gateway
            .request(
                Method::Post,
                "/tags",
                Some(serde_json::json!({ "name": "verbs" })),
            )
            .await
            .unwrap();

        assert_eq!(value["id"], 4);
        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/tags HTTP/1.1"));
        assert!(request.to_lowercase().contains("content-type: application/json"));
        assert!(request.ends_with(r#"{"name":"verbs"}"#));
    }

    #[tokio::test]
    async fn error_body_is_classified_with_status() {
        let (gateway, server) = serve_once(reply(
            "404 Not Found",
            "application/json",
            r#"{"error":"NOT_FOUND","message":"Wordbook not found"}"#,
        ))
        .await;

        let err = gateway
            .request(Method::Get, "/wordbooks/9", None)
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.message, "Wordbook not found");
        assert_eq!(err.status_code, Some(404));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn non_json_error_is_unknown_with_status() {
        let (gateway, server) =
            serve_once(reply("502 Bad Gateway", "text/html", "<html>upstream</html>")).await;

        let err = gateway
            .request(Method::Get, "/tags", None)
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Unknown);
        assert_eq!(err.status_code, Some(502));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn malformed_success_body_is_unknown_with_status() {
        let (gateway, server) = serve_once(reply("200 OK", "application/json", "{not json")).await;

        let err = gateway
            .request(Method::Get, "/wordbooks", None)
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Unknown);
        assert_eq!(err.status_code, Some(200));
        server.await.unwrap();
    }

    #[test]
    fn endpoint_joins_base_and_path() {
        let config = ClientConfig {
            api_base_url: "http://example.test/api/".to_string(),
            ..ClientConfig::default()
        };
        let gateway = HttpGateway::new(&config);
        assert_eq!(gateway.base_url(), "http://example.test/api");
        assert_eq!(
            gateway.endpoint("/wordbooks/7/chapters"),
            "http://example.test/api/wordbooks/7/chapters"
        );
        assert_eq!(gateway.endpoint("tags"), "http://example.test/api/tags");
    }
}
