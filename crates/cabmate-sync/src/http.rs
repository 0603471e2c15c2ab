//! HTTP client for the published spreadsheet export.

use std::time::Duration;

use async_trait::async_trait;
use cabmate_store::{FeedSource, FetchError};
use thiserror::Error;
use tracing::{debug, info};

/// Error bodies are cut to this many characters before being reported.
const MAX_ERROR_BODY: usize = 200;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
}

/// Fetches the feed's CSV export from a fixed URL.
pub struct FeedClient {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl FeedClient {
    /// Create a client for `url`. Every request is bounded by `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into().trim().to_string(),
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// GET the export and return its body as text.
    pub async fn fetch_csv(&self) -> Result<String, FeedError> {
        info!(url = %self.url, "fetching travel feed");
        let resp = self.client.get(&self.url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let mut body = resp.text().await.unwrap_or_default();
            if let Some((idx, _)) = body.char_indices().nth(MAX_ERROR_BODY) {
                body.truncate(idx);
            }
            return Err(FeedError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        info!(bytes = body.len(), "fetched travel feed");
        Ok(body)
    }

    fn classify(&self, err: FeedError) -> FetchError {
        match err {
            FeedError::Http(e) if e.is_timeout() => FetchError::Timeout(self.timeout),
            FeedError::Http(e) => FetchError::Transport(e.to_string()),
            FeedError::Server { status, body } => FetchError::Status { status, body },
        }
    }
}

#[async_trait]
impl FeedSource for FeedClient {
    async fn fetch_raw(&self) -> Result<String, FetchError> {
        self.fetch_csv().await.map_err(|e| {
            debug!(url = %self.url, error = %e, "travel feed fetch failed");
            self.classify(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn response(status_line: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: text/csv\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    /// Serve one canned response on a local port and return the feed URL.
    async fn serve_once(reply: Option<String>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            match reply {
                Some(reply) => {
                    socket.write_all(reply.as_bytes()).await.unwrap();
                    let _ = socket.shutdown().await;
                }
                // Hold the connection open without answering.
                None => tokio::time::sleep(Duration::from_secs(10)).await,
            }
        });
        format!("http://{addr}/pub?output=csv")
    }

    #[tokio::test]
    async fn fetches_body() {
        let csv = "Name,Travel Date,Place\nAsha,2024-01-15,Airport\n";
        let url = serve_once(Some(response("200 OK", csv))).await;
        let client = FeedClient::new(url, Duration::from_secs(5)).unwrap();

        assert_eq!(client.fetch_raw().await.unwrap(), csv);
    }

    #[tokio::test]
    async fn non_success_is_status_error() {
        let url = serve_once(Some(response("503 Service Unavailable", "down"))).await;
        let client = FeedClient::new(url, Duration::from_secs(5)).unwrap();

        let err = client.fetch_raw().await.unwrap_err();
        match err {
            FetchError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "down");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn long_error_body_is_truncated() {
        let body = "x".repeat(1000);
        let url = serve_once(Some(response("500 Internal Server Error", &body))).await;
        let client = FeedClient::new(url, Duration::from_secs(5)).unwrap();

        match client.fetch_csv().await.unwrap_err() {
            FeedError::Server { body, .. } => assert_eq!(body.len(), MAX_ERROR_BODY),
            other => panic!("expected server error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let url = serve_once(None).await;
        let client = FeedClient::new(url, Duration::from_millis(100)).unwrap();

        let err = client.fetch_raw().await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout(d) if d == Duration::from_millis(100)));
    }

    #[tokio::test]
    async fn refused_connection_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = FeedClient::new(format!("http://{addr}/"), Duration::from_secs(5)).unwrap();

        let err = client.fetch_raw().await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[test]
    fn url_is_trimmed() {
        let client = FeedClient::new("  http://localhost:3001/feed.csv \n", Duration::from_secs(1))
            .unwrap();
        assert_eq!(client.url(), "http://localhost:3001/feed.csv");
    }
}
