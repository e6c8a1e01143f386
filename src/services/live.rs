// src/services/live.rs

//! Upstream live-data feed.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ACCEPT;
use url::Url;

use crate::error::{Result, SourceError};
use crate::models::SourceConfig;
use crate::services::normalize::LivePayload;
use crate::utils::{http, live_data_url};

/// A source of live-data snapshots for the whole resort scope.
#[async_trait]
pub trait LiveFeed: Send + Sync {
    /// Fetch one snapshot. Called at most once per run.
    async fn fetch_live(&self) -> std::result::Result<LivePayload, SourceError>;

    /// Where the snapshot comes from, for logs.
    fn describe(&self) -> String;
}

/// Live feed backed by the HTTP API.
pub struct HttpLiveFeed {
    client: Client,
    url: Url,
}

impl HttpLiveFeed {
    /// Build a feed for the configured scope.
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = http::create_async_client(config)?;
        let url = live_data_url(&config.base_url, &config.scope_id)?;
        Ok(Self::with_client(client, url))
    }

    pub fn with_client(client: Client, url: Url) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl LiveFeed for HttpLiveFeed {
    async fn fetch_live(&self) -> std::result::Result<LivePayload, SourceError> {
        let response = self
            .client
            .get(self.url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    fn describe(&self) -> String {
        self.url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve a single canned HTTP response on a loopback port.
    async fn serve_once(status_line: &'static str, body: &'static str) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        Url::parse(&format!("http://{addr}/v1/entity/resort/live")).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let url = serve_once("200 OK", r#"{"liveData":[{"id":"a","status":"DOWN"}]}"#).await;
        let feed = HttpLiveFeed::with_client(Client::new(), url);

        let payload = feed.fetch_live().await.unwrap();
        assert_eq!(payload.index().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let url = serve_once("503 Service Unavailable", "{}").await;
        let feed = HttpLiveFeed::with_client(Client::new(), url);

        assert!(matches!(
            feed.fetch_live().await,
            Err(SourceError::Status(503))
        ));
    }

    #[tokio::test]
    async fn test_fetch_malformed_body() {
        let url = serve_once("200 OK", "not json").await;
        let feed = HttpLiveFeed::with_client(Client::new(), url);

        assert!(matches!(
            feed.fetch_live().await,
            Err(SourceError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_unreachable() {
        // Bind then drop to get a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{addr}/live")).unwrap();
        let feed = HttpLiveFeed::with_client(Client::new(), url);

        assert!(matches!(
            feed.fetch_live().await,
            Err(SourceError::Transport(_))
        ));
    }
}
