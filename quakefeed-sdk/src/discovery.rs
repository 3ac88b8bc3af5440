//! Server discovery: map a bearer token to candidate feed servers.
//!
//! Discovery never aborts a connection attempt. Any failure (non-200,
//! network error, bad body, empty list) makes the client fall back to
//! [`ClientConfig::fallback_url`](crate::client::ClientConfig).

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::DiscoveryError;

/// Production server-list endpoint.
pub const DEFAULT_DISCOVERY_URL: &str = "https://axis.prioris.jp/api/server/list/";

pub type DiscoveryFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<String>, DiscoveryError>> + Send + 'a>>;

/// Resolves a credential into candidate server base URLs.
pub trait ServerDiscovery: Send + Sync {
    fn server_list<'a>(&'a self, credential: &'a str) -> DiscoveryFuture<'a>;
}

/// Socket URL for the first candidate: `servers[0] + socket_path`.
pub fn socket_url(servers: &[String], socket_path: &str) -> Option<String> {
    let base = servers.first()?.trim_end_matches('/');
    if base.is_empty() {
        return None;
    }
    Some(format!("{base}{socket_path}"))
}

#[derive(Debug, Deserialize)]
struct ServerListResponse {
    #[serde(default)]
    servers: Vec<String>,
}

/// Discovery over HTTP: `GET <url>` with `Authorization: Bearer <token>`,
/// expecting `200 {"servers": [..]}`.
pub struct HttpDiscovery {
    url: String,
    http: reqwest::Client,
}

impl HttpDiscovery {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to build discovery HTTP client, using defaults");
                reqwest::Client::new()
            });
        Self {
            url: url.into(),
            http,
        }
    }

    async fn fetch(&self, credential: &str) -> Result<Vec<String>, DiscoveryError> {
        tracing::debug!(url = %self.url, "Requesting server list");
        let resp = self
            .http
            .get(&self.url)
            .bearer_auth(credential)
            .header("content-type", "application/json")
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(DiscoveryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let list: ServerListResponse = resp
            .json()
            .await
            .map_err(|e| DiscoveryError::Body(e.to_string()))?;
        if list.servers.is_empty() {
            return Err(DiscoveryError::Empty);
        }
        tracing::debug!(count = list.servers.len(), "Server list retrieved");
        Ok(list.servers)
    }
}

impl ServerDiscovery for HttpDiscovery {
    fn server_list<'a>(&'a self, credential: &'a str) -> DiscoveryFuture<'a> {
        Box::pin(self.fetch(credential))
    }
}

/// A fixed candidate list; skips the HTTP lookup entirely.
#[derive(Debug, Clone)]
pub struct FixedServers(pub Vec<String>);

impl ServerDiscovery for FixedServers {
    fn server_list<'a>(&'a self, _credential: &'a str) -> DiscoveryFuture<'a> {
        let servers = self.0.clone();
        Box::pin(async move {
            if servers.is_empty() {
                Err(DiscoveryError::Empty)
            } else {
                Ok(servers)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_url_uses_first_candidate() {
        let servers = vec!["wss://a.example".to_string(), "wss://b.example".to_string()];
        assert_eq!(
            socket_url(&servers, "/socket").as_deref(),
            Some("wss://a.example/socket")
        );
    }

    #[test]
    fn socket_url_tolerates_trailing_slash() {
        let servers = vec!["wss://a.example/".to_string()];
        assert_eq!(
            socket_url(&servers, "/socket").as_deref(),
            Some("wss://a.example/socket")
        );
    }

    #[test]
    fn socket_url_none_when_empty() {
        assert_eq!(socket_url(&[], "/socket"), None);
        assert_eq!(socket_url(&[String::new()], "/socket"), None);
    }

    #[tokio::test]
    async fn fixed_servers_empty_is_an_error() {
        let empty = FixedServers(Vec::new());
        assert!(matches!(empty.server_list("t").await, Err(DiscoveryError::Empty)));

        let one = FixedServers(vec!["ws://127.0.0.1:1".into()]);
        assert_eq!(one.server_list("t").await.unwrap(), vec!["ws://127.0.0.1:1".to_string()]);
    }
}
