//! HTTP catalog client

use super::catalog::{CatalogClient, CatalogError};
use crate::config::RemoteSourceConfig;
use async_trait::async_trait;
use cadence_core::Track;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

#[derive(Debug, Deserialize)]
struct TrackList {
    #[serde(default)]
    tracks: Vec<Track>,
}

#[derive(Debug, Deserialize)]
struct CatalogInfo {
    #[serde(default)]
    name: String,
    #[serde(default)]
    version: String,
}

/// Catalog served over HTTP
///
/// Endpoints, relative to the base URL:
/// - `GET /api/info` checked on connect
/// - `GET /api/search?q=<query>`
/// - `GET /api/recommendations`
///
/// Track lists come back as `{ "tracks": [...] }`.
pub struct HttpCatalog {
    http: Client,
    base: Url,
    access_token: Option<String>,
}

impl HttpCatalog {
    pub fn new(
        base_url: &str,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, CatalogError> {
        let trimmed = base_url.trim_end_matches('/');
        if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
            return Err(CatalogError::Unreachable(format!(
                "catalog URL must start with http:// or https://: {base_url}"
            )));
        }
        let base = Url::parse(&format!("{trimmed}/"))
            .map_err(|e| CatalogError::Unreachable(format!("invalid catalog URL: {e}")))?;

        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(format!("Cadence/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base,
            access_token,
        })
    }

    pub fn from_config(config: &RemoteSourceConfig, base_url: &str) -> Result<Self, CatalogError> {
        Self::new(
            base_url,
            config.access_token.clone(),
            Duration::from_secs(config.request_timeout_secs.max(1)),
        )
    }

    fn endpoint(&self, path: &str) -> Result<Url, CatalogError> {
        self.base
            .join(path)
            .map_err(|e| CatalogError::Unreachable(format!("invalid endpoint {path}: {e}")))
    }

    fn get(&self, url: Url) -> RequestBuilder {
        let request = self.http.get(url);
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, CatalogError> {
        let response = request.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                CatalogError::Unreachable(e.to_string())
            } else {
                CatalogError::Request(e)
            }
        })?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(CatalogError::Status {
                status: status.as_u16(),
                message,
            })
        }
    }

    async fn track_list(&self, url: Url) -> Result<Vec<Track>, CatalogError> {
        debug!(url = %url, "Fetching catalog tracks");
        let response = self.send(self.get(url)).await?;
        let list: TrackList = response
            .json()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))?;
        Ok(list.tracks)
    }
}

#[async_trait]
impl CatalogClient for HttpCatalog {
    async fn connect(&self) -> Result<(), CatalogError> {
        let url = self.endpoint("api/info")?;
        debug!(url = %url, "Testing catalog connection");

        let response = self.send(self.get(url)).await?;
        let info: CatalogInfo = response
            .json()
            .await
            .map_err(|e| CatalogError::Parse(format!("Failed to parse catalog info: {e}")))?;

        info!(name = %info.name, version = %info.version, "Connected to catalog");
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<Track>, CatalogError> {
        let mut url = self.endpoint("api/search")?;
        url.query_pairs_mut().append_pair("q", query);
        self.track_list(url).await
    }

    async fn recommendations(&self) -> Result<Vec<Track>, CatalogError> {
        let url = self.endpoint("api/recommendations")?;
        self.track_list(url).await
    }
}
