//! HTTP client for the media library server.
//!
//! This module wraps the catalog, poster, stream resolution and health
//! endpoints, plus the plain GETs the HLS loader needs for playlists and
//! fragments. None of these calls retry on their own.

use crate::error::{AppError, Result};
use crate::types::{HealthStatus, StreamDescriptor, Title};
use log::debug;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE, HeaderMap, HeaderValue, PRAGMA};
use url::Url;

const USER_AGENT: &str = concat!("mytv/", env!("CARGO_PKG_VERSION"));

/// A downloaded poster image.
#[derive(Debug, Clone, PartialEq)]
pub struct Poster {
    /// MIME type reported by the server, if any.
    pub content_type: Option<String>,
    /// Raw image bytes.
    pub bytes: Vec<u8>,
}

/// Client for one media library server.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base: Url,
}

impl ApiClient {
    /// Build a client for the server at `base_url`.
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client, base })
    }

    /// Base URL every endpoint is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Resolve a server path (absolute or relative) or a full URL.
    ///
    /// # Examples
    ///
    /// ```
    /// let api = mytv::api::ApiClient::new("http://127.0.0.1:8080").unwrap();
    /// assert_eq!(
    ///     api.resolve("/hls/1/master.m3u8?t=5").unwrap().as_str(),
    ///     "http://127.0.0.1:8080/hls/1/master.m3u8?t=5"
    /// );
    /// assert_eq!(
    ///     api.resolve("https://cdn.example/a.m3u8").unwrap().as_str(),
    ///     "https://cdn.example/a.m3u8"
    /// );
    /// ```
    pub fn resolve(&self, path_or_url: &str) -> Result<Url> {
        Ok(self.base.join(path_or_url)?)
    }

    /// Fetch the full catalog, bypassing every cache on the way.
    pub async fn fetch_catalog(&self) -> Result<Vec<Title>> {
        let url = self.resolve("catalog")?;
        debug!("Fetching catalog from {}", url);

        let resp = self
            .client
            .get(url)
            .headers(no_cache_headers())
            .send()
            .await?
            .error_for_status()?;

        let body = resp.text().await?;
        let titles: Vec<Title> = serde_json::from_str(&body)?;

        debug!("Catalog holds {} titles", titles.len());
        Ok(titles)
    }

    /// Ask the server for the manifest of a title.
    pub async fn resolve_stream(&self, title_id: &str) -> Result<StreamDescriptor> {
        if title_id.is_empty() {
            return Err(AppError::InvalidInput("empty title id".to_string()));
        }
        let url = self.resolve(&format!("stream/{}", title_id))?;
        debug!("Resolving stream for title {} via {}", title_id, url);

        let resp = self.client.get(url).send().await?.error_for_status()?;
        let body = resp.text().await?;
        let descriptor: StreamDescriptor = serde_json::from_str(&body)?;

        if descriptor.m3u8.is_empty() {
            return Err(AppError::Parse(format!(
                "stream for title {} has no manifest",
                title_id
            )));
        }
        Ok(descriptor)
    }

    /// Download the poster image of a title.
    pub async fn fetch_poster(&self, title_id: u64) -> Result<Poster> {
        let url = self.resolve(&format!("poster/{}", title_id))?;
        let resp = self.client.get(url).send().await?.error_for_status()?;

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = resp.bytes().await?.to_vec();

        if bytes.is_empty() {
            return Err(AppError::Parse(format!("poster {} is empty", title_id)));
        }
        Ok(Poster {
            content_type,
            bytes,
        })
    }

    /// Query the server health endpoint.
    pub async fn health(&self) -> Result<HealthStatus> {
        let url = self.resolve("health")?;
        let resp = self.client.get(url).send().await?.error_for_status()?;
        Ok(resp.json().await?)
    }

    /// GET a playlist as text, without caches.
    pub async fn get_text(&self, url: &Url) -> Result<String> {
        let resp = self
            .client
            .get(url.clone())
            .headers(no_cache_headers())
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.text().await?)
    }

    /// GET a media fragment.
    pub async fn get_bytes(&self, url: &Url) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.bytes().await?.to_vec())
    }
}

fn no_cache_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache, no-store"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers
}
