//! Source fetcher: a thin client over the public listing API.
//!
//! The pipeline only depends on the [`Fetcher`] trait, so tests can drive
//! it with scripted batches. [`HttpFetcher`] is the real implementation,
//! hitting `{base_url}/r/{source}/{sort}.json?limit={n}`.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::config::ApiConfig;
use crate::models::Post;

/// Fetch failure taxonomy. Both variants are recovered at the pipeline
/// level with a zero-count session; the distinction matters for logging.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("connectivity failure: {0}")]
    Connectivity(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// One raw item as returned by the listing endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawItem {
    pub data: RawItemData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawItemData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub num_comments: i64,
    #[serde(default)]
    pub created_utc: f64,
    #[serde(default)]
    pub is_self: bool,
    #[serde(default)]
    pub is_video: bool,
    #[serde(default)]
    pub over_18: bool,
    #[serde(default)]
    pub stickied: bool,
    #[serde(default)]
    pub selftext: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<RawItem>,
}

impl RawItem {
    /// Normalize into a [`Post`]. Items without a stable identifier are
    /// rejected (`None`) rather than given a synthesized one — a hash of
    /// mutable content would change on every score drift and defeat dedup.
    pub fn normalize(self, source: &str, ingested_at: f64) -> Option<Post> {
        let id = match self.data.id {
            Some(id) if !id.is_empty() => id,
            _ => return None,
        };

        let selftext = self.data.selftext.filter(|s| !s.is_empty());

        Some(Post {
            id,
            title: self.data.title,
            author: self.data.author,
            score: self.data.score,
            num_comments: self.data.num_comments,
            created_utc: self.data.created_utc,
            ingested_at,
            source: source.to_string(),
            is_self: self.data.is_self,
            is_video: self.data.is_video,
            over_18: self.data.over_18,
            stickied: self.data.stickied,
            selftext,
            url: self.data.url,
        })
    }
}

/// A source of raw post batches for a named channel.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, source: &str, limit: u32, sort: &str)
        -> Result<Vec<RawItem>, FetchError>;
}

/// HTTP implementation of [`Fetcher`].
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFetcher {
    pub fn new(api: &ApiConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&api.user_agent)
            .timeout(Duration::from_secs(api.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: api.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        source: &str,
        limit: u32,
        sort: &str,
    ) -> Result<Vec<RawItem>, FetchError> {
        let url = format!(
            "{}/r/{}/{}.json?limit={}",
            self.base_url, source, sort, limit
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Connectivity(e.to_string()))?;

        let response = response
            .error_for_status()
            .map_err(|e| FetchError::Connectivity(e.to_string()))?;

        let listing: Listing = response
            .json()
            .await
            .map_err(|e| FetchError::Malformed(e.to_string()))?;

        Ok(listing.data.children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: Option<&str>, title: &str) -> RawItem {
        RawItem {
            data: RawItemData {
                id: id.map(String::from),
                title: title.to_string(),
                created_utc: 100.0,
                ..Default::default()
            },
        }
    }

    #[test]
    fn normalize_requires_stable_id() {
        assert!(raw(None, "no id").normalize("rust", 1.0).is_none());
        assert!(raw(Some(""), "empty id").normalize("rust", 1.0).is_none());

        let post = raw(Some("abc"), "ok").normalize("rust", 1.0).unwrap();
        assert_eq!(post.id, "abc");
        assert_eq!(post.source, "rust");
        assert_eq!(post.ingested_at, 1.0);
    }

    #[test]
    fn normalize_drops_empty_selftext() {
        let mut item = raw(Some("abc"), "ok");
        item.data.selftext = Some(String::new());
        let post = item.normalize("rust", 1.0).unwrap();
        assert!(post.selftext.is_none());
    }

    #[test]
    fn listing_shape_decodes() {
        let body = r#"{"data":{"children":[
            {"data":{"id":"x1","title":"Hello","score":3,"num_comments":1,
             "created_utc":1000.5,"is_self":true,"selftext":"body text"}}
        ]}}"#;
        let listing: Listing = serde_json::from_str(body).unwrap();
        assert_eq!(listing.data.children.len(), 1);
        assert_eq!(listing.data.children[0].data.id.as_deref(), Some("x1"));
    }

    #[test]
    fn listing_unexpected_shape_is_error() {
        let body = r#"{"kind":"Listing"}"#;
        assert!(serde_json::from_str::<Listing>(body).is_err());
    }
}
