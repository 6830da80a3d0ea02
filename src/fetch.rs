//! HTTP document fetching with per-URL caches.
//!
//! One fetcher owns one HTTP client and two in-process caches: JSON documents
//! and markdown documents (front matter already split). Cached entries live
//! for the life of the fetcher. `CacheMode::NoStore` bypasses a cache in both
//! directions without evicting whatever is already stored under the URL.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::frontmatter::{parse_front_matter, MarkdownDocument};

const USER_AGENT: &str = concat!("site-content-engine/", env!("CARGO_PKG_VERSION"));

/// Join a content-store base URL and a relative document path.
pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Cache behavior for a single fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    /// Read from and write to the per-URL cache.
    Default,
    /// Skip both the cache read and the cache write. Entries already cached
    /// under the same URL stay intact.
    NoStore,
}

/// Typed failure at the HTTP boundary.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: StatusCode },

    #[error("failed to read body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid JSON from {url}: {source}")]
    Json {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// HTTP fetcher for content-store documents.
///
/// Construct one per engine instance; tests build isolated instances so
/// nothing leaks between them.
pub struct DocumentFetcher {
    client: Client,
    json_cache: Mutex<HashMap<String, Arc<Value>>>,
    markdown_cache: Mutex<HashMap<String, Arc<MarkdownDocument>>>,
}

impl DocumentFetcher {
    /// Build a fetcher with its own HTTP client and empty caches.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            json_cache: Mutex::new(HashMap::new()),
            markdown_cache: Mutex::new(HashMap::new()),
        })
    }

    /// Fetch a JSON document, consulting the per-URL cache unless `NoStore`.
    pub async fn fetch_json(&self, url: &str, mode: CacheMode) -> Result<Arc<Value>, FetchError> {
        if mode == CacheMode::Default {
            if let Some(cached) = self.json_cache.lock().unwrap().get(url) {
                debug!("JSON cache hit: {}", url);
                return Ok(Arc::clone(cached));
            }
        }

        debug!("Fetching JSON document: {}", url);
        let document = Arc::new(self.get_json(url).await?);

        if mode == CacheMode::Default {
            self.json_cache
                .lock()
                .unwrap()
                .insert(url.to_string(), Arc::clone(&document));
        }

        Ok(document)
    }

    /// Fetch a markdown document and split its front matter.
    pub async fn fetch_markdown(
        &self,
        url: &str,
        mode: CacheMode,
    ) -> Result<Arc<MarkdownDocument>, FetchError> {
        if mode == CacheMode::Default {
            if let Some(cached) = self.markdown_cache.lock().unwrap().get(url) {
                debug!("Markdown cache hit: {}", url);
                return Ok(Arc::clone(cached));
            }
        }

        debug!("Fetching markdown document: {}", url);
        let raw = self.get_text(url).await?;
        let document = Arc::new(parse_front_matter(&raw));

        if mode == CacheMode::Default {
            self.markdown_cache
                .lock()
                .unwrap()
                .insert(url.to_string(), Arc::clone(&document));
        }

        Ok(document)
    }

    /// Drop every cached document.
    pub fn clear_caches(&self) {
        self.json_cache.lock().unwrap().clear();
        self.markdown_cache.lock().unwrap().clear();
    }

    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|source| FetchError::Json {
                url: url.to_string(),
                source,
            })
    }

    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        response.text().await.map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_fetcher() -> DocumentFetcher {
        DocumentFetcher::new(Duration::from_secs(5)).expect("fetcher should build")
    }

    // ==================== join_url Tests ====================

    #[test]
    fn test_join_url_plain() {
        assert_eq!(
            join_url("http://store", "content/site.json"),
            "http://store/content/site.json"
        );
    }

    #[test]
    fn test_join_url_trims_redundant_slashes() {
        assert_eq!(
            join_url("http://store/", "/content/site.json"),
            "http://store/content/site.json"
        );
    }

    // ==================== JSON Fetch Tests ====================

    #[tokio::test]
    async fn test_fetch_json_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doc.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;

        let fetcher = test_fetcher();
        let url = format!("{}/doc.json", server.uri());
        let document = fetcher.fetch_json(&url, CacheMode::Default).await.unwrap();

        assert_eq!(*document, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_fetch_json_caches_by_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doc.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"n": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = test_fetcher();
        let url = format!("{}/doc.json", server.uri());
        let first = fetcher.fetch_json(&url, CacheMode::Default).await.unwrap();
        let second = fetcher.fetch_json(&url, CacheMode::Default).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_no_store_bypasses_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doc.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"n": 1})))
            .expect(2)
            .mount(&server)
            .await;

        let fetcher = test_fetcher();
        let url = format!("{}/doc.json", server.uri());
        fetcher.fetch_json(&url, CacheMode::NoStore).await.unwrap();
        fetcher.fetch_json(&url, CacheMode::NoStore).await.unwrap();
    }

    #[tokio::test]
    async fn test_no_store_neither_reads_nor_evicts() {
        let server = MockServer::start().await;
        let fetcher = test_fetcher();
        let url = format!("{}/doc.json", server.uri());

        // Populate the cache with v1
        {
            let _guard = Mock::given(method("GET"))
                .and(path("/doc.json"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"v": 1})))
                .expect(1)
                .mount_as_scoped(&server)
                .await;
            let first = fetcher.fetch_json(&url, CacheMode::Default).await.unwrap();
            assert_eq!(*first, json!({"v": 1}));
        }

        // NoStore sees the new upstream value without touching the cache
        let _guard = Mock::given(method("GET"))
            .and(path("/doc.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"v": 2})))
            .expect(1)
            .mount_as_scoped(&server)
            .await;
        let bypassed = fetcher.fetch_json(&url, CacheMode::NoStore).await.unwrap();
        assert_eq!(*bypassed, json!({"v": 2}));

        // The cached v1 entry is still served for default fetches
        let cached = fetcher.fetch_json(&url, CacheMode::Default).await.unwrap();
        assert_eq!(*cached, json!({"v": 1}));
    }

    #[tokio::test]
    async fn test_clear_caches_forces_refetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doc.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"n": 1})))
            .expect(2)
            .mount(&server)
            .await;

        let fetcher = test_fetcher();
        let url = format!("{}/doc.json", server.uri());
        fetcher.fetch_json(&url, CacheMode::Default).await.unwrap();
        fetcher.clear_caches();
        fetcher.fetch_json(&url, CacheMode::Default).await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_json_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = test_fetcher();
        let url = format!("{}/missing.json", server.uri());
        let result = fetcher.fetch_json(&url, CacheMode::Default).await;

        assert!(matches!(result, Err(FetchError::Status { status, .. }) if status == 404));
    }

    #[tokio::test]
    async fn test_fetch_json_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bad.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let fetcher = test_fetcher();
        let url = format!("{}/bad.json", server.uri());
        let result = fetcher.fetch_json(&url, CacheMode::Default).await;

        assert!(matches!(result, Err(FetchError::Json { .. })));
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let server = MockServer::start().await;
        let fetcher = test_fetcher();
        let url = format!("{}/doc.json", server.uri());

        {
            let _guard = Mock::given(method("GET"))
                .and(path("/doc.json"))
                .respond_with(ResponseTemplate::new(500))
                .expect(1)
                .mount_as_scoped(&server)
                .await;
            assert!(fetcher.fetch_json(&url, CacheMode::Default).await.is_err());
        }

        let _guard = Mock::given(method("GET"))
            .and(path("/doc.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount_as_scoped(&server)
            .await;
        let recovered = fetcher.fetch_json(&url, CacheMode::Default).await.unwrap();
        assert_eq!(*recovered, json!({"ok": true}));
    }

    // ==================== Markdown Fetch Tests ====================

    #[tokio::test]
    async fn test_fetch_markdown_splits_front_matter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/about.md"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("---\ntitle: About\n---\n# Hi\n"),
            )
            .mount(&server)
            .await;

        let fetcher = test_fetcher();
        let url = format!("{}/about.md", server.uri());
        let document = fetcher
            .fetch_markdown(&url, CacheMode::Default)
            .await
            .unwrap();

        assert_eq!(document.data.get("title"), Some(&json!("About")));
        assert_eq!(document.content, "# Hi\n");
    }

    #[tokio::test]
    async fn test_fetch_markdown_caches_by_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/about.md"))
            .respond_with(ResponseTemplate::new(200).set_body_string("body only"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = test_fetcher();
        let url = format!("{}/about.md", server.uri());
        let first = fetcher
            .fetch_markdown(&url, CacheMode::Default)
            .await
            .unwrap();
        let second = fetcher
            .fetch_markdown(&url, CacheMode::Default)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert!(first.data.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_markdown_missing_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone.md"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = test_fetcher();
        let url = format!("{}/gone.md", server.uri());
        let result = fetcher.fetch_markdown(&url, CacheMode::Default).await;

        assert!(matches!(result, Err(FetchError::Status { status, .. }) if status == 404));
    }
}
