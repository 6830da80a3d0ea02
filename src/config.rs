use std::time::Duration;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    // Content store
    pub content_base_url: String,
    pub manifest_url: String,

    // Fetching
    pub fetch_timeout_secs: u64,

    // Editing
    pub live_editing: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let content_base_url =
            std::env::var("CONTENT_BASE_URL").context("CONTENT_BASE_URL not set")?;

        // The manifest normally lives next to the content it describes
        let manifest_url = std::env::var("CONTENT_MANIFEST_URL").unwrap_or_else(|_| {
            format!("{}/metadata.json", content_base_url.trim_end_matches('/'))
        });

        Ok(Self {
            content_base_url,
            manifest_url,

            fetch_timeout_secs: std::env::var("FETCH_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),

            live_editing: std::env::var("LIVE_EDITING")
                .map(|v| {
                    let v = v.trim().to_ascii_lowercase();
                    v == "1" || v == "true" || v == "yes"
                })
                .unwrap_or(false),
        })
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
