//! Content audit binary - resolves every audited page in every enabled locale
//! and reports which locale actually served the content.
//!
//! Usage:
//!   cargo run --bin content-audit
//!   AUDIT_PAGES=home,about cargo run --bin content-audit
//!
//! Required environment variables:
//! - CONTENT_BASE_URL
//!
//! Optional:
//! - AUDIT_PAGES (comma-separated page ids, defaults to the known page slugs)
//! - FETCH_TIMEOUT_SECS (defaults to 10)

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use site_content_engine::config::Config;
use site_content_engine::fetch::DocumentFetcher;
use site_content_engine::i18n::Language;
use site_content_engine::page::PageResolver;

const DEFAULT_AUDIT_PAGES: &str = "home,about,story,clinics,contact,method,learn,videos,training";

fn audit_pages() -> Vec<String> {
    let configured =
        std::env::var("AUDIT_PAGES").unwrap_or_else(|_| DEFAULT_AUDIT_PAGES.to_string());
    configured
        .split(',')
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("site_content_engine=info".parse().unwrap()),
        )
        .init();

    // Load environment from .env file
    dotenvy::dotenv().ok();

    info!("Loading configuration...");
    let config = Config::from_env()?;

    let fetcher = Arc::new(DocumentFetcher::new(config.fetch_timeout())?);
    let resolver = PageResolver::new(fetcher, config.content_base_url.clone());

    let pages = audit_pages();
    let locales = Language::all_enabled();
    info!(
        "Auditing {} pages across {} locales against {}",
        pages.len(),
        locales.len(),
        config.content_base_url
    );

    let mut resolved_count = 0usize;
    let mut fallback_count = 0usize;
    let mut missing_count = 0usize;

    println!("\n========== CONTENT AUDIT ==========");
    for page_id in &pages {
        for locale in &locales {
            match resolver.resolve_page(page_id, *locale).await {
                Some(page) => {
                    resolved_count += 1;
                    let section_count = page.data["sections"].as_array().map_or(0, Vec::len);
                    if page.locale == *locale {
                        println!(
                            "✓ {:<10} [{}] {} sections ({})",
                            page_id,
                            locale.code(),
                            section_count,
                            page.source.as_str()
                        );
                    } else {
                        fallback_count += 1;
                        println!(
                            "✓ {:<10} [{}] {} sections ({}), served from '{}'",
                            page_id,
                            locale.code(),
                            section_count,
                            page.source.as_str(),
                            page.locale.code()
                        );
                    }
                }
                None => {
                    missing_count += 1;
                    println!("✗ {:<10} [{}] not found", page_id, locale.code());
                }
            }
        }
    }

    println!("-----------------------------------");
    println!(
        "Resolved: {} ({} via fallback), missing: {}",
        resolved_count, fallback_count, missing_count
    );
    println!("===================================\n");

    if resolved_count == 0 {
        anyhow::bail!(
            "No page resolved at all. Check CONTENT_BASE_URL ({}) and the published indexes.",
            config.content_base_url
        );
    }

    Ok(())
}
