//! Preview page binary - resolves a unified page record and displays the
//! locale-concrete document without involving any site build.
//!
//! Usage:
//!   cargo run --bin preview -- home                 # Resolve "home" in the canonical locale
//!   cargo run --bin preview -- about --locale es    # Resolve "about" in Spanish
//!
//! Required environment variables:
//! - CONTENT_BASE_URL
//!
//! Optional:
//! - CONTENT_MANIFEST_URL (defaults to CONTENT_BASE_URL/metadata.json)
//! - FETCH_TIMEOUT_SECS (defaults to 10)
//! - LIVE_EDITING (defaults to false; also previews the record binding)

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::json;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use site_content_engine::binding::BindingResolver;
use site_content_engine::config::Config;
use site_content_engine::directory::RecordDirectory;
use site_content_engine::fetch::DocumentFetcher;
use site_content_engine::i18n::Language;
use site_content_engine::page::{PageResolver, ResolvedPage};

/// Parse `<page-id> [--locale <code>]` from the command line.
fn parse_args() -> Result<(String, Language)> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut page_id: Option<String> = None;
    let mut locale = Language::canonical();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--locale" {
            let code = iter.next().context("--locale requires a language code")?;
            locale = Language::from_code(code)?;
        } else if page_id.is_none() {
            page_id = Some(arg.clone());
        }
    }

    Ok((page_id.unwrap_or_else(|| "home".to_string()), locale))
}

/// Save the resolved document to run-history/ for later comparison.
fn save_snapshot(page_id: &str, requested: Language, page: &ResolvedPage) -> Result<()> {
    let history_dir = Path::new("run-history");
    fs::create_dir_all(history_dir).context("Failed to create run-history directory")?;

    let filename = format!(
        "{}_{}_{}.json",
        page_id,
        requested.code(),
        Utc::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let filepath = history_dir.join(&filename);

    let snapshot = json!({
        "pageId": page_id,
        "requestedLocale": requested.code(),
        "resolvedLocale": page.locale.code(),
        "source": page.source.as_str(),
        "data": page.data,
    });
    let contents = serde_json::to_string_pretty(&snapshot)?;
    fs::write(&filepath, contents).context("Failed to write snapshot to run-history")?;

    info!("Saved snapshot to {}", filepath.display());
    Ok(())
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

    let (page_id, locale) = parse_args()?;

    info!("Loading configuration...");
    let config = Config::from_env()?;

    let fetcher = Arc::new(DocumentFetcher::new(config.fetch_timeout())?);
    let resolver = PageResolver::new(Arc::clone(&fetcher), config.content_base_url.clone());

    info!(
        "Resolving page '{}' for locale '{}' from {}",
        page_id,
        locale.code(),
        config.content_base_url
    );

    let Some(page) = resolver.resolve_page(&page_id, locale).await else {
        println!("\n========== PAGE NOT FOUND ==========");
        println!("No candidate index holds a record with id '{}'.", page_id);
        println!("====================================\n");
        return Ok(());
    };

    save_snapshot(&page_id, locale, &page)?;

    let section_count = page.data["sections"].as_array().map_or(0, Vec::len);

    println!("\n========== RESOLVED PAGE ==========");
    println!("Page:             {}", page_id);
    println!("Requested locale: {}", locale.code());
    println!("Resolved locale:  {}", page.locale.code());
    println!("Index source:     {}", page.source.as_str());
    println!("Sections:         {}", section_count);
    println!("===================================\n");
    println!("{}", serde_json::to_string_pretty(&page.data)?);

    if config.live_editing {
        let directory = Arc::new(RecordDirectory::new(fetcher, config.manifest_url.clone()));
        let bindings = BindingResolver::new(directory, true);

        let field_path = format!("pages.{}_{}", page_id, locale.code());
        match bindings.resolve(&field_path).await {
            Some(binding) => println!("\nRecord binding: {}", binding.record_id),
            None => println!("\nRecord binding: none for '{}'", field_path),
        }
    }

    Ok(())
}
