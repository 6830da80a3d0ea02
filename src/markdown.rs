//! Legacy per-locale markdown loading.
//!
//! Before page records moved to locale-keyed maps, each locale had its own
//! markdown file: the canonical locale owns the base path and every other
//! locale inserts its code before the extension (`about.md` → `about.es.md`).
//! Callers fall back to this loader when unified page resolution yields
//! nothing.

use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use crate::fetch::{join_url, CacheMode, DocumentFetcher, FetchError};
use crate::frontmatter::MarkdownDocument;
use crate::i18n::Language;

/// A markdown document found by the per-locale fallback walk.
#[derive(Debug, Clone)]
pub struct LocalizedMarkdown {
    /// The loaded document, front matter already split.
    pub document: Arc<MarkdownDocument>,

    /// Locale of the file that answered.
    pub locale: Language,

    /// Concrete content path of the file that answered.
    pub path: String,
}

/// Locale-suffixed variant of a content path.
///
/// The canonical locale reads the base path unchanged; other locales insert
/// `.{code}` before the final extension. Extensionless paths get a plain
/// suffix.
pub fn localized_path(base_path: &str, locale: Language) -> String {
    if locale.is_canonical() {
        return base_path.to_string();
    }
    match base_path.rfind('.') {
        Some(last_dot) => format!(
            "{}.{}{}",
            &base_path[..last_dot],
            locale.code(),
            &base_path[last_dot..]
        ),
        None => format!("{}.{}", base_path, locale.code()),
    }
}

/// Load a markdown document, trying the requested locale's file first and
/// then the canonical locale's. Individual misses are warned and skipped;
/// only exhausting every candidate is an error.
pub async fn load_localized_markdown(
    fetcher: &DocumentFetcher,
    base_url: &str,
    base_path: &str,
    locale: Language,
    mode: CacheMode,
) -> Result<LocalizedMarkdown> {
    let mut candidates = vec![locale];
    let canonical = Language::canonical();
    if locale != canonical {
        candidates.push(canonical);
    }

    let mut last_error: Option<FetchError> = None;
    for candidate in candidates {
        let path = localized_path(base_path, candidate);
        let url = join_url(base_url, &path);
        match fetcher.fetch_markdown(&url, mode).await {
            Ok(document) => {
                return Ok(LocalizedMarkdown {
                    document,
                    locale: candidate,
                    path,
                })
            }
            Err(fetch_error) => {
                warn!(
                    "Markdown {} unavailable for locale {}: {}",
                    path,
                    candidate.code(),
                    fetch_error
                );
                last_error = Some(fetch_error);
            }
        }
    }

    Err(match last_error {
        Some(source) => anyhow::Error::new(source)
            .context(format!("No localized markdown found for {base_path}")),
        None => anyhow::anyhow!("No localized markdown found for {base_path}"),
    })
}
