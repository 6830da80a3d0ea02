//! Unified page resolution.
//!
//! A unified page record stores every language's content in one JSON record
//! (`metadata`, `hero`, `sections`, `fields`), with localized leaf values kept
//! as locale-keyed maps. [`PageResolver`] turns such a record into a single
//! locale-concrete document for one requested [`Language`], reporting which
//! locale the content actually came from and which index location served it.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::fetch::{join_url, CacheMode, DocumentFetcher};
use crate::i18n::Language;
use crate::localized::resolve_value;
use crate::paths::set_nested_value;

/// Index locations probed for unified page records, in priority order.
const PAGE_INDEX_CANDIDATES: &[(&str, ContentSource)] = &[
    ("site/content/pages_v2/index.json", ContentSource::Site),
    ("content/pages_v2/index.json", ContentSource::Content),
];

/// Hero sub-fields mirrored onto the document root for consumers that expect
/// the older flat shape.
const HERO_FLAT_PROJECTIONS: &[(&str, &str)] = &[
    ("headline", "heroHeadline"),
    ("subheadline", "heroSubheadline"),
    ("title", "heroTitle"),
    ("subtitle", "heroSubtitle"),
];

/// Which index location a resolved page was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSource {
    /// The site-scoped index (`site/content/pages_v2/index.json`).
    Site,
    /// The plain content index (`content/pages_v2/index.json`).
    Content,
}

impl ContentSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentSource::Site => "site",
            ContentSource::Content => "content",
        }
    }
}

/// A page index as stored at one of the candidate locations.
///
/// Records are kept as raw JSON here so one malformed record cannot poison
/// lookups of the others; the matching record is deserialized on its own.
#[derive(Debug, Deserialize)]
pub struct PageIndex {
    #[serde(default)]
    pub pages: Vec<Value>,
}

/// A multi-locale page record as authored in the content store.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPageRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub metadata: Option<PageMetadata>,
    #[serde(default)]
    pub hero: Option<Value>,
    #[serde(default)]
    pub sections: Vec<Value>,
    #[serde(default)]
    pub fields: Vec<PageField>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageMetadata {
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default)]
    pub description: Option<Value>,
}

/// An escape-hatch entry writing one localized value at a dotted path.
#[derive(Debug, Clone, Deserialize)]
pub struct PageField {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: Value,
}

/// The locale-concrete output of a page resolution.
#[derive(Debug, Clone)]
pub struct ResolvedPage {
    /// Nested document with no locale maps remaining.
    pub data: Value,
    /// The locale the resolved content predominantly came from.
    pub locale: Language,
    /// Which candidate index served the record.
    pub source: ContentSource,
}

/// Resolves unified page records against a remote content store.
pub struct PageResolver {
    fetcher: Arc<DocumentFetcher>,
    base_url: String,
}

impl PageResolver {
    pub fn new(fetcher: Arc<DocumentFetcher>, base_url: impl Into<String>) -> Self {
        PageResolver {
            fetcher,
            base_url: base_url.into(),
        }
    }

    /// Resolve the page `page_id` into a single-locale document.
    ///
    /// Candidate index locations are tried strictly in order; a candidate that
    /// fails to load, fails to parse, or lacks the record is logged and
    /// skipped. Index fetches bypass the document cache so editors always see
    /// fresh content. `None` means no candidate had the record; callers decide
    /// their own fallback from there.
    pub async fn resolve_page(&self, page_id: &str, language: Language) -> Option<ResolvedPage> {
        for (location, source) in PAGE_INDEX_CANDIDATES {
            let url = join_url(&self.base_url, location);
            let document = match self.fetcher.fetch_json(&url, CacheMode::NoStore).await {
                Ok(document) => document,
                Err(fetch_error) => {
                    warn!("Failed to load page index candidate {}: {}", url, fetch_error);
                    continue;
                }
            };

            let index: PageIndex = match serde_json::from_value((*document).clone()) {
                Ok(index) => index,
                Err(shape_error) => {
                    warn!("Page index at {} has an unexpected shape: {}", url, shape_error);
                    continue;
                }
            };

            let Some(raw) = index
                .pages
                .into_iter()
                .find(|record| record.get("id").and_then(Value::as_str) == Some(page_id))
            else {
                continue;
            };

            let record: RawPageRecord = match serde_json::from_value(raw) {
                Ok(record) => record,
                Err(shape_error) => {
                    warn!(
                        "Page record {} at {} has an unexpected shape: {}",
                        page_id, url, shape_error
                    );
                    continue;
                }
            };

            return Some(resolve_record(&record, language, *source));
        }

        None
    }
}

/// Resolve every part of `record` for `language` and assemble the output
/// document, tracking which locales the picked values came from.
fn resolve_record(record: &RawPageRecord, language: Language, source: ContentSource) -> ResolvedPage {
    let mut locales_used: HashSet<Language> = HashSet::new();
    let mut data = Value::Object(Map::new());

    if let Some(metadata) = &record.metadata {
        if let Some(title) = metadata
            .title
            .as_ref()
            .and_then(|value| resolve_value(value, language, &mut locales_used))
        {
            set_nested_value(&mut data, "metaTitle", title);
        }
        if let Some(description) = metadata
            .description
            .as_ref()
            .and_then(|value| resolve_value(value, language, &mut locales_used))
        {
            set_nested_value(&mut data, "metaDescription", description);
        }
    }

    if let Some(hero) = record
        .hero
        .as_ref()
        .and_then(|value| resolve_value(value, language, &mut locales_used))
    {
        project_hero_fields(&mut data, &hero);
        set_nested_value(&mut data, "hero", hero);
    }

    for field in &record.fields {
        if field.key.trim().is_empty() {
            continue;
        }
        if let Some(resolved) = resolve_value(&field.value, language, &mut locales_used) {
            set_nested_value(&mut data, &field.key, resolved);
        }
    }

    let mut sections: Vec<Value> = Vec::new();
    for section in &record.sections {
        let Some(resolved) = resolve_value(section, language, &mut locales_used) else {
            continue;
        };
        // A section must resolve a renderable type to survive.
        if section_type(&resolved).is_some() {
            sections.push(resolved);
        }
    }
    if !sections.is_empty() {
        set_nested_value(&mut data, "sections", Value::Array(sections));
    }

    let locale = determine_resolved_locale(language, &locales_used);
    ResolvedPage {
        data,
        locale,
        source,
    }
}

fn section_type(section: &Value) -> Option<&str> {
    match section.get("type") {
        Some(Value::String(kind)) if !kind.is_empty() => Some(kind),
        _ => None,
    }
}

/// Mirror well-known hero sub-fields onto the document root: scalar headline
/// variants, `cta*` sub-objects under `heroCtas`, and the `alignment`
/// sub-object's fields under `heroAlignment`.
fn project_hero_fields(data: &mut Value, hero: &Value) {
    let Some(hero) = hero.as_object() else {
        return;
    };

    for (hero_key, flat_key) in HERO_FLAT_PROJECTIONS {
        if let Some(value) = hero.get(*hero_key) {
            set_nested_value(data, flat_key, value.clone());
        }
    }

    for (key, value) in hero {
        if key.starts_with("cta") && value.is_object() {
            set_nested_value(data, &format!("heroCtas.{key}"), value.clone());
        }
    }

    if let Some(alignment) = hero.get("alignment").and_then(Value::as_object) {
        for (key, value) in alignment {
            set_nested_value(data, &format!("heroAlignment.{key}"), value.clone());
        }
    }
}

/// Pick the locale that best describes the resolved document: the first
/// locale of `language`'s fallback chain that actually supplied a value, or
/// the requested language itself when nothing localized resolved.
fn determine_resolved_locale(language: Language, locales_used: &HashSet<Language>) -> Language {
    if locales_used.is_empty() {
        return language;
    }
    language
        .fallback_chain()
        .into_iter()
        .find(|candidate| locales_used.contains(candidate))
        .unwrap_or(language)
}
