//! Field-path binding resolution.
//!
//! Editing overlays hand the engine free-text field paths like
//! `pages.about_es.story[0].heading` or `site.header.logo`. [`BindingResolver`]
//! turns each one into a [`Binding`]: which content record the path refers to
//! and, optionally, where inside that record. Five matchers are tried in a
//! fixed order and the first hit wins; resolution is best-effort and never a
//! hard failure.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, OnceLock};

use regex::Regex;
use tracing::warn;

use crate::directory::{
    default_collection_ids, legacy_page_record_id, object_id, DirectoryIndex, RecordDirectory,
    SITE_CONFIG_OBJECT_ID,
};
use crate::i18n::Language;

static TRANSLATION_PATTERN: OnceLock<Regex> = OnceLock::new();
static SLUG_LOCALE_PATTERN: OnceLock<Regex> = OnceLock::new();
static BRACKET_INDEX_PATTERN: OnceLock<Regex> = OnceLock::new();

/// A resolved field-path binding: the record it addresses and an optional
/// path within the record. No path means the binding covers the whole record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub record_id: String,
    pub path: Option<String>,
}

/// Normalize a binding remainder: rewrite bracket indices (`[0]` becomes
/// `.0`), strip one leading dot, and collapse blank input to "no path".
pub fn normalize_field_path(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let pattern = BRACKET_INDEX_PATTERN.get_or_init(|| Regex::new(r"\[(\d+)\]").unwrap());
    let converted = pattern.replace_all(trimmed, ".$1");
    let stripped = converted.strip_prefix('.').unwrap_or(&converted);
    if stripped.is_empty() {
        None
    } else {
        Some(stripped.to_string())
    }
}

fn match_translation(value: &str) -> Option<Binding> {
    let pattern = TRANSLATION_PATTERN.get_or_init(|| {
        Regex::new(r"^translations\.([a-z]{2})\.([^.]+)(?:\.(.+))?$").unwrap()
    });
    let captures = pattern.captures(value)?;
    let locale = Language::from_code(captures.get(1)?.as_str()).ok()?;
    let module = captures.get(2)?.as_str();

    let record_id = object_id(
        &format!("translations_{module}"),
        &format!("content/translations/{module}.json"),
    );
    let path = match captures
        .get(3)
        .and_then(|rest| normalize_field_path(rest.as_str()))
    {
        Some(rest) => format!("{}.{}", locale.code(), rest),
        None => locale.code().to_string(),
    };
    Some(Binding {
        record_id,
        path: Some(path),
    })
}

fn match_colon(value: &str) -> Option<Binding> {
    let (record_id, remainder) = value.split_once(':')?;
    if record_id.is_empty() || remainder.is_empty() {
        return None;
    }
    Some(Binding {
        record_id: record_id.to_string(),
        path: normalize_field_path(remainder),
    })
}

/// Resolves free-text field paths into record bindings.
///
/// Holds the record directory for identifier lookups. In a live-editing
/// context the directory is loaded lazily on first use; outside of one the
/// resolver works entirely from the static fallback tables.
pub struct BindingResolver {
    directory: Arc<RecordDirectory>,
    live_editing: bool,
    unknown_record_warnings: Mutex<HashSet<String>>,
    missing_page_warnings: Mutex<HashSet<String>>,
}

impl BindingResolver {
    pub fn new(directory: Arc<RecordDirectory>, live_editing: bool) -> Self {
        BindingResolver {
            directory,
            live_editing,
            unknown_record_warnings: Mutex::new(HashSet::new()),
            missing_page_warnings: Mutex::new(HashSet::new()),
        }
    }

    /// Resolve one field path into a binding, or `None` when no scheme
    /// matches.
    ///
    /// Matchers run strictly in order: translation catalog, site config,
    /// named collection, page slug, raw colon form. A later matcher never
    /// overrides an earlier one. Identifiers are checked against the loaded
    /// directory and unknown ones are warned about once each, but the
    /// binding is returned regardless.
    pub async fn resolve(&self, raw: &str) -> Option<Binding> {
        let input = raw.trim();
        if input.is_empty() {
            return None;
        }

        if self.live_editing {
            if let Err(load_error) = self.directory.get_or_load().await {
                warn!("Record directory unavailable for binding resolution: {:#}", load_error);
            }
        }
        let snapshot = self.directory.loaded().await;
        let index = snapshot.as_deref();

        let translation = |value: &str| match_translation(value);
        let site = |value: &str| self.match_site(value, index);
        let collection = |value: &str| self.match_collection(value, index);
        let page = |value: &str| self.match_page(value, index);
        let colon = |value: &str| match_colon(value);
        let matchers: [&dyn Fn(&str) -> Option<Binding>; 5] =
            [&translation, &site, &collection, &page, &colon];

        let binding = matchers.iter().find_map(|try_match| try_match(input))?;

        if let Some(index) = index {
            if !index.is_known_object_id(&binding.record_id) {
                self.warn_once_unknown_record(&binding.record_id);
            }
        }

        Some(binding)
    }

    fn match_site(&self, value: &str, index: Option<&DirectoryIndex>) -> Option<Binding> {
        let remainder = value.strip_prefix("site.")?;

        if let Some(content_remainder) = remainder.strip_prefix("content.") {
            if let Some(binding) = self.match_site_page(content_remainder, index) {
                return Some(binding);
            }
            // Unrecognized locale, shape, or page: fall through to the flat
            // form with the whole remainder intact.
        }

        Some(Binding {
            record_id: self.site_config_record_id(index),
            path: normalize_field_path(remainder),
        })
    }

    /// The `site.content.<locale>.pages.<slug>[.<rest>]` sub-case, which
    /// redirects into the page record for that slug and locale.
    fn match_site_page(
        &self,
        content_remainder: &str,
        index: Option<&DirectoryIndex>,
    ) -> Option<Binding> {
        let mut parts = content_remainder.split('.');
        let locale = Language::from_code(parts.next()?).ok()?;
        if parts.next()? != "pages" {
            return None;
        }
        let slug = parts.next()?;

        let record_id = self.page_record_id_for(index, slug, locale)?;
        let rest = parts.collect::<Vec<_>>().join(".");
        Some(Binding {
            record_id,
            path: normalize_field_path(&rest),
        })
    }

    fn match_collection(&self, value: &str, index: Option<&DirectoryIndex>) -> Option<Binding> {
        let defaults;
        let collections: &[(&'static str, String)] = match index {
            Some(index) => index.collection_ids(),
            None => {
                defaults = default_collection_ids();
                &defaults
            }
        };

        for (prefix, record_id) in collections {
            if value == *prefix {
                return Some(Binding {
                    record_id: record_id.clone(),
                    path: None,
                });
            }
            if let Some(remainder) = value
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix('.'))
            {
                return Some(Binding {
                    record_id: record_id.clone(),
                    path: normalize_field_path(remainder),
                });
            }
        }
        None
    }

    fn match_page(&self, value: &str, index: Option<&DirectoryIndex>) -> Option<Binding> {
        let remainder = value.strip_prefix("pages.")?;
        let (slug_locale, rest) = match remainder.split_once('.') {
            Some((head, tail)) => (head, tail),
            None => (remainder, ""),
        };

        let pattern = SLUG_LOCALE_PATTERN
            .get_or_init(|| Regex::new(r"^([a-z0-9-]+)_([a-z]{2})$").unwrap());
        let captures = pattern.captures(slug_locale)?;
        let slug = captures.get(1)?.as_str();
        let locale = Language::from_code(captures.get(2)?.as_str()).ok()?;

        let record_id = self.page_record_id_for(index, slug, locale)?;
        Some(Binding {
            record_id,
            path: normalize_field_path(rest),
        })
    }

    /// Page record identifier for a slug and locale: from the directory when
    /// it has loaded, otherwise from the legacy static table. A pair the
    /// loaded directory cannot satisfy is warned about once.
    fn page_record_id_for(
        &self,
        index: Option<&DirectoryIndex>,
        slug: &str,
        locale: Language,
    ) -> Option<String> {
        match index {
            Some(index) => {
                let found = index.page_record_id(slug, locale).map(str::to_string);
                if found.is_none() {
                    self.warn_once_missing_page(slug, locale);
                }
                found
            }
            None => legacy_page_record_id(slug, locale),
        }
    }

    fn site_config_record_id(&self, index: Option<&DirectoryIndex>) -> String {
        match index {
            Some(index) => index.site_config_id().to_string(),
            None => SITE_CONFIG_OBJECT_ID.to_string(),
        }
    }

    fn warn_once_missing_page(&self, slug: &str, locale: Language) {
        let key = format!("{}_{}", slug, locale.code());
        let newly_seen = self.missing_page_warnings.lock().unwrap().insert(key);
        if newly_seen {
            warn!(
                "No page record for slug '{}' in locale '{}'",
                slug,
                locale.code()
            );
        }
    }

    fn warn_once_unknown_record(&self, record_id: &str) {
        let newly_seen = self
            .unknown_record_warnings
            .lock()
            .unwrap()
            .insert(record_id.to_string());
        if newly_seen {
            warn!("Binding references unknown record '{}'", record_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::DocumentFetcher;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_fetcher() -> Arc<DocumentFetcher> {
        Arc::new(DocumentFetcher::new(Duration::from_secs(5)).expect("fetcher should build"))
    }

    /// Resolver whose directory never loads; matchers run on static tables.
    fn offline_resolver() -> BindingResolver {
        let directory = Arc::new(RecordDirectory::new(
            test_fetcher(),
            "http://127.0.0.1:9/metadata.json".to_string(),
        ));
        BindingResolver::new(directory, false)
    }

    async fn live_resolver(server: &MockServer) -> BindingResolver {
        Mock::given(method("GET"))
            .and(path("/metadata.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [
                    {"name": "SiteConfig", "filePath": "content/site.json"},
                    {"name": "about", "filePath": "content/pages/en/about.json"},
                    {"name": "about_es", "filePath": "content/pages/es/about.json"},
                    {"name": "ProductCollection", "filePath": "content/products/catalog.json"}
                ]
            })))
            .mount(server)
            .await;

        let directory = Arc::new(RecordDirectory::new(
            test_fetcher(),
            format!("{}/metadata.json", server.uri()),
        ));
        BindingResolver::new(directory, true)
    }

    // ==================== normalize_field_path Tests ====================

    #[test]
    fn test_normalize_rewrites_bracket_indices() {
        assert_eq!(
            normalize_field_path("story[0].items[12].title"),
            Some("story.0.items.12.title".to_string())
        );
    }

    #[test]
    fn test_normalize_strips_one_leading_dot() {
        assert_eq!(normalize_field_path(".title"), Some("title".to_string()));
        assert_eq!(normalize_field_path("..title"), Some(".title".to_string()));
    }

    #[test]
    fn test_normalize_bare_index() {
        assert_eq!(normalize_field_path("[0]"), Some("0".to_string()));
    }

    #[test]
    fn test_normalize_blank_input_is_no_path() {
        assert_eq!(normalize_field_path(""), None);
        assert_eq!(normalize_field_path("   "), None);
        assert_eq!(normalize_field_path("."), None);
    }

    // ==================== Translation Matcher Tests ====================

    #[tokio::test]
    async fn test_translation_binding_with_rest() {
        let resolver = offline_resolver();
        let binding = resolver.resolve("translations.en.nav.menu.title").await.unwrap();

        assert_eq!(
            binding,
            Binding {
                record_id: "translations_nav:content/translations/nav.json".to_string(),
                path: Some("en.menu.title".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_translation_binding_without_rest() {
        let resolver = offline_resolver();
        let binding = resolver.resolve("translations.es.footer").await.unwrap();

        assert_eq!(
            binding.record_id,
            "translations_footer:content/translations/footer.json"
        );
        assert_eq!(binding.path, Some("es".to_string()));
    }

    #[tokio::test]
    async fn test_translation_requires_known_language() {
        let resolver = offline_resolver();
        assert_eq!(resolver.resolve("translations.fr.nav.title").await, None);
    }

    #[tokio::test]
    async fn test_translation_wins_over_colon_form() {
        let resolver = offline_resolver();
        let binding = resolver.resolve("translations.en.nav.some:thing").await.unwrap();

        // The colon matcher would also accept this shape, but must never run.
        assert_eq!(
            binding.record_id,
            "translations_nav:content/translations/nav.json"
        );
        assert_eq!(binding.path, Some("en.some:thing".to_string()));
    }

    // ==================== Site Matcher Tests ====================

    #[tokio::test]
    async fn test_site_flat_binding() {
        let resolver = offline_resolver();
        let binding = resolver.resolve("site.header.logo[0].src").await.unwrap();

        assert_eq!(binding.record_id, SITE_CONFIG_OBJECT_ID);
        assert_eq!(binding.path, Some("header.logo.0.src".to_string()));
    }

    #[tokio::test]
    async fn test_site_prefix_alone_binds_whole_record() {
        let resolver = offline_resolver();
        let binding = resolver.resolve("site.").await.unwrap();

        assert_eq!(binding.record_id, SITE_CONFIG_OBJECT_ID);
        assert_eq!(binding.path, None);
    }

    #[tokio::test]
    async fn test_site_content_page_binding() {
        let server = MockServer::start().await;
        let resolver = live_resolver(&server).await;
        let binding = resolver
            .resolve("site.content.es.pages.about.story[0].heading")
            .await
            .unwrap();

        assert_eq!(binding.record_id, "about_es:content/pages/es/about.json");
        assert_eq!(binding.path, Some("story.0.heading".to_string()));
    }

    #[tokio::test]
    async fn test_site_content_unknown_language_falls_back_to_flat() {
        let resolver = offline_resolver();
        let binding = resolver.resolve("site.content.fr.pages.home.hero").await.unwrap();

        assert_eq!(binding.record_id, SITE_CONFIG_OBJECT_ID);
        assert_eq!(binding.path, Some("content.fr.pages.home.hero".to_string()));
    }

    #[tokio::test]
    async fn test_site_content_non_pages_shape_falls_back_to_flat() {
        let resolver = offline_resolver();
        let binding = resolver.resolve("site.content.es.header.logo").await.unwrap();

        assert_eq!(binding.record_id, SITE_CONFIG_OBJECT_ID);
        assert_eq!(binding.path, Some("content.es.header.logo".to_string()));
    }

    #[tokio::test]
    async fn test_site_content_missing_page_falls_back_to_flat() {
        let server = MockServer::start().await;
        let resolver = live_resolver(&server).await;
        let binding = resolver
            .resolve("site.content.es.pages.unknown.hero")
            .await
            .unwrap();

        assert_eq!(binding.record_id, "SiteConfig:content/site.json");
        assert_eq!(binding.path, Some("content.es.pages.unknown.hero".to_string()));
    }

    #[tokio::test]
    async fn test_site_wins_over_collection() {
        let resolver = offline_resolver();
        let binding = resolver.resolve("site.products.0.name").await.unwrap();

        // "products" is a collection prefix, but the site matcher runs first.
        assert_eq!(binding.record_id, SITE_CONFIG_OBJECT_ID);
        assert_eq!(binding.path, Some("products.0.name".to_string()));
    }

    // ==================== Collection Matcher Tests ====================

    #[tokio::test]
    async fn test_collection_binding_whole_record() {
        let resolver = offline_resolver();
        let binding = resolver.resolve("products").await.unwrap();

        assert_eq!(
            binding,
            Binding {
                record_id: "ProductCollection:content/products/index.json".to_string(),
                path: None,
            }
        );
    }

    #[tokio::test]
    async fn test_collection_binding_with_path() {
        let resolver = offline_resolver();
        let binding = resolver.resolve("articles.0.title").await.unwrap();

        assert_eq!(
            binding.record_id,
            "ArticleCollection:content/articles/index.json"
        );
        assert_eq!(binding.path, Some("0.title".to_string()));
    }

    #[tokio::test]
    async fn test_collection_prefers_manifest_location() {
        let server = MockServer::start().await;
        let resolver = live_resolver(&server).await;
        let binding = resolver.resolve("products.0.name").await.unwrap();

        assert_eq!(
            binding.record_id,
            "ProductCollection:content/products/catalog.json"
        );
    }

    #[tokio::test]
    async fn test_collection_prefix_requires_dot_boundary() {
        let resolver = offline_resolver();
        assert_eq!(resolver.resolve("productsextra.title").await, None);
        assert_eq!(resolver.resolve("products[0].name").await, None);
    }

    // ==================== Page Matcher Tests ====================

    #[tokio::test]
    async fn test_page_binding_via_directory() {
        let server = MockServer::start().await;
        let resolver = live_resolver(&server).await;
        let binding = resolver
            .resolve("pages.about_es.story[0].heading")
            .await
            .unwrap();

        assert_eq!(
            binding,
            Binding {
                record_id: "about_es:content/pages/es/about.json".to_string(),
                path: Some("story.0.heading".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_page_binding_whole_record() {
        let server = MockServer::start().await;
        let resolver = live_resolver(&server).await;
        let binding = resolver.resolve("pages.about_es").await.unwrap();

        assert_eq!(binding.record_id, "about_es:content/pages/es/about.json");
        assert_eq!(binding.path, None);
    }

    #[tokio::test]
    async fn test_page_binding_legacy_when_directory_unloaded() {
        let resolver = offline_resolver();
        let binding = resolver.resolve("pages.about_es.title").await.unwrap();

        assert_eq!(binding.record_id, "AboutPage:content/pages/es/about.json");
        assert_eq!(binding.path, Some("title".to_string()));
    }

    #[tokio::test]
    async fn test_page_binding_unknown_language() {
        let resolver = offline_resolver();
        assert_eq!(resolver.resolve("pages.about_fr.title").await, None);
    }

    #[tokio::test]
    async fn test_page_binding_missing_slug_warned_once() {
        let server = MockServer::start().await;
        let resolver = live_resolver(&server).await;

        assert_eq!(resolver.resolve("pages.ghost_en.title").await, None);
        assert_eq!(resolver.resolve("pages.ghost_en.body").await, None);

        let warned = resolver.missing_page_warnings.lock().unwrap();
        assert_eq!(warned.len(), 1);
        assert!(warned.contains("ghost_en"));
    }

    // ==================== Colon Matcher Tests ====================

    #[tokio::test]
    async fn test_colon_binding() {
        let resolver = offline_resolver();
        let binding = resolver.resolve("HomeBanner:title").await.unwrap();

        assert_eq!(binding.record_id, "HomeBanner");
        assert_eq!(binding.path, Some("title".to_string()));
    }

    #[tokio::test]
    async fn test_colon_requires_both_halves() {
        let resolver = offline_resolver();
        assert_eq!(resolver.resolve(":title").await, None);
        assert_eq!(resolver.resolve("HomeBanner:").await, None);
    }

    #[tokio::test]
    async fn test_colon_remainder_normalizing_to_nothing_binds_whole_record() {
        let resolver = offline_resolver();
        let binding = resolver.resolve("HomeBanner:.").await.unwrap();

        assert_eq!(binding.record_id, "HomeBanner");
        assert_eq!(binding.path, None);
    }

    #[tokio::test]
    async fn test_unknown_record_warned_once_but_binding_returned() {
        let server = MockServer::start().await;
        let resolver = live_resolver(&server).await;

        let first = resolver.resolve("Ghost:title").await.unwrap();
        let second = resolver.resolve("Ghost:body").await.unwrap();

        assert_eq!(first.record_id, "Ghost");
        assert_eq!(second.record_id, "Ghost");
        assert_eq!(resolver.unknown_record_warnings.lock().unwrap().len(), 1);
    }

    // ==================== Dispatcher Tests ====================

    #[tokio::test]
    async fn test_input_is_trimmed_before_matching() {
        let resolver = offline_resolver();
        let binding = resolver.resolve("  site.title  ").await.unwrap();

        assert_eq!(binding.path, Some("title".to_string()));
    }

    #[tokio::test]
    async fn test_blank_input_resolves_to_none() {
        let resolver = offline_resolver();
        assert_eq!(resolver.resolve("").await, None);
        assert_eq!(resolver.resolve("   ").await, None);
    }

    #[tokio::test]
    async fn test_unrecognized_scheme_resolves_to_none() {
        let resolver = offline_resolver();
        assert_eq!(resolver.resolve("header.logo.src").await, None);
    }

    #[tokio::test]
    async fn test_directory_load_failure_still_resolves() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/metadata.json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let directory = Arc::new(RecordDirectory::new(
            test_fetcher(),
            format!("{}/metadata.json", server.uri()),
        ));
        let resolver = BindingResolver::new(directory, true);

        let binding = resolver.resolve("site.title").await.unwrap();
        assert_eq!(binding.record_id, SITE_CONFIG_OBJECT_ID);
    }

    #[tokio::test]
    async fn test_live_editing_loads_directory_on_first_resolve() {
        let server = MockServer::start().await;
        let resolver = live_resolver(&server).await;

        // A directory-backed identifier proves the lazy load happened.
        let binding = resolver.resolve("pages.about_es.title").await.unwrap();
        assert_eq!(binding.record_id, "about_es:content/pages/es/about.json");
        assert!(resolver.directory.loaded().await.is_some());
    }
}
