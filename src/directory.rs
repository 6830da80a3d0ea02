//! Record directory: manifest-backed lookup of every known content record.
//!
//! The content build publishes a manifest listing each record's logical name
//! and storage location. The directory loads it lazily (at most one fetch in
//! flight at a time), builds lookup maps in both directions, and derives the
//! caches the binding resolver leans on: the page-slug map, the collection
//! identifier map, and the site-config identifier. Derived caches are rebuilt
//! with every (re)load.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::info;

use crate::fetch::{CacheMode, DocumentFetcher};
use crate::i18n::Language;

/// Synthetic site-config identifier, valid even when the manifest omits it.
pub const SITE_CONFIG_OBJECT_ID: &str = "SiteConfig:content/site.json";

const SITE_CONFIG_MODEL: &str = "SiteConfig";

/// Known collections: binding prefix, model name, default storage location.
/// Order matters; the binding resolver scans prefixes in this order.
const COLLECTIONS: &[(&str, &str, &str)] = &[
    ("products", "ProductCollection", "content/products/index.json"),
    ("articles", "ArticleCollection", "content/articles/index.json"),
    ("reviews", "ReviewCollection", "content/reviews/index.json"),
    ("videos", "VideoCollection", "content/videos.json"),
    ("training", "TrainingCollection", "content/training.json"),
    ("shop", "ShopContent", "content/shop.json"),
    ("policies", "PolicyCollection", "content/policies.json"),
    ("courses", "CourseCollection", "content/courses.json"),
    ("partners", "PartnerCollection", "content/partners.json"),
    ("doctors", "DoctorCollection", "content/doctors.json"),
];

/// Legacy page model names, consulted only while the directory is not loaded.
const LEGACY_PAGE_MODELS: &[(&str, &str)] = &[
    ("home", "HomePage"),
    ("about", "AboutPage"),
    ("story", "StoryPage"),
    ("clinics", "ClinicsPage"),
    ("contact", "ContactPage"),
    ("method", "MethodPage"),
    ("learn", "LearnPage"),
    ("videos", "VideosPage"),
    ("training", "TrainingPage"),
    ("test", "TestPage"),
];

/// Record identifier in the `Name:relative/path` form shared by bindings,
/// the manifest, and the valid-identifier set.
pub fn object_id(document_type: &str, file_path: &str) -> String {
    format!("{}:{}", document_type, file_path.trim_start_matches('/'))
}

/// Collection identifiers from the static defaults, in matcher priority
/// order. Used until a manifest provides authoritative locations.
pub fn default_collection_ids() -> Vec<(&'static str, String)> {
    COLLECTIONS
        .iter()
        .map(|(prefix, model, default_path)| (*prefix, object_id(model, default_path)))
        .collect()
}

/// Identifier the legacy static table implies for a page slug and locale.
pub fn legacy_page_record_id(slug: &str, locale: Language) -> Option<String> {
    LEGACY_PAGE_MODELS
        .iter()
        .find(|(known_slug, _)| *known_slug == slug)
        .map(|(_, model)| {
            object_id(
                model,
                &format!("content/pages/{}/{}.json", locale.code(), slug),
            )
        })
}

/// One record in the published manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordModel {
    pub name: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
}

/// The published manifest: every known content record.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub models: Vec<RecordModel>,
}

// Page storage location pattern (cached for performance)
static PAGE_PATH_REGEX: OnceLock<Regex> = OnceLock::new();

fn parse_page_path(file_path: &str) -> Option<(String, Language)> {
    let pattern = PAGE_PATH_REGEX.get_or_init(|| {
        Regex::new(r"^content/pages/([a-z]{2})/([a-z0-9-]+)\.json$").unwrap()
    });
    let captures = pattern.captures(file_path)?;
    let locale = Language::from_code(captures.get(1)?.as_str()).ok()?;
    let slug = captures.get(2)?.as_str().to_string();
    Some((slug, locale))
}

/// Immutable snapshot of one loaded manifest plus every derived cache.
#[derive(Debug)]
pub struct DirectoryIndex {
    name_to_location: HashMap<String, String>,
    location_to_name: HashMap<String, String>,
    valid_object_ids: HashSet<String>,
    page_records: HashMap<(String, Language), String>,
    collection_ids: Vec<(&'static str, String)>,
    site_config_id: String,
}

impl DirectoryIndex {
    fn build(manifest: &Manifest) -> Self {
        let mut name_to_location = HashMap::new();
        let mut location_to_name = HashMap::new();
        let mut valid_object_ids = HashSet::new();
        let mut page_records = HashMap::new();

        for model in &manifest.models {
            // Collisions are not rejected; last write wins.
            name_to_location.insert(model.name.clone(), model.file_path.clone());
            location_to_name.insert(model.file_path.clone(), model.name.clone());
            valid_object_ids.insert(object_id(&model.name, &model.file_path));

            if let Some((slug, locale)) = parse_page_path(&model.file_path) {
                page_records.insert((slug, locale), object_id(&model.name, &model.file_path));
            }
        }

        let site_config_id = name_to_location
            .get(SITE_CONFIG_MODEL)
            .map(|location| object_id(SITE_CONFIG_MODEL, location))
            .unwrap_or_else(|| SITE_CONFIG_OBJECT_ID.to_string());
        valid_object_ids.insert(SITE_CONFIG_OBJECT_ID.to_string());
        valid_object_ids.insert(site_config_id.clone());

        let collection_ids = COLLECTIONS
            .iter()
            .map(|(prefix, model, default_path)| {
                let id = name_to_location
                    .get(*model)
                    .map(|location| object_id(model, location))
                    .unwrap_or_else(|| object_id(model, default_path));
                (*prefix, id)
            })
            .collect();

        DirectoryIndex {
            name_to_location,
            location_to_name,
            valid_object_ids,
            page_records,
            collection_ids,
            site_config_id,
        }
    }

    /// Storage location of a record by logical name.
    pub fn location_of(&self, name: &str) -> Option<&str> {
        self.name_to_location.get(name).map(String::as_str)
    }

    /// Logical name of a record by storage location.
    pub fn name_of(&self, location: &str) -> Option<&str> {
        self.location_to_name.get(location).map(String::as_str)
    }

    /// Whether an identifier names a record the manifest knows about.
    pub fn is_known_object_id(&self, id: &str) -> bool {
        self.valid_object_ids.contains(id)
    }

    /// Identifier of the page record for a slug and locale, if any.
    pub fn page_record_id(&self, slug: &str, locale: Language) -> Option<&str> {
        self.page_records
            .get(&(slug.to_string(), locale))
            .map(String::as_str)
    }

    /// Collection identifiers, in matcher priority order.
    pub fn collection_ids(&self) -> &[(&'static str, String)] {
        &self.collection_ids
    }

    /// The site-config record identifier.
    pub fn site_config_id(&self) -> &str {
        &self.site_config_id
    }

    /// Number of records loaded from the manifest.
    pub fn len(&self) -> usize {
        self.name_to_location.len()
    }

    /// Whether the manifest carried no records at all.
    pub fn is_empty(&self) -> bool {
        self.name_to_location.is_empty()
    }
}

/// Lazily-loaded record directory.
///
/// Construct one per engine instance. The async mutex is held across the
/// manifest fetch, so concurrent first callers share one load instead of
/// issuing duplicates; a failed load leaves the state empty and the next
/// call re-attempts.
pub struct RecordDirectory {
    fetcher: Arc<DocumentFetcher>,
    manifest_url: String,
    state: Mutex<Option<Arc<DirectoryIndex>>>,
}

impl RecordDirectory {
    pub fn new(fetcher: Arc<DocumentFetcher>, manifest_url: String) -> Self {
        Self {
            fetcher,
            manifest_url,
            state: Mutex::new(None),
        }
    }

    /// Snapshot of the loaded index, without triggering a load.
    pub async fn loaded(&self) -> Option<Arc<DirectoryIndex>> {
        self.state.lock().await.clone()
    }

    /// Return the loaded index, fetching and building it on first use.
    pub async fn get_or_load(&self) -> Result<Arc<DirectoryIndex>> {
        let mut state = self.state.lock().await;
        if let Some(index) = state.as_ref() {
            return Ok(Arc::clone(index));
        }

        let index = Arc::new(self.load_index().await?);
        *state = Some(Arc::clone(&index));
        Ok(index)
    }

    /// Drop the loaded index and every derived cache; the next
    /// `get_or_load` rebuilds from a fresh manifest fetch.
    pub async fn invalidate(&self) {
        self.state.lock().await.take();
    }

    async fn load_index(&self) -> Result<DirectoryIndex> {
        info!("Loading record manifest from {}", self.manifest_url);
        let document = self
            .fetcher
            .fetch_json(&self.manifest_url, CacheMode::Default)
            .await
            .with_context(|| format!("Failed to fetch record manifest from {}", self.manifest_url))?;

        let manifest: Manifest = serde_json::from_value((*document).clone())
            .context("Record manifest has an unexpected shape")?;
        info!("Record directory loaded with {} models", manifest.models.len());

        Ok(DirectoryIndex::build(&manifest))
    }
}
