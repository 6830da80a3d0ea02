//! Language registry: Single source of truth for all supported locales.
//!
//! This module provides a centralized registry of every locale the content
//! store may carry. It uses a singleton pattern with `OnceLock` to ensure
//! thread-safe initialization and access. Registry order is load-bearing:
//! it defines the canonical fallback order used during content resolution.

use std::sync::OnceLock;

/// Configuration for a supported locale.
///
/// Contains all metadata and settings for a specific locale, including
/// its code, names, enabled status, and whether it's the canonical locale.
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// ISO 639-1 language code (e.g., "en", "pt", "es")
    pub code: &'static str,

    /// English name of the language (e.g., "English", "Portuguese")
    pub name: &'static str,

    /// Native name of the language (e.g., "English", "Português")
    pub native_name: &'static str,

    /// Whether this is the canonical/default locale (only one should be true)
    pub is_canonical: bool,

    /// Whether this locale is enabled for use
    pub enabled: bool,
}

/// Global language registry singleton.
///
/// This registry contains all supported locales and provides methods to query
/// and access them. It's initialized once on first access and remains immutable
/// thereafter. Its iteration order is the canonical fallback order.
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

/// Global registry instance (initialized lazily)
static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Get the global language registry instance.
    ///
    /// This method initializes the registry on first call and returns a reference
    /// to the singleton instance on subsequent calls.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    /// Get a locale configuration by its code.
    ///
    /// # Arguments
    /// * `code` - The ISO 639-1 language code (e.g., "en", "pt")
    ///
    /// # Returns
    /// * `Some(&LanguageConfig)` if the locale exists
    /// * `None` if the locale is not found
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// Get all enabled locales, in canonical order.
    ///
    /// # Returns
    /// A vector of references to all locale configurations where `enabled` is true.
    pub fn list_enabled(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().filter(|lang| lang.enabled).collect()
    }

    /// Get all locales (including disabled ones).
    pub fn list_all(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().collect()
    }

    /// Get the canonical locale configuration.
    ///
    /// The canonical locale is the default authoring language and the first
    /// fallback for every other locale. There should be exactly one.
    ///
    /// # Returns
    /// A reference to the canonical locale configuration.
    ///
    /// # Panics
    /// Panics if no canonical locale is found or if multiple canonical
    /// locales are defined (this indicates a configuration error).
    pub fn canonical(&self) -> &LanguageConfig {
        let canonical_langs: Vec<_> = self
            .languages
            .iter()
            .filter(|lang| lang.is_canonical)
            .collect();

        match canonical_langs.len() {
            0 => panic!("No canonical locale found in registry"),
            1 => canonical_langs[0],
            _ => panic!("Multiple canonical locales found in registry"),
        }
    }

    /// Check if a language code is supported and enabled.
    ///
    /// Locale-keyed maps in authored content may only use enabled codes;
    /// this is the check that gates "localized map" classification.
    ///
    /// # Returns
    /// `true` if the locale exists and is enabled, `false` otherwise.
    pub fn is_enabled(&self, code: &str) -> bool {
        self.get_by_code(code)
            .map(|lang| lang.enabled)
            .unwrap_or(false)
    }
}

/// Default locale configurations.
///
/// The order here defines the canonical fallback order: English first,
/// then Portuguese, then Spanish.
fn default_languages() -> Vec<LanguageConfig> {
    vec![
        LanguageConfig {
            code: "en",
            name: "English",
            native_name: "English",
            is_canonical: true,
            enabled: true,
        },
        LanguageConfig {
            code: "pt",
            name: "Portuguese",
            native_name: "Português",
            is_canonical: false,
            enabled: true,
        },
        LanguageConfig {
            code: "es",
            name: "Spanish",
            native_name: "Español",
            is_canonical: false,
            enabled: true,
        },
    ]
}
