//! Language type: Flexible, validated locale representation.
//!
//! This module provides the `Language` type, a small copyable handle validated
//! against the registry, plus the fallback-chain operations that drive every
//! localized-value pick during content resolution.

use crate::i18n::{LanguageConfig, LanguageRegistry};
use anyhow::{bail, Result};

/// A validated locale.
///
/// This type represents a locale that has been validated against the registry.
/// It ensures that only supported, enabled locales can be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language {
    /// ISO 639-1 language code (e.g., "en", "pt", "es")
    code: &'static str,
}

impl Language {
    /// English, the canonical locale.
    pub const ENGLISH: Language = Language { code: "en" };

    /// Portuguese.
    pub const PORTUGUESE: Language = Language { code: "pt" };

    /// Spanish.
    pub const SPANISH: Language = Language { code: "es" };

    /// Create a Language from a language code string.
    ///
    /// # Arguments
    /// * `code` - The ISO 639-1 language code (e.g., "en", "pt")
    ///
    /// # Returns
    /// * `Ok(Language)` if the code is valid and the locale is enabled
    /// * `Err` if the code is not found or the locale is disabled
    ///
    /// # Example
    /// ```ignore
    /// let portuguese = Language::from_code("pt")?;
    /// ```
    pub fn from_code(code: &str) -> Result<Language> {
        let registry = LanguageRegistry::get();

        match registry.get_by_code(code) {
            Some(config) if config.enabled => Ok(Language {
                code: config.code, // Use the static str from the registry
            }),
            Some(_) => bail!("Language '{}' is not enabled", code),
            None => bail!("Unknown language code: '{}'", code),
        }
    }

    /// Get the canonical (default) locale.
    ///
    /// This is the locale content is originally authored in, and the first
    /// fallback for every other locale.
    pub fn canonical() -> Language {
        let config = LanguageRegistry::get().canonical();
        Language { code: config.code }
    }

    /// All enabled locales, in canonical order.
    pub fn all_enabled() -> Vec<Language> {
        LanguageRegistry::get()
            .list_enabled()
            .into_iter()
            .map(|config| Language { code: config.code })
            .collect()
    }

    /// Get the ISO 639-1 language code.
    ///
    /// # Returns
    /// The language code as a static string (e.g., "en", "pt").
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Get the full locale configuration from the registry.
    ///
    /// # Panics
    /// Panics if the language code is not found in the registry. This should
    /// never happen if the Language was constructed properly (via `from_code`
    /// or constants).
    pub fn config(&self) -> &'static LanguageConfig {
        LanguageRegistry::get()
            .get_by_code(self.code)
            .expect("Language code should always be valid")
    }

    /// Get the English name of the locale (e.g., "Portuguese").
    pub fn name(&self) -> &'static str {
        self.config().name
    }

    /// Get the native name of the locale (e.g., "Português").
    pub fn native_name(&self) -> &'static str {
        self.config().native_name
    }

    /// Check if this is the canonical locale.
    pub fn is_canonical(&self) -> bool {
        self.config().is_canonical
    }

    /// Ordered locale preference for this language: the language itself first,
    /// then every other enabled locale in canonical (registry) order.
    ///
    /// This chain decides which entry of a locale-keyed value map wins when
    /// the requested locale is absent. It always contains every enabled
    /// locale exactly once.
    ///
    /// # Example
    /// ```ignore
    /// let chain = Language::PORTUGUESE.fallback_chain();
    /// // pt, en, es
    /// ```
    pub fn fallback_chain(&self) -> Vec<Language> {
        let mut chain = vec![*self];
        for language in Language::all_enabled() {
            if language != *self {
                chain.push(language);
            }
        }
        chain
    }
}

/// Locale preference for an arbitrary code.
///
/// Recognized codes get their own fallback chain; unrecognized codes get the
/// full canonical order, so resolution still walks every enabled locale.
pub fn fallback_chain_for_code(code: &str) -> Vec<Language> {
    match Language::from_code(code) {
        Ok(language) => language.fallback_chain(),
        Err(_) => Language::all_enabled(),
    }
}
