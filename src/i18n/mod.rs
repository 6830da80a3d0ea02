//! Internationalization (i18n) module for locale handling.
//!
//! This module provides a centralized, extensible architecture for the
//! locales the content store carries. All locale metadata and fallback-order
//! logic is contained here.
//!
//! # Architecture
//!
//! - `registry`: Single source of truth for all supported locales and their metadata
//! - `language`: Type-safe Language type plus fallback-chain operations
//!
//! # Example
//!
//! ```rust,ignore
//! use crate::i18n::{Language, LanguageRegistry};
//!
//! // Get canonical locale (English)
//! let canonical = Language::canonical();
//!
//! // Create locale from code
//! let portuguese = Language::from_code("pt")?;
//!
//! // Preference order used when picking localized values
//! let chain = portuguese.fallback_chain();
//! ```

mod language;
mod registry;

pub use language::{fallback_chain_for_code, Language};
pub use registry::{LanguageConfig, LanguageRegistry};
