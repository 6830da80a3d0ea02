//! Localized content resolution and field-binding engine for the marketing
//! site.
//!
//! The content store publishes multi-locale JSON records (one record carries
//! every language's values, with arbitrary per-field sparsity) plus a manifest
//! of record names and storage locations. This crate resolves those records
//! into locale-concrete documents and maps editor field paths back onto the
//! records they came from:
//!
//! - [`i18n`]: enabled languages and per-language fallback chains.
//! - [`localized`]: classification and resolution of locale-keyed value maps.
//! - [`paths`]: dotted/indexed path writing into nested JSON.
//! - [`page`]: unified page record resolution.
//! - [`binding`]: field-path to record binding for live editing.
//! - [`directory`]: manifest-backed record directory.
//! - [`fetch`]: cached HTTP document fetching.
//! - [`frontmatter`] and [`markdown`]: localized markdown documents.

pub mod binding;
pub mod config;
pub mod directory;
pub mod fetch;
pub mod frontmatter;
pub mod i18n;
pub mod localized;
pub mod markdown;
pub mod page;
pub mod paths;
