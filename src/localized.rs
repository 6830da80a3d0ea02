//! Localized value classification and resolution.
//!
//! Authored content stores translatable leaves as locale-keyed maps
//! (`{"en": "Hello", "pt": "Olá"}`). This module classifies raw JSON values
//! into an explicit sum type at the boundary and picks the best scalar for a
//! requested locale, so the rest of the engine never re-derives "is this a
//! localized map" from duck-typed inspection.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::i18n::{Language, LanguageRegistry};

/// Shape category of a raw authored value.
///
/// Produced once per value by [`classify`]; everything downstream matches on
/// this instead of inspecting the JSON again.
#[derive(Debug, PartialEq)]
pub enum Classified<'a> {
    /// Null, or a locale-keyed map with no usable value. Drops out of the
    /// resolved document entirely.
    Empty,
    /// String, number, or boolean. Passes through resolution unchanged.
    Scalar(&'a Value),
    /// Object keyed only by enabled locale codes, holding at least one
    /// usable value. Resolves to a single scalar.
    Localized(&'a Map<String, Value>),
    /// Array. Resolves element-wise.
    List(&'a Vec<Value>),
    /// Any other object, including the empty object. Resolves key-wise.
    Record(&'a Map<String, Value>),
}

/// Normalize a single locale-map entry.
///
/// Strings are trimmed and empty strings count as absent; null is absent;
/// anything else passes through unchanged. Returns `None` when the entry
/// holds nothing usable.
pub fn normalize_scalar(raw: &Value) -> Option<Value> {
    match raw {
        Value::Null => None,
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(Value::String(trimmed.to_string()))
            }
        }
        other => Some(other.clone()),
    }
}

/// Classify a raw value.
///
/// An object is a localized map iff it is non-empty, every key is an enabled
/// locale code, and at least one entry normalizes to a usable value. A
/// locale-keyed object with no usable entry classifies as `Empty` (the map is
/// discarded rather than surfacing as an empty record). A single unrecognized
/// key disqualifies the whole map.
pub fn classify(value: &Value) -> Classified<'_> {
    match value {
        Value::Null => Classified::Empty,
        Value::Array(items) => Classified::List(items),
        Value::Object(map) => {
            if map.is_empty() {
                return Classified::Record(map);
            }
            let registry = LanguageRegistry::get();
            if !map.keys().all(|key| registry.is_enabled(key)) {
                return Classified::Record(map);
            }
            if map.values().any(|raw| normalize_scalar(raw).is_some()) {
                Classified::Localized(map)
            } else {
                Classified::Empty
            }
        }
        scalar => Classified::Scalar(scalar),
    }
}

/// Pick the best entry of a localized map for an ordered locale preference.
///
/// Two phases: first walk `preference` in order, then fall back to scanning
/// the map's entries in authored (insertion) order, accepting any recognized
/// locale. The second phase guarantees that a record holding content in only
/// one locale outside the preference list is still rendered rather than
/// silently dropped. Returns the value together with the locale it actually
/// came from.
pub fn pick_localized(map: &Map<String, Value>, preference: &[Language]) -> Option<(Language, Value)> {
    for &locale in preference {
        if let Some(raw) = map.get(locale.code()) {
            if let Some(value) = normalize_scalar(raw) {
                return Some((locale, value));
            }
        }
    }

    for (key, raw) in map {
        let Ok(locale) = Language::from_code(key) else {
            continue;
        };
        if let Some(value) = normalize_scalar(raw) {
            return Some((locale, value));
        }
    }

    None
}

/// Recursively resolve a raw authored value into its locale-concrete form.
///
/// Localized maps collapse to a scalar picked by `language`'s fallback chain,
/// recording the locale actually used into `locales_used`. Lists resolve
/// element-wise, dropping elements that resolve to nothing. Records resolve
/// key-wise, keeping only keys that resolved. `None` means the value
/// contributes nothing and must drop out of its parent; nulls never appear
/// in the output.
pub fn resolve_value(
    value: &Value,
    language: Language,
    locales_used: &mut HashSet<Language>,
) -> Option<Value> {
    match classify(value) {
        Classified::Empty => None,
        Classified::Scalar(scalar) => Some(scalar.clone()),
        Classified::List(items) => {
            let resolved: Vec<Value> = items
                .iter()
                .filter_map(|item| resolve_value(item, language, locales_used))
                .collect();
            Some(Value::Array(resolved))
        }
        Classified::Localized(map) => {
            let (locale, picked) = pick_localized(map, &language.fallback_chain())?;
            locales_used.insert(locale);
            Some(picked)
        }
        Classified::Record(map) => {
            let mut resolved = Map::new();
            for (key, entry) in map {
                if let Some(entry_value) = resolve_value(entry, language, locales_used) {
                    resolved.insert(key.clone(), entry_value);
                }
            }
            Some(Value::Object(resolved))
        }
    }
}
