//! Extraction de l'année de création depuis les indices textuels

use std::sync::OnceLock;

use regex::Regex;

use crate::types::{HintEntry, HintsStore};

/// "Opprettet i <année>" (« créé en <année> »), insensible à la casse
fn established_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)Opprettet i\s+([0-9]{4})").expect("static regex is valid")
    })
}

/// Trouve l'entrée d'indices d'un parc
///
/// 1. entrée dont le `code` (après trim) est égal au code du parc ;
/// 2. sinon, le nom normalisé (trim + minuscules) utilisé comme clé directe ;
/// 3. sinon, aucune entrée.
///
/// Un parc sans code correspond à la première entrée sans code.
pub fn find_entry(store: &HintsStore, code: Option<&str>, name: Option<&str>) -> Option<HintEntry> {
    let code = code.unwrap_or_default().trim();
    if let Some((_, entry)) = store
        .entries()
        .find(|(_, entry)| entry.code_text().is_some_and(|c| c.trim() == code))
    {
        return Some(entry);
    }

    let key = name.unwrap_or_default().trim().to_lowercase();
    if key.is_empty() {
        return None;
    }
    store.get(&key)
}

/// Première année trouvée dans une liste d'indices
pub fn year_from_hints<S: AsRef<str>>(hints: &[S]) -> Option<i32> {
    hints.iter().find_map(|hint| {
        established_pattern()
            .captures(hint.as_ref())
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
    })
}

/// Année de création d'un parc, si un indice la mentionne
pub fn establishment_year(store: &HintsStore, code: Option<&str>, name: Option<&str>) -> Option<i32> {
    let entry = find_entry(store, code, name)?;
    year_from_hints(&entry.hint_texts())
}
