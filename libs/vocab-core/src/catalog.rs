//! Word catalog loading.
//!
//! # Format
//! One JSON file per category:
//! ```json
//! {
//!   "category": "travel",
//!   "version": 1,
//!   "lastUpdated": "2025-01-01",
//!   "words": [
//!     {
//!       "id": "travel_001",
//!       "word": "airport",
//!       "translations": { "tr": "havalimanı", "de": "Flughafen" },
//!       "levels": ["beginner"],
//!       "category": "travel",
//!       "pronunciation": "/ˈeə.pɔːt/",
//!       "exampleSentence": { "en": "The airport is busy.", "tr": "Havalimanı kalabalık." }
//!     }
//!   ]
//! }
//! ```
//! `word` is the English surface form; every other language comes from
//! `translations`.

use crate::error::{CatalogError, CatalogResult};
use crate::types::{Word, WordLevel};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

const BASE_LANGUAGE: &str = "en";

/// Source of words for a session.
pub trait WordCatalog {
    /// Words of `category` offered for the language pair, in catalog order.
    fn words(
        &self,
        category: &str,
        learning_language: &str,
        native_language: &str,
        level: Option<WordLevel>,
    ) -> Vec<Word>;
}

/// A word as stored in a catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogWord {
    pub id: String,
    pub word: String,
    #[serde(default)]
    pub translations: HashMap<String, String>,
    #[serde(default)]
    pub levels: Vec<WordLevel>,
    pub category: String,
    #[serde(default)]
    pub pronunciation: Option<String>,
    #[serde(default)]
    pub example_sentence: HashMap<String, String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CatalogWord {
    /// Text of this word in `language`, if the catalog has it.
    pub fn surface(&self, language: &str) -> Option<&str> {
        let text = if language == BASE_LANGUAGE {
            Some(self.word.as_str())
        } else {
            self.translations.get(language).map(String::as_str)
        };
        text.filter(|t| !t.trim().is_empty())
    }

    /// Project onto a language pair. `None` when either side is missing.
    pub fn for_pair(&self, learning_language: &str, native_language: &str) -> Option<Word> {
        let word = self.surface(learning_language)?;
        let translation = self.surface(native_language)?;
        Some(Word {
            id: self.id.clone(),
            word: word.to_string(),
            translation: translation.to_string(),
            pronunciation: self.pronunciation.clone(),
            example: self.example_sentence.get(learning_language).cloned(),
            example_translation: self.example_sentence.get(native_language).cloned(),
            category: self.category.clone(),
        })
    }
}

/// Contents of one category file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordDataFile {
    pub category: String,
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub last_updated: String,
    pub words: Vec<CatalogWord>,
}

/// Parse a category file, rejecting duplicate IDs.
pub fn parse_word_file(content: &str) -> CatalogResult<WordDataFile> {
    let file: WordDataFile = serde_json::from_str(content)?;

    let mut seen = HashSet::new();
    for word in &file.words {
        if !seen.insert(word.id.as_str()) {
            return Err(CatalogError::DuplicateId {
                id: word.id.clone(),
                category: file.category.clone(),
            });
        }
    }

    Ok(file)
}

/// Filter by level and project onto a language pair.
pub fn words_for_learning(
    words: &[CatalogWord],
    learning_language: &str,
    native_language: &str,
    level: Option<WordLevel>,
) -> Vec<Word> {
    words
        .iter()
        .filter(|w| level.map_or(true, |l| w.levels.contains(&l)))
        .filter_map(|w| w.for_pair(learning_language, native_language))
        .collect()
}

/// In-memory catalog built from category files.
#[derive(Debug, Clone, Default)]
pub struct JsonCatalog {
    categories: HashMap<String, Vec<CatalogWord>>,
}

impl JsonCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.json` file in `dir`. Files that fail to parse are skipped.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> CatalogResult<Self> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|source| CatalogError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut catalog = Self::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to read word file");
                    continue;
                }
            };
            match parse_word_file(&content) {
                Ok(file) => catalog.insert(file),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping invalid word file");
                }
            }
        }

        tracing::info!(categories = catalog.categories.len(), "word catalog loaded");
        Ok(catalog)
    }

    /// Add or replace a category.
    pub fn insert(&mut self, file: WordDataFile) {
        self.categories.insert(file.category, file.words);
    }

    pub fn categories(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.categories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of words stored for a category, regardless of language.
    pub fn category_size(&self, category: &str) -> usize {
        self.categories.get(category).map_or(0, Vec::len)
    }

    /// Case-insensitive search over base words, translations in `language` and tags.
    pub fn search(&self, query: &str, language: &str) -> Vec<&CatalogWord> {
        let needle = query.to_lowercase();
        let mut names: Vec<&String> = self.categories.keys().collect();
        names.sort_unstable();

        names
            .into_iter()
            .flat_map(|name| self.categories[name].iter())
            .filter(|w| {
                w.word.to_lowercase().contains(&needle)
                    || w
                        .translations
                        .get(language)
                        .map_or(false, |t| t.to_lowercase().contains(&needle))
                    || w.tags.iter().any(|t| t.to_lowercase().contains(&needle))
            })
            .collect()
    }
}

impl WordCatalog for JsonCatalog {
    fn words(
        &self,
        category: &str,
        learning_language: &str,
        native_language: &str,
        level: Option<WordLevel>,
    ) -> Vec<Word> {
        match self.categories.get(category) {
            Some(words) => words_for_learning(words, learning_language, native_language, level),
            None => {
                tracing::warn!(category, "no word data for category");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRAVEL: &str = r#"{
        "category": "travel",
        "version": 1,
        "lastUpdated": "2025-01-01",
        "words": [
            {
                "id": "t1",
                "word": "airport",
                "translations": { "tr": "havalimanı", "de": "Flughafen" },
                "levels": ["beginner"],
                "category": "travel",
                "pronunciation": "/ˈeə.pɔːt/",
                "exampleSentence": { "en": "The airport is busy.", "tr": "Havalimanı kalabalık." },
                "tags": ["transport"]
            },
            {
                "id": "t2",
                "word": "ticket",
                "translations": { "tr": "bilet" },
                "levels": ["beginner", "elementary"],
                "category": "travel"
            },
            {
                "id": "t3",
                "word": "customs",
                "translations": { "de": "Zoll", "tr": "" },
                "levels": ["advanced"],
                "category": "travel"
            }
        ]
    }"#;

    fn catalog() -> JsonCatalog {
        let mut catalog = JsonCatalog::new();
        catalog.insert(parse_word_file(TRAVEL).unwrap());
        catalog
    }

    #[test]
    fn projects_english_to_native() {
        let words = catalog().words("travel", "en", "tr", None);
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].word, "airport");
        assert_eq!(words[0].translation, "havalimanı");
        assert_eq!(words[0].example.as_deref(), Some("The airport is busy."));
        assert_eq!(words[0].example_translation.as_deref(), Some("Havalimanı kalabalık."));
    }

    #[test]
    fn projects_between_two_translations() {
        let words = catalog().words("travel", "de", "en", None);
        let surfaces: Vec<_> = words.iter().map(|w| w.word.as_str()).collect();
        assert_eq!(surfaces, vec!["Flughafen", "Zoll"]);
        assert_eq!(words[1].translation, "customs");
    }

    #[test]
    fn skips_words_with_blank_translation() {
        let words = catalog().words("travel", "tr", "en", None);
        assert!(words.iter().all(|w| w.id != "t3"));
    }

    #[test]
    fn filters_by_level() {
        let words = catalog().words("travel", "en", "tr", Some(WordLevel::Elementary));
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].id, "t2");
    }

    #[test]
    fn unknown_category_is_empty() {
        assert!(catalog().words("space", "en", "tr", None).is_empty());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let input = r#"{"category":"food","words":[
            {"id":"f1","word":"bread","category":"food"},
            {"id":"f1","word":"milk","category":"food"}
        ]}"#;
        let result = parse_word_file(input);
        assert!(matches!(result, Err(CatalogError::DuplicateId { ref id, .. }) if id == "f1"));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(parse_word_file("{"), Err(CatalogError::Json(_))));
    }

    #[test]
    fn search_matches_tags_and_translations() {
        let catalog = catalog();
        let by_tag = catalog.search("TRANSPORT", "tr");
        assert_eq!(by_tag.len(), 1);
        let by_translation = catalog.search("bil", "tr");
        assert_eq!(by_translation[0].id, "t2");
    }
}
