use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Ordered keyword dictionary used as a best-effort category default when a
/// statement has no explicit category column: the first entry with a term
/// appearing in the lower-cased description wins. A hit is a heuristic, not
/// a rule result — it carries no provenance until a rule or human confirms.
#[derive(Debug, Clone, Default)]
pub struct KeywordSuggester {
    entries: Vec<KeywordEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeywordEntry {
    /// Category id the terms map to.
    pub category: String,
    pub terms: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct KeywordFile {
    #[serde(default)]
    keyword: Vec<KeywordEntry>,
}

#[derive(Debug, Error)]
pub enum KeywordLoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse keyword TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

impl KeywordSuggester {
    pub fn new(entries: Vec<KeywordEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|mut e| {
                e.terms = e.terms.iter().map(|t| t.to_lowercase()).collect();
                e
            })
            .collect();
        KeywordSuggester { entries }
    }

    /// Parse a dictionary from TOML:
    ///
    /// ```toml
    /// [[keyword]]
    /// category = "groceries"
    /// terms = ["grocery", "walmart", "supermarket"]
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, KeywordLoadError> {
        let file: KeywordFile = toml::from_str(content)?;
        Ok(Self::new(file.keyword))
    }

    pub fn from_file(path: &Path) -> Result<Self, KeywordLoadError> {
        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    /// First entry whose term is a substring of the description, if any.
    pub fn suggest(&self, description: &str) -> Option<&str> {
        let haystack = description.to_lowercase();
        self.entries
            .iter()
            .find(|e| e.terms.iter().any(|t| !t.is_empty() && haystack.contains(t.as_str())))
            .map(|e| e.category.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
