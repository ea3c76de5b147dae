//! Extension classification.
//!
//! Maps a file's extension to the category directory it is filed under.

use std::collections::BTreeMap;

use crate::config::FilesConfig;

/// Extension-to-category table.
///
/// The table keys are the upload allow-list. Classification is only
/// meaningful for names that passed [`Classifier::is_allowed`].
#[derive(Debug, Clone)]
pub struct Classifier {
    table: BTreeMap<String, String>,
    fallback: String,
}

impl Classifier {
    /// Create a classifier from an extension table and a fallback category.
    ///
    /// Keys are lower-cased so lookups stay case-insensitive.
    pub fn new(table: BTreeMap<String, String>, fallback: impl Into<String>) -> Self {
        let table = table
            .into_iter()
            .map(|(ext, category)| (ext.to_lowercase(), category))
            .collect();
        Self {
            table,
            fallback: fallback.into(),
        }
    }

    /// Build the classifier described by the files configuration.
    pub fn from_config(config: &FilesConfig) -> Self {
        Self::new(config.extensions.clone(), config.fallback_category.clone())
    }

    /// Lower-cased text after the last '.' of `filename`.
    ///
    /// Returns `None` for names without a dot, names ending in a dot and
    /// dot-files such as `.bashrc`.
    pub fn extension_of(filename: &str) -> Option<String> {
        let (stem, ext) = filename.rsplit_once('.')?;
        if ext.is_empty() || stem.is_empty() {
            return None;
        }
        Some(ext.to_lowercase())
    }

    /// Whether `filename` carries an allow-listed extension.
    pub fn is_allowed(&self, filename: &str) -> bool {
        Self::extension_of(filename).is_some_and(|ext| self.table.contains_key(&ext))
    }

    /// Category path for `filename`.
    ///
    /// Extensions without a table entry land in the fallback category.
    pub fn classify(&self, filename: &str) -> &str {
        Self::extension_of(filename)
            .and_then(|ext| self.table.get(&ext))
            .map(String::as_str)
            .unwrap_or(&self.fallback)
    }

    /// The fallback category.
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Allow-listed extensions, sorted.
    pub fn extensions(&self) -> Vec<&str> {
        self.table.keys().map(String::as_str).collect()
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::from_config(&FilesConfig::default())
    }
}
