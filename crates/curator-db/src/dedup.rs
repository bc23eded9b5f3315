//! In-memory duplicate index over the record store.

use curator_core::{urlnorm, NewRecord};
use std::collections::HashSet;

/// Why a candidate record was classified as a duplicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DupReason {
    /// A normalized URL of the candidate already exists in the store.
    Url(String),
    /// The candidate's file name already exists in the store.
    FileName,
}

/// The set of file names and raw + normalized URLs currently known.
///
/// Rebuilt from the store at the start of every append/import and updated
/// incrementally within the call, so later records in the same call are
/// checked against earlier ones.
#[derive(Debug, Default)]
pub struct DedupIndex {
    file_names: HashSet<String>,
    urls: HashSet<String>,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an existing or just-inserted record.
    pub fn insert(&mut self, file_name: &str, urls: &[String]) {
        self.file_names.insert(file_name.to_string());
        for url in urls {
            let trimmed = url.trim();
            if trimmed.is_empty() {
                continue;
            }
            self.urls.insert(trimmed.to_string());
            self.urls.insert(urlnorm::normalize(trimmed));
        }
    }

    pub fn contains_file(&self, file_name: &str) -> bool {
        self.file_names.contains(file_name)
    }

    /// Classify a candidate. URL identity is checked before file name:
    /// re-deliveries of the same link can arrive under different source
    /// names, so a URL hit wins regardless of the name.
    pub fn duplicate_reason(&self, record: &NewRecord) -> Option<DupReason> {
        for url in record.normalized_urls() {
            if self.urls.contains(&url) {
                return Some(DupReason::Url(url));
            }
        }
        if self.contains_file(&record.source_name) {
            return Some(DupReason::FileName);
        }
        None
    }
}
