//! Corpus loading and domain subsets.
//!
//! A corpus is the fixed list of label rows that queries are matched
//! against. Rows are identified by their position after loading. A subset
//! remembers that position for each row it keeps, while the embedding
//! cache stores one vector per subset position.

use crate::config::DataConfig;
use crate::error::{SearchError, SearchResult};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

/// One searchable entry: a label and its domain tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorpusRow {
    pub label: String,
    pub domain: String,
}

impl CorpusRow {
    pub fn new(label: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            domain: domain.into(),
        }
    }
}

/// Domains removed from a corpus before it is embedded.
///
/// Stored sorted and de-duplicated so equal subsets always produce the
/// same cache key. The empty set keeps every domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DomainSubset {
    excluded: BTreeSet<String>,
}

impl DomainSubset {
    /// Keep every domain.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Drop rows whose domain is in `domains`. Blank names are ignored.
    pub fn excluding<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            excluded: domains
                .into_iter()
                .map(|d| d.as_ref().trim().to_string())
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    #[must_use]
    pub fn is_all(&self) -> bool {
        self.excluded.is_empty()
    }

    /// Excluded domains in sorted order.
    pub fn excluded(&self) -> impl Iterator<Item = &str> {
        self.excluded.iter().map(String::as_str)
    }

    #[must_use]
    pub fn includes(&self, domain: &str) -> bool {
        !self.excluded.contains(domain)
    }
}

/// The loaded catalog of labels.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    rows: Vec<CorpusRow>,
    /// Index of each row in the corpus as loaded, before any subset
    origins: Vec<usize>,
}

impl Corpus {
    /// Build a corpus from rows already in memory.
    ///
    /// Rows with a blank label are dropped, as when loading from CSV.
    pub fn from_rows(rows: impl IntoIterator<Item = CorpusRow>) -> Self {
        let rows: Vec<CorpusRow> = rows
            .into_iter()
            .filter(|row| !row.label.trim().is_empty())
            .collect();
        Self::loaded(rows)
    }

    fn loaded(rows: Vec<CorpusRow>) -> Self {
        let origins = (0..rows.len()).collect();
        Self { rows, origins }
    }

    /// Load a corpus from a CSV file using the configured column names.
    pub fn from_csv(path: &Path, columns: &DataConfig) -> SearchResult<Self> {
        if !path.is_file() {
            return Err(SearchError::DataNotFound {
                path: path.to_path_buf(),
            });
        }

        let file = std::fs::File::open(path).map_err(|e| SearchError::CsvRead {
            path: path.to_path_buf(),
            source: e.into(),
        })?;

        let corpus =
            Self::from_reader(file, &columns.label_column, &columns.domain_column, path)?;

        tracing::info!(
            "loaded {} corpus rows from {}",
            corpus.len(),
            path.display()
        );
        Ok(corpus)
    }

    /// Parse CSV data from any reader. `path` is only used in error messages.
    pub fn from_reader<R: Read>(
        reader: R,
        label_column: &str,
        domain_column: &str,
        path: &Path,
    ) -> SearchResult<Self> {
        let csv_error = |source: csv::Error| SearchError::CsvRead {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = reader.headers().map_err(csv_error)?.clone();
        let find_column = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| SearchError::MissingColumn {
                    path: path.to_path_buf(),
                    column: name.to_string(),
                    available: headers.iter().collect::<Vec<_>>().join(", "),
                })
        };
        let label_idx = find_column(label_column)?;
        let domain_idx = find_column(domain_column)?;

        let mut rows = Vec::new();
        let mut dropped = 0usize;
        for record in reader.records() {
            let record = record.map_err(csv_error)?;
            let label = record.get(label_idx).unwrap_or_default();
            if label.trim().is_empty() {
                dropped += 1;
                continue;
            }
            let domain = record.get(domain_idx).unwrap_or_default().trim();
            rows.push(CorpusRow::new(label, domain));
        }

        if dropped > 0 {
            tracing::debug!("dropped {dropped} rows with an empty '{label_column}' value");
        }

        Ok(Self::loaded(rows))
    }

    /// Rows whose domain survives `subset`, in original order.
    ///
    /// Kept rows retain their index in the loaded corpus, see [`Corpus::origin`].
    #[must_use]
    pub fn subset(&self, subset: &DomainSubset) -> Corpus {
        if subset.is_all() {
            return self.clone();
        }
        let (rows, origins) = self
            .rows
            .iter()
            .zip(&self.origins)
            .filter(|(row, _)| subset.includes(&row.domain))
            .map(|(row, &origin)| (row.clone(), origin))
            .unzip();
        Corpus { rows, origins }
    }

    /// Index in the loaded corpus of the row at `index` in this one.
    #[must_use]
    pub fn origin(&self, index: usize) -> Option<usize> {
        self.origins.get(index).copied()
    }

    /// Distinct non-empty domains in first-seen order.
    #[must_use]
    pub fn domains(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.rows
            .iter()
            .map(|row| row.domain.as_str())
            .filter(|domain| !domain.is_empty() && seen.insert(*domain))
            .collect()
    }

    /// SHA-256 over the labels in order, hex encoded.
    ///
    /// Stored with the embedding cache to detect a corpus edited in place.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for row in &self.rows {
            hasher.update(row.label.as_bytes());
            hasher.update(b"\n");
        }
        let result = hasher.finalize();
        format!("{result:x}")
    }

    /// Labels in row order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row.label.as_str())
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&CorpusRow> {
        self.rows.get(index)
    }

    #[must_use]
    pub fn rows(&self) -> &[CorpusRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
