//! Ranking queries against an embedded corpus.

use crate::corpus::Corpus;
use crate::error::{SearchError, SearchResult};
use crate::vector::{EmbeddingGenerator, EmbeddingMatrix, dot, normalize};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

/// A corpus row that scored above the cutoff.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    /// Index of the row in the corpus as loaded, before any domain subset
    pub row: usize,
    pub label: String,
    pub domain: String,
    /// Cosine similarity to the query
    pub score: f32,
}

/// Per-query ranking options.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Rows must score strictly above this value
    pub cutoff: f32,
    /// Only rows in these domains are scored. `None` scores every row.
    pub domains: Option<BTreeSet<String>>,
    /// Maximum number of hits, unlimited when `None`
    pub limit: Option<usize>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            cutoff: super::thresholds::DEFAULT,
            domains: None,
            limit: None,
        }
    }
}

impl SearchOptions {
    #[must_use]
    pub fn with_cutoff(mut self, cutoff: f32) -> Self {
        self.cutoff = cutoff;
        self
    }

    /// Restrict scoring to `domains`. An empty list leaves every domain allowed.
    #[must_use]
    pub fn with_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let domains: BTreeSet<String> = domains.into_iter().map(Into::into).collect();
        self.domains = (!domains.is_empty()).then_some(domains);
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    fn allows(&self, domain: &str) -> bool {
        self.domains
            .as_ref()
            .is_none_or(|domains| domains.contains(domain))
    }
}

/// Semantic search over a corpus and its aligned embedding matrix.
pub struct LabelSearch {
    corpus: Corpus,
    embeddings: EmbeddingMatrix,
    generator: Arc<dyn EmbeddingGenerator>,
}

impl std::fmt::Debug for LabelSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelSearch")
            .field("rows", &self.corpus.len())
            .field("dimension", &self.embeddings.dimension())
            .field("model", &self.generator.model_name())
            .finish()
    }
}

impl LabelSearch {
    /// Pair a corpus with its embeddings.
    ///
    /// Row `i` of `embeddings` must be the embedding of row `i` of `corpus`.
    pub fn new(
        corpus: Corpus,
        embeddings: EmbeddingMatrix,
        generator: Arc<dyn EmbeddingGenerator>,
    ) -> SearchResult<Self> {
        if embeddings.len() != corpus.len() {
            return Err(SearchError::MisalignedEmbeddings {
                embedding_rows: embeddings.len(),
                corpus_rows: corpus.len(),
            });
        }
        if embeddings.dimension() != generator.dimension() {
            return Err(crate::vector::VectorError::DimensionMismatch {
                expected: embeddings.dimension().get(),
                actual: generator.dimension().get(),
            }
            .into());
        }
        Ok(Self {
            corpus,
            embeddings,
            generator,
        })
    }

    /// Embed `query` and return matching rows, best first.
    ///
    /// A blank query returns no hits without calling the model.
    pub fn search(&self, query: &str, options: &SearchOptions) -> SearchResult<Vec<SearchHit>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut embeddings = self.generator.generate_embeddings(&[query])?;
        let query_vec = embeddings
            .pop()
            .ok_or_else(|| SearchError::MisalignedEmbeddings {
                embedding_rows: 0,
                corpus_rows: 1,
            })?;

        self.rank(query_vec, options)
    }

    /// Score a precomputed query embedding against the corpus.
    pub fn rank(&self, mut query: Vec<f32>, options: &SearchOptions) -> SearchResult<Vec<SearchHit>> {
        self.embeddings.dimension().validate_vector(&query)?;
        normalize(&mut query);

        let mut scored: Vec<(usize, f32)> = self
            .corpus
            .rows()
            .iter()
            .zip(self.embeddings.rows())
            .enumerate()
            .filter(|(_, (row, _))| options.allows(&row.domain))
            .map(|(index, (_, embedding))| (index, dot(&query, embedding)))
            .filter(|&(_, score)| score > options.cutoff)
            .collect();

        // Equal scores keep corpus order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        if let Some(limit) = options.limit {
            scored.truncate(limit);
        }

        tracing::debug!(
            "ranked {} rows, {} above cutoff {}",
            self.corpus.len(),
            scored.len(),
            options.cutoff
        );

        Ok(scored
            .into_iter()
            .map(|(index, score)| {
                let row = &self.corpus.rows()[index];
                SearchHit {
                    row: self.corpus.origin(index).unwrap_or(index),
                    label: row.label.clone(),
                    domain: row.domain.clone(),
                    score,
                }
            })
            .collect())
    }

    #[must_use]
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    #[must_use]
    pub fn embeddings(&self) -> &EmbeddingMatrix {
        &self.embeddings
    }

    #[must_use]
    pub fn model_name(&self) -> &str {
        self.generator.model_name()
    }
}
