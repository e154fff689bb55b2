//! Embedding generation for corpus labels and queries.
//!
//! The [`EmbeddingGenerator`] trait is the seam between the ranking pipeline
//! and the model. [`FastEmbedGenerator`] is the production implementation;
//! tests plug in deterministic generators.

use crate::error::SearchError;
use crate::vector::{VectorDimension, VectorError};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;

/// Trait for generating embeddings from text.
pub trait EmbeddingGenerator: Send + Sync {
    /// Generate embeddings for multiple texts.
    ///
    /// # Returns
    /// One embedding per input text, in input order.
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError>;

    /// Get the dimension of embeddings produced by this generator.
    #[must_use]
    fn dimension(&self) -> VectorDimension;

    /// Name used in cache keys and metadata.
    fn model_name(&self) -> &str;
}

/// Embedding models this tool knows how to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SupportedModel {
    #[default]
    AllMiniLmL6V2,
    AllMiniLmL12V2,
    BgeSmallEnV15,
    BgeBaseEnV15,
    ParaphraseMultilingualMiniLmL12V2,
    MultilingualE5Small,
}

impl SupportedModel {
    pub const ALL: [SupportedModel; 6] = [
        SupportedModel::AllMiniLmL6V2,
        SupportedModel::AllMiniLmL12V2,
        SupportedModel::BgeSmallEnV15,
        SupportedModel::BgeBaseEnV15,
        SupportedModel::ParaphraseMultilingualMiniLmL12V2,
        SupportedModel::MultilingualE5Small,
    ];

    /// Canonical model name, as written in settings and cache metadata.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AllMiniLmL6V2 => "all-MiniLM-L6-v2",
            Self::AllMiniLmL12V2 => "all-MiniLM-L12-v2",
            Self::BgeSmallEnV15 => "bge-small-en-v1.5",
            Self::BgeBaseEnV15 => "bge-base-en-v1.5",
            Self::ParaphraseMultilingualMiniLmL12V2 => "paraphrase-multilingual-MiniLM-L12-v2",
            Self::MultilingualE5Small => "multilingual-e5-small",
        }
    }

    /// Comma separated list of every canonical name.
    #[must_use]
    pub fn supported_names() -> String {
        Self::ALL
            .iter()
            .map(SupportedModel::name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn fastembed_model(&self) -> EmbeddingModel {
        match self {
            Self::AllMiniLmL6V2 => EmbeddingModel::AllMiniLML6V2,
            Self::AllMiniLmL12V2 => EmbeddingModel::AllMiniLML12V2,
            Self::BgeSmallEnV15 => EmbeddingModel::BGESmallENV15,
            Self::BgeBaseEnV15 => EmbeddingModel::BGEBaseENV15,
            Self::ParaphraseMultilingualMiniLmL12V2 => EmbeddingModel::ParaphraseMLMiniLML12V2,
            Self::MultilingualE5Small => EmbeddingModel::MultilingualE5Small,
        }
    }
}

impl fmt::Display for SupportedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SupportedModel {
    type Err = SearchError;

    /// Accepts canonical names case-insensitively, with an optional
    /// `sentence-transformers/` or `BAAI/` prefix, and fastembed's variant
    /// spelling (e.g. `AllMiniLML6V2`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let bare = trimmed
            .rsplit_once('/')
            .map_or(trimmed, |(_, name)| name)
            .to_ascii_lowercase();
        let squashed: String = bare.chars().filter(|c| c.is_ascii_alphanumeric()).collect();

        Self::ALL
            .into_iter()
            .find(|model| {
                let canonical = model.name().to_ascii_lowercase();
                let canonical_squashed: String = canonical
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .collect();
                bare == canonical
                    || squashed == canonical_squashed
                    || squashed == format!("{:?}", model.fastembed_model()).to_ascii_lowercase()
            })
            .ok_or_else(|| SearchError::UnsupportedModel {
                model: trimmed.to_string(),
                supported: Self::supported_names(),
            })
    }
}

/// FastEmbed-backed generator.
///
/// Output rows are L2-normalized before they are returned so cosine
/// similarity reduces to a dot product.
pub struct FastEmbedGenerator {
    model: Mutex<TextEmbedding>,
    dimension: VectorDimension,
    kind: SupportedModel,
    batch_size: Option<usize>,
}

impl fmt::Debug for FastEmbedGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FastEmbedGenerator")
            .field("model", &self.kind.name())
            .field("dimension", &self.dimension)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl FastEmbedGenerator {
    /// Load `kind`, downloading weights into `cache_dir` on first use.
    ///
    /// # Errors
    /// Returns an error if the model fails to initialize or download.
    pub fn new(
        kind: SupportedModel,
        cache_dir: PathBuf,
        show_download_progress: bool,
    ) -> Result<Self, SearchError> {
        let has_cached_models = cache_dir.exists()
            && cache_dir
                .read_dir()
                .is_ok_and(|mut entries| entries.any(|_| true));
        if has_cached_models {
            tracing::debug!("loading embedding model {kind} from {}", cache_dir.display());
        } else {
            tracing::info!("downloading embedding model {kind} (first time only)");
        }

        let mut model = TextEmbedding::try_new(
            InitOptions::new(kind.fastembed_model())
                .with_cache_dir(cache_dir)
                .with_show_download_progress(show_download_progress),
        )
        .map_err(|e| SearchError::ModelInit {
            model: kind.name().to_string(),
            reason: e.to_string(),
        })?;

        // Probe the output width
        let probe = model
            .embed(vec!["test"], None)
            .map_err(|e| SearchError::ModelInit {
                model: kind.name().to_string(),
                reason: format!("probe embedding failed: {e}"),
            })?;
        let width = probe.into_iter().next().map_or(0, |v| v.len());
        let dimension = VectorDimension::new(width)?;

        Ok(Self {
            model: Mutex::new(model),
            dimension,
            kind,
            batch_size: None,
        })
    }

    /// Set the batch size passed to the model.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = (batch_size > 0).then_some(batch_size);
        self
    }
}

impl EmbeddingGenerator for FastEmbedGenerator {
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let text_strings: Vec<String> = texts.iter().map(|&s| s.to_string()).collect();

        let mut embeddings = self
            .model
            .lock()
            .map_err(|_| {
                VectorError::EmbeddingFailed(
                    "Failed to acquire embedding model lock - model may be poisoned".to_string(),
                )
            })?
            .embed(text_strings, self.batch_size)
            .map_err(|e| {
                VectorError::EmbeddingFailed(format!("Failed to generate embeddings: {e}"))
            })?;

        for embedding in embeddings.iter_mut() {
            self.dimension.validate_vector(embedding)?;
            crate::vector::normalize(embedding);
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    fn model_name(&self) -> &str {
        self.kind.name()
    }
}

/// Mock embedding generator for unit tests.
///
/// Each dimension is tied to a keyword; a text's vector counts keyword hits
/// plus a small constant so no vector is zero. Calls are counted and the
/// last batch of texts is kept.
#[cfg(test)]
pub struct MockEmbeddingGenerator {
    keywords: Vec<&'static str>,
    calls: std::sync::atomic::AtomicUsize,
    last_texts: Mutex<Vec<String>>,
}

#[cfg(test)]
impl MockEmbeddingGenerator {
    #[must_use]
    pub fn new(keywords: &[&'static str]) -> Self {
        Self {
            keywords: keywords.to_vec(),
            calls: std::sync::atomic::AtomicUsize::new(0),
            last_texts: Mutex::new(Vec::new()),
        }
    }

    /// Number of `generate_embeddings` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Texts passed to the most recent `generate_embeddings` call.
    pub fn last_texts(&self) -> Vec<String> {
        self.last_texts.lock().expect("mock lock poisoned").clone()
    }
}

#[cfg(test)]
impl EmbeddingGenerator for MockEmbeddingGenerator {
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        *self.last_texts.lock().expect("mock lock poisoned") =
            texts.iter().map(|text| (*text).to_string()).collect();
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                let mut embedding: Vec<f32> = self
                    .keywords
                    .iter()
                    .map(|kw| if lower.contains(kw) { 1.0 } else { 0.05 })
                    .collect();
                crate::vector::normalize(&mut embedding);
                embedding
            })
            .collect())
    }

    fn dimension(&self) -> VectorDimension {
        VectorDimension::new(self.keywords.len()).expect("mock needs at least one keyword")
    }

    fn model_name(&self) -> &str {
        "mock-keywords"
    }
}
