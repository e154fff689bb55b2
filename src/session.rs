//! Wires settings, corpus, cache and model into a ready [`LabelSearch`].

use crate::config::Settings;
use crate::corpus::{Corpus, DomainSubset};
use crate::error::SearchResult;
use crate::semantic::{CacheKey, CacheMetadata, CacheSource, EmbeddingCache, LabelSearch};
use crate::vector::{EmbeddingGenerator, FastEmbedGenerator, SupportedModel};
use std::path::PathBuf;
use std::sync::Arc;

/// How the embedding cache should be resolved when opening a session.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Domains left out of the embedded corpus
    pub subset: DomainSubset,
    /// Recompute embeddings even when a cache entry exists
    pub force_rebuild: bool,
}

impl SessionOptions {
    /// Options taken from `[semantic_search]` in the settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            subset: DomainSubset::excluding(&settings.semantic_search.exclude_domains),
            force_rebuild: false,
        }
    }
}

/// A searchable corpus plus where its embeddings came from.
#[derive(Debug)]
pub struct SearchSession {
    pub search: LabelSearch,
    pub metadata: CacheMetadata,
    pub source: CacheSource,
    pub cache_path: PathBuf,
}

/// Parse the configured model name.
pub fn configured_model(settings: &Settings) -> SearchResult<SupportedModel> {
    settings.semantic_search.model.parse()
}

/// Load the fastembed model named in the settings.
pub fn load_generator(
    settings: &Settings,
    show_download_progress: bool,
) -> SearchResult<FastEmbedGenerator> {
    let model = configured_model(settings)?;
    Ok(
        FastEmbedGenerator::new(model, settings.models_dir(), show_download_progress)?
            .with_batch_size(settings.semantic_search.batch_size),
    )
}

/// Read the corpus CSV configured in `[data]`.
pub fn load_corpus(settings: &Settings) -> SearchResult<Corpus> {
    Corpus::from_csv(&settings.csv_path(), &settings.data)
}

/// The cache directory configured in `[cache]`.
pub fn cache_for(settings: &Settings) -> EmbeddingCache {
    EmbeddingCache::new(settings.cache_dir()).with_batch_size(settings.semantic_search.batch_size)
}

/// Restrict `corpus` to the subset, load or build its embeddings, and
/// return a search over the result.
///
/// `on_batch` receives `(rows_done, rows_total)` while embeddings are built.
pub fn open_session(
    cache: &EmbeddingCache,
    corpus: &Corpus,
    generator: Arc<dyn EmbeddingGenerator>,
    options: &SessionOptions,
    on_batch: &mut dyn FnMut(usize, usize),
) -> SearchResult<SearchSession> {
    let key = CacheKey::new(generator.model_name(), options.subset.clone());
    let corpus = corpus.subset(&options.subset);

    let (matrix, metadata, source) = if options.force_rebuild {
        let (matrix, metadata) = cache.rebuild(&key, &corpus, &*generator, on_batch)?;
        (matrix, metadata, CacheSource::Built)
    } else {
        let cached =
            cache.load_or_build_with_progress(&key, &corpus, &*generator, on_batch)?;
        (cached.matrix, cached.metadata, cached.source)
    };

    if corpus.is_empty() {
        tracing::warn!("corpus has no rows after excluding {:?}", key.subset());
    }

    Ok(SearchSession {
        search: LabelSearch::new(corpus, matrix, generator)?,
        metadata,
        source,
        cache_path: cache.vector_path(&key),
    })
}
