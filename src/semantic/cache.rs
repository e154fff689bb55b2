//! On-disk cache of corpus embeddings.
//!
//! Each cache entry is a pair of files in the cache directory:
//! `<stem>.vec` holds the normalized f32 rows and `<stem>.json` holds
//! [`CacheMetadata`]. The stem comes from a [`CacheKey`].

use crate::corpus::{Corpus, DomainSubset};
use crate::error::{SearchError, SearchResult};
use crate::semantic::CacheMetadata;
use crate::vector::{EmbeddingGenerator, EmbeddingMatrix, MmapVectorStorage, normalize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Longest readable domain list kept in a file stem before it is cut.
const MAX_STEM_SLUG: usize = 32;

/// Identifies one cached embedding matrix: the model plus the domain subset
/// of the corpus that was embedded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    model: String,
    subset: DomainSubset,
}

impl CacheKey {
    pub fn new(model: impl Into<String>, subset: DomainSubset) -> Self {
        Self {
            model: model.into(),
            subset,
        }
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn subset(&self) -> &DomainSubset {
        &self.subset
    }

    /// Deterministic file stem, e.g. `all-MiniLM-L6-v2__all` or
    /// `all-MiniLM-L6-v2__excl-imaging-3f9a1c2e`.
    ///
    /// The hash suffix covers the full excluded list, so truncating the
    /// readable part never makes two keys collide.
    #[must_use]
    pub fn file_stem(&self) -> String {
        let model = slug(&self.model);
        if self.subset.is_all() {
            return format!("{model}__all");
        }

        let excluded: Vec<&str> = self.subset.excluded().collect();
        let mut readable = slug(&excluded.join("+"));
        readable.truncate(MAX_STEM_SLUG);

        let mut hasher = Sha256::new();
        hasher.update(excluded.join("\n").as_bytes());
        let digest = format!("{:x}", hasher.finalize());

        format!("{model}__excl-{readable}-{}", &digest[..8])
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.file_stem())
    }
}

fn slug(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '+') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Whether [`EmbeddingCache::load_or_build`] hit the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
    Loaded,
    Built,
}

/// Result of resolving a cache entry.
#[derive(Debug)]
pub struct CachedEmbeddings {
    pub matrix: EmbeddingMatrix,
    pub metadata: CacheMetadata,
    pub source: CacheSource,
}

/// Manages cached embedding matrices under one directory.
#[derive(Debug, Clone)]
pub struct EmbeddingCache {
    dir: PathBuf,
    batch_size: usize,
}

impl EmbeddingCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            batch_size: 256,
        }
    }

    /// Number of labels sent to the generator per call when building.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn vector_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.vec", key.file_stem()))
    }

    #[must_use]
    pub fn metadata_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.file_stem()))
    }

    /// True when both files for `key` are present.
    #[must_use]
    pub fn exists(&self, key: &CacheKey) -> bool {
        self.vector_path(key).is_file() && self.metadata_path(key).is_file()
    }

    /// Load the matrix for `key` if cached, otherwise embed `corpus` and
    /// persist the result.
    ///
    /// `corpus` must already be restricted to `key.subset()`.
    pub fn load_or_build(
        &self,
        key: &CacheKey,
        corpus: &Corpus,
        generator: &dyn EmbeddingGenerator,
    ) -> SearchResult<CachedEmbeddings> {
        self.load_or_build_with_progress(key, corpus, generator, &mut |_, _| {})
    }

    /// Like [`load_or_build`](Self::load_or_build), reporting
    /// `(rows_done, rows_total)` after every batch of a build.
    pub fn load_or_build_with_progress(
        &self,
        key: &CacheKey,
        corpus: &Corpus,
        generator: &dyn EmbeddingGenerator,
        on_batch: &mut dyn FnMut(usize, usize),
    ) -> SearchResult<CachedEmbeddings> {
        ensure_model_matches(key, generator)?;

        if self.exists(key) {
            let (matrix, metadata) = self.load(key, corpus)?;
            tracing::debug!(
                "embedding cache hit for {key}: {} rows, dimension {}",
                matrix.len(),
                matrix.dimension()
            );
            return Ok(CachedEmbeddings {
                matrix,
                metadata,
                source: CacheSource::Loaded,
            });
        }

        let (matrix, metadata) = self.build(key, corpus, generator, on_batch)?;
        Ok(CachedEmbeddings {
            matrix,
            metadata,
            source: CacheSource::Built,
        })
    }

    /// Read and validate the cache entry for `key` against `corpus`.
    ///
    /// Fails with [`SearchError::CacheMismatch`] when row counts differ and
    /// [`SearchError::CacheStale`] when the labels changed.
    pub fn load(
        &self,
        key: &CacheKey,
        corpus: &Corpus,
    ) -> SearchResult<(EmbeddingMatrix, CacheMetadata)> {
        let vector_path = self.vector_path(key);
        let metadata = CacheMetadata::load(&self.metadata_path(key))?;

        if metadata.model_name != key.model() {
            return Err(SearchError::Storage {
                message: format!(
                    "Cache '{}' was built with model '{}', expected '{}'",
                    vector_path.display(),
                    metadata.model_name,
                    key.model()
                ),
                suggestion: "Run 'labelseek index --force' to rebuild the embedding cache"
                    .to_string(),
            });
        }

        let mut storage = MmapVectorStorage::open(&vector_path)?;

        if storage.dimension().get() != metadata.dimension {
            return Err(SearchError::Storage {
                message: format!(
                    "Cache dimension {} does not match metadata dimension {}",
                    storage.dimension(),
                    metadata.dimension
                ),
                suggestion: "The cache may be corrupted. Run 'labelseek index --force'"
                    .to_string(),
            });
        }

        if storage.row_count() != corpus.len() {
            return Err(SearchError::CacheMismatch {
                path: vector_path,
                cache_rows: storage.row_count(),
                corpus_rows: corpus.len(),
            });
        }

        if metadata.corpus_fingerprint != corpus.fingerprint() {
            return Err(SearchError::CacheStale { path: vector_path });
        }

        let matrix = storage.read_matrix()?;
        Ok((matrix, metadata))
    }

    /// Embed every label of `corpus`, normalize the rows and write them
    /// under `key`, replacing any existing entry.
    pub fn build(
        &self,
        key: &CacheKey,
        corpus: &Corpus,
        generator: &dyn EmbeddingGenerator,
        on_batch: &mut dyn FnMut(usize, usize),
    ) -> SearchResult<(EmbeddingMatrix, CacheMetadata)> {
        ensure_model_matches(key, generator)?;

        let dimension = generator.dimension();
        let labels: Vec<&str> = corpus.labels().collect();
        let mut matrix = EmbeddingMatrix::with_capacity(dimension, labels.len());

        tracing::info!(
            "embedding {} labels with {} for cache {key}",
            labels.len(),
            key.model()
        );

        for batch in labels.chunks(self.batch_size) {
            let embeddings = generator.generate_embeddings(batch)?;
            if embeddings.len() != batch.len() {
                return Err(SearchError::MisalignedEmbeddings {
                    embedding_rows: matrix.len() + embeddings.len(),
                    corpus_rows: matrix.len() + batch.len(),
                });
            }
            for mut embedding in embeddings {
                normalize(&mut embedding);
                matrix.push_row(&embedding)?;
            }
            on_batch(matrix.len(), labels.len());
        }

        let metadata = CacheMetadata::new(
            key.model(),
            dimension.get(),
            matrix.len(),
            key.subset().excluded().map(str::to_string).collect(),
            corpus.fingerprint(),
        );

        std::fs::create_dir_all(&self.dir).map_err(|e| SearchError::FileWrite {
            path: self.dir.clone(),
            source: e,
        })?;
        MmapVectorStorage::create(self.vector_path(key), &matrix)?;
        metadata.save(&self.metadata_path(key))?;

        tracing::info!(
            "wrote embedding cache {}",
            self.vector_path(key).display()
        );
        Ok((matrix, metadata))
    }

    /// Drop any cached entry for `key` and embed `corpus` again.
    pub fn rebuild(
        &self,
        key: &CacheKey,
        corpus: &Corpus,
        generator: &dyn EmbeddingGenerator,
        on_batch: &mut dyn FnMut(usize, usize),
    ) -> SearchResult<(EmbeddingMatrix, CacheMetadata)> {
        ensure_model_matches(key, generator)?;
        if self.clear(key)? {
            tracing::debug!("cleared embedding cache {key}");
        }
        self.build(key, corpus, generator, on_batch)
    }

    /// Remove the files for `key`. Returns whether anything was deleted.
    pub fn clear(&self, key: &CacheKey) -> SearchResult<bool> {
        let mut removed = false;
        for path in [self.vector_path(key), self.metadata_path(key)] {
            match std::fs::remove_file(&path) {
                Ok(()) => removed = true,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(SearchError::FileWrite { path, source: e }),
            }
        }
        Ok(removed)
    }
}

fn ensure_model_matches(key: &CacheKey, generator: &dyn EmbeddingGenerator) -> SearchResult<()> {
    if key.model() != generator.model_name() {
        return Err(SearchError::ConfigError {
            reason: format!(
                "cache key is for model '{}' but the generator is '{}'",
                key.model(),
                generator.model_name()
            ),
        });
    }
    Ok(())
}
