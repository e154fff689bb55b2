//! Semantic search over the label corpus.
//!
//! [`EmbeddingCache`] produces one normalized embedding per corpus row and
//! persists it per (model, domain subset). [`LabelSearch`] ranks a query
//! against those rows by cosine similarity.

mod cache;
mod metadata;
mod search;

pub use cache::{CacheKey, CacheSource, CachedEmbeddings, EmbeddingCache};
pub use metadata::CacheMetadata;
pub use search::{LabelSearch, SearchHit, SearchOptions};

/// Similarity threshold recommendations based on testing
pub mod thresholds {
    /// Threshold for very similar labels (e.g., same concept, different wording)
    pub const VERY_SIMILAR: f32 = 0.75;

    /// Threshold for similar labels (e.g., related concepts)
    pub const SIMILAR: f32 = 0.60;

    /// Threshold for somewhat related labels
    pub const RELATED: f32 = 0.40;

    /// Threshold that still admits loosely related labels
    pub const LOOSE: f32 = 0.20;

    /// Default cutoff for label search
    pub const DEFAULT: f32 = LOOSE;
}
