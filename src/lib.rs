//! Semantic search over a fixed catalog of labelled rows.

pub mod config;
pub mod corpus;
pub mod display;
pub mod error;
pub mod io;
pub mod logging;
pub mod semantic;
pub mod session;
pub mod vector;

// Explicit exports for better API clarity
pub use config::Settings;
pub use corpus::{Corpus, CorpusRow, DomainSubset};
pub use error::{SearchError, SearchResult};
pub use semantic::{CacheKey, EmbeddingCache, LabelSearch, SearchHit, SearchOptions};
pub use session::{SearchSession, SessionOptions, open_session};
pub use vector::{EmbeddingGenerator, EmbeddingMatrix, SupportedModel, VectorDimension};
