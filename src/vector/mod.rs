//! Embedding vectors: generation, persistence, and similarity.
//!
//! Corpus embeddings live in a dense row-major [`EmbeddingMatrix`] whose
//! rows line up with corpus rows. The matrix is persisted as a flat f32
//! file through [`MmapVectorStorage`].

mod embedding;
mod similarity;
mod storage;
mod types;

#[cfg(test)]
pub use embedding::MockEmbeddingGenerator;
pub use embedding::{EmbeddingGenerator, FastEmbedGenerator, SupportedModel};
pub use similarity::{dot, normalize};
pub use storage::{MmapVectorStorage, VectorStorageError};
pub use types::{EmbeddingMatrix, VectorDimension, VectorError};
