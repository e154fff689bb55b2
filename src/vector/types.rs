//! Type-safe wrappers and core types for the embedding matrix.
//!
//! Vectors are stored row-major in a single flat buffer so the cache file
//! and the in-memory representation share one layout.

use thiserror::Error;

/// Type-safe wrapper for vector dimensions.
///
/// Ensures runtime validation of vector dimensions to prevent
/// mismatches between the model, the cache and the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorDimension(usize);

impl VectorDimension {
    /// Creates a new `VectorDimension` with validation.
    ///
    /// Returns an error if the dimension is zero.
    pub fn new(dim: usize) -> Result<Self, VectorError> {
        if dim == 0 {
            return Err(VectorError::InvalidDimension {
                dimension: 0,
                reason: "Vector dimension cannot be zero",
            });
        }
        Ok(Self(dim))
    }

    /// Returns the underlying dimension value.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }

    /// Validates that a vector has the expected dimension.
    pub fn validate_vector(&self, vector: &[f32]) -> Result<(), VectorError> {
        if vector.len() != self.0 {
            return Err(VectorError::DimensionMismatch {
                expected: self.0,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for VectorDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dense row-major matrix of embeddings, one row per corpus entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatrix {
    dimension: VectorDimension,
    data: Vec<f32>,
}

impl EmbeddingMatrix {
    /// Creates an empty matrix with the given row width.
    #[must_use]
    pub fn new(dimension: VectorDimension) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    /// Creates an empty matrix with room for `rows` rows.
    #[must_use]
    pub fn with_capacity(dimension: VectorDimension, rows: usize) -> Self {
        Self {
            dimension,
            data: Vec::with_capacity(rows * dimension.get()),
        }
    }

    /// Wraps a flat buffer. Fails if its length is not a multiple of the dimension.
    pub fn from_flat(dimension: VectorDimension, data: Vec<f32>) -> Result<Self, VectorError> {
        if data.len() % dimension.get() != 0 {
            return Err(VectorError::DimensionMismatch {
                expected: dimension.get(),
                actual: data.len() % dimension.get(),
            });
        }
        Ok(Self { dimension, data })
    }

    /// Appends one row after validating its width.
    pub fn push_row(&mut self, row: &[f32]) -> Result<(), VectorError> {
        self.dimension.validate_vector(row)?;
        self.data.extend_from_slice(row);
        Ok(())
    }

    /// Returns row `index`, or `None` past the end.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        let dim = self.dimension.get();
        let start = index.checked_mul(dim)?;
        self.data.get(start..start + dim)
    }

    /// Iterates rows in order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[f32]> {
        self.data.chunks_exact(self.dimension.get())
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len() / self.dimension.get()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    /// The underlying flat buffer.
    #[must_use]
    pub fn as_flat(&self) -> &[f32] {
        &self.data
    }
}

/// Errors that can occur during vector operations.
///
/// All error messages include actionable suggestions for resolution.
#[derive(Error, Debug)]
pub enum VectorError {
    #[error(
        "Vector dimension mismatch: expected {expected}, got {actual}\nSuggestion: Ensure all vectors use the same embedding model"
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid vector dimension: {dimension}\nReason: {reason}")]
    InvalidDimension {
        dimension: usize,
        reason: &'static str,
    },

    #[error("Storage error: {0}\nSuggestion: Check disk space and file permissions")]
    Storage(#[from] std::io::Error),

    #[error(
        "Embedding generation failed: {0}\nSuggestion: Verify the embedding model is properly initialized"
    )]
    EmbeddingFailed(String),

    #[error(
        "Invalid storage version: expected {expected}, got {actual}\nSuggestion: Rebuild the embedding cache with 'labelseek index --force'"
    )]
    VersionMismatch { expected: u32, actual: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_dimension() {
        let dim = VectorDimension::new(384).unwrap();
        assert_eq!(dim.get(), 384);

        // Invalid dimension
        assert!(VectorDimension::new(0).is_err());

        // Validation
        let vec = vec![0.1; 384];
        assert!(dim.validate_vector(&vec).is_ok());

        let wrong_vec = vec![0.1; 100];
        assert!(dim.validate_vector(&wrong_vec).is_err());
    }

    #[test]
    fn test_matrix_rows_are_order_aligned() {
        let dim = VectorDimension::new(2).unwrap();
        let mut matrix = EmbeddingMatrix::new(dim);
        matrix.push_row(&[1.0, 0.0]).unwrap();
        matrix.push_row(&[0.0, 1.0]).unwrap();
        matrix.push_row(&[0.6, 0.8]).unwrap();

        assert_eq!(matrix.len(), 3);
        assert_eq!(matrix.row(1), Some(&[0.0, 1.0][..]));
        assert_eq!(matrix.row(3), None);

        let collected: Vec<&[f32]> = matrix.rows().collect();
        assert_eq!(collected[2], &[0.6, 0.8]);
    }

    #[test]
    fn test_matrix_rejects_wrong_width() {
        let dim = VectorDimension::new(3).unwrap();
        let mut matrix = EmbeddingMatrix::new(dim);

        match matrix.push_row(&[1.0, 2.0]) {
            Err(VectorError::DimensionMismatch { expected, actual }) => {
                assert_eq!(expected, 3);
                assert_eq!(actual, 2);
            }
            other => panic!("Expected DimensionMismatch, got {other:?}"),
        }
        assert!(matrix.is_empty());

        assert!(EmbeddingMatrix::from_flat(dim, vec![0.0; 7]).is_err());
        assert_eq!(EmbeddingMatrix::from_flat(dim, vec![0.0; 9]).unwrap().len(), 3);
    }
}
