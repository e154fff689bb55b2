//! Memory-mapped storage for cached corpus embeddings.
//!
//! # Storage Format
//!
//! - Header (16 bytes): magic, version, dimension, row count (all u32 LE)
//! - Rows: contiguous little-endian f32 arrays, one per corpus row, in
//!   corpus order. There are no per-row IDs; position is identity.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use memmap2::{Mmap, MmapOptions};
use thiserror::Error;

use crate::vector::types::{EmbeddingMatrix, VectorDimension, VectorError};

/// Current storage format version.
const STORAGE_VERSION: u32 = 1;

/// Size of the storage header in bytes.
const HEADER_SIZE: usize = 16;

/// Magic bytes to identify embedding cache files.
const MAGIC_BYTES: &[u8; 4] = b"LVEC";

/// Number of bytes per f32 value.
const BYTES_PER_F32: usize = 4;

/// Errors specific to vector storage operations.
#[derive(Error, Debug)]
pub enum VectorStorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid storage format: {0}")]
    InvalidFormat(String),

    #[error("Vector error: {0}")]
    Vector(#[from] VectorError),
}

/// Memory-mapped embedding file for a single cache key.
#[derive(Debug)]
pub struct MmapVectorStorage {
    /// Path to the storage file.
    path: PathBuf,

    /// Memory-mapped file for reading.
    mmap: Option<Mmap>,

    /// Row width.
    dimension: VectorDimension,

    /// Number of rows stored.
    row_count: usize,
}

impl MmapVectorStorage {
    /// Writes `matrix` to `path`, replacing any previous file.
    ///
    /// The data is written to a sibling temp file first and renamed into
    /// place so a crash never leaves a truncated cache behind.
    pub fn create(
        path: impl AsRef<Path>,
        matrix: &EmbeddingMatrix,
    ) -> Result<Self, VectorStorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp_path = path.with_extension("vec.tmp");
        {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            write_header(&mut writer, matrix.dimension(), matrix.len())?;
            for &value in matrix.as_flat() {
                writer.write_all(&value.to_le_bytes())?;
            }
            writer.flush()?;
        }
        std::fs::rename(&tmp_path, &path)?;

        Ok(Self {
            path,
            mmap: None,
            dimension: matrix.dimension(),
            row_count: matrix.len(),
        })
    }

    /// Opens an existing storage file.
    ///
    /// Returns an error if the file doesn't exist, has a bad header, or its
    /// size disagrees with the header.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, VectorStorageError> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            return Err(VectorStorageError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Vector storage file not found: {path:?}"),
            )));
        }

        let file = File::open(&path)?;
        let mmap = unsafe { MmapOptions::new().map(&file)? };

        let (version, dimension, row_count) = read_header(&mmap)?;

        if version != STORAGE_VERSION {
            return Err(VectorError::VersionMismatch {
                expected: STORAGE_VERSION,
                actual: version,
            }
            .into());
        }

        let expected_len = HEADER_SIZE + row_count * dimension.get() * BYTES_PER_F32;
        if mmap.len() != expected_len {
            return Err(VectorStorageError::InvalidFormat(format!(
                "Header declares {row_count} rows of dimension {dimension} ({expected_len} bytes) but file has {} bytes",
                mmap.len()
            )));
        }

        Ok(Self {
            path,
            mmap: Some(mmap),
            dimension,
            row_count,
        })
    }

    /// Reads every row into an in-memory matrix.
    pub fn read_matrix(&mut self) -> Result<EmbeddingMatrix, VectorStorageError> {
        self.ensure_mapped()?;
        let mmap = self
            .mmap
            .as_ref()
            .ok_or_else(|| VectorStorageError::InvalidFormat("Storage not mapped".to_string()))?;

        let end = HEADER_SIZE + self.row_count * self.dimension.get() * BYTES_PER_F32;
        let data = decode_f32s(&mmap[HEADER_SIZE..end]);
        Ok(EmbeddingMatrix::from_flat(self.dimension, data)?)
    }

    /// Returns the number of rows stored.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Returns the row width.
    #[must_use]
    pub fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    fn ensure_mapped(&mut self) -> Result<(), VectorStorageError> {
        if self.mmap.is_none() {
            let file = File::open(&self.path)?;
            let mmap = unsafe { MmapOptions::new().map(&file)? };
            let (_, _, count) = read_header(&mmap)?;
            self.row_count = count;
            self.mmap = Some(mmap);
        }
        Ok(())
    }
}

fn write_header(
    writer: &mut impl Write,
    dimension: VectorDimension,
    row_count: usize,
) -> Result<(), VectorStorageError> {
    let dim = u32::try_from(dimension.get())
        .map_err(|_| VectorStorageError::InvalidFormat("Dimension exceeds u32".to_string()))?;
    let count = u32::try_from(row_count)
        .map_err(|_| VectorStorageError::InvalidFormat("Row count exceeds u32".to_string()))?;

    writer.write_all(MAGIC_BYTES)?;
    writer.write_all(&STORAGE_VERSION.to_le_bytes())?;
    writer.write_all(&dim.to_le_bytes())?;
    writer.write_all(&count.to_le_bytes())?;
    Ok(())
}

fn read_header(mmap: &Mmap) -> Result<(u32, VectorDimension, usize), VectorStorageError> {
    if mmap.len() < HEADER_SIZE {
        return Err(VectorStorageError::InvalidFormat(
            "File too small to contain header".to_string(),
        ));
    }

    if &mmap[0..4] != MAGIC_BYTES {
        return Err(VectorStorageError::InvalidFormat(
            "Invalid magic bytes".to_string(),
        ));
    }

    let version = u32::from_le_bytes([mmap[4], mmap[5], mmap[6], mmap[7]]);
    let dim_value = u32::from_le_bytes([mmap[8], mmap[9], mmap[10], mmap[11]]);
    let dimension = VectorDimension::new(dim_value as usize)?;
    let row_count = u32::from_le_bytes([mmap[12], mmap[13], mmap[14], mmap[15]]) as usize;

    Ok((version, dimension, row_count))
}

fn decode_f32s(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(BYTES_PER_F32)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}
