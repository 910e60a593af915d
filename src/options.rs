//! Configuration for the compression and decompression drivers.

use crate::{Error, Result};

/// Chunk geometry for chunked compression.
///
/// Setters validate their values and consume `self`, so options chain:
///
/// ```rust
/// use llmzip::ChunkingOptions;
///
/// let options = ChunkingOptions::new().chunk_size(64)?.overlap_size(8)?;
/// assert_eq!(options.chunk_size(), 64);
/// # Ok::<(), llmzip::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingOptions {
    chunk_size: u16,
    overlap_size: u16,
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        Self {
            chunk_size: 128,
            overlap_size: 16,
        }
    }
}

impl ChunkingOptions {
    /// Creates options with the default geometry: 128-token chunks with a
    /// 16-token overlap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of new tokens per chunk.
    ///
    /// # Errors
    ///
    /// Rejects 0, and any size that together with the current overlap would
    /// overflow the container's 16-bit per-chunk token count.
    pub fn chunk_size(mut self, size: u16) -> Result<Self> {
        if size == 0 {
            return Err(Error::invalid_options("chunk size must be at least 1"));
        }
        Self::check_wire_len(size, self.overlap_size)?;
        self.chunk_size = size;
        Ok(self)
    }

    /// Sets the number of context tokens repeated at the start of each
    /// chunk after the first.
    ///
    /// # Errors
    ///
    /// Rejects any overlap that together with the current chunk size would
    /// overflow the container's 16-bit per-chunk token count.
    pub fn overlap_size(mut self, size: u16) -> Result<Self> {
        Self::check_wire_len(self.chunk_size, size)?;
        self.overlap_size = size;
        Ok(self)
    }

    fn check_wire_len(chunk_size: u16, overlap_size: u16) -> Result<()> {
        if chunk_size as u32 + overlap_size as u32 > u16::MAX as u32 {
            return Err(Error::invalid_options(format!(
                "chunk size {chunk_size} plus overlap {overlap_size} exceeds the \
                 per-chunk token limit of {}",
                u16::MAX
            )));
        }
        Ok(())
    }

    /// The configured chunk size.
    pub fn chunk_size(&self) -> u16 {
        self.chunk_size
    }

    /// The configured overlap size.
    pub fn overlap_size(&self) -> u16 {
        self.overlap_size
    }
}

/// Policy knobs for decompression.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecompressOptions {
    strict_model_hash: bool,
    sequential: bool,
}

impl DecompressOptions {
    /// Creates the default policy: lenient hash check, parallel chunk
    /// decoding when built with the `parallel` feature.
    pub fn new() -> Self {
        Self::default()
    }

    /// Treats a model-hash mismatch as fatal instead of a logged warning.
    pub fn strict_model_hash(mut self, strict: bool) -> Self {
        self.strict_model_hash = strict;
        self
    }

    /// Forces single-threaded chunk decoding even when the `parallel`
    /// feature is enabled.
    pub fn sequential(mut self, sequential: bool) -> Self {
        self.sequential = sequential;
        self
    }

    /// Whether a hash mismatch aborts decompression.
    pub fn is_strict_model_hash(&self) -> bool {
        self.strict_model_hash
    }

    /// Whether chunk decoding is forced single-threaded.
    pub fn is_sequential(&self) -> bool {
        self.sequential
    }
}
