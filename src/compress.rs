//! The compression driver.
//!
//! [`TextCompressor`] owns a tokenizer and a model and turns text into
//! framed containers. Two shapes are supported: a plain container coded in
//! one continuous pass, and a chunked container whose payloads are each
//! coded from a freshly reset model so they can be decoded in parallel
//! (see [`crate::decompress`]).
//!
//! Within a chunk, coding is strictly sequential: every token's probability
//! distribution depends on the model state left by the previous token.
//! Chunks themselves are compressed sequentially over the one owned model,
//! resetting it at each chunk boundary.

use std::sync::Arc;

use crate::chunk;
use crate::coder::{ArithmeticEncoder, CumulativeTable};
use crate::format::{ChunkedHeader, PlainHeader};
use crate::model::LanguageModel;
use crate::options::{ChunkingOptions, DecompressOptions};
use crate::tokenizer::Tokenizer;
use crate::{Error, Result};

/// A compressor bound to one tokenizer and one model.
///
/// The tokenizer is shared and immutable; the model carries mutable state
/// and is reset at every pass (and every chunk) boundary. Dropping the
/// compressor releases both.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use llmzip::{StubModel, TextCompressor, Tokenizer};
///
/// # fn definition() -> String { String::new() }
/// let tokenizer = Arc::new(Tokenizer::from_json_str(&definition())?);
/// let model = StubModel::new(tokenizer.vocab_size());
/// let mut compressor = TextCompressor::new(tokenizer, model);
///
/// let result = compressor.compress("The quick brown fox")?;
/// println!(
///     "{} bytes -> {} bytes ({:.1}% saved)",
///     result.original_size,
///     result.compressed_size(),
///     result.space_savings() * 100.0
/// );
/// let restored = compressor.decompress(&result.data)?;
/// # Ok::<(), llmzip::Error>(())
/// ```
#[derive(Debug)]
pub struct TextCompressor<M: LanguageModel> {
    tokenizer: Arc<Tokenizer>,
    model: M,
    chunking: ChunkingOptions,
    decompress_options: DecompressOptions,
}

impl<M: LanguageModel> TextCompressor<M> {
    /// Creates a compressor with default chunking geometry.
    pub fn new(tokenizer: Arc<Tokenizer>, model: M) -> Self {
        Self::with_options(tokenizer, model, ChunkingOptions::default())
    }

    /// Creates a compressor with explicit chunking geometry.
    pub fn with_options(tokenizer: Arc<Tokenizer>, model: M, chunking: ChunkingOptions) -> Self {
        Self {
            tokenizer,
            model,
            chunking,
            decompress_options: DecompressOptions::default(),
        }
    }

    /// Sets the decompression policy applied by [`decompress`].
    ///
    /// [`decompress`]: Self::decompress
    pub fn decompress_options(mut self, options: DecompressOptions) -> Self {
        self.decompress_options = options;
        self
    }

    /// The shared tokenizer.
    pub fn tokenizer(&self) -> &Arc<Tokenizer> {
        &self.tokenizer
    }

    /// The owned model.
    pub fn model(&self) -> &M {
        &self.model
    }

    pub(crate) fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub(crate) fn options(&self) -> &DecompressOptions {
        &self.decompress_options
    }

    /// Compresses text into a plain container with one continuous coder
    /// pass over the whole token stream.
    pub fn compress(&mut self, text: &str) -> Result<CompressionResult> {
        let original_len = checked_u32(text.len(), "original text length")?;
        let tokens = self.tokenizer.encode(text)?;
        let token_count = checked_u32(tokens.len(), "token count")?;

        let payload = if tokens.is_empty() {
            Vec::new()
        } else {
            encode_tokens(&mut self.model, &tokens)?
        };

        let header = PlainHeader {
            original_len,
            token_count,
            model_hash: self.model.model_hash(),
        };
        log::debug!(
            "plain compress: {} bytes, {} tokens, {} payload bytes",
            text.len(),
            tokens.len(),
            payload.len()
        );
        Ok(CompressionResult {
            data: header.frame(&payload),
            original_size: text.len(),
            token_count: tokens.len(),
            chunk_count: 1,
        })
    }

    /// Compresses text into a chunked container.
    ///
    /// Every chunk is coded from a freshly reset model and coder; chunks
    /// after the first redundantly re-encode the configured overlap so a
    /// decoder can rebuild context without any earlier chunk's state.
    pub fn compress_chunked(&mut self, text: &str) -> Result<CompressionResult> {
        let original_len = checked_u32(text.len(), "original text length")?;
        let tokens = self.tokenizer.encode(text)?;
        let total_token_count = checked_u32(tokens.len(), "token count")?;

        let spans = chunk::plan_chunks(
            tokens.len(),
            self.chunking.chunk_size() as usize,
            self.chunking.overlap_size() as usize,
        );
        if u16::try_from(spans.len()).is_err() {
            return Err(Error::LimitExceeded(format!(
                "{} chunks exceed the container's 16-bit chunk count",
                spans.len()
            )));
        }

        let mut payloads = Vec::with_capacity(spans.len());
        let mut chunk_token_counts = Vec::with_capacity(spans.len());
        for span in &spans {
            payloads.push(encode_tokens(&mut self.model, &tokens[span.start..span.end])?);
            chunk_token_counts.push(span.wire_len() as u16);
        }

        let header_size = crate::format::CHUNKED_HEADER_BASE_SIZE + 6 * spans.len();
        let mut chunk_offsets = Vec::with_capacity(spans.len());
        let mut offset = header_size;
        for payload in &payloads {
            chunk_offsets.push(checked_u32(offset, "chunk offset")?);
            offset += payload.len();
        }

        let header = ChunkedHeader {
            original_len,
            total_token_count,
            model_hash: self.model.model_hash(),
            chunk_size: self.chunking.chunk_size(),
            overlap_size: self.chunking.overlap_size(),
            chunk_offsets,
            chunk_token_counts,
        };

        let mut data = header.serialize();
        data.reserve(payloads.iter().map(Vec::len).sum());
        for payload in &payloads {
            data.extend_from_slice(payload);
        }
        log::debug!(
            "chunked compress: {} bytes, {} tokens, {} chunks, {} container bytes",
            text.len(),
            tokens.len(),
            spans.len(),
            data.len()
        );
        Ok(CompressionResult {
            data,
            original_size: text.len(),
            token_count: tokens.len(),
            chunk_count: spans.len(),
        })
    }
}

/// Codes a token slice with a freshly reset model and coder.
///
/// The context fed to the model for token `i` is token `i - 1`, with 0
/// standing in before the first token.
pub(crate) fn encode_tokens<M: LanguageModel>(model: &mut M, tokens: &[u32]) -> Result<Vec<u8>> {
    model.reset();
    let mut encoder = ArithmeticEncoder::new();
    let mut ctx = 0u32;
    for &token in tokens {
        let probs = model.process_token(ctx)?;
        let table = CumulativeTable::from_probs(&probs);
        encoder.encode(token as usize, &table);
        ctx = token;
    }
    Ok(encoder.finish())
}

/// On-wire overlap of chunk `index`, recomputed from header geometry.
pub(crate) fn overlap_at(index: usize, chunk_size: u16, overlap_size: u16) -> usize {
    if index == 0 {
        0
    } else {
        let cut = index as u64 * chunk_size as u64;
        (overlap_size as u64).min(cut) as usize
    }
}

fn checked_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| Error::LimitExceeded(format!("{what} {value} exceeds the 32-bit field")))
}

/// The outcome of a compression pass.
#[derive(Debug, Clone)]
pub struct CompressionResult {
    /// The complete container: header plus payload bytes.
    pub data: Vec<u8>,
    /// Length of the original text in bytes.
    pub original_size: usize,
    /// Number of tokens in the reconstructed stream.
    pub token_count: usize,
    /// Number of independently coded payloads (1 for plain containers).
    pub chunk_count: usize,
}

impl CompressionResult {
    /// Total container size in bytes.
    pub fn compressed_size(&self) -> usize {
        self.data.len()
    }

    /// Compressed size over original size; 1.0 for empty input.
    pub fn compression_ratio(&self) -> f64 {
        if self.original_size == 0 {
            1.0
        } else {
            self.data.len() as f64 / self.original_size as f64
        }
    }

    /// Fraction of the original size saved, which can be negative when the
    /// container overhead outweighs the coding gain.
    pub fn space_savings(&self) -> f64 {
        1.0 - self.compression_ratio()
    }

    /// Average container bits spent per token.
    pub fn bits_per_token(&self) -> f64 {
        if self.token_count == 0 {
            0.0
        } else {
            (self.data.len() * 8) as f64 / self.token_count as f64
        }
    }
}
