//! # llmzip
//!
//! Lossless text compression driven by a language model.
//!
//! A language model conditioned on the preceding tokens predicts a
//! probability distribution for each next token; an arithmetic coder then
//! stores the token that actually occurred in about `-log2(p)` bits. The
//! better the model predicts the text, the smaller the output. This crate
//! provides everything around the model: the byte-level BPE tokenizer, the
//! probability quantizer and 32-bit arithmetic coder, the container formats,
//! and sequential plus chunk-parallel drivers. The model itself enters
//! through the narrow [`LanguageModel`] trait; [`StubModel`] stands in for a
//! real inference backend and drives the identical pipeline.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::fs::File;
//! use std::sync::Arc;
//! use llmzip::{Result, StubModel, TextCompressor, Tokenizer};
//!
//! fn main() -> Result<()> {
//!     // Load a tokenizer definition (vocabulary + ranked merges)
//!     let tokenizer = Arc::new(Tokenizer::from_reader(File::open("tokenizer.json")?)?);
//!
//!     // Any LanguageModel works; the stub needs no model file
//!     let model = StubModel::new(tokenizer.vocab_size());
//!     let mut compressor = TextCompressor::new(tokenizer, model);
//!
//!     let result = compressor.compress("The quick brown fox jumps over the lazy dog")?;
//!     println!(
//!         "{} -> {} bytes ({} tokens)",
//!         result.original_size,
//!         result.compressed_size(),
//!         result.token_count
//!     );
//!
//!     let restored = compressor.decompress(&result.data)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Chunked containers and parallel decoding
//!
//! A plain container is one continuous coder pass: decoding is inherently
//! serial because every token's distribution depends on the tokens before
//! it. A chunked container trades a little ratio for parallelism: the token
//! stream is cut into fixed-size chunks, each coded from a freshly reset
//! model and coder. Chunks after the first re-encode a small overlap of
//! context tokens so the model warms up before any output token, which
//! recovers most of the ratio lost to the reset.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use llmzip::{ChunkingOptions, Result, StubModel, TextCompressor, Tokenizer};
//!
//! # fn definition() -> String { String::new() }
//! fn main() -> Result<()> {
//!     let tokenizer = Arc::new(Tokenizer::from_json_str(&definition())?);
//!     let model = StubModel::new(tokenizer.vocab_size());
//!     let chunking = ChunkingOptions::new().chunk_size(128)?.overlap_size(16)?;
//!     let mut compressor = TextCompressor::with_options(tokenizer, model, chunking);
//!
//!     let result = compressor.compress_chunked(&std::fs::read_to_string("book.txt")?)?;
//!     println!("{} chunks", result.chunk_count);
//!
//!     // Decodes chunks concurrently, one model clone per worker
//!     let restored = compressor.decompress(&result.data)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Determinism
//!
//! Compression is a pure function of the input text, the tokenizer tables,
//! and the model: quantization is floor-based over `f32` in a fixed order,
//! and the coder's interval arithmetic is integer-exact. The decoder replays
//! the encoder's model queries step for step, which is why the container
//! header records a model hash: with a different model the replay diverges
//! on the first token. Mismatches are logged and tolerated by default and
//! fatal under [`DecompressOptions::strict_model_hash`].
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `parallel` | Yes | Multi-threaded chunk decompression with Rayon |
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`. See [`Error`] for the failure taxonomy:
//! format errors are fatal at decompression entry, model-hash mismatches
//! are policy-dependent, and coder-level misuse is treated as a programmer
//! error rather than a recoverable condition.

pub mod chunk;
pub mod coder;
pub mod compress;
pub mod decompress;
pub mod error;
pub mod format;
pub mod model;
pub mod options;
pub mod tokenizer;

#[cfg(test)]
pub(crate) mod test_util;

pub use compress::{CompressionResult, TextCompressor};
pub use error::{Error, Result};
pub use format::{ContainerInfo, is_chunked};
pub use model::{LanguageModel, StubModel};
pub use options::{ChunkingOptions, DecompressOptions};
pub use tokenizer::Tokenizer;
