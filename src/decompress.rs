//! The decompression driver.
//!
//! Containers are dispatched on their magic bytes: plain containers decode
//! with one continuous coder pass, chunked containers decode chunk by chunk
//! and merge. Chunks carry no cross-chunk state, so with the `parallel`
//! feature enabled they decode concurrently, each worker owning a private
//! clone of the model. Decoded chunks merge in ascending chunk order
//! regardless of completion order.
//!
//! A model-hash mismatch is logged and tolerated by default: output is
//! deterministic but almost certainly garbled. Strict mode
//! ([`DecompressOptions::strict_model_hash`]) turns it into an error.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::chunk;
use crate::coder::{ArithmeticDecoder, CumulativeTable};
use crate::compress::{TextCompressor, overlap_at};
use crate::format::{self, ChunkedHeader, PlainHeader};
use crate::model::LanguageModel;
use crate::options::DecompressOptions;
use crate::{Error, Result};

impl<M: LanguageModel> TextCompressor<M> {
    /// Decompresses either container variant on a single thread.
    ///
    /// Works with any model because chunks are decoded one after another on
    /// the compressor's own instance, resetting it per chunk. Prefer
    /// [`decompress`](Self::decompress) when the model is cloneable.
    pub fn decompress_sequential(&mut self, data: &[u8]) -> Result<String> {
        let options = self.options().sequential(true);
        if format::is_chunked(data) {
            self.decompress_chunked(data, &options)
        } else {
            self.decompress_plain(data, &options)
        }
    }

    fn decompress_plain(&mut self, data: &[u8], options: &DecompressOptions) -> Result<String> {
        let (header, payload) = PlainHeader::split(data)?;
        check_model_hash(header.model_hash, self.model().model_hash(), options)?;

        let tokens = decode_tokens(self.model_mut(), payload, header.token_count as usize)?;
        self.tokenizer().decode(&tokens)
    }

    fn decompress_chunked(&mut self, data: &[u8], options: &DecompressOptions) -> Result<String> {
        let header = ChunkedHeader::parse(data)?;
        check_model_hash(header.model_hash, self.model().model_hash(), options)?;
        let overlaps = validate_chunk_totals(&header)?;

        let payloads = header.payload_slices(data)?;
        log::debug!(
            "chunked decompress: {} chunks, {} tokens, sequential",
            header.chunk_count(),
            header.total_token_count
        );

        let mut decoded = Vec::with_capacity(payloads.len());
        for (&payload, &wire_count) in payloads.iter().zip(&header.chunk_token_counts) {
            decoded.push(decode_tokens(
                self.model_mut(),
                payload,
                wire_count as usize,
            )?);
        }

        let tokens = chunk::merge_decoded(decoded, &overlaps);
        self.tokenizer().decode(&tokens)
    }
}

impl<M: LanguageModel + Clone + Sync> TextCompressor<M> {
    /// Decompresses either container variant with the compressor's default
    /// policy: lenient hash checking, parallel chunk decoding when built
    /// with the `parallel` feature.
    pub fn decompress(&mut self, data: &[u8]) -> Result<String> {
        let options = *self.options();
        self.decompress_with(data, &options)
    }

    /// Decompresses with an explicit policy.
    pub fn decompress_with(&mut self, data: &[u8], options: &DecompressOptions) -> Result<String> {
        if !format::is_chunked(data) {
            return self.decompress_plain(data, options);
        }
        if options.is_sequential() {
            return self.decompress_chunked(data, options);
        }
        self.decompress_chunked_parallel(data, options)
    }

    /// Decompresses a chunked container with one worker per chunk.
    #[cfg(feature = "parallel")]
    fn decompress_chunked_parallel(
        &mut self,
        data: &[u8],
        options: &DecompressOptions,
    ) -> Result<String> {
        let header = ChunkedHeader::parse(data)?;
        check_model_hash(header.model_hash, self.model().model_hash(), options)?;
        let overlaps = validate_chunk_totals(&header)?;

        let payloads = header.payload_slices(data)?;
        log::debug!(
            "chunked decompress: {} chunks, {} tokens, parallel",
            header.chunk_count(),
            header.total_token_count
        );

        let model = self.model();
        let decoded: Vec<Vec<u32>> = payloads
            .par_iter()
            .zip(header.chunk_token_counts.par_iter())
            .map(|(&payload, &wire_count)| {
                let mut worker_model = model.clone();
                decode_tokens(&mut worker_model, payload, wire_count as usize)
            })
            .collect::<Result<_>>()?;

        let tokens = chunk::merge_decoded(decoded, &overlaps);
        self.tokenizer().decode(&tokens)
    }

    /// Single-threaded fallback when the `parallel` feature is disabled.
    #[cfg(not(feature = "parallel"))]
    fn decompress_chunked_parallel(
        &mut self,
        data: &[u8],
        options: &DecompressOptions,
    ) -> Result<String> {
        self.decompress_chunked(data, options)
    }
}

/// Decodes exactly `count` tokens from a payload with a freshly reset model.
///
/// The mirror image of [`crate::compress::encode_tokens`]: the decoded token
/// becomes the next context, starting from context 0.
fn decode_tokens<M: LanguageModel>(model: &mut M, payload: &[u8], count: usize) -> Result<Vec<u32>> {
    model.reset();
    let mut decoder = ArithmeticDecoder::new(payload);
    let mut tokens = Vec::with_capacity(count);
    let mut ctx = 0u32;
    for _ in 0..count {
        let probs = model.process_token(ctx)?;
        let table = CumulativeTable::from_probs(&probs);
        let token = decoder.decode(&table) as u32;
        tokens.push(token);
        ctx = token;
    }
    Ok(tokens)
}

/// Applies the hash policy: warn and continue, or abort in strict mode.
fn check_model_hash(expected: u32, actual: u32, options: &DecompressOptions) -> Result<()> {
    if expected == actual {
        return Ok(());
    }
    if options.is_strict_model_hash() {
        return Err(Error::ModelMismatch { expected, actual });
    }
    log::warn!(
        "model hash mismatch: container {expected:#010x}, runtime model {actual:#010x}; \
         output will be deterministic but almost certainly garbled"
    );
    Ok(())
}

/// Checks the chunk token counts against the declared total and returns the
/// per-chunk overlap widths.
fn validate_chunk_totals(header: &ChunkedHeader) -> Result<Vec<usize>> {
    let overlaps: Vec<usize> = (0..header.chunk_count())
        .map(|i| overlap_at(i, header.chunk_size, header.overlap_size))
        .collect();

    let mut reconstructed = 0u64;
    for (i, (&wire_count, &overlap)) in header
        .chunk_token_counts
        .iter()
        .zip(&overlaps)
        .enumerate()
    {
        let wire_count = wire_count as u64;
        if wire_count < overlap as u64 {
            return Err(Error::corrupt_header(
                0,
                format!("chunk {i} carries {wire_count} tokens, fewer than its {overlap}-token overlap"),
            ));
        }
        reconstructed += wire_count - overlap as u64;
    }
    if reconstructed != header.total_token_count as u64 {
        return Err(Error::corrupt_header(
            0,
            format!(
                "chunk token counts reconstruct {reconstructed} tokens, header declares {}",
                header.total_token_count
            ),
        ));
    }
    Ok(overlaps)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::StubModel;
    use crate::options::ChunkingOptions;
    use crate::test_util::{byte_compressor, byte_tokenizer};

    const SAMPLE: &str = "Peter Piper picked a peck of pickled peppers. \
                          A peck of pickled peppers Peter Piper picked.";

    #[test]
    fn test_plain_roundtrip() {
        let mut compressor = byte_compressor();
        let result = compressor.compress(SAMPLE).unwrap();
        assert_eq!(compressor.decompress(&result.data).unwrap(), SAMPLE);
    }

    #[test]
    fn test_plain_roundtrip_empty() {
        let mut compressor = byte_compressor();
        let result = compressor.compress("").unwrap();
        assert_eq!(compressor.decompress(&result.data).unwrap(), "");
    }

    #[test]
    fn test_chunked_roundtrip() {
        let tokenizer = byte_tokenizer();
        let model = StubModel::new(tokenizer.vocab_size());
        let chunking = ChunkingOptions::new()
            .chunk_size(16)
            .unwrap()
            .overlap_size(4)
            .unwrap();
        let mut compressor = TextCompressor::with_options(tokenizer, model, chunking);

        let result = compressor.compress_chunked(SAMPLE).unwrap();
        assert!(result.chunk_count > 1);
        assert_eq!(compressor.decompress(&result.data).unwrap(), SAMPLE);
    }

    #[test]
    fn test_chunked_roundtrip_empty() {
        let mut compressor = byte_compressor();
        let result = compressor.compress_chunked("").unwrap();
        assert_eq!(compressor.decompress(&result.data).unwrap(), "");
    }

    #[test]
    fn test_parallel_equals_sequential() {
        let tokenizer = byte_tokenizer();
        let model = StubModel::new(tokenizer.vocab_size());
        let chunking = ChunkingOptions::new().chunk_size(8).unwrap();
        let mut compressor = TextCompressor::with_options(tokenizer, model, chunking);

        let result = compressor.compress_chunked(SAMPLE).unwrap();
        let parallel = compressor.decompress(&result.data).unwrap();
        let sequential = compressor.decompress_sequential(&result.data).unwrap();
        assert_eq!(parallel, sequential);
        assert_eq!(parallel, SAMPLE);
    }

    #[test]
    fn test_zero_overlap_roundtrip() {
        let tokenizer = byte_tokenizer();
        let model = StubModel::new(tokenizer.vocab_size());
        let chunking = ChunkingOptions::new()
            .chunk_size(8)
            .unwrap()
            .overlap_size(0)
            .unwrap();
        let mut compressor = TextCompressor::with_options(tokenizer, model, chunking);

        let result = compressor.compress_chunked(SAMPLE).unwrap();
        assert_eq!(compressor.decompress(&result.data).unwrap(), SAMPLE);
    }

    #[test]
    fn test_rejects_garbage() {
        let mut compressor = byte_compressor();
        let err = compressor.decompress(b"not a container").unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn test_lenient_hash_mismatch_decodes_garbage() {
        let mut writer = byte_compressor();
        let result = writer.compress(SAMPLE).unwrap();

        let tokenizer = byte_tokenizer();
        let other_model = StubModel::with_seed(tokenizer.vocab_size(), 42);
        let mut reader = TextCompressor::new(tokenizer, other_model);

        // Lenient mode proceeds; the bytes decode deterministically but the
        // text does not survive, and invalid UTF-8 is a possible outcome.
        match reader.decompress(&result.data) {
            Ok(text) => assert_ne!(text, SAMPLE),
            Err(Error::InvalidUtf8(_)) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn test_strict_hash_mismatch_is_fatal() {
        let mut writer = byte_compressor();
        let result = writer.compress(SAMPLE).unwrap();

        let tokenizer = byte_tokenizer();
        let other_model = StubModel::with_seed(tokenizer.vocab_size(), 42);
        let mut reader = TextCompressor::new(tokenizer, other_model);

        let options = DecompressOptions::new().strict_model_hash(true);
        let err = reader.decompress_with(&result.data, &options).unwrap_err();
        assert!(matches!(err, Error::ModelMismatch { .. }));
    }

    #[test]
    fn test_rejects_inconsistent_token_totals() {
        let tokenizer = byte_tokenizer();
        let model = StubModel::new(tokenizer.vocab_size());
        let chunking = ChunkingOptions::new().chunk_size(8).unwrap();
        let mut compressor = TextCompressor::with_options(tokenizer, model, chunking);

        let mut data = compressor.compress_chunked(SAMPLE).unwrap().data;
        // Inflate the declared total so it disagrees with the chunk table.
        data[9..13].copy_from_slice(&999u32.to_le_bytes());
        let err = compressor.decompress(&data).unwrap_err();
        assert!(matches!(err, Error::CorruptHeader { .. }));
    }
}
