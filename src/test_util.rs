//! Shared fixtures for unit tests.

use std::sync::Arc;

use crate::compress::TextCompressor;
use crate::model::StubModel;
use crate::tokenizer::{ByteAlphabet, Tokenizer};

/// A tokenizer whose vocabulary is exactly the 256 single-byte pieces.
///
/// With no merges, every input byte becomes one token, so token streams are
/// easy to reason about and any UTF-8 text round-trips.
pub(crate) fn byte_tokenizer() -> Arc<Tokenizer> {
    let alphabet = ByteAlphabet::shared();
    let vocab: std::collections::HashMap<String, u32> = (0u16..256)
        .map(|b| (alphabet.encode_byte(b as u8).to_string(), b as u32))
        .collect();
    let doc = serde_json::json!({
        "model": { "vocab": vocab, "merges": [] }
    });
    Arc::new(Tokenizer::from_json_str(&doc.to_string()).unwrap())
}

/// A compressor over the byte tokenizer and a matching stub model.
pub(crate) fn byte_compressor() -> TextCompressor<StubModel> {
    let tokenizer = byte_tokenizer();
    let model = StubModel::new(tokenizer.vocab_size());
    TextCompressor::new(tokenizer, model)
}
