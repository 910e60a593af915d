//! Shared fixtures for integration tests.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test
//! file compiles as a separate crate and may only use a subset of these
//! helpers.

#![allow(dead_code)]

use std::sync::Arc;

use llmzip::tokenizer::ByteAlphabet;
use llmzip::{StubModel, TextCompressor, Tokenizer};

/// Builds a tokenizer whose vocabulary is the 256 single-byte pieces plus
/// the given merges, each merged piece appended to the vocabulary in rule
/// order.
pub fn tokenizer_with_merges(merges: &[&str]) -> Arc<Tokenizer> {
    let alphabet = ByteAlphabet::shared();
    let mut vocab = serde_json::Map::new();
    for b in 0u16..256 {
        vocab.insert(
            alphabet.encode_byte(b as u8).to_string(),
            serde_json::json!(b),
        );
    }
    let mut next_id = 256u32;
    for rule in merges {
        let piece: String = rule.split(' ').collect();
        vocab.entry(piece).or_insert_with(|| {
            let id = serde_json::json!(next_id);
            next_id += 1;
            id
        });
    }
    let doc = serde_json::json!({
        "model": { "vocab": vocab, "merges": merges }
    });
    Arc::new(Tokenizer::from_json_str(&doc.to_string()).expect("valid test definition"))
}

/// A tokenizer with no merges: every byte is one token.
pub fn byte_tokenizer() -> Arc<Tokenizer> {
    tokenizer_with_merges(&[])
}

/// A tokenizer with a handful of English-ish merges, including the
/// space stand-in codepoint.
pub fn english_tokenizer() -> Arc<Tokenizer> {
    tokenizer_with_merges(&[
        "t h",
        "th e",
        "i n",
        "e r",
        "a n",
        "o n",
        "r e",
        "Ġ t",
        "Ġ a",
        "Ġ the",
    ])
}

/// A compressor over the given tokenizer and a matching stub model.
pub fn compressor_for(tokenizer: Arc<Tokenizer>) -> TextCompressor<StubModel> {
    let model = StubModel::new(tokenizer.vocab_size());
    TextCompressor::new(tokenizer, model)
}
