//! Round-trip integration tests.
//!
//! These tests drive the full pipeline (tokenizer, quantizer, coder,
//! container, drivers) with the deterministic stub model and verify:
//! - `decompress(compress(s)) == s` for both container variants
//! - compression is a pure function of its input
//! - parallel and sequential chunk decoding agree
//! - the coder's output size approaches the source entropy

mod common;

use llmzip::coder::{ArithmeticDecoder, ArithmeticEncoder, CumulativeTable};
use llmzip::{ChunkingOptions, StubModel, TextCompressor, format};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SAMPLES: &[&str] = &[
    "",
    " ",
    "a",
    "Hello, world!",
    "the quick brown fox jumps over the lazy dog",
    "    indented\n\ttabbed\r\nwindows line endings\n",
    "Ünïcödé: ñandú, smörgåsbord, Привет, こんにちは, 你好",
    "emoji soup: 🦀🚀✨ 👨‍👩‍👧‍👦 🇺🇳",
    "fn main() { println!(\"{}\", 1 << 30); } // code-ish `text`",
    "# Markdown\n\n- item *one*\n- item **two**\n\n```rust\nlet x = 1;\n```\n",
];

#[test]
fn test_plain_roundtrip_samples() {
    let mut compressor = common::compressor_for(common::byte_tokenizer());
    for &text in SAMPLES {
        let result = compressor.compress(text).expect("compress");
        let restored = compressor.decompress(&result.data).expect("decompress");
        assert_eq!(restored, text, "plain roundtrip of {text:?}");
    }
}

#[test]
fn test_plain_roundtrip_with_merges() {
    let mut compressor = common::compressor_for(common::english_tokenizer());
    for &text in SAMPLES {
        let result = compressor.compress(text).expect("compress");
        assert_eq!(
            compressor.decompress(&result.data).expect("decompress"),
            text,
            "merged-vocabulary roundtrip of {text:?}"
        );
    }
}

#[test]
fn test_chunked_roundtrip_samples() {
    let tokenizer = common::byte_tokenizer();
    let model = StubModel::new(tokenizer.vocab_size());
    let chunking = ChunkingOptions::new()
        .chunk_size(8)
        .unwrap()
        .overlap_size(3)
        .unwrap();
    let mut compressor = TextCompressor::with_options(tokenizer, model, chunking);

    for &text in SAMPLES {
        let result = compressor.compress_chunked(text).expect("compress");
        let restored = compressor.decompress(&result.data).expect("decompress");
        assert_eq!(restored, text, "chunked roundtrip of {text:?}");
    }
}

#[test]
fn test_chunked_roundtrip_longer_text() {
    let text: String = (0..200)
        .map(|i| format!("sentence number {i} rolls along; "))
        .collect();

    let tokenizer = common::english_tokenizer();
    let model = StubModel::new(tokenizer.vocab_size());
    let chunking = ChunkingOptions::new()
        .chunk_size(64)
        .unwrap()
        .overlap_size(16)
        .unwrap();
    let mut compressor = TextCompressor::with_options(tokenizer, model, chunking);

    let result = compressor.compress_chunked(&text).expect("compress");
    assert!(result.chunk_count > 10, "expected many chunks, got {}", result.chunk_count);
    assert_eq!(compressor.decompress(&result.data).expect("decompress"), text);
}

#[test]
fn test_chunk_size_one() {
    let tokenizer = common::byte_tokenizer();
    let model = StubModel::new(tokenizer.vocab_size());
    let chunking = ChunkingOptions::new()
        .chunk_size(1)
        .unwrap()
        .overlap_size(2)
        .unwrap();
    let mut compressor = TextCompressor::with_options(tokenizer, model, chunking);

    let text = "tiny chunks";
    let result = compressor.compress_chunked(text).expect("compress");
    assert_eq!(result.chunk_count, text.len());
    assert_eq!(compressor.decompress(&result.data).expect("decompress"), text);
}

#[test]
fn test_compression_is_pure() {
    let text = "the same input must always produce the same container bytes";
    let mut a = common::compressor_for(common::english_tokenizer());
    let mut b = common::compressor_for(common::english_tokenizer());

    let first = a.compress(text).unwrap();
    // Interleave unrelated work to perturb the model state between calls.
    a.compress("something else entirely").unwrap();
    let second = a.compress(text).unwrap();
    let other_instance = b.compress(text).unwrap();

    assert_eq!(first.data, second.data);
    assert_eq!(first.data, other_instance.data);
}

#[test]
fn test_parallel_and_sequential_decode_agree() {
    let text: String = (0..120)
        .map(|i| format!("line {i}: parallel workers must agree with one thread\n"))
        .collect();

    let tokenizer = common::byte_tokenizer();
    let model = StubModel::new(tokenizer.vocab_size());
    let chunking = ChunkingOptions::new().chunk_size(32).unwrap();
    let mut compressor = TextCompressor::with_options(tokenizer, model, chunking);

    let result = compressor.compress_chunked(&text).expect("compress");
    let parallel = compressor.decompress(&result.data).expect("parallel decode");
    let sequential = compressor
        .decompress_sequential(&result.data)
        .expect("sequential decode");

    assert_eq!(parallel, text);
    assert_eq!(parallel, sequential);
}

#[test]
fn test_container_inspection_matches_result() {
    let mut compressor = common::compressor_for(common::byte_tokenizer());
    let text = "inspectable";
    let result = compressor.compress_chunked(text).unwrap();

    let info = format::inspect(&result.data).unwrap();
    assert_eq!(info.original_len() as usize, result.original_size);
    assert_eq!(info.token_count() as usize, result.token_count);
    assert_eq!(info.chunk_count(), result.chunk_count);
    assert_eq!(info.model_hash(), compressor.model().model_hash());
}

#[test]
fn test_coder_output_approaches_entropy() {
    // Stationary source over 4 symbols: H = 1.75 bits/symbol.
    let probs = [0.5f32, 0.25, 0.125, 0.125];
    let entropy = 1.75f64;
    let n = 4000usize;

    let mut rng = StdRng::seed_from_u64(0xC0DE);
    let symbols: Vec<usize> = (0..n)
        .map(|_| {
            let r: f64 = rng.r#gen();
            match r {
                r if r < 0.5 => 0,
                r if r < 0.75 => 1,
                r if r < 0.875 => 2,
                _ => 3,
            }
        })
        .collect();

    let table = CumulativeTable::from_probs(&probs);
    let mut encoder = ArithmeticEncoder::new();
    for &s in &symbols {
        encoder.encode(s, &table);
    }
    let payload = encoder.finish();

    let bits_per_symbol = (payload.len() * 8) as f64 / n as f64;
    assert!(
        (bits_per_symbol - entropy).abs() / entropy < 0.10,
        "got {bits_per_symbol:.3} bits/symbol for H = {entropy}"
    );

    // And the stream still decodes exactly.
    let mut decoder = ArithmeticDecoder::new(&payload);
    for &s in &symbols {
        assert_eq!(decoder.decode(&table), s);
    }
}
