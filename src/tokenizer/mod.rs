//! Byte-level BPE tokenization.
//!
//! Text is first UTF-8 encoded and mapped byte-for-byte through the
//! [`ByteAlphabet`] into a printable stand-in string. That string starts as
//! single-codepoint pieces which are then repeatedly merged: each round finds
//! the adjacent pair with the lowest (highest-priority) rank in the merge
//! table and fuses every non-overlapping left-to-right occurrence in one
//! sweep. Finished pieces are looked up in the vocabulary to yield token IDs.
//! Decoding is the reverse: concatenate piece strings, invert the alphabet
//! mapping, UTF-8 decode.
//!
//! The vocabulary and merge tables are immutable after load; a [`Tokenizer`]
//! can be shared across threads behind an `Arc` without synchronization.
//!
//! # Example
//!
//! ```rust
//! use llmzip::tokenizer::Tokenizer;
//!
//! let json = r#"{
//!     "model": {
//!         "vocab": {"h": 0, "i": 1, "hi": 2},
//!         "merges": ["h i"]
//!     }
//! }"#;
//! let tokenizer = Tokenizer::from_json_str(json)?;
//! let ids = tokenizer.encode("hi")?;
//! assert_eq!(ids, vec![2]);
//! assert_eq!(tokenizer.decode(&ids)?, "hi");
//! # Ok::<(), llmzip::Error>(())
//! ```

pub mod alphabet;
pub mod config;

use std::collections::HashMap;

use crate::{Error, Result};

pub use alphabet::ByteAlphabet;
pub use config::{AddedToken, ModelConfig, TokenizerConfig};

/// A loaded byte-level BPE tokenizer.
///
/// Holds the vocabulary in both directions, the ranked merge table, and the
/// set of special tokens matched atomically in input text.
#[derive(Debug)]
pub struct Tokenizer {
    /// Piece string to token ID.
    vocab: HashMap<String, u32>,
    /// Token ID to piece string; index is the ID.
    pieces: Vec<Option<String>>,
    /// `"left right"` pair key to merge rank; lower rank merges first.
    merge_ranks: HashMap<String, usize>,
    /// Special token contents with their IDs, longest content first.
    special: Vec<(String, u32)>,
    /// Special token ID to content, for decoding.
    special_by_id: HashMap<u32, String>,
}

/// A run of input text, either plain text to be BPE-encoded or a special
/// token matched atomically.
enum Segment<'t> {
    Text(&'t str),
    Special(u32),
}

impl Tokenizer {
    /// Builds a tokenizer from a parsed definition document.
    pub fn from_config(config: TokenizerConfig) -> Result<Self> {
        let mut vocab = config.model.vocab;
        let mut special = Vec::new();
        let mut special_by_id = HashMap::new();

        for token in &config.added_tokens {
            vocab.entry(token.content.clone()).or_insert(token.id);
            if token.special {
                special.push((token.content.clone(), token.id));
                special_by_id.insert(token.id, token.content.clone());
            }
        }
        // Longest content first so overlapping specials match greedily.
        special.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        let max_id = vocab.values().copied().max().map_or(0, |m| m as usize + 1);
        let mut pieces = vec![None; max_id];
        for (piece, &id) in &vocab {
            pieces[id as usize] = Some(piece.clone());
        }

        let mut merge_ranks = HashMap::with_capacity(config.model.merges.len());
        for (rank, rule) in config.model.merges.iter().enumerate() {
            let mut parts = rule.split(' ');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(left), Some(right), None) if !left.is_empty() && !right.is_empty() => {
                    merge_ranks.insert(format!("{left} {right}"), rank);
                }
                _ => {
                    return Err(Error::InvalidFormat(format!(
                        "tokenizer definition: malformed merge rule {rule:?} at rank {rank}"
                    )));
                }
            }
        }

        Ok(Self {
            vocab,
            pieces,
            merge_ranks,
            special,
            special_by_id,
        })
    }

    /// Builds a tokenizer from a JSON definition string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_config(TokenizerConfig::from_json_str(json)?)
    }

    /// Builds a tokenizer from a JSON definition reader.
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        Self::from_config(TokenizerConfig::from_reader(reader)?)
    }

    /// Number of token IDs the vocabulary spans (maximum ID plus one).
    pub fn vocab_size(&self) -> usize {
        self.pieces.len()
    }

    /// Encodes text into a token ID sequence.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownPiece`] if merging produces a piece the
    /// vocabulary cannot resolve even codepoint by codepoint. This only
    /// happens with a damaged definition; well-formed vocabularies cover
    /// every reachable piece.
    pub fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let alphabet = ByteAlphabet::shared();
        let mut ids = Vec::new();

        for segment in self.split_on_special(text) {
            match segment {
                Segment::Special(id) => ids.push(id),
                Segment::Text(run) => {
                    let mapped = alphabet.encode_bytes(run.as_bytes());
                    for piece in self.merge_pieces(&mapped) {
                        self.push_piece_id(&piece, &mut ids)?;
                    }
                }
            }
        }
        Ok(ids)
    }

    /// Decodes a token ID sequence back into text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownToken`] for IDs outside the vocabulary and
    /// [`Error::InvalidUtf8`] if the recovered bytes are not UTF-8 (possible
    /// only when the IDs came from a mismatched model or tokenizer).
    pub fn decode(&self, ids: &[u32]) -> Result<String> {
        let alphabet = ByteAlphabet::shared();
        let mut bytes = Vec::new();

        for &id in ids {
            if let Some(content) = self.special_by_id.get(&id) {
                bytes.extend_from_slice(content.as_bytes());
                continue;
            }
            let piece = self
                .pieces
                .get(id as usize)
                .and_then(|p| p.as_deref())
                .ok_or(Error::UnknownToken { id })?;
            let piece_bytes = alphabet.decode_str(piece).map_err(|_| Error::UnknownPiece {
                piece: piece.to_owned(),
            })?;
            bytes.extend_from_slice(&piece_bytes);
        }
        Ok(String::from_utf8(bytes)?)
    }

    /// Splits input text into plain runs and atomic special tokens.
    fn split_on_special<'t>(&self, text: &'t str) -> Vec<Segment<'t>> {
        let mut segments = Vec::new();
        let mut rest = text;

        'outer: while !rest.is_empty() {
            // Earliest match wins; `special` is ordered longest-first so ties
            // at the same position prefer the longer content.
            let mut best: Option<(usize, usize, u32)> = None;
            for (content, id) in &self.special {
                if let Some(pos) = rest.find(content.as_str()) {
                    if best.is_none_or(|(p, _, _)| pos < p) {
                        best = Some((pos, content.len(), *id));
                    }
                }
            }
            match best {
                Some((pos, len, id)) => {
                    if pos > 0 {
                        segments.push(Segment::Text(&rest[..pos]));
                    }
                    segments.push(Segment::Special(id));
                    rest = &rest[pos + len..];
                }
                None => {
                    segments.push(Segment::Text(rest));
                    break 'outer;
                }
            }
        }
        segments
    }

    /// Runs the merge loop over a stand-in string, returning final pieces.
    fn merge_pieces(&self, mapped: &str) -> Vec<String> {
        let mut pieces: Vec<String> = mapped.chars().map(String::from).collect();

        while pieces.len() > 1 {
            // Find the adjacent pair with the lowest rank.
            let mut best: Option<(usize, usize)> = None; // (rank, position)
            for i in 0..pieces.len() - 1 {
                let key = format!("{} {}", pieces[i], pieces[i + 1]);
                if let Some(&rank) = self.merge_ranks.get(&key) {
                    if best.is_none_or(|(r, _)| rank < r) {
                        best = Some((rank, i));
                    }
                }
            }
            let Some((_, first)) = best else { break };

            // One left-to-right sweep merges every occurrence of the chosen
            // pair, consuming two pieces per merge.
            let left = pieces[first].clone();
            let right = pieces[first + 1].clone();
            let mut merged = Vec::with_capacity(pieces.len());
            let mut i = 0;
            while i < pieces.len() {
                if i + 1 < pieces.len() && pieces[i] == left && pieces[i + 1] == right {
                    merged.push(format!("{left}{right}"));
                    i += 2;
                } else {
                    merged.push(std::mem::take(&mut pieces[i]));
                    i += 1;
                }
            }
            pieces = merged;
        }
        pieces
    }

    /// Resolves a piece to its ID, with the per-codepoint fallback.
    fn push_piece_id(&self, piece: &str, ids: &mut Vec<u32>) -> Result<()> {
        if let Some(&id) = self.vocab.get(piece) {
            ids.push(id);
            return Ok(());
        }
        // A missing piece means the vocabulary does not cover what its own
        // merge table produced. Fall back to single codepoints, loudly.
        log::warn!("vocabulary is missing piece {piece:?}; falling back to single codepoints");
        for ch in piece.chars() {
            let mut buf = [0u8; 4];
            let single: &str = ch.encode_utf8(&mut buf);
            let id = self.vocab.get(single).ok_or_else(|| Error::UnknownPiece {
                piece: piece.to_owned(),
            })?;
            ids.push(*id);
        }
        Ok(())
    }
}
