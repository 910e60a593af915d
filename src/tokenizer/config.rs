//! Serde model of the tokenizer definition document.
//!
//! The tokenizer is configured by a JSON document with the vocabulary under
//! `model.vocab`, the ranked merge list under `model.merges`, and optional
//! `added_tokens`. Only the fields this crate consumes are modeled; unknown
//! fields are ignored so real-world definition files parse as-is.

use std::collections::HashMap;

use serde::Deserialize;

/// Root of the tokenizer definition document.
#[derive(Debug, Deserialize)]
pub struct TokenizerConfig {
    /// The BPE model section.
    pub model: ModelConfig,
    /// Extra tokens registered outside the base vocabulary.
    #[serde(default)]
    pub added_tokens: Vec<AddedToken>,
}

/// The `model` section: vocabulary and ranked merges.
#[derive(Debug, Deserialize)]
pub struct ModelConfig {
    /// Piece string to token ID.
    pub vocab: HashMap<String, u32>,
    /// Merge rules as `"left right"` strings; list order defines rank,
    /// rank 0 merging first.
    pub merges: Vec<String>,
}

/// An entry of the `added_tokens` list.
#[derive(Debug, Clone, Deserialize)]
pub struct AddedToken {
    /// Token ID assigned to this entry.
    pub id: u32,
    /// The literal text content of the token.
    pub content: String,
    /// Whether the token is special: special tokens are matched atomically
    /// in the input text and bypass byte-level encoding.
    #[serde(default)]
    pub special: bool,
}

impl TokenizerConfig {
    /// Parses a definition document from a JSON string.
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parses a definition document from a reader.
    pub fn from_reader<R: std::io::Read>(reader: R) -> crate::Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_document() {
        let json = r#"{
            "model": {
                "vocab": {"a": 0, "b": 1, "ab": 2},
                "merges": ["a b"]
            }
        }"#;
        let config = TokenizerConfig::from_json_str(json).unwrap();
        assert_eq!(config.model.vocab.len(), 3);
        assert_eq!(config.model.vocab["ab"], 2);
        assert_eq!(config.model.merges, vec!["a b"]);
        assert!(config.added_tokens.is_empty());
    }

    #[test]
    fn test_parse_added_tokens() {
        let json = r#"{
            "model": {"vocab": {"x": 0}, "merges": []},
            "added_tokens": [
                {"id": 1, "content": "<|endoftext|>", "special": true},
                {"id": 2, "content": "plain"}
            ]
        }"#;
        let config = TokenizerConfig::from_json_str(json).unwrap();
        assert_eq!(config.added_tokens.len(), 2);
        assert!(config.added_tokens[0].special);
        assert_eq!(config.added_tokens[0].content, "<|endoftext|>");
        assert!(!config.added_tokens[1].special);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let json = r#"{
            "version": "1.0",
            "truncation": null,
            "model": {"type": "BPE", "vocab": {"x": 0}, "merges": [], "dropout": null}
        }"#;
        let config = TokenizerConfig::from_json_str(json).unwrap();
        assert_eq!(config.model.vocab["x"], 0);
    }

    #[test]
    fn test_malformed_document_is_error() {
        let err = TokenizerConfig::from_json_str("{\"model\": {}}").unwrap_err();
        assert!(err.is_tokenizer_error());
    }
}
