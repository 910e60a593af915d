//! Error types for compression and decompression operations.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when compressing or decompressing text, along with a
//! convenient [`Result<T>`] type alias.
//!
//! # Error Handling
//!
//! All fallible operations in this crate return `Result<T, Error>`. You can
//! handle errors using pattern matching or the `?` operator:
//!
//! ```rust,no_run
//! use llmzip::{Error, Result, StubModel, TextCompressor};
//!
//! fn restore(compressor: &mut TextCompressor<StubModel>, data: &[u8]) -> Result<String> {
//!     match compressor.decompress(data) {
//!         Ok(text) => Ok(text),
//!         Err(Error::InvalidFormat(msg)) => {
//!             eprintln!("Not a compressed container: {}", msg);
//!             Err(Error::InvalidFormat(msg))
//!         }
//!         Err(Error::ModelMismatch { expected, actual }) => {
//!             eprintln!("Container needs model {:#x}, have {:#x}", expected, actual);
//!             Err(Error::ModelMismatch { expected, actual })
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//! ```

use std::io;

/// The main error type for compression operations.
///
/// This enum represents all possible errors that can occur when
/// compressing or decompressing text. Each variant includes relevant
/// context to help diagnose the issue.
///
/// # Error Categories
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|---------------|
/// | Format | [`InvalidFormat`][Self::InvalidFormat], [`CorruptHeader`][Self::CorruptHeader], [`UnsupportedVersion`][Self::UnsupportedVersion] | Invalid container data |
/// | Model | [`ModelMismatch`][Self::ModelMismatch], [`Model`][Self::Model] | Wrong or failing inference backend |
/// | Tokenizer | [`UnknownPiece`][Self::UnknownPiece], [`UnknownToken`][Self::UnknownToken], [`TokenizerConfig`][Self::TokenizerConfig] | Damaged vocabulary or merge tables |
/// | Configuration | [`InvalidOptions`][Self::InvalidOptions], [`LimitExceeded`][Self::LimitExceeded] | Rejected option values, oversized streams |
/// | I/O | [`Io`][Self::Io], [`InvalidUtf8`][Self::InvalidUtf8] | Reading definition files, decoding output |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred while reading a tokenizer definition.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input bytes are not a recognized compressed container.
    ///
    /// This error occurs when the leading magic bytes match neither the
    /// plain nor the chunked container format.
    #[error("Invalid container format: {0}")]
    InvalidFormat(String),

    /// The container header is corrupt or truncated.
    ///
    /// The error includes the byte offset where the inconsistency was
    /// detected, such as a chunk offset pointing outside the container or
    /// an offset table that does not fit the declared chunk count.
    #[error("Corrupt header at offset {offset:#x}: {reason}")]
    CorruptHeader {
        /// The byte offset where corruption was detected.
        offset: u64,
        /// A description of the corruption.
        reason: String,
    },

    /// The container declares a format version newer than this build knows.
    #[error("Unsupported container version {version} (highest known is {highest})")]
    UnsupportedVersion {
        /// The version byte found in the header.
        version: u8,
        /// The highest version this build can decode.
        highest: u8,
    },

    /// The container was produced by a different model.
    ///
    /// Only returned in strict mode; by default a mismatch is logged and
    /// decompression proceeds, producing deterministic but almost certainly
    /// garbled output.
    #[error("Model hash mismatch: container {expected:#010x}, runtime model {actual:#010x}")]
    ModelMismatch {
        /// The model hash stored in the container header.
        expected: u32,
        /// The hash reported by the runtime model.
        actual: u32,
    },

    /// The inference backend reported a failure.
    #[error("Model backend error: {0}")]
    Model(String),

    /// A piece produced by BPE merging has no vocabulary entry.
    ///
    /// This indicates a damaged vocabulary: merging produced a piece the
    /// vocabulary does not contain, and the per-codepoint fallback also
    /// failed to resolve it. Well-formed tokenizer definitions never hit
    /// this path.
    #[error("No vocabulary entry for piece {piece:?}")]
    UnknownPiece {
        /// The unresolvable piece, in byte-alphabet codepoints.
        piece: String,
    },

    /// A token ID in the container has no piece in the vocabulary.
    #[error("Token ID {id} is outside the vocabulary")]
    UnknownToken {
        /// The unresolvable token ID.
        id: u32,
    },

    /// The tokenizer definition document could not be parsed.
    #[error("Invalid tokenizer definition: {0}")]
    TokenizerConfig(#[from] serde_json::Error),

    /// Decoded bytes do not form valid UTF-8.
    ///
    /// Possible only when decompressing with a mismatched model or a
    /// tokenizer other than the one used for compression; matched
    /// round-trips always reproduce the original string.
    #[error("Decoded bytes are not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// A configuration value was rejected.
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// The token stream does not fit the chunked container's field widths.
    #[error("Stream does not fit container limits: {0}")]
    LimitExceeded(String),
}

impl Error {
    /// Returns `true` if this is a data corruption error.
    ///
    /// Corruption errors indicate the container bytes are damaged or were
    /// never a container at all.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::InvalidFormat(_) | Error::CorruptHeader { .. })
    }

    /// Returns `true` if this error might be recoverable.
    ///
    /// Recoverable errors are those where the operation could succeed with
    /// different inputs: a model mismatch can be retried with the right
    /// model, rejected options can be rebuilt with accepted values.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::ModelMismatch { .. } => true,
            Error::InvalidOptions(_) => true,
            Error::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }

    /// Returns `true` if this error points at the tokenizer definition.
    pub fn is_tokenizer_error(&self) -> bool {
        matches!(
            self,
            Error::UnknownPiece { .. } | Error::UnknownToken { .. } | Error::TokenizerConfig(_)
        )
    }

    /// Creates a CorruptHeader error.
    ///
    /// This is a convenience constructor for creating corrupt header errors.
    pub fn corrupt_header(offset: u64, reason: impl Into<String>) -> Self {
        Error::CorruptHeader {
            offset,
            reason: reason.into(),
        }
    }

    /// Creates an InvalidOptions error.
    pub fn invalid_options(reason: impl Into<String>) -> Self {
        Error::InvalidOptions(reason.into())
    }
}

/// A specialized Result type for compression operations.
///
/// This is defined as `std::result::Result<T, Error>` for convenience.
pub type Result<T> = std::result::Result<T, Error>;
