//! The language-model facade the compression pipeline drives.
//!
//! The coder does not care where probabilities come from; it alternates
//! "feed the previous token, get a distribution" with "code the current
//! token". [`LanguageModel`] is that seam: a real inference backend
//! implements it over its runtime session, and [`StubModel`] implements it
//! over a small deterministic state machine so the full pipeline can run
//! (and be tested) without any neural network.
//!
//! Determinism is the load-bearing contract: given identical resets and
//! identical input sequences, `process_token` must return bit-identical
//! probability vectors, because the decoder replays the encoder's exact
//! queries to stay synchronized.

use crate::Result;

/// A stateful next-token probability source.
///
/// Implementations carry private mutable state between `process_token`
/// calls and must not be shared across threads; parallel decoding gives
/// each worker its own instance via `Clone`.
pub trait LanguageModel: Send {
    /// Returns the model to its initial state.
    fn reset(&mut self);

    /// Advances the model by one context token and returns the probability
    /// distribution over the next token.
    ///
    /// The returned vector always has [`vocab_size`](Self::vocab_size)
    /// entries. Must be a deterministic function of the sequence of inputs
    /// since the last [`reset`](Self::reset).
    ///
    /// # Errors
    ///
    /// Backend failures surface as [`crate::Error::Model`]; the drivers
    /// treat them as fatal.
    fn process_token(&mut self, ctx: u32) -> Result<Vec<f32>>;

    /// A stable identifier for the model variant, embedded in container
    /// headers and validated at decompression time.
    fn model_hash(&self) -> u32;

    /// Number of entries in every probability vector.
    fn vocab_size(&self) -> usize;
}

/// A deterministic stand-in model with no neural network behind it.
///
/// The distribution it produces is a function of a 64-bit state mixed from
/// every context token since the last reset, so it genuinely exercises the
/// context-carrying behavior of the pipeline: decode must replay encode's
/// exact token sequence or the streams diverge immediately.
///
/// # Example
///
/// ```rust
/// use llmzip::model::{LanguageModel, StubModel};
///
/// let mut model = StubModel::new(256);
/// let probs = model.process_token(0)?;
/// assert_eq!(probs.len(), 256);
/// let sum: f32 = probs.iter().sum();
/// assert!((sum - 1.0).abs() < 1e-3);
/// # Ok::<(), llmzip::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct StubModel {
    vocab_size: usize,
    seed: u64,
    state: u64,
    hash: u32,
}

impl StubModel {
    /// Creates a stub over a vocabulary of `vocab_size` symbols.
    pub fn new(vocab_size: usize) -> Self {
        Self::with_seed(vocab_size, 0x9E3779B97F4A7C15)
    }

    /// Creates a stub with an explicit mixing seed.
    ///
    /// Different seeds behave like different model variants: they report
    /// different hashes and produce different distributions.
    pub fn with_seed(vocab_size: usize, seed: u64) -> Self {
        assert!(vocab_size >= 2, "vocabulary needs at least two symbols");
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(b"stub-model");
        hasher.update(&(vocab_size as u64).to_le_bytes());
        hasher.update(&seed.to_le_bytes());
        Self {
            vocab_size,
            seed,
            state: seed,
            hash: hasher.finalize(),
        }
    }

    /// splitmix64 finalizer; mixes the state into well-spread outputs.
    fn mix(mut x: u64) -> u64 {
        x ^= x >> 30;
        x = x.wrapping_mul(0xBF58476D1CE4E5B9);
        x ^= x >> 27;
        x = x.wrapping_mul(0x94D049BB133111EB);
        x ^ (x >> 31)
    }
}

impl LanguageModel for StubModel {
    fn reset(&mut self) {
        self.state = self.seed;
    }

    fn process_token(&mut self, ctx: u32) -> Result<Vec<f32>> {
        self.state = Self::mix(self.state.wrapping_add(ctx as u64).wrapping_add(1));

        // Uniform floor plus a handful of peaked symbols derived from the
        // state, normalized to sum near 1.
        let v = self.vocab_size;
        let mut weights = vec![1.0f32; v];
        let mut total = v as f32;
        let mut h = self.state;
        for _ in 0..4 {
            h = Self::mix(h);
            let symbol = (h % v as u64) as usize;
            let boost = v as f32 / 4.0;
            weights[symbol] += boost;
            total += boost;
        }
        for w in &mut weights {
            *w /= total;
        }
        Ok(weights)
    }

    fn model_hash(&self) -> u32 {
        self.hash
    }

    fn vocab_size(&self) -> usize {
        self.vocab_size
    }
}
