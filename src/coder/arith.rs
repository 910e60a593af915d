//! Arithmetic coding over quantized probability tables.
//!
//! This module provides the entropy coder at the heart of the compressor.
//! It supports:
//! - Encoding one symbol per step against a fresh probability table
//! - Decoding with the identical interval arithmetic, bit for bit
//! - Large alphabets (tens of thousands of symbols) via cumulative tables
//!
//! # Range Coding Overview
//!
//! Arithmetic coding represents a whole message as a single number inside a
//! shrinking interval. Each symbol narrows the interval in proportion to its
//! probability, so a symbol of probability `p` costs about `-log2(p)` bits.
//! The interval is tracked in 32-bit integers and renormalized whenever its
//! top bit is resolved (or it straddles the midpoint), keeping precision
//! bounded while bits stream out incrementally.
//!
//! Encoder and decoder share the same renormalization cases:
//! the interval sits in the lower half (emit 0), the upper half (emit 1), or
//! straddles the middle two quarters (defer, counting pending bits). The
//! deferred bits are emitted as complements once the top bit resolves.

use super::bitstream::{BitReader, BitWriter};
use super::quantize::CumulativeTable;

/// Midpoint of the 32-bit interval.
const HALF: u32 = 1 << 31;

/// First quartile of the 32-bit interval.
const QUARTER: u32 = 1 << 30;

/// Third quartile of the 32-bit interval.
const THREE_QUARTERS: u32 = 3 << 30;

/// Arithmetic encoder over a 32-bit interval.
///
/// Feed symbols with [`encode`](Self::encode), then call
/// [`finish`](Self::finish) to resolve the final interval and obtain the
/// packed bytes.
#[derive(Debug)]
pub struct ArithmeticEncoder {
    low: u32,
    high: u32,
    /// Straddle bits awaiting the next resolved MSB.
    pending: u32,
    output: BitWriter,
}

impl ArithmeticEncoder {
    /// Creates an encoder over the full interval with an empty output.
    pub fn new() -> Self {
        Self {
            low: 0,
            high: u32::MAX,
            pending: 0,
            output: BitWriter::new(),
        }
    }

    /// Encodes one symbol against the given cumulative table.
    ///
    /// # Panics
    ///
    /// Panics if `symbol` is outside the table; out-of-range symbols are a
    /// programmer error, not a data error.
    pub fn encode(&mut self, symbol: usize, table: &CumulativeTable) {
        let (c_lo, c_hi) = table.symbol_range(symbol);
        let total = table.total() as u64;
        debug_assert!(total < QUARTER as u64, "cumulative total too large for coder precision");

        // The products exceed 32 bits; the interval math runs in u64. The
        // upper product can reach 2^32 exactly, so the -1 happens before the
        // narrowing cast.
        let range = (self.high - self.low) as u64 + 1;
        self.high = self.low + ((range * c_hi as u64) / total - 1) as u32;
        self.low += ((range * c_lo as u64) / total) as u32;

        loop {
            if self.high < HALF {
                self.emit_resolved(0);
            } else if self.low >= HALF {
                self.low -= HALF;
                self.high -= HALF;
                self.emit_resolved(1);
            } else if self.low >= QUARTER && self.high < THREE_QUARTERS {
                self.low -= QUARTER;
                self.high -= QUARTER;
                self.pending += 1;
            } else {
                break;
            }
            self.low <<= 1;
            self.high = (self.high << 1) | 1;
        }
    }

    /// Emits a resolved MSB followed by the deferred straddle bits, which
    /// take the complementary value.
    fn emit_resolved(&mut self, bit: u32) {
        self.output.write_bit(bit);
        for _ in 0..self.pending {
            self.output.write_bit(bit ^ 1);
        }
        self.pending = 0;
    }

    /// Number of bits produced so far, excluding unresolved state.
    pub fn len_bits(&self) -> usize {
        self.output.len_bits()
    }

    /// Finishes encoding and returns the packed output bytes.
    ///
    /// Disambiguates the final interval with one more resolved bit plus the
    /// outstanding straddle bits, then pads the last byte with zeros.
    pub fn finish(mut self) -> Vec<u8> {
        self.pending += 1;
        if self.low < QUARTER {
            self.emit_resolved(0);
        } else {
            self.emit_resolved(1);
        }
        self.output.flush();
        self.output.into_bytes()
    }
}

impl Default for ArithmeticEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Arithmetic decoder over a 32-bit interval.
///
/// Mirrors [`ArithmeticEncoder`] step for step: given the same sequence of
/// cumulative tables, it reconstructs the same sequence of symbols.
#[derive(Debug)]
pub struct ArithmeticDecoder<'a> {
    low: u32,
    high: u32,
    /// 32-bit window of the encoded bit stream.
    code: u32,
    input: BitReader<'a>,
}

impl<'a> ArithmeticDecoder<'a> {
    /// Creates a decoder over the encoder's output bytes.
    ///
    /// Seeds the code register with the first 32 bits; short payloads are
    /// topped up with the reader's zero padding.
    pub fn new(payload: &'a [u8]) -> Self {
        let mut input = BitReader::new(payload);
        let code = input.read_bits(32);
        Self {
            low: 0,
            high: u32::MAX,
            code,
            input,
        }
    }

    /// Decodes one symbol against the given cumulative table.
    pub fn decode(&mut self, table: &CumulativeTable) -> usize {
        let total = table.total() as u64;
        debug_assert!(total < QUARTER as u64, "cumulative total too large for coder precision");

        let range = (self.high - self.low) as u64 + 1;
        let scaled = (((self.code - self.low) as u64 + 1) * total - 1) / range;
        let symbol = table.lookup(scaled as u32);

        let (c_lo, c_hi) = table.symbol_range(symbol);
        self.high = self.low + ((range * c_hi as u64) / total - 1) as u32;
        self.low += ((range * c_lo as u64) / total) as u32;

        loop {
            if self.high < HALF {
                // Nothing to subtract; the shift below discards the 0 MSB.
            } else if self.low >= HALF {
                self.low -= HALF;
                self.high -= HALF;
                self.code -= HALF;
            } else if self.low >= QUARTER && self.high < THREE_QUARTERS {
                self.low -= QUARTER;
                self.high -= QUARTER;
                self.code -= QUARTER;
            } else {
                break;
            }
            self.low <<= 1;
            self.high = (self.high << 1) | 1;
            self.code = (self.code << 1) | self.input.read_bit();
        }

        symbol
    }

    /// Current position in the underlying bit stream, for diagnostics.
    pub fn position_bits(&self) -> usize {
        self.input.position_bits()
    }
}
