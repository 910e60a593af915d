//! Entropy coding: bit streams, probability quantization, arithmetic coder.
//!
//! The pieces compose bottom-up: [`BitWriter`]/[`BitReader`] move raw bits,
//! [`CumulativeTable`] turns a model's probability vector into integer
//! sub-ranges, and [`ArithmeticEncoder`]/[`ArithmeticDecoder`] narrow a
//! shared 32-bit interval one symbol at a time. Everything here is pure,
//! synchronous compute with no shared state; one coder and one bit stream
//! exist per in-flight chunk.

pub mod arith;
pub mod bitstream;
pub mod quantize;

pub use arith::{ArithmeticDecoder, ArithmeticEncoder};
pub use bitstream::{BitReader, BitWriter};
pub use quantize::{CumulativeTable, PROB_SCALE, PROB_SCALE_BITS};
