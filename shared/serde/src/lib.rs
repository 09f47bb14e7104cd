//! # Bitnet Serde
//! Bit-packed, atomic, range-compressed serialization shared between the
//! bitnet server & client crates.
//!
//! Values are packed with no padding between them: integers take exactly
//! `bits_required(min, max)` bits, floats can be quantized to a declared
//! precision, and rotations compress to 32 bits via smallest-three. Both
//! sides work in little-endian 32-bit words, so the wire bytes are the
//! same on every host.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod bit_reader;
mod bit_writer;
mod error;
mod fixed;
mod quaternion;
mod range;

pub use bit_reader::BitReader;
pub use bit_writer::BitWriter;
pub use error::SerdeErr;
pub use fixed::{
    FixedBytes, FixedString, FixedString128, FixedString32, FixedString512, FixedString64,
};
pub use range::bits_required;

/// Default buffer size for a [`BitWriter`], chosen to keep one packet
/// under a conservative UDP MTU.
pub const MTU_SIZE_BYTES: usize = 508;
/// [`MTU_SIZE_BYTES`] in bits.
pub const MTU_SIZE_BITS: usize = MTU_SIZE_BYTES * 8;
