use std::fmt;

use crate::{bit_reader::BitReader, bit_writer::BitWriter, error::SerdeErr};

/// A fixed-length inline byte blob, written verbatim with no framing.
///
/// One generic type covers every blob size the protocol uses (prefab ids
/// are `FixedBytes<16>`); the length is part of the type, so the wire
/// carries exactly `N` bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct FixedBytes<const N: usize>([u8; N]);

impl<const N: usize> FixedBytes<N> {
    pub fn new(bytes: [u8; N]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; N] {
        &self.0
    }

    pub fn ser(&self, writer: &mut BitWriter) -> Result<(), SerdeErr> {
        writer.write_bytes(&self.0)
    }

    pub fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let mut bytes = [0u8; N];
        reader.read_bytes(&mut bytes)?;
        Ok(Self(bytes))
    }
}

impl<const N: usize> Default for FixedBytes<N> {
    fn default() -> Self {
        Self([0; N])
    }
}

impl<const N: usize> From<[u8; N]> for FixedBytes<N> {
    fn from(bytes: [u8; N]) -> Self {
        Self(bytes)
    }
}

/// An inline UTF-8 string with a 16-bit length prefix and `N - 3` bytes of
/// content capacity (two length bytes plus one reserved byte are part of
/// the type's footprint on the wire contract).
///
/// The wire format is `<len: 16 bits><content: len bytes>`. Deserialization
/// reads the length first, validates capacity and remaining payload, and
/// only then commits; a short or malformed payload leaves the reader where
/// it started.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct FixedString<const N: usize> {
    value: String,
}

impl<const N: usize> FixedString<N> {
    /// Maximum content length in bytes.
    pub const CAPACITY: usize = N - 3;

    /// Wraps `value`, or fails when its UTF-8 length exceeds the capacity.
    pub fn new(value: &str) -> Result<Self, SerdeErr> {
        if value.len() > Self::CAPACITY {
            return Err(SerdeErr);
        }
        Ok(Self {
            value: value.to_owned(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn ser(&self, writer: &mut BitWriter) -> Result<(), SerdeErr> {
        let len = self.value.len();
        if writer.space_bits() < 16 + len * 8 {
            return Err(SerdeErr);
        }
        writer.write_u16_bits(len as u16, 16)?;
        writer.write_bytes(self.value.as_bytes())
    }

    pub fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let start = reader.state();
        let len = reader.read_u16_bits(16)? as usize;
        if len > Self::CAPACITY || reader.remaining_bits() < len * 8 {
            reader.restore(start);
            return Err(SerdeErr);
        }
        let mut bytes = vec![0u8; len];
        reader.read_bytes(&mut bytes)?;
        match String::from_utf8(bytes) {
            Ok(value) => Ok(Self { value }),
            Err(_) => {
                reader.restore(start);
                Err(SerdeErr)
            }
        }
    }
}

impl<const N: usize> fmt::Display for FixedString<N> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// 29 content bytes.
pub type FixedString32 = FixedString<32>;
/// 61 content bytes.
pub type FixedString64 = FixedString<64>;
/// 125 content bytes.
pub type FixedString128 = FixedString<128>;
/// 509 content bytes.
pub type FixedString512 = FixedString<512>;
