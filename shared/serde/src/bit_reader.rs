use crate::{
    error::SerdeErr,
    range::{bits_required, scale_to_i32, scale_to_i64},
};

/// Reads bit-packed values back out of a borrowed byte slice.
///
/// The exact mirror of [`BitWriter`](crate::BitWriter): bits are refilled
/// into a 64-bit scratch word from little-endian 32-bit buffer words, with
/// the final 1-3 byte tail handled without reading past the end of the
/// slice. Every failed read leaves the reader exactly where it was.
pub struct BitReader<'b> {
    buffer: &'b [u8],
    scratch: u64,
    scratch_bits: u32,
    word_index: usize,
}

/// Cursor snapshot used to commit multi-part reads atomically.
#[derive(Clone, Copy)]
pub(crate) struct ReaderState {
    scratch: u64,
    scratch_bits: u32,
    word_index: usize,
}

impl<'b> BitReader<'b> {
    pub fn new(buffer: &'b [u8]) -> Self {
        Self {
            buffer,
            scratch: 0,
            scratch_bits: 0,
            word_index: 0,
        }
    }

    /// Total bits consumed so far.
    pub fn bit_position(&self) -> usize {
        self.word_index * 8 - self.scratch_bits as usize
    }

    /// Bits still available, counting both the scratch word and the
    /// unread buffer tail.
    pub fn remaining_bits(&self) -> usize {
        self.scratch_bits as usize + (self.buffer.len() - self.word_index) * 8
    }

    pub(crate) fn state(&self) -> ReaderState {
        ReaderState {
            scratch: self.scratch,
            scratch_bits: self.scratch_bits,
            word_index: self.word_index,
        }
    }

    pub(crate) fn restore(&mut self, state: ReaderState) {
        self.scratch = state.scratch;
        self.scratch_bits = state.scratch_bits;
        self.word_index = state.word_index;
    }

    // Remaining bits have been checked by the caller; cannot fail.
    fn take_bits(&mut self, bits: u32) -> u32 {
        if bits == 0 {
            return 0;
        }
        while self.scratch_bits < bits {
            let available = self.buffer.len() - self.word_index;
            let copy = available.min(4);
            let mut word = [0u8; 4];
            word[..copy].copy_from_slice(&self.buffer[self.word_index..self.word_index + copy]);
            self.scratch |= (u32::from_le_bytes(word) as u64) << self.scratch_bits;
            self.scratch_bits += copy as u32 * 8;
            self.word_index += copy;
        }
        let mask = u32::MAX >> (32 - bits);
        let value = (self.scratch as u32) & mask;
        self.scratch >>= bits;
        self.scratch_bits -= bits;
        value
    }

    /// Reads `bits` bits as a `u32`. `bits == 0` succeeds and yields 0.
    ///
    /// # Panics
    /// Panics when `bits > 32`.
    pub fn read_u32_bits(&mut self, bits: u32) -> Result<u32, SerdeErr> {
        if bits > 32 {
            panic!("read_u32_bits: bit count {} exceeds 32", bits);
        }
        if self.remaining_bits() < bits as usize {
            return Err(SerdeErr);
        }
        Ok(self.take_bits(bits))
    }

    /// Reads `bits` bits as a `u64`, combining two 32-bit halves.
    ///
    /// # Panics
    /// Panics when `bits > 64`.
    pub fn read_u64_bits(&mut self, bits: u32) -> Result<u64, SerdeErr> {
        if bits > 64 {
            panic!("read_u64_bits: bit count {} exceeds 64", bits);
        }
        if self.remaining_bits() < bits as usize {
            return Err(SerdeErr);
        }
        let lower = self.take_bits(bits.min(32)) as u64;
        let upper = self.take_bits(bits.saturating_sub(32)) as u64;
        Ok((upper << 32) | lower)
    }

    /// # Panics
    /// Panics when `bits > 16`.
    pub fn read_u16_bits(&mut self, bits: u32) -> Result<u16, SerdeErr> {
        if bits > 16 {
            panic!("read_u16_bits: bit count {} exceeds 16", bits);
        }
        Ok(self.read_u32_bits(bits)? as u16)
    }

    /// # Panics
    /// Panics when `bits > 8`.
    pub fn read_u8_bits(&mut self, bits: u32) -> Result<u8, SerdeErr> {
        if bits > 8 {
            panic!("read_u8_bits: bit count {} exceeds 8", bits);
        }
        Ok(self.read_u32_bits(bits)? as u8)
    }

    pub fn read_bool(&mut self) -> Result<bool, SerdeErr> {
        Ok(self.read_u32_bits(1)? != 0)
    }

    // Range-encoded integers. A malformed encoding beyond the declared
    // span clamps to `max` rather than escaping the range.

    /// # Panics
    /// Panics when `min > max`.
    pub fn read_u64_ranged(&mut self, min: u64, max: u64) -> Result<u64, SerdeErr> {
        if min > max {
            panic!("ranged read: min ({}) is greater than max ({})", min, max);
        }
        let relative = self.read_u64_bits(bits_required(min, max))?;
        Ok(min + relative.min(max - min))
    }

    /// # Panics
    /// Panics when `min > max`.
    pub fn read_u32_ranged(&mut self, min: u32, max: u32) -> Result<u32, SerdeErr> {
        Ok(self.read_u64_ranged(min as u64, max as u64)? as u32)
    }

    /// # Panics
    /// Panics when `min > max`.
    pub fn read_u16_ranged(&mut self, min: u16, max: u16) -> Result<u16, SerdeErr> {
        Ok(self.read_u64_ranged(min as u64, max as u64)? as u16)
    }

    /// # Panics
    /// Panics when `min > max`.
    pub fn read_u8_ranged(&mut self, min: u8, max: u8) -> Result<u8, SerdeErr> {
        Ok(self.read_u64_ranged(min as u64, max as u64)? as u8)
    }

    /// # Panics
    /// Panics when `min > max`.
    pub fn read_i64_ranged(&mut self, min: i64, max: i64) -> Result<i64, SerdeErr> {
        if min > max {
            panic!("ranged read: min ({}) is greater than max ({})", min, max);
        }
        let span = (max as i128 - min as i128) as u64;
        let relative = self.read_u64_bits(bits_required(0, span))?;
        Ok((min as i128 + relative.min(span) as i128) as i64)
    }

    /// # Panics
    /// Panics when `min > max`.
    pub fn read_i32_ranged(&mut self, min: i32, max: i32) -> Result<i32, SerdeErr> {
        Ok(self.read_i64_ranged(min as i64, max as i64)? as i32)
    }

    /// # Panics
    /// Panics when `min > max`.
    pub fn read_i16_ranged(&mut self, min: i16, max: i16) -> Result<i16, SerdeErr> {
        Ok(self.read_i64_ranged(min as i64, max as i64)? as i16)
    }

    /// # Panics
    /// Panics when `min > max`.
    pub fn read_i8_ranged(&mut self, min: i8, max: i8) -> Result<i8, SerdeErr> {
        Ok(self.read_i64_ranged(min as i64, max as i64)? as i8)
    }

    // Floating point

    pub fn read_f32(&mut self) -> Result<f32, SerdeErr> {
        Ok(f32::from_bits(self.read_u32_bits(32)?))
    }

    pub fn read_f64(&mut self) -> Result<f64, SerdeErr> {
        Ok(f64::from_bits(self.read_u64_bits(64)?))
    }

    /// Reads a value quantized by [`write_f32_ranged`]. The result is
    /// within `precision` of the written value.
    ///
    /// [`write_f32_ranged`]: crate::BitWriter::write_f32_ranged
    ///
    /// # Panics
    /// Panics when `precision` is not positive or `min > max`.
    pub fn read_f32_ranged(&mut self, min: f32, max: f32, precision: f32) -> Result<f32, SerdeErr> {
        if !(precision > 0.0) {
            panic!("ranged float read: precision must be positive, got {}", precision);
        }
        if min > max {
            panic!("ranged float read: min ({}) is greater than max ({})", min, max);
        }
        let scaled_min = scale_to_i32(min as f64, precision as f64)?;
        let scaled_max = scale_to_i32(max as f64, precision as f64)?;
        let scaled = self.read_i32_ranged(scaled_min, scaled_max)?;
        Ok((scaled as f64 * precision as f64) as f32)
    }

    /// # Panics
    /// Panics when `precision` is not positive or `min > max`.
    pub fn read_f64_ranged(&mut self, min: f64, max: f64, precision: f64) -> Result<f64, SerdeErr> {
        if !(precision > 0.0) {
            panic!("ranged float read: precision must be positive, got {}", precision);
        }
        if min > max {
            panic!("ranged float read: min ({}) is greater than max ({})", min, max);
        }
        let scaled_min = scale_to_i64(min, precision)?;
        let scaled_max = scale_to_i64(max, precision)?;
        let scaled = self.read_i64_ranged(scaled_min, scaled_max)?;
        Ok(scaled as f64 * precision)
    }

    // Byte blobs

    /// Fills `out` with the next `out.len()` bytes.
    pub fn read_bytes(&mut self, out: &mut [u8]) -> Result<(), SerdeErr> {
        if self.remaining_bits() < out.len() * 8 {
            return Err(SerdeErr);
        }
        for byte in out.iter_mut() {
            *byte = self.take_bits(8) as u8;
        }
        Ok(())
    }

    /// Reads exactly `size_in_bits` bits into `out`: full bytes first,
    /// then the final partial byte into the low bits of the last slot.
    ///
    /// # Panics
    /// Panics when `out` is shorter than `size_in_bits` claims.
    pub fn read_bytes_bit_size(
        &mut self,
        out: &mut [u8],
        size_in_bits: usize,
    ) -> Result<(), SerdeErr> {
        let full_bytes = size_in_bits / 8;
        let tail_bits = (size_in_bits % 8) as u32;
        let needed = full_bytes + usize::from(tail_bits > 0);
        if out.len() < needed {
            panic!(
                "read_bytes_bit_size: {} bits requested but destination holds {} bytes",
                size_in_bits,
                out.len()
            );
        }
        if self.remaining_bits() < size_in_bits {
            return Err(SerdeErr);
        }
        for byte in out[..full_bytes].iter_mut() {
            *byte = self.take_bits(8) as u8;
        }
        if tail_bits > 0 {
            out[full_bytes] = self.take_bits(tail_bits) as u8;
        }
        Ok(())
    }
}
