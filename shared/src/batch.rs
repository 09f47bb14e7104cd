use std::time::{Duration, Instant};

use bitnet_serde::{BitWriter, SerdeErr};

/// Smallest usable batch buffer: 4 bytes of word-flush slack plus one
/// payload byte. Real transports sit far above this.
pub const MIN_PACKET_SIZE: usize = 5;

/// One pending outgoing buffer for a (connection, channel) pair.
///
/// Messages are appended bit-exactly, so consecutive messages share bytes
/// with no filler between them; the buffer is only padded out to a whole
/// byte when it is handed to the transport. `last_send` drives the
/// interval flush: a batch that has not been emptied within the configured
/// batch interval is sent as-is to bound outbound latency.
pub struct Batch {
    writer: BitWriter,
    last_send: Instant,
}

impl Batch {
    /// # Panics
    /// Panics when `max_packet_size < MIN_PACKET_SIZE`.
    pub fn new(max_packet_size: usize, now: Instant) -> Self {
        if max_packet_size < MIN_PACKET_SIZE {
            panic!(
                "batch buffer must be at least {} bytes, got {}",
                MIN_PACKET_SIZE, max_packet_size
            );
        }
        Self {
            writer: BitWriter::with_capacity(max_packet_size),
            last_send: now,
        }
    }

    /// Whether `bits` more bits fit without flushing first.
    pub fn fits(&self, bits: usize) -> bool {
        self.writer.space_bits() >= bits
    }

    pub fn is_empty(&self) -> bool {
        self.writer.bit_position() == 0
    }

    /// Appends the full content of `message` bit-exactly, byte alignment
    /// included. The caller flushes first when [`fits`](Self::fits) says
    /// the message will not fit; failure here means the message cannot fit
    /// even an empty batch.
    pub fn append(&mut self, message: &mut BitWriter) -> Result<(), SerdeErr> {
        let bits = message.bit_position();
        self.writer.write_bytes_bit_size(message.segment(), bits)
    }

    /// The batch content padded to whole bytes, ready for the transport.
    pub fn segment(&mut self) -> &[u8] {
        self.writer.segment()
    }

    /// Empties the batch and restarts the flush interval.
    pub fn clear(&mut self, now: Instant) {
        self.writer.reset();
        self.last_send = now;
    }

    /// Whether the interval flush should emit this batch.
    pub fn due(&self, now: Instant, interval: Duration) -> bool {
        !self.is_empty() && now.duration_since(self.last_send) >= interval
    }

    pub fn last_send(&self) -> Instant {
        self.last_send
    }
}
