use bitnet_serde::{BitReader, BitWriter, SerdeErr};

/// A typed network message.
///
/// On the wire a message is `<id: 8 bits><payload>`; the id is written by
/// the send path and consumed by the dispatcher before `deserialize` runs,
/// so implementations only handle their own payload. The payload must
/// self-delimit: serialize and deserialize are exact inverses.
///
/// Ids are stable per message kind and registered in
/// [`message_id`](super::message_id).
pub trait Message: Default {
    /// The message's protocol id.
    const ID: u8;

    fn serialize(&self, writer: &mut BitWriter) -> Result<(), SerdeErr>;

    fn deserialize(&mut self, reader: &mut BitReader) -> Result<(), SerdeErr>;
}
