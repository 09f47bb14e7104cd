use bitnet_serde::{BitReader, BitWriter, FixedBytes, FixedString128, FixedString32, SerdeErr};

use super::{message::Message, message_id};

/// A client's request to enter the world with the given player prefab.
/// The server answers by spawning the prefab owned by the requester and
/// replying with [`JoinedMessage`](super::JoinedMessage).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JoinWorldMessage {
    pub prefab_id: FixedBytes<16>,
}

impl Message for JoinWorldMessage {
    const ID: u8 = message_id::JOIN_WORLD;

    fn serialize(&self, writer: &mut BitWriter) -> Result<(), SerdeErr> {
        self.prefab_id.ser(writer)
    }

    fn deserialize(&mut self, reader: &mut BitReader) -> Result<(), SerdeErr> {
        self.prefab_id = FixedBytes::de(reader)?;
        Ok(())
    }
}

/// A chat line: short sender name, bounded text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: FixedString32,
    pub text: FixedString128,
}

impl Message for ChatMessage {
    const ID: u8 = message_id::CHAT;

    fn serialize(&self, writer: &mut BitWriter) -> Result<(), SerdeErr> {
        self.sender.ser(writer)?;
        self.text.ser(writer)
    }

    fn deserialize(&mut self, reader: &mut BitReader) -> Result<(), SerdeErr> {
        self.sender = FixedString32::de(reader)?;
        self.text = FixedString128::de(reader)?;
        Ok(())
    }
}
