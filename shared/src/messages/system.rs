use bitnet_serde::{BitReader, BitWriter, SerdeErr};

use super::{message::Message, message_id};

/// Synthetic message dispatched when a connection is admitted. Never sent
/// over the wire; the server fabricates the one-byte frame itself so that
/// connection bookkeeping flows through the ordinary handler path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectMessage;

impl Message for ConnectMessage {
    const ID: u8 = message_id::CONNECT;

    fn serialize(&self, _writer: &mut BitWriter) -> Result<(), SerdeErr> {
        Ok(())
    }

    fn deserialize(&mut self, _reader: &mut BitReader) -> Result<(), SerdeErr> {
        Ok(())
    }
}

/// Synthetic counterpart of [`ConnectMessage`], dispatched right before a
/// connection is removed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisconnectMessage;

impl Message for DisconnectMessage {
    const ID: u8 = message_id::DISCONNECT;

    fn serialize(&self, _writer: &mut BitWriter) -> Result<(), SerdeErr> {
        Ok(())
    }

    fn deserialize(&mut self, _reader: &mut BitReader) -> Result<(), SerdeErr> {
        Ok(())
    }
}

/// Tells a client its join-world request has completed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JoinedMessage;

impl Message for JoinedMessage {
    const ID: u8 = message_id::JOINED;

    fn serialize(&self, _writer: &mut BitWriter) -> Result<(), SerdeErr> {
        Ok(())
    }

    fn deserialize(&mut self, _reader: &mut BitReader) -> Result<(), SerdeErr> {
        Ok(())
    }
}
