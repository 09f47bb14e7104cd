//! # Bitnet Shared
//! Common functionality shared between the bitnet server & client crates:
//! the message contract and its concrete kinds, the per-channel outgoing
//! batch, and the types both sides of the wire agree on.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub use bitnet_serde::{
    bits_required, BitReader, BitWriter, FixedBytes, FixedString, FixedString128, FixedString32,
    FixedString512, FixedString64, SerdeErr, MTU_SIZE_BITS, MTU_SIZE_BYTES,
};

mod batch;
mod messages;
mod types;

pub use batch::{Batch, MIN_PACKET_SIZE};
pub use messages::{
    message_id, ChatMessage, ConnectMessage, DisconnectMessage, JoinWorldMessage, JoinedMessage,
    Message, SpawnMessage, TransformMessage, UnspawnMessage,
};
pub use types::{Channel, ConnectionId, NetId, NetworkEntity};
