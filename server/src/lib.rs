//! # Bitnet Server
//! The authoritative server core: typed message dispatch with an
//! authentication gate, per-(connection, channel) outgoing batches with
//! interval flushing, and the connection/spawn lifecycle, all driven by a
//! single cooperative tick.
//!
//! Transports (KCP, TCP, the in-memory loopback) plug in behind
//! [`transport::Transport`]; the game's entity world stays behind
//! [`EntityStore`].

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod transport;
pub mod shared {
    pub use bitnet_shared::{
        bits_required, message_id, Batch, BitReader, BitWriter, Channel, ChatMessage,
        ConnectMessage, ConnectionId, DisconnectMessage, FixedBytes, FixedString, FixedString128,
        FixedString32, FixedString512, FixedString64, JoinWorldMessage, JoinedMessage, Message,
        NetId, NetworkEntity, SerdeErr, SpawnMessage, TransformMessage, UnspawnMessage,
        MIN_PACKET_SIZE, MTU_SIZE_BITS, MTU_SIZE_BYTES,
    };
}

mod connection;
mod context;
mod error;
mod handlers;
mod server;
mod server_config;
mod world;

pub use connection::Connection;
pub use context::ServerContext;
pub use error::ServerError;
pub use handlers::MessageHandlers;
pub use server::{Server, ServerState};
pub use server_config::ServerConfig;
pub use world::EntityStore;
