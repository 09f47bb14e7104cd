mod message;
mod spawn;
mod system;
mod transform;
mod world;

pub use message::Message;
pub use spawn::{SpawnMessage, UnspawnMessage};
pub use system::{ConnectMessage, DisconnectMessage, JoinedMessage};
pub use transform::TransformMessage;
pub use world::{ChatMessage, JoinWorldMessage};

/// The protocol's message-id registry.
///
/// Ids `0x00` and `0x40..=0xFF` belong to the application. Everything else
/// below `0x40` is reserved: the ids listed here are taken, and
/// `0x03..=0x21`, `0x24`, `0x26..=0x30`, `0x34..=0x3F` are held back for
/// future protocol use.
pub mod message_id {
    pub const CONNECT: u8 = 0x01;
    pub const DISCONNECT: u8 = 0x02;
    pub const SPAWN: u8 = 0x22;
    pub const UNSPAWN: u8 = 0x23;
    pub const TRANSFORM: u8 = 0x25;
    pub const JOIN_WORLD: u8 = 0x31;
    pub const JOINED: u8 = 0x32;
    pub const CHAT: u8 = 0x33;
}
