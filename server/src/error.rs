use thiserror::Error;

use bitnet_shared::MIN_PACKET_SIZE;

/// Errors surfaced by server lifecycle and handler registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServerError {
    /// The server was started twice without stopping in between
    #[error("Server is already active")]
    AlreadyActive,

    /// A lifecycle operation needs an active server
    #[error("Server is not active")]
    NotActive,

    /// Handler registration refused an overwrite
    #[error("A handler is already registered for message id 0x{id:02x}. Remove it with off() first or pick a different id")]
    HandlerAlreadyRegistered { id: u8 },

    /// The transport's packet size cannot hold even one batch
    #[error("Transport packet size of {size} bytes is too small; the batch writer needs at least {} bytes", MIN_PACKET_SIZE)]
    PacketSizeTooSmall { size: usize },
}
