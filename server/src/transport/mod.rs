//! The transport contract and the in-memory loopback implementation.
//!
//! A transport owns the sockets; the server owns the protocol. Transports
//! deliver their events through [`Transport::poll_event`] on the server's
//! thread when [`Server::tick`](crate::Server::tick) drains them, so the
//! whole stack stays single-threaded and lock-free.

mod memory;

pub use memory::MemoryTransport;

use bitnet_shared::{Channel, ConnectionId};

/// An event surfaced by the transport to the server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    Connected(ConnectionId),
    Data(ConnectionId, Vec<u8>),
    Disconnected(ConnectionId),
}

/// The interface every concrete transport (KCP, TCP, in-memory) offers
/// the server.
pub trait Transport {
    fn start(&mut self);

    fn stop(&mut self);

    fn is_active(&self) -> bool;

    /// Hands one packet to the transport. Returns false when the send was
    /// refused; the server marks the connection broken and requests a
    /// disconnect, it never retries.
    fn send(&mut self, connection_id: ConnectionId, payload: &[u8], channel: Channel) -> bool;

    /// Requests a disconnect. The transport confirms with a
    /// [`TransportEvent::Disconnected`] once the connection is gone.
    fn disconnect(&mut self, connection_id: ConnectionId);

    /// Largest payload `send` accepts, in bytes. Batch buffers are sized
    /// to this.
    fn max_packet_size(&self) -> usize;

    /// Human-readable remote address, when the connection exists.
    fn address(&self, connection_id: ConnectionId) -> Option<String>;

    /// Drives internal transport IO. Called once per server tick, before
    /// events are drained.
    fn tick(&mut self);

    /// Pops the next pending event, if any.
    fn poll_event(&mut self) -> Option<TransportEvent>;
}
