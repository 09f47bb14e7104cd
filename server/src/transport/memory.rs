use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use bitnet_shared::{Channel, ConnectionId, MTU_SIZE_BYTES};

use super::{Transport, TransportEvent};

/// A queue-backed loopback transport for tests and local demos.
///
/// The "network" side is driven by hand: tests push connects, datagrams,
/// and disconnects, then tick the server to drain them. Everything the
/// server sends is recorded per (connection, channel) so assertions can
/// inspect the exact wire bytes.
pub struct MemoryTransport {
    active: bool,
    max_packet_size: usize,
    events: VecDeque<TransportEvent>,
    sent: HashMap<(ConnectionId, Channel), Vec<Vec<u8>>>,
    disconnect_requests: Vec<ConnectionId>,
    failing: HashSet<ConnectionId>,
    addresses: HashMap<ConnectionId, String>,
}

impl MemoryTransport {
    pub fn new(max_packet_size: usize) -> Self {
        Self {
            active: false,
            max_packet_size,
            events: VecDeque::new(),
            sent: HashMap::new(),
            disconnect_requests: Vec::new(),
            failing: HashSet::new(),
            addresses: HashMap::new(),
        }
    }

    pub fn with_default_packet_size() -> Self {
        Self::new(MTU_SIZE_BYTES)
    }

    // Network-side injection, used by tests to play the remote peer.

    pub fn connect(&mut self, connection_id: ConnectionId) {
        self.events.push_back(TransportEvent::Connected(connection_id));
    }

    pub fn deliver(&mut self, connection_id: ConnectionId, payload: &[u8]) {
        self.events
            .push_back(TransportEvent::Data(connection_id, payload.to_vec()));
    }

    pub fn drop_connection(&mut self, connection_id: ConnectionId) {
        self.events
            .push_back(TransportEvent::Disconnected(connection_id));
    }

    pub fn set_address(&mut self, connection_id: ConnectionId, address: &str) {
        self.addresses.insert(connection_id, address.to_owned());
    }

    /// Makes every future send to `connection_id` fail, simulating a dead
    /// link.
    pub fn fail_sends_to(&mut self, connection_id: ConnectionId) {
        self.failing.insert(connection_id);
    }

    // Inspection

    pub fn sent_packets(&self, connection_id: ConnectionId, channel: Channel) -> &[Vec<u8>] {
        self.sent
            .get(&(connection_id, channel))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn total_sent(&self, connection_id: ConnectionId) -> usize {
        self.sent
            .iter()
            .filter(|((id, _), _)| *id == connection_id)
            .map(|(_, packets)| packets.len())
            .sum()
    }

    pub fn disconnect_requests(&self) -> &[ConnectionId] {
        &self.disconnect_requests
    }
}

impl Transport for MemoryTransport {
    fn start(&mut self) {
        self.active = true;
    }

    fn stop(&mut self) {
        self.active = false;
        self.events.clear();
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn send(&mut self, connection_id: ConnectionId, payload: &[u8], channel: Channel) -> bool {
        if !self.active || self.failing.contains(&connection_id) {
            return false;
        }
        self.sent
            .entry((connection_id, channel))
            .or_default()
            .push(payload.to_vec());
        true
    }

    fn disconnect(&mut self, connection_id: ConnectionId) {
        self.disconnect_requests.push(connection_id);
        // the loopback "network" confirms immediately, on the next drain
        self.events
            .push_back(TransportEvent::Disconnected(connection_id));
    }

    fn max_packet_size(&self) -> usize {
        self.max_packet_size
    }

    fn address(&self, connection_id: ConnectionId) -> Option<String> {
        self.addresses.get(&connection_id).cloned()
    }

    fn tick(&mut self) {
        // queue-driven; nothing to poll
    }

    fn poll_event(&mut self) -> Option<TransportEvent> {
        self.events.pop_front()
    }
}

// A shared handle doubles as the transport itself, so a test can hand the
// server one end and keep the other for injecting events and inspecting
// sent packets. Single-threaded by design, like the rest of the stack.
impl Transport for Rc<RefCell<MemoryTransport>> {
    fn start(&mut self) {
        self.borrow_mut().start()
    }

    fn stop(&mut self) {
        self.borrow_mut().stop()
    }

    fn is_active(&self) -> bool {
        self.borrow().is_active()
    }

    fn send(&mut self, connection_id: ConnectionId, payload: &[u8], channel: Channel) -> bool {
        self.borrow_mut().send(connection_id, payload, channel)
    }

    fn disconnect(&mut self, connection_id: ConnectionId) {
        self.borrow_mut().disconnect(connection_id)
    }

    fn max_packet_size(&self) -> usize {
        self.borrow().max_packet_size()
    }

    fn address(&self, connection_id: ConnectionId) -> Option<String> {
        self.borrow().address(connection_id)
    }

    fn tick(&mut self) {
        self.borrow_mut().tick()
    }

    fn poll_event(&mut self) -> Option<TransportEvent> {
        self.borrow_mut().poll_event()
    }
}

#[cfg(test)]
mod tests {
    use bitnet_shared::Channel;

    use super::{MemoryTransport, Transport, TransportEvent};

    #[test]
    fn records_sends_per_connection_and_channel() {
        let mut transport = MemoryTransport::new(64);
        transport.start();

        assert!(transport.send(1, b"abc", Channel::Reliable));
        assert!(transport.send(1, b"def", Channel::Unreliable));
        assert!(transport.send(2, b"ghi", Channel::Reliable));

        assert_eq!(transport.sent_packets(1, Channel::Reliable), &[b"abc".to_vec()]);
        assert_eq!(transport.sent_packets(1, Channel::Unreliable), &[b"def".to_vec()]);
        assert_eq!(transport.total_sent(1), 2);
    }

    #[test]
    fn inactive_or_failing_sends_are_refused() {
        let mut transport = MemoryTransport::new(64);
        assert!(!transport.send(1, b"abc", Channel::Reliable));

        transport.start();
        transport.fail_sends_to(7);
        assert!(!transport.send(7, b"abc", Channel::Reliable));
        assert!(transport.send(8, b"abc", Channel::Reliable));
    }

    #[test]
    fn disconnect_surfaces_an_event() {
        let mut transport = MemoryTransport::new(64);
        transport.start();
        transport.disconnect(3);

        assert_eq!(transport.disconnect_requests(), &[3]);
        assert_eq!(
            transport.poll_event(),
            Some(TransportEvent::Disconnected(3))
        );
        assert_eq!(transport.poll_event(), None);
    }
}
