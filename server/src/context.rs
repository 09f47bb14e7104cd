use std::collections::HashMap;
use std::hash::Hash;
use std::time::Instant;

use log::warn;

use bitnet_shared::{
    BitWriter, Channel, ConnectionId, Message, NetId, UnspawnMessage,
};

use crate::{connection::Connection, transport::Transport, world::EntityStore};

/// A borrowed view over the server's mutable state, handed to message
/// handlers and lifecycle callbacks.
///
/// Everything a handler may legally do while the server is mid-dispatch
/// goes through here: sending (batched, per channel), authentication,
/// spawning and unspawning entities, disconnecting peers. The context
/// splits the server into disjoint borrows so a handler can send replies
/// while the dispatch that invoked it is still on the stack.
pub struct ServerContext<'a, E: Copy + Eq + Hash> {
    pub(crate) active: bool,
    pub(crate) connections: &'a mut HashMap<ConnectionId, Connection>,
    pub(crate) spawned: &'a mut HashMap<NetId, E>,
    pub(crate) transport: &'a mut dyn Transport,
    pub(crate) send_writer: &'a mut BitWriter,
    pub(crate) store: &'a mut dyn EntityStore<E>,
    pub(crate) now: Instant,
}

impl<E: Copy + Eq + Hash> ServerContext<'_, E> {
    /// The instant this tick started.
    pub fn now(&self) -> Instant {
        self.now
    }

    pub fn is_connected(&self, connection_id: ConnectionId) -> bool {
        self.connections.contains_key(&connection_id)
    }

    pub fn connection(&self, connection_id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&connection_id)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn is_authenticated(&self, connection_id: ConnectionId) -> bool {
        self.connections
            .get(&connection_id)
            .is_some_and(|connection| connection.authenticated)
    }

    /// Flips a connection's authenticated bit. Authentication modules call
    /// this with `false` from their `Connect` handler, then with `true`
    /// once their handshake completes.
    pub fn authenticate(&mut self, connection_id: ConnectionId, value: bool) -> bool {
        match self.connections.get_mut(&connection_id) {
            Some(connection) => {
                connection.authenticated = value;
                true
            }
            None => false,
        }
    }

    pub fn address(&self, connection_id: ConnectionId) -> Option<String> {
        self.transport.address(connection_id)
    }

    /// Requests a transport-level disconnect. The connection is removed
    /// once the transport confirms.
    pub fn disconnect(&mut self, connection_id: ConnectionId) {
        self.transport.disconnect(connection_id);
    }

    /// Serializes `message` and appends it to the connection's batch for
    /// `channel`, flushing the batch first when the message would not fit.
    ///
    /// Returns false and drops the message when the connection is unknown
    /// or broken, or when the message does not fit the send buffer (a
    /// developer error, logged, never punished with a disconnect). A
    /// transport refusal while flushing marks the connection broken and
    /// requests a disconnect.
    pub fn send<M: Message>(
        &mut self,
        connection_id: ConnectionId,
        message: &M,
        channel: Channel,
    ) -> bool {
        if !self.active {
            warn!("send: server is not active");
            return false;
        }
        let Some(connection) = self.connections.get_mut(&connection_id) else {
            warn!("send: unknown connection {}", connection_id);
            return false;
        };
        if connection.is_broken() {
            return false;
        }

        self.send_writer.reset();
        let mut serialized = self.send_writer.write_u8_bits(M::ID, 8);
        if serialized.is_ok() {
            serialized = message.serialize(self.send_writer);
        }
        if serialized.is_err() {
            warn!(
                "send: message 0x{:02x} does not fit the send buffer; dropping",
                M::ID
            );
            return false;
        }

        let bits = self.send_writer.bit_position();
        let max_packet_size = self.transport.max_packet_size();
        let batch = connection.batch_mut(channel, max_packet_size, self.now);

        if !batch.fits(bits) && !batch.is_empty() {
            if !self.transport.send(connection_id, batch.segment(), channel) {
                warn!(
                    "send: transport refused a packet for connection {}; disconnecting",
                    connection_id
                );
                connection.mark_broken();
                self.transport.disconnect(connection_id);
                return false;
            }
            batch.clear(self.now);
        }

        if batch.append(self.send_writer).is_err() {
            warn!(
                "send: message 0x{:02x} is larger than a whole batch; disconnecting {}",
                M::ID,
                connection_id
            );
            connection.mark_broken();
            self.transport.disconnect(connection_id);
            return false;
        }
        true
    }

    /// Sends a batch of messages in order. Stops early when an append
    /// broke the connection; individual serialization failures are dropped
    /// and the rest still go out. Returns how many messages were queued.
    pub fn send_many<M: Message>(
        &mut self,
        connection_id: ConnectionId,
        messages: &[M],
        channel: Channel,
    ) -> usize {
        let mut sent = 0;
        for message in messages {
            if self.send(connection_id, message, channel) {
                sent += 1;
                continue;
            }
            let unusable = self
                .connections
                .get(&connection_id)
                .map_or(true, |connection| connection.is_broken());
            if unusable {
                break;
            }
        }
        sent
    }

    // Spawn bookkeeping

    /// Gives `entity` a network identity derived from the store's unique
    /// id and records it as spawned, owned by `owner` when given.
    pub fn spawn(&mut self, entity: E, owner: Option<ConnectionId>) -> bool {
        if !self.active {
            warn!("spawn: server is not active");
            return false;
        }
        if self.store.network_entity(entity).is_none() {
            warn!("spawn: entity has no NetworkEntity component");
            return false;
        }
        let net_id = self.store.unique_id(entity);
        if net_id == 0 {
            warn!("spawn: the store returned the reserved unique id 0");
            return false;
        }
        if self.spawned.contains_key(&net_id) {
            warn!("spawn: net id {} is already spawned", net_id);
            return false;
        }
        if let Some(owner_id) = owner {
            if !self.connections.contains_key(&owner_id) {
                warn!("spawn: owner connection {} does not exist", owner_id);
                return false;
            }
        }

        let Some(network_entity) = self.store.network_entity_mut(entity) else {
            return false;
        };
        network_entity.net_id = net_id;
        network_entity.owner = owner;

        self.spawned.insert(net_id, entity);
        if let Some(owner_id) = owner {
            if let Some(connection) = self.connections.get_mut(&owner_id) {
                connection.owned_entities.insert(net_id);
            }
        }
        true
    }

    /// Clears an entity's network identity and tells every observer that
    /// still has a live connection to tear it down.
    pub fn unspawn(&mut self, entity: E) -> bool {
        let Some(network_entity) = self.store.network_entity(entity) else {
            warn!("unspawn: entity has no NetworkEntity component");
            return false;
        };
        let net_id = network_entity.net_id;
        if net_id == 0 || !self.spawned.contains_key(&net_id) {
            warn!("unspawn: entity is not spawned");
            return false;
        }

        // Observers are notified while the entity is still spawned, so
        // interest management sees a consistent world.
        let observers: Vec<ConnectionId> = self.store.observers(entity).to_vec();
        let message = UnspawnMessage { net_id };
        for observer in observers {
            if self.connections.contains_key(&observer) {
                self.send(observer, &message, Channel::Reliable);
            }
        }

        let Some(network_entity) = self.store.network_entity_mut(entity) else {
            return false;
        };
        network_entity.net_id = 0;
        let owner = network_entity.owner.take();

        self.spawned.remove(&net_id);
        if let Some(owner_id) = owner {
            if let Some(connection) = self.connections.get_mut(&owner_id) {
                connection.owned_entities.remove(&net_id);
            }
        }
        true
    }

    /// Unspawns (when spawned) and then destroys the entity in the store.
    pub fn destroy(&mut self, entity: E) {
        if self.store.network_entity(entity).is_some_and(|n| n.is_spawned()) {
            self.unspawn(entity);
        }
        self.store.destroy(entity);
    }

    /// Spawns `entity` owned by `connection_id` and marks the connection
    /// as having joined the world.
    pub fn join_world(&mut self, connection_id: ConnectionId, entity: E) -> bool {
        if !self.connections.contains_key(&connection_id) {
            warn!("join_world: unknown connection {}", connection_id);
            return false;
        }
        if !self.spawn(entity, Some(connection_id)) {
            return false;
        }
        if let Some(connection) = self.connections.get_mut(&connection_id) {
            connection.joined_world = true;
        }
        true
    }
}
