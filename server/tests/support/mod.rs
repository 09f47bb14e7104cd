//! Shared fixtures for the server integration tests: a HashMap-backed
//! entity store and a server wired to a shared in-memory transport handle.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use bitnet_server::shared::{BitWriter, ConnectionId, FixedBytes, Message, NetworkEntity};
use bitnet_server::transport::MemoryTransport;
use bitnet_server::{EntityStore, Server, ServerConfig};

/// Test entities are plain ids; the store treats the id as the unique id.
pub type Entity = u64;

#[derive(Default)]
pub struct TestStore {
    pub entities: HashMap<Entity, NetworkEntity>,
    pub observers: HashMap<Entity, Vec<ConnectionId>>,
    pub destroyed: Vec<Entity>,
    pub rebuild_count: usize,
}

impl TestStore {
    pub fn add_entity(&mut self, entity: Entity) {
        self.entities
            .insert(entity, NetworkEntity::new(FixedBytes::new([0xAB; 16])));
    }

    pub fn observe(&mut self, entity: Entity, connection_id: ConnectionId) {
        self.observers.entry(entity).or_default().push(connection_id);
    }
}

impl EntityStore<Entity> for TestStore {
    fn unique_id(&self, entity: Entity) -> u64 {
        entity
    }

    fn network_entity(&self, entity: Entity) -> Option<&NetworkEntity> {
        self.entities.get(&entity)
    }

    fn network_entity_mut(&mut self, entity: Entity) -> Option<&mut NetworkEntity> {
        self.entities.get_mut(&entity)
    }

    fn observers(&self, entity: Entity) -> &[ConnectionId] {
        self.observers
            .get(&entity)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn destroy(&mut self, entity: Entity) {
        self.entities.remove(&entity);
        self.destroyed.push(entity);
    }

    fn rebuild_observers(&mut self) {
        self.rebuild_count += 1;
    }
}

pub type SharedTransport = Rc<RefCell<MemoryTransport>>;

/// A server over a loopback transport; the returned handle stays usable
/// for injecting events and inspecting sent packets.
pub fn server_with_transport(
    config: ServerConfig,
    max_packet_size: usize,
) -> (Server<Entity>, SharedTransport) {
    let transport: SharedTransport = Rc::new(RefCell::new(MemoryTransport::new(max_packet_size)));
    let server = Server::new(config, Box::new(transport.clone()));
    (server, transport)
}

/// Serializes one `<id><payload>` frame the way a peer would put it on
/// the wire.
pub fn frame<M: Message>(message: &M) -> Vec<u8> {
    let mut writer = BitWriter::new();
    writer.write_u8_bits(M::ID, 8).unwrap();
    message.serialize(&mut writer).unwrap();
    writer.segment().to_vec()
}

pub fn started_server(max_packet_size: usize) -> (Server<Entity>, SharedTransport, TestStore) {
    let (mut server, transport) = server_with_transport(ServerConfig::default(), max_packet_size);
    server.start().unwrap();
    (server, transport, TestStore::default())
}
