use std::collections::HashMap;
use std::hash::Hash;
use std::time::Instant;

use log::{info, warn};

use bitnet_shared::{message_id, BitReader, BitWriter, ConnectionId, NetId, MIN_PACKET_SIZE};

use crate::{
    connection::Connection,
    context::ServerContext,
    error::ServerError,
    handlers::MessageHandlers,
    server_config::ServerConfig,
    transport::{Transport, TransportEvent},
    world::EntityStore,
};

/// Lifecycle state of the server.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServerState {
    Inactive,
    Active,
}

type ConnectionCallback<E> = Box<dyn FnMut(&mut ServerContext<'_, E>, ConnectionId)>;

// Splits the server into the disjoint field borrows a dispatching handler
// needs; must stay a macro so `self.handlers` remains borrowable alongside.
macro_rules! context {
    ($self:ident, $store:ident, $now:expr) => {
        ServerContext {
            active: true,
            connections: &mut $self.connections,
            spawned: &mut $self.spawned,
            transport: $self.transport.as_mut(),
            send_writer: &mut $self.send_writer,
            store: &mut *$store,
            now: $now,
        }
    };
}

/// The authoritative server core.
///
/// Owns the connection table and the spawned-entity map, routes transport
/// events into the handler table, batches outgoing messages per
/// (connection, channel), and enforces the connection lifecycle. The
/// entity world itself stays external behind [`EntityStore`]; `E` is
/// whatever handle that store uses for an entity.
///
/// Single-threaded and cooperative: the host calls [`tick`](Self::tick)
/// at `config.tick_rate`, and every callback runs on that call stack.
pub struct Server<E: Copy + Eq + Hash + 'static> {
    state: ServerState,
    config: ServerConfig,
    transport: Box<dyn Transport>,
    connections: HashMap<ConnectionId, Connection>,
    spawned: HashMap<NetId, E>,
    handlers: MessageHandlers<E>,
    send_writer: BitWriter,
    on_connected: Option<ConnectionCallback<E>>,
    on_disconnected: Option<ConnectionCallback<E>>,
}

impl<E: Copy + Eq + Hash + 'static> Server<E> {
    /// Creates a new Server over the given transport. The server stays
    /// [`Inactive`](ServerState::Inactive) until [`start`](Self::start).
    pub fn new(config: ServerConfig, transport: Box<dyn Transport>) -> Self {
        // One reusable send buffer for all outgoing messages, sized so any
        // message that fits a batch fits here first.
        let send_writer =
            BitWriter::with_capacity(transport.max_packet_size().max(MIN_PACKET_SIZE));
        Self {
            state: ServerState::Inactive,
            config,
            transport,
            connections: HashMap::new(),
            spawned: HashMap::new(),
            handlers: MessageHandlers::new(),
            send_writer,
            on_connected: None,
            on_disconnected: None,
        }
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == ServerState::Active
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The handler table; register message handlers here before or after
    /// starting.
    pub fn handlers_mut(&mut self) -> &mut MessageHandlers<E> {
        &mut self.handlers
    }

    /// Called after a connection is admitted, before the synthetic
    /// `Connect` message is dispatched.
    pub fn on_connected<F>(&mut self, callback: F)
    where
        F: FnMut(&mut ServerContext<'_, E>, ConnectionId) + 'static,
    {
        self.on_connected = Some(Box::new(callback));
    }

    /// Called after the synthetic `Disconnect` message, while the
    /// connection and its owned entities still exist.
    pub fn on_disconnected<F>(&mut self, callback: F)
    where
        F: FnMut(&mut ServerContext<'_, E>, ConnectionId) + 'static,
    {
        self.on_disconnected = Some(Box::new(callback));
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn is_connected(&self, connection_id: ConnectionId) -> bool {
        self.connections.contains_key(&connection_id)
    }

    pub fn connection(&self, connection_id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&connection_id)
    }

    pub fn spawned_count(&self) -> usize {
        self.spawned.len()
    }

    pub fn spawned_entity(&self, net_id: NetId) -> Option<E> {
        self.spawned.get(&net_id).copied()
    }

    // Lifecycle

    /// Brings the server up: fresh connection table, transport started,
    /// and only then the state flip, so nobody can observe an active
    /// server whose transport is down.
    pub fn start(&mut self) -> Result<(), ServerError> {
        if self.state == ServerState::Active {
            return Err(ServerError::AlreadyActive);
        }
        let size = self.transport.max_packet_size();
        if size < MIN_PACKET_SIZE {
            return Err(ServerError::PacketSizeTooSmall { size });
        }
        self.connections = HashMap::new();
        self.spawned = HashMap::new();
        self.transport.start();
        self.state = ServerState::Active;
        info!("server started");
        Ok(())
    }

    /// Tears everything down: spawned entities are destroyed through the
    /// store, the connection table is cleared, the transport stopped.
    pub fn stop<S: EntityStore<E>>(&mut self, store: &mut S) -> Result<(), ServerError> {
        if self.state != ServerState::Active {
            return Err(ServerError::NotActive);
        }
        let entities: Vec<E> = self.spawned.values().copied().collect();
        for entity in entities {
            store.destroy(entity);
        }
        self.spawned.clear();
        self.connections.clear();
        self.transport.stop();
        self.state = ServerState::Inactive;
        info!("server stopped");
        Ok(())
    }

    /// One cooperative step: drives the transport, drains its events
    /// through admission/dispatch/removal, then flushes every batch whose
    /// interval has elapsed. Must be called regularly; the server never
    /// sleeps or spawns threads of its own.
    pub fn tick<S: EntityStore<E>>(&mut self, store: &mut S) {
        self.tick_at(store, Instant::now());
    }

    /// [`tick`](Self::tick) with an explicit clock, for deterministic
    /// tests.
    pub fn tick_at<S: EntityStore<E>>(&mut self, store: &mut S, now: Instant) {
        if self.state != ServerState::Active {
            return;
        }
        self.transport.tick();

        let mut events = Vec::new();
        while let Some(event) = self.transport.poll_event() {
            events.push(event);
        }
        for event in events {
            match event {
                TransportEvent::Connected(id) => self.handle_connected(store, id, now),
                TransportEvent::Data(id, payload) => {
                    self.handle_data(store, id, &payload, now)
                }
                TransportEvent::Disconnected(id) => self.handle_disconnected(store, id, now),
            }
        }

        self.flush_due_batches(now);
    }

    /// A borrowed view for sending and spawn bookkeeping outside of
    /// handlers; handlers receive the same view as their first argument.
    pub fn context<'a, S: EntityStore<E>>(&'a mut self, store: &'a mut S) -> ServerContext<'a, E> {
        self.context_at(store, Instant::now())
    }

    pub fn context_at<'a, S: EntityStore<E>>(
        &'a mut self,
        store: &'a mut S,
        now: Instant,
    ) -> ServerContext<'a, E> {
        ServerContext {
            active: self.state == ServerState::Active,
            connections: &mut self.connections,
            spawned: &mut self.spawned,
            transport: self.transport.as_mut(),
            send_writer: &mut self.send_writer,
            store,
            now,
        }
    }

    // Spawn bookkeeping, delegated to the context so handlers and direct
    // callers share one code path.

    pub fn spawn<S: EntityStore<E>>(
        &mut self,
        store: &mut S,
        entity: E,
        owner: Option<ConnectionId>,
    ) -> bool {
        self.context(store).spawn(entity, owner)
    }

    pub fn unspawn<S: EntityStore<E>>(&mut self, store: &mut S, entity: E) -> bool {
        self.context(store).unspawn(entity)
    }

    pub fn destroy<S: EntityStore<E>>(&mut self, store: &mut S, entity: E) {
        self.context(store).destroy(entity)
    }

    pub fn join_world<S: EntityStore<E>>(
        &mut self,
        store: &mut S,
        connection_id: ConnectionId,
        entity: E,
    ) -> bool {
        self.context(store).join_world(connection_id, entity)
    }

    // Transport events

    fn handle_connected(
        &mut self,
        store: &mut dyn EntityStore<E>,
        connection_id: ConnectionId,
        now: Instant,
    ) {
        if self.connections.len() >= self.config.max_connections {
            info!(
                "rejecting connection {}: server is full ({})",
                connection_id, self.config.max_connections
            );
            self.transport.disconnect(connection_id);
            return;
        }
        if self.connections.contains_key(&connection_id) {
            warn!(
                "rejecting connection {}: id is already connected",
                connection_id
            );
            self.transport.disconnect(connection_id);
            return;
        }

        self.connections
            .insert(connection_id, Connection::new(connection_id));
        info!("connection {} accepted", connection_id);

        let mut callback = self.on_connected.take();
        if let Some(callback_fn) = callback.as_mut() {
            let mut context = context!(self, store, now);
            callback_fn(&mut context, connection_id);
        }
        self.on_connected = callback;

        // Connect is synthetic: fabricate the one-byte frame so connection
        // bookkeeping flows through the ordinary handler path.
        if self.handlers.contains(message_id::CONNECT) {
            self.handle_data(store, connection_id, &[message_id::CONNECT], now);
        }
    }

    fn handle_data(
        &mut self,
        store: &mut dyn EntityStore<E>,
        connection_id: ConnectionId,
        payload: &[u8],
        now: Instant,
    ) {
        if !self.connections.contains_key(&connection_id) {
            warn!("data from unknown connection {}", connection_id);
            return;
        }
        if payload.is_empty() {
            warn!("connection {}: empty packet; disconnecting", connection_id);
            self.transport.disconnect(connection_id);
            return;
        }

        let mut reader = BitReader::new(payload);
        let mut context = context!(self, store, now);
        // A packet is a batch of <id><payload> frames with less than one
        // id's worth of zero padding at the end. The first violation stops
        // the walk; the offender is already disconnected.
        while reader.remaining_bits() >= 8 {
            if !self.handlers.dispatch(&mut context, connection_id, &mut reader) {
                break;
            }
        }
    }

    fn handle_disconnected(
        &mut self,
        store: &mut dyn EntityStore<E>,
        connection_id: ConnectionId,
        now: Instant,
    ) {
        if !self.connections.contains_key(&connection_id) {
            return;
        }

        // Disconnect is synthetic, dispatched while the connection's owned
        // entities are still reachable for the handler.
        if self.handlers.contains(message_id::DISCONNECT) {
            self.handle_data(store, connection_id, &[message_id::DISCONNECT], now);
        }

        let mut callback = self.on_disconnected.take();
        if let Some(callback_fn) = callback.as_mut() {
            let mut context = context!(self, store, now);
            callback_fn(&mut context, connection_id);
        }
        self.on_disconnected = callback;

        // Owned entities die with their connection, before the connection
        // is removed so the owned set stays reachable throughout.
        {
            let mut context = context!(self, store, now);
            let owned: Vec<NetId> = context
                .connections
                .get(&connection_id)
                .map(|connection| connection.owned_entities.iter().copied().collect())
                .unwrap_or_default();
            for net_id in owned {
                if let Some(entity) = context.spawned.get(&net_id).copied() {
                    context.destroy(entity);
                }
            }
        }

        self.connections.remove(&connection_id);
        info!("connection {} removed", connection_id);

        // Observer lists may still name the removed connection.
        store.rebuild_observers();
    }

    fn flush_due_batches(&mut self, now: Instant) {
        let interval = self.config.batch_interval;
        for (connection_id, connection) in self.connections.iter_mut() {
            if connection.is_broken() {
                continue;
            }
            let mut failed = false;
            for (channel, batch) in connection.batches_mut() {
                if !batch.due(now, interval) {
                    continue;
                }
                if self.transport.send(*connection_id, batch.segment(), *channel) {
                    batch.clear(now);
                } else {
                    warn!(
                        "flush: transport refused a packet for connection {}; disconnecting",
                        connection_id
                    );
                    failed = true;
                    break;
                }
            }
            if failed {
                connection.mark_broken();
                self.transport.disconnect(*connection_id);
            }
        }
    }
}
