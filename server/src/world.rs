use std::hash::Hash;

use bitnet_shared::NetworkEntity;

/// The server core's window into the game's entity world.
///
/// The core tracks which entities are spawned and who owns them, but the
/// entities themselves live in an external store (an ECS, a scene graph).
/// This trait is the whole contract: the server reads and writes the
/// [`NetworkEntity`] component, asks for stable unique ids, walks observer
/// lists, and requests destruction. It never reaches into game-specific
/// components.
pub trait EntityStore<E: Copy + Eq + Hash> {
    /// A stable, non-zero identifier unique to this entity for the
    /// lifetime of the store. Spawn derives the entity's network id from
    /// it.
    fn unique_id(&self, entity: E) -> u64;

    /// The entity's [`NetworkEntity`] component, if it carries one.
    fn network_entity(&self, entity: E) -> Option<&NetworkEntity>;

    fn network_entity_mut(&mut self, entity: E) -> Option<&mut NetworkEntity>;

    /// Connections currently observing this entity. Interest management
    /// maintains the list; the server only reads it when fanning out
    /// unspawn notifications.
    fn observers(&self, entity: E) -> &[bitnet_shared::ConnectionId];

    /// Removes the entity from the world.
    fn destroy(&mut self, entity: E);

    /// Asks interest management to rebuild observer sets. Called after a
    /// connection is removed so stale observer entries do not linger.
    fn rebuild_observers(&mut self);
}
