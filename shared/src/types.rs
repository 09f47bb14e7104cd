use bitnet_serde::FixedBytes;

/// Transport-assigned identifier of one live connection.
pub type ConnectionId = u64;

/// Network identity of a spawned entity; 0 means "not spawned".
pub type NetId = u64;

/// Reliability class of an outgoing packet. Transports map these onto
/// their own concepts; there are exactly two.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Reliable,
    Unreliable,
}

/// The component the entity store attaches to every networked entity.
///
/// The server core only ever touches this component; game-specific state
/// stays behind the entity-store contract.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct NetworkEntity {
    /// Assigned on spawn from the store's unique id, cleared on unspawn.
    pub net_id: NetId,
    /// Identifies which prefab to instantiate on the remote side.
    pub prefab_id: FixedBytes<16>,
    /// The connection that owns this entity, if any.
    pub owner: Option<ConnectionId>,
}

impl NetworkEntity {
    pub fn new(prefab_id: FixedBytes<16>) -> Self {
        Self {
            net_id: 0,
            prefab_id,
            owner: None,
        }
    }

    pub fn is_spawned(&self) -> bool {
        self.net_id != 0
    }
}
