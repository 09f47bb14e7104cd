use std::collections::{HashMap, HashSet};
use std::time::Instant;

use bitnet_shared::{Batch, Channel, ConnectionId, NetId};

/// Server-side state for one live transport connection.
///
/// Connections start out `authenticated`: an authentication module claims
/// the `Connect` handler and flips the bit to `false` there before running
/// its own handshake, which keeps a single composition rule between the
/// core and any authenticator. `broken` is monotone: once a transport send
/// fails the connection only sheds state until the transport confirms the
/// disconnect.
pub struct Connection {
    id: ConnectionId,
    pub(crate) authenticated: bool,
    pub(crate) joined_world: bool,
    broken: bool,
    pub(crate) owned_entities: HashSet<NetId>,
    batches: HashMap<Channel, Batch>,
}

impl Connection {
    pub(crate) fn new(id: ConnectionId) -> Self {
        Self {
            id,
            authenticated: true,
            joined_world: false,
            broken: false,
            owned_entities: HashSet::new(),
            batches: HashMap::new(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn has_joined_world(&self) -> bool {
        self.joined_world
    }

    /// Whether a transport send has failed for this connection. Further
    /// sends are suppressed until the transport removes it.
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    pub(crate) fn mark_broken(&mut self) {
        self.broken = true;
    }

    /// Network ids of the entities this connection owns.
    pub fn owned_entities(&self) -> &HashSet<NetId> {
        &self.owned_entities
    }

    /// The outgoing batch for `channel`, created on first use with a
    /// buffer of `max_packet_size` bytes.
    pub(crate) fn batch_mut(
        &mut self,
        channel: Channel,
        max_packet_size: usize,
        now: Instant,
    ) -> &mut Batch {
        self.batches
            .entry(channel)
            .or_insert_with(|| Batch::new(max_packet_size, now))
    }

    pub(crate) fn batches_mut(&mut self) -> impl Iterator<Item = (&Channel, &mut Batch)> {
        self.batches.iter_mut()
    }
}
