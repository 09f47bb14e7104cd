use std::collections::HashMap;
use std::hash::Hash;

use log::warn;

use bitnet_shared::{BitReader, ConnectionId, Message, SerdeErr};

use crate::{context::ServerContext, error::ServerError};

type BoxedHandler<E> = Box<
    dyn FnMut(&mut ServerContext<'_, E>, ConnectionId, &mut BitReader) -> Result<(), SerdeErr>,
>;

struct HandlerEntry<E: Copy + Eq + Hash + 'static> {
    requires_auth: bool,
    handler: BoxedHandler<E>,
}

/// The message-id to handler table.
///
/// Handlers are registered generically and stored type-erased: the wrapper
/// closure knows the concrete message kind, default-constructs it, runs
/// its deserializer, and only then calls the user handler with the typed
/// value. The wrapper is also where the authentication gate and the
/// protocol-violation disconnects live, so no user code ever sees bytes
/// from a peer that broke the rules.
pub struct MessageHandlers<E: Copy + Eq + Hash + 'static> {
    entries: HashMap<u8, HandlerEntry<E>>,
}

impl<E: Copy + Eq + Hash + 'static> MessageHandlers<E> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Registers `handler` for `M`'s id. With `requires_auth`, frames from
    /// unauthenticated connections disconnect the sender instead of
    /// reaching the handler.
    ///
    /// Registration refuses to overwrite: a second handler for the same id
    /// is an error.
    pub fn on<M, F>(&mut self, requires_auth: bool, mut handler: F) -> Result<(), ServerError>
    where
        M: Message + 'static,
        F: FnMut(&mut ServerContext<'_, E>, ConnectionId, M) + 'static,
    {
        if self.entries.contains_key(&M::ID) {
            return Err(ServerError::HandlerAlreadyRegistered { id: M::ID });
        }
        let wrapped: BoxedHandler<E> = Box::new(move |context, connection_id, reader| {
            let mut message = M::default();
            message.deserialize(reader)?;
            handler(context, connection_id, message);
            Ok(())
        });
        self.entries.insert(
            M::ID,
            HandlerEntry {
                requires_auth,
                handler: wrapped,
            },
        );
        Ok(())
    }

    /// Removes the handler for `id`. Returns whether one was registered.
    pub fn off(&mut self, id: u8) -> bool {
        self.entries.remove(&id).is_some()
    }

    pub fn contains(&self, id: u8) -> bool {
        self.entries.contains_key(&id)
    }

    /// Reads one `<id><payload>` frame and runs its handler.
    ///
    /// Returns false when the frame was a protocol violation (truncated
    /// id, unknown id, failed auth gate, failed deserialization); the
    /// offender has been disconnected and no further bytes of this packet
    /// should be read.
    pub(crate) fn dispatch(
        &mut self,
        context: &mut ServerContext<'_, E>,
        connection_id: ConnectionId,
        reader: &mut BitReader,
    ) -> bool {
        let Ok(message_id) = reader.read_u8_bits(8) else {
            warn!(
                "connection {}: truncated message id; disconnecting",
                connection_id
            );
            context.disconnect(connection_id);
            return false;
        };
        let Some(entry) = self.entries.get_mut(&message_id) else {
            warn!(
                "connection {}: unknown message id 0x{:02x}; disconnecting",
                connection_id, message_id
            );
            context.disconnect(connection_id);
            return false;
        };
        if entry.requires_auth && !context.is_authenticated(connection_id) {
            warn!(
                "connection {}: message 0x{:02x} requires authentication; disconnecting",
                connection_id, message_id
            );
            context.disconnect(connection_id);
            return false;
        }
        if (entry.handler)(context, connection_id, reader).is_err() {
            warn!(
                "connection {}: message 0x{:02x} failed to deserialize; disconnecting",
                connection_id, message_id
            );
            context.disconnect(connection_id);
            return false;
        }
        true
    }
}

impl<E: Copy + Eq + Hash + 'static> Default for MessageHandlers<E> {
    fn default() -> Self {
        Self::new()
    }
}
