use std::time::Duration;

/// Contains config properties which will be used by the Server.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// How many times per second the host should drive [`Server::tick`].
    ///
    /// The server never sleeps on its own; it makes progress only when
    /// ticked, so this is a contract with the host scheduler rather than
    /// an internal timer.
    ///
    /// [`Server::tick`]: crate::Server::tick
    pub tick_rate: u32,
    /// Longest a non-empty outgoing batch may wait before it is flushed,
    /// bounding outbound latency for connections with little traffic.
    pub batch_interval: Duration,
    /// Connections past this limit are rejected at the transport level.
    pub max_connections: usize,
}

impl ServerConfig {
    /// The pause between ticks implied by `tick_rate`.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate.max(1)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            batch_interval: Duration::from_millis(10),
            max_connections: 1000,
        }
    }
}
