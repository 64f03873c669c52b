use std::time::Duration;

use serde::Deserialize;

/// Per-connection timing and buffering.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Connect watchdog (milliseconds).
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,
    /// Keepalive ping interval (milliseconds). Zero disables keepalive.
    #[serde(default = "default_keep_alive_ms")]
    pub keep_alive_ms: u64,
    /// Pong deadline as a multiple of the keepalive interval.
    #[serde(default = "default_max_ping_pong_misses")]
    pub max_ping_pong_misses: f64,
    /// Queue messages that arrive before anyone waits for their hash.
    #[serde(default = "default_true")]
    pub use_message_queue: bool,
    /// Messages kept per hash when queueing.
    #[serde(default = "default_message_queue_size")]
    pub message_queue_size: usize,
    /// Capacity of the session event broadcast channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_connection_timeout_ms() -> u64 {
    10_000
}

fn default_keep_alive_ms() -> u64 {
    30_000
}

fn default_max_ping_pong_misses() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

fn default_message_queue_size() -> usize {
    10
}

fn default_event_capacity() -> usize {
    64
}

impl SessionConfig {
    #[must_use]
    pub const fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    /// `None` when keepalive is disabled.
    #[must_use]
    pub const fn keep_alive(&self) -> Option<Duration> {
        if self.keep_alive_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.keep_alive_ms))
        }
    }

    /// How long without a pong before the connection is considered dead.
    #[must_use]
    pub fn pong_deadline(&self) -> Option<Duration> {
        self.keep_alive()
            .map(|interval| interval.mul_f64(self.max_ping_pong_misses))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connection_timeout_ms: default_connection_timeout_ms(),
            keep_alive_ms: default_keep_alive_ms(),
            max_ping_pong_misses: default_max_ping_pong_misses(),
            use_message_queue: true,
            message_queue_size: default_message_queue_size(),
            event_capacity: default_event_capacity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pong_deadline() {
        let config = SessionConfig {
            keep_alive_ms: 1000,
            max_ping_pong_misses: 2.5,
            ..SessionConfig::default()
        };
        assert_eq!(config.pong_deadline(), Some(Duration::from_millis(2500)));

        let disabled = SessionConfig {
            keep_alive_ms: 0,
            ..SessionConfig::default()
        };
        assert_eq!(disabled.pong_deadline(), None);
    }
}
