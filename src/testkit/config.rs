//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.

use crate::config::{ReconnectionConfig, SessionConfig};

/// Fast reconnection config with zero delays.
pub fn reconnection() -> ReconnectionConfig {
    ReconnectionConfig {
        initial_delay_ms: 0,
        max_delay_ms: 0,
        backoff_multiplier: 1.0,
        max_consecutive_failures: 3,
        circuit_breaker_cooldown_ms: 0,
    }
}

/// Session config with keepalive off and a short connect watchdog.
pub fn session() -> SessionConfig {
    SessionConfig {
        connection_timeout_ms: 1_000,
        keep_alive_ms: 0,
        ..SessionConfig::default()
    }
}

/// Session config with keepalive every `keep_alive_ms`.
pub fn keepalive_session(keep_alive_ms: u64, max_ping_pong_misses: f64) -> SessionConfig {
    SessionConfig {
        keep_alive_ms,
        max_ping_pong_misses,
        ..session()
    }
}
