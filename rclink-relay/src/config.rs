//! Relay configuration.

use std::time::Duration;

/// Relay tuning constants.
///
/// Defaults can be overridden via environment variables (`RCLINK_*`) or by
/// constructing the struct directly; the binary additionally maps CLI flags
/// onto these fields.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// UDP port to listen on (0 lets the OS pick; useful in tests).
    pub listen_port: u16,
    /// Quiet time after which a transmitter is hidden from queries.
    pub disable_after: Duration,
    /// Quiet time after which a transmitter record is erased.
    pub delete_after: Duration,
    /// Socket read timeout; bounds how long liveness cleanup can stall on
    /// an idle link, and how quickly shutdown is observed.
    pub recv_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_port: env_or("RCLINK_LISTEN_PORT", 3333),
            disable_after: Duration::from_millis(env_or("RCLINK_DISABLE_MS", 2500)),
            delete_after: Duration::from_millis(env_or("RCLINK_DELETE_MS", 10_000)),
            recv_timeout: Duration::from_millis(env_or("RCLINK_RECV_TIMEOUT_MS", 250)),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
