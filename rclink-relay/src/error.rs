//! Relay error taxonomy.

use thiserror::Error;

use crate::registry::PeerKey;

/// Errors surfaced to relay callers.
///
/// Note that wire-level problems (wrong-sized datagrams, checksum failures)
/// never reach callers; the receive loop discards those internally. Callers
/// only see lookup failures and socket setup failures.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The peer is unknown, or known but currently disabled. The two cases
    /// are deliberately indistinguishable.
    #[error("no alive transmitter matches {0}")]
    PeerNotFound(PeerKey),

    /// Socket setup or teardown failure.
    #[error("relay socket error: {0}")]
    Socket(#[from] std::io::Error),
}
