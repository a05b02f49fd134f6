//! Datagram transport seam.

/// Error type for transport operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// Send/receive I/O failure.
    Io,
    /// The underlying link is down (e.g. network association lost).
    Disconnected,
}

/// Trait abstracting a connectionless datagram socket.
///
/// Implementations exchange whole datagrams with a single pre-configured
/// peer; datagram boundaries are preserved. This keeps the core free of any
/// socket, Wi-Fi, or network-stack dependency.
///
/// # `no_std` Compatibility
///
/// All implementations must be `#![no_std]` compatible with no heap
/// allocation.
pub trait Transport {
    /// Send one datagram to the peer.
    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError>;

    /// Non-blocking receive of one whole datagram into `buf`.
    ///
    /// Returns `Ok(None)` when nothing is pending. A datagram larger than
    /// `buf` may be truncated to `buf.len()`; callers treat any length that
    /// is not an exact packet size as malformed, so truncation only ever
    /// affects already-invalid datagrams.
    fn try_recv(&mut self, buf: &mut [u8]) -> Result<Option<usize>, TransportError>;
}
