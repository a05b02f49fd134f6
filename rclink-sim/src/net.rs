//! UDP transport for the simulated transmitter.
//!
//! Binds an ephemeral socket and exchanges datagrams with the relay. The
//! relay answers to the observed source address, so control packets arrive
//! on this same socket without a fixed listen port.

use std::io;
use std::net::{SocketAddr, UdpSocket};

use rclink_core::{Transport, TransportError};
use tracing::{debug, warn};

pub struct UdpTransport {
    socket: UdpSocket,
    relay: SocketAddr,
}

impl UdpTransport {
    /// Bind an ephemeral nonblocking socket talking to `relay`.
    pub fn connect(relay: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_nonblocking(true)?;
        Ok(Self { socket, relay })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        match self.socket.send_to(frame, self.relay) {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!("udp send failed: {e}");
                Err(TransportError::Io)
            }
        }
    }

    fn try_recv(&mut self, buf: &mut [u8]) -> Result<Option<usize>, TransportError> {
        loop {
            match self.socket.recv_from(buf) {
                Ok((len, src)) if src == self.relay => return Ok(Some(len)),
                Ok((_, src)) => {
                    debug!(%src, "ignoring datagram from unexpected source");
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(None),
                Err(e) => {
                    warn!("udp receive failed: {e}");
                    return Err(TransportError::Io);
                }
            }
        }
    }
}
