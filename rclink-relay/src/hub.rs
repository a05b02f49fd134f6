//! RelayHub: the receive loop and the thread-safe caller API.
//!
//! The hub binds the UDP socket, spawns the receive-loop thread, and hands
//! out snapshots/commands to any number of caller threads. Shared state
//! (registry + override queue) lives behind one mutex; the lock is taken
//! per discrete operation and never held across the blocking socket
//! receive.

use std::collections::VecDeque;
use std::io;
use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use rclink_proto::{ControlPacket, TelemetryPacket, WireError};
use tracing::{debug, warn};

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::registry::{PeerKey, Registry, TransmitterId, TransmitterRecord};

/// Receive scratch size; larger than any valid packet so oversized
/// datagrams fail the length check instead of parsing as a prefix.
const RECV_BUF_SIZE: usize = 64;

/// A queued override directive for one transmitter.
///
/// `None` fields are not overridden: at dispatch time they are filled from
/// the target's most recently observed *input* values, preserving
/// pass-through behavior for that axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverrideCommand {
    /// Target peer, by stable id.
    pub target: TransmitterId,
    /// Desired throttle (0–255 wire range), or pass-through.
    pub throttle: Option<u8>,
    /// Desired steering level, or pass-through.
    pub steer: Option<u8>,
}

struct HubState {
    registry: Registry,
    queue: VecDeque<OverrideCommand>,
}

/// The relay: receive loop plus thread-safe query/command surface.
///
/// Dropping the hub stops the receive loop and joins its thread.
pub struct RelayHub {
    state: Arc<Mutex<HubState>>,
    socket: Arc<UdpSocket>,
    stop: Arc<AtomicBool>,
    receiver: Option<JoinHandle<()>>,
}

impl RelayHub {
    /// Bind the listen socket and start the receive loop.
    pub fn bind(config: RelayConfig) -> Result<Self, RelayError> {
        let socket = UdpSocket::bind(("0.0.0.0", config.listen_port))?;
        socket.set_read_timeout(Some(config.recv_timeout))?;
        let socket = Arc::new(socket);

        let state = Arc::new(Mutex::new(HubState {
            registry: Registry::new(config.disable_after, config.delete_after),
            queue: VecDeque::new(),
        }));
        let stop = Arc::new(AtomicBool::new(false));

        let receiver = {
            let socket = Arc::clone(&socket);
            let state = Arc::clone(&state);
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name("rclink-recv".into())
                .spawn(move || receive_loop(&socket, &state, &stop))
                .map_err(RelayError::Socket)?
        };

        Ok(Self {
            state,
            socket,
            stop,
            receiver: Some(receiver),
        })
    }

    /// The bound listen address (port resolved when configured as 0).
    pub fn local_addr(&self) -> Result<SocketAddr, RelayError> {
        Ok(self.socket.local_addr()?)
    }

    /// Ids of all currently alive transmitters.
    #[must_use]
    pub fn alive_transmitters(&self) -> Vec<TransmitterId> {
        self.lock().registry.alive_ids(Instant::now())
    }

    /// Addresses of all currently alive transmitters.
    #[must_use]
    pub fn alive_addresses(&self) -> Vec<IpAddr> {
        self.lock().registry.alive_addrs(Instant::now())
    }

    /// Latest telemetry snapshot for an alive peer.
    pub fn telemetry(&self, peer: impl Into<PeerKey>) -> Result<TelemetryPacket, RelayError> {
        self.with_alive(peer.into(), |record| record.telemetry)
    }

    /// Sensed throttle input of an alive peer.
    pub fn input_throttle(&self, peer: impl Into<PeerKey>) -> Result<u8, RelayError> {
        self.with_alive(peer.into(), |record| record.telemetry.in_throttle)
    }

    /// Sensed steering input of an alive peer.
    pub fn input_steer(&self, peer: impl Into<PeerKey>) -> Result<u8, RelayError> {
        self.with_alive(peer.into(), |record| record.telemetry.in_steer)
    }

    /// Throttle level the peer is currently driving.
    pub fn output_throttle(&self, peer: impl Into<PeerKey>) -> Result<u8, RelayError> {
        self.with_alive(peer.into(), |record| record.telemetry.out_throttle)
    }

    /// Steering level the peer is currently driving.
    pub fn output_steer(&self, peer: impl Into<PeerKey>) -> Result<u8, RelayError> {
        self.with_alive(peer.into(), |record| record.telemetry.out_steer)
    }

    /// Queue an override of both axes.
    pub fn override_both(
        &self,
        peer: impl Into<PeerKey>,
        throttle: u8,
        steer: u8,
    ) -> Result<(), RelayError> {
        self.enqueue(peer.into(), Some(throttle), Some(steer))
    }

    /// Queue a steer-only override; throttle passes through.
    pub fn override_steer(&self, peer: impl Into<PeerKey>, steer: u8) -> Result<(), RelayError> {
        self.enqueue(peer.into(), None, Some(steer))
    }

    /// Queue a throttle-only override; steer passes through.
    pub fn override_throttle(
        &self,
        peer: impl Into<PeerKey>,
        throttle: u8,
    ) -> Result<(), RelayError> {
        self.enqueue(peer.into(), Some(throttle), None)
    }

    /// Stop the receive loop and join its thread.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn enqueue(
        &self,
        key: PeerKey,
        throttle: Option<u8>,
        steer: Option<u8>,
    ) -> Result<(), RelayError> {
        let mut state = self.lock();
        let target = state
            .registry
            .get_alive(key, Instant::now())
            .map(|record| record.id)
            .ok_or(RelayError::PeerNotFound(key))?;
        state.queue.push_back(OverrideCommand {
            target,
            throttle,
            steer,
        });
        Ok(())
    }

    fn with_alive<R>(
        &self,
        key: PeerKey,
        read: impl FnOnce(&TransmitterRecord) -> R,
    ) -> Result<R, RelayError> {
        let state = self.lock();
        state
            .registry
            .get_alive(key, Instant::now())
            .map(read)
            .ok_or(RelayError::PeerNotFound(key))
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        lock_state(&self.state)
    }

    fn stop_and_join(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.receiver.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RelayHub {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

fn lock_state(state: &Mutex<HubState>) -> MutexGuard<'_, HubState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn receive_loop(socket: &UdpSocket, state: &Mutex<HubState>, stop: &AtomicBool) {
    let mut buf = [0u8; RECV_BUF_SIZE];

    while !stop.load(Ordering::Relaxed) {
        lock_state(state).registry.cleanup(Instant::now());

        // Blocking receive, outside the lock. The read timeout turns an
        // idle link into ordinary loop iterations.
        let (len, src) = match socket.recv_from(&mut buf) {
            Ok(received) => received,
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                continue;
            }
            Err(e) => {
                warn!("udp receive failed: {e}");
                continue;
            }
        };

        let telemetry = match TelemetryPacket::decode(&buf[..len]) {
            Ok(packet) => packet,
            Err(WireError::Malformed) => {
                debug!(%src, len, "discarding wrong-sized datagram");
                continue;
            }
            Err(WireError::Integrity) => {
                warn!(%src, "checksum mismatch, dropping packet");
                continue;
            }
        };

        let mut state = lock_state(state);
        state
            .registry
            .apply_telemetry(src.ip(), src.port(), telemetry, Instant::now());

        // One queued override per iteration
        if let Some(command) = state.queue.pop_front() {
            dispatch(&mut state, command, socket);
        }
    }
}

fn dispatch(state: &mut HubState, command: OverrideCommand, socket: &UdpSocket) {
    let Some(record) = state.registry.get(PeerKey::Id(command.target)) else {
        warn!(
            target = command.target,
            "dropping override for vanished transmitter"
        );
        return;
    };

    // Unset fields pass through the live *input* values. Filling from the
    // previously sent outputs instead would freeze the axis at whatever was
    // last transmitted.
    let packet = ControlPacket::new(
        command.throttle.unwrap_or(record.telemetry.in_throttle),
        command.steer.unwrap_or(record.telemetry.in_steer),
    );
    let dest = SocketAddr::new(record.addr, record.port);
    match socket.send_to(&packet.to_bytes(), dest) {
        Ok(_) => debug!(
            %dest,
            throttle = packet.out_throttle,
            steer = packet.out_steer,
            "override dispatched"
        ),
        Err(e) => warn!(%dest, "override send failed: {e}"),
    }
}
