//! TransmitterLink: one loop iteration of the transmitter-side task.
//!
//! Ties the engine, the override slot, and the transport together. The
//! caller owns the loop and the scheduler yield between iterations; each
//! [`TransmitterLink::poll`] performs exactly one iteration:
//!
//! 1. Drain every pending datagram. A valid control packet overwrites the
//!    override slot; a checksum failure clears it; a wrong-sized datagram
//!    is discarded without touching any state.
//! 2. Tick the engine on fresh samples and resolve the output: a ready,
//!    still-fresh override wins, otherwise the calibrated mapping. The
//!    resolved levels are driven to the hardware.
//! 3. When the telemetry interval has elapsed, encode and send one
//!    telemetry packet from the live state.
//!
//! Transport failures are reported in the returned [`PollReport`] and never
//! abort the iteration; the outputs are driven from local state regardless
//! of network health.

use rclink_proto::{ControlPacket, TelemetryPacket, WireError};

use crate::calibration::OutputLevels;
use crate::engine::{EngineConfig, MappedLevels, MappingEngine, Phase, RawSample};
use crate::io::TransmitterIo;
use crate::override_signal::OverrideSignal;
use crate::transport::Transport;

/// Upper bound on the telemetry rate; configurations are clamped to it.
pub const MAX_PACKETS_PER_SECOND: u16 = 500;

/// Receive scratch size; comfortably larger than any valid packet so that
/// oversized datagrams are detected rather than silently truncated to a
/// parseable prefix.
const RECV_BUF_SIZE: usize = 64;

/// Link tuning constants.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkConfig {
    /// Telemetry packets per second, clamped to [`MAX_PACKETS_PER_SECOND`].
    pub packets_per_second: u16,
    /// How long a received override stays honored, in milliseconds.
    pub override_valid_ms: u64,
    /// Calibration/mapping engine configuration.
    pub engine: EngineConfig,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            packets_per_second: 100,
            override_valid_ms: 500,
            engine: EngineConfig::default(),
        }
    }
}

/// Outcome of one [`TransmitterLink::poll`] iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollReport {
    /// Valid control packets latched into the override slot.
    pub overrides_latched: u8,
    /// Wrong-sized datagrams discarded.
    pub malformed: u8,
    /// Checksum failures (each also cleared the override slot).
    pub integrity_failures: u8,
    /// Send/receive failures.
    pub transport_errors: u8,
    /// Whether a telemetry packet was sent this iteration.
    pub telemetry_sent: bool,
    /// Whether the driven output came from a fresh override.
    pub override_active: bool,
}

/// The transmitter-side link task.
pub struct TransmitterLink<T, H> {
    transport: T,
    io: H,
    engine: MappingEngine,
    signal: OverrideSignal,
    send_interval_ms: u64,
    override_valid_ms: u64,
    last_send_ms: Option<u64>,
}

impl<T: Transport, H: TransmitterIo> TransmitterLink<T, H> {
    /// Create a link from a transport, hardware seam, and configuration.
    pub fn new(transport: T, io: H, config: LinkConfig) -> Self {
        let pps = config.packets_per_second.clamp(1, MAX_PACKETS_PER_SECOND);
        Self {
            transport,
            io,
            engine: MappingEngine::new(config.engine),
            signal: OverrideSignal::idle(),
            send_interval_ms: u64::from(1000 / pps).max(1),
            override_valid_ms: config.override_valid_ms,
            last_send_ms: None,
        }
    }

    /// Perform one loop iteration at monotonic time `now_ms`.
    pub fn poll(&mut self, now_ms: u64) -> PollReport {
        let mut report = PollReport::default();

        self.drain_incoming(now_ms, &mut report);

        let raw = RawSample {
            throttle: self.io.read_throttle(),
            steer: self.io.read_steer(),
        };
        let mapped = self.engine.tick(raw);

        // Until calibration completes the outputs are pinned to center;
        // overrides only take effect on an Active engine.
        let out = match self
            .engine
            .is_active()
            .then(|| self.signal.current(now_ms, self.override_valid_ms))
            .flatten()
        {
            Some(levels) => {
                report.override_active = true;
                MappedLevels {
                    throttle: rescale_throttle(
                        levels.throttle,
                        self.engine.config().throttle_out,
                    ),
                    steer: levels.steer,
                }
            }
            None => mapped,
        };
        self.io.write_throttle(out.throttle);
        self.io.write_steer(out.steer);

        if self.telemetry_due(now_ms) {
            self.send_telemetry(mapped, out, &mut report);
            self.last_send_ms = Some(now_ms);
        }

        report
    }

    fn drain_incoming(&mut self, now_ms: u64, report: &mut PollReport) {
        let mut buf = [0u8; RECV_BUF_SIZE];
        loop {
            match self.transport.try_recv(&mut buf) {
                Ok(Some(len)) => match ControlPacket::decode(&buf[..len]) {
                    Ok(packet) => {
                        self.signal.latch(&packet, now_ms);
                        report.overrides_latched = report.overrides_latched.saturating_add(1);
                    }
                    Err(WireError::Malformed) => {
                        report.malformed = report.malformed.saturating_add(1);
                    }
                    Err(WireError::Integrity) => {
                        self.signal.clear();
                        report.integrity_failures = report.integrity_failures.saturating_add(1);
                    }
                },
                Ok(None) => break,
                Err(_) => {
                    report.transport_errors = report.transport_errors.saturating_add(1);
                    break;
                }
            }
        }
    }

    fn telemetry_due(&self, now_ms: u64) -> bool {
        match self.last_send_ms {
            Some(last) => last + self.send_interval_ms <= now_ms,
            None => true,
        }
    }

    fn send_telemetry(&mut self, mapped: MappedLevels, out: MappedLevels, report: &mut PollReport) {
        let packet = TelemetryPacket {
            in_throttle: mapped.throttle,
            in_steer: mapped.steer,
            in_button: self.io.read_button(),
            out_throttle: out.throttle,
            out_steer: out.steer,
            battery_mv: self.io.battery_mv(),
        };
        match self.transport.send(&packet.to_bytes()) {
            Ok(()) => report.telemetry_sent = true,
            Err(_) => {
                report.transport_errors = report.transport_errors.saturating_add(1);
            }
        }
    }

    /// Current engine phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.engine.phase()
    }

    /// Get a reference to the engine.
    pub fn engine(&self) -> &MappingEngine {
        &self.engine
    }

    /// Get a reference to the hardware seam.
    pub fn io(&self) -> &H {
        &self.io
    }

    /// Get a mutable reference to the hardware seam.
    pub fn io_mut(&mut self) -> &mut H {
        &mut self.io
    }

    /// Get a reference to the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a mutable reference to the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Decompose the link into its transport and hardware components.
    pub fn into_parts(self) -> (T, H) {
        (self.transport, self.io)
    }
}

/// Rescale a 0–255 wire throttle into the hardware output range.
#[inline]
#[must_use]
fn rescale_throttle(wire: u8, out: OutputLevels) -> u8 {
    let span = u16::from(out.max - out.min);
    out.min + (u16::from(wire) * span / 255) as u8
}
