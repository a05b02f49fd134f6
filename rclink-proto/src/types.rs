//! Link packet types: TelemetryPacket and ControlPacket.

/// Wire size of an encoded [`TelemetryPacket`] in bytes.
pub const TELEMETRY_WIRE_SIZE: usize = 12;

/// Wire size of an encoded [`ControlPacket`] in bytes.
pub const CONTROL_WIRE_SIZE: usize = 6;

/// Size of the trailing CRC32 field shared by both packets.
pub const CRC_SIZE: usize = 4;

/// Periodic live-state report, transmitter → relay.
///
/// Sent once per transmission tick; a sent packet is never mutated or
/// re-sent. `in_*` fields carry the transmitter's sensed stick positions
/// mapped into the 8-bit output range, `out_*` the levels actually driven
/// to the hardware (these differ while a remote override is active).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetryPacket {
    /// Sensed throttle input, mapped to the output range.
    pub in_throttle: u8,
    /// Sensed steering input, mapped to the output range.
    pub in_steer: u8,
    /// Latched button/aux sample.
    pub in_button: u16,
    /// Throttle level currently driven to the hardware.
    pub out_throttle: u8,
    /// Steering level currently driven to the hardware.
    pub out_steer: u8,
    /// Battery voltage in millivolts.
    pub battery_mv: u16,
}

/// Output override request, relay → transmitter.
///
/// `out_steer` is applied by the transmitter as-is; `out_throttle` is a
/// 0–255 wire value that the transmitter rescales into its hardware
/// throttle range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlPacket {
    /// Requested throttle, 0–255 wire range.
    pub out_throttle: u8,
    /// Requested steering level.
    pub out_steer: u8,
}

impl ControlPacket {
    /// Create a control packet from throttle and steer values.
    #[inline]
    #[must_use]
    pub const fn new(out_throttle: u8, out_steer: u8) -> Self {
        Self {
            out_throttle,
            out_steer,
        }
    }
}
