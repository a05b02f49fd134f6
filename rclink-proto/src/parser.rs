//! Packet decoding and integrity validation.
//!
//! Decoding is strict: the input must be exactly one whole packet. Anything
//! else — short reads, oversized datagrams, concatenated packets — is
//! [`WireError::Malformed`] and the caller discards the datagram outright.
//! Partial parsing is deliberately unsupported; on a connectionless link a
//! "best effort" parse of a wrong-sized buffer only desynchronizes the two
//! ends.

use crate::crc32::checksum;
use crate::types::{ControlPacket, TelemetryPacket, CONTROL_WIRE_SIZE, CRC_SIZE, TELEMETRY_WIRE_SIZE};

/// Error type for decode operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WireError {
    /// Buffer length does not match the expected packet size.
    Malformed,
    /// Checksum mismatch; the payload must be treated as untrusted.
    Integrity,
}

impl core::fmt::Display for WireError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Malformed => write!(f, "wrong packet length"),
            Self::Integrity => write!(f, "checksum mismatch"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for WireError {}

/// Split a length-checked buffer into payload and verified CRC.
#[inline]
fn verified_payload(buf: &[u8], wire_size: usize) -> Result<&[u8], WireError> {
    if buf.len() != wire_size {
        return Err(WireError::Malformed);
    }

    let (payload, crc_bytes) = buf.split_at(wire_size - CRC_SIZE);
    let received = u32::from_le_bytes(crc_bytes.try_into().expect("split yields 4 bytes"));
    if received != checksum(payload) {
        return Err(WireError::Integrity);
    }
    Ok(payload)
}

impl TelemetryPacket {
    /// Decode and validate one telemetry datagram.
    ///
    /// # Errors
    ///
    /// [`WireError::Malformed`] if `buf` is not exactly
    /// [`TELEMETRY_WIRE_SIZE`] bytes; [`WireError::Integrity`] if the
    /// trailing CRC32 does not match the payload.
    pub fn decode(buf: &[u8]) -> Result<Self, WireError> {
        let p = verified_payload(buf, TELEMETRY_WIRE_SIZE)?;
        Ok(Self {
            in_throttle: p[0],
            in_steer: p[1],
            in_button: u16::from_le_bytes([p[2], p[3]]),
            out_throttle: p[4],
            out_steer: p[5],
            battery_mv: u16::from_le_bytes([p[6], p[7]]),
        })
    }
}

impl ControlPacket {
    /// Decode and validate one control datagram.
    ///
    /// # Errors
    ///
    /// [`WireError::Malformed`] if `buf` is not exactly
    /// [`CONTROL_WIRE_SIZE`] bytes; [`WireError::Integrity`] if the
    /// trailing CRC32 does not match the payload.
    pub fn decode(buf: &[u8]) -> Result<Self, WireError> {
        let p = verified_payload(buf, CONTROL_WIRE_SIZE)?;
        Ok(Self {
            out_throttle: p[0],
            out_steer: p[1],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_telemetry() -> TelemetryPacket {
        TelemetryPacket {
            in_throttle: 60,
            in_steer: 64,
            in_button: 1,
            out_throttle: 200,
            out_steer: 40,
            battery_mv: 7820,
        }
    }

    #[test]
    fn test_telemetry_roundtrip() {
        let packet = sample_telemetry();
        assert_eq!(TelemetryPacket::decode(&packet.to_bytes()), Ok(packet));
    }

    #[test]
    fn test_control_roundtrip() {
        let packet = ControlPacket::new(255, 0);
        assert_eq!(ControlPacket::decode(&packet.to_bytes()), Ok(packet));
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        let bytes = sample_telemetry().to_bytes();

        assert_eq!(
            TelemetryPacket::decode(&bytes[..TELEMETRY_WIRE_SIZE - 1]),
            Err(WireError::Malformed)
        );
        assert_eq!(TelemetryPacket::decode(&[]), Err(WireError::Malformed));

        // Oversized datagram: no partial parse of a valid prefix
        let mut oversized = [0u8; TELEMETRY_WIRE_SIZE + 1];
        oversized[..TELEMETRY_WIRE_SIZE].copy_from_slice(&bytes);
        assert_eq!(
            TelemetryPacket::decode(&oversized),
            Err(WireError::Malformed)
        );

        // A control-sized buffer is not a telemetry packet and vice versa
        let control = ControlPacket::new(1, 2).to_bytes();
        assert_eq!(TelemetryPacket::decode(&control), Err(WireError::Malformed));
        assert_eq!(ControlPacket::decode(&bytes), Err(WireError::Malformed));
    }

    #[test]
    fn test_decode_rejects_corrupted_payload() {
        let mut bytes = sample_telemetry().to_bytes();
        bytes[0] ^= 0x01;
        assert_eq!(TelemetryPacket::decode(&bytes), Err(WireError::Integrity));
    }

    #[test]
    fn test_decode_rejects_corrupted_crc() {
        let mut bytes = ControlPacket::new(10, 20).to_bytes();
        bytes[CONTROL_WIRE_SIZE - 1] ^= 0x80;
        assert_eq!(ControlPacket::decode(&bytes), Err(WireError::Integrity));
    }

    #[test]
    fn test_decode_any_single_bit_flip_fails() {
        let bytes = ControlPacket::new(0x5A, 0xA5).to_bytes();
        for byte in 0..CONTROL_WIRE_SIZE {
            for bit in 0..8 {
                let mut flipped = bytes;
                flipped[byte] ^= 1 << bit;
                assert_eq!(
                    ControlPacket::decode(&flipped),
                    Err(WireError::Integrity),
                    "bit {bit} of byte {byte} survived"
                );
            }
        }
    }
}
