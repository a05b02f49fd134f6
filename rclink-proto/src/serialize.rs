//! Packet encoding for link datagrams.
//!
//! Packets are encoded field-by-field in declaration order, little-endian,
//! with the CRC32 of the preceding bytes appended last. The checksum is
//! accumulated incrementally while writing, so the payload is never copied
//! into an intermediate buffer.
//!
//! # Example
//!
//! ```
//! use rclink_proto::{Encode, TelemetryPacket, TELEMETRY_WIRE_SIZE};
//!
//! let packet = TelemetryPacket::default();
//! let mut buf = [0u8; TELEMETRY_WIRE_SIZE];
//! let len = packet.encode(&mut buf).unwrap();
//! assert_eq!(len, TELEMETRY_WIRE_SIZE);
//! ```

use crate::crc32::Crc32Digest;
use crate::types::{ControlPacket, TelemetryPacket, CONTROL_WIRE_SIZE, TELEMETRY_WIRE_SIZE};

/// Error type for encoding operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// The output buffer is too small to hold the encoded packet.
    BufferTooSmall,
}

impl core::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::BufferTooSmall => write!(f, "buffer too small"),
        }
    }
}

/// Helper for buffer management with incremental CRC32 accumulation.
struct EncodeBuf<'a> {
    buf: &'a mut [u8],
    pos: usize,
    crc: Crc32Digest,
}

impl<'a> EncodeBuf<'a> {
    #[inline]
    fn new(buf: &'a mut [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            crc: Crc32Digest::new(),
        }
    }

    /// Write payload bytes and accumulate them into the checksum.
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.crc.update(bytes);
        self.pos += bytes.len();
    }

    #[inline]
    fn write_u8(&mut self, value: u8) {
        self.write(&[value]);
    }

    #[inline]
    fn write_u16(&mut self, value: u16) {
        self.write(&value.to_le_bytes());
    }

    /// Finalize by appending the CRC32 of everything written so far.
    #[inline]
    fn finalize(self) -> usize {
        let crc = self.crc.finalize();
        let mut pos = self.pos;
        self.buf[pos..pos + 4].copy_from_slice(&crc.to_le_bytes());
        pos += 4;
        pos
    }
}

/// Extension trait for encoding link packets.
pub trait Encode {
    /// Encode into the provided buffer.
    ///
    /// Returns the number of bytes written on success.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::BufferTooSmall`] if the buffer cannot hold the
    /// full packet.
    fn encode(&self, buf: &mut [u8]) -> Result<usize, EncodeError>;

    /// Encode into a `heapless::Vec`.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::BufferTooSmall`] if `N` is not large enough.
    #[cfg(feature = "heapless")]
    fn encode_to_vec<const N: usize>(&self) -> Result<heapless::Vec<u8, N>, EncodeError> {
        let mut vec = heapless::Vec::new();
        vec.resize(N, 0).map_err(|_| EncodeError::BufferTooSmall)?;
        let len = self.encode(&mut vec)?;
        vec.truncate(len);
        Ok(vec)
    }
}

impl Encode for TelemetryPacket {
    fn encode(&self, buf: &mut [u8]) -> Result<usize, EncodeError> {
        if buf.len() < TELEMETRY_WIRE_SIZE {
            return Err(EncodeError::BufferTooSmall);
        }

        let mut eb = EncodeBuf::new(buf);
        eb.write_u8(self.in_throttle);
        eb.write_u8(self.in_steer);
        eb.write_u16(self.in_button);
        eb.write_u8(self.out_throttle);
        eb.write_u8(self.out_steer);
        eb.write_u16(self.battery_mv);
        Ok(eb.finalize())
    }
}

impl Encode for ControlPacket {
    fn encode(&self, buf: &mut [u8]) -> Result<usize, EncodeError> {
        if buf.len() < CONTROL_WIRE_SIZE {
            return Err(EncodeError::BufferTooSmall);
        }

        let mut eb = EncodeBuf::new(buf);
        eb.write_u8(self.out_throttle);
        eb.write_u8(self.out_steer);
        Ok(eb.finalize())
    }
}

impl TelemetryPacket {
    /// Encode into a fixed-size array. Cannot fail.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; TELEMETRY_WIRE_SIZE] {
        let mut buf = [0u8; TELEMETRY_WIRE_SIZE];
        let len = self
            .encode(&mut buf)
            .expect("fixed buffer matches wire size");
        debug_assert_eq!(len, TELEMETRY_WIRE_SIZE);
        buf
    }
}

impl ControlPacket {
    /// Encode into a fixed-size array. Cannot fail.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; CONTROL_WIRE_SIZE] {
        let mut buf = [0u8; CONTROL_WIRE_SIZE];
        let len = self
            .encode(&mut buf)
            .expect("fixed buffer matches wire size");
        debug_assert_eq!(len, CONTROL_WIRE_SIZE);
        buf
    }
}
