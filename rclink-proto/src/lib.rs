//! Wire format, CRC32 integrity, and packet codec for the RC-UDP link.
//!
//! This crate defines the two datagram payloads exchanged between the
//! transmitter-side controller and the PC relay, and nothing else:
//!
//! - [`TelemetryPacket`] — transmitter → relay, periodic live state report
//! - [`ControlPacket`] — relay → transmitter, output override request
//!
//! # Wire Format
//!
//! Both packets are fixed-layout, little-endian, with no padding. The final
//! four bytes are always a CRC32 computed over **all preceding bytes only** —
//! the checksum never covers itself.
//!
//! ```text
//! TelemetryPacket (12 bytes):
//! in_throttle:u8 | in_steer:u8 | in_button:u16 | out_throttle:u8 |
//! out_steer:u8 | battery_mv:u16 | crc:u32
//!
//! ControlPacket (6 bytes):
//! out_throttle:u8 | out_steer:u8 | crc:u32
//! ```
//!
//! The CRC32 variant is CRC-32/ISO-HDLC (see [`crc32`]); both link ends use
//! the one constant defined here. A variant mismatch between ends does not
//! corrupt values — it rejects every packet.
//!
//! # Decoding Rules
//!
//! A buffer whose length is not exactly the packet size is rejected as
//! [`WireError::Malformed`] with no attempt at partial parsing; on a
//! connectionless transport the caller must discard the entire datagram.
//! A length-correct buffer whose trailing CRC does not match the payload is
//! rejected as [`WireError::Integrity`] and must be treated as untrusted.
//!
//! # Example
//!
//! ```
//! use rclink_proto::ControlPacket;
//!
//! let packet = ControlPacket::new(128, 40);
//! let bytes = packet.to_bytes();
//! assert_eq!(ControlPacket::decode(&bytes).unwrap(), packet);
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//! - **`heapless`**: Enable `encode_to_vec()` helpers
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod crc32;
pub mod parser;
pub mod serialize;
pub mod types;

// Re-export types at crate root for convenience
pub use crc32::{checksum, Crc32Digest};
pub use parser::WireError;
pub use serialize::{Encode, EncodeError};
pub use types::{ControlPacket, TelemetryPacket, CONTROL_WIRE_SIZE, TELEMETRY_WIRE_SIZE};
