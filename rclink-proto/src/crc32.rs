//! CRC32 checksum for link packets.
//!
//! Uses the CRC-32/ISO-HDLC algorithm (reflected polynomial 0x04C11DB7,
//! init and xorout 0xFFFFFFFF) with a lookup table. This is the plain
//! zlib/ethernet CRC32; both ends of the link must use this exact variant,
//! since a variant mismatch rejects every packet rather than corrupting
//! individual fields.

use crc::{Crc, CRC_32_ISO_HDLC};

/// CRC-32/ISO-HDLC calculator with lookup table.
const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Calculate the CRC32 checksum of a byte slice.
///
/// Callers checksumming a packet must pass the payload bytes only, never
/// the trailing checksum field itself.
#[inline]
#[must_use]
pub fn checksum(data: &[u8]) -> u32 {
    CRC32.checksum(data)
}

/// CRC32 digest for incremental calculation.
///
/// Use this when encoding a packet field-by-field into an output buffer.
pub struct Crc32Digest {
    digest: crc::Digest<'static, u32>,
}

impl Crc32Digest {
    /// Create a new CRC32 digest.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            digest: CRC32.digest(),
        }
    }

    /// Update the digest with a byte slice.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        self.digest.update(data);
    }

    /// Finalize and return the checksum value.
    #[inline]
    #[must_use]
    pub fn finalize(self) -> u32 {
        self.digest.finalize()
    }
}

impl Default for Crc32Digest {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_check_value() {
        // The standard CRC-32/ISO-HDLC check input
        assert_eq!(checksum(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn test_crc32_empty() {
        assert_eq!(checksum(&[]), 0x0000_0000);
    }

    #[test]
    fn test_crc32_deterministic() {
        let data = [0x01, 0x80, 0x00, 0x00, 0x3C, 0x40, 0x40, 0x1F];
        assert_eq!(checksum(&data), checksum(&data));
    }

    #[test]
    fn test_crc32_single_bit_flip_changes_checksum() {
        let data = [0x01, 0x80, 0x00, 0x00, 0x3C, 0x40, 0x40, 0x1F];
        let reference = checksum(&data);

        for byte in 0..data.len() {
            for bit in 0..8 {
                let mut flipped = data;
                flipped[byte] ^= 1 << bit;
                assert_ne!(
                    checksum(&flipped),
                    reference,
                    "bit {bit} of byte {byte} collided"
                );
            }
        }
    }

    #[test]
    fn test_crc32_digest_matches_batch() {
        let data = [0x7F, 0x28, 0x00, 0x00, 0x3C, 0x40];
        let batch = checksum(&data);

        let mut digest = Crc32Digest::new();
        digest.update(&data[..3]);
        digest.update(&data[3..]);
        assert_eq!(digest.finalize(), batch);
    }
}
