//! Single-slot remote override with a bounded validity window.

use rclink_proto::ControlPacket;

/// Override levels as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OverrideLevels {
    /// Throttle, 0–255 wire range (rescaled by the consumer).
    pub throttle: u8,
    /// Steering level, applied as-is.
    pub steer: u8,
}

/// The single override slot.
///
/// One slot, overwritten rather than queued: a newer control packet simply
/// replaces the previous one. The slot is written only by the link's
/// receive path and read via [`current`](Self::current), which returns a
/// complete snapshot — readers never act on individual fields.
///
/// An honored override is not consumed; it stays in effect until its
/// validity window lapses, then expires silently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OverrideSignal {
    throttle: u8,
    steer: u8,
    received_at_ms: u64,
    ready: bool,
}

impl OverrideSignal {
    /// An empty, not-ready slot.
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            throttle: 0,
            steer: 0,
            received_at_ms: 0,
            ready: false,
        }
    }

    /// Latch a validated control packet into the slot.
    ///
    /// Readiness is dropped first and restored last; a reader that snapshots
    /// mid-update sees "not ready" rather than a half-written signal.
    pub fn latch(&mut self, packet: &ControlPacket, now_ms: u64) {
        self.ready = false;
        self.throttle = packet.out_throttle;
        self.steer = packet.out_steer;
        self.received_at_ms = now_ms;
        self.ready = true;
    }

    /// Reset the slot to not-ready, discarding any stored levels.
    ///
    /// Called on checksum failure: a corrupted override must never be
    /// silently retried with old data.
    pub fn clear(&mut self) {
        *self = Self::idle();
    }

    /// Snapshot the override if it is ready and still within its validity
    /// window, i.e. `received_at + valid_for` is in the future.
    #[must_use]
    pub fn current(&self, now_ms: u64, valid_for_ms: u64) -> Option<OverrideLevels> {
        if self.ready && self.received_at_ms + valid_for_ms > now_ms {
            Some(OverrideLevels {
                throttle: self.throttle,
                steer: self.steer,
            })
        } else {
            None
        }
    }

    /// Whether a validated packet is latched (fresh or not).
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_is_never_current() {
        let signal = OverrideSignal::idle();
        assert_eq!(signal.current(0, 500), None);
        assert_eq!(signal.current(u64::MAX, u64::MAX), None);
    }

    #[test]
    fn test_fresh_within_window() {
        let mut signal = OverrideSignal::idle();
        signal.latch(&ControlPacket::new(200, 40), 1000);

        let levels = signal.current(1400, 500).unwrap();
        assert_eq!(levels.throttle, 200);
        assert_eq!(levels.steer, 40);
    }

    #[test]
    fn test_expires_at_window_edge() {
        let mut signal = OverrideSignal::idle();
        signal.latch(&ControlPacket::new(200, 40), 1000);

        assert!(signal.current(1499, 500).is_some());
        // received_at + window must be strictly in the future
        assert_eq!(signal.current(1500, 500), None);
        assert_eq!(signal.current(2000, 500), None);
        // Expiry does not clear readiness; only staleness gates it
        assert!(signal.is_ready());
    }

    #[test]
    fn test_latch_overwrites_previous() {
        let mut signal = OverrideSignal::idle();
        signal.latch(&ControlPacket::new(10, 20), 1000);
        signal.latch(&ControlPacket::new(30, 40), 1200);

        let levels = signal.current(1300, 500).unwrap();
        assert_eq!(levels.throttle, 30);
        assert_eq!(levels.steer, 40);
    }

    #[test]
    fn test_clear_discards_levels() {
        let mut signal = OverrideSignal::idle();
        signal.latch(&ControlPacket::new(10, 20), 1000);
        signal.clear();

        assert!(!signal.is_ready());
        assert_eq!(signal.current(1001, 500), None);
    }
}
