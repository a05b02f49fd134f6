//! Transmitter registry and liveness state machine.
//!
//! One record per peer network address. Lifecycle, driven entirely by
//! packet arrival and elapsed time:
//!
//! ```text
//! (first valid packet) -> Alive -> Disabled -> erased
//!                           ▲          │
//!                           └──────────┘ (telemetry resumes)
//! ```
//!
//! `Disabled` records are excluded from every public query — callers cannot
//! distinguish a disabled peer from an unknown one — but they revive
//! automatically if packets resume before the deletion threshold. Liveness
//! is a pure function of `now - last_seen`, so query results do not depend
//! on cleanup scheduling.

use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use rclink_proto::TelemetryPacket;
use tracing::info;

/// Stable integer handle for a transmitter, assigned at first sight.
///
/// Strictly monotonically increasing: an address that disappears and later
/// reconnects gets a fresh id, so ids are never reused even when addresses
/// are.
pub type TransmitterId = u64;

/// Either stable key into the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerKey {
    Addr(IpAddr),
    Id(TransmitterId),
}

impl From<IpAddr> for PeerKey {
    fn from(addr: IpAddr) -> Self {
        Self::Addr(addr)
    }
}

impl From<TransmitterId> for PeerKey {
    fn from(id: TransmitterId) -> Self {
        Self::Id(id)
    }
}

impl fmt::Display for PeerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Addr(addr) => write!(f, "address {addr}"),
            Self::Id(id) => write!(f, "id {id}"),
        }
    }
}

/// Per-peer registry record.
#[derive(Debug, Clone)]
pub struct TransmitterRecord {
    /// Peer network address (registry key).
    pub addr: IpAddr,
    /// Last observed source port; control packets go back here.
    pub port: u16,
    /// Stable handle, assigned at creation.
    pub id: TransmitterId,
    /// Latest validated telemetry.
    pub telemetry: TelemetryPacket,
    /// Arrival time of the latest validated telemetry.
    pub last_seen: Instant,
    /// Maintained by cleanup so disable transitions are logged once.
    alive: bool,
}

/// The transmitter registry.
///
/// Owned exclusively by the receive loop's shared state; external callers
/// only see record snapshots through the hub's accessors.
pub struct Registry {
    records: HashMap<IpAddr, TransmitterRecord>,
    next_id: TransmitterId,
    disable_after: Duration,
    delete_after: Duration,
}

impl Registry {
    /// Create an empty registry with the given liveness thresholds.
    #[must_use]
    pub fn new(disable_after: Duration, delete_after: Duration) -> Self {
        Self {
            records: HashMap::new(),
            next_id: 0,
            disable_after,
            delete_after,
        }
    }

    /// Apply one validated telemetry packet from `addr:port`.
    ///
    /// Creates the record on first sight (assigning the next id), updates
    /// it otherwise. Traffic from a disabled peer revives it. Returns the
    /// peer's id.
    pub fn apply_telemetry(
        &mut self,
        addr: IpAddr,
        port: u16,
        telemetry: TelemetryPacket,
        now: Instant,
    ) -> TransmitterId {
        match self.records.get_mut(&addr) {
            Some(record) => {
                record.last_seen = now;
                record.telemetry = telemetry;
                record.port = port;
                record.alive = true;
                record.id
            }
            None => {
                let id = self.next_id;
                self.next_id += 1;
                info!(%addr, id, "new transmitter");
                self.records.insert(
                    addr,
                    TransmitterRecord {
                        addr,
                        port,
                        id,
                        telemetry,
                        last_seen: now,
                        alive: true,
                    },
                );
                id
            }
        }
    }

    /// Apply the liveness thresholds to every record.
    ///
    /// Any number of records may be disabled in one scan, but at most one
    /// is erased — iteration stays trivially safe, and the receive loop's
    /// repetition finishes multi-record cleanup within a few passes.
    pub fn cleanup(&mut self, now: Instant) {
        let mut expired: Option<IpAddr> = None;
        for record in self.records.values_mut() {
            let age = now.duration_since(record.last_seen);
            if age >= self.delete_after {
                expired.get_or_insert(record.addr);
                continue;
            }
            if age >= self.disable_after && record.alive {
                info!(addr = %record.addr, id = record.id, "disabling transmitter");
                record.alive = false;
            }
        }
        if let Some(addr) = expired {
            info!(%addr, "removing transmitter");
            self.records.remove(&addr);
        }
    }

    /// Look up a record by either key, only if currently alive.
    #[must_use]
    pub fn get_alive(&self, key: PeerKey, now: Instant) -> Option<&TransmitterRecord> {
        self.get(key).filter(|r| self.is_alive(r, now))
    }

    /// Look up a record by either key regardless of liveness.
    ///
    /// Internal to the relay: public queries must use
    /// [`get_alive`](Self::get_alive) so disabled peers stay invisible.
    #[must_use]
    pub fn get(&self, key: PeerKey) -> Option<&TransmitterRecord> {
        match key {
            PeerKey::Addr(addr) => self.records.get(&addr),
            PeerKey::Id(id) => self.records.values().find(|r| r.id == id),
        }
    }

    /// Ids of all currently alive transmitters.
    #[must_use]
    pub fn alive_ids(&self, now: Instant) -> Vec<TransmitterId> {
        let mut ids: Vec<TransmitterId> = self
            .records
            .values()
            .filter(|r| self.is_alive(r, now))
            .map(|r| r.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Addresses of all currently alive transmitters.
    #[must_use]
    pub fn alive_addrs(&self, now: Instant) -> Vec<IpAddr> {
        self.records
            .values()
            .filter(|r| self.is_alive(r, now))
            .map(|r| r.addr)
            .collect()
    }

    /// Number of records, disabled ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the registry holds no records at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn is_alive(&self, record: &TransmitterRecord, now: Instant) -> bool {
        now.duration_since(record.last_seen) < self.disable_after
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    const DISABLE: Duration = Duration::from_millis(2500);
    const DELETE: Duration = Duration::from_millis(10_000);

    fn addr(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    fn telemetry(in_throttle: u8) -> TelemetryPacket {
        TelemetryPacket {
            in_throttle,
            in_steer: 64,
            ..TelemetryPacket::default()
        }
    }

    fn at(start: Instant, ms: u64) -> Instant {
        start + Duration::from_millis(ms)
    }

    #[test]
    fn test_first_packet_creates_alive_record_with_id_zero() {
        let mut registry = Registry::new(DISABLE, DELETE);
        let now = Instant::now();

        let id = registry.apply_telemetry(addr(5), 31337, telemetry(77), now);
        assert_eq!(id, 0);
        assert_eq!(registry.alive_ids(now), vec![0]);

        let record = registry.get_alive(PeerKey::Addr(addr(5)), now).unwrap();
        assert_eq!(record.telemetry.in_throttle, 77);
        assert_eq!(record.port, 31337);
    }

    #[test]
    fn test_ids_are_strictly_monotonic() {
        let mut registry = Registry::new(DISABLE, DELETE);
        let now = Instant::now();

        assert_eq!(registry.apply_telemetry(addr(1), 1, telemetry(0), now), 0);
        assert_eq!(registry.apply_telemetry(addr(2), 1, telemetry(0), now), 1);
        // Same address keeps its id
        assert_eq!(registry.apply_telemetry(addr(1), 1, telemetry(0), now), 0);
    }

    #[test]
    fn test_liveness_is_pure_function_of_elapsed_time() {
        let mut registry = Registry::new(DISABLE, DELETE);
        let start = Instant::now();
        registry.apply_telemetry(addr(5), 31337, telemetry(10), start);

        // Alive at t=2000 even without any cleanup pass
        assert!(registry.get_alive(PeerKey::Id(0), at(start, 2000)).is_some());
        assert_eq!(registry.alive_ids(at(start, 2000)), vec![0]);

        // Disabled at t=3000: gone from every query, record retained
        assert!(registry.get_alive(PeerKey::Id(0), at(start, 3000)).is_none());
        assert!(registry
            .get_alive(PeerKey::Addr(addr(5)), at(start, 3000))
            .is_none());
        assert!(registry.alive_ids(at(start, 3000)).is_empty());
        assert_eq!(registry.len(), 1);

        // Erased by t=10001
        registry.cleanup(at(start, 10_001));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_disabled_peer_revives_on_traffic() {
        let mut registry = Registry::new(DISABLE, DELETE);
        let start = Instant::now();
        registry.apply_telemetry(addr(5), 31337, telemetry(10), start);

        registry.cleanup(at(start, 3000));
        assert!(registry.get_alive(PeerKey::Id(0), at(start, 3000)).is_none());

        // Telemetry resumes before the delete threshold
        registry.apply_telemetry(addr(5), 31337, telemetry(11), at(start, 4000));
        let record = registry.get_alive(PeerKey::Id(0), at(start, 4000)).unwrap();
        assert_eq!(record.telemetry.in_throttle, 11);
    }

    #[test]
    fn test_cleanup_erases_at_most_one_per_scan() {
        let mut registry = Registry::new(DISABLE, DELETE);
        let start = Instant::now();
        registry.apply_telemetry(addr(1), 1, telemetry(0), start);
        registry.apply_telemetry(addr(2), 1, telemetry(0), start);
        registry.apply_telemetry(addr(3), 1, telemetry(0), start);

        let late = at(start, 20_000);
        registry.cleanup(late);
        assert_eq!(registry.len(), 2);
        registry.cleanup(late);
        assert_eq!(registry.len(), 1);
        registry.cleanup(late);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_reconnect_after_deletion_gets_fresh_id() {
        let mut registry = Registry::new(DISABLE, DELETE);
        let start = Instant::now();
        registry.apply_telemetry(addr(5), 31337, telemetry(0), start);
        registry.cleanup(at(start, 10_001));
        assert!(registry.is_empty());

        let id = registry.apply_telemetry(addr(5), 31337, telemetry(0), at(start, 11_000));
        assert_eq!(id, 1);
    }

    #[test]
    fn test_lookup_by_id_and_address_agree() {
        let mut registry = Registry::new(DISABLE, DELETE);
        let now = Instant::now();
        registry.apply_telemetry(addr(7), 9000, telemetry(42), now);

        let by_addr = registry.get_alive(PeerKey::Addr(addr(7)), now).unwrap();
        let by_id = registry.get_alive(PeerKey::Id(by_addr.id), now).unwrap();
        assert_eq!(by_addr.telemetry.in_throttle, by_id.telemetry.in_throttle);
    }

    #[test]
    fn test_unknown_peer_not_found() {
        let registry = Registry::new(DISABLE, DELETE);
        let now = Instant::now();
        assert!(registry.get_alive(PeerKey::Addr(addr(9)), now).is_none());
        assert!(registry.get_alive(PeerKey::Id(123), now).is_none());
    }
}
