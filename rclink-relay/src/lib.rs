//! PC-side UDP relay for the RC transmitter link.
//!
//! The relay listens for [`TelemetryPacket`](rclink_proto::TelemetryPacket)
//! datagrams from any number of transmitters, tracks each peer's liveness,
//! and dispatches queued [`OverrideCommand`]s back as
//! [`ControlPacket`](rclink_proto::ControlPacket)s.
//!
//! # Architecture
//!
//! One receive-loop thread owns all writes to the shared state (peer
//! registry + override queue); any number of caller threads query and
//! command through [`RelayHub`]'s accessors. Every access goes through a
//! single mutex held only for the duration of one discrete operation — the
//! blocking socket receive always happens outside the lock.
//!
//! ```text
//! transmitters ── telemetry ──> receive loop ──> registry ──> queries
//!                                    │               ▲
//!                                    └── pops ── override queue <── callers
//! ```
//!
//! # Liveness
//!
//! A peer is `Alive` while telemetry keeps arriving, `Disabled` (invisible
//! to every query, but able to recover) once it goes quiet, and erased once
//! it stays quiet past the deletion threshold. See [`registry`].

pub mod config;
pub mod error;
pub mod hub;
pub mod registry;

pub use config::RelayConfig;
pub use error::RelayError;
pub use hub::{OverrideCommand, RelayHub};
pub use registry::{PeerKey, Registry, TransmitterId, TransmitterRecord};
