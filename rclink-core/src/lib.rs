//! Platform-agnostic transmitter-side engine for the RC-UDP link.
//!
//! This crate holds everything the embedded controller does between "raw ADC
//! sample" and "datagram on the wire", without any platform-specific
//! dependencies. It can run on a microcontroller or on a host (simulator,
//! tests) behind two small trait seams.
//!
//! # Overview
//!
//! - [`filter`]: exponential low-pass filtering of raw samples
//! - [`calibration`]: continuously-widening three-point input map with
//!   piecewise-linear interpolation
//! - [`engine`]: the calibration/mapping state machine, driven by discrete
//!   [`MappingEngine::tick`] calls
//! - [`override_signal`]: single-slot remote override with a bounded
//!   validity window
//! - [`io`]: the [`TransmitterIo`] seam to ADC/DAC hardware
//! - [`transport`]: the [`Transport`] seam to the datagram socket
//! - [`link`]: [`TransmitterLink`], one `poll()` per loop iteration tying
//!   the above together
//!
//! # Time
//!
//! The engine never reads a clock. Callers pass a monotonic millisecond
//! timestamp into [`TransmitterLink::poll`]; freshness decisions (the
//! override validity window, the telemetry send interval) are pure functions
//! of that value.
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod calibration;
pub mod engine;
pub mod filter;
pub mod io;
pub mod link;
pub mod override_signal;
pub mod transport;

// Re-export main types at crate root
pub use calibration::{ChannelCal, OutputLevels};
pub use engine::{EngineConfig, MappedLevels, MappingEngine, Phase, RawSample};
pub use filter::LowPassFilter;
pub use io::TransmitterIo;
pub use link::{LinkConfig, PollReport, TransmitterLink, MAX_PACKETS_PER_SECOND};
pub use override_signal::{OverrideLevels, OverrideSignal};
pub use transport::{Transport, TransportError};
