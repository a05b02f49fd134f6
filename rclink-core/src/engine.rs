//! Calibration/mapping state machine for the two analog control channels.
//!
//! The engine advances one discrete [`tick`](MappingEngine::tick) at a time;
//! the startup wait and center settling are states of the machine, not
//! blocking loops. Phase order is strictly one-way:
//!
//! ```text
//! PowerWait -> CenterSettle -> Calibrating -> Active
//! ```
//!
//! - **PowerWait**: the transmitter reads near zero while switched off; the
//!   engine waits for the raw sum to exceed a powered-on threshold.
//! - **CenterSettle**: a fixed number of filter iterations establish the
//!   resting center for both channels. The center is set once and never
//!   moves afterwards.
//! - **Calibrating**: minimum/maximum breakpoints widen as the sticks are
//!   exercised; the engine promotes to Active exactly once, when both
//!   channels have widened at least the configured margin on both sides.
//! - **Active**: every tick maps the filtered inputs through the
//!   three-point curves. The breakpoints keep widening for the lifetime of
//!   the process.
//!
//! Until Active, both outputs are held at the fixed center levels.

use crate::calibration::{ChannelCal, OutputLevels};
use crate::filter::LowPassFilter;

/// Engine tuning constants. All defaults mirror the transmitter hardware
/// this link was built around; every value is overridable.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EngineConfig {
    /// Low-pass smoothing constant `K` in `value += (raw - value) / K`.
    pub filter_fraction: f32,
    /// Filter iterations used to settle the resting center.
    pub settle_ticks: u16,
    /// Raw throttle + steer must exceed this before calibration begins.
    pub power_on_threshold: u16,
    /// Required widening on each side of center before mapping goes live.
    pub calibration_margin: u16,
    /// Output breakpoints for the throttle channel.
    pub throttle_out: OutputLevels,
    /// Output breakpoints for the steering channel.
    pub steer_out: OutputLevels,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            filter_fraction: 2.0,
            settle_ticks: 4,
            power_on_threshold: 10,
            calibration_margin: 500,
            throttle_out: OutputLevels {
                min: 0,
                center: 60,
                max: 255,
            },
            steer_out: OutputLevels {
                min: 0,
                center: 64,
                max: 128,
            },
        }
    }
}

/// One tick's worth of raw ADC samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample {
    pub throttle: u16,
    pub steer: u16,
}

/// Mapped 8-bit output levels for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MappedLevels {
    pub throttle: u8,
    pub steer: u8,
}

/// Externally visible engine phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    PowerWait,
    CenterSettle,
    Calibrating,
    Active,
}

enum State {
    PowerWait,
    CenterSettle { remaining: u16 },
    Calibrating { throttle: ChannelCal, steer: ChannelCal },
    Active { throttle: ChannelCal, steer: ChannelCal },
}

/// The calibration/mapping engine for both control channels.
pub struct MappingEngine {
    config: EngineConfig,
    state: State,
    throttle_filter: LowPassFilter,
    steer_filter: LowPassFilter,
}

impl MappingEngine {
    /// Create an engine in the PowerWait phase.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let config = EngineConfig {
            settle_ticks: config.settle_ticks.max(1),
            ..config
        };
        Self {
            config,
            state: State::PowerWait,
            throttle_filter: LowPassFilter::seeded(0, config.filter_fraction),
            steer_filter: LowPassFilter::seeded(0, config.filter_fraction),
        }
    }

    /// Advance one tick and return the mapped output levels.
    ///
    /// Before the Active phase this returns the fixed center levels.
    pub fn tick(&mut self, raw: RawSample) -> MappedLevels {
        let cfg = self.config;
        let center = MappedLevels {
            throttle: cfg.throttle_out.center,
            steer: cfg.steer_out.center,
        };

        match &mut self.state {
            State::PowerWait => {
                if u32::from(raw.throttle) + u32::from(raw.steer) > u32::from(cfg.power_on_threshold)
                {
                    self.throttle_filter = LowPassFilter::seeded(raw.throttle, cfg.filter_fraction);
                    self.steer_filter = LowPassFilter::seeded(raw.steer, cfg.filter_fraction);
                    self.state = State::CenterSettle {
                        remaining: cfg.settle_ticks,
                    };
                }
                center
            }
            State::CenterSettle { remaining } => {
                self.throttle_filter.update(raw.throttle);
                self.steer_filter.update(raw.steer);
                *remaining -= 1;
                if *remaining == 0 {
                    let throttle =
                        ChannelCal::at_center(self.throttle_filter.level(), cfg.throttle_out);
                    let steer = ChannelCal::at_center(self.steer_filter.level(), cfg.steer_out);
                    self.state = State::Calibrating { throttle, steer };
                }
                center
            }
            State::Calibrating { throttle, steer } => {
                let t = self.throttle_filter.update(raw.throttle) as u16;
                let s = self.steer_filter.update(raw.steer) as u16;
                throttle.observe(t);
                steer.observe(s);
                if throttle.spread_reached(cfg.calibration_margin)
                    && steer.spread_reached(cfg.calibration_margin)
                {
                    let (throttle, steer) = (*throttle, *steer);
                    self.state = State::Active { throttle, steer };
                }
                center
            }
            State::Active { throttle, steer } => {
                let t = self.throttle_filter.update(raw.throttle) as u16;
                let s = self.steer_filter.update(raw.steer) as u16;
                // Calibration keeps widening for the lifetime of the process
                throttle.observe(t);
                steer.observe(s);
                MappedLevels {
                    throttle: throttle.map(t),
                    steer: steer.map(s),
                }
            }
        }
    }

    /// Current engine phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        match self.state {
            State::PowerWait => Phase::PowerWait,
            State::CenterSettle { .. } => Phase::CenterSettle,
            State::Calibrating { .. } => Phase::Calibrating,
            State::Active { .. } => Phase::Active,
        }
    }

    /// Whether the engine has reached the Active phase.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.state, State::Active { .. })
    }

    /// Engine configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Calibration maps once they exist (Calibrating or Active phase),
    /// as `(throttle, steer)`.
    #[must_use]
    pub fn calibration(&self) -> Option<(&ChannelCal, &ChannelCal)> {
        match &self.state {
            State::Calibrating { throttle, steer } | State::Active { throttle, steer } => {
                Some((throttle, steer))
            }
            _ => None,
        }
    }
}
