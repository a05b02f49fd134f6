//! Synthetic stick/battery model standing in for the transmitter hardware.
//!
//! The model plays through the life of a real session: the transmitter is
//! switched off for a moment (inputs read zero), then rests at center while
//! the engine settles, then sweeps both sticks sinusoidally through their
//! full range so continuous calibration can widen the maps. Uniform noise
//! rides on every sample.

use rand::rngs::ThreadRng;
use rand::Rng;

use rclink_core::TransmitterIo;

/// Full-scale value of the simulated 12-bit ADC.
const ADC_MAX: u16 = 4095;

#[derive(Debug, Clone, Copy)]
pub struct SticksConfig {
    /// Ticks before the transmitter "powers on" and inputs leave zero.
    pub power_delay_ticks: u32,
    /// Additional ticks resting at center before the sweep starts.
    pub rest_ticks: u32,
    /// Resting throttle sample.
    pub center_throttle: u16,
    /// Resting steer sample.
    pub center_steer: u16,
    /// Peak stick deflection away from center.
    pub sweep_amplitude: u16,
    /// Ticks per full sweep cycle.
    pub sweep_period_ticks: u32,
    /// Uniform noise amplitude in ADC counts.
    pub noise: u16,
    /// Starting battery voltage in millivolts.
    pub battery_start_mv: u16,
}

impl Default for SticksConfig {
    fn default() -> Self {
        Self {
            power_delay_ticks: 200,
            rest_ticks: 400,
            center_throttle: 1900,
            center_steer: 2100,
            sweep_amplitude: 1400,
            sweep_period_ticks: 2000,
            noise: 8,
            battery_start_mv: 8200,
        }
    }
}

pub struct SimSticks {
    config: SticksConfig,
    rng: ThreadRng,
    tick: u32,
    out_throttle: u8,
    out_steer: u8,
}

impl SimSticks {
    pub fn new(config: SticksConfig) -> Self {
        Self {
            config,
            rng: rand::thread_rng(),
            tick: 0,
            out_throttle: 0,
            out_steer: 0,
        }
    }

    /// Advance the model by one engine tick.
    pub fn step(&mut self) {
        self.tick = self.tick.saturating_add(1);
    }

    /// Levels most recently driven by the engine, `(throttle, steer)`.
    pub fn outputs(&self) -> (u8, u8) {
        (self.out_throttle, self.out_steer)
    }

    fn sample(&mut self, center: u16, quarter_phase: bool) -> u16 {
        let cfg = self.config;
        if self.tick < cfg.power_delay_ticks {
            return 0;
        }

        let sweep_start = cfg.power_delay_ticks + cfg.rest_ticks;
        let deflection = if self.tick < sweep_start {
            0.0
        } else {
            let period = cfg.sweep_period_ticks.max(1);
            let mut t = ((self.tick - sweep_start) % period) as f32 / period as f32;
            if quarter_phase {
                t += 0.25;
            }
            (t * core::f32::consts::TAU).sin() * f32::from(cfg.sweep_amplitude)
        };

        let noise = if cfg.noise == 0 {
            0
        } else {
            self.rng.gen_range(-i32::from(cfg.noise)..=i32::from(cfg.noise))
        };

        (i32::from(center) + deflection as i32 + noise).clamp(0, i32::from(ADC_MAX)) as u16
    }

    fn battery(&self) -> u16 {
        // Slow discharge: one millivolt every 500 ticks
        let drop = self.tick / 500;
        self.config
            .battery_start_mv
            .saturating_sub(drop.min(3000) as u16)
    }
}

impl TransmitterIo for SimSticks {
    fn read_throttle(&mut self) -> u16 {
        let center = self.config.center_throttle;
        self.sample(center, false)
    }

    fn read_steer(&mut self) -> u16 {
        let center = self.config.center_steer;
        self.sample(center, true)
    }

    fn read_button(&mut self) -> u16 {
        0
    }

    fn battery_mv(&mut self) -> u16 {
        self.battery()
    }

    fn write_throttle(&mut self, level: u8) {
        self.out_throttle = level;
    }

    fn write_steer(&mut self, level: u8) {
        self.out_steer = level;
    }
}
