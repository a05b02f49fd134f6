//! rclink-sim — simulated RC transmitter for the UDP link.
//!
//! Drives the full transmitter-side stack (`rclink-core`) on a host
//! machine: synthetic noisy stick input, real UDP transport, one engine
//! tick per loop iteration. Useful for exercising a relay without the
//! embedded hardware.

mod net;
mod sticks;

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rclink_core::{EngineConfig, LinkConfig, TransmitterLink};

use net::UdpTransport;
use sticks::{SimSticks, SticksConfig};

#[derive(Parser, Debug)]
#[command(name = "rclink-sim", about = "Simulated RC transmitter for the UDP link")]
struct Args {
    /// Relay address to report to
    #[arg(long, default_value = "127.0.0.1:3333")]
    relay: String,
    /// Telemetry packets per second
    #[arg(long, default_value_t = 100)]
    pps: u16,
    /// Engine tick interval in milliseconds
    #[arg(long, default_value_t = 5)]
    tick_ms: u64,
    /// Override validity window in milliseconds
    #[arg(long, default_value_t = 500)]
    override_valid_ms: u64,
    /// Uniform stick noise amplitude in ADC counts
    #[arg(long, default_value_t = 8)]
    noise: u16,
    /// Stick sweep period in ticks
    #[arg(long, default_value_t = 2000)]
    sweep_ticks: u32,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "rclink_sim=info".into()),
        )
        .init();

    let args = Args::parse();
    let relay: SocketAddr = args
        .relay
        .parse()
        .with_context(|| format!("invalid relay address {:?}", args.relay))?;

    let transport = UdpTransport::connect(relay).context("bind UDP socket")?;
    info!(
        "reporting to {relay} from {}",
        transport.local_addr().context("local addr")?
    );

    let sticks = SimSticks::new(SticksConfig {
        noise: args.noise,
        sweep_period_ticks: args.sweep_ticks,
        ..SticksConfig::default()
    });

    let mut link = TransmitterLink::new(
        transport,
        sticks,
        LinkConfig {
            packets_per_second: args.pps,
            override_valid_ms: args.override_valid_ms,
            engine: EngineConfig::default(),
        },
    );

    let started = Instant::now();
    let mut last_phase = link.phase();
    let mut override_active = false;

    loop {
        let now_ms = started.elapsed().as_millis() as u64;
        link.io_mut().step();
        let report = link.poll(now_ms);

        let phase = link.phase();
        if phase != last_phase {
            info!(?phase, "engine phase change");
            last_phase = phase;
        }

        if report.override_active != override_active {
            override_active = report.override_active;
            let (throttle, steer) = link.io().outputs();
            if override_active {
                info!(throttle, steer, "remote override engaged");
            } else {
                info!(throttle, steer, "override expired, back to local mapping");
            }
        }

        if report.integrity_failures > 0 {
            warn!("dropped corrupted control packet, override cleared");
        }

        std::thread::sleep(Duration::from_millis(args.tick_ms.max(1)));
    }
}
