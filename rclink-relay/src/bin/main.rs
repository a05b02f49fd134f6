use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rclink_relay::{RelayConfig, RelayHub};

#[derive(Parser, Debug)]
#[command(
    name = "rclink-relay",
    about = "UDP relay for RC transmitter telemetry and overrides"
)]
struct Args {
    /// UDP port to listen on
    #[arg(short, long, default_value_t = 3333)]
    port: u16,
    /// Milliseconds without telemetry before a transmitter is hidden
    #[arg(long, default_value_t = 2500)]
    disable_ms: u64,
    /// Milliseconds without telemetry before a transmitter is dropped
    #[arg(long, default_value_t = 10_000)]
    delete_ms: u64,
    /// Seconds between status lines
    #[arg(long, default_value_t = 1)]
    status_secs: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "rclink_relay=info".into()),
        )
        .init();

    let args = Args::parse();
    let hub = RelayHub::bind(RelayConfig {
        listen_port: args.port,
        disable_after: Duration::from_millis(args.disable_ms),
        delete_after: Duration::from_millis(args.delete_ms),
        ..RelayConfig::default()
    })?;
    info!("listening on {}", hub.local_addr()?);

    loop {
        std::thread::sleep(Duration::from_secs(args.status_secs.max(1)));
        for id in hub.alive_transmitters() {
            if let Ok(t) = hub.telemetry(id) {
                info!(
                    id,
                    in_throttle = t.in_throttle,
                    in_steer = t.in_steer,
                    out_throttle = t.out_throttle,
                    out_steer = t.out_steer,
                    battery_mv = t.battery_mv,
                    "transmitter"
                );
            }
        }
    }
}
