//! Run the connection manager against the simulated stack.
//!
//! # Usage
//!
//! ```bash
//! # Access point drops us twice, then accepts
//! cargo run --bin host-sim -- 2
//!
//! # Access point never accepts, give up after 3 retries
//! cargo run --bin host-sim -- never 3
//!
//! # Host a soft AP and watch two clients come and go
//! cargo run --bin host-sim -- --ap
//! ```

use esp32_wifi_demo::config::{BuildEnv, StationConfig};
use esp32_wifi_demo::wifi::{Attempt, MacAddr, SimulatedStack};
use esp32_wifi_demo::{ConnectionManager, WifiEvent, WifiRole};
use log::{error, info};
use std::net::Ipv4Addr;
use std::process::exit;
use std::time::Duration;

const EVENT_LATENCY: Duration = Duration::from_millis(200);
const ASSIGNED_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 100);

fn usage() -> ! {
    eprintln!("usage: host-sim [<drops>|never] [max-retries]");
    eprintln!("       host-sim --ap");
    exit(2);
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let env = BuildEnv::capture();

    let role = if args.first().map(String::as_str) == Some("--ap") {
        env.role(true)
    } else {
        env.role(false)
    };
    let role = match role {
        Ok(role) => role,
        Err(e) => {
            error!("Invalid build configuration: {}", e);
            exit(1);
        }
    };

    info!("=== Host simulation: {} ===", role.label());

    match role {
        WifiRole::Station(config) => run_station(config, &args),
        WifiRole::AccessPoint(config) => {
            let stack = SimulatedStack::new([]).with_latency(EVENT_LATENCY);
            let mut manager = ConnectionManager::new(stack);
            let ap = match manager.start_access_point(&config) {
                Ok(ap) => ap,
                Err(e) => {
                    error!("Failed to start soft AP: {}", e);
                    exit(1);
                }
            };
            info!("Hosting '{}' ({})", ap.ssid(), ap.auth_mode());

            let mac = MacAddr([0x24, 0x0a, 0xc4, 0x12, 0x34, 0x56]);
            manager.stack().inject(WifiEvent::ClientJoined { mac, aid: 1 });
            manager.stack().inject(WifiEvent::ClientLeft { mac, aid: 1 });
            std::thread::sleep(EVENT_LATENCY * 3);
        }
    }
}

fn run_station(config: StationConfig, args: &[String]) {
    let stack = match args.first().map(String::as_str) {
        None => SimulatedStack::new([Attempt::Associate(ASSIGNED_IP)]),
        Some("never") => SimulatedStack::always_dropping(),
        Some(n) => {
            let drops: usize = n.parse().unwrap_or_else(|_| usage());
            let script = std::iter::repeat(Attempt::Drop)
                .take(drops)
                .chain([Attempt::Associate(ASSIGNED_IP)]);
            SimulatedStack::new(script)
        }
    }
    .with_latency(EVENT_LATENCY);

    let config = match args.get(1) {
        Some(n) => config.with_max_retries(n.parse().unwrap_or_else(|_| usage())),
        None => config,
    };

    let mut manager = ConnectionManager::new(stack);
    match manager.bring_up_station(&config) {
        Ok(outcome) => {
            info!(
                "Outcome: {} after {} connect requests",
                outcome,
                manager.stack().connect_requests()
            );
            if !outcome.is_connected() {
                exit(1);
            }
        }
        Err(e) => {
            error!("Bring-up failed: {}", e);
            exit(1);
        }
    }
}
