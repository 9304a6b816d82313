//! Build the firmware and flash it to ESP32 hardware.
//!
//! Usage:
//!   cargo run --bin flash-esp32          # station role
//!   cargo run --bin flash-esp32 -- --ap  # soft AP role
//!
//! Credentials are baked in at build time from `WIFI_SSID` / `WIFI_PASS`
//! (or `AP_SSID` / `AP_PASS` for the soft AP role).

use std::process::{exit, Command};

const TARGET: &str = "xtensa-esp32-espidf";

fn main() {
    let access_point = std::env::args().skip(1).any(|arg| arg == "--ap");
    let features = if access_point {
        "esp32,role-ap"
    } else {
        "esp32"
    };

    println!("=== Building firmware for {} ({}) ===\n", TARGET, features);

    let status = Command::new("cargo")
        .args([
            "build",
            "--bin",
            "firmware",
            "--release",
            "--target",
            TARGET,
            "--features",
            features,
        ])
        .status();

    if !matches!(status, Ok(s) if s.success()) {
        eprintln!("\nBuild failed!");
        exit(1);
    }

    println!("\n=== Flashing to device ===\n");

    let image = format!("target/{}/release/firmware", TARGET);
    let status = Command::new("espflash")
        .args(["flash", "--monitor", image.as_str()])
        .status();

    if !matches!(status, Ok(s) if s.success()) {
        eprintln!("\nFlash failed!");
        exit(1);
    }
}
