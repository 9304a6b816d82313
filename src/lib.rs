//! ESP32 WiFi bring-up firmware library.
//!
//! This library contains the WiFi connection manager and its configuration.
//! Everything except the ESP-IDF binding can be tested on the host machine
//! against [`wifi::SimulatedStack`].

pub mod config;
pub mod wifi;

// Re-export commonly used items
pub use config::{AccessPointConfig, AuthMode, ConfigError, StationConfig, WifiRole};
pub use wifi::{ConnectionManager, ConnectionOutcome, WifiError, WifiEvent, WifiStack};
