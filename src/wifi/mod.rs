//! WiFi connection manager.
//!
//! # Components
//!
//! - [`event`] - Notifications delivered by the network stack
//! - [`signal`] - Two-flag handoff from the event context to the caller
//! - [`station`] - Station connect/retry state machine
//! - [`manager`] - Bring-up entry points and the [`WifiStack`] seam
//! - [`sim`] - Threaded host simulation of the stack
//! - `esp` - ESP-IDF driver binding (ESP32 only)

pub mod event;
pub mod manager;
pub mod signal;
pub mod sim;
pub mod station;

#[cfg(feature = "esp32")]
mod esp;

pub use event::{MacAddr, WifiEvent};
pub use manager::{AccessPoint, ConnectionManager, ConnectionOutcome, WifiError, WifiStack};
pub use signal::{Signal, SignalSet};
pub use sim::{Attempt, SimError, SimulatedStack};
pub use station::{Connector, StationMachine, StationState};

#[cfg(feature = "esp32")]
pub use esp::{EspConnector, EspWifiStack, EspWifiSubscription};
