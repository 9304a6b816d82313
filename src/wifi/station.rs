//! Station connect/retry state machine.
//!
//! ```text
//!  [Idle] --StationStarted--> [Connecting]
//!  [Connecting] --StationDisconnected & retries<max--> [Connecting] (retry, counter++)
//!  [Connecting] --StationDisconnected & retries==max--> [Failed]
//!  [Connecting] --GotIp--> [Connected] (counter reset)
//! ```
//!
//! The machine runs on the network stack's event context and is its only
//! writer. Terminal states release the blocked caller through the shared
//! [`SignalSet`].

use super::event::WifiEvent;
use super::signal::{Signal, SignalSet};
use log::{debug, info, warn};
use std::fmt;
use std::sync::Arc;

/// Issues association requests to the configured access point.
///
/// Called from the event context, so implementations must not block on the
/// event loop.
pub trait Connector {
    type Error: fmt::Display;

    /// Ask the stack to (re)associate.
    fn connect(&self) -> Result<(), Self::Error>;
}

/// Position in the bring-up sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationState {
    /// Interface configured, not yet started.
    Idle,
    /// Association in progress or being retried.
    Connecting,
    /// Address acquired.
    Connected,
    /// Retries exhausted.
    Failed,
}

impl StationState {
    /// True once the attempt has an outcome.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Connected | Self::Failed)
    }
}

/// Retry state for one bring-up attempt.
pub struct StationMachine<C> {
    connector: C,
    signals: Arc<SignalSet>,
    max_retries: u32,
    retries: u32,
    state: StationState,
}

impl<C: Connector> StationMachine<C> {
    /// Create a machine in [`StationState::Idle`] bound to one attempt's signals.
    pub fn new(connector: C, signals: Arc<SignalSet>, max_retries: u32) -> Self {
        Self {
            connector,
            signals,
            max_retries,
            retries: 0,
            state: StationState::Idle,
        }
    }

    /// Current state.
    pub fn state(&self) -> StationState {
        self.state
    }

    /// Reconnect attempts issued since the last successful association.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// React to one notification from the stack.
    pub fn handle(&mut self, event: WifiEvent) {
        if event.is_access_point_event() {
            info!("{}", event);
            return;
        }

        if self.state.is_terminal() {
            debug!("Ignoring '{}' in state {:?}", event, self.state);
            return;
        }

        // Leftovers from a previous session, e.g. the disconnect posted
        // when a connected driver is stopped before restarting
        if self.state == StationState::Idle && event != WifiEvent::StationStarted {
            debug!("Ignoring '{}' before station start", event);
            return;
        }

        match event {
            WifiEvent::StationStarted => {
                info!("Station started, connecting to AP");
                self.state = StationState::Connecting;
                self.request_connect();
            }
            WifiEvent::StationDisconnected if self.retries < self.max_retries => {
                self.retries += 1;
                self.state = StationState::Connecting;
                info!(
                    "Retrying connection to AP ({}/{})",
                    self.retries, self.max_retries
                );
                self.request_connect();
            }
            WifiEvent::StationDisconnected => {
                self.state = StationState::Failed;
                self.signals.raise(Signal::Failed);
                warn!(
                    "Failed to connect to AP after {} retries",
                    self.retries
                );
            }
            WifiEvent::GotIp(ip) => {
                info!("Got IP: {}", ip);
                self.retries = 0;
                self.state = StationState::Connected;
                self.signals.raise(Signal::Connected);
            }
            WifiEvent::ClientJoined { .. } | WifiEvent::ClientLeft { .. } => {}
        }
    }

    fn request_connect(&self) {
        if let Err(e) = self.connector.connect() {
            warn!("Connect request rejected: {}", e);
        }
    }
}
