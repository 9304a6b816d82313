//! WiFi connection management.
//!
//! [`ConnectionManager`] drives a [`WifiStack`] through one bring-up and
//! blocks the caller until the stack reports a terminal outcome. Each
//! attempt gets its own [`SignalSet`] and [`StationMachine`], owned by the
//! event handler registered for that attempt and released when it ends.

use super::event::WifiEvent;
use super::signal::{Signal, SignalSet};
use super::station::{Connector, StationMachine};
use crate::config::{AccessPointConfig, AuthMode, ConfigError, StationConfig};
use log::{error, info, warn};
use std::fmt;
use std::sync::Arc;

/// Network stack facilities the manager needs.
///
/// Events are delivered on the stack's own context; the manager never polls.
pub trait WifiStack {
    /// Error reported by stack operations.
    type Error;
    /// Handle used from the event context to request association.
    type Connector: Connector + Send + 'static;
    /// Keeps an event handler registered until dropped.
    type Subscription;

    /// Put the interface in station mode with the given credentials.
    fn set_station_config(&mut self, config: &StationConfig) -> Result<(), Self::Error>;

    /// Put the interface in soft AP mode with the given settings.
    fn set_access_point_config(&mut self, config: &AccessPointConfig) -> Result<(), Self::Error>;

    /// Start the configured interface.
    fn start(&mut self) -> Result<(), Self::Error>;

    /// Get a connect handle for the event handler.
    fn connector(&self) -> Self::Connector;

    /// Register a handler for station, IP and soft AP events.
    fn subscribe<F>(&mut self, handler: F) -> Result<Self::Subscription, Self::Error>
    where
        F: FnMut(WifiEvent) + Send + 'static;
}

/// Result of one station bring-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionOutcome {
    /// Station holds an IP address.
    Connected,
    /// Retries were exhausted.
    Failed,
    /// The wait ended before the stack reported either outcome.
    Pending,
}

impl ConnectionOutcome {
    /// Check if the station came up.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected => write!(f, "connected"),
            Self::Failed => write!(f, "failed"),
            Self::Pending => write!(f, "pending"),
        }
    }
}

/// A running soft access point.
///
/// Client join/leave logging stays registered while this value lives.
pub struct AccessPoint<T> {
    ssid: String,
    auth_mode: AuthMode,
    max_clients: u8,
    _subscription: T,
}

impl<T> AccessPoint<T> {
    /// Advertised SSID.
    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    /// Advertised authentication mode.
    pub fn auth_mode(&self) -> AuthMode {
        self.auth_mode
    }

    /// Client limit.
    pub fn max_clients(&self) -> u8 {
        self.max_clients
    }
}

/// Owns the network stack and runs bring-up sequences on it.
pub struct ConnectionManager<S> {
    stack: S,
}

impl<S> ConnectionManager<S>
where
    S: WifiStack,
    WifiError: From<S::Error>,
{
    /// Create a manager over an initialized stack.
    pub fn new(stack: S) -> Self {
        Self { stack }
    }

    /// Access the underlying stack.
    pub fn stack(&self) -> &S {
        &self.stack
    }

    /// Mutable access to the underlying stack.
    pub fn stack_mut(&mut self) -> &mut S {
        &mut self.stack
    }

    /// Release the stack.
    pub fn into_inner(self) -> S {
        self.stack
    }

    /// Join the configured network and block until it is joined or retries
    /// run out.
    ///
    /// Without `config.connect_timeout` this waits as long as the stack
    /// takes to deliver a terminal event.
    pub fn bring_up_station(
        &mut self,
        config: &StationConfig,
    ) -> Result<ConnectionOutcome, WifiError> {
        config.validate()?;

        let signals = Arc::new(SignalSet::new());
        let mut machine =
            StationMachine::new(self.stack.connector(), signals.clone(), config.max_retries);

        // Register before starting so StationStarted is not missed
        let subscription = self.stack.subscribe(move |event| machine.handle(event))?;

        self.stack.set_station_config(config)?;
        info!("Connecting to WiFi: {}", config.ssid);
        self.stack.start()?;

        let outcome = match signals.wait(config.connect_timeout) {
            Some(Signal::Connected) => {
                info!("Connected to AP SSID: {}", config.ssid);
                ConnectionOutcome::Connected
            }
            Some(Signal::Failed) => {
                warn!("Failed to connect to SSID: {}", config.ssid);
                ConnectionOutcome::Failed
            }
            None => {
                match config.connect_timeout {
                    Some(timeout) => warn!(
                        "No connection outcome for SSID {} after {:?}",
                        config.ssid, timeout
                    ),
                    None => error!("Unexpected wakeup with no connection outcome"),
                }
                ConnectionOutcome::Pending
            }
        };

        drop(subscription);
        Ok(outcome)
    }

    /// Host a soft access point.
    ///
    /// Returns once the interface is started; the returned guard keeps
    /// client join/leave logging registered.
    pub fn start_access_point(
        &mut self,
        config: &AccessPointConfig,
    ) -> Result<AccessPoint<S::Subscription>, WifiError> {
        config.validate()?;

        let subscription = self.stack.subscribe(|event| {
            if event.is_access_point_event() {
                info!("{}", event);
            }
        })?;

        self.stack.set_access_point_config(config)?;
        self.stack.start()?;

        info!(
            "Soft AP started. SSID: {} auth: {} max clients: {}",
            config.ssid,
            config.auth_mode(),
            config.max_clients
        );

        Ok(AccessPoint {
            ssid: config.ssid.clone(),
            auth_mode: config.auth_mode(),
            max_clients: config.max_clients,
            _subscription: subscription,
        })
    }
}

/// Errors that can occur during WiFi operations.
#[derive(Debug)]
pub enum WifiError {
    /// Configuration failed validation.
    Config(ConfigError),
    /// SSID could not be handed to the driver.
    InvalidSsid,
    /// Password could not be handed to the driver.
    InvalidPassword,
    /// The network stack rejected an operation.
    Stack(Box<dyn std::error::Error + Send + Sync>),
}

impl WifiError {
    /// Wrap a stack-specific error.
    pub fn stack<E>(e: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Stack(Box::new(e))
    }
}

impl From<ConfigError> for WifiError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

#[cfg(feature = "esp32")]
impl From<esp_idf_sys::EspError> for WifiError {
    fn from(e: esp_idf_sys::EspError) -> Self {
        Self::stack(e)
    }
}

impl fmt::Display for WifiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid configuration: {}", e),
            Self::InvalidSsid => write!(f, "invalid SSID"),
            Self::InvalidPassword => write!(f, "invalid password"),
            Self::Stack(e) => write!(f, "network stack error: {}", e),
        }
    }
}

impl std::error::Error for WifiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Stack(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wifi::sim::{Attempt, SimError, SimulatedStack};
    use std::net::Ipv4Addr;
    use std::time::Duration;

    const IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 42);

    fn station(max_retries: u32) -> StationConfig {
        StationConfig::new("HomeNet", "password123")
            .unwrap()
            .with_max_retries(max_retries)
            .with_connect_timeout(Duration::from_secs(5))
    }

    #[test]
    fn test_connects_first_try() {
        let stack = SimulatedStack::new([Attempt::Associate(IP)]);
        let mut manager = ConnectionManager::new(stack);
        let outcome = manager.bring_up_station(&station(5)).unwrap();
        assert_eq!(outcome, ConnectionOutcome::Connected);
        assert_eq!(manager.stack().connect_requests(), 1);
    }

    #[test]
    fn test_connects_after_two_drops() {
        let stack = SimulatedStack::new([Attempt::Drop, Attempt::Drop, Attempt::Associate(IP)]);
        let mut manager = ConnectionManager::new(stack);
        let outcome = manager.bring_up_station(&station(5)).unwrap();
        assert!(outcome.is_connected());
        assert_eq!(manager.stack().connect_requests(), 3);
    }

    #[test]
    fn test_fails_when_retries_exhausted() {
        let stack = SimulatedStack::always_dropping();
        let mut manager = ConnectionManager::new(stack);
        let outcome = manager.bring_up_station(&station(5)).unwrap();
        assert_eq!(outcome, ConnectionOutcome::Failed);
        // initial connect plus five retries, nothing after the failure
        assert_eq!(manager.stack().connect_requests(), 6);
    }

    #[test]
    fn test_zero_retries_fails_on_first_drop() {
        let stack = SimulatedStack::always_dropping();
        let mut manager = ConnectionManager::new(stack);
        let outcome = manager.bring_up_station(&station(0)).unwrap();
        assert_eq!(outcome, ConnectionOutcome::Failed);
        assert_eq!(manager.stack().connect_requests(), 1);
    }

    #[test]
    fn test_success_on_last_allowed_retry() {
        let stack = SimulatedStack::new([
            Attempt::Drop,
            Attempt::Drop,
            Attempt::Associate(IP),
        ]);
        let mut manager = ConnectionManager::new(stack);
        let outcome = manager.bring_up_station(&station(2)).unwrap();
        assert_eq!(outcome, ConnectionOutcome::Connected);
    }

    #[test]
    fn test_silent_stack_times_out_pending() {
        let stack = SimulatedStack::new([Attempt::Silent]);
        let mut manager = ConnectionManager::new(stack);
        let config = StationConfig::new("HomeNet", "password123")
            .unwrap()
            .with_connect_timeout(Duration::from_millis(50));
        let outcome = manager.bring_up_station(&config).unwrap();
        assert_eq!(outcome, ConnectionOutcome::Pending);
    }

    #[test]
    fn test_handler_unregistered_after_bring_up() {
        let stack = SimulatedStack::new([Attempt::Associate(IP)]);
        let mut manager = ConnectionManager::new(stack);
        manager.bring_up_station(&station(5)).unwrap();
        assert_eq!(manager.stack().handler_count(), 0);
    }

    #[test]
    fn test_each_attempt_starts_fresh() {
        let stack = SimulatedStack::always_dropping();
        let mut manager = ConnectionManager::new(stack);
        assert_eq!(
            manager.bring_up_station(&station(1)).unwrap(),
            ConnectionOutcome::Failed
        );
        manager.stack_mut().push_attempt(Attempt::Associate(IP));
        assert_eq!(
            manager.bring_up_station(&station(1)).unwrap(),
            ConnectionOutcome::Connected
        );
    }

    #[test]
    fn test_station_mode_configured() {
        let stack = SimulatedStack::new([Attempt::Associate(IP)]);
        let mut manager = ConnectionManager::new(stack);
        manager.bring_up_station(&station(5)).unwrap();
        assert_eq!(manager.stack().station_ssid(), Some("HomeNet".to_string()));
    }

    #[test]
    fn test_stack_start_failure_is_reported() {
        let mut stack = SimulatedStack::new([]);
        stack.fail_start();
        let mut manager = ConnectionManager::new(stack);
        let result = manager.bring_up_station(&station(5));
        assert!(matches!(result, Err(WifiError::Stack(_))));
        assert_eq!(manager.stack().handler_count(), 0);
    }

    #[test]
    fn test_invalid_config_rejected_before_stack() {
        let stack = SimulatedStack::new([]);
        let mut manager = ConnectionManager::new(stack);
        let mut config = station(5);
        config.ssid = String::new();
        let result = manager.bring_up_station(&config);
        assert!(matches!(result, Err(WifiError::Config(ConfigError::SsidEmpty))));
        assert_eq!(manager.stack().connect_requests(), 0);
    }

    #[test]
    fn test_open_access_point() {
        let stack = SimulatedStack::new([]);
        let mut manager = ConnectionManager::new(stack);
        let config = AccessPointConfig::new("wifi_test", "", 4).unwrap();
        let ap = manager.start_access_point(&config).unwrap();
        assert_eq!(ap.ssid(), "wifi_test");
        assert_eq!(ap.auth_mode(), AuthMode::Open);
        assert_eq!(ap.max_clients(), 4);
        assert_eq!(manager.stack().handler_count(), 1);
        assert_eq!(
            manager.stack().access_point_auth_mode(),
            Some(AuthMode::Open)
        );
        drop(ap);
        assert_eq!(manager.stack().handler_count(), 0);
    }

    #[test]
    fn test_access_point_never_connects() {
        let stack = SimulatedStack::new([]);
        let mut manager = ConnectionManager::new(stack);
        let config = AccessPointConfig::new("wifi_test", "password", 4).unwrap();
        let _ap = manager.start_access_point(&config).unwrap();
        assert_eq!(manager.stack().connect_requests(), 0);
    }

    #[test]
    fn test_error_display_and_source() {
        use std::error::Error;
        let err = WifiError::from(ConfigError::SsidEmpty);
        assert_eq!(err.to_string(), "invalid configuration: SSID cannot be empty");
        assert!(err.source().is_some());

        let err = WifiError::from(SimError::StartRejected);
        assert!(err.to_string().starts_with("network stack error"));
        assert!(WifiError::InvalidSsid.source().is_none());
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(ConnectionOutcome::Connected.to_string(), "connected");
        assert_eq!(ConnectionOutcome::Failed.to_string(), "failed");
        assert_eq!(ConnectionOutcome::Pending.to_string(), "pending");
        assert!(!ConnectionOutcome::Failed.is_connected());
    }
}
