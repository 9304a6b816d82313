//! Simulated network stack for host builds.
//!
//! Events are delivered from a dedicated dispatch thread, the way ESP-IDF
//! delivers them from its event loop task. Each connect request consumes
//! one scripted [`Attempt`] that decides which event the stack answers with.
//!
//! # Example
//!
//! ```
//! use std::net::Ipv4Addr;
//! use esp32_wifi_demo::config::StationConfig;
//! use esp32_wifi_demo::wifi::{Attempt, ConnectionManager, ConnectionOutcome, SimulatedStack};
//!
//! let stack = SimulatedStack::new([Attempt::Drop, Attempt::Associate(Ipv4Addr::new(10, 0, 0, 7))]);
//! let mut manager = ConnectionManager::new(stack);
//! let config = StationConfig::new("HomeNet", "password123").unwrap();
//! assert_eq!(manager.bring_up_station(&config).unwrap(), ConnectionOutcome::Connected);
//! ```

use super::event::WifiEvent;
use super::manager::{WifiError, WifiStack};
use super::station::Connector;
use crate::config::{AccessPointConfig, AuthMode, StationConfig};
use log::debug;
use std::collections::VecDeque;
use std::fmt;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

type Handler = Box<dyn FnMut(WifiEvent) + Send>;

/// How the simulated access point answers one connect request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    /// Association and DHCP succeed with the given address.
    Associate(Ipv4Addr),
    /// Association fails and the station reports a disconnect.
    Drop,
    /// The request is swallowed and no event follows.
    Silent,
}

#[derive(Debug, Clone)]
enum Mode {
    Station { ssid: String },
    AccessPoint { auth_mode: AuthMode },
}

struct Shared {
    handlers: Mutex<Vec<(u64, Handler)>>,
    next_handler_id: AtomicU64,
    script: Mutex<VecDeque<Attempt>>,
    fallback: Attempt,
    connect_requests: AtomicU32,
    started: AtomicBool,
    latency_ms: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process stand-in for the ESP-IDF WiFi driver.
pub struct SimulatedStack {
    shared: Arc<Shared>,
    events: Sender<WifiEvent>,
    mode: Option<Mode>,
    reject_start: bool,
}

impl SimulatedStack {
    /// Create a stack that answers connect requests from `script`, then
    /// swallows any further requests.
    pub fn new(script: impl IntoIterator<Item = Attempt>) -> Self {
        Self::build(script.into_iter().collect(), Attempt::Silent)
    }

    /// Create a stack whose access point never accepts the station.
    pub fn always_dropping() -> Self {
        Self::build(VecDeque::new(), Attempt::Drop)
    }

    /// Wait `latency` before delivering each event.
    pub fn with_latency(self, latency: Duration) -> Self {
        let millis = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.shared.latency_ms.store(millis, Ordering::SeqCst);
        self
    }

    fn build(script: VecDeque<Attempt>, fallback: Attempt) -> Self {
        let shared = Arc::new(Shared {
            handlers: Mutex::new(Vec::new()),
            next_handler_id: AtomicU64::new(0),
            script: Mutex::new(script),
            fallback,
            connect_requests: AtomicU32::new(0),
            started: AtomicBool::new(false),
            latency_ms: AtomicU64::new(0),
        });

        let (events, rx) = mpsc::channel::<WifiEvent>();
        let dispatch = shared.clone();
        thread::spawn(move || {
            for event in rx {
                let latency = dispatch.latency_ms.load(Ordering::SeqCst);
                if latency > 0 {
                    thread::sleep(Duration::from_millis(latency));
                }
                debug!("sim: dispatching {}", event);
                for (_, handler) in lock(&dispatch.handlers).iter_mut() {
                    handler(event);
                }
            }
        });

        Self {
            shared,
            events,
            mode: None,
            reject_start: false,
        }
    }

    /// Queue another scripted answer.
    pub fn push_attempt(&self, attempt: Attempt) {
        lock(&self.shared.script).push_back(attempt);
    }

    /// Deliver an arbitrary event, e.g. a client joining the soft AP.
    pub fn inject(&self, event: WifiEvent) {
        // Receiver only goes away with the dispatch thread.
        let _ = self.events.send(event);
    }

    /// Make the next [`WifiStack::start`] calls fail.
    pub fn fail_start(&mut self) {
        self.reject_start = true;
    }

    /// Connect requests received so far.
    pub fn connect_requests(&self) -> u32 {
        self.shared.connect_requests.load(Ordering::SeqCst)
    }

    /// Currently registered event handlers.
    pub fn handler_count(&self) -> usize {
        lock(&self.shared.handlers).len()
    }

    /// SSID of the configured station, if in station mode.
    pub fn station_ssid(&self) -> Option<String> {
        match &self.mode {
            Some(Mode::Station { ssid }) => Some(ssid.clone()),
            _ => None,
        }
    }

    /// Auth mode of the configured soft AP, if in AP mode.
    pub fn access_point_auth_mode(&self) -> Option<AuthMode> {
        match &self.mode {
            Some(Mode::AccessPoint { auth_mode }) => Some(*auth_mode),
            _ => None,
        }
    }
}

impl WifiStack for SimulatedStack {
    type Error = SimError;
    type Connector = SimConnector;
    type Subscription = SimSubscription;

    fn set_station_config(&mut self, config: &StationConfig) -> Result<(), SimError> {
        self.mode = Some(Mode::Station {
            ssid: config.ssid.clone(),
        });
        Ok(())
    }

    fn set_access_point_config(&mut self, config: &AccessPointConfig) -> Result<(), SimError> {
        self.mode = Some(Mode::AccessPoint {
            auth_mode: config.auth_mode(),
        });
        Ok(())
    }

    fn start(&mut self) -> Result<(), SimError> {
        if self.reject_start {
            return Err(SimError::StartRejected);
        }
        match self.mode {
            None => Err(SimError::NotConfigured),
            Some(Mode::Station { .. }) => {
                self.shared.started.store(true, Ordering::SeqCst);
                self.inject(WifiEvent::StationStarted);
                Ok(())
            }
            Some(Mode::AccessPoint { .. }) => {
                self.shared.started.store(true, Ordering::SeqCst);
                Ok(())
            }
        }
    }

    fn connector(&self) -> SimConnector {
        SimConnector {
            shared: self.shared.clone(),
            events: self.events.clone(),
        }
    }

    fn subscribe<F>(&mut self, handler: F) -> Result<SimSubscription, SimError>
    where
        F: FnMut(WifiEvent) + Send + 'static,
    {
        let id = self.shared.next_handler_id.fetch_add(1, Ordering::SeqCst);
        lock(&self.shared.handlers).push((id, Box::new(handler)));
        Ok(SimSubscription {
            id,
            shared: self.shared.clone(),
        })
    }
}

/// Connect handle answering from the script.
pub struct SimConnector {
    shared: Arc<Shared>,
    events: Sender<WifiEvent>,
}

impl Connector for SimConnector {
    type Error = SimError;

    fn connect(&self) -> Result<(), SimError> {
        if !self.shared.started.load(Ordering::SeqCst) {
            return Err(SimError::NotStarted);
        }
        self.shared.connect_requests.fetch_add(1, Ordering::SeqCst);

        let attempt = lock(&self.shared.script)
            .pop_front()
            .unwrap_or(self.shared.fallback);
        let event = match attempt {
            Attempt::Associate(ip) => WifiEvent::GotIp(ip),
            Attempt::Drop => WifiEvent::StationDisconnected,
            Attempt::Silent => return Ok(()),
        };
        let _ = self.events.send(event);
        Ok(())
    }
}

/// Unregisters its handler when dropped.
pub struct SimSubscription {
    id: u64,
    shared: Arc<Shared>,
}

impl Drop for SimSubscription {
    fn drop(&mut self) {
        lock(&self.shared.handlers).retain(|(id, _)| *id != self.id);
    }
}

/// Errors reported by the simulated stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    /// `start` called before a mode was configured.
    NotConfigured,
    /// `connect` called before `start`.
    NotStarted,
    /// Start was configured to fail.
    StartRejected,
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "interface mode not configured"),
            Self::NotStarted => write!(f, "interface not started"),
            Self::StartRejected => write!(f, "interface start rejected"),
        }
    }
}

impl std::error::Error for SimError {}

impl From<SimError> for WifiError {
    fn from(e: SimError) -> Self {
        WifiError::stack(e)
    }
}
