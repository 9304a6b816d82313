//! WiFi configuration data structures.
//!
//! This module contains platform-independent types for station and soft
//! access point configuration that can be tested on the host machine.
//!
//! # Example
//!
//! ```
//! use esp32_wifi_demo::config::{AccessPointConfig, AuthMode, StationConfig};
//!
//! let sta = StationConfig::new("MyNetwork", "MyPassword").unwrap();
//! assert_eq!(sta.max_retries, 5);
//!
//! let ap = AccessPointConfig::new("wifi_test", "", 4).unwrap();
//! assert_eq!(ap.auth_mode(), AuthMode::Open);
//! ```

use std::fmt;
use std::time::Duration;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Maximum SSID length per IEEE 802.11 standard.
pub const MAX_SSID_LEN: usize = 32;

/// Maximum password length for WPA2.
pub const MAX_PASSWORD_LEN: usize = 64;

/// Minimum password length for WPA2.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Reconnect attempts after the first failed association before giving up.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default number of clients a soft AP accepts at once.
pub const DEFAULT_AP_MAX_CLIENTS: u8 = 4;

/// Upper bound on soft AP clients supported by the ESP32 WiFi driver.
pub const MAX_AP_CLIENTS: u8 = 10;

/// Authentication mode of a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// No password required.
    Open,
    /// WPA personal (pre-shared key).
    WpaPersonal,
    /// Mixed WPA/WPA2 personal (pre-shared key).
    WpaWpa2Personal,
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::WpaPersonal => write!(f, "WPA-PSK"),
            Self::WpaWpa2Personal => write!(f, "WPA/WPA2-PSK"),
        }
    }
}

/// Credentials and retry policy for joining an access point.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct StationConfig {
    /// Network SSID (1-32 bytes).
    pub ssid: String,
    /// Network password (8-64 bytes for WPA2, empty for open networks).
    pub password: String,
    /// Reconnect attempts after a disconnect before reporting failure.
    #[zeroize(skip)]
    pub max_retries: u32,
    /// Upper bound on the blocking wait. `None` waits until the stack
    /// reports a terminal event.
    #[zeroize(skip)]
    pub connect_timeout: Option<Duration>,
}

impl StationConfig {
    /// Create a new station configuration with the default retry policy.
    ///
    /// Returns an error if SSID or password are invalid.
    pub fn new(ssid: impl Into<String>, password: impl Into<String>) -> Result<Self, ConfigError> {
        let config = Self {
            ssid: ssid.into(),
            password: password.into(),
            max_retries: DEFAULT_MAX_RETRIES,
            connect_timeout: None,
        };
        config.validate()?;
        Ok(config)
    }

    /// Create a configuration for an open network (no password).
    pub fn open(ssid: impl Into<String>) -> Result<Self, ConfigError> {
        Self::new(ssid, String::new())
    }

    /// Set the number of reconnect attempts.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Bound the blocking wait in [`crate::wifi::ConnectionManager::bring_up_station`].
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_ssid(&self.ssid)?;
        validate_password(&self.password)
    }

    /// Check if this is an open network (no password).
    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }

    /// Minimum authentication mode accepted when joining.
    ///
    /// With a password this is WPA-PSK, so WPA-only access points are
    /// accepted as well as WPA2 ones.
    pub fn auth_mode(&self) -> AuthMode {
        if self.is_open() {
            AuthMode::Open
        } else {
            AuthMode::WpaPersonal
        }
    }
}

// Password stays out of logs.
impl fmt::Debug for StationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StationConfig")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .field("max_retries", &self.max_retries)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// Soft access point hosted by the device.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct AccessPointConfig {
    /// Advertised SSID (1-32 bytes).
    pub ssid: String,
    /// Password (8-64 bytes, empty hosts an open network).
    pub password: String,
    /// Maximum simultaneously associated clients.
    #[zeroize(skip)]
    pub max_clients: u8,
}

impl AccessPointConfig {
    /// Create a new access point configuration.
    pub fn new(
        ssid: impl Into<String>,
        password: impl Into<String>,
        max_clients: u8,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            ssid: ssid.into(),
            password: password.into(),
            max_clients,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_ssid(&self.ssid)?;
        validate_password(&self.password)?;
        if self.max_clients == 0 || self.max_clients > MAX_AP_CLIENTS {
            return Err(ConfigError::InvalidMaxClients {
                value: self.max_clients,
                max: MAX_AP_CLIENTS,
            });
        }
        Ok(())
    }

    /// Check if this access point is open (no password).
    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }

    /// Authentication mode the access point advertises.
    ///
    /// An empty password always resolves to [`AuthMode::Open`].
    pub fn auth_mode(&self) -> AuthMode {
        if self.is_open() {
            AuthMode::Open
        } else {
            AuthMode::WpaWpa2Personal
        }
    }
}

impl fmt::Debug for AccessPointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessPointConfig")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .field("max_clients", &self.max_clients)
            .field("auth_mode", &self.auth_mode())
            .finish()
    }
}

fn validate_ssid(ssid: &str) -> Result<(), ConfigError> {
    if ssid.is_empty() {
        return Err(ConfigError::SsidEmpty);
    }
    if ssid.len() > MAX_SSID_LEN {
        return Err(ConfigError::SsidTooLong {
            len: ssid.len(),
            max: MAX_SSID_LEN,
        });
    }
    Ok(())
}

// Empty is OK for open networks
fn validate_password(password: &str) -> Result<(), ConfigError> {
    if !password.is_empty() && password.len() < MIN_PASSWORD_LEN {
        return Err(ConfigError::PasswordTooShort {
            len: password.len(),
            min: MIN_PASSWORD_LEN,
        });
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(ConfigError::PasswordTooLong {
            len: password.len(),
            max: MAX_PASSWORD_LEN,
        });
    }
    Ok(())
}

/// Errors that can occur during configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// SSID is empty.
    SsidEmpty,
    /// SSID exceeds maximum length.
    SsidTooLong { len: usize, max: usize },
    /// Password is too short for WPA2.
    PasswordTooShort { len: usize, min: usize },
    /// Password exceeds maximum length.
    PasswordTooLong { len: usize, max: usize },
    /// Access point client limit out of range.
    InvalidMaxClients { value: u8, max: u8 },
    /// A numeric build setting could not be parsed.
    InvalidNumber { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SsidEmpty => write!(f, "SSID cannot be empty"),
            Self::SsidTooLong { len, max } => {
                write!(f, "SSID too long: {} bytes (max {})", len, max)
            }
            Self::PasswordTooShort { len, min } => {
                write!(f, "password too short: {} bytes (min {})", len, min)
            }
            Self::PasswordTooLong { len, max } => {
                write!(f, "password too long: {} bytes (max {})", len, max)
            }
            Self::InvalidMaxClients { value, max } => {
                write!(f, "max clients must be 1..={}, got {}", max, value)
            }
            Self::InvalidNumber { key, value } => {
                write!(f, "{} is not a valid number: {:?}", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
