//! Firmware configuration.
//!
//! Credentials and limits are baked in at build time through environment
//! variables read with `option_env!`, falling back to placeholder values:
//!
//! | Variable         | Default        |
//! |------------------|----------------|
//! | `WIFI_SSID`      | `yourSSID`     |
//! | `WIFI_PASS`      | `yourPassword` |
//! | `WIFI_MAX_RETRY` | `5`            |
//! | `AP_SSID`        | `wifi_test`    |
//! | `AP_PASS`        | `password`     |
//! | `AP_MAX_CLIENTS` | `4`            |
//!
//! The operating role is a compile-time choice: station by default, soft
//! access point with the `role-ap` feature.

mod wifi;

pub use wifi::{
    AccessPointConfig, AuthMode, ConfigError, StationConfig, DEFAULT_AP_MAX_CLIENTS,
    DEFAULT_MAX_RETRIES, MAX_AP_CLIENTS, MAX_PASSWORD_LEN, MAX_SSID_LEN, MIN_PASSWORD_LEN,
};

use std::str::FromStr;

const DEFAULT_STATION_SSID: &str = "yourSSID";
const DEFAULT_STATION_PASSWORD: &str = "yourPassword";
const DEFAULT_AP_SSID: &str = "wifi_test";
const DEFAULT_AP_PASSWORD: &str = "password";

/// The single role the radio operates in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WifiRole {
    /// Join an existing network as a client.
    Station(StationConfig),
    /// Host a network for other clients.
    AccessPoint(AccessPointConfig),
}

impl WifiRole {
    /// Resolve the role compiled into this build.
    pub fn from_build_env() -> Result<Self, ConfigError> {
        BuildEnv::capture().role(cfg!(feature = "role-ap"))
    }

    /// Short mode label for the startup log.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Station(_) => "STA MODE",
            Self::AccessPoint(_) => "AP MODE",
        }
    }
}

/// Raw build-time settings, before defaults and validation.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildEnv {
    pub wifi_ssid: Option<&'static str>,
    pub wifi_pass: Option<&'static str>,
    pub wifi_max_retry: Option<&'static str>,
    pub ap_ssid: Option<&'static str>,
    pub ap_pass: Option<&'static str>,
    pub ap_max_clients: Option<&'static str>,
}

impl BuildEnv {
    /// Capture the variables present when the crate was compiled.
    pub const fn capture() -> Self {
        Self {
            wifi_ssid: option_env!("WIFI_SSID"),
            wifi_pass: option_env!("WIFI_PASS"),
            wifi_max_retry: option_env!("WIFI_MAX_RETRY"),
            ap_ssid: option_env!("AP_SSID"),
            ap_pass: option_env!("AP_PASS"),
            ap_max_clients: option_env!("AP_MAX_CLIENTS"),
        }
    }

    /// Station configuration with defaults applied.
    pub fn station(&self) -> Result<StationConfig, ConfigError> {
        let max_retries = parse_or(
            "WIFI_MAX_RETRY",
            self.wifi_max_retry,
            DEFAULT_MAX_RETRIES,
        )?;
        Ok(StationConfig::new(
            self.wifi_ssid.unwrap_or(DEFAULT_STATION_SSID),
            self.wifi_pass.unwrap_or(DEFAULT_STATION_PASSWORD),
        )?
        .with_max_retries(max_retries))
    }

    /// Access point configuration with defaults applied.
    pub fn access_point(&self) -> Result<AccessPointConfig, ConfigError> {
        let max_clients = parse_or(
            "AP_MAX_CLIENTS",
            self.ap_max_clients,
            DEFAULT_AP_MAX_CLIENTS,
        )?;
        AccessPointConfig::new(
            self.ap_ssid.unwrap_or(DEFAULT_AP_SSID),
            self.ap_pass.unwrap_or(DEFAULT_AP_PASSWORD),
            max_clients,
        )
    }

    /// Build the configuration for the requested role.
    pub fn role(&self, access_point: bool) -> Result<WifiRole, ConfigError> {
        if access_point {
            Ok(WifiRole::AccessPoint(self.access_point()?))
        } else {
            Ok(WifiRole::Station(self.station()?))
        }
    }
}

fn parse_or<T: FromStr>(
    key: &'static str,
    value: Option<&str>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
            key,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_station() {
        let config = BuildEnv::default().station().unwrap();
        assert_eq!(config.ssid, "yourSSID");
        assert_eq!(config.password, "yourPassword");
        assert_eq!(config.max_retries, 5);
    }

    #[test]
    fn test_defaults_access_point() {
        let config = BuildEnv::default().access_point().unwrap();
        assert_eq!(config.ssid, "wifi_test");
        assert_eq!(config.password, "password");
        assert_eq!(config.max_clients, 4);
        assert_eq!(config.auth_mode(), AuthMode::WpaWpa2Personal);
    }

    #[test]
    fn test_overrides() {
        let env = BuildEnv {
            wifi_ssid: Some("HomeNet"),
            wifi_pass: Some("correcthorse"),
            wifi_max_retry: Some(" 2 "),
            ap_ssid: Some("Demo"),
            ap_pass: Some(""),
            ap_max_clients: Some("8"),
        };
        let sta = env.station().unwrap();
        assert_eq!(sta.ssid, "HomeNet");
        assert_eq!(sta.max_retries, 2);

        let ap = env.access_point().unwrap();
        assert_eq!(ap.max_clients, 8);
        assert_eq!(ap.auth_mode(), AuthMode::Open);
    }

    #[test]
    fn test_bad_number() {
        let env = BuildEnv {
            wifi_max_retry: Some("lots"),
            ..Default::default()
        };
        assert_eq!(
            env.station(),
            Err(ConfigError::InvalidNumber {
                key: "WIFI_MAX_RETRY",
                value: "lots".into()
            })
        );
    }

    #[test]
    fn test_invalid_credentials_rejected() {
        let env = BuildEnv {
            wifi_pass: Some("short"),
            ..Default::default()
        };
        assert!(matches!(
            env.station(),
            Err(ConfigError::PasswordTooShort { .. })
        ));
    }

    #[test]
    fn test_role_selection() {
        let env = BuildEnv::default();
        let sta = env.role(false).unwrap();
        assert!(matches!(sta, WifiRole::Station(_)));
        assert_eq!(sta.label(), "STA MODE");

        let ap = env.role(true).unwrap();
        assert!(matches!(ap, WifiRole::AccessPoint(_)));
        assert_eq!(ap.label(), "AP MODE");
    }
}
