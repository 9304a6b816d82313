//! ESP-IDF WiFi driver binding.
//!
//! This module wraps `EspWifi` and the system event loop behind
//! [`WifiStack`] so the connection manager can drive real hardware.

use super::event::{MacAddr, WifiEvent};
use super::manager::{WifiError, WifiStack};
use super::station::Connector;
use crate::config::{AccessPointConfig, AuthMode, StationConfig};
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::{EspSubscription, EspSystemEventLoop, System};
use esp_idf_svc::netif::IpEvent;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{
    AccessPointConfiguration, AuthMethod, ClientConfiguration, Configuration, EspWifi,
    WifiEvent as DriverEvent,
};
use esp_idf_sys::{esp, EspError};
use log::debug;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex, PoisonError};

/// ESP-IDF WiFi driver and the event loop it reports on.
pub struct EspWifiStack<'a> {
    wifi: EspWifi<'a>,
    sysloop: EspSystemEventLoop,
}

impl<'a> EspWifiStack<'a> {
    /// Initialize the WiFi driver.
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
    ) -> Result<Self, EspError> {
        let wifi = EspWifi::new(modem, sysloop.clone(), Some(nvs))?;
        Ok(Self { wifi, sysloop })
    }

    /// Address currently held by the station interface.
    pub fn station_ip(&self) -> Option<Ipv4Addr> {
        self.wifi
            .sta_netif()
            .get_ip_info()
            .ok()
            .map(|info| info.ip)
            .filter(|ip| !ip.is_unspecified())
    }
}

fn auth_method(mode: AuthMode) -> AuthMethod {
    match mode {
        AuthMode::Open => AuthMethod::None,
        AuthMode::WpaPersonal => AuthMethod::WPA,
        AuthMode::WpaWpa2Personal => AuthMethod::WPAWPA2Personal,
    }
}

fn translate(event: &DriverEvent<'_>) -> Option<WifiEvent> {
    match event {
        DriverEvent::StaStarted => Some(WifiEvent::StationStarted),
        DriverEvent::StaDisconnected(..) => Some(WifiEvent::StationDisconnected),
        DriverEvent::ApStaConnected(sta) => Some(WifiEvent::ClientJoined {
            mac: MacAddr(sta.mac()),
            aid: sta.aid(),
        }),
        DriverEvent::ApStaDisconnected(sta) => Some(WifiEvent::ClientLeft {
            mac: MacAddr(sta.mac()),
            aid: sta.aid(),
        }),
        _ => None,
    }
}

impl<'a> WifiStack for EspWifiStack<'a> {
    type Error = WifiError;
    type Connector = EspConnector;
    type Subscription = EspWifiSubscription;

    fn set_station_config(&mut self, config: &StationConfig) -> Result<(), WifiError> {
        let wifi_config = Configuration::Client(ClientConfiguration {
            ssid: config
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| WifiError::InvalidSsid)?,
            password: config
                .password
                .as_str()
                .try_into()
                .map_err(|_| WifiError::InvalidPassword)?,
            auth_method: auth_method(config.auth_mode()),
            ..Default::default()
        });
        self.wifi.set_configuration(&wifi_config)?;
        Ok(())
    }

    fn set_access_point_config(&mut self, config: &AccessPointConfig) -> Result<(), WifiError> {
        let wifi_config = Configuration::AccessPoint(AccessPointConfiguration {
            ssid: config
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| WifiError::InvalidSsid)?,
            password: config
                .password
                .as_str()
                .try_into()
                .map_err(|_| WifiError::InvalidPassword)?,
            auth_method: auth_method(config.auth_mode()),
            max_connections: u16::from(config.max_clients),
            ..Default::default()
        });
        self.wifi.set_configuration(&wifi_config)?;
        Ok(())
    }

    fn start(&mut self) -> Result<(), WifiError> {
        // A restarted driver emits StaStarted again
        if self.wifi.is_started()? {
            self.wifi.stop()?;
        }
        self.wifi.start()?;
        Ok(())
    }

    fn connector(&self) -> EspConnector {
        EspConnector
    }

    fn subscribe<F>(&mut self, handler: F) -> Result<EspWifiSubscription, WifiError>
    where
        F: FnMut(WifiEvent) + Send + 'static,
    {
        // WiFi and IP events arrive on the same event loop task
        let handler = Arc::new(Mutex::new(handler));

        let on_wifi = handler.clone();
        let wifi = self.sysloop.subscribe::<DriverEvent, _>(move |event| {
            if let Some(event) = translate(&event) {
                let mut handle = on_wifi.lock().unwrap_or_else(PoisonError::into_inner);
                (*handle)(event);
            } else {
                debug!("Unhandled WiFi event: {:?}", event);
            }
        })?;

        let ip = self.sysloop.subscribe::<IpEvent, _>(move |event| {
            if let IpEvent::DhcpIpAssigned(assignment) = event {
                let mut handle = handler.lock().unwrap_or_else(PoisonError::into_inner);
                (*handle)(WifiEvent::GotIp(assignment.ip()));
            }
        })?;

        Ok(EspWifiSubscription {
            _wifi: wifi,
            _ip: ip,
        })
    }
}

/// Issues `esp_wifi_connect` from the event loop task.
#[derive(Debug, Clone, Copy)]
pub struct EspConnector;

impl Connector for EspConnector {
    type Error = EspError;

    fn connect(&self) -> Result<(), EspError> {
        esp!(unsafe { esp_idf_sys::esp_wifi_connect() })
    }
}

/// Both event loop registrations; dropping unregisters them.
pub struct EspWifiSubscription {
    _wifi: EspSubscription<'static, System>,
    _ip: EspSubscription<'static, System>,
}
