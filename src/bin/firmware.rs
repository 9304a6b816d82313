//! Device firmware entry point.
//!
//! Brings up NVS and the WiFi driver, then either joins the configured
//! network (default) or hosts a soft AP (`role-ap` feature). Driver and
//! storage initialization errors are unrecoverable and abort.
//!
//! # Usage
//!
//! ```bash
//! WIFI_SSID="MyNetwork" WIFI_PASS="secret" cargo run --bin flash-esp32
//! ```

#[cfg(feature = "esp32")]
use log::{error, info, warn};

#[cfg(feature = "esp32")]
fn main() {
    // Link ESP-IDF patches (must be first!)
    esp_idf_sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    info!("=== ESP32 WiFi demo starting ===");

    if let Err(e) = run() {
        error!("Fatal: {}", e);
        std::process::abort();
    }
}

#[cfg(feature = "esp32")]
fn run() -> Result<(), Box<dyn std::error::Error>> {
    use esp32_wifi_demo::wifi::EspWifiStack;
    use esp32_wifi_demo::{ConnectionManager, ConnectionOutcome, WifiRole};
    use esp_idf_hal::peripherals::Peripherals;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use std::time::Duration;

    let role = WifiRole::from_build_env()?;
    info!("{}", role.label());

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    // Erases and retries on a full or outdated partition
    let nvs = EspDefaultNvsPartition::take()?;

    let stack = EspWifiStack::new(peripherals.modem, sysloop, nvs)?;
    let mut manager = ConnectionManager::new(stack);

    let _access_point = match &role {
        WifiRole::Station(config) => {
            match manager.bring_up_station(config)? {
                ConnectionOutcome::Connected => {
                    if let Some(ip) = manager.stack().station_ip() {
                        info!("Station IP: {}", ip);
                    }
                }
                ConnectionOutcome::Failed => warn!("Continuing without network"),
                ConnectionOutcome::Pending => warn!("Connection still pending, continuing"),
            }
            None
        }
        WifiRole::AccessPoint(config) => Some(manager.start_access_point(config)?),
    };

    info!("Entering main loop...");
    loop {
        std::thread::sleep(Duration::from_secs(10));
        log::debug!("Heartbeat...");
    }
}

#[cfg(not(feature = "esp32"))]
fn main() {
    println!("This binary requires the 'esp32' feature.");
    println!("Use 'cargo run --bin host-sim' to exercise the connection manager on the host.");
}
