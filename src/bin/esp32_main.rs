//! ESP32 relay switch firmware.
//!
//! This is the main entry point for the wall switch. After bringing up
//! the hardware it hands control to [`ControlLoop::run`], which every 50 ms:
//! - Checks the Wi-Fi link and MQTT session (every 5 s)
//! - Applies commands from `cmnd/{NAME}/light` and `cmnd/group/lights`
//! - Re-arms the button interrupt and services the OTA guard
//! - Drives the relay and publishes `status/{NAME}/light` on change
//!
//! Button presses are handled in the GPIO interrupt and reach the loop
//! through the shared [`DesiredState`].
//!
//! # Build-time configuration
//!
//! | Variable | Default |
//! |----------|---------|
//! | `DEVICE_NAME` | `lswitch0` |
//! | `WIFI_SSID`, `WIFI_PASSWORD` | unset (no network) |
//! | `STATIC_IP`, `STATIC_GATEWAY`, `STATIC_NETMASK` | unset (DHCP) |
//! | `MQTT_HOST`, `MQTT_PORT` | `192.168.0.1`, `1883` |
//! | `MQTT_USER`, `MQTT_PASSWORD` | unset |
//!
//! # Build
//!
//! ```bash
//! WIFI_SSID=home WIFI_PASSWORD=secret cargo build --release --features esp32-net
//! ```

use std::net::Ipv4Addr;
use std::thread;
use std::time::Duration;

use anyhow::anyhow;
use esp_idf_hal::gpio::PinDriver;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::log::EspLogger;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{info, warn};

use relay_switch::config::{DeviceConfig, MqttConfig, WifiConfig};
use relay_switch::hal::esp32::{
    Esp32Button, Esp32Clock, Esp32Mqtt, Esp32Wifi, GpioRelay, OtaSlotGuard, StatusLed,
};
use relay_switch::{Config, ControlLoop, DesiredState, RelayState};

/// Desired relay state, shared with the button interrupt.
static DESIRED: DesiredState = DesiredState::new(RelayState::Off);

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();
    EspLogger::initialize_default();

    let config = build_config()?;
    info!("relay switch `{}` starting", config.device.name);

    let peripherals = Peripherals::take()?;

    // =========================================================================
    // Outputs: relay on GPIO12, LED on GPIO13 (active low)
    // =========================================================================
    let relay = GpioRelay::new(PinDriver::output(peripherals.pins.gpio12)?);
    let led = StatusLed::active_low(PinDriver::output(peripherals.pins.gpio13)?);

    // =========================================================================
    // Button on GPIO0: edge interrupt feeding DESIRED
    // =========================================================================
    let button = Esp32Button::new(peripherals.pins.gpio0, &config.timing, &DESIRED)?;
    info!("button armed");

    // =========================================================================
    // Network
    // =========================================================================
    let wifi = if config.wifi.is_configured() {
        let sysloop = EspSystemEventLoop::take()?;
        let nvs = EspDefaultNvsPartition::take()?;
        Some(Esp32Wifi::new(
            peripherals.modem,
            sysloop,
            Some(nvs),
            &config.wifi,
        )?)
    } else {
        warn!("WiFi not configured (set WIFI_SSID/WIFI_PASSWORD), running local only");
        None
    };

    let mqtt = Esp32Mqtt::new(&config.mqtt, config.device.name.as_str())?;
    info!("MQTT broker {}", mqtt.url());

    // =========================================================================
    // Control loop
    // =========================================================================
    let mut control = ControlLoop::new(
        &config,
        &DESIRED,
        mqtt,
        wifi,
        relay,
        led,
        (button, OtaSlotGuard::new()),
    )
    .map_err(|e| anyhow!("relay init failed: {:?}", e))?;

    let clock = Esp32Clock::new();
    control.run(&clock, |ms| thread::sleep(Duration::from_millis(ms as u64)))
}

fn build_config() -> anyhow::Result<Config> {
    let mut wifi = WifiConfig::default()
        .with_ssid(option_env!("WIFI_SSID").unwrap_or(""))
        .with_password(option_env!("WIFI_PASSWORD").unwrap_or(""));

    if let Some(ip) = option_env!("STATIC_IP") {
        let gateway = option_env!("STATIC_GATEWAY").unwrap_or("192.168.0.1");
        let netmask = option_env!("STATIC_NETMASK").unwrap_or("255.255.255.0");
        wifi = wifi.with_static_ip(octets(ip)?, octets(gateway)?, octets(netmask)?);
    }

    let mut mqtt = MqttConfig::default();
    if let Some(host) = option_env!("MQTT_HOST") {
        mqtt = mqtt.with_host(host);
    }
    if let Some(port) = option_env!("MQTT_PORT") {
        mqtt = mqtt.with_port(port.parse().map_err(|_| anyhow!("bad MQTT_PORT {}", port))?);
    }
    if let Some(user) = option_env!("MQTT_USER") {
        mqtt = mqtt.with_auth(user, option_env!("MQTT_PASSWORD").unwrap_or(""));
    }

    Ok(Config::default()
        .with_device(
            DeviceConfig::default().with_name(option_env!("DEVICE_NAME").unwrap_or("lswitch0")),
        )
        .with_wifi(wifi)
        .with_mqtt(mqtt))
}

fn octets(addr: &str) -> anyhow::Result<[u8; 4]> {
    let ip: Ipv4Addr = addr
        .parse()
        .map_err(|_| anyhow!("invalid IPv4 address {}", addr))?;
    Ok(ip.octets())
}
