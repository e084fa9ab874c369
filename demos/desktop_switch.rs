//! Desktop relay switch against a real MQTT broker.
//!
//! Runs the same control loop as the firmware with a logging relay and LED.
//! Pressing Enter in the terminal simulates a 200 ms button press from a
//! separate thread, the way the edge interrupt would on the device.
//!
//! # Usage
//!
//! ```sh
//! MQTT_HOST=localhost DEVICE_NAME=desk cargo run --example desktop_switch --features mqtt
//! ```
//!
//! Then, from another terminal:
//!
//! ```sh
//! mosquitto_sub -t 'status/desk/light' &
//! mosquitto_pub -t 'cmnd/desk/light' -m toggle
//! mosquitto_pub -t 'cmnd/group/lights' -m off
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::io::BufRead;
use std::thread;
use std::time::Duration;

use relay_switch::hal::MockButton;
use relay_switch::press::PressClassifier;
use relay_switch::services::{ConsoleIndicator, ConsoleRelay, HostClock, HostLink, RumqttSession};
use relay_switch::traits::Clock;
use relay_switch::{Config, ControlLoop, DesiredState, DeviceConfig, MqttConfig, RelayState};
use tracing_subscriber::EnvFilter;

static DESIRED: DesiredState = DesiredState::new(RelayState::Off);

/// How long a simulated press holds the button down.
const SIMULATED_HOLD_MS: u64 = 200;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = config_from_env()?;
    let clock = HostClock::new();

    println!("=================================");
    println!("  relay-switch desktop demo");
    println!("=================================");
    println!();
    println!("Device: {}", config.device.name);
    println!("Broker: {}:{}", config.mqtt.host, config.mqtt.port);
    for topic in config.topics().command_topics() {
        println!("  Subscribe: {}", topic);
    }
    println!("  Publish:   {}", config.topics().status);
    println!();
    println!("Press Enter to simulate a button press, Ctrl+C to stop.");
    println!();

    spawn_button(clock, PressClassifier::new(&config.timing));

    let session = RumqttSession::new(&config.mqtt, config.device.name.as_str())?;
    let mut control = ControlLoop::new(
        &config,
        &DESIRED,
        session,
        HostLink,
        ConsoleRelay::new(),
        ConsoleIndicator::new(),
        (),
    )
    .map_err(|e| anyhow::anyhow!("relay init failed: {:?}", e))?;

    control.run(&clock, |ms| thread::sleep(Duration::from_millis(ms as u64)))
}

fn spawn_button(clock: HostClock, mut classifier: PressClassifier) {
    thread::spawn(move || {
        let mut button = MockButton::new();
        for line in std::io::stdin().lock().lines() {
            if line.is_err() {
                break;
            }
            button.press();
            classifier.handle_input(&button, clock.now_ms(), &DESIRED);
            thread::sleep(Duration::from_millis(SIMULATED_HOLD_MS));
            button.release();
            let class = classifier.handle_input(&button, clock.now_ms(), &DESIRED);
            log::info!("[button] {:?}, desired {}", class, DESIRED.get());
        }
    });
}

fn config_from_env() -> anyhow::Result<Config> {
    let mut mqtt = MqttConfig::default();
    if let Ok(host) = std::env::var("MQTT_HOST") {
        mqtt = mqtt.with_host(&host);
    }
    if let Ok(port) = std::env::var("MQTT_PORT") {
        mqtt = mqtt.with_port(port.parse()?);
    }
    if let Ok(user) = std::env::var("MQTT_USER") {
        mqtt = mqtt.with_auth(&user, &std::env::var("MQTT_PASSWORD").unwrap_or_default());
    }

    let name = std::env::var("DEVICE_NAME").unwrap_or_else(|_| "lswitch0".into());

    Ok(Config::default()
        .with_device(DeviceConfig::default().with_name(&name))
        .with_mqtt(mqtt))
}
