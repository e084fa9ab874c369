//! Shared configuration system for desktop and ESP32.
//!
//! Uses `heapless::String` for `no_std` compatibility while remaining
//! ergonomic to use on desktop with `std`.
//!
//! # Example
//!
//! ```rust
//! use relay_switch::config::{Config, DeviceConfig, MqttConfig};
//!
//! // Use defaults
//! let config = Config::default();
//!
//! // Or customize
//! let config = Config::default()
//!     .with_device(DeviceConfig::default().with_name("hallway"))
//!     .with_mqtt(MqttConfig::default().with_host("192.168.1.100"));
//!
//! assert_eq!(config.topics().status.as_str(), "status/hallway/light");
//! ```

use heapless::String as HString;

/// Maximum length for short config strings (hostnames, device names)
pub const MAX_SHORT_STRING: usize = 64;

/// Maximum length for longer config strings (topics)
pub const MAX_LONG_STRING: usize = 128;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Type alias for longer config strings
pub type LongString = HString<MAX_LONG_STRING>;

/// Releases shorter than this are contact bounce.
pub const DEBOUNCE_MS: u32 = 100;

/// Releases after longer than this are long presses.
pub const LONG_PRESS_MS: u32 = 500;

/// Period of the session health check.
pub const CONNECTION_CHECK_MS: u32 = 5000;

/// Control loop tick period.
pub const TICK_MS: u32 = 50;

/// Group broadcast command topic, shared by every switch.
pub const GROUP_COMMAND_TOPIC: &str = "cmnd/group/lights";

// ============================================================================
// Helper for creating heapless strings
// ============================================================================

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    let _ = hs.push_str(&s[..utf8_prefix_len(s, MAX_SHORT_STRING)]);
    hs
}

/// Create a LongString from a &str, truncating if too long
pub fn long_string(s: &str) -> LongString {
    let mut hs = LongString::new();
    let _ = hs.push_str(&s[..utf8_prefix_len(s, MAX_LONG_STRING)]);
    hs
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a char.
fn utf8_prefix_len(s: &str, max: usize) -> usize {
    s.char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|end| *end <= max)
        .last()
        .unwrap_or(0)
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Device identification
    pub device: DeviceConfig,
    /// WiFi connection configuration
    pub wifi: WifiConfig,
    /// MQTT session configuration
    pub mqtt: MqttConfig,
    /// Button and loop timing
    pub timing: TimingConfig,
}

impl Config {
    /// Set device configuration
    pub fn with_device(mut self, device: DeviceConfig) -> Self {
        self.device = device;
        self
    }

    /// Set WiFi configuration
    pub fn with_wifi(mut self, wifi: WifiConfig) -> Self {
        self.wifi = wifi;
        self
    }

    /// Set MQTT configuration
    pub fn with_mqtt(mut self, mqtt: MqttConfig) -> Self {
        self.mqtt = mqtt;
        self
    }

    /// Set timing configuration
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Topics for the configured device name
    pub fn topics(&self) -> Topics {
        Topics::for_device(self.device.name.as_str())
    }
}

// ============================================================================
// Device Config
// ============================================================================

/// Device identification configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceConfig {
    /// Device name, used in topics and as the MQTT client ID
    pub name: ShortString,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: short_string("lswitch0"),
        }
    }
}

impl DeviceConfig {
    /// Set the device name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = short_string(name);
        self
    }
}

// ============================================================================
// Topics
// ============================================================================

/// The message-bus channels of one device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Topics {
    /// Device-specific command topic (`cmnd/{NAME}/light`)
    pub command: LongString,
    /// Group broadcast command topic (`cmnd/group/lights`)
    pub group: LongString,
    /// Status topic (`status/{NAME}/light`)
    pub status: LongString,
}

impl Topics {
    /// Build the topic set for a device name
    pub fn for_device(name: &str) -> Self {
        Self {
            command: join_topic("cmnd", name, "light"),
            group: long_string(GROUP_COMMAND_TOPIC),
            status: join_topic("status", name, "light"),
        }
    }

    /// Both command topics, in subscription order
    pub fn command_topics(&self) -> [&str; 2] {
        [self.command.as_str(), self.group.as_str()]
    }
}

fn join_topic(head: &str, name: &str, tail: &str) -> LongString {
    let mut topic = LongString::new();
    let _ = topic.push_str(head);
    let _ = topic.push('/');
    let _ = topic.push_str(name);
    let _ = topic.push('/');
    let _ = topic.push_str(tail);
    topic
}

// ============================================================================
// MQTT Config
// ============================================================================

/// MQTT session configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MqttConfig {
    /// Broker hostname or IP
    pub host: ShortString,
    /// Broker port
    pub port: u16,
    /// Username for authentication (empty = no auth)
    pub username: ShortString,
    /// Password for authentication
    pub password: ShortString,
    /// Keep-alive interval in seconds
    pub keep_alive_secs: u16,
    /// Upper bound on one background connection attempt by the transport
    pub connect_timeout_ms: u32,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: short_string("192.168.0.1"),
            port: 1883,
            username: ShortString::new(),
            password: ShortString::new(),
            keep_alive_secs: 15,
            connect_timeout_ms: 3000,
        }
    }
}

impl MqttConfig {
    /// Set the broker host
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = short_string(host);
        self
    }

    /// Set the broker port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set authentication credentials
    pub fn with_auth(mut self, username: &str, password: &str) -> Self {
        self.username = short_string(username);
        self.password = short_string(password);
        self
    }

    /// Set the keep-alive interval
    pub fn with_keep_alive_secs(mut self, secs: u16) -> Self {
        self.keep_alive_secs = secs;
        self
    }

    /// Set the connect timeout
    pub fn with_connect_timeout_ms(mut self, ms: u32) -> Self {
        self.connect_timeout_ms = ms;
        self
    }

    /// Check if authentication is configured
    pub fn has_auth(&self) -> bool {
        !self.username.is_empty()
    }
}

// ============================================================================
// WiFi Config
// ============================================================================

/// Fixed IPv4 settings, used instead of DHCP when present
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StaticIpConfig {
    /// Device address
    pub ip: [u8; 4],
    /// Default gateway
    pub gateway: [u8; 4],
    /// Subnet mask
    pub netmask: [u8; 4],
}

/// WiFi connection configuration
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WifiConfig {
    /// WiFi network SSID
    pub ssid: ShortString,
    /// WiFi password
    pub password: ShortString,
    /// Static address; `None` uses DHCP
    pub static_ip: Option<StaticIpConfig>,
}

impl WifiConfig {
    /// Set the SSID
    pub fn with_ssid(mut self, ssid: &str) -> Self {
        self.ssid = short_string(ssid);
        self
    }

    /// Set the password
    pub fn with_password(mut self, password: &str) -> Self {
        self.password = short_string(password);
        self
    }

    /// Use a fixed address instead of DHCP
    pub fn with_static_ip(mut self, ip: [u8; 4], gateway: [u8; 4], netmask: [u8; 4]) -> Self {
        self.static_ip = Some(StaticIpConfig {
            ip,
            gateway,
            netmask,
        });
        self
    }

    /// Check if WiFi credentials are configured
    pub fn is_configured(&self) -> bool {
        !self.ssid.is_empty()
    }
}

// ============================================================================
// Timing Config
// ============================================================================

/// Button classification and loop timing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimingConfig {
    /// Presses up to this long are ignored as bounce
    pub debounce_ms: u32,
    /// Presses longer than this are long presses
    pub long_press_ms: u32,
    /// Session check period
    pub connection_check_ms: u32,
    /// Delay between control loop ticks
    pub tick_ms: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEBOUNCE_MS,
            long_press_ms: LONG_PRESS_MS,
            connection_check_ms: CONNECTION_CHECK_MS,
            tick_ms: TICK_MS,
        }
    }
}

impl TimingConfig {
    /// Set the debounce threshold
    pub fn with_debounce_ms(mut self, ms: u32) -> Self {
        self.debounce_ms = ms;
        self
    }

    /// Set the long-press threshold
    pub fn with_long_press_ms(mut self, ms: u32) -> Self {
        self.long_press_ms = ms;
        self
    }

    /// Set the session check period
    pub fn with_connection_check_ms(mut self, ms: u32) -> Self {
        self.connection_check_ms = ms;
        self
    }

    /// Set the tick period
    pub fn with_tick_ms(mut self, ms: u32) -> Self {
        self.tick_ms = ms;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
