//! WiFi link management for ESP32.
//!
//! Station mode over esp-idf-svc, with DHCP or a fixed address. The link
//! is brought up once at construction; afterwards [`NetworkLink::is_link_up`]
//! reports association and, when the link is found down, kicks off a
//! non-blocking reassociation.
//!
//! # Example
//!
//! ```ignore
//! use relay_switch::hal::esp32::Esp32Wifi;
//! use relay_switch::config::WifiConfig;
//!
//! let config = WifiConfig::default()
//!     .with_ssid("MyNetwork")
//!     .with_password("secret123")
//!     .with_static_ip([192, 168, 0, 50], [192, 168, 0, 1], [255, 255, 255, 0]);
//!
//! let wifi = Esp32Wifi::new(modem, sysloop, nvs, &config)?;
//! log::info!("IP: {:?}", wifi.ip_addr());
//! ```

use std::net::Ipv4Addr;

use anyhow::{anyhow, Context};
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::ipv4::{
    ClientConfiguration as IpClientConfiguration, ClientSettings as IpClientSettings,
    Configuration as IpConfiguration, Mask, Subnet,
};
use esp_idf_svc::netif::{EspNetif, NetifConfiguration};
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};
use log::{info, warn};

use crate::config::{StaticIpConfig, WifiConfig};
use crate::traits::NetworkLink;

/// WiFi station link for ESP32.
pub struct Esp32Wifi<'a> {
    wifi: BlockingWifi<EspWifi<'a>>,
    was_up: bool,
}

impl<'a> Esp32Wifi<'a> {
    /// Start the WiFi driver and make one connection attempt.
    ///
    /// A failed first association is not an error: the control loop keeps
    /// probing the link and reassociates later.
    ///
    /// # Errors
    ///
    /// Returns an error if driver setup fails or the credentials or static
    /// address are invalid.
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
        config: &WifiConfig,
    ) -> anyhow::Result<Self> {
        let mut esp_wifi = EspWifi::new(modem, sysloop.clone(), nvs)?;

        if let Some(fixed) = config.static_ip {
            esp_wifi
                .swap_netif_sta(static_netif(&fixed)?)
                .context("failed to apply static IP configuration")?;
        }

        let mut wifi = BlockingWifi::wrap(esp_wifi, sysloop)?;

        let auth_method = if config.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPAWPA2Personal
        };

        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: config
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| anyhow!("wifi ssid too long"))?,
            password: config
                .password
                .as_str()
                .try_into()
                .map_err(|_| anyhow!("wifi password too long"))?,
            auth_method,
            ..Default::default()
        }))?;

        wifi.start()?;
        info!("wifi started, connecting to `{}`", config.ssid);

        let was_up = match wifi.connect().and_then(|_| wifi.wait_netif_up()) {
            Ok(()) => {
                if let Ok(ip_info) = wifi.wifi().sta_netif().get_ip_info() {
                    info!("wifi connected, ip {}", ip_info.ip);
                }
                true
            }
            Err(e) => {
                warn!("wifi connect failed, will retry: {:?}", e);
                false
            }
        };

        Ok(Self { wifi, was_up })
    }

    /// Get the current IP address, if connected.
    pub fn ip_addr(&self) -> Option<Ipv4Addr> {
        self.wifi
            .wifi()
            .sta_netif()
            .get_ip_info()
            .ok()
            .map(|info| info.ip)
    }

    /// Get the underlying WiFi driver for advanced operations.
    pub fn driver(&self) -> &EspWifi<'a> {
        self.wifi.wifi()
    }
}

impl NetworkLink for Esp32Wifi<'_> {
    fn is_link_up(&mut self) -> bool {
        let up = self.wifi.is_connected().unwrap_or(false);
        if up != self.was_up {
            if up {
                info!("wifi link up, ip {:?}", self.ip_addr());
            } else {
                warn!("wifi link lost");
            }
            self.was_up = up;
        }
        if !up {
            // non-blocking: the driver reports the result through events
            if let Err(e) = self.wifi.wifi_mut().connect() {
                warn!("wifi reconnect request failed: {:?}", e);
            }
        }
        up
    }
}

fn ipv4(octets: [u8; 4]) -> Ipv4Addr {
    Ipv4Addr::from(octets)
}

fn static_netif(fixed: &StaticIpConfig) -> anyhow::Result<EspNetif> {
    let mask_ip = ipv4(fixed.netmask);
    let mask = Mask::try_from(mask_ip).map_err(|_| anyhow!("invalid netmask {}", mask_ip))?;

    let conf = NetifConfiguration {
        ip_configuration: Some(IpConfiguration::Client(IpClientConfiguration::Fixed(
            IpClientSettings {
                ip: ipv4(fixed.ip),
                subnet: Subnet {
                    gateway: ipv4(fixed.gateway),
                    mask,
                },
                dns: None,
                secondary_dns: None,
            },
        ))),
        ..NetifConfiguration::wifi_default_client()
    };

    Ok(EspNetif::new_with_conf(&conf)?)
}
