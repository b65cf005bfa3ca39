//! Network identity layer
//!
//! The radio, captive portal and NTP client stay with the host. This layer
//! owns their settings, the configuration store and the UTC offset applied
//! to the device's time context.

use core::fmt::Write;

use embassy_time::Instant;
use serde::{Deserialize, Serialize};

#[cfg(feature = "esp32-log")]
use esp_println::println;

use super::{Device, DeviceError, DeviceLayer, TickOutcome, persist_if_dirty};
use crate::RenderTarget;
use crate::clock::parse_utc_offset;
use crate::command::{CommandSink, ConfigChange, DeviceCommand};
use crate::config::{
    ConfigError, ConfigLayer, ConfigStore, FormatString, JsonDocument, NameString,
    PersistedConfig, decode_section,
};
use crate::text::copy_truncated;

const DEFAULT_NTP_SERVER: &str = "pool.ntp.org";
const HOST_NAME_PREFIX: &str = "wopr-";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NetworkConfig {
    /// Also the MQTT client id and device name
    pub host_name: NameString,
    pub ntp_server: NameString,
    /// `+HH:MM`, `+HHMM` or a POSIX `TZ` value; empty means UTC
    pub time_offset_string: FormatString,
    pub use_web_portal: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host_name: NameString::new(),
            ntp_server: copy_truncated(DEFAULT_NTP_SERVER),
            time_offset_string: FormatString::new(),
            use_web_portal: true,
        }
    }
}

/// `wopr-` followed by the low 32 bits of the factory MAC in hex
#[allow(clippy::cast_possible_truncation)]
pub fn default_host_name(mac: u64) -> NameString {
    let mut name = NameString::new();
    let _ = write!(name, "{}{:x}", HOST_NAME_PREFIX, mac as u32);
    name
}

pub struct WifiLayer<T: RenderTarget, S: ConfigStore, const N: usize> {
    device: Device<T, N>,
    store: S,
    config: NetworkConfig,
    mac: u64,
}

impl<T: RenderTarget, S: ConfigStore, const N: usize> WifiLayer<T, S, N> {
    pub fn new(device: Device<T, N>, store: S, mac: u64) -> Self {
        let config = NetworkConfig {
            host_name: default_host_name(mac),
            ..NetworkConfig::default()
        };
        Self {
            device,
            store,
            config,
            mac,
        }
    }

    pub fn begin(&mut self) -> Result<(), DeviceError> {
        self.device.begin()?;
        self.apply_time_offset();
        #[cfg(feature = "esp32-log")]
        println!("[WifiLayer.begin] host name {}", self.config.host_name.as_str());
        Ok(())
    }

    pub const fn device(&self) -> &Device<T, N> {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut Device<T, N> {
        &mut self.device
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn host_name(&self) -> &str {
        &self.config.host_name
    }

    /// Rename the device; an empty name restores the MAC based default
    pub fn set_host_name(&mut self, name: &str) {
        self.config.host_name = if name.is_empty() {
            default_host_name(self.mac)
        } else {
            copy_truncated(name)
        };
        self.device.mark_config_dirty();
    }

    pub fn set_ntp_server(&mut self, server: &str) {
        self.config.ntp_server = copy_truncated(server);
        self.device.mark_config_dirty();
    }

    /// Change the UTC offset and apply it right away
    pub fn set_time_offset(&mut self, offset: &str) {
        self.config.time_offset_string = copy_truncated(offset);
        self.apply_time_offset();
        self.device.mark_config_dirty();
    }

    pub fn set_use_web_portal(&mut self, enabled: bool) {
        self.config.use_web_portal = enabled;
        self.device.mark_config_dirty();
    }

    /// Record a time sync from NTP or another source
    pub fn sync_time(&mut self, unix: i64, now: Instant) {
        self.device.sync_time(unix, now);
    }

    fn apply_time_offset(&mut self) {
        let offset = parse_utc_offset(&self.config.time_offset_string);
        #[cfg(feature = "esp32-log")]
        if offset.is_none() && !self.config.time_offset_string.is_empty() {
            println!(
                "[WifiLayer.apply_time_offset] invalid offset {}, using UTC",
                self.config.time_offset_string.as_str()
            );
        }
        self.device.time_mut().set_utc_offset(offset.unwrap_or(0));
    }

    /// Apply a setting change, handing device settings inwards
    pub fn apply_config_change(&mut self, change: &ConfigChange) -> bool {
        match change {
            ConfigChange::HostName(name) => self.set_host_name(name),
            ConfigChange::UseWebPortal(enabled) => self.set_use_web_portal(*enabled),
            other => return self.device.apply_config_change(other),
        }
        true
    }

    /// Tick without saving; outer layers call this
    pub fn step(&mut self, now: Instant) -> TickOutcome {
        self.device.step(now)
    }
}

impl<T: RenderTarget, S: ConfigStore, const N: usize> DeviceLayer for WifiLayer<T, S, N> {
    fn begin(&mut self) -> Result<(), DeviceError> {
        WifiLayer::begin(self)
    }

    fn tick(&mut self, now: Instant) -> TickOutcome {
        let mut outcome = self.step(now);
        if persist_if_dirty(self, &mut outcome) {
            self.device.request_restart();
        }
        outcome
    }
}

impl<T: RenderTarget, S: ConfigStore, const N: usize> ConfigLayer for WifiLayer<T, S, N> {
    fn load_sections(&mut self, json: &[u8]) -> Result<(), ConfigError> {
        self.device.load_sections(json)?;
        let mut config: NetworkConfig = decode_section(json)?;
        if config.host_name.is_empty() {
            config.host_name = default_host_name(self.mac);
        }
        self.config = config;
        self.apply_time_offset();
        Ok(())
    }

    fn save_sections<const M: usize>(&self, doc: &mut JsonDocument<M>) -> Result<(), ConfigError> {
        self.device.save_sections(doc)?;
        doc.merge(&self.config)
    }
}

impl<T: RenderTarget, S: ConfigStore, const N: usize> PersistedConfig for WifiLayer<T, S, N> {
    fn config_store(&mut self) -> &mut dyn ConfigStore {
        &mut self.store
    }
}

impl<T: RenderTarget, S: ConfigStore, const N: usize> CommandSink for WifiLayer<T, S, N> {
    fn apply(&mut self, command: DeviceCommand, now: Instant) {
        match command {
            DeviceCommand::Config(change) => {
                self.apply_config_change(&change);
            }
            other => self.device.apply(other, now),
        }
    }
}
