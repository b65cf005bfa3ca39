//! Persisted configuration
//!
//! All layers share one flat JSON object. Each layer deserializes its own
//! section from the whole document, ignoring keys it does not know, and
//! merges its section back into a [`JsonDocument`] when saving.

use heapless::String;
use serde::{Deserialize, Serialize};

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::text::copy_truncated;

/// Logical path of the configuration document
pub const CONFIG_PATH: &str = "/config.json";

/// Largest configuration document
pub const CONFIG_CAPACITY: usize = 1024;

pub const FORMAT_CAPACITY: usize = 32;
pub const NAME_CAPACITY: usize = 64;

/// Longest string value that may carry escape sequences
const UNESCAPE_CAPACITY: usize = 4 * NAME_CAPACITY;

pub type FormatString = String<FORMAT_CAPACITY>;
pub type NameString = String<NAME_CAPACITY>;

const DEFAULT_TIME_FORMAT: &str = "%H %M %S";
const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
const DEFAULT_BRIGHTNESS: u8 = 50;
const DEFAULT_EFFECTS_TIMEOUT_SECS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("no stored configuration")]
    Missing,
    #[error("configuration is not valid JSON")]
    Parse,
    #[error("configuration does not fit the document buffer")]
    Serialize,
    #[error("configuration storage failed")]
    Storage,
}

/// Flash-backed key-value storage for the configuration document
pub trait ConfigStore {
    /// Read the stored document into `buf` and return its length
    ///
    /// Returns `Err(ConfigError::Missing)` when nothing has been stored yet.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ConfigError>;

    /// Replace the stored document
    fn write(&mut self, data: &[u8]) -> Result<(), ConfigError>;
}

/// One layer of the device stack and the configuration sections it owns
///
/// Implementations handle the layer they wrap first, then their own
/// section, so a whole stack loads and saves through its outermost layer.
pub trait ConfigLayer {
    /// Take the sections of this layer and every inner layer from `json`
    ///
    /// A section that fails to decode leaves the current values in place.
    fn load_sections(&mut self, json: &[u8]) -> Result<(), ConfigError>;

    /// Append the sections of this layer and every inner layer to `doc`
    fn save_sections<const M: usize>(&self, doc: &mut JsonDocument<M>) -> Result<(), ConfigError>;
}

/// A layer stack with access to the configuration store
pub trait PersistedConfig: ConfigLayer {
    fn config_store(&mut self) -> &mut dyn ConfigStore;

    /// Load every section from the store
    ///
    /// On failure the defaults stay in place and the error is returned.
    fn load_config(&mut self) -> Result<(), ConfigError> {
        let mut buf = [0u8; CONFIG_CAPACITY];
        let len = match self.config_store().read(&mut buf) {
            Ok(len) => len.min(CONFIG_CAPACITY),
            Err(err) => {
                #[cfg(feature = "esp32-log")]
                if err == ConfigError::Missing {
                    println!("[PersistedConfig.load_config] no stored configuration, using defaults");
                } else {
                    println!("[PersistedConfig.load_config] failed to read configuration: {}", err);
                }
                return Err(err);
            }
        };
        let result = self.load_sections(&buf[..len]);
        #[cfg(feature = "esp32-log")]
        if let Err(err) = result {
            println!("[PersistedConfig.load_config] {}", err);
        }
        result
    }

    /// Serialize every section and replace the stored document
    fn save_config(&mut self) -> Result<(), ConfigError> {
        let mut doc = JsonDocument::<CONFIG_CAPACITY>::new();
        self.save_sections(&mut doc)?;
        self.config_store().write(doc.as_bytes())
    }
}

/// Base device settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeviceConfig {
    pub time_format: FormatString,
    pub date_format: FormatString,
    /// Percent, 0-100
    pub display_brightness: u8,
    /// Percent, 0-100
    pub defcon_brightness: u8,
    /// Seconds of idle time before the default effect starts
    pub effects_timeout: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            time_format: copy_truncated(DEFAULT_TIME_FORMAT),
            date_format: copy_truncated(DEFAULT_DATE_FORMAT),
            display_brightness: DEFAULT_BRIGHTNESS,
            defcon_brightness: DEFAULT_BRIGHTNESS,
            effects_timeout: DEFAULT_EFFECTS_TIMEOUT_SECS,
        }
    }
}

/// Deserialize one configuration section from a whole document
///
/// Escaped string values (`\"`, `\\`, `\u00e9`) come back unescaped.
pub fn decode_section<'a, T: Deserialize<'a>>(json: &'a [u8]) -> Result<T, ConfigError> {
    let mut scratch = [0u8; UNESCAPE_CAPACITY];
    serde_json_core::from_slice_escaped::<T>(json, &mut scratch)
        .map(|(section, _)| section)
        .map_err(|_| ConfigError::Parse)
}

/// A flat JSON object assembled from several sections
#[derive(Debug, Clone)]
pub struct JsonDocument<const N: usize> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> Default for JsonDocument<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> JsonDocument<N> {
    pub const fn new() -> Self {
        Self {
            buf: [0; N],
            len: 0,
        }
    }

    /// Append the fields of `section` to the document
    pub fn merge<T: Serialize>(&mut self, section: &T) -> Result<(), ConfigError> {
        let written = serde_json_core::to_slice(section, &mut self.buf[self.len..])
            .map_err(|_| ConfigError::Serialize)?;
        let start = self.len;

        if start == 0 || self.is_empty_object() {
            self.buf.copy_within(start..start + written, 0);
            self.len = written;
        } else if written > 2 {
            // "{a}" + "{b}" becomes "{a,b}"
            self.buf[start - 1] = b',';
            self.buf.copy_within(start + 1..start + written, start);
            self.len = start + written - 1;
        }
        Ok(())
    }

    fn is_empty_object(&self) -> bool {
        self.as_bytes() == b"{}"
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(self.as_bytes()).unwrap_or("")
    }
}
