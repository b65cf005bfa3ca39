//! Home Assistant MQTT discovery
//!
//! On every new MQTT session the layer announces one retained discovery
//! document per entity, then publishes diagnostics, the configuration, the
//! current state and the availability.

use core::fmt::Write;

use embassy_time::Instant;
use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

#[cfg(feature = "esp32-log")]
use esp_println::println;

use super::mqtt::{STATE_OFF, STATE_ON};
use super::{
    Device, DeviceError, DeviceLayer, FIRMWARE_VERSION, MqttError, MqttLayer, MqttTransport,
    TickOutcome, TopicString, persist_if_dirty,
};
use crate::RenderTarget;
use crate::color::format_rgb;
use crate::command::{CommandSink, DeviceCommand};
use crate::config::{
    CONFIG_CAPACITY, ConfigError, ConfigLayer, ConfigStore, JsonDocument, NameString,
    PersistedConfig, decode_section,
};
use crate::text::copy_truncated;

const DEFAULT_DISCOVERY_PREFIX: &str = "homeassistant";
const MANUFACTURER: &str = "Unexpected Maker";

/// Largest discovery document
const DISCOVERY_CAPACITY: usize = 1024;
/// Effect names offered by the effect select, including the empty entry
const EFFECT_OPTIONS_CAPACITY: usize = 32;

const ID_CAPACITY: usize = 96;
const TEMPLATE_CAPACITY: usize = 48;

pub const TIME_FORMAT_OPTIONS: [&str; 7] = [
    "%H %M %S",
    "%H.%M.%S",
    "%H-%M-%S",
    "%H:%M:%S",
    "%I %M %S %p",
    "%I.%M.%S %p",
    "%I:%M:%S %p",
];

pub const DATE_FORMAT_OPTIONS: [&str; 5] = ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];

const DEFCON_LEVEL_OPTIONS: [&str; 6] = ["None", "DEFCON 5", "DEFCON 4", "DEFCON 3", "DEFCON 2", "DEFCON 1"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HomeAssistantConfig {
    pub use_home_assistant: bool,
    pub discovery_prefix: NameString,
}

impl Default for HomeAssistantConfig {
    fn default() -> Self {
        Self {
            use_home_assistant: true,
            discovery_prefix: copy_truncated(DEFAULT_DISCOVERY_PREFIX),
        }
    }
}

/// Radio details reported as diagnostics; supplied by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetworkStatus {
    pub ip_address: [u8; 4],
    /// dBm
    pub rssi: i8,
}

#[derive(Serialize)]
struct Diagnostics<'a> {
    ip_address: &'a str,
    rssi: i8,
    version: &'a str,
}

#[derive(Serialize, Default)]
struct DeviceInfo<'a> {
    name: &'a str,
    identifiers: [&'a str; 1],
    manufacturer: &'a str,
    model: &'a str,
    sw_version: &'a str,
}

#[derive(Serialize, Default)]
struct Availability<'a> {
    topic: &'a str,
}

fn no_options(options: &&[&str]) -> bool {
    options.is_empty()
}

#[derive(Serialize, Default)]
struct Discovery<'a> {
    name: &'a str,
    unique_id: &'a str,
    object_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    entity_category: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_topic: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    command_topic: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value_template: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit_of_measurement: Option<&'a str>,
    #[serde(skip_serializing_if = "no_options")]
    options: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload_on: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload_off: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload_press: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    brightness_state_topic: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    brightness_command_topic: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    brightness_scale: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rgb_state_topic: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rgb_command_topic: Option<&'a str>,
    availability: [Availability<'a>; 1],
    device: DeviceInfo<'a>,
}

#[derive(Clone, Copy)]
enum Options {
    None,
    Fixed(&'static [&'static str]),
    Effects,
}

#[derive(Clone, Copy)]
enum Extra {
    None,
    Number { max: Option<u32> },
    Switch { on: &'static str, off: &'static str },
    Press(&'static str),
    Light { rgb: bool },
}

/// One announced entity
struct Entity {
    component: &'static str,
    /// Discovery object id below the device
    object: &'static str,
    name: &'static str,
    category: Option<&'static str>,
    /// Entity and sub-entity of the state topic
    state: Option<(&'static str, &'static str)>,
    command: Option<(&'static str, &'static str)>,
    /// Key read from a JSON state payload
    value_key: Option<&'static str>,
    icon: &'static str,
    unit: Option<&'static str>,
    options: Options,
    extra: Extra,
}

const CATEGORY_DIAGNOSTIC: &str = "diagnostic";
const CATEGORY_CONFIG: &str = "config";

const ENTITIES: [Entity; 17] = [
    Entity {
        component: "sensor",
        object: "diagnostic_ip",
        name: "IP Address",
        category: Some(CATEGORY_DIAGNOSTIC),
        state: Some(("diagnostic", "state")),
        command: None,
        value_key: Some("ip_address"),
        icon: "mdi:ip-network",
        unit: None,
        options: Options::None,
        extra: Extra::None,
    },
    Entity {
        component: "sensor",
        object: "diagnostic_rssi",
        name: "RSSI",
        category: Some(CATEGORY_DIAGNOSTIC),
        state: Some(("diagnostic", "state")),
        command: None,
        value_key: Some("rssi"),
        icon: "mdi:wifi",
        unit: Some("dB"),
        options: Options::None,
        extra: Extra::None,
    },
    Entity {
        component: "sensor",
        object: "diagnostic_version",
        name: "Firmware version",
        category: Some(CATEGORY_DIAGNOSTIC),
        state: Some(("diagnostic", "state")),
        command: None,
        value_key: Some("version"),
        icon: "mdi:information-outline",
        unit: None,
        options: Options::None,
        extra: Extra::None,
    },
    Entity {
        component: "select",
        object: "config_time_format",
        name: "Time format",
        category: Some(CATEGORY_CONFIG),
        state: Some(("config", "state")),
        command: Some(("config", "time_format")),
        value_key: Some("timeFormat"),
        icon: "mdi:clock-digital",
        unit: None,
        options: Options::Fixed(&TIME_FORMAT_OPTIONS),
        extra: Extra::None,
    },
    Entity {
        component: "select",
        object: "config_date_format",
        name: "Date format",
        category: Some(CATEGORY_CONFIG),
        state: Some(("config", "state")),
        command: Some(("config", "date_format")),
        value_key: Some("dateFormat"),
        icon: "mdi:calendar",
        unit: None,
        options: Options::Fixed(&DATE_FORMAT_OPTIONS),
        extra: Extra::None,
    },
    Entity {
        component: "number",
        object: "config_display_brightness",
        name: "Display brightness",
        category: Some(CATEGORY_CONFIG),
        state: Some(("config", "state")),
        command: Some(("config", "display_brightness")),
        value_key: Some("displayBrightness"),
        icon: "mdi:brightness-5",
        unit: Some("%"),
        options: Options::None,
        extra: Extra::Number { max: Some(100) },
    },
    Entity {
        component: "number",
        object: "config_defcon_brightness",
        name: "DEFCON brightness",
        category: Some(CATEGORY_CONFIG),
        state: Some(("config", "state")),
        command: Some(("config", "defcon_brightness")),
        value_key: Some("defconBrightness"),
        icon: "mdi:brightness-5",
        unit: Some("%"),
        options: Options::None,
        extra: Extra::Number { max: Some(100) },
    },
    Entity {
        component: "number",
        object: "config_effects_timeout",
        name: "Effects timeout",
        category: Some(CATEGORY_CONFIG),
        state: Some(("config", "state")),
        command: Some(("config", "effects_timeout")),
        value_key: Some("effectsTimeout"),
        icon: "mdi:timer-outline",
        unit: Some("s"),
        options: Options::None,
        extra: Extra::Number { max: None },
    },
    Entity {
        component: "switch",
        object: "config_use_web_portal",
        name: "Use web portal",
        category: Some(CATEGORY_CONFIG),
        state: Some(("config", "state")),
        command: Some(("config", "use_web_portal")),
        value_key: Some("useWebPortal"),
        icon: "mdi:web",
        unit: None,
        options: Options::None,
        extra: Extra::Switch {
            on: "True",
            off: "False",
        },
    },
    Entity {
        component: "button",
        object: "device",
        name: "Restart",
        category: Some(CATEGORY_CONFIG),
        state: None,
        command: Some(("device", "state")),
        value_key: None,
        icon: "mdi:restart",
        unit: None,
        options: Options::None,
        extra: Extra::Press("restart"),
    },
    Entity {
        component: "switch",
        object: "effect",
        name: "Run effect",
        category: None,
        state: Some(("effect", "state")),
        command: Some(("effect", "state")),
        value_key: None,
        icon: "mdi:script-outline",
        unit: None,
        options: Options::None,
        extra: Extra::None,
    },
    Entity {
        component: "select",
        object: "effect_name",
        name: "Effect",
        category: None,
        state: Some(("effect", "name")),
        command: Some(("effect", "name")),
        value_key: None,
        icon: "mdi:script-outline",
        unit: None,
        options: Options::Effects,
        extra: Extra::None,
    },
    Entity {
        component: "light",
        object: "display",
        name: "Display",
        category: None,
        state: Some(("display", "state")),
        command: Some(("display", "state")),
        value_key: None,
        icon: "mdi:alphabetical-variant",
        unit: None,
        options: Options::None,
        extra: Extra::Light { rgb: false },
    },
    Entity {
        component: "light",
        object: "defcon",
        name: "DEFCON",
        category: None,
        state: Some(("defcon", "state")),
        command: Some(("defcon", "state")),
        value_key: None,
        icon: "mdi:numeric-5-box-outline",
        unit: None,
        options: Options::None,
        extra: Extra::Light { rgb: true },
    },
    Entity {
        component: "select",
        object: "defcon_level",
        name: "DEFCON Level",
        category: None,
        state: Some(("defcon", "level")),
        command: Some(("defcon", "level")),
        value_key: None,
        icon: "mdi:numeric-5-box-outline",
        unit: None,
        options: Options::Fixed(&DEFCON_LEVEL_OPTIONS),
        extra: Extra::None,
    },
    Entity {
        component: "text",
        object: "display_text",
        name: "Display text",
        category: None,
        state: Some(("display", "text")),
        command: Some(("display", "text")),
        value_key: None,
        icon: "mdi:format-text",
        unit: None,
        options: Options::None,
        extra: Extra::None,
    },
    Entity {
        component: "text",
        object: "display_scrolltext",
        name: "Display scroll text",
        category: None,
        state: Some(("display", "scrolltext")),
        command: Some(("display", "scrolltext")),
        value_key: None,
        icon: "mdi:text-shadow",
        unit: None,
        options: Options::None,
        extra: Extra::None,
    },
];

pub struct HomeAssistantLayer<T: RenderTarget, S: ConfigStore, P: MqttTransport, const N: usize> {
    mqtt: MqttLayer<T, S, P, N>,
    config: HomeAssistantConfig,
    status: NetworkStatus,
}

impl<T, S, P, const N: usize> HomeAssistantLayer<T, S, P, N>
where
    T: RenderTarget,
    S: ConfigStore,
    P: MqttTransport,
{
    pub fn new(mqtt: MqttLayer<T, S, P, N>) -> Self {
        Self {
            mqtt,
            config: HomeAssistantConfig::default(),
            status: NetworkStatus::default(),
        }
    }

    pub fn begin(&mut self) -> Result<(), DeviceError> {
        self.mqtt.begin()?;
        #[cfg(feature = "esp32-log")]
        if !self.config.use_home_assistant {
            println!("[HomeAssistantLayer.begin] Home Assistant is not enabled");
        }
        Ok(())
    }

    pub const fn mqtt(&self) -> &MqttLayer<T, S, P, N> {
        &self.mqtt
    }

    pub fn mqtt_mut(&mut self) -> &mut MqttLayer<T, S, P, N> {
        &mut self.mqtt
    }

    pub const fn device(&self) -> &Device<T, N> {
        self.mqtt.device()
    }

    pub fn device_mut(&mut self) -> &mut Device<T, N> {
        self.mqtt.device_mut()
    }

    pub const fn config(&self) -> &HomeAssistantConfig {
        &self.config
    }

    /// Replace the discovery settings; saved on the next tick
    pub fn set_config(&mut self, config: HomeAssistantConfig) {
        self.config = config;
        self.mqtt.device_mut().mark_config_dirty();
    }

    /// Update the diagnostics published on the next connect
    pub fn set_network_status(&mut self, status: NetworkStatus) {
        self.status = status;
    }

    /// `<discovery>/<component>/<device>/<object>/config`
    pub fn discovery_topic(&self, component: &str, object: &str) -> Result<TopicString, MqttError> {
        let mut topic = TopicString::new();
        write!(
            topic,
            "{}/{}/{}/{}/config",
            self.config.discovery_prefix.as_str(),
            component,
            self.mqtt.wifi().host_name(),
            object
        )
        .map_err(|_| MqttError::TopicTooLong)?;
        Ok(topic)
    }

    /// Announce every entity
    pub fn send_discovery(&mut self) -> Result<(), MqttError> {
        #[cfg(feature = "esp32-log")]
        println!("[HomeAssistantLayer.send_discovery] announcing {} entities", ENTITIES.len());
        for entity in &ENTITIES {
            self.announce(entity)?;
        }
        Ok(())
    }

    fn announce(&mut self, entity: &Entity) -> Result<(), MqttError> {
        let mut buf = [0u8; DISCOVERY_CAPACITY];
        let len = self.discovery_payload(entity, &mut buf)?;
        let topic = self.discovery_topic(entity.component, entity.object)?;
        self.mqtt.publish(&topic, &buf[..len], true)
    }

    /// Write the discovery document of `entity` into `buf` and return its length
    fn discovery_payload(&self, entity: &Entity, buf: &mut [u8]) -> Result<usize, MqttError> {
        let host = self.mqtt.wifi().host_name();
        let mut unique_id = String::<ID_CAPACITY>::new();
        write!(unique_id, "{}_{}", host, entity.object).map_err(|_| MqttError::TopicTooLong)?;

        let state_topic = entity
            .state
            .map(|(name, sub)| self.mqtt.topic(name, sub))
            .transpose()?;
        let command_topic = entity
            .command
            .map(|(name, sub)| self.set_topic(name, sub))
            .transpose()?;
        let mut template = String::<TEMPLATE_CAPACITY>::new();
        if let Some(key) = entity.value_key {
            write!(template, "{{{{ value_json.{} }}}}", key).map_err(|_| MqttError::PayloadTooLong)?;
        }
        let availability = self.mqtt.availability_topic()?;

        let mut effect_names = Vec::<&str, EFFECT_OPTIONS_CAPACITY>::new();
        let options: &[&str] = match entity.options {
            Options::None => &[],
            Options::Fixed(options) => options,
            Options::Effects => {
                let _ = effect_names.push("");
                for name in self.mqtt.device().scheduler().names() {
                    if effect_names.push(name).is_err() {
                        break;
                    }
                }
                effect_names.as_slice()
            }
        };

        let light = match entity.extra {
            Extra::Light { rgb } => Some((
                self.mqtt.topic(entity.object, "brightness")?,
                self.set_topic(entity.object, "brightness")?,
                rgb,
            )),
            _ => None,
        };
        let rgb_topics = match &light {
            Some((_, _, true)) => Some((
                self.mqtt.topic(entity.object, "color")?,
                self.set_topic(entity.object, "color")?,
            )),
            _ => None,
        };

        let mut discovery = Discovery {
            name: entity.name,
            unique_id: &unique_id,
            object_id: &unique_id,
            entity_category: entity.category,
            state_topic: state_topic.as_deref(),
            command_topic: command_topic.as_deref(),
            value_template: entity.value_key.map(|_| template.as_str()),
            icon: Some(entity.icon),
            unit_of_measurement: entity.unit,
            options,
            availability: [Availability {
                topic: &availability,
            }],
            device: DeviceInfo {
                name: host,
                identifiers: [host],
                manufacturer: MANUFACTURER,
                model: self.mqtt.device().variant().model(),
                sw_version: FIRMWARE_VERSION,
            },
            ..Discovery::default()
        };
        match entity.extra {
            Extra::None | Extra::Light { .. } => {}
            Extra::Number { max } => {
                discovery.min = Some(0);
                discovery.max = max;
                discovery.mode = Some("box");
            }
            Extra::Switch { on, off } => {
                discovery.payload_on = Some(on);
                discovery.payload_off = Some(off);
            }
            Extra::Press(payload) => discovery.payload_press = Some(payload),
        }
        if let Some((state, command, _)) = &light {
            discovery.brightness_state_topic = Some(state.as_str());
            discovery.brightness_command_topic = Some(command.as_str());
            discovery.brightness_scale = Some(100);
        }
        if let Some((state, command)) = &rgb_topics {
            discovery.rgb_state_topic = Some(state.as_str());
            discovery.rgb_command_topic = Some(command.as_str());
        }

        serde_json_core::to_slice(&discovery, buf).map_err(|_| MqttError::PayloadTooLong)
    }

    fn set_topic(&self, entity: &str, sub: &str) -> Result<TopicString, MqttError> {
        let mut topic = self.mqtt.topic(entity, sub)?;
        topic.push_str("/set").map_err(|()| MqttError::TopicTooLong)?;
        Ok(topic)
    }

    /// Publish address, signal strength and firmware version
    pub fn publish_diagnostics(&mut self) -> Result<(), MqttError> {
        let [a, b, c, d] = self.status.ip_address;
        let mut ip = String::<15>::new();
        write!(ip, "{}.{}.{}.{}", a, b, c, d).map_err(|_| MqttError::PayloadTooLong)?;
        let diagnostics = Diagnostics {
            ip_address: &ip,
            rssi: self.status.rssi,
            version: FIRMWARE_VERSION,
        };
        let mut buf = [0u8; 128];
        let len = serde_json_core::to_slice(&diagnostics, &mut buf).map_err(|_| MqttError::PayloadTooLong)?;
        let topic = self.mqtt.topic("diagnostic", "state")?;
        self.mqtt.publish(&topic, &buf[..len], false)
    }

    /// Publish device and network settings as one JSON object
    ///
    /// Broker credentials are left out.
    pub fn publish_config(&mut self) -> Result<(), MqttError> {
        let mut doc = JsonDocument::<CONFIG_CAPACITY>::new();
        self.mqtt
            .wifi()
            .save_sections(&mut doc)
            .map_err(|_| MqttError::PayloadTooLong)?;
        let topic = self.mqtt.topic("config", "state")?;
        self.mqtt.publish(&topic, doc.as_bytes(), false)
    }

    /// Publish the state of the effect, the display and the DEFCON strip
    pub fn publish_state(&mut self) -> Result<(), MqttError> {
        let device = self.mqtt.device();
        let running = device.current_effect_is_running();
        let name: crate::effect::EffectName = if running {
            copy_truncated(device.current_effect_name().unwrap_or(""))
        } else {
            String::new()
        };
        let display_on = device.display_state();
        let defcon_on = device.defcon_state();
        let level = device.defcon_level().as_str();
        let color = format_rgb(device.defcon_color());
        let mut display_brightness = String::<4>::new();
        let _ = write!(display_brightness, "{}", device.display_brightness());
        let mut defcon_brightness = String::<4>::new();
        let _ = write!(defcon_brightness, "{}", device.defcon_brightness());

        let mqtt = &mut self.mqtt;
        mqtt.publish_state("effect", "state", on_off(running))?;
        mqtt.publish_state("effect", "name", &name)?;
        mqtt.publish_state("display", "state", on_off(display_on))?;
        mqtt.publish_state("display", "text", "")?;
        mqtt.publish_state("display", "brightness", &display_brightness)?;
        mqtt.publish_state("display", "scrolltext", "")?;
        mqtt.publish_state("defcon", "state", on_off(defcon_on))?;
        mqtt.publish_state("defcon", "level", level)?;
        mqtt.publish_state("defcon", "brightness", &defcon_brightness)?;
        mqtt.publish_state("defcon", "color", &color)
    }

    /// Everything sent after a session comes up
    fn announce_all(&mut self) -> Result<(), MqttError> {
        self.send_discovery()?;
        self.publish_diagnostics()?;
        self.publish_config()?;
        self.publish_state()?;
        let availability = self.mqtt.availability_topic()?;
        self.mqtt.publish(&availability, b"online", false)
    }

    /// Tick without saving; outer layers call this
    #[cfg_attr(not(feature = "esp32-log"), allow(unused_variables))]
    pub fn step(&mut self, now: Instant) -> TickOutcome {
        let outcome = self.mqtt.step(now);
        if outcome.connected && self.config.use_home_assistant {
            if let Err(err) = self.announce_all() {
                #[cfg(feature = "esp32-log")]
                println!("[HomeAssistantLayer.step] discovery failed: {}", err);
            }
        }
        outcome
    }
}

fn on_off(state: bool) -> &'static str {
    if state { STATE_ON } else { STATE_OFF }
}

impl<T, S, P, const N: usize> DeviceLayer for HomeAssistantLayer<T, S, P, N>
where
    T: RenderTarget,
    S: ConfigStore,
    P: MqttTransport,
{
    fn begin(&mut self) -> Result<(), DeviceError> {
        HomeAssistantLayer::begin(self)
    }

    fn tick(&mut self, now: Instant) -> TickOutcome {
        let mut outcome = self.step(now);
        if persist_if_dirty(self, &mut outcome) {
            self.device_mut().request_restart();
        }
        outcome
    }
}

impl<T, S, P, const N: usize> ConfigLayer for HomeAssistantLayer<T, S, P, N>
where
    T: RenderTarget,
    S: ConfigStore,
    P: MqttTransport,
{
    fn load_sections(&mut self, json: &[u8]) -> Result<(), ConfigError> {
        self.mqtt.load_sections(json)?;
        self.config = decode_section(json)?;
        Ok(())
    }

    fn save_sections<const M: usize>(&self, doc: &mut JsonDocument<M>) -> Result<(), ConfigError> {
        self.mqtt.save_sections(doc)?;
        doc.merge(&self.config)
    }
}

impl<T, S, P, const N: usize> PersistedConfig for HomeAssistantLayer<T, S, P, N>
where
    T: RenderTarget,
    S: ConfigStore,
    P: MqttTransport,
{
    fn config_store(&mut self) -> &mut dyn ConfigStore {
        self.mqtt.config_store()
    }
}

impl<T, S, P, const N: usize> CommandSink for HomeAssistantLayer<T, S, P, N>
where
    T: RenderTarget,
    S: ConfigStore,
    P: MqttTransport,
{
    fn apply(&mut self, command: DeviceCommand, now: Instant) {
        self.mqtt.apply(command, now);
    }
}
