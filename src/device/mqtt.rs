//! MQTT control surface
//!
//! Topics follow `<prefix>/<device>/<entity>/<sub>`; commands arrive on
//! `<prefix>/<device>/<entity>/<sub>/set`. Every change applied through a
//! command is mirrored back on the matching state topic.
//!
//! The client itself is supplied by the host through [`MqttTransport`].
//! Connecting never blocks: a failed attempt is retried on a later tick after
//! a short back-off.

use core::fmt::Write;

use embassy_time::{Duration, Instant};
use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

#[cfg(feature = "esp32-log")]
use esp_println::println;

use super::{Device, DeviceError, DeviceLayer, TickOutcome, WifiLayer, persist_if_dirty};
use crate::RenderTarget;
use crate::color::{format_rgb, parse_rgb};
use crate::command::{CommandSink, ConfigChange, DeviceCommand};
use crate::config::{
    ConfigError, ConfigLayer, ConfigStore, JsonDocument, NameString, PersistedConfig,
    decode_section,
};
use crate::defcon::DefconLevel;
use crate::effect::EffectName;
use crate::text::copy_truncated;

/// Longest topic, prefix and host name included
pub const TOPIC_CAPACITY: usize = 128;
/// Longest inbound command payload
pub const PAYLOAD_CAPACITY: usize = 256;

pub type TopicString = String<TOPIC_CAPACITY>;

const DEFAULT_PORT: u16 = 1883;
const DEFAULT_PREFIX: &str = "wopr";

/// Connection attempts reported as one failure
const CONNECT_ATTEMPTS: u8 = 3;
const CONNECT_BACKOFF: Duration = Duration::from_millis(500);

const ENTITY_DEVICE: &str = "device";
const ENTITY_CONFIG: &str = "config";
const ENTITY_EFFECT: &str = "effect";
const ENTITY_DISPLAY: &str = "display";
const ENTITY_DEFCON: &str = "defcon";

const SUB_STATE: &str = "state";
const SUB_BRIGHTNESS: &str = "brightness";
const SUB_COLOR: &str = "color";
const SUB_TEXT: &str = "text";
const SUB_SCROLLTEXT: &str = "scrolltext";
const SUB_EVENT: &str = "event";
const SUB_LEVEL: &str = "level";
const SUB_NAME: &str = "name";
const SUB_EFFECTS_TIMEOUT: &str = "effects_timeout";
const SUB_TIME_FORMAT: &str = "time_format";
const SUB_DATE_FORMAT: &str = "date_format";
const SUB_DEFCON_BRIGHTNESS: &str = "defcon_brightness";
const SUB_DISPLAY_BRIGHTNESS: &str = "display_brightness";
const SUB_HOST_NAME: &str = "host_name";
const SUB_USE_WEB_PORTAL: &str = "use_web_portal";

const COMMAND_SET: &str = "set";
const AVAILABILITY: &str = "availability";

pub(crate) const STATE_ON: &str = "ON";
pub(crate) const STATE_OFF: &str = "OFF";
const ONLINE: &str = "online";
const OFFLINE: &str = "offline";
const PAYLOAD_RESTART: &str = "restart";
const PAYLOAD_TRUE: &str = "True";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MqttError {
    #[error("MQTT is disabled")]
    Disabled,
    #[error("not connected to the broker")]
    Disconnected,
    #[error("publish failed")]
    PublishFailed,
    #[error("could not connect to the broker")]
    ConnectFailed,
    #[error("topic does not fit the topic buffer")]
    TopicTooLong,
    #[error("payload does not fit the payload buffer")]
    PayloadTooLong,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MqttConfig {
    pub use_mqtt: bool,
    pub mqtt_server_name: NameString,
    pub mqtt_server_port: u16,
    pub mqtt_user_name: NameString,
    pub mqtt_password: NameString,
    pub mqtt_prefix: NameString,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            use_mqtt: false,
            mqtt_server_name: NameString::new(),
            mqtt_server_port: DEFAULT_PORT,
            mqtt_user_name: NameString::new(),
            mqtt_password: NameString::new(),
            mqtt_prefix: copy_truncated(DEFAULT_PREFIX),
        }
    }
}

/// Session parameters handed to the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectOptions<'a> {
    pub client_id: &'a str,
    pub host: &'a str,
    pub port: u16,
    /// Empty when the broker needs no login
    pub user_name: &'a str,
    pub password: &'a str,
    pub will_topic: &'a str,
    pub will_payload: &'a str,
    pub will_retain: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: TopicString,
    pub payload: Vec<u8, PAYLOAD_CAPACITY>,
}

/// Host MQTT client
pub trait MqttTransport {
    fn connect(&mut self, options: &ConnectOptions<'_>) -> Result<(), MqttError>;

    fn is_connected(&self) -> bool;

    fn subscribe(&mut self, topic: &str) -> Result<(), MqttError>;

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), MqttError>;

    /// Next message received since the last call, if any
    fn poll(&mut self) -> Option<InboundMessage>;
}

/// Turn the entity, sub-entity and payload of a `set` topic into a command
///
/// Returns `None` for unknown topics and malformed payloads.
pub fn parse_command(entity: &str, sub: &str, payload: &str) -> Option<DeviceCommand> {
    let command = match (entity, sub) {
        (ENTITY_DEVICE, SUB_STATE) if payload == PAYLOAD_RESTART => DeviceCommand::Restart,
        (ENTITY_CONFIG, _) => DeviceCommand::Config(parse_config_change(sub, payload)?),
        (ENTITY_EFFECT, SUB_STATE) if payload == STATE_OFF => DeviceCommand::StopEffect,
        (ENTITY_EFFECT, SUB_STATE | SUB_NAME) if payload.is_empty() => DeviceCommand::StopEffect,
        (ENTITY_EFFECT, SUB_STATE | SUB_NAME) => DeviceCommand::StartEffect(copy_truncated(payload)),
        (ENTITY_DISPLAY, SUB_STATE) => DeviceCommand::DisplayState(payload == STATE_ON),
        (ENTITY_DISPLAY, SUB_TEXT) => DeviceCommand::ShowText(copy_truncated(payload)),
        (ENTITY_DISPLAY, SUB_SCROLLTEXT) => DeviceCommand::ScrollText(copy_truncated(payload)),
        (ENTITY_DISPLAY, SUB_BRIGHTNESS) => DeviceCommand::DisplayBrightness(parse_percent(payload)?),
        (ENTITY_DEFCON, SUB_STATE) => DeviceCommand::DefconState(payload == STATE_ON),
        (ENTITY_DEFCON, SUB_LEVEL) => DeviceCommand::DefconLevel(DefconLevel::parse_from_str(payload)),
        (ENTITY_DEFCON, SUB_COLOR) => DeviceCommand::DefconColor(parse_rgb(payload)?),
        (ENTITY_DEFCON, SUB_BRIGHTNESS) => DeviceCommand::DefconBrightness(parse_percent(payload)?),
        _ => return None,
    };
    Some(command)
}

fn parse_config_change(sub: &str, payload: &str) -> Option<ConfigChange> {
    let change = match sub {
        SUB_TIME_FORMAT => ConfigChange::TimeFormat(copy_truncated(payload)),
        SUB_DATE_FORMAT => ConfigChange::DateFormat(copy_truncated(payload)),
        SUB_DISPLAY_BRIGHTNESS => ConfigChange::DisplayBrightness(parse_percent(payload)?),
        SUB_DEFCON_BRIGHTNESS => ConfigChange::DefconBrightness(parse_percent(payload)?),
        SUB_EFFECTS_TIMEOUT => ConfigChange::EffectsTimeout(payload.trim().parse().ok()?),
        SUB_HOST_NAME => ConfigChange::HostName(copy_truncated(payload)),
        SUB_USE_WEB_PORTAL => ConfigChange::UseWebPortal(payload == PAYLOAD_TRUE),
        _ => return None,
    };
    Some(change)
}

fn parse_percent(payload: &str) -> Option<u8> {
    payload.trim().parse::<u8>().ok().map(|value| value.min(100))
}

pub struct MqttLayer<T: RenderTarget, S: ConfigStore, P: MqttTransport, const N: usize> {
    wifi: WifiLayer<T, S, N>,
    transport: P,
    config: MqttConfig,
    failures: u8,
    retry_at: Option<Instant>,
    /// Effect last reported as running; `None` once `OFF` was published
    reported_effect: Option<EffectName>,
    reported_off: bool,
}

impl<T: RenderTarget, S: ConfigStore, P: MqttTransport, const N: usize> MqttLayer<T, S, P, N> {
    pub fn new(wifi: WifiLayer<T, S, N>, transport: P) -> Self {
        Self {
            wifi,
            transport,
            config: MqttConfig::default(),
            failures: 0,
            retry_at: None,
            reported_effect: None,
            reported_off: false,
        }
    }

    pub fn begin(&mut self) -> Result<(), DeviceError> {
        self.wifi.begin()?;
        #[cfg(feature = "esp32-log")]
        if !self.is_enabled() {
            println!("[MqttLayer.begin] MQTT is not enabled");
        }
        Ok(())
    }

    pub const fn wifi(&self) -> &WifiLayer<T, S, N> {
        &self.wifi
    }

    pub fn wifi_mut(&mut self) -> &mut WifiLayer<T, S, N> {
        &mut self.wifi
    }

    pub const fn device(&self) -> &Device<T, N> {
        self.wifi.device()
    }

    pub fn device_mut(&mut self) -> &mut Device<T, N> {
        self.wifi.device_mut()
    }

    pub const fn transport(&self) -> &P {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut P {
        &mut self.transport
    }

    pub const fn config(&self) -> &MqttConfig {
        &self.config
    }

    /// Replace the broker settings; saved on the next tick
    pub fn set_config(&mut self, config: MqttConfig) {
        self.config = config;
        self.wifi.device_mut().mark_config_dirty();
    }

    /// MQTT is switched on and a broker is configured
    pub fn is_enabled(&self) -> bool {
        self.config.use_mqtt && !self.config.mqtt_server_name.is_empty()
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// `<prefix>/<device>/<entity>/<sub>`
    pub fn topic(&self, entity: &str, sub: &str) -> Result<TopicString, MqttError> {
        self.build_topic(&[entity, sub])
    }

    /// `<prefix>/<device>/availability`
    pub fn availability_topic(&self) -> Result<TopicString, MqttError> {
        self.build_topic(&[AVAILABILITY])
    }

    /// `<prefix>/<device>/+/+/+`
    pub fn subscription_topic(&self) -> Result<TopicString, MqttError> {
        self.build_topic(&["+", "+", "+"])
    }

    fn build_topic(&self, parts: &[&str]) -> Result<TopicString, MqttError> {
        let mut topic = TopicString::new();
        write!(topic, "{}/{}", self.config.mqtt_prefix.as_str(), self.wifi.host_name())
            .map_err(|_| MqttError::TopicTooLong)?;
        for part in parts {
            write!(topic, "/{}", part).map_err(|_| MqttError::TopicTooLong)?;
        }
        Ok(topic)
    }

    /// Publish `payload` on `topic`
    ///
    /// Fails without queueing when MQTT is disabled or disconnected.
    #[cfg_attr(not(feature = "esp32-log"), allow(unused_variables))]
    pub fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), MqttError> {
        if !self.is_enabled() {
            return Err(MqttError::Disabled);
        }
        if !self.transport.is_connected() {
            return Err(MqttError::Disconnected);
        }
        self.transport.publish(topic, payload, retain).map_err(|err| {
            #[cfg(feature = "esp32-log")]
            println!("[MqttLayer.publish] {} on {}", err, topic);
            MqttError::PublishFailed
        })
    }

    /// Publish a text value on `<entity>/<sub>`
    pub fn publish_state(&mut self, entity: &str, sub: &str, value: &str) -> Result<(), MqttError> {
        let topic = self.topic(entity, sub)?;
        self.publish(&topic, value.as_bytes(), false)
    }

    /// Try to open a session unless one is up or the back-off is running
    ///
    /// Returns true when a new session was established.
    #[cfg_attr(not(feature = "esp32-log"), allow(unused_variables))]
    pub fn connect(&mut self, now: Instant) -> Result<bool, MqttError> {
        if !self.is_enabled() {
            return Err(MqttError::Disabled);
        }
        if self.transport.is_connected() {
            return Ok(false);
        }
        if let Some(retry_at) = self.retry_at
            && now < retry_at
        {
            return Err(MqttError::Disconnected);
        }

        let will_topic = self.availability_topic()?;
        let options = ConnectOptions {
            client_id: self.wifi.host_name(),
            host: &self.config.mqtt_server_name,
            port: self.config.mqtt_server_port,
            user_name: &self.config.mqtt_user_name,
            password: &self.config.mqtt_password,
            will_topic: &will_topic,
            will_payload: OFFLINE,
            will_retain: true,
        };
        if let Err(err) = self.transport.connect(&options) {
            self.failures += 1;
            self.retry_at = Some(now + CONNECT_BACKOFF);
            #[cfg(feature = "esp32-log")]
            println!("[MqttLayer.connect] attempt {} failed: {}", self.failures, err);
            if self.failures >= CONNECT_ATTEMPTS {
                self.failures = 0;
                return Err(MqttError::ConnectFailed);
            }
            return Err(MqttError::Disconnected);
        }

        self.failures = 0;
        self.retry_at = None;
        let subscription = self.subscription_topic()?;
        self.transport.subscribe(&subscription)?;
        self.publish(&will_topic, ONLINE.as_bytes(), false)?;
        self.reported_effect = None;
        self.reported_off = false;
        #[cfg(feature = "esp32-log")]
        println!("[MqttLayer.connect] connected as {}", self.wifi.host_name());
        Ok(true)
    }

    /// Entity and sub-entity of a command topic addressed to this device
    fn command_parts<'t>(&self, topic: &'t str) -> Option<(&'t str, &'t str)> {
        let mut parts = topic.split('/');
        let prefix = parts.next()?;
        let device = parts.next()?;
        let entity = parts.next()?;
        let sub = parts.next()?;
        let command = parts.next()?;
        if parts.next().is_some()
            || prefix != self.config.mqtt_prefix.as_str()
            || device != self.wifi.host_name()
            || command != COMMAND_SET
        {
            return None;
        }
        Some((entity, sub))
    }

    /// Apply one received message
    pub fn handle_message(&mut self, message: &InboundMessage, now: Instant) {
        let Ok(payload) = core::str::from_utf8(&message.payload) else {
            #[cfg(feature = "esp32-log")]
            println!("[MqttLayer.handle_message] payload is not UTF-8");
            return;
        };
        let Some((entity, sub)) = self.command_parts(&message.topic) else {
            return;
        };
        match parse_command(entity, sub, payload) {
            Some(command) => self.apply(command, now),
            None => {
                #[cfg(feature = "esp32-log")]
                println!("[MqttLayer.handle_message] unsupported command {}/{}", entity, sub);
            }
        }
    }

    /// Publish the state a command changed
    fn mirror(&mut self, command: &DeviceCommand) {
        let device = self.wifi.device();
        let mut number = String::<4>::new();
        let result = match command {
            DeviceCommand::ShowText(text) => self.publish_state(ENTITY_DISPLAY, SUB_TEXT, text),
            DeviceCommand::ScrollText(text) => {
                self.publish_state(ENTITY_DISPLAY, SUB_SCROLLTEXT, text)
            }
            DeviceCommand::DisplayState(_) => {
                let state = on_off(device.display_state());
                self.publish_state(ENTITY_DISPLAY, SUB_STATE, state)
            }
            DeviceCommand::DisplayBrightness(_) => {
                let _ = write!(number, "{}", device.display_brightness());
                self.publish_state(ENTITY_DISPLAY, SUB_BRIGHTNESS, &number)
            }
            DeviceCommand::DefconState(_) => {
                let state = on_off(device.defcon_state());
                self.publish_state(ENTITY_DEFCON, SUB_STATE, state)
            }
            DeviceCommand::DefconLevel(_) => {
                let level = device.defcon_level().as_str();
                self.publish_state(ENTITY_DEFCON, SUB_LEVEL, level)
            }
            DeviceCommand::DefconColor(_) => {
                let color = format_rgb(device.defcon_color());
                self.publish_state(ENTITY_DEFCON, SUB_COLOR, &color)
            }
            DeviceCommand::DefconBrightness(_) => {
                let _ = write!(number, "{}", device.defcon_brightness());
                self.publish_state(ENTITY_DEFCON, SUB_BRIGHTNESS, &number)
            }
            DeviceCommand::StartEffect(_)
            | DeviceCommand::StopEffect
            | DeviceCommand::Restart
            | DeviceCommand::Config(_) => Ok(()),
        };
        log_failure(result);
    }

    /// Publish effect name and state when they changed since the last report
    fn report_effect_state(&mut self) {
        let device = self.wifi.device();
        if device.current_effect_is_running() {
            let Some(name) = device.current_effect_name() else {
                return;
            };
            if self.reported_effect.as_deref() == Some(name) {
                return;
            }
            let name: EffectName = copy_truncated(name);
            log_failure(self.publish_state(ENTITY_EFFECT, SUB_NAME, &name));
            log_failure(self.publish_state(ENTITY_EFFECT, SUB_STATE, STATE_ON));
            self.reported_effect = Some(name);
            self.reported_off = false;
        } else if device.scheduler().idle_deadline().is_none() && !self.reported_off {
            log_failure(self.publish_state(ENTITY_EFFECT, SUB_STATE, STATE_OFF));
            self.reported_effect = None;
            self.reported_off = true;
        }
    }

    /// Tick without saving; outer layers call this
    pub fn step(&mut self, now: Instant) -> TickOutcome {
        let mut outcome = self.wifi.step(now);
        if !self.is_enabled() {
            return outcome;
        }

        outcome.connected = self.connect(now).unwrap_or(false);
        if !self.transport.is_connected() {
            return outcome;
        }

        while let Some(message) = self.transport.poll() {
            self.handle_message(&message, now);
        }
        for press in &outcome.presses {
            let result = self.publish_state(press.button.entity(), SUB_EVENT, press.event.as_str());
            log_failure(result);
        }
        self.report_effect_state();
        outcome
    }
}

fn on_off(state: bool) -> &'static str {
    if state { STATE_ON } else { STATE_OFF }
}

#[cfg_attr(not(feature = "esp32-log"), allow(unused_variables))]
fn log_failure(result: Result<(), MqttError>) {
    #[cfg(feature = "esp32-log")]
    if let Err(err) = result {
        println!("[MqttLayer] publish failed: {}", err);
    }
}

impl<T, S, P, const N: usize> DeviceLayer for MqttLayer<T, S, P, N>
where
    T: RenderTarget,
    S: ConfigStore,
    P: MqttTransport,
{
    fn begin(&mut self) -> Result<(), DeviceError> {
        MqttLayer::begin(self)
    }

    fn tick(&mut self, now: Instant) -> TickOutcome {
        let mut outcome = self.step(now);
        if persist_if_dirty(self, &mut outcome) {
            self.device_mut().request_restart();
        }
        outcome
    }
}

impl<T, S, P, const N: usize> ConfigLayer for MqttLayer<T, S, P, N>
where
    T: RenderTarget,
    S: ConfigStore,
    P: MqttTransport,
{
    fn load_sections(&mut self, json: &[u8]) -> Result<(), ConfigError> {
        self.wifi.load_sections(json)?;
        self.config = decode_section(json)?;
        Ok(())
    }

    fn save_sections<const M: usize>(&self, doc: &mut JsonDocument<M>) -> Result<(), ConfigError> {
        self.wifi.save_sections(doc)?;
        doc.merge(&self.config)
    }
}

impl<T, S, P, const N: usize> PersistedConfig for MqttLayer<T, S, P, N>
where
    T: RenderTarget,
    S: ConfigStore,
    P: MqttTransport,
{
    fn config_store(&mut self) -> &mut dyn ConfigStore {
        self.wifi.config_store()
    }
}

impl<T, S, P, const N: usize> CommandSink for MqttLayer<T, S, P, N>
where
    T: RenderTarget,
    S: ConfigStore,
    P: MqttTransport,
{
    fn apply(&mut self, command: DeviceCommand, now: Instant) {
        self.wifi.apply(command.clone(), now);
        if self.is_enabled() && self.transport.is_connected() {
            self.mirror(&command);
            self.report_effect_state();
        }
    }
}
