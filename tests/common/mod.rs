#![allow(dead_code)]

use std::collections::VecDeque;

use embassy_time::Instant;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use wopr_effects::config::{ConfigError, ConfigStore, DeviceConfig};
use wopr_effects::defcon::{DEFAULT_DEFCON_COLORS, DefconPalette};
use wopr_effects::device::{ConnectOptions, InboundMessage, MqttError, MqttTransport};
use wopr_effects::{EffectContext, Frame, TimeContext};

/// 2024-03-05 14:07:09 UTC, a Tuesday
pub const TUESDAY_AFTERNOON: i64 = 1_709_647_629;

pub const MAC: u64 = 0x24_0A_C4_12_34_56;
pub const HOST: &str = "wopr-c4123456";

/// Owns everything an effect context borrows
pub struct Harness {
    pub frame: Frame,
    pub time: TimeContext,
    pub rng: SmallRng,
    pub config: DeviceConfig,
    pub palette: DefconPalette,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            frame: Frame::new(),
            time: TimeContext::new(),
            rng: SmallRng::seed_from_u64(7),
            config: DeviceConfig::default(),
            palette: DEFAULT_DEFCON_COLORS,
        }
    }

    /// Harness whose clock reads `unix` at tick 0
    pub fn synced(unix: i64) -> Self {
        let mut harness = Self::new();
        harness.time.sync(unix, Instant::from_millis(0));
        harness
    }

    pub fn ctx(&mut self, millis: u64) -> EffectContext<'_> {
        EffectContext {
            now: Instant::from_millis(millis),
            target: &mut self.frame,
            clock: &self.time,
            rng: &mut self.rng,
            config: &self.config,
            palette: &self.palette,
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    pub data: Vec<u8>,
    pub writes: usize,
    pub fail_writes: bool,
}

impl MemoryStore {
    pub fn with_json(json: &str) -> Self {
        Self {
            data: json.as_bytes().to_vec(),
            ..Self::default()
        }
    }

    pub fn json(&self) -> &str {
        std::str::from_utf8(&self.data).unwrap()
    }
}

impl ConfigStore for MemoryStore {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ConfigError> {
        if self.data.is_empty() {
            return Err(ConfigError::Missing);
        }
        let len = self.data.len().min(buf.len());
        buf[..len].copy_from_slice(&self.data[..len]);
        Ok(len)
    }

    fn write(&mut self, data: &[u8]) -> Result<(), ConfigError> {
        if self.fail_writes {
            return Err(ConfigError::Storage);
        }
        self.data = data.to_vec();
        self.writes += 1;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub payload: String,
    pub retain: bool,
}

/// Broker stand-in that records everything sent to it
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub connected: bool,
    pub refuse: bool,
    pub fail_publish: bool,
    pub connects: usize,
    pub client_id: String,
    pub will_topic: String,
    pub subscriptions: Vec<String>,
    pub published: Vec<Published>,
    pub inbox: VecDeque<InboundMessage>,
}

impl RecordingTransport {
    pub fn deliver(&mut self, topic: &str, payload: &str) {
        let mut message = InboundMessage {
            topic: heapless::String::new(),
            payload: heapless::Vec::new(),
        };
        message.topic.push_str(topic).unwrap();
        message.payload.extend_from_slice(payload.as_bytes()).unwrap();
        self.inbox.push_back(message);
    }

    pub fn payloads_on(&self, topic: &str) -> Vec<&str> {
        self.published
            .iter()
            .filter(|message| message.topic == topic)
            .map(|message| message.payload.as_str())
            .collect()
    }

    pub fn last_on(&self, topic: &str) -> Option<&str> {
        self.payloads_on(topic).last().copied()
    }
}

impl MqttTransport for RecordingTransport {
    fn connect(&mut self, options: &ConnectOptions<'_>) -> Result<(), MqttError> {
        self.connects += 1;
        if self.refuse {
            return Err(MqttError::ConnectFailed);
        }
        self.client_id = options.client_id.to_string();
        self.will_topic = options.will_topic.to_string();
        self.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), MqttError> {
        self.subscriptions.push(topic.to_string());
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), MqttError> {
        if self.fail_publish {
            return Err(MqttError::PublishFailed);
        }
        self.published.push(Published {
            topic: topic.to_string(),
            payload: String::from_utf8_lossy(payload).into_owned(),
            retain,
        });
        Ok(())
    }

    fn poll(&mut self) -> Option<InboundMessage> {
        self.inbox.pop_front()
    }
}
