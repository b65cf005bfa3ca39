//! Device commands
//!
//! Buttons, MQTT and host code request changes by queueing a
//! [`DeviceCommand`]. The main loop drains the queue with a
//! [`CommandProcessor`] and applies each command to the outermost device
//! layer, which handles what it owns and forwards the rest inwards.

use embassy_time::Instant;

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::channel::{Channel, Receiver, Sender};
use crate::color::Rgb;
use crate::config::{FormatString, NameString};
use crate::defcon::DefconLevel;
use crate::effect::EffectName;
use crate::text::TextBuffer;

/// Persisted setting change; applying one saves the configuration and
/// requests a restart
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigChange {
    TimeFormat(FormatString),
    DateFormat(FormatString),
    /// Percent
    DisplayBrightness(u8),
    /// Percent
    DefconBrightness(u8),
    /// Seconds
    EffectsTimeout(u32),
    HostName(NameString),
    UseWebPortal(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCommand {
    Restart,
    /// Start a registered effect by name
    StartEffect(EffectName),
    StopEffect,
    ShowText(TextBuffer),
    ScrollText(TextBuffer),
    DisplayState(bool),
    /// Percent
    DisplayBrightness(u8),
    DefconState(bool),
    DefconLevel(DefconLevel),
    /// Paint every pixel
    DefconColor(Rgb),
    /// Percent
    DefconBrightness(u8),
    Config(ConfigChange),
}

/// Anything that can carry out a command
pub trait CommandSink {
    fn apply(&mut self, command: DeviceCommand, now: Instant);
}

pub type CommandSender<'a, const SIZE: usize> = Sender<'a, DeviceCommand, SIZE>;

pub type CommandReceiver<'a, const SIZE: usize> = Receiver<'a, DeviceCommand, SIZE>;

pub type CommandChannel<const SIZE: usize> = Channel<DeviceCommand, SIZE>;

/// Drains queued commands into a device layer
pub struct CommandProcessor<'a, const SIZE: usize> {
    commands: CommandReceiver<'a, SIZE>,
}

impl<'a, const SIZE: usize> CommandProcessor<'a, SIZE> {
    pub const fn new(commands: CommandReceiver<'a, SIZE>) -> Self {
        Self { commands }
    }

    /// Apply every pending command in arrival order
    ///
    /// Returns the number of commands applied.
    #[cfg_attr(not(feature = "esp32-log"), allow(unused_variables))]
    pub fn process_pending<S: CommandSink + ?Sized>(&mut self, sink: &mut S, now: Instant) -> usize {
        let rejected = self.commands.take_rejected();
        #[cfg(feature = "esp32-log")]
        if rejected > 0 {
            println!("[CommandProcessor.process_pending] {} commands dropped, queue full", rejected);
        }

        let mut applied = 0;
        while let Ok(command) = self.commands.try_receive() {
            sink.apply(command, now);
            applied += 1;
        }
        applied
    }
}
