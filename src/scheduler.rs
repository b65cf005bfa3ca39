//! Effect catalog and hand-off between effects
//!
//! The scheduler owns every registered effect. One of them is current at a
//! time; when it stops and a default effect is registered, the default is
//! promoted after the idle timeout.

use embassy_time::{Duration, Instant};
use heapless::Vec;

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::effect::{Effect, EffectContext, EffectSlot};

/// Idle time before the default effect starts, unless configured
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Which effect is current
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Active {
    Registered(usize),
    /// Transient effect outside the catalog
    OneShot,
}

/// Index of a registered effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectHandle(usize);

impl EffectHandle {
    pub const fn index(self) -> usize {
        self.0
    }
}

pub struct EffectScheduler<const N: usize> {
    effects: Vec<EffectSlot, N>,
    oneshot: Option<EffectSlot>,
    current: Option<Active>,
    default: Option<usize>,
    idle_deadline: Option<Instant>,
    idle_timeout: Duration,
}

impl<const N: usize> Default for EffectScheduler<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> EffectScheduler<N> {
    pub const fn new() -> Self {
        Self {
            effects: Vec::new(),
            oneshot: None,
            current: None,
            default: None,
            idle_deadline: None,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    /// Add an effect to the catalog
    ///
    /// Returns the effect back when the catalog is full.
    pub fn register(&mut self, effect: impl Into<EffectSlot>) -> Result<EffectHandle, EffectSlot> {
        let index = self.effects.len();
        self.effects.push(effect.into())?;
        Ok(EffectHandle(index))
    }

    /// Add an effect and make it the one started after the idle timeout
    pub fn register_default(
        &mut self,
        effect: impl Into<EffectSlot>,
    ) -> Result<EffectHandle, EffectSlot> {
        let handle = self.register(effect)?;
        self.default = Some(handle.0);
        Ok(handle)
    }

    pub fn set_idle_timeout(&mut self, timeout: Duration) {
        self.idle_timeout = timeout;
    }

    pub const fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// When the default effect will start, if the idle timer is armed
    pub const fn idle_deadline(&self) -> Option<Instant> {
        self.idle_deadline
    }

    /// Stop the current effect if needed, then start `handle`
    pub fn start(&mut self, handle: EffectHandle, ctx: &mut EffectContext<'_>) {
        if handle.0 >= self.effects.len() {
            return;
        }
        self.stop_running(ctx);
        self.idle_deadline = None;
        self.current = Some(Active::Registered(handle.0));
        let effect = &mut self.effects[handle.0];
        #[cfg(feature = "esp32-log")]
        println!("[EffectScheduler.start] starting effect {}", effect.name());
        effect.start(ctx);
    }

    /// Stop the current effect if needed, then run `effect` without adding it
    /// to the catalog
    ///
    /// The effect replaces any earlier one-shot effect and cannot be started
    /// by name.
    pub fn start_oneshot(&mut self, effect: impl Into<EffectSlot>, ctx: &mut EffectContext<'_>) {
        self.stop_running(ctx);
        self.idle_deadline = None;
        self.current = Some(Active::OneShot);
        let effect = self.oneshot.insert(effect.into());
        #[cfg(feature = "esp32-log")]
        println!("[EffectScheduler.start_oneshot] starting effect {}", effect.name());
        effect.start(ctx);
    }

    /// Start the first registered effect called `name`
    ///
    /// Returns false when no effect has that name.
    pub fn start_by_name(&mut self, name: &str, ctx: &mut EffectContext<'_>) -> bool {
        let Some(handle) = self.find(name) else {
            #[cfg(feature = "esp32-log")]
            println!("[EffectScheduler.start_by_name] unknown effect {}", name);
            return false;
        };
        self.start(handle, ctx);
        true
    }

    /// Restart the current effect
    pub fn start_current(&mut self, ctx: &mut EffectContext<'_>) {
        self.idle_deadline = None;
        if let Some(effect) = self.current_mut() {
            effect.start(ctx);
        }
    }

    pub fn stop_current(&mut self, ctx: &mut EffectContext<'_>) {
        if let Some(effect) = self.current_mut() {
            effect.stop(ctx);
        }
    }

    pub fn current_is_running(&self) -> bool {
        self.current().is_some_and(Effect::is_running)
    }

    pub fn default_is_running(&self) -> bool {
        self.default
            .and_then(|index| self.effects.get(index))
            .is_some_and(Effect::is_running)
    }

    pub fn current(&self) -> Option<&EffectSlot> {
        match self.current? {
            Active::Registered(index) => self.effects.get(index),
            Active::OneShot => self.oneshot.as_ref(),
        }
    }

    pub fn current_mut(&mut self) -> Option<&mut EffectSlot> {
        match self.current? {
            Active::Registered(index) => self.effects.get_mut(index),
            Active::OneShot => self.oneshot.as_mut(),
        }
    }

    /// Handle of the current effect, unless it is a one-shot effect
    pub fn current_handle(&self) -> Option<EffectHandle> {
        match self.current? {
            Active::Registered(index) => Some(EffectHandle(index)),
            Active::OneShot => None,
        }
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current().map(Effect::name)
    }

    pub fn get(&self, handle: EffectHandle) -> Option<&EffectSlot> {
        self.effects.get(handle.0)
    }

    pub fn get_mut(&mut self, handle: EffectHandle) -> Option<&mut EffectSlot> {
        self.effects.get_mut(handle.0)
    }

    pub fn find(&self, name: &str) -> Option<EffectHandle> {
        self.effects
            .iter()
            .position(|effect| effect.name() == name)
            .map(EffectHandle)
    }

    /// Names of all registered effects in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.effects.iter().map(Effect::name)
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Advance the running effect or count down to the default effect
    pub fn tick(&mut self, ctx: &mut EffectContext<'_>) {
        if let Some(effect) = self.current_mut()
            && effect.is_running()
        {
            effect.tick(ctx);
            return;
        }

        let Some(default) = self.default else {
            return;
        };

        match self.idle_deadline {
            None => {
                self.idle_deadline = Some(ctx.now + self.idle_timeout);
            }
            Some(deadline) if ctx.now >= deadline => {
                #[cfg(feature = "esp32-log")]
                println!("[EffectScheduler.tick] idle timeout, starting default effect");
                self.start(EffectHandle(default), ctx);
            }
            Some(_) => {}
        }
    }

    fn stop_running(&mut self, ctx: &mut EffectContext<'_>) {
        if let Some(effect) = self.current_mut()
            && effect.is_running()
        {
            effect.stop(ctx);
        }
    }
}
