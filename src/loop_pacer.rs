//! Main loop pacing
//!
//! Runs the outermost device layer at a fixed period without async or
//! platform timers. The caller sleeps for the returned duration between
//! ticks.

use embassy_time::{Duration, Instant};

use crate::device::{DeviceLayer, TickOutcome};

/// Default main loop period
pub const DEFAULT_LOOP_PERIOD: Duration = Duration::from_millis(10);

/// Timing and outcome of one loop pass
#[derive(Debug, Clone)]
pub struct LoopResult {
    /// When the next pass is due
    pub next_deadline: Instant,
    /// How long to wait for it; zero when behind schedule
    pub sleep_duration: Duration,
    pub outcome: TickOutcome,
}

/// Fixed-period driver for a device layer stack
///
/// ```ignore
/// let mut pacer = LoopPacer::new(layer);
///
/// loop {
///     let result = pacer.tick(Instant::now());
///     if result.outcome.restart_requested {
///         reboot();
///     }
///     sleep(result.sleep_duration);
/// }
/// ```
pub struct LoopPacer<L: DeviceLayer> {
    layer: L,
    next_tick: Instant,
    period: Duration,
}

impl<L: DeviceLayer> LoopPacer<L> {
    pub fn new(layer: L) -> Self {
        Self::with_period(layer, DEFAULT_LOOP_PERIOD)
    }

    pub fn with_period(layer: L, period: Duration) -> Self {
        Self {
            layer,
            next_tick: Instant::from_millis(0),
            period,
        }
    }

    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Tick the layer and work out when to tick it again
    ///
    /// Falling more than two periods behind drops the backlog instead of
    /// ticking in a burst to catch up.
    pub fn tick(&mut self, now: Instant) -> LoopResult {
        let max_drift = self.period * 2;
        if now > self.next_tick + max_drift {
            self.next_tick = now;
        }

        let outcome = self.layer.tick(now);

        self.next_tick += self.period;
        let sleep_duration = self.next_tick.saturating_duration_since(now);

        LoopResult {
            next_deadline: self.next_tick,
            sleep_duration,
            outcome,
        }
    }

    pub const fn layer(&self) -> &L {
        &self.layer
    }

    /// Access for command processing and configuration between ticks
    pub fn layer_mut(&mut self) -> &mut L {
        &mut self.layer
    }

    pub fn into_inner(self) -> L {
        self.layer
    }
}
