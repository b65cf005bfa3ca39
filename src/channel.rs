//! Bounded command queue shared between interrupt, network and loop code
//!
//! Backed by a `heapless::Deque` inside a `critical_section::Mutex`, so any
//! context may push while the main loop drains. Values rejected by a full
//! queue are counted so the loop can report lost button presses or commands.

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Deque;

/// The queue was full; the value is handed back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrySendError<T>(pub T);

/// The queue was empty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TryReceiveError;

struct Slots<T, const SIZE: usize> {
    queue: Deque<T, SIZE>,
    rejected: u32,
}

/// Fixed-capacity multi-producer queue
pub struct Channel<T, const SIZE: usize> {
    slots: Mutex<RefCell<Slots<T, SIZE>>>,
}

impl<T, const SIZE: usize> Channel<T, SIZE> {
    pub const fn new() -> Self {
        Self {
            slots: Mutex::new(RefCell::new(Slots {
                queue: Deque::new(),
                rejected: 0,
            })),
        }
    }

    /// Handle for producers
    pub const fn sender(&self) -> Sender<'_, T, SIZE> {
        Sender { channel: self }
    }

    /// Handle for the loop that drains the queue
    pub const fn receiver(&self) -> Receiver<'_, T, SIZE> {
        Receiver { channel: self }
    }

    fn with_slots<R>(&self, f: impl FnOnce(&mut Slots<T, SIZE>) -> R) -> R {
        critical_section::with(|cs| f(&mut self.slots.borrow(cs).borrow_mut()))
    }

    pub fn try_send(&self, value: T) -> Result<(), TrySendError<T>> {
        self.with_slots(|slots| {
            slots.queue.push_back(value).map_err(|value| {
                slots.rejected = slots.rejected.saturating_add(1);
                TrySendError(value)
            })
        })
    }

    pub fn try_receive(&self) -> Result<T, TryReceiveError> {
        self.with_slots(|slots| slots.queue.pop_front().ok_or(TryReceiveError))
    }

    /// Number of queued values
    pub fn len(&self) -> usize {
        self.with_slots(|slots| slots.queue.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Values turned away since the last call, resetting the count
    pub fn take_rejected(&self) -> u32 {
        self.with_slots(|slots| core::mem::take(&mut slots.rejected))
    }

    /// Drop every queued value
    pub fn clear(&self) {
        self.with_slots(|slots| slots.queue.clear());
    }
}

impl<T, const SIZE: usize> Default for Channel<T, SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy)]
pub struct Sender<'a, T, const SIZE: usize> {
    channel: &'a Channel<T, SIZE>,
}

impl<T, const SIZE: usize> Sender<'_, T, SIZE> {
    /// Queue `value`, handing it back when the queue is full
    pub fn try_send(&self, value: T) -> Result<(), TrySendError<T>> {
        self.channel.try_send(value)
    }
}

#[derive(Clone, Copy)]
pub struct Receiver<'a, T, const SIZE: usize> {
    channel: &'a Channel<T, SIZE>,
}

impl<T, const SIZE: usize> Receiver<'_, T, SIZE> {
    pub fn try_receive(&self) -> Result<T, TryReceiveError> {
        self.channel.try_receive()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    pub fn take_rejected(&self) -> u32 {
        self.channel.take_rejected()
    }
}
