/*
 * Software Timer Descriptor
 *
 * A `HalTimer` is owned by the client (typically a `static`) for its whole
 * life. The device queue only ever borrows it through a `&'static` link
 * while it is pending; the membership flag in the slot says whether such a
 * link exists.
 *
 * The slot is mutated only while the timer is attached, started, stopped or
 * fired. Every access, reads included, happens inside a critical section:
 * the interrupt handler takes the same lock.
 */

use spin::Mutex;

use crate::critical::without_interrupts;
use crate::device::DeviceId;
use crate::tick::Ticks;

/// Callback invoked from the timer interrupt with the opaque argument
///
/// Runs at interrupt priority with interrupts masked: keep it short and
/// never block.
pub type TimerCallback = fn(usize);

/// Mutable part of a software timer
#[derive(Debug, Clone, Copy)]
pub(crate) struct TimerSlot {
    pub(crate) callback: Option<TimerCallback>,
    pub(crate) arg: usize,
    pub(crate) device: Option<DeviceId>,
    pub(crate) expiry: Ticks,
    pub(crate) linked: bool,
}

impl TimerSlot {
    const fn new() -> Self {
        Self {
            callback: None,
            arg: 0,
            device: None,
            expiry: 0,
            linked: false,
        }
    }
}

/// Client-owned one-shot software timer
pub struct HalTimer {
    pub(crate) slot: Mutex<TimerSlot>,
}

impl HalTimer {
    /// Create an idle, detached timer
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(TimerSlot::new()),
        }
    }

    /// True while the timer sits in a device queue
    pub fn is_pending(&self) -> bool {
        without_interrupts(|_cs| self.slot.lock().linked)
    }

    /// Absolute expiry, only meaningful while pending
    pub fn expiry(&self) -> Option<Ticks> {
        without_interrupts(|_cs| {
            let slot = self.slot.lock();
            slot.linked.then_some(slot.expiry)
        })
    }

    /// Device the timer was attached to by `set_callback`
    pub fn device(&self) -> Option<DeviceId> {
        without_interrupts(|_cs| self.slot.lock().device)
    }

    /// Unlink after being popped from a queue and hand out the callback
    pub(crate) fn take_for_fire(&self) -> Option<(TimerCallback, usize)> {
        let mut slot = self.slot.lock();
        slot.linked = false;
        let arg = slot.arg;
        slot.callback.map(|cb| (cb, arg))
    }
}

impl Default for HalTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for HalTimer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let (device, linked, expiry) = without_interrupts(|_cs| {
            let slot = self.slot.lock();
            (slot.device, slot.linked, slot.expiry)
        });
        f.debug_struct("HalTimer")
            .field("device", &device)
            .field("linked", &linked)
            .field("expiry", &expiry)
            .finish()
    }
}
