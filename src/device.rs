/*
 * Timer Device
 *
 * One `TimerDevice` exists per physical timer peripheral. It owns the
 * register block, the software overflow tally that extends a narrow
 * counter, and the deadline queue of software timers pending on it.
 *
 * Devices are built once when the registry is constructed and live in the
 * registry table for the rest of the program. `init` and `deinit` only flip
 * the enabled state; the device itself is never moved or reallocated.
 *
 * All mutable state sits behind a spin lock and is only touched inside a
 * critical section, which on a single core means the lock is never
 * contended. The lock is never held while a client callback runs.
 */

use core::fmt;

use critical_section::CriticalSection;
use spin::Mutex;

use crate::arm::{ArmOutcome, arm_compare, disarm_compare};
use crate::config::{DeviceConfig, TIMER_QUEUE_DEPTH};
use crate::counter::{consume_overflow, read_ticks};
use crate::critical::IrqGuard;
use crate::hw::{CompareChannel, InterruptController, TimerRegisters};
use crate::queue::DeadlineQueue;
use crate::tick::CounterWidth;

/// Index of a physical timer in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceId(pub u8);

impl DeviceId {
    /// Get the device ID as a usize for indexing
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer{}", self.0)
    }
}

/// Mutable per-device state
pub struct DeviceState<R> {
    /// Register block of the peripheral
    pub regs: R,
    /// Set by `init`, cleared by `deinit`
    pub enabled: bool,
    /// Counter width currently programmed
    pub width: CounterWidth,
    /// High-order tick bits accumulated from overflows (narrow mode only)
    pub tally: u32,
    /// Number of interrupts serviced
    pub isrs: u32,
    /// Achieved tick frequency (Hz), zero until `init`
    pub freq_hz: u32,
    /// Pending software timers
    pub queue: DeadlineQueue<TIMER_QUEUE_DEPTH>,
}

/// One physical timer and everything scheduled on it
pub struct TimerDevice<R> {
    id: DeviceId,
    config: DeviceConfig,
    pub(crate) state: Mutex<DeviceState<R>>,
}

impl<R> TimerDevice<R> {
    /// Wrap a register block; the device starts disabled
    pub fn new(id: DeviceId, regs: R, config: DeviceConfig) -> Self {
        Self {
            id,
            config,
            state: Mutex::new(DeviceState {
                regs,
                enabled: false,
                width: config.width,
                tally: 0,
                isrs: 0,
                freq_hz: 0,
                queue: DeadlineQueue::new(),
            }),
        }
    }

    /// Registry index of this device
    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// Build-time configuration of this device
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }
}

impl<R: TimerRegisters> TimerDevice<R> {
    /// Timer interrupt service routine
    ///
    /// Called by the platform vector of this device. Clears the compare and
    /// overflow events, fires every software timer whose deadline has been
    /// reached, then re-arms the compare for the new head. The whole pass
    /// runs inside one critical section so a timer started concurrently by
    /// a nested context cannot race the re-arm decision.
    ///
    /// Callbacks run synchronously from here. No lock is held while they
    /// run, so they may start, restart or stop timers on any device.
    ///
    /// # Arguments
    ///
    /// * `intc` - Interrupt controller used to force-pend a late re-arm
    ///
    /// # Returns
    ///
    /// The number of callbacks fired.
    pub fn service_interrupt<C: InterruptController>(&self, intc: &C) -> usize {
        let guard = IrqGuard::acquire();

        {
            let mut st = self.state.lock();
            if st.regs.compare_event(CompareChannel::Interrupt) {
                st.regs.clear_compare_event(CompareChannel::Interrupt);
            }
            consume_overflow(&mut st, guard.token());
            st.isrs = st.isrs.wrapping_add(1);

            if !st.enabled {
                // Spurious: nothing may fire on a stopped device
                disarm_compare(&mut st);
                return 0;
            }
        }

        // There is no compare flag to check when the interrupt was forced
        // pending, so the queue is always inspected.
        let fired = self.dispatch_expired(intc, &guard);

        let mut st = self.state.lock();
        let outcome = self.rearm(&mut st, intc, guard.token());
        log::trace!("{}: fired {}, rearm {:?}", self.id, fired, outcome);

        // Read back so the event clear has landed before the handler returns
        let _ = st.regs.compare_event(CompareChannel::Interrupt);

        fired
    }

    /// Fire queued timers one at a time until the head is in the future
    ///
    /// The counter is re-read for every timer, so deadlines that pass while
    /// earlier callbacks run are still picked up in this pass.
    fn dispatch_expired<C: InterruptController>(&self, intc: &C, guard: &IrqGuard) -> usize {
        let mut fired = 0;
        loop {
            let entry = {
                let mut st = self.state.lock();
                let now = read_ticks(&mut st, intc, self.config.irq, guard.token());
                st.queue.pop_expired(now)
            };
            let Some(entry) = entry else {
                break;
            };
            if let Some((callback, arg)) = entry.timer.take_for_fire() {
                callback(arg);
                fired += 1;
            }
        }
        fired
    }

    /// Arm the compare for the queue head, or disarm if the queue is empty
    pub(crate) fn rearm<C: InterruptController>(
        &self,
        st: &mut DeviceState<R>,
        intc: &C,
        cs: CriticalSection<'_>,
    ) -> Option<ArmOutcome> {
        match st.queue.peek_earliest().map(|head| head.expiry) {
            Some(expiry) => Some(arm_compare(st, intc, self.config.irq, expiry, cs)),
            None => {
                disarm_compare(st);
                None
            }
        }
    }
}
