/*
 * Timer Registry
 *
 * The registry owns one `TimerDevice` per physical timer plus the platform
 * collaborators (interrupt controller, clock source), and exposes the
 * public scheduling API on top of them.
 *
 * Why this is important:
 * - Replaces per-peripheral global state with a single owned table that the
 *   runtime constructs once and holds for the life of the program
 * - Every operation that touches a queue or the compare registers does so
 *   inside one critical section, so the timer interrupt always observes a
 *   consistent queue head and compare setting
 * - Software timers only ever hold a device id, never a pointer into the
 *   table, so devices can sit in a plain array
 *
 * Lock order is timer slot, then device state. No lock is held across a
 * client callback.
 */

use crate::arm::arm_compare;
use crate::config::{DeviceConfig, MAX_HAL_TIMERS};
use crate::counter::read_ticks;
use crate::critical::{IrqGuard, without_interrupts};
use crate::device::{DeviceId, TimerDevice};
use crate::error::{InvalidArgument, Result};
use crate::freq::select_prescaler;
use crate::hw::{ClockSource, CompareChannel, InterruptController, TimerRegisters};
use crate::tick::{Ticks, tick_reached};
use crate::timer::{HalTimer, TimerCallback};

/// Table of physical timers and the scheduling API over them
pub struct TimerRegistry<R, C, K> {
    devices: [Option<TimerDevice<R>>; MAX_HAL_TIMERS],
    intc: C,
    clock: K,
}

impl<R, C, K> TimerRegistry<R, C, K> {
    /// Create an empty registry
    pub const fn new(intc: C, clock: K) -> Self {
        Self {
            devices: [const { None }; MAX_HAL_TIMERS],
            intc,
            clock,
        }
    }

    /// Put a physical timer into slot `id`
    ///
    /// Called once per peripheral while the runtime builds the registry.
    /// A device that is running, or still has timers queued, cannot be
    /// replaced.
    pub fn register(&mut self, id: DeviceId, regs: R, config: DeviceConfig) -> Result<()> {
        let slot = self
            .devices
            .get_mut(id.as_usize())
            .ok_or(InvalidArgument::DeviceOutOfRange)?;
        if let Some(old) = slot.as_mut() {
            // Exclusive borrow: nothing else can hold the lock
            let st = old.state.get_mut();
            if st.enabled {
                return Err(InvalidArgument::AlreadyEnabled.into());
            }
            if !st.queue.is_empty() {
                return Err(InvalidArgument::TimersQueued.into());
            }
        }
        *slot = Some(TimerDevice::new(id, regs, config));
        Ok(())
    }

    /// Interrupt controller the registry was built with
    pub fn interrupt_controller(&self) -> &C {
        &self.intc
    }

    /// Clock source the registry was built with
    pub fn clock_source(&self) -> &K {
        &self.clock
    }

    fn device(&self, id: DeviceId) -> Result<&TimerDevice<R>> {
        self.devices
            .get(id.as_usize())
            .ok_or(InvalidArgument::DeviceOutOfRange)?
            .as_ref()
            .ok_or_else(|| InvalidArgument::DeviceMissing.into())
    }
}

impl<R, C, K> TimerRegistry<R, C, K>
where
    R: TimerRegisters,
    C: InterruptController,
    K: ClockSource,
{
    /// Bring up a timer at (approximately) `freq_hz`
    ///
    /// The achieved frequency is the power-of-two division of the source
    /// clock nearest the request; see `frequency` for the value chosen.
    ///
    /// # Arguments
    ///
    /// * `id` - Registry slot of the physical timer
    /// * `freq_hz` - Requested tick frequency
    ///
    /// # Returns
    ///
    /// `InvalidArgument` if `id` names no registered device, the device is
    /// already running, or no prescaler reaches a non-zero frequency near
    /// `freq_hz`.
    pub fn init(&self, id: DeviceId, freq_hz: u32) -> Result<()> {
        let dev = self.device(id)?;
        if without_interrupts(|_cs| dev.state.lock().enabled) {
            return Err(InvalidArgument::AlreadyEnabled.into());
        }
        let config = *dev.config();
        let prescaler = select_prescaler(config.max_freq_hz, freq_hz)?;

        self.clock.ensure_ready();

        let guard = IrqGuard::acquire();
        let mut st = dev.state.lock();
        st.regs.stop();
        st.regs.set_prescaler(prescaler.exponent);
        st.regs.set_width(config.width);
        st.width = config.width;
        st.tally = 0;
        st.freq_hz = prescaler.freq_hz;

        if config.width.is_narrow() {
            // Overflow is observed as a compare match at zero
            st.regs.set_compare(CompareChannel::Overflow, 0);
            st.regs.clear_compare_event(CompareChannel::Overflow);
            st.regs.enable_interrupt(CompareChannel::Overflow);
        }
        st.regs.clear_compare_event(CompareChannel::Interrupt);
        st.regs.clear();
        st.regs.start();

        self.intc.install(config.irq, config.priority, id);
        self.intc.enable(config.irq);
        st.enabled = true;

        // Timers queued while the device was down get armed now
        dev.rearm(&mut st, &self.intc, guard.token());

        log::info!(
            "{}: {} Hz (prescaler 2^{}, {}-bit counter, irq {})",
            id,
            prescaler.freq_hz,
            prescaler.exponent,
            config.width.bits(),
            config.irq.0
        );
        Ok(())
    }

    /// Shut down a physical timer
    ///
    /// Pending software timers stay queued and are not notified; they fire
    /// after the next `init` if their deadline is reached by then.
    pub fn deinit(&self, id: DeviceId) -> Result<()> {
        let dev = self.device(id)?;
        let _guard = IrqGuard::acquire();
        let mut st = dev.state.lock();
        st.regs.disable_interrupt(CompareChannel::Interrupt);
        st.regs.disable_interrupt(CompareChannel::Overflow);
        st.regs.stop();
        st.enabled = false;
        if !st.queue.is_empty() {
            log::warn!("{}: stopped with {} timers pending", id, st.queue.len());
        }
        Ok(())
    }

    /// Attach `timer` to device `id` with a callback and its argument
    ///
    /// A timer that is still pending is stopped first, so it never fires
    /// with a half-replaced callback.
    pub fn set_callback(
        &self,
        id: DeviceId,
        timer: &'static HalTimer,
        callback: TimerCallback,
        arg: usize,
    ) -> Result<()> {
        self.device(id)?;
        let _guard = IrqGuard::acquire();
        self.stop(timer)?;

        let mut slot = timer.slot.lock();
        slot.callback = Some(callback);
        slot.arg = arg;
        slot.device = Some(id);
        slot.linked = false;
        Ok(())
    }

    /// Start `timer` to expire `ticks` from now
    pub fn start(&self, timer: &'static HalTimer, ticks: Ticks) -> Result<()> {
        if ticks == 0 {
            return Err(InvalidArgument::ZeroTicks.into());
        }
        let id = without_interrupts(|_cs| timer.slot.lock().device)
            .ok_or(InvalidArgument::NotAttached)?;
        let now = self.try_read(id)?;
        self.start_at(timer, now.wrapping_add(ticks))
    }

    /// Start `timer` to expire at the absolute tick `tick`
    ///
    /// A tick that has already been reached fires on the next interrupt.
    ///
    /// # Arguments
    ///
    /// * `timer` - Timer attached with `set_callback`
    /// * `tick` - Absolute expiry on the timer's device
    ///
    /// # Returns
    ///
    /// `InvalidArgument` if the timer is already pending, has no callback
    /// or is not attached; `QueueFull` if the device queue has no room.
    pub fn start_at(&self, timer: &'static HalTimer, tick: Ticks) -> Result<()> {
        let guard = IrqGuard::acquire();
        let mut slot = timer.slot.lock();
        if slot.linked {
            return Err(InvalidArgument::TimerPending.into());
        }
        if slot.callback.is_none() {
            return Err(InvalidArgument::NoCallback.into());
        }
        let id = slot.device.ok_or(InvalidArgument::NotAttached)?;
        let dev = self.device(id)?;

        let mut st = dev.state.lock();
        let new_head = st.queue.insert(timer, tick).inspect_err(|err| {
            log::warn!("{}: cannot queue timer for {:#x}: {}", id, tick, err);
        })?;
        slot.expiry = tick;
        slot.linked = true;
        log::debug!("{}: start {:#x} ({} pending)", id, tick, st.queue.len());

        if new_head && st.enabled {
            let outcome = arm_compare(&mut st, &self.intc, dev.config().irq, tick, guard.token());
            log::trace!("{}: new head {:#x}, {:?}", id, tick, outcome);
        }
        Ok(())
    }

    /// Cancel `timer`
    ///
    /// Once this returns the callback will not run for the cancelled
    /// deadline. If the timer was the queue head the compare is re-armed
    /// for the next one, or disarmed when the queue is empty.
    ///
    /// # Arguments
    ///
    /// * `timer` - Any timer, pending or not
    ///
    /// # Returns
    ///
    /// `Ok(())` without effect if the timer is not pending.
    pub fn stop(&self, timer: &HalTimer) -> Result<()> {
        let guard = IrqGuard::acquire();
        let mut slot = timer.slot.lock();
        if !slot.linked {
            return Ok(());
        }
        let id = slot.device.ok_or(InvalidArgument::NotAttached)?;
        let dev = self.device(id)?;

        let mut st = dev.state.lock();
        let was_head = st.queue.is_head(timer);
        if st.queue.remove(timer).is_none() {
            log::warn!("{}: timer marked pending but not queued", id);
        }
        slot.linked = false;
        log::debug!("{}: stop {:#x}", id, slot.expiry);

        if was_head {
            if let Some(head) = st.queue.peek_earliest() {
                let owner = head.timer.device();
                if owner != Some(id) {
                    log::error!("{}: queue head belongs to {:?}", id, owner);
                }
            }
            if st.enabled {
                dev.rearm(&mut st, &self.intc, guard.token());
            }
        }
        Ok(())
    }

    /// Current tick of device `id`
    ///
    /// # Panics
    /// If `id` does not name a registered device. There is no error channel
    /// here; an invalid id is a programming error.
    pub fn read(&self, id: DeviceId) -> Ticks {
        match self.try_read(id) {
            Ok(now) => now,
            Err(err) => panic!("read of {}: {}", id, err),
        }
    }

    /// Current tick of device `id`, reporting a bad id as an error
    pub fn try_read(&self, id: DeviceId) -> Result<Ticks> {
        let dev = self.device(id)?;
        let guard = IrqGuard::acquire();
        let mut st = dev.state.lock();
        Ok(read_ticks(&mut st, &self.intc, dev.config().irq, guard.token()))
    }

    /// Busy-wait for `ticks` ticks of device `id`
    ///
    /// # Panics
    /// Same as `read`.
    pub fn delay(&self, id: DeviceId, ticks: Ticks) {
        let until = self.read(id).wrapping_add(ticks);
        while !tick_reached(self.read(id), until) {
            core::hint::spin_loop();
        }
    }

    /// Tick period of device `id` in nanoseconds
    pub fn get_resolution(&self, id: DeviceId) -> Result<u32> {
        let freq_hz = self.frequency(id)?;
        Ok(1_000_000_000 / freq_hz)
    }

    /// Achieved tick frequency of device `id`
    pub fn frequency(&self, id: DeviceId) -> Result<u32> {
        let dev = self.device(id)?;
        let (enabled, freq_hz) = without_interrupts(|_cs| {
            let st = dev.state.lock();
            (st.enabled, st.freq_hz)
        });
        if !enabled {
            return Err(InvalidArgument::NotEnabled.into());
        }
        Ok(freq_hz)
    }

    /// True once `init` has succeeded and `deinit` has not been called
    pub fn is_enabled(&self, id: DeviceId) -> bool {
        self.device(id)
            .is_ok_and(|dev| without_interrupts(|_cs| dev.state.lock().enabled))
    }

    /// Number of interrupts device `id` has serviced
    pub fn isr_count(&self, id: DeviceId) -> Result<u32> {
        let dev = self.device(id)?;
        Ok(without_interrupts(|_cs| dev.state.lock().isrs))
    }

    /// Expiry of the earliest pending timer on device `id`
    pub fn next_deadline(&self, id: DeviceId) -> Result<Option<Ticks>> {
        let dev = self.device(id)?;
        let _guard = IrqGuard::acquire();
        let st = dev.state.lock();
        Ok(st.queue.peek_earliest().map(|head| head.expiry))
    }

    /// Number of timers pending on device `id`
    pub fn pending(&self, id: DeviceId) -> Result<usize> {
        let dev = self.device(id)?;
        Ok(without_interrupts(|_cs| dev.state.lock().queue.len()))
    }

    /// Interrupt entry point for device `id`
    ///
    /// The platform vector of each timer calls this. Returns the number of
    /// callbacks fired; an unknown id is ignored.
    pub fn on_interrupt(&self, id: DeviceId) -> usize {
        match self.device(id) {
            Ok(dev) => dev.service_interrupt(&self.intc),
            Err(_) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TimerError;
    use crate::sim::{SimClock, SimNvic, SimRegistry, SimTimer};
    use crate::tick::CounterWidth;

    fn noop(_arg: usize) {}

    fn registry() -> (SimRegistry, SimTimer) {
        let hw = SimTimer::new(CounterWidth::Bits32);
        let mut reg = TimerRegistry::new(SimNvic::new(), SimClock::new());
        reg.register(DeviceId(0), hw.clone(), DeviceConfig::NRF51_TIMER0)
            .unwrap();
        (reg, hw)
    }

    #[test]
    fn test_register_out_of_range() {
        let mut reg: SimRegistry = TimerRegistry::new(SimNvic::new(), SimClock::new());
        let hw = SimTimer::new(CounterWidth::Bits32);
        assert_eq!(
            reg.register(DeviceId(3), hw, DeviceConfig::NRF51_TIMER0),
            Err(TimerError::InvalidArgument(InvalidArgument::DeviceOutOfRange))
        );
    }

    #[test]
    fn test_init_programs_hardware() {
        let (reg, hw) = registry();
        reg.init(DeviceId(0), 1_000_000).unwrap();

        assert!(hw.is_running());
        assert_eq!(hw.prescaler(), 4);
        assert_eq!(hw.width(), CounterWidth::Bits32);
        assert_eq!(reg.clock_source().start_requests(), 1);

        let nvic = reg.interrupt_controller();
        let irq = DeviceConfig::NRF51_TIMER0.irq;
        assert!(nvic.is_enabled(irq));
        assert_eq!(nvic.priority(irq), 3);
        assert_eq!(nvic.installed(irq), Some(DeviceId(0)));
        assert!(reg.is_enabled(DeviceId(0)));
    }

    #[test]
    fn test_init_rejects_bad_frequency_without_side_effects() {
        let (reg, hw) = registry();
        assert_eq!(
            reg.init(DeviceId(0), 20_000_000),
            Err(TimerError::InvalidArgument(InvalidArgument::FrequencyTooHigh))
        );
        assert!(!hw.is_running());
        assert!(!reg.is_enabled(DeviceId(0)));
        assert_eq!(reg.clock_source().start_requests(), 0);
    }

    #[test]
    fn test_frequency_requires_init() {
        let (reg, _hw) = registry();
        assert_eq!(
            reg.get_resolution(DeviceId(0)),
            Err(TimerError::InvalidArgument(InvalidArgument::NotEnabled))
        );
        reg.init(DeviceId(0), 100_000).unwrap();
        assert_eq!(reg.frequency(DeviceId(0)), Ok(125_000));
        assert_eq!(reg.get_resolution(DeviceId(0)), Ok(8000));
    }

    #[test]
    fn test_register_over_enabled_device_fails() {
        let (mut reg, _hw) = registry();
        reg.init(DeviceId(0), 1_000_000).unwrap();
        let other = SimTimer::new(CounterWidth::Bits32);
        assert_eq!(
            reg.register(DeviceId(0), other, DeviceConfig::NRF51_TIMER0),
            Err(TimerError::InvalidArgument(InvalidArgument::AlreadyEnabled))
        );
    }

    #[test]
    fn test_register_over_queued_timers_fails() {
        static TIMER: HalTimer = HalTimer::new();
        let (mut reg, _hw) = registry();

        // A device that is down still queues
        reg.set_callback(DeviceId(0), &TIMER, noop, 0).unwrap();
        reg.start_at(&TIMER, 100).unwrap();

        let other = SimTimer::new(CounterWidth::Bits32);
        assert_eq!(
            reg.register(DeviceId(0), other.clone(), DeviceConfig::NRF51_TIMER0),
            Err(TimerError::InvalidArgument(InvalidArgument::TimersQueued))
        );
        assert_eq!(reg.pending(DeviceId(0)), Ok(1));

        reg.stop(&TIMER).unwrap();
        assert_eq!(
            reg.register(DeviceId(0), other, DeviceConfig::NRF51_TIMER0),
            Ok(())
        );
    }

    #[test]
    fn test_slow_source_cannot_init() {
        let mut reg: SimRegistry = TimerRegistry::new(SimNvic::new(), SimClock::new());
        let hw = SimTimer::new(CounterWidth::Bits32);
        let config = DeviceConfig {
            max_freq_hz: 100,
            ..DeviceConfig::NRF51_TIMER0
        };
        reg.register(DeviceId(0), hw.clone(), config).unwrap();

        assert_eq!(
            reg.init(DeviceId(0), 1),
            Err(TimerError::InvalidArgument(InvalidArgument::FrequencyTooLow))
        );
        assert!(!hw.is_running());
        assert_eq!(
            reg.get_resolution(DeviceId(0)),
            Err(TimerError::InvalidArgument(InvalidArgument::NotEnabled))
        );
    }

    #[test]
    fn test_queries_wait_for_masked_section() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::mpsc;
        use std::time::Duration;

        let (reg, _hw) = registry();
        reg.init(DeviceId(0), 1_000_000).unwrap();

        let queries: [&dyn Fn(); 4] = [
            &|| assert_eq!(reg.pending(DeviceId(0)), Ok(0)),
            &|| assert_eq!(reg.isr_count(DeviceId(0)), Ok(0)),
            &|| assert_eq!(reg.frequency(DeviceId(0)), Ok(1_000_000)),
            &|| assert!(reg.is_enabled(DeviceId(0))),
        ];

        for query in queries {
            let released = Arc::new(AtomicBool::new(false));
            let (masked_tx, masked_rx) = mpsc::channel();
            let holder = {
                let released = Arc::clone(&released);
                std::thread::spawn(move || {
                    let _guard = IrqGuard::acquire();
                    masked_tx.send(()).unwrap();
                    std::thread::sleep(Duration::from_millis(50));
                    released.store(true, Ordering::SeqCst);
                })
            };

            masked_rx.recv().unwrap();
            query();
            assert!(released.load(Ordering::SeqCst));
            holder.join().unwrap();
        }
    }

    #[test]
    fn test_set_callback_restarts_pending_timer() {
        static TIMER: HalTimer = HalTimer::new();
        let (reg, _hw) = registry();
        reg.init(DeviceId(0), 1_000_000).unwrap();

        reg.set_callback(DeviceId(0), &TIMER, noop, 1).unwrap();
        reg.start(&TIMER, 10).unwrap();
        assert_eq!(reg.pending(DeviceId(0)), Ok(1));

        reg.set_callback(DeviceId(0), &TIMER, noop, 2).unwrap();
        assert!(!TIMER.is_pending());
        assert_eq!(reg.pending(DeviceId(0)), Ok(0));
        assert_eq!(reg.next_deadline(DeviceId(0)), Ok(None));
    }
}
