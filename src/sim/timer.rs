//! Simulated timer peripheral
//!
//! Models the parts of an nRF-style TIMER the scheduler relies on: a
//! free-running counter of configurable width, four compare/capture
//! registers with latched compare events, and per-channel interrupt enables.
//! Time only moves when a test calls [`SimTimer::advance`] (or, with
//! auto-advance, on every capture).

use alloc::sync::Arc;

use spin::Mutex;

use crate::hw::{CompareChannel, IntEnFlags, TimerRegisters};
use crate::tick::CounterWidth;

const CHANNELS: usize = 4;

#[derive(Debug)]
struct SimState {
    counter: u32,
    width: CounterWidth,
    prescaler: u8,
    cc: [u32; CHANNELS],
    events: [bool; CHANNELS],
    inten: IntEnFlags,
    running: bool,
    auto_advance: u32,
}

impl SimState {
    /// Move the counter forward, latching every compare passed on the way
    fn step(&mut self, ticks: u32) {
        if !self.running || ticks == 0 {
            return;
        }
        let mask = self.width.counter_mask();
        for ch in 0..CHANNELS {
            let distance = self.cc[ch].wrapping_sub(self.counter) & mask;
            let hit = if distance == 0 {
                // Sitting on the compare: next hit is a full lap away
                self.width.is_narrow() && ticks >= self.width.epoch_span()
            } else {
                ticks >= distance
            };
            if hit {
                self.events[ch] = true;
            }
        }
        self.counter = self.counter.wrapping_add(ticks) & mask;
    }
}

/// Handle to a simulated timer; clones share the same peripheral
#[derive(Debug, Clone)]
pub struct SimTimer {
    inner: Arc<Mutex<SimState>>,
}

impl SimTimer {
    /// Create a stopped timer of the given width
    pub fn new(width: CounterWidth) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SimState {
                counter: 0,
                width,
                prescaler: 0,
                cc: [0; CHANNELS],
                events: [false; CHANNELS],
                inten: IntEnFlags::empty(),
                running: false,
                auto_advance: 0,
            })),
        }
    }

    /// Advance the counter by `ticks` (no-op while stopped)
    pub fn advance(&self, ticks: u32) {
        self.inner.lock().step(ticks);
    }

    /// Advance the counter by `ticks` on every capture
    pub fn set_auto_advance(&self, ticks: u32) {
        self.inner.lock().auto_advance = ticks;
    }

    /// Preset the counter without latching any event
    pub fn set_counter(&self, value: u32) {
        let mut st = self.inner.lock();
        st.counter = value & st.width.counter_mask();
    }

    /// Start counting without going through the register model
    pub fn start_running(&self) {
        self.inner.lock().running = true;
    }

    /// Current raw counter value
    pub fn counter(&self) -> u32 {
        self.inner.lock().counter
    }

    /// True if the counter is running
    pub fn is_running(&self) -> bool {
        self.inner.lock().running
    }

    /// Last prescaler exponent written
    pub fn prescaler(&self) -> u8 {
        self.inner.lock().prescaler
    }

    /// Currently programmed width
    pub fn width(&self) -> CounterWidth {
        self.inner.lock().width
    }

    /// Read a compare register
    pub fn compare(&self, channel: CompareChannel) -> u32 {
        self.inner.lock().cc[channel.index()]
    }

    /// Check a latched compare event
    pub fn compare_event(&self, channel: CompareChannel) -> bool {
        self.inner.lock().events[channel.index()]
    }

    /// Check a compare interrupt enable
    pub fn interrupt_enabled(&self, channel: CompareChannel) -> bool {
        self.inner.lock().inten.contains(channel.int_mask())
    }

    /// True if an enabled compare event is latched (the IRQ line is high)
    pub fn irq_asserted(&self) -> bool {
        let st = self.inner.lock();
        [CompareChannel::Overflow, CompareChannel::Read, CompareChannel::Interrupt]
            .iter()
            .any(|&ch| st.events[ch.index()] && st.inten.contains(ch.int_mask()))
    }
}

impl TimerRegisters for SimTimer {
    fn capture(&mut self, channel: CompareChannel) -> u32 {
        let mut st = self.inner.lock();
        let step = st.auto_advance;
        st.step(step);
        let counter = st.counter;
        st.cc[channel.index()] = counter;
        counter
    }

    fn compare(&self, channel: CompareChannel) -> u32 {
        SimTimer::compare(self, channel)
    }

    fn set_compare(&mut self, channel: CompareChannel, value: u32) {
        let mut st = self.inner.lock();
        st.cc[channel.index()] = value & st.width.counter_mask();
    }

    fn compare_event(&self, channel: CompareChannel) -> bool {
        SimTimer::compare_event(self, channel)
    }

    fn clear_compare_event(&mut self, channel: CompareChannel) {
        self.inner.lock().events[channel.index()] = false;
    }

    fn enable_interrupt(&mut self, channel: CompareChannel) {
        self.inner.lock().inten.insert(channel.int_mask());
    }

    fn disable_interrupt(&mut self, channel: CompareChannel) {
        self.inner.lock().inten.remove(channel.int_mask());
    }

    fn interrupt_enabled(&self, channel: CompareChannel) -> bool {
        SimTimer::interrupt_enabled(self, channel)
    }

    fn start(&mut self) {
        self.inner.lock().running = true;
    }

    fn stop(&mut self) {
        self.inner.lock().running = false;
    }

    fn clear(&mut self) {
        self.inner.lock().counter = 0;
    }

    fn set_width(&mut self, width: CounterWidth) {
        let mut st = self.inner.lock();
        st.width = width;
        st.counter &= width.counter_mask();
    }

    fn set_prescaler(&mut self, exponent: u8) {
        self.inner.lock().prescaler = exponent;
    }
}
