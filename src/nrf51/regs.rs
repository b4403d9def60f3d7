/*
 * nRF51 TIMER Register Block
 *
 * Direct register access for the TIMER0..2 peripherals. Each operation of
 * `TimerRegisters` maps onto one or two register accesses; nothing here
 * keeps state beyond the base address.
 */

use crate::hw::io::{Io, Mmio};
use crate::hw::{CompareChannel, TimerRegisters};
use crate::tick::CounterWidth;

const TASKS_START: usize = 0x000;
const TASKS_STOP: usize = 0x004;
const TASKS_CLEAR: usize = 0x00C;
const TASKS_CAPTURE: usize = 0x040;
const EVENTS_COMPARE: usize = 0x140;
const INTENSET: usize = 0x304;
const INTENCLR: usize = 0x308;
const MODE: usize = 0x504;
const BITMODE: usize = 0x508;
const PRESCALER: usize = 0x510;
const CC: usize = 0x540;

/// MODE value selecting timer (not counter) operation
const MODE_TIMER: u32 = 0;

/// BITMODE encoding of a counter width
pub const fn bitmode(width: CounterWidth) -> u32 {
    match width {
        CounterWidth::Bits16 => 0,
        CounterWidth::Bits8 => 1,
        CounterWidth::Bits24 => 2,
        CounterWidth::Bits32 => 3,
    }
}

/// One TIMER peripheral
pub struct Nrf51TimerRegs {
    base: usize,
}

impl Nrf51TimerRegs {
    /// # Safety
    ///
    /// `base` must be the base address of a TIMER peripheral, and no other
    /// handle to the same peripheral may be used concurrently.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    #[inline(always)]
    fn reg(&self, offset: usize) -> Mmio<u32> {
        // SAFETY: offsets are within the peripheral block `new` vouched for
        unsafe { Mmio::new(self.base + offset) }
    }

    #[inline(always)]
    fn channel(offset: usize, channel: CompareChannel) -> usize {
        offset + 4 * channel.index()
    }
}

impl TimerRegisters for Nrf51TimerRegs {
    fn capture(&mut self, channel: CompareChannel) -> u32 {
        self.reg(Self::channel(TASKS_CAPTURE, channel)).write(1);
        self.reg(Self::channel(CC, channel)).read()
    }

    fn compare(&self, channel: CompareChannel) -> u32 {
        self.reg(Self::channel(CC, channel)).read()
    }

    fn set_compare(&mut self, channel: CompareChannel, value: u32) {
        self.reg(Self::channel(CC, channel)).write(value);
    }

    fn compare_event(&self, channel: CompareChannel) -> bool {
        self.reg(Self::channel(EVENTS_COMPARE, channel)).read() != 0
    }

    fn clear_compare_event(&mut self, channel: CompareChannel) {
        self.reg(Self::channel(EVENTS_COMPARE, channel)).write(0);
    }

    fn enable_interrupt(&mut self, channel: CompareChannel) {
        self.reg(INTENSET).write(channel.int_mask().bits());
    }

    fn disable_interrupt(&mut self, channel: CompareChannel) {
        self.reg(INTENCLR).write(channel.int_mask().bits());
    }

    fn interrupt_enabled(&self, channel: CompareChannel) -> bool {
        self.reg(INTENSET).readf(channel.int_mask().bits())
    }

    fn start(&mut self) {
        self.reg(TASKS_START).write(1);
    }

    fn stop(&mut self) {
        self.reg(TASKS_STOP).write(1);
    }

    fn clear(&mut self) {
        self.reg(TASKS_CLEAR).write(1);
    }

    fn set_width(&mut self, width: CounterWidth) {
        self.reg(MODE).write(MODE_TIMER);
        self.reg(BITMODE).write(bitmode(width));
    }

    fn set_prescaler(&mut self, exponent: u8) {
        self.reg(PRESCALER).write(exponent as u32);
    }
}
