/*
 * Timer Register Model
 *
 * Typed view over a timer peripheral with a free-running counter, capture
 * tasks and compare channels. Implementations perform the raw register
 * access and nothing else; every bit of policy lives above this trait.
 *
 * Channel usage:
 * - channel 1 raises an event when a narrow counter wraps to zero
 * - channel 2 is used to capture the running counter for reads
 * - channel 3 carries the scheduling compare interrupt
 */

use bitflags::bitflags;

use crate::tick::CounterWidth;

/// Compare/capture channels reserved by the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CompareChannel {
    /// Compare at zero, counts narrow-counter overflows
    Overflow = 1,
    /// Capture target used to read the counter
    Read = 2,
    /// Scheduling compare interrupt
    Interrupt = 3,
}

impl CompareChannel {
    /// Channel index into CC/EVENTS arrays
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Interrupt enable bit for this channel's compare event
    pub const fn int_mask(self) -> IntEnFlags {
        match self {
            CompareChannel::Overflow => IntEnFlags::COMPARE1,
            CompareChannel::Read => IntEnFlags::COMPARE2,
            CompareChannel::Interrupt => IntEnFlags::COMPARE3,
        }
    }
}

bitflags! {
    /// Interrupt enable flags (INTENSET/INTENCLR layout)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IntEnFlags: u32 {
        const COMPARE0 = 1 << 16;
        const COMPARE1 = 1 << 17;
        const COMPARE2 = 1 << 18;
        const COMPARE3 = 1 << 19;
    }
}

/// Register-level operations of one timer peripheral
pub trait TimerRegisters {
    /// Force a capture of the counter into `channel` and return it
    fn capture(&mut self, channel: CompareChannel) -> u32;

    /// Read a compare register
    fn compare(&self, channel: CompareChannel) -> u32;

    /// Write a compare register
    fn set_compare(&mut self, channel: CompareChannel, value: u32);

    /// Check whether the compare event of `channel` is latched
    fn compare_event(&self, channel: CompareChannel) -> bool;

    /// Clear the compare event of `channel`
    fn clear_compare_event(&mut self, channel: CompareChannel);

    /// Enable the compare interrupt of `channel`
    fn enable_interrupt(&mut self, channel: CompareChannel);

    /// Disable the compare interrupt of `channel`
    fn disable_interrupt(&mut self, channel: CompareChannel);

    /// Check whether the compare interrupt of `channel` is enabled
    fn interrupt_enabled(&self, channel: CompareChannel) -> bool;

    /// Start the free-running counter
    fn start(&mut self);

    /// Stop the counter
    fn stop(&mut self);

    /// Reset the counter to zero
    fn clear(&mut self);

    /// Select the counter width
    fn set_width(&mut self, width: CounterWidth);

    /// Set the prescaler exponent (counter runs at `f_max / 2^exponent`)
    fn set_prescaler(&mut self, exponent: u8);
}
