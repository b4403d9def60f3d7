/*
 * Compare Arming Policy
 *
 * Decides what to program into the single scheduling compare channel so
 * the timer interrupt fires at, or immediately after, the earliest pending
 * deadline.
 *
 * A compare register only fires when the counter passes through the
 * programmed value. Programming a value the counter has already passed
 * silently does nothing, so after arming the counter is read back and, if
 * the deadline has been reached, the interrupt is forced pending at the
 * interrupt controller. The hardware offers no "already past" compare, so
 * this force-pend is the only way a late deadline still gets serviced.
 *
 * Narrow counters add a second case: the compare register only holds the
 * low bits, so a deadline in a later epoch cannot be programmed yet. Such a
 * deadline is deferred with the compare interrupt disabled; the overflow
 * interrupt that opens its epoch re-evaluates the queue head and arms it
 * then.
 */

use critical_section::CriticalSection;

use crate::counter::read_ticks;
use crate::device::DeviceState;
use crate::hw::{CompareChannel, InterruptController, IrqSource, TimerRegisters};
use crate::tick::{Ticks, tick_reached};

/// What the arming policy did with a deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmOutcome {
    /// Compare programmed; the hardware will raise the interrupt
    Armed,
    /// Deadline already reached; interrupt forced pending
    Late,
    /// Deadline lies in a future epoch of a narrow counter
    Deferred,
}

/// Arm the scheduling compare for `expiry`
///
/// Must be called with interrupts masked and the device lock held.
pub fn arm_compare<R, C>(
    state: &mut DeviceState<R>,
    intc: &C,
    irq: IrqSource,
    expiry: Ticks,
    cs: CriticalSection<'_>,
) -> ArmOutcome
where
    R: TimerRegisters,
    C: InterruptController,
{
    state.regs.disable_interrupt(CompareChannel::Interrupt);

    let width = state.width;
    let compare = if width.is_narrow() {
        let epoch = expiry & width.epoch_mask();
        let delta = epoch.wrapping_sub(state.tally) as i32;
        if delta > 0 {
            log::trace!("arm {:#x}: epoch {:#x} not reached, deferring", expiry, epoch);
            return ArmOutcome::Deferred;
        }
        if delta < 0 {
            intc.set_pending(irq);
            log::trace!("arm {:#x}: epoch already passed, forcing interrupt", expiry);
            return ArmOutcome::Late;
        }
        expiry & width.counter_mask()
    } else {
        expiry
    };

    state.regs.set_compare(CompareChannel::Interrupt, compare);
    state.regs.clear_compare_event(CompareChannel::Interrupt);
    state.regs.enable_interrupt(CompareChannel::Interrupt);

    // The counter may have passed the compare while we were writing it
    let now = read_ticks(state, intc, irq, cs);
    if tick_reached(now, expiry) {
        intc.set_pending(irq);
        log::trace!("arm {:#x}: missed at {:#x}, forcing interrupt", expiry, now);
        ArmOutcome::Late
    } else {
        ArmOutcome::Armed
    }
}

/// Stop compare interrupts; the counter keeps running
pub fn disarm_compare<R: TimerRegisters>(state: &mut DeviceState<R>) {
    state.regs.disable_interrupt(CompareChannel::Interrupt);
}
