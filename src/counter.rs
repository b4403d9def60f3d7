/*
 * Counter Reader
 *
 * Produces the current logical tick of a device as one 32-bit value.
 *
 * A wide (32-bit) counter is simply captured and read. A narrow counter
 * only supplies the low bits; the high bits come from the overflow tally
 * the interrupt handler maintains. Because an overflow can happen between
 * reading the tally and capturing the counter, the reader checks the
 * overflow event itself and, if it is latched, folds the overflow in on
 * the spot:
 *
 *   1. tally += one epoch
 *   2. re-capture the low bits
 *   3. clear the overflow event
 *   4. force the timer interrupt pending
 *
 * Step 4 makes the handler run and re-evaluate the queue head for the new
 * epoch, while step 3 guarantees it does not count the same overflow a
 * second time. The handler performs the identical increment-then-clear
 * sequence, and both run with interrupts masked, so the tally advances
 * exactly once per overflow.
 */

use critical_section::CriticalSection;

use crate::hw::{CompareChannel, InterruptController, IrqSource, TimerRegisters};
use crate::device::DeviceState;
use crate::tick::Ticks;

/// Read the extended counter of a device
///
/// The returned value never decreases between calls, including across a
/// hardware overflow.
pub fn read_ticks<R, C>(
    state: &mut DeviceState<R>,
    intc: &C,
    irq: IrqSource,
    _cs: CriticalSection<'_>,
) -> Ticks
where
    R: TimerRegisters,
    C: InterruptController,
{
    let width = state.width;
    if !width.is_narrow() {
        return state.regs.capture(CompareChannel::Read);
    }

    let mask = width.counter_mask();
    let mut tally = state.tally;
    let mut low = state.regs.capture(CompareChannel::Read) & mask;

    if state.regs.compare_event(CompareChannel::Overflow) {
        tally = tally.wrapping_add(width.epoch_span());
        state.tally = tally;
        low = state.regs.capture(CompareChannel::Read) & mask;
        state.regs.clear_compare_event(CompareChannel::Overflow);
        intc.set_pending(irq);
    }

    tally | low
}

/// Fold a latched overflow event into the tally from the interrupt handler
///
/// Returns true if an overflow was consumed.
pub fn consume_overflow<R: TimerRegisters>(state: &mut DeviceState<R>, _cs: CriticalSection<'_>) -> bool {
    if !state.width.is_narrow() || !state.regs.compare_event(CompareChannel::Overflow) {
        return false;
    }
    state.regs.clear_compare_event(CompareChannel::Overflow);
    state.tally = state.tally.wrapping_add(state.width.epoch_span());
    true
}
