/*
 * External Collaborators
 *
 * The interrupt controller and clock source are owned by the platform. The
 * scheduler needs exactly three things from the interrupt controller: a way
 * to install the per-device handler with a priority, a way to enable the
 * line, and a way to force the line pending when a compare was armed too
 * late to fire on its own.
 */

use crate::device::DeviceId;

/// Interrupt line number of a timer peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IrqSource(pub u8);

impl IrqSource {
    /// Get the line number as a usize for indexing
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// Platform interrupt controller
///
/// Methods take `&self`; implementations are expected to be usable from both
/// foreground and interrupt context.
pub trait InterruptController {
    /// Route `source` to the handler of `device` at `priority`
    ///
    /// The platform vector for `source` must end up calling
    /// `TimerRegistry::on_interrupt(device)`.
    fn install(&self, source: IrqSource, priority: u8, device: DeviceId);

    /// Unmask `source`
    fn enable(&self, source: IrqSource);

    /// Mark `source` pending without a hardware event
    fn set_pending(&self, source: IrqSource);
}

/// Clock feeding the timer peripherals
pub trait ClockSource {
    /// Block until the oscillator is stable
    fn ensure_ready(&self);
}
