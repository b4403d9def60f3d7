/*
 * Cortex-M0 NVIC
 *
 * Enables, prioritizes and force-pends the timer interrupt lines, and keeps
 * the line-to-device routing the vector stubs dispatch through.
 *
 * The M0 only supports word access to the priority registers, so a
 * priority update is a read-modify-write of the word holding four lines.
 */

use spin::Mutex;

use crate::config::NVIC_PRIO_BITS;
use crate::device::DeviceId;
use crate::hw::io::{Io, Mmio};
use crate::hw::{InterruptController, IrqSource};

const NVIC_ISER: usize = 0xE000_E100;
const NVIC_ISPR: usize = 0xE000_E200;
const NVIC_IPR: usize = 0xE000_E400;

/// External interrupt lines on the nRF51
const IRQ_LINES: usize = 32;

static ROUTES: Mutex<[Option<DeviceId>; IRQ_LINES]> = Mutex::new([None; IRQ_LINES]);

/// Cortex-M0 interrupt controller
#[derive(Debug, Default)]
pub struct Nvic;

impl Nvic {
    fn reg(addr: usize) -> Mmio<u32> {
        // SAFETY: system control space, present on every Cortex-M0
        unsafe { Mmio::new(addr) }
    }

    /// Device whose handler owns `source`
    pub fn route(&self, source: IrqSource) -> Option<DeviceId> {
        ROUTES.lock().get(source.as_usize()).copied().flatten()
    }
}

impl InterruptController for Nvic {
    fn install(&self, source: IrqSource, priority: u8, device: DeviceId) {
        let line = source.as_usize();
        if let Some(route) = ROUTES.lock().get_mut(line) {
            *route = Some(device);
        }

        let shift = 8 * (line % 4);
        let value = ((priority as u32) << (8 - NVIC_PRIO_BITS)) & 0xFF;
        let mut ipr = Self::reg(NVIC_IPR + 4 * (line / 4));
        let word = ipr.read();
        ipr.write((word & !(0xFF << shift)) | (value << shift));
    }

    fn enable(&self, source: IrqSource) {
        Self::reg(NVIC_ISER).write(1 << source.0);
    }

    fn set_pending(&self, source: IrqSource) {
        Self::reg(NVIC_ISPR).write(1 << source.0);
    }
}
