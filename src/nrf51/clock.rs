/*
 * nRF51 High-Frequency Clock
 *
 * The timers are fed from HFCLK. Until the external crystal is running the
 * internal RC oscillator drives it, which is too inaccurate for timing, so
 * `init` starts the crystal and waits for it here.
 */

use crate::hw::ClockSource;
use crate::hw::io::{Io, Mmio};

const CLOCK_BASE: usize = 0x4000_0000;
const TASKS_HFCLKSTART: usize = 0x000;
const EVENTS_HFCLKSTARTED: usize = 0x100;
const HFCLKSTAT: usize = 0x40C;

/// HFCLKSTAT.STATE: clock running
const HFCLKSTAT_STATE: u32 = 1 << 16;

/// HFCLK crystal oscillator
#[derive(Debug, Default)]
pub struct HfClock;

impl HfClock {
    fn reg(offset: usize) -> Mmio<u32> {
        // SAFETY: CLOCK is a fixed peripheral block on every nRF51
        unsafe { Mmio::new(CLOCK_BASE + offset) }
    }
}

impl ClockSource for HfClock {
    fn ensure_ready(&self) {
        if Self::reg(HFCLKSTAT).readf(HFCLKSTAT_STATE) {
            return;
        }
        Self::reg(EVENTS_HFCLKSTARTED).write(0);
        Self::reg(TASKS_HFCLKSTART).write(1);
        while Self::reg(EVENTS_HFCLKSTARTED).read() == 0 {
            core::hint::spin_loop();
        }
        log::info!("HFCLK crystal started");
    }
}
