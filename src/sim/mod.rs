/*
 * Simulated Board
 *
 * Host-side stand-ins for the nRF51 timer peripherals, interrupt controller
 * and clock, so the scheduler can be driven tick by tick from ordinary
 * `#[test]` functions or from a downstream crate's tests (feature `mock`).
 *
 * Why this is important:
 * - The arming races only show up when the counter moves between register
 *   accesses; the simulated counter can be moved at exactly those points
 * - Interrupt delivery is explicit: a test decides when the handler runs,
 *   so "fires no earlier than its deadline" can be checked on every tick
 */

mod nvic;
mod timer;

pub use nvic::{SimClock, SimNvic};
pub use timer::SimTimer;

use crate::config::{DeviceConfig, MAX_HAL_TIMERS};
use crate::device::DeviceId;
use crate::registry::TimerRegistry;
use crate::tick::Ticks;

/// Registry over simulated hardware
pub type SimRegistry = TimerRegistry<SimTimer, SimNvic, SimClock>;

/// Upper bound on back-to-back handler runs in one `service` call
const MAX_SERVICE_PASSES: usize = 64;

/// Three simulated timers laid out like an nRF51
///
/// Device 0 is 32-bit, devices 1 and 2 are 16-bit.
pub struct SimBoard {
    pub registry: SimRegistry,
    pub nvic: SimNvic,
    pub clock: SimClock,
    timers: [SimTimer; MAX_HAL_TIMERS],
    configs: [DeviceConfig; MAX_HAL_TIMERS],
}

impl SimBoard {
    pub fn new() -> Self {
        Self::with_layout([
            DeviceConfig::NRF51_TIMER0,
            DeviceConfig::NRF51_TIMER1,
            DeviceConfig::NRF51_TIMER2,
        ])
    }

    /// Board with one simulated timer per entry of `configs`
    pub fn with_layout(configs: [DeviceConfig; MAX_HAL_TIMERS]) -> Self {
        let nvic = SimNvic::new();
        let clock = SimClock::new();
        let timers = configs.map(|config| SimTimer::new(config.width));

        let mut registry = TimerRegistry::new(nvic.clone(), clock.clone());
        for (index, (hw, config)) in timers.iter().zip(configs).enumerate() {
            // Ids are in range and nothing is enabled yet
            let _ = registry.register(DeviceId(index as u8), hw.clone(), config);
        }

        Self {
            registry,
            nvic,
            clock,
            timers,
            configs,
        }
    }

    /// Simulated peripheral behind device `id`
    pub fn hw(&self, id: DeviceId) -> &SimTimer {
        &self.timers[id.as_usize()]
    }

    /// Run the handler of device `id` for as long as its line is active
    ///
    /// Returns the number of callbacks fired.
    pub fn service(&self, id: DeviceId) -> usize {
        let irq = self.configs[id.as_usize()].irq;
        let hw = self.hw(id);
        let mut fired = 0;
        for _ in 0..MAX_SERVICE_PASSES {
            if !self.nvic.is_enabled(irq) {
                break;
            }
            let forced = self.nvic.take_pending(irq);
            if !forced && !hw.irq_asserted() {
                break;
            }
            fired += self.registry.on_interrupt(id);
        }
        fired
    }

    /// Advance device `id` one tick at a time, taking interrupts as they come
    pub fn step(&self, id: DeviceId, ticks: Ticks) -> usize {
        let hw = self.hw(id);
        let mut fired = self.service(id);
        for _ in 0..ticks {
            hw.advance(1);
            fired += self.service(id);
        }
        fired
    }

    /// Advance device `id` in one jump, then take interrupts
    ///
    /// Models a long stretch with interrupts masked.
    pub fn jump(&self, id: DeviceId, ticks: Ticks) -> usize {
        self.hw(id).advance(ticks);
        self.service(id)
    }
}

impl Default for SimBoard {
    fn default() -> Self {
        Self::new()
    }
}
