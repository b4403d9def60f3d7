/*
 * Build-Time Timer Configuration
 *
 * Integers the platform supplies when it builds the device registry: how
 * many physical timers exist, which interrupt line and priority each one
 * uses, how wide its counter is and how fast its source clock runs.
 *
 * The presets below describe the nRF51: TIMER0 is a 32-bit counter, TIMER1
 * and TIMER2 are 16-bit counters that get extended in software. All three
 * are fed from the 16 MHz high-frequency clock.
 */

use crate::hw::IrqSource;
use crate::tick::CounterWidth;

/// Maximum number of physical timers the registry can hold
pub const MAX_HAL_TIMERS: usize = 3;

/// Source frequency of the timer peripherals (Hz)
pub const MAX_TIMER_FREQ: u32 = 16_000_000;

/// Largest prescaler exponent (divider 2^9 = 512)
pub const MAX_PRESCALER_EXP: u8 = 9;

/// Pending software timers per device
pub const TIMER_QUEUE_DEPTH: usize = 16;

/// Interrupt priority bits implemented by the NVIC (Cortex-M0)
pub const NVIC_PRIO_BITS: u8 = 2;

/// Default timer interrupt priority (lowest urgency)
pub const DEFAULT_TIMER_PRIORITY: u8 = (1 << NVIC_PRIO_BITS) - 1;

/// Static description of one physical timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Interrupt line of the peripheral
    pub irq: IrqSource,
    /// Interrupt priority installed by `init`
    pub priority: u8,
    /// Hardware counter width
    pub width: CounterWidth,
    /// Undivided source frequency (Hz)
    pub max_freq_hz: u32,
}

impl DeviceConfig {
    /// nRF51 TIMER0: IRQ 8, 32-bit
    pub const NRF51_TIMER0: DeviceConfig = DeviceConfig {
        irq: IrqSource(8),
        priority: DEFAULT_TIMER_PRIORITY,
        width: CounterWidth::Bits32,
        max_freq_hz: MAX_TIMER_FREQ,
    };

    /// nRF51 TIMER1: IRQ 9, 16-bit
    pub const NRF51_TIMER1: DeviceConfig = DeviceConfig {
        irq: IrqSource(9),
        priority: DEFAULT_TIMER_PRIORITY,
        width: CounterWidth::Bits16,
        max_freq_hz: MAX_TIMER_FREQ,
    };

    /// nRF51 TIMER2: IRQ 10, 16-bit
    pub const NRF51_TIMER2: DeviceConfig = DeviceConfig {
        irq: IrqSource(10),
        priority: DEFAULT_TIMER_PRIORITY,
        width: CounterWidth::Bits16,
        max_freq_hz: MAX_TIMER_FREQ,
    };

    /// Same device at a different interrupt priority
    pub const fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }
}
