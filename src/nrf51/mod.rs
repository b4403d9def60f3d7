/*
 * nRF51 Board Support
 *
 * Wires the scheduler to the real peripherals: three TIMER blocks, the
 * HFCLK crystal and the NVIC. The registry lives in a lazily built static
 * so the vector stubs below can reach it.
 *
 * Why this is important:
 * - The interrupt vectors are plain `extern "C"` functions with no
 *   arguments; they need a global to find their device
 * - Everything else in the crate stays free of fixed addresses
 *
 * `BOARD` must be touched (for example by `init`) before any timer
 * interrupt is enabled, so the first access never happens in a handler.
 */

pub mod clock;
pub mod nvic;
pub mod regs;

use lazy_static::lazy_static;

use crate::config::DeviceConfig;
use crate::device::DeviceId;
use crate::hw::IrqSource;
use crate::registry::TimerRegistry;

pub use clock::HfClock;
pub use nvic::Nvic;
pub use regs::Nrf51TimerRegs;

pub const TIMER0_BASE: usize = 0x4000_8000;
pub const TIMER1_BASE: usize = 0x4000_9000;
pub const TIMER2_BASE: usize = 0x4000_A000;

/// Registry over the nRF51 peripherals
pub type Nrf51Registry = TimerRegistry<Nrf51TimerRegs, Nvic, HfClock>;

lazy_static! {
    /// The board's timer registry
    pub static ref BOARD: Nrf51Registry = build_registry();
}

fn build_registry() -> Nrf51Registry {
    let mut registry = TimerRegistry::new(Nvic, HfClock);
    let layout = [
        (TIMER0_BASE, DeviceConfig::NRF51_TIMER0),
        (TIMER1_BASE, DeviceConfig::NRF51_TIMER1),
        (TIMER2_BASE, DeviceConfig::NRF51_TIMER2),
    ];
    for (index, (base, config)) in layout.into_iter().enumerate() {
        // SAFETY: fixed TIMER addresses; the registry is the only user
        let regs = unsafe { Nrf51TimerRegs::new(base) };
        if let Err(err) = registry.register(DeviceId(index as u8), regs, config) {
            log::error!("timer{}: {}", index, err);
        }
    }
    registry
}

/// Route an interrupt line to the device installed on it
pub fn dispatch(source: IrqSource) {
    match Nvic.route(source) {
        Some(id) => {
            BOARD.on_interrupt(id);
        }
        None => log::warn!("irq {}: no timer installed", source.0),
    }
}

#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub extern "C" fn TIMER0_IRQHandler() {
    dispatch(DeviceConfig::NRF51_TIMER0.irq);
}

#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub extern "C" fn TIMER1_IRQHandler() {
    dispatch(DeviceConfig::NRF51_TIMER1.irq);
}

#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub extern "C" fn TIMER2_IRQHandler() {
    dispatch(DeviceConfig::NRF51_TIMER2.irq);
}
