/*
 * Hardware Abstraction
 *
 * This module contains the register model of the timer peripheral and the
 * two external collaborators the scheduler depends on: the interrupt
 * controller and the clock source. The scheduling logic only ever talks to
 * hardware through these traits.
 */

#[cfg(feature = "nrf51")]
pub mod io;
pub mod irq;
pub mod regs;

pub use irq::{ClockSource, InterruptController, IrqSource};
pub use regs::{CompareChannel, IntEnFlags, TimerRegisters};
