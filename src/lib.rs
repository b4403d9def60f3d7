/*
 * HAL Timer Crate Root
 *
 * This crate provides a deadline-ordered software timer scheduler layered on
 * top of a single free-running hardware counter/compare peripheral. Any number
 * of client-owned software timers can be pending on one hardware timer; the
 * scheduler keeps the single compare channel armed for the earliest deadline
 * and dispatches expired timers from the timer interrupt.
 *
 * Why this is important:
 * - Gives the runtime one-shot deadlines with tick resolution without
 *   spending a hardware compare channel per client
 * - Extends narrow (8/16/24-bit) hardware counters into a 32-bit monotonic
 *   tick by folding in overflow events
 * - Handles the "deadline already passed while arming" race by forcing the
 *   timer interrupt pending
 * - Keeps every queue and register mutation atomic with respect to the timer
 *   interrupt through scoped critical sections
 *
 * Layout (leaves first):
 * - `hw`       - register model and external collaborator traits
 * - `tick`     - wraparound-aware tick arithmetic and counter widths
 * - `counter`  - extended counter reader
 * - `queue`    - per-device deadline queue
 * - `arm`      - compare arming policy
 * - `freq`     - prescaler selection
 * - `device`   - per-device state and interrupt service routine
 * - `registry` - the public scheduling API
 * - `logger`   - buffered `log` backend for targets without a console
 * - `sim`      - simulated board for host tests (feature `mock`)
 * - `nrf51`    - memory-mapped backend and vector stubs (feature `nrf51`)
 */

#![cfg_attr(not(test), no_std)]

#[cfg(any(test, feature = "mock"))]
extern crate alloc;

pub mod arm;
pub mod config;
pub mod counter;
pub mod critical;
pub mod device;
pub mod error;
pub mod freq;
pub mod hw;
pub mod logger;
pub mod queue;
pub mod registry;
pub mod tick;
pub mod timer;

#[cfg(any(test, feature = "mock"))]
pub mod sim;

#[cfg(feature = "nrf51")]
pub mod nrf51;

#[cfg(test)]
mod tests;

pub use config::{DeviceConfig, MAX_HAL_TIMERS, MAX_TIMER_FREQ, TIMER_QUEUE_DEPTH};
pub use device::DeviceId;
pub use error::{InvalidArgument, Result, TimerError};
pub use hw::{ClockSource, CompareChannel, InterruptController, IrqSource, TimerRegisters};
pub use registry::TimerRegistry;
pub use tick::{CounterWidth, Ticks};
pub use timer::{HalTimer, TimerCallback};
