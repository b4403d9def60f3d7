/*
 * Critical Sections
 *
 * Every queue and register mutation in this crate must be atomic with
 * respect to the timer interrupt. On a single-core MCU that means masking
 * interrupts globally for the duration of the mutation.
 *
 * The masking itself is delegated to the `critical-section` crate so the
 * platform (cortex-m, a host test harness, an RTOS) supplies the actual
 * implementation. This module wraps it in an RAII guard so interrupts are
 * restored on every exit path: early returns, `?`, and unwinding out of a
 * client callback.
 *
 * Nested guards are fine: each one restores the state it found.
 */

use critical_section::{CriticalSection, RestoreState};

/// RAII guard that masks interrupts for its lifetime
///
/// # Example
/// ```
/// use hal_timer::critical::IrqGuard;
///
/// let guard = IrqGuard::acquire();
/// // Critical section - interrupts are masked
/// let _cs = guard.token();
/// // Interrupts restored when `guard` is dropped
/// ```
pub struct IrqGuard {
    restore: RestoreState,
}

impl IrqGuard {
    /// Mask interrupts, remembering the previous state
    pub fn acquire() -> Self {
        // SAFETY: released exactly once, in Drop, in LIFO order with any
        // nested guard because guards are scoped values.
        let restore = unsafe { critical_section::acquire() };
        Self { restore }
    }

    /// Token proving a critical section is held
    pub fn token(&self) -> CriticalSection<'_> {
        // SAFETY: the returned token cannot outlive `self`
        unsafe { CriticalSection::new() }
    }
}

impl Drop for IrqGuard {
    fn drop(&mut self) {
        // SAFETY: matches the acquire in `IrqGuard::acquire`
        unsafe { critical_section::release(self.restore) };
    }
}

/// Execute a closure with interrupts masked
pub fn without_interrupts<F, R>(f: F) -> R
where
    F: FnOnce(CriticalSection<'_>) -> R,
{
    let guard = IrqGuard::acquire();
    f(guard.token())
}
