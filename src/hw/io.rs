/*
 * Memory-Mapped I/O
 *
 * Peripheral registers on the nRF51 are 32-bit words at fixed addresses.
 * `Mmio` wraps one such word and performs volatile accesses through the
 * `volatile` crate so the compiler never elides or reorders them.
 */

use core::marker::PhantomData;
use core::ops::{BitAnd, BitOr, Not};
use core::ptr::NonNull;

use volatile::VolatilePtr;

/// Represents an I/O interface.
pub trait Io {
    /// The value type used for I/O operations.
    type Value: Copy
        + PartialEq
        + BitAnd<Output = Self::Value>
        + BitOr<Output = Self::Value>
        + Not<Output = Self::Value>;

    /// Reads the value from the I/O interface.
    fn read(&self) -> Self::Value;

    /// Writes the value to the I/O interface.
    fn write(&mut self, value: Self::Value);

    /// Reads the value and checks if all of `flags` are set.
    #[inline(always)]
    fn readf(&self, flags: Self::Value) -> bool {
        (self.read() & flags) == flags
    }
}

/// One memory-mapped register
pub struct Mmio<T> {
    addr: usize,
    _marker: PhantomData<T>,
}

impl<T> Mmio<T> {
    /// Creates a register handle at `addr`.
    ///
    /// # Safety
    ///
    /// `addr` must be the address of a live, suitably aligned device register
    /// of type `T` for as long as the handle is used.
    pub const unsafe fn new(addr: usize) -> Mmio<T> {
        Mmio {
            addr,
            _marker: PhantomData,
        }
    }

    /// Address of the register
    pub const fn addr(&self) -> usize {
        self.addr
    }

    #[inline(always)]
    fn ptr(&self) -> VolatilePtr<'_, T> {
        // SAFETY: `new` requires `addr` to be a valid, aligned register
        unsafe { VolatilePtr::new(NonNull::new_unchecked(self.addr as *mut T)) }
    }
}

impl Io for Mmio<u32> {
    type Value = u32;

    #[inline(always)]
    fn read(&self) -> u32 {
        self.ptr().read()
    }

    #[inline(always)]
    fn write(&mut self, value: u32) {
        self.ptr().write(value)
    }
}
