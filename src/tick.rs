/*
 * Tick Arithmetic
 *
 * The logical timebase is a 32-bit tick that wraps. Ordering between two
 * ticks is decided by the sign of their wrapping difference, so any two
 * deadlines less than 2^31 ticks apart compare correctly across the wrap.
 */

/// Logical tick value (wide, wrapping)
pub type Ticks = u32;

/// Returns true if `a` is strictly before `b`
#[inline]
pub fn tick_before(a: Ticks, b: Ticks) -> bool {
    (a.wrapping_sub(b) as i32) < 0
}

/// Returns true once `now` has reached or passed `deadline`
#[inline]
pub fn tick_reached(now: Ticks, deadline: Ticks) -> bool {
    (now.wrapping_sub(deadline) as i32) >= 0
}

/// Hardware counter width
///
/// Anything narrower than 32 bits is "narrow": the hardware only supplies
/// the low bits and software tracks the high bits by counting overflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterWidth {
    Bits8,
    Bits16,
    Bits24,
    Bits32,
}

impl CounterWidth {
    /// Number of bits the hardware counter holds
    pub const fn bits(self) -> u32 {
        match self {
            CounterWidth::Bits8 => 8,
            CounterWidth::Bits16 => 16,
            CounterWidth::Bits24 => 24,
            CounterWidth::Bits32 => 32,
        }
    }

    /// True if overflow events must be folded into a software tally
    pub const fn is_narrow(self) -> bool {
        !matches!(self, CounterWidth::Bits32)
    }

    /// Mask of the bits supplied by hardware
    pub const fn counter_mask(self) -> u32 {
        match self {
            CounterWidth::Bits32 => u32::MAX,
            _ => (1u32 << self.bits()) - 1,
        }
    }

    /// Mask of the bits supplied by the overflow tally
    pub const fn epoch_mask(self) -> u32 {
        !self.counter_mask()
    }

    /// Ticks per hardware overflow (zero for a wide counter)
    pub const fn epoch_span(self) -> u32 {
        self.counter_mask().wrapping_add(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_before_plain() {
        assert!(tick_before(10, 20));
        assert!(!tick_before(20, 10));
        assert!(!tick_before(10, 10));
    }

    #[test]
    fn test_tick_before_across_wrap() {
        // 0xFFFF_FFF0 is 0x20 ticks before 0x10 once the counter wraps
        assert!(tick_before(0xFFFF_FFF0, 0x10));
        assert!(!tick_before(0x10, 0xFFFF_FFF0));
    }

    #[test]
    fn test_tick_reached() {
        assert!(tick_reached(100, 100));
        assert!(tick_reached(101, 100));
        assert!(!tick_reached(99, 100));
        assert!(tick_reached(0x5, 0xFFFF_FFFE));
    }

    #[test]
    fn test_counter_width_masks() {
        assert_eq!(CounterWidth::Bits16.counter_mask(), 0xFFFF);
        assert_eq!(CounterWidth::Bits16.epoch_mask(), 0xFFFF_0000);
        assert_eq!(CounterWidth::Bits16.epoch_span(), 0x1_0000);
        assert_eq!(CounterWidth::Bits8.epoch_span(), 0x100);
        assert_eq!(CounterWidth::Bits24.counter_mask(), 0x00FF_FFFF);
        assert_eq!(CounterWidth::Bits32.counter_mask(), u32::MAX);
        assert_eq!(CounterWidth::Bits32.epoch_span(), 0);
        assert!(CounterWidth::Bits24.is_narrow());
        assert!(!CounterWidth::Bits32.is_narrow());
    }
}
