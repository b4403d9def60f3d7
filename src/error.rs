/*
 * Timer Error Types
 *
 * Every public scheduling operation reports failure through `TimerError`.
 * Nothing in the foreground path panics; the single exception is
 * `TimerRegistry::read`, whose contract has no error channel.
 */

use core::fmt;

/// Result type for timer operations
pub type Result<T> = core::result::Result<T, TimerError>;

/// Timer-level errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// A request was rejected before touching any state
    InvalidArgument(InvalidArgument),
    /// The device's deadline queue has no free slot
    QueueFull,
}

/// Why a request was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidArgument {
    /// Device index is outside the registry table
    DeviceOutOfRange,
    /// No physical timer is registered in that slot
    DeviceMissing,
    /// `init` called on a device that is already running
    AlreadyEnabled,
    /// Query that needs a running device made before `init`
    NotEnabled,
    /// Device replaced while software timers are still queued on it
    TimersQueued,
    /// Requested frequency is above the source frequency
    FrequencyTooHigh,
    /// Requested frequency needs a divider above the largest prescaler
    FrequencyTooLow,
    /// The software timer is already linked into a queue
    TimerPending,
    /// The software timer has no callback attached
    NoCallback,
    /// The software timer was never attached to a device
    NotAttached,
    /// Relative start of zero ticks
    ZeroTicks,
}

impl TimerError {
    /// True for every variant of the `InvalidArgument` class
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, TimerError::InvalidArgument(_))
    }
}

impl From<InvalidArgument> for TimerError {
    fn from(reason: InvalidArgument) -> Self {
        TimerError::InvalidArgument(reason)
    }
}

impl fmt::Display for InvalidArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidArgument::DeviceOutOfRange => write!(f, "device index out of range"),
            InvalidArgument::DeviceMissing => write!(f, "device not configured"),
            InvalidArgument::AlreadyEnabled => write!(f, "device already enabled"),
            InvalidArgument::NotEnabled => write!(f, "device not enabled"),
            InvalidArgument::TimersQueued => write!(f, "timers still queued on device"),
            InvalidArgument::FrequencyTooHigh => write!(f, "frequency too high"),
            InvalidArgument::FrequencyTooLow => write!(f, "frequency too low"),
            InvalidArgument::TimerPending => write!(f, "timer already pending"),
            InvalidArgument::NoCallback => write!(f, "timer has no callback"),
            InvalidArgument::NotAttached => write!(f, "timer not attached to a device"),
            InvalidArgument::ZeroTicks => write!(f, "zero relative ticks"),
        }
    }
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerError::InvalidArgument(reason) => write!(f, "Invalid argument: {}", reason),
            TimerError::QueueFull => write!(f, "Timer queue full"),
        }
    }
}
