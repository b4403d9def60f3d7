//! Simulated interrupt controller and clock

use alloc::sync::Arc;

use spin::Mutex;

use crate::device::DeviceId;
use crate::hw::{ClockSource, InterruptController, IrqSource};

/// Number of lines the simulated controller models
const IRQ_LINES: usize = 32;

#[derive(Debug, Default)]
struct NvicState {
    pending: u32,
    enabled: u32,
    priority: [u8; IRQ_LINES],
    routes: [Option<DeviceId>; IRQ_LINES],
}

/// Interrupt controller that records what the scheduler asks of it
///
/// Clones share state, so a test keeps one handle while the registry owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct SimNvic {
    inner: Arc<Mutex<NvicState>>,
}

impl SimNvic {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `source` has been forced pending and not yet taken
    pub fn is_pending(&self, source: IrqSource) -> bool {
        self.inner.lock().pending & bit(source) != 0
    }

    /// Acknowledge a pending line, returning whether it was pending
    pub fn take_pending(&self, source: IrqSource) -> bool {
        let mut st = self.inner.lock();
        let was = st.pending & bit(source) != 0;
        st.pending &= !bit(source);
        was
    }

    pub fn is_enabled(&self, source: IrqSource) -> bool {
        self.inner.lock().enabled & bit(source) != 0
    }

    pub fn priority(&self, source: IrqSource) -> u8 {
        self.inner.lock().priority[source.as_usize()]
    }

    /// Device whose handler was installed on `source`
    pub fn installed(&self, source: IrqSource) -> Option<DeviceId> {
        self.inner.lock().routes[source.as_usize()]
    }
}

fn bit(source: IrqSource) -> u32 {
    1 << (source.as_usize() % IRQ_LINES)
}

impl InterruptController for SimNvic {
    fn install(&self, source: IrqSource, priority: u8, device: DeviceId) {
        let mut st = self.inner.lock();
        st.priority[source.as_usize()] = priority;
        st.routes[source.as_usize()] = Some(device);
    }

    fn enable(&self, source: IrqSource) {
        self.inner.lock().enabled |= bit(source);
    }

    fn set_pending(&self, source: IrqSource) {
        self.inner.lock().pending |= bit(source);
    }
}

/// Oscillator that counts how often it was asked to start
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    starts: Arc<Mutex<u32>>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `ensure_ready` calls seen
    pub fn start_requests(&self) -> u32 {
        *self.starts.lock()
    }
}

impl ClockSource for SimClock {
    fn ensure_ready(&self) {
        *self.starts.lock() += 1;
    }
}
