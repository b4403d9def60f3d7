/*
 * Scheduler Test Suite
 *
 * End-to-end tests that drive the public API on a simulated nRF51 board,
 * advancing the counters tick by tick and taking interrupts as the
 * hardware would raise them.
 *
 * ## Modules
 * - `scheduling` - ordering, cancellation, error paths and callback
 *   re-entry on the 32-bit timer
 * - `wraparound` - narrow counter extension and 32-bit wrap
 *
 * ## Fixture
 * Software timers are `static`, and callbacks are plain `fn(usize)`. Each
 * test builds its own board with `board()`, which also resets the record
 * of fired callbacks. Both live in thread-locals, so tests running in
 * parallel never see each other's state. Tests must use their own timer
 * statics for the same reason.
 */

mod wraparound;

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use crate::device::DeviceId;
use crate::sim::SimBoard;

/// nRF51 TIMER0, 32-bit
pub const WIDE: DeviceId = DeviceId(0);
/// nRF51 TIMER1, 16-bit
pub const NARROW: DeviceId = DeviceId(1);

thread_local! {
    static FIRED: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
    static BOARD: Cell<Option<&'static SimBoard>> = const { Cell::new(None) };
}

/// Fresh nRF51 board for the calling test
pub fn board() -> &'static SimBoard {
    install(SimBoard::new())
}

/// Make `board` the one callbacks of the calling test see
pub fn install(board: SimBoard) -> &'static SimBoard {
    let board: &'static SimBoard = Box::leak(Box::new(board));
    BOARD.with(|b| b.set(Some(board)));
    FIRED.with(|f| f.borrow_mut().clear());
    board
}

/// Board of the calling test, for use inside callbacks
pub fn current_board() -> &'static SimBoard {
    BOARD
        .with(|b| b.get())
        .expect("test did not build a board")
}

/// Callback that records its argument
pub fn record(arg: usize) {
    FIRED.with(|f| f.borrow_mut().push(arg));
}

/// Arguments recorded so far, in firing order
pub fn fired() -> Vec<usize> {
    FIRED.with(|f| f.borrow().clone())
}
