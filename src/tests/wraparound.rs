//! Narrow counter extension and tick wraparound

use super::{NARROW, WIDE, board, fired, install, record};
use crate::config::DeviceConfig;
use crate::device::DeviceId;
use crate::hw::CompareChannel;
use crate::sim::SimBoard;
use crate::tick::CounterWidth;
use crate::timer::HalTimer;

#[test]
fn test_narrow_timer_fires_after_overflow() {
    static A: HalTimer = HalTimer::new();
    let board = board();
    let reg = &board.registry;
    reg.init(NARROW, 1_000_000).unwrap();
    reg.set_callback(NARROW, &A, record, 1).unwrap();

    reg.start(&A, 70_000).unwrap();
    board.step(NARROW, 69_999);
    assert!(fired().is_empty());
    board.step(NARROW, 1);
    assert_eq!(fired(), [1]);

    // One overflow, one compare
    assert_eq!(reg.isr_count(NARROW), Ok(2));
    assert_eq!(reg.read(NARROW), 70_000);
}

#[test]
fn test_future_epoch_is_armed_by_overflow() {
    static A: HalTimer = HalTimer::new();
    let board = board();
    let reg = &board.registry;
    let hw = board.hw(NARROW);
    reg.init(NARROW, 1_000_000).unwrap();
    reg.set_callback(NARROW, &A, record, 1).unwrap();

    reg.start_at(&A, 0x1_0010).unwrap();
    assert!(!hw.interrupt_enabled(CompareChannel::Interrupt));

    board.step(NARROW, 0x1_0000);
    assert!(fired().is_empty());
    assert!(hw.interrupt_enabled(CompareChannel::Interrupt));
    assert_eq!(hw.compare(CompareChannel::Interrupt), 0x10);

    board.step(NARROW, 0x10);
    assert_eq!(fired(), [1]);
}

#[test]
fn test_read_folds_overflow_while_masked() {
    static A: HalTimer = HalTimer::new();
    let board = board();
    let reg = &board.registry;
    let hw = board.hw(NARROW);
    let irq = DeviceConfig::NRF51_TIMER1.irq;
    reg.init(NARROW, 1_000_000).unwrap();
    reg.set_callback(NARROW, &A, record, 1).unwrap();
    reg.start_at(&A, 0x1_0004).unwrap();

    // Counter wraps without the handler getting a chance to run
    hw.advance(0xFFF0);
    hw.advance(0x20);
    assert_eq!(reg.read(NARROW), 0x1_0010);
    assert!(board.nvic.is_pending(irq));

    assert_eq!(board.service(NARROW), 1);
    assert_eq!(fired(), [1]);
    // The overflow was counted once, by the read
    assert_eq!(reg.read(NARROW), 0x1_0010);
}

#[test]
fn test_narrow_read_is_monotonic() {
    let board = board();
    let reg = &board.registry;
    reg.init(NARROW, 1_000_000).unwrap();

    let mut last = reg.read(NARROW);
    for _ in 0..200 {
        board.jump(NARROW, 4099);
        let now = reg.read(NARROW);
        assert!(now > last, "went backwards: {:#x} -> {:#x}", last, now);
        last = now;
    }
    assert_eq!(last, 200 * 4099);
}

#[test]
fn test_wide_counter_wraps() {
    static EARLY: HalTimer = HalTimer::new();
    static LATE: HalTimer = HalTimer::new();
    let board = board();
    let reg = &board.registry;
    reg.init(WIDE, 1_000_000).unwrap();
    reg.set_callback(WIDE, &EARLY, record, 1).unwrap();
    reg.set_callback(WIDE, &LATE, record, 2).unwrap();
    board.hw(WIDE).set_counter(0xFFFF_FF00);

    // LATE lands past the wrap, EARLY just before it
    reg.start(&LATE, 0x200).unwrap();
    reg.start(&EARLY, 0xF0).unwrap();
    assert_eq!(reg.next_deadline(WIDE), Ok(Some(0xFFFF_FFF0)));

    board.step(WIDE, 0xF0);
    assert_eq!(fired(), [1]);
    board.step(WIDE, 0x10F);
    assert_eq!(fired(), [1]);
    board.step(WIDE, 1);
    assert_eq!(fired(), [1, 2]);
    assert_eq!(reg.read(WIDE), 0x100);
}

#[test]
fn test_eight_bit_counter() {
    static A: HalTimer = HalTimer::new();
    let small = DeviceId(2);
    let board = install(SimBoard::with_layout([
        DeviceConfig::NRF51_TIMER0,
        DeviceConfig::NRF51_TIMER1,
        DeviceConfig {
            width: CounterWidth::Bits8,
            ..DeviceConfig::NRF51_TIMER2
        },
    ]));
    let reg = &board.registry;
    reg.init(small, 1_000_000).unwrap();
    assert_eq!(board.hw(small).width(), CounterWidth::Bits8);
    reg.set_callback(small, &A, record, 1).unwrap();

    reg.start(&A, 1000).unwrap();
    board.step(small, 999);
    assert!(fired().is_empty());
    board.step(small, 1);
    assert_eq!(fired(), [1]);
    // Overflows at 256, 512 and 768, then the compare
    assert_eq!(reg.isr_count(small), Ok(4));
}

#[test]
fn test_rounded_frequency_on_narrow_timer() {
    let board = board();
    let reg = &board.registry;
    reg.init(NARROW, 100_000).unwrap();
    assert_eq!(reg.frequency(NARROW), Ok(125_000));
    assert_eq!(reg.get_resolution(NARROW), Ok(8000));
    assert_eq!(board.hw(NARROW).prescaler(), 7);
}
