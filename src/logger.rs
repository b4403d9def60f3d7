/*
 * Buffered Logging
 *
 * A `log` backend for targets without a console. Records are formatted
 * into fixed-size lines and kept in a small ring of lines; the platform
 * drains the ring from its idle loop (over RTT, UART, or whatever it has).
 *
 * Why this is important:
 * - The timer interrupt logs too, so writing must never block on an output
 *   device or allocate
 * - The buffer is taken inside a critical section, so a timer interrupt
 *   that logs cannot deadlock against a foreground writer holding the lock
 * - When the ring is full the oldest line is dropped; the newest lines are
 *   the ones that explain a fault
 */

use core::fmt::Write;

use heapless::{Deque, String};
use log::{LevelFilter, Metadata, Record, SetLoggerError};
use spin::Mutex;

use crate::critical::IrqGuard;

/// Longest stored line; longer messages are truncated
pub const LOG_LINE_LEN: usize = 96;

/// Lines kept before the oldest is dropped
pub const LOG_LINES: usize = 16;

/// One formatted log line
pub type LogLine = String<LOG_LINE_LEN>;

/// Ring of formatted log lines
pub struct LogBuffer {
    lines: Deque<LogLine, LOG_LINES>,
    dropped: u32,
}

impl LogBuffer {
    pub const fn new() -> Self {
        Self {
            lines: Deque::new(),
            dropped: 0,
        }
    }

    /// Store a line, evicting the oldest one if the ring is full
    pub fn push(&mut self, line: LogLine) {
        if self.lines.is_full() {
            self.lines.pop_front();
            self.dropped = self.dropped.wrapping_add(1);
        }
        // Cannot fail: a slot was freed above
        let _ = self.lines.push_back(line);
    }

    /// Format and store a `log` record
    pub fn push_record(&mut self, record: &Record) {
        let mut line = LogLine::new();
        // Overlong messages keep what fits
        let _ = write!(Truncating(&mut line), "[{}] {}", record.level(), record.args());
        self.push(line);
    }

    /// Hand every stored line to `f`, oldest first, and empty the ring
    pub fn drain<F: FnMut(&str)>(&mut self, mut f: F) {
        while let Some(line) = self.lines.pop_front() {
            f(&line);
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines evicted since the buffer was created
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Writer that fills a line up to capacity, then stops
struct Truncating<'a>(&'a mut LogLine);

impl Write for Truncating<'_> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        for c in s.chars() {
            self.0.push(c).map_err(|_| core::fmt::Error)?;
        }
        Ok(())
    }
}

/// Global log buffer
static LOG_BUFFER: Mutex<LogBuffer> = Mutex::new(LogBuffer::new());

/// `log` backend writing into `LOG_BUFFER`
struct TimerLogger;

impl log::Log for TimerLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let _guard = IrqGuard::acquire();
        LOG_BUFFER.lock().push_record(record);
    }

    fn flush(&self) {}
}

static LOGGER: TimerLogger = TimerLogger;

/// Install the buffered logger at `level`
///
/// Fails if another logger has already been installed.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER).map(|()| log::set_max_level(level))
}

/// Drain buffered lines to the platform's output
pub fn drain<F: FnMut(&str)>(f: F) {
    let _guard = IrqGuard::acquire();
    LOG_BUFFER.lock().drain(f);
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec::Vec;
    use log::Level;

    fn line(text: &str) -> LogLine {
        let mut line = LogLine::new();
        line.push_str(text).unwrap();
        line
    }

    #[test]
    fn test_drain_in_order() {
        let mut buf = LogBuffer::new();
        buf.push(line("one"));
        buf.push(line("two"));

        let mut seen = Vec::new();
        buf.drain(|l| seen.push(l.to_string()));
        assert_eq!(seen, ["one", "two"]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_full_ring_drops_oldest() {
        let mut buf = LogBuffer::new();
        for i in 0..LOG_LINES + 2 {
            let mut l = LogLine::new();
            write!(l, "{}", i).unwrap();
            buf.push(l);
        }
        assert_eq!(buf.len(), LOG_LINES);
        assert_eq!(buf.dropped(), 2);

        let mut first = None;
        buf.drain(|l| {
            first.get_or_insert_with(|| l.to_string());
        });
        assert_eq!(first.as_deref(), Some("2"));
    }

    #[test]
    fn test_record_formatting_and_truncation() {
        let mut buf = LogBuffer::new();
        buf.push_record(
            &Record::builder()
                .level(Level::Warn)
                .args(format_args!("timer{} stopped", 1))
                .build(),
        );
        let long = "x".repeat(LOG_LINE_LEN * 2);
        buf.push_record(
            &Record::builder()
                .level(Level::Info)
                .args(format_args!("{}", long))
                .build(),
        );

        let mut seen = Vec::new();
        buf.drain(|l| seen.push(l.to_string()));
        assert_eq!(seen[0], "[WARN] timer1 stopped");
        assert!(seen[1].starts_with("[INFO] xxx"));
        assert_eq!(seen[1].len(), LOG_LINE_LEN);
    }
}
