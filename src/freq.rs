/*
 * Frequency Configuration
 *
 * Timer peripherals divide their source clock by a power of two:
 * f = f_max / 2^exponent. A requested tick frequency is mapped onto the
 * exponent whose divider is nearest the ideal one, and the frequency that
 * exponent actually yields is what the device records.
 */

use crate::config::MAX_PRESCALER_EXP;
use crate::error::{InvalidArgument, Result};

/// Prescaler setting and the frequency it produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prescaler {
    /// Divider exponent written to the PRESCALER register
    pub exponent: u8,
    /// Achieved tick frequency (Hz)
    pub freq_hz: u32,
}

impl Prescaler {
    /// Tick period in nanoseconds
    pub fn resolution_ns(&self) -> u32 {
        1_000_000_000 / self.freq_hz
    }
}

/// Pick the prescaler nearest to `freq_hz` for a `max_hz` source
///
/// Ties between two exponents go to the smaller one (higher frequency).
pub fn select_prescaler(max_hz: u32, freq_hz: u32) -> Result<Prescaler> {
    if freq_hz == 0 {
        return Err(InvalidArgument::FrequencyTooLow.into());
    }

    let div = max_hz / freq_hz;
    if div == 0 {
        return Err(InvalidArgument::FrequencyTooHigh.into());
    }
    if div > (1 << MAX_PRESCALER_EXP) {
        return Err(InvalidArgument::FrequencyTooLow.into());
    }

    let mut exponent = 0u8;
    if div > 1 {
        // Smallest power of two at or above the divider, then step down
        // if the power below is at least as close.
        exponent = (1..=MAX_PRESCALER_EXP)
            .find(|&e| div <= (1 << e))
            .unwrap_or(MAX_PRESCALER_EXP);
        let below = div - (1 << (exponent - 1));
        let above = (1 << exponent) - div;
        if below <= above {
            exponent -= 1;
        }
    }

    // A slow source can divide down to nothing
    let achieved = max_hz >> exponent;
    if achieved == 0 {
        return Err(InvalidArgument::FrequencyTooLow.into());
    }

    Ok(Prescaler {
        exponent,
        freq_hz: achieved,
    })
}
