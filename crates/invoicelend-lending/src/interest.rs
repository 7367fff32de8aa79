//! Simple (non-compounding) interest.
//!
//! `interest = principal * rate_bps * elapsed / (10_000 * seconds_per_year)`
//!
//! The product is accumulated in `i128` with checked multiplication and the
//! quotient truncates toward zero. At the default 500 bps this is exactly
//! `principal * 5 * elapsed / (100 * seconds_per_year)`.

use invoicelend_types::constants::{BPS_DENOMINATOR, DEFAULT_INTEREST_RATE_BPS, SECONDS_PER_YEAR};
use invoicelend_types::{Amount, InvoiceLendError, ProtocolSettings, Result, Timestamp};

/// Annual rate and year length used to accrue interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterestModel {
    rate_bps: u32,
    seconds_per_year: u64,
}

impl Default for InterestModel {
    fn default() -> Self {
        Self {
            rate_bps: DEFAULT_INTEREST_RATE_BPS,
            seconds_per_year: SECONDS_PER_YEAR,
        }
    }
}

impl InterestModel {
    #[must_use]
    pub fn new(rate_bps: u32, seconds_per_year: u64) -> Self {
        Self {
            rate_bps,
            seconds_per_year,
        }
    }

    #[must_use]
    pub fn from_settings(settings: &ProtocolSettings) -> Self {
        Self::new(settings.interest_rate_bps, settings.seconds_per_year)
    }

    #[must_use]
    pub fn rate_bps(&self) -> u32 {
        self.rate_bps
    }

    /// Interest accrued on `principal` between `start_time` and `now`.
    ///
    /// Elapsed time is floored at zero, so a clock at or before the start
    /// accrues nothing.
    ///
    /// # Errors
    /// Returns `ArithmeticOverflow` if the intermediate product overflows
    /// `i128` or the year length is zero.
    pub fn accrued(&self, principal: Amount, start_time: Timestamp, now: Timestamp) -> Result<Amount> {
        let elapsed = now.saturating_sub(start_time);
        if elapsed == 0 {
            return Ok(Amount::ZERO);
        }
        let overflow = || InvoiceLendError::ArithmeticOverflow {
            context: "interest accrual",
        };
        let numerator = i128::from(self.rate_bps)
            .checked_mul(i128::from(elapsed))
            .ok_or_else(overflow)?;
        let denominator = i128::from(BPS_DENOMINATOR)
            .checked_mul(i128::from(self.seconds_per_year))
            .ok_or_else(overflow)?;
        principal
            .checked_mul_div(numerator, denominator)
            .ok_or_else(overflow)
    }
}

/// Interest at the default 5% annual rate over a 365-day year.
///
/// # Errors
/// Returns `ArithmeticOverflow` on overflow.
pub fn calculate_interest(principal: Amount, start_time: Timestamp, now: Timestamp) -> Result<Amount> {
    InterestModel::default().accrued(principal, start_time, now)
}
