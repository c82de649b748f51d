//! Premium-based funding rate estimation.
//!
//! Takes three parallel sequences sampled once per minute (ask quote, bid
//! quote, index price) and derives the per-second funding rate requested
//! from the settlement layer. Clamping against provider bounds happens
//! there, not here.

use perpmatch_types::constants::{
    FUNDING_EPOCH_HOURS, FUNDING_SAMPLES_PER_HOUR, INTEREST_RATE_PER_HOUR, SECONDS_PER_HOUR,
};
use perpmatch_types::{PerpmatchError, Result};
use rust_decimal::Decimal;

/// Estimate the funding rate per second from sampled quote and index
/// prices.
///
/// Per sample, the premium is `max(0, ask - index) - max(0, index - bid)`:
/// positive when asks sit above the index, negative when bids sit below it,
/// zero when the book brackets the index symmetrically. The mean premium is
/// spread over the funding epoch, the hourly interest component added, and
/// the sum normalized per second.
///
/// The ask sequence sets the expected sample count. Fewer samples than one
/// hour's worth only logs a warning; the math proceeds on what is there.
///
/// # Errors
/// `DataLengthMismatch` when the bid or index sequence length differs from
/// the ask sequence length.
pub fn estimate_funding_rate(
    ask_prices: &[Decimal],
    bid_prices: &[Decimal],
    index_prices: &[Decimal],
) -> Result<Decimal> {
    let samples = ask_prices.len();
    if samples != FUNDING_SAMPLES_PER_HOUR {
        tracing::warn!(
            samples = samples,
            expected = FUNDING_SAMPLES_PER_HOUR,
            "Estimating funding rate from fewer samples than one full hour"
        );
    }
    if bid_prices.len() != samples {
        return Err(PerpmatchError::DataLengthMismatch {
            sequence: "bid prices",
            expected: samples,
            actual: bid_prices.len(),
        });
    }
    if index_prices.len() != samples {
        return Err(PerpmatchError::DataLengthMismatch {
            sequence: "index prices",
            expected: samples,
            actual: index_prices.len(),
        });
    }
    if samples == 0 {
        return Err(PerpmatchError::DataLengthMismatch {
            sequence: "ask prices",
            expected: FUNDING_SAMPLES_PER_HOUR,
            actual: 0,
        });
    }

    let premium_sum: Decimal = ask_prices
        .iter()
        .zip(index_prices)
        .zip(bid_prices)
        .map(|((ask, index), bid)| {
            (*ask - *index).max(Decimal::ZERO) - (*index - *bid).max(Decimal::ZERO)
        })
        .sum();
    let premium_avg = premium_sum / Decimal::from(samples);

    Ok((premium_avg / Decimal::from(FUNDING_EPOCH_HOURS) + INTEREST_RATE_PER_HOUR)
        / Decimal::from(SECONDS_PER_HOUR))
}
