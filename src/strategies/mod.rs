//! Built-in signal calculators.
//!
//! - [`MeanReversion`]: averaged oversold/overbought components
//! - [`Momentum`]: additive trend-continuation weights, capped at 1.0
//!
//! The two keep their distinct shapes on purpose; their outputs meet only in
//! the [`fusion`](crate::fusion) cascades.

mod mean_reversion;
mod momentum;

pub use mean_reversion::{MeanReversion, COMPONENTS as MEAN_REVERSION_COMPONENTS};
pub use momentum::Momentum;

use crate::strategy::SignalCalculator;
use crate::types::{IndicatorRecord, StrategySignal};

/// Both strategies' signals for one record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalPair {
    pub mean_reversion: StrategySignal,
    pub momentum: StrategySignal,
}

/// Score a record with both built-in calculators.
pub fn score_record(record: &IndicatorRecord) -> SignalPair {
    SignalPair {
        mean_reversion: MeanReversion.calculate(record),
        momentum: Momentum.calculate(record),
    }
}
