//! Momentum scoring.
//!
//! Rewards trend continuation: fresh RSI and MACD crossings, strong
//! short-term rate of change and price sitting above its moving averages.
//! Unlike mean reversion the components are additive weights, and each side
//! is capped at 1.0.

use crate::strategy::SignalCalculator;
use crate::types::{IndicatorRecord, StrategyKind, StrategySignal};

/// Momentum calculator.
///
/// # Components
/// - RSI: crossing above 60 +0.3, crossing above 50 +0.2, sustained above
///   55 +0.1 (sell side mirrored at 40/50/45)
/// - MACD: fresh bullish cross +0.4, sustained separation with a positive
///   histogram +0.2 (mirrored for sells)
/// - ROC(5): > 5% +0.2, > 2% +0.1 (mirrored for sells)
/// - Moving-average alignment over the 10/20/50/200-day averages
/// - Volume surge (> 1.5x) adds 0.1 in the direction of the 5-day move
#[derive(Debug, Clone, Copy, Default)]
pub struct Momentum;

impl Momentum {
    pub fn new() -> Self {
        Self
    }

    /// How many of the four moving averages the price sits above.
    pub fn ma_alignment(record: &IndicatorRecord) -> usize {
        [
            record.price_vs_sma10,
            record.price_vs_sma20,
            record.price_vs_sma50,
            record.price_vs_sma200,
        ]
        .iter()
        .filter(|&&deviation| deviation > 0.0)
        .count()
    }

    fn rsi_scores(record: &IndicatorRecord) -> (f64, f64) {
        let rsi = record.rsi;
        let prev = record.previous.rsi;

        let buy = if rsi > 60.0 && prev <= 60.0 {
            0.3
        } else if rsi > 50.0 && prev <= 50.0 {
            0.2
        } else if rsi > 55.0 {
            0.1
        } else {
            0.0
        };

        let sell = if rsi < 40.0 && prev >= 40.0 {
            0.3
        } else if rsi < 50.0 && prev >= 50.0 {
            0.2
        } else if rsi < 45.0 {
            0.1
        } else {
            0.0
        };

        (buy, sell)
    }

    fn macd_scores(record: &IndicatorRecord) -> (f64, f64) {
        let above = record.macd > record.macd_signal;
        let below = record.macd < record.macd_signal;
        let was_above = record.previous.macd >= record.previous.macd_signal;
        let was_below = record.previous.macd <= record.previous.macd_signal;
        let histogram = record.macd_histogram();

        let buy = if above && was_below {
            0.4
        } else if above && histogram > 0.0 {
            0.2
        } else {
            0.0
        };

        let sell = if below && was_above {
            0.4
        } else if below && histogram < 0.0 {
            0.2
        } else {
            0.0
        };

        (buy, sell)
    }

    fn roc_scores(record: &IndicatorRecord) -> (f64, f64) {
        let roc = record.roc_5;
        if roc > 5.0 {
            (0.2, 0.0)
        } else if roc > 2.0 {
            (0.1, 0.0)
        } else if roc < -5.0 {
            (0.0, 0.2)
        } else if roc < -2.0 {
            (0.0, 0.1)
        } else {
            (0.0, 0.0)
        }
    }

    fn alignment_scores(record: &IndicatorRecord) -> (f64, f64) {
        let aligned = Self::ma_alignment(record);

        let buy = if aligned >= 3 {
            0.3
        } else if aligned >= 2 {
            0.1
        } else {
            0.0
        };

        let sell = if aligned <= 1 {
            0.3
        } else if aligned <= 2 {
            0.1
        } else {
            0.0
        };

        (buy, sell)
    }

    fn volume_scores(record: &IndicatorRecord) -> (f64, f64) {
        if record.volume_ratio > 1.5 {
            if record.roc_5 > 0.0 {
                (0.1, 0.0)
            } else {
                (0.0, 0.1)
            }
        } else {
            (0.0, 0.0)
        }
    }
}

impl SignalCalculator for Momentum {
    fn name(&self) -> &str {
        "Momentum"
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Momentum
    }

    fn calculate(&self, record: &IndicatorRecord) -> StrategySignal {
        let components = [
            Self::rsi_scores(record),
            Self::macd_scores(record),
            Self::roc_scores(record),
            Self::alignment_scores(record),
            Self::volume_scores(record),
        ];

        let (buy, sell) = components
            .iter()
            .fold((0.0, 0.0), |(b, s), (db, ds)| (b + db, s + ds));

        StrategySignal::new(buy.min(1.0), sell.min(1.0))
    }

    fn parameters(&self) -> Vec<(String, String)> {
        vec![
            ("aggregation".to_string(), "additive".to_string()),
            ("cap".to_string(), "1.0".to_string()),
        ]
    }
}
