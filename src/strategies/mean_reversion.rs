//! Mean Reversion scoring.
//!
//! Oversold readings feed the buy side and overbought readings feed the sell
//! side. Each side is the average of five component scores, so a single
//! extreme indicator cannot saturate the signal on its own.

use crate::strategy::SignalCalculator;
use crate::types::{IndicatorRecord, StrategyKind, StrategySignal};

/// Number of components averaged on each side.
pub const COMPONENTS: usize = 5;

/// Mean Reversion calculator.
///
/// # Components (buy side, sell side mirrored)
/// - Bollinger position: at or below the lower band 1.0, within 20% of the
///   band width above it 0.5
/// - RSI: <= 25 1.0, <= 35 0.7, <= 45 0.3
/// - Z-score: <= -2.5 1.0, <= -1.5 0.7, <= -1.0 0.3
/// - Volume ratio: > 1.5 0.5, > 1.2 0.3 (same value on both sides)
/// - 5-day return: < -5% 0.5, < -2% 0.3
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanReversion;

impl MeanReversion {
    pub fn new() -> Self {
        Self
    }

    /// Component scores for the buy side, in a fixed order.
    pub fn buy_components(&self, record: &IndicatorRecord) -> [f64; COMPONENTS] {
        let band = if record.bollinger_position <= 0.0 {
            1.0
        } else if record.bollinger_position < 0.2 {
            0.5
        } else {
            0.0
        };

        let rsi = if record.rsi <= 25.0 {
            1.0
        } else if record.rsi <= 35.0 {
            0.7
        } else if record.rsi <= 45.0 {
            0.3
        } else {
            0.0
        };

        let z = if record.z_score <= -2.5 {
            1.0
        } else if record.z_score <= -1.5 {
            0.7
        } else if record.z_score <= -1.0 {
            0.3
        } else {
            0.0
        };

        // Recent decline
        let drift = if record.price_change_5d < -0.05 {
            0.5
        } else if record.price_change_5d < -0.02 {
            0.3
        } else {
            0.0
        };

        [band, rsi, z, volume_component(record.volume_ratio), drift]
    }

    /// Component scores for the sell side, in a fixed order.
    pub fn sell_components(&self, record: &IndicatorRecord) -> [f64; COMPONENTS] {
        let band = if record.bollinger_position >= 1.0 {
            1.0
        } else if record.bollinger_position > 0.8 {
            0.5
        } else {
            0.0
        };

        let rsi = if record.rsi >= 75.0 {
            1.0
        } else if record.rsi >= 65.0 {
            0.7
        } else if record.rsi >= 55.0 {
            0.3
        } else {
            0.0
        };

        let z = if record.z_score >= 2.5 {
            1.0
        } else if record.z_score >= 1.5 {
            0.7
        } else if record.z_score >= 1.0 {
            0.3
        } else {
            0.0
        };

        // Recent gain
        let drift = if record.price_change_5d > 0.05 {
            0.5
        } else if record.price_change_5d > 0.02 {
            0.3
        } else {
            0.0
        };

        [band, rsi, z, volume_component(record.volume_ratio), drift]
    }
}

/// High volume confirms whichever side is active, so it scores both.
fn volume_component(volume_ratio: f64) -> f64 {
    if volume_ratio > 1.5 {
        0.5
    } else if volume_ratio > 1.2 {
        0.3
    } else {
        0.0
    }
}

fn mean(components: &[f64]) -> f64 {
    components.iter().sum::<f64>() / components.len() as f64
}

impl SignalCalculator for MeanReversion {
    fn name(&self) -> &str {
        "Mean Reversion"
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::MeanReversion
    }

    fn calculate(&self, record: &IndicatorRecord) -> StrategySignal {
        StrategySignal::new(
            mean(&self.buy_components(record)),
            mean(&self.sell_components(record)),
        )
    }

    fn parameters(&self) -> Vec<(String, String)> {
        vec![
            ("components".to_string(), COMPONENTS.to_string()),
            ("aggregation".to_string(), "mean".to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_neutral_record_scores_zero() {
        let signal = MeanReversion::new().calculate(&IndicatorRecord::neutral("SPY", 450.0));
        assert_eq!(signal, StrategySignal::new(0.0, 0.0));
    }

    #[test]
    fn test_deeply_oversold() {
        let record = IndicatorRecord {
            bollinger_position: -0.1,
            rsi: 22.0,
            z_score: -2.8,
            volume_ratio: 1.8,
            price_change_5d: -0.08,
            ..IndicatorRecord::neutral("XYZ", 10.0)
        };
        let signal = MeanReversion::new().calculate(&record);
        // (1.0 + 1.0 + 1.0 + 0.5 + 0.5) / 5
        assert!(approx(signal.buy_strength, 0.8));
        // Only the volume component lands on the sell side.
        assert!(approx(signal.sell_strength, 0.1));
    }

    #[test]
    fn test_moderately_overbought() {
        let record = IndicatorRecord {
            bollinger_position: 0.85,
            rsi: 66.0,
            z_score: 1.2,
            volume_ratio: 1.3,
            price_change_5d: 0.03,
            ..IndicatorRecord::neutral("XYZ", 10.0)
        };
        let signal = MeanReversion::new().calculate(&record);
        // (0.5 + 0.7 + 0.3 + 0.3 + 0.3) / 5
        assert!(approx(signal.sell_strength, 0.42));
        assert!(approx(signal.buy_strength, 0.06));
    }

    #[test]
    fn test_tier_boundaries_are_inclusive() {
        let mr = MeanReversion::new();
        let record = IndicatorRecord {
            bollinger_position: 0.0,
            rsi: 25.0,
            z_score: -2.5,
            ..IndicatorRecord::neutral("EDGE", 1.0)
        };
        let buy = mr.buy_components(&record);
        assert_eq!(&buy[..3], &[1.0, 1.0, 1.0]);

        let record = IndicatorRecord {
            bollinger_position: 1.0,
            rsi: 75.0,
            z_score: 2.5,
            ..IndicatorRecord::neutral("EDGE", 1.0)
        };
        let sell = mr.sell_components(&record);
        assert_eq!(&sell[..3], &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_band_proximity_tier() {
        let mr = MeanReversion::new();
        let near_lower = IndicatorRecord {
            bollinger_position: 0.15,
            ..IndicatorRecord::neutral("B", 1.0)
        };
        assert_eq!(mr.buy_components(&near_lower)[0], 0.5);

        // 0.2 itself is outside the proximity band.
        let at_edge = IndicatorRecord {
            bollinger_position: 0.2,
            ..IndicatorRecord::neutral("B", 1.0)
        };
        assert_eq!(mr.buy_components(&at_edge)[0], 0.0);
    }

    #[test]
    fn test_nan_component_takes_default_branch() {
        let record = IndicatorRecord {
            rsi: f64::NAN,
            z_score: -3.0,
            ..IndicatorRecord::neutral("NAN", 1.0)
        };
        let signal = MeanReversion::new().calculate(&record);
        assert!(approx(signal.buy_strength, 0.2));
    }

    #[test]
    fn test_strengths_stay_in_unit_range() {
        let record = IndicatorRecord {
            bollinger_position: -5.0,
            rsi: 0.0,
            z_score: -10.0,
            volume_ratio: 50.0,
            price_change_5d: -0.9,
            ..IndicatorRecord::neutral("MAX", 1.0)
        };
        let signal = MeanReversion::new().calculate(&record);
        assert!(signal.buy_strength <= 1.0);
        assert!(approx(signal.buy_strength, 0.8));
    }
}
