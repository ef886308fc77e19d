//! Core data types for the fusion engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{FusionError, Result};

/// Minimum number of price observations behind an indicator record.
pub const MIN_HISTORY: usize = 50;

/// Values from the observation immediately preceding the latest one.
///
/// Momentum scoring looks for crossings, which need both rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorObservation {
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
}

impl PriorObservation {
    pub fn new(rsi: f64, macd: f64, macd_signal: f64) -> Self {
        Self {
            rsi,
            macd,
            macd_signal,
        }
    }
}

/// Pre-computed indicator snapshot for one symbol.
///
/// Percent-style fields (`roc_*`, `price_vs_sma*`) are in percent, while
/// `price_change_5d` is a fractional return (-0.05 is a 5% decline).
/// `bollinger_position` is 0.0 at the lower band and 1.0 at the upper band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRecord {
    pub symbol: String,
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
    /// Number of observations the indicators were computed from, when known.
    #[serde(default)]
    pub observations: Option<usize>,
    pub current_price: f64,
    pub rsi: f64,
    pub z_score: f64,
    pub bollinger_position: f64,
    pub volume_ratio: f64,
    pub price_change_5d: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub roc_5: f64,
    pub roc_20: f64,
    pub price_vs_sma10: f64,
    pub price_vs_sma20: f64,
    pub price_vs_sma50: f64,
    pub price_vs_sma200: f64,
    pub previous: PriorObservation,
}

impl IndicatorRecord {
    /// A record with mid-range indicator values.
    ///
    /// RSI sits at 50, the price is mid-band with average volume and every
    /// deviation is zero. Tests and callers override fields with struct
    /// update syntax.
    pub fn neutral(symbol: impl Into<String>, current_price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            as_of: None,
            observations: None,
            current_price,
            rsi: 50.0,
            z_score: 0.0,
            bollinger_position: 0.5,
            volume_ratio: 1.0,
            price_change_5d: 0.0,
            macd: 0.0,
            macd_signal: 0.0,
            roc_5: 0.0,
            roc_20: 0.0,
            price_vs_sma10: 0.0,
            price_vs_sma20: 0.0,
            price_vs_sma50: 0.0,
            price_vs_sma200: 0.0,
            previous: PriorObservation::new(50.0, 0.0, 0.0),
        }
    }

    /// MACD minus its signal line.
    pub fn macd_histogram(&self) -> f64 {
        self.macd - self.macd_signal
    }

    /// Structural checks: a symbol, a tradable price and enough history.
    pub fn validate(&self, min_history: usize) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(FusionError::invalid_record("<blank>", "symbol is empty"));
        }
        if !self.current_price.is_finite() || self.current_price <= 0.0 {
            return Err(FusionError::invalid_record(
                &self.symbol,
                format!("current price must be positive, got {}", self.current_price),
            ));
        }
        if let Some(n) = self.observations {
            if n < min_history {
                return Err(FusionError::invalid_record(
                    &self.symbol,
                    format!("only {} observations, need {}", n, min_history),
                ));
            }
        }
        Ok(())
    }

    /// Whether every numeric field is finite.
    pub fn is_finite(&self) -> bool {
        self.non_finite_fields().is_empty()
    }

    /// Names of the fields holding NaN or infinite values.
    pub fn non_finite_fields(&self) -> Vec<&'static str> {
        let fields = [
            ("current_price", self.current_price),
            ("rsi", self.rsi),
            ("z_score", self.z_score),
            ("bollinger_position", self.bollinger_position),
            ("volume_ratio", self.volume_ratio),
            ("price_change_5d", self.price_change_5d),
            ("macd", self.macd),
            ("macd_signal", self.macd_signal),
            ("roc_5", self.roc_5),
            ("roc_20", self.roc_20),
            ("price_vs_sma10", self.price_vs_sma10),
            ("price_vs_sma20", self.price_vs_sma20),
            ("price_vs_sma50", self.price_vs_sma50),
            ("price_vs_sma200", self.price_vs_sma200),
            ("previous.rsi", self.previous.rsi),
            ("previous.macd", self.previous.macd),
            ("previous.macd_signal", self.previous.macd_signal),
        ];
        fields
            .iter()
            .filter(|(_, v)| !v.is_finite())
            .map(|(name, _)| *name)
            .collect()
    }
}

/// Which of the two analytical strategies produced a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    MeanReversion,
    Momentum,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::MeanReversion => write!(f, "mean reversion"),
            StrategyKind::Momentum => write!(f, "momentum"),
        }
    }
}

/// Buy and sell strength from one strategy, each in [0, 1].
///
/// Both sides may be nonzero at once, which marks an ambiguous reading.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StrategySignal {
    pub buy_strength: f64,
    pub sell_strength: f64,
}

impl StrategySignal {
    /// The contribution of a strategy that has no data for a symbol.
    pub const ABSENT: StrategySignal = StrategySignal {
        buy_strength: 0.0,
        sell_strength: 0.0,
    };

    pub fn new(buy_strength: f64, sell_strength: f64) -> Self {
        Self {
            buy_strength,
            sell_strength,
        }
    }
}

/// One row of a per-strategy signal table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRow {
    pub symbol: String,
    pub current_price: f64,
    pub rsi: f64,
    pub signal: StrategySignal,
}

impl SignalRow {
    pub fn new(symbol: impl Into<String>, current_price: f64, rsi: f64, signal: StrategySignal) -> Self {
        Self {
            symbol: symbol.into(),
            current_price,
            rsi,
            signal,
        }
    }
}

/// Label describing which strategy drives a fused signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyType {
    /// Both strategies agree on a side.
    Consensus,
    /// Momentum is the stronger, decisive reading.
    Momentum,
    /// Mean reversion is the stronger, decisive reading.
    MeanReversion,
    /// The strategies point in opposite directions.
    Contrarian,
    /// Nothing decisive.
    Weak,
}

impl StrategyType {
    /// Every label, in cascade order.
    pub const ALL: [StrategyType; 5] = [
        StrategyType::Consensus,
        StrategyType::Momentum,
        StrategyType::MeanReversion,
        StrategyType::Contrarian,
        StrategyType::Weak,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyType::Consensus => "CONSENSUS",
            StrategyType::Momentum => "MOMENTUM",
            StrategyType::MeanReversion => "MEAN_REVERSION",
            StrategyType::Contrarian => "CONTRARIAN",
            StrategyType::Weak => "WEAK",
        }
    }
}

impl fmt::Display for StrategyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Discrete confidence tiers assigned by the fusion cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    Agreement,
    Strong,
    Moderate,
    Contrarian,
    Low,
}

impl ConfidenceLevel {
    pub fn score(&self) -> f64 {
        match self {
            ConfidenceLevel::Agreement => 0.9,
            ConfidenceLevel::Strong => 0.75,
            ConfidenceLevel::Moderate => 0.6,
            ConfidenceLevel::Contrarian => 0.4,
            ConfidenceLevel::Low => 0.3,
        }
    }
}

/// Final per-symbol recommendation.
///
/// Field names serialize to the tabular column names consumed by the
/// presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedSignal {
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Current_Price")]
    pub current_price: f64,
    #[serde(rename = "RSI")]
    pub rsi: f64,
    #[serde(rename = "MR_Buy_Signal")]
    pub mr_buy: f64,
    #[serde(rename = "MR_Sell_Signal")]
    pub mr_sell: f64,
    #[serde(rename = "Mom_Buy_Signal")]
    pub mom_buy: f64,
    #[serde(rename = "Mom_Sell_Signal")]
    pub mom_sell: f64,
    #[serde(rename = "Combined_Buy_Signal")]
    pub combined_buy_signal: f64,
    #[serde(rename = "Combined_Sell_Signal")]
    pub combined_sell_signal: f64,
    #[serde(rename = "Strategy_Type")]
    pub strategy_type: StrategyType,
    #[serde(rename = "Confidence_Score")]
    pub confidence_score: f64,
    #[serde(rename = "Signal_Strength")]
    pub signal_strength: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_record_is_valid() {
        let record = IndicatorRecord::neutral("AAPL", 190.0);
        assert!(record.validate(MIN_HISTORY).is_ok());
        assert!(record.is_finite());
        assert_eq!(record.macd_histogram(), 0.0);
    }

    #[test]
    fn test_validate_rejects_bad_price() {
        let record = IndicatorRecord::neutral("AAPL", 0.0);
        assert!(matches!(
            record.validate(MIN_HISTORY),
            Err(FusionError::InvalidRecord { .. })
        ));

        let record = IndicatorRecord::neutral("AAPL", f64::NAN);
        assert!(record.validate(MIN_HISTORY).is_err());
    }

    #[test]
    fn test_validate_rejects_blank_symbol() {
        let record = IndicatorRecord::neutral("  ", 10.0);
        assert!(record.validate(MIN_HISTORY).is_err());
    }

    #[test]
    fn test_validate_short_history() {
        let record = IndicatorRecord {
            observations: Some(30),
            ..IndicatorRecord::neutral("MSFT", 400.0)
        };
        assert!(record.validate(MIN_HISTORY).is_err());
        assert!(record.validate(20).is_ok());
    }

    #[test]
    fn test_non_finite_fields() {
        let record = IndicatorRecord {
            z_score: f64::NAN,
            roc_20: f64::INFINITY,
            ..IndicatorRecord::neutral("TSLA", 250.0)
        };
        assert!(!record.is_finite());
        assert_eq!(record.non_finite_fields(), vec!["z_score", "roc_20"]);
    }

    #[test]
    fn test_strategy_type_labels() {
        assert_eq!(StrategyType::MeanReversion.to_string(), "MEAN_REVERSION");
        let json = serde_json::to_string(&StrategyType::Consensus).unwrap();
        assert_eq!(json, "\"CONSENSUS\"");
    }

    #[test]
    fn test_confidence_scores() {
        let scores: Vec<f64> = [
            ConfidenceLevel::Agreement,
            ConfidenceLevel::Strong,
            ConfidenceLevel::Moderate,
            ConfidenceLevel::Contrarian,
            ConfidenceLevel::Low,
        ]
        .iter()
        .map(|c| c.score())
        .collect();
        assert_eq!(scores, vec![0.9, 0.75, 0.6, 0.4, 0.3]);
    }
}
