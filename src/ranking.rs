//! Ranking and bucket selection over a fused signal set.
//!
//! All sorts are stable and descending. Symbols with equal keys keep their
//! input order, so identical inputs always rank identically.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::types::{FusedSignal, StrategyType};

/// Default length of the top buy and sell lists.
pub const DEFAULT_TOP_N: usize = 15;

/// Per-bucket truncation limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankingLimits {
    pub top_n: usize,
    pub consensus: usize,
    pub momentum: usize,
    pub mean_reversion: usize,
    pub contrarian: usize,
}

impl Default for RankingLimits {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            consensus: 10,
            momentum: 10,
            mean_reversion: 10,
            contrarian: 5,
        }
    }
}

impl RankingLimits {
    /// Bucket size for a strategy label. `WEAK` signals are not bucketed.
    pub fn bucket_limit(&self, strategy_type: StrategyType) -> usize {
        match strategy_type {
            StrategyType::Consensus => self.consensus,
            StrategyType::Momentum => self.momentum,
            StrategyType::MeanReversion => self.mean_reversion,
            StrategyType::Contrarian => self.contrarian,
            StrategyType::Weak => 0,
        }
    }
}

/// Descending order on a float key. NaN sorts last.
fn descending(a: f64, b: f64) -> Ordering {
    let key = |v: f64| if v.is_nan() { f64::NEG_INFINITY } else { v };
    key(b).total_cmp(&key(a))
}

/// The `n` signals with the largest key, in descending key order.
pub fn top_by<F>(signals: &[FusedSignal], n: usize, key: F) -> Vec<FusedSignal>
where
    F: Fn(&FusedSignal) -> f64,
{
    let mut ranked: Vec<&FusedSignal> = signals.iter().collect();
    ranked.sort_by(|a, b| descending(key(a), key(b)));
    ranked.into_iter().take(n).cloned().collect()
}

/// Strongest combined buy signals.
pub fn top_buys(signals: &[FusedSignal], n: usize) -> Vec<FusedSignal> {
    top_by(signals, n, |s| s.combined_buy_signal)
}

/// Strongest combined sell signals.
pub fn top_sells(signals: &[FusedSignal], n: usize) -> Vec<FusedSignal> {
    top_by(signals, n, |s| s.combined_sell_signal)
}

/// Signals with one label, strongest first, truncated to `limit`.
pub fn bucket(signals: &[FusedSignal], strategy_type: StrategyType, limit: usize) -> Vec<FusedSignal> {
    let matching: Vec<FusedSignal> = signals
        .iter()
        .filter(|s| s.strategy_type == strategy_type)
        .cloned()
        .collect();
    top_by(&matching, limit, |s| s.signal_strength)
}

/// Every list a presentation layer needs from one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rankings {
    pub top_buys: Vec<FusedSignal>,
    pub top_sells: Vec<FusedSignal>,
    pub consensus: Vec<FusedSignal>,
    pub momentum: Vec<FusedSignal>,
    pub mean_reversion: Vec<FusedSignal>,
    pub contrarian: Vec<FusedSignal>,
}

impl Rankings {
    pub fn build(signals: &[FusedSignal], limits: &RankingLimits) -> Self {
        let for_type = |t: StrategyType| bucket(signals, t, limits.bucket_limit(t));
        Self {
            top_buys: top_buys(signals, limits.top_n),
            top_sells: top_sells(signals, limits.top_n),
            consensus: for_type(StrategyType::Consensus),
            momentum: for_type(StrategyType::Momentum),
            mean_reversion: for_type(StrategyType::MeanReversion),
            contrarian: for_type(StrategyType::Contrarian),
        }
    }

    /// The bucket for a label; `WEAK` has none.
    pub fn bucket(&self, strategy_type: StrategyType) -> &[FusedSignal] {
        match strategy_type {
            StrategyType::Consensus => &self.consensus,
            StrategyType::Momentum => &self.momentum,
            StrategyType::MeanReversion => &self.mean_reversion,
            StrategyType::Contrarian => &self.contrarian,
            StrategyType::Weak => &[],
        }
    }
}
