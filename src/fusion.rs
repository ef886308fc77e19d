//! Signal fusion.
//!
//! Combines the mean-reversion and momentum strengths of each symbol into a
//! single recommendation. Three rule cascades run over the same four inputs:
//!
//! 1. combined buy / sell strength ([`combined_strength`])
//! 2. strategy label ([`classify`])
//! 3. confidence tier ([`confidence`])
//!
//! Each cascade is first-match-wins. Later rules overlap with earlier ones,
//! so the evaluation order is part of the contract.
//!
//! # Example
//!
//! ```
//! use confluence::fusion::{classify, combined_strength, StrategyInputs};
//! use confluence::types::StrategyType;
//!
//! let inputs = StrategyInputs::new(0.6, 0.0, 0.6, 0.0);
//! assert_eq!(classify(&inputs), StrategyType::Consensus);
//! assert!((combined_strength(0.6, 0.6) - 0.72).abs() < 1e-9);
//! ```

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::types::{ConfidenceLevel, FusedSignal, SignalRow, StrategySignal, StrategyType};

/// Multiplier applied when both strategies agree on a side.
///
/// The boosted value is not clamped, so agreement can rank above 1.0.
pub const CONSENSUS_BOOST: f64 = 1.2;

/// The four strengths a fused signal is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StrategyInputs {
    pub mr_buy: f64,
    pub mr_sell: f64,
    pub mom_buy: f64,
    pub mom_sell: f64,
}

impl StrategyInputs {
    pub fn new(mr_buy: f64, mr_sell: f64, mom_buy: f64, mom_sell: f64) -> Self {
        Self {
            mr_buy,
            mr_sell,
            mom_buy,
            mom_sell,
        }
    }

    pub fn from_signals(mean_reversion: StrategySignal, momentum: StrategySignal) -> Self {
        Self::new(
            mean_reversion.buy_strength,
            mean_reversion.sell_strength,
            momentum.buy_strength,
            momentum.sell_strength,
        )
    }

    /// The same inputs with the two strategies trading places.
    pub fn swapped(&self) -> Self {
        Self::new(self.mom_buy, self.mom_sell, self.mr_buy, self.mr_sell)
    }

    pub fn mr_max(&self) -> f64 {
        self.mr_buy.max(self.mr_sell)
    }

    pub fn mom_max(&self) -> f64 {
        self.mom_buy.max(self.mom_sell)
    }

    fn overall_max(&self) -> f64 {
        self.mr_max().max(self.mom_max())
    }

    /// Both strategies above `threshold` on the same side.
    fn agree_above(&self, threshold: f64) -> bool {
        (self.mr_buy > threshold && self.mom_buy > threshold)
            || (self.mr_sell > threshold && self.mom_sell > threshold)
    }

    /// The strategies above `threshold` on opposite sides.
    fn disagree_above(&self, threshold: f64) -> bool {
        (self.mr_buy > threshold && self.mom_sell > threshold)
            || (self.mr_sell > threshold && self.mom_buy > threshold)
    }
}

/// Combine one side (buy or sell) of both strategies.
///
/// The same cascade serves both sides; callers pass the buy pair or the
/// sell pair.
pub fn combined_strength(mr: f64, mom: f64) -> f64 {
    if mr > 0.5 && mom > 0.5 {
        // Agreement
        (mr + mom) / 2.0 * CONSENSUS_BOOST
    } else if mom > 0.7 && mr > 0.2 {
        // Momentum breakout with mean-reversion support
        mom * 0.8 + mr * 0.2
    } else if mr > 0.7 && mom > 0.1 {
        // Strong mean reversion with some momentum
        mr * 0.8 + mom * 0.2
    } else if mr > 0.6 || mom > 0.6 {
        mr.max(mom) * 0.8
    } else {
        (mr + mom) / 2.0 * 0.6
    }
}

/// Label which strategy drives the signal.
pub fn classify(inputs: &StrategyInputs) -> StrategyType {
    let mr_max = inputs.mr_max();
    let mom_max = inputs.mom_max();

    if inputs.agree_above(0.5) {
        StrategyType::Consensus
    } else if mom_max > mr_max && mom_max > 0.5 {
        StrategyType::Momentum
    } else if mr_max > mom_max && mr_max > 0.5 {
        StrategyType::MeanReversion
    } else if inputs.disagree_above(0.4) {
        StrategyType::Contrarian
    } else {
        StrategyType::Weak
    }
}

/// Pick the confidence tier.
pub fn confidence(inputs: &StrategyInputs) -> ConfidenceLevel {
    let strongest = inputs.overall_max();

    if inputs.agree_above(0.5) {
        ConfidenceLevel::Agreement
    } else if strongest > 0.7 {
        ConfidenceLevel::Strong
    } else if strongest > 0.5 {
        ConfidenceLevel::Moderate
    } else if inputs.disagree_above(0.3) {
        ConfidenceLevel::Contrarian
    } else {
        ConfidenceLevel::Low
    }
}

/// Build the fused record for one symbol.
pub fn fuse(symbol: impl Into<String>, current_price: f64, rsi: f64, inputs: StrategyInputs) -> FusedSignal {
    let combined_buy_signal = combined_strength(inputs.mr_buy, inputs.mom_buy);
    let combined_sell_signal = combined_strength(inputs.mr_sell, inputs.mom_sell);

    FusedSignal {
        symbol: symbol.into(),
        current_price,
        rsi,
        mr_buy: inputs.mr_buy,
        mr_sell: inputs.mr_sell,
        mom_buy: inputs.mom_buy,
        mom_sell: inputs.mom_sell,
        combined_buy_signal,
        combined_sell_signal,
        strategy_type: classify(&inputs),
        confidence_score: confidence(&inputs).score(),
        signal_strength: combined_buy_signal.max(combined_sell_signal),
    }
}

/// The four per-strategy signal tables handed to the fusion step.
///
/// A table need not cover every symbol; a symbol absent from a table
/// contributes zero strength for that table's side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategyTables {
    pub mr_buy: Vec<SignalRow>,
    pub mr_sell: Vec<SignalRow>,
    pub mom_buy: Vec<SignalRow>,
    pub mom_sell: Vec<SignalRow>,
}

impl StrategyTables {
    pub fn is_empty(&self) -> bool {
        self.in_priority_order().iter().all(|t| t.is_empty())
    }

    /// Tables in the order used to resolve price and RSI.
    fn in_priority_order(&self) -> [&[SignalRow]; 4] {
        [&self.mr_buy, &self.mr_sell, &self.mom_buy, &self.mom_sell]
    }

    /// Every symbol across the tables, in first-appearance order.
    pub fn symbols(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut symbols = Vec::new();
        for table in self.in_priority_order() {
            for row in table {
                if seen.insert(row.symbol.as_str()) {
                    symbols.push(row.symbol.as_str());
                }
            }
        }
        symbols
    }
}

/// First row per symbol in one table.
fn index_table(rows: &[SignalRow]) -> HashMap<&str, &SignalRow> {
    let mut index = HashMap::with_capacity(rows.len());
    for row in rows {
        index.entry(row.symbol.as_str()).or_insert(row);
    }
    index
}

/// Fuses strategy tables into per-symbol recommendations.
#[derive(Debug, Clone)]
pub struct FusionEngine {
    /// Fan symbols out across the rayon pool.
    pub parallel: bool,
    /// Below this many symbols the work stays on the calling thread.
    pub min_parallel_batch: usize,
}

impl Default for FusionEngine {
    fn default() -> Self {
        Self {
            parallel: true,
            min_parallel_batch: 64,
        }
    }
}

impl FusionEngine {
    pub fn new(parallel: bool, min_parallel_batch: usize) -> Self {
        Self {
            parallel,
            min_parallel_batch,
        }
    }

    /// Run on the calling thread only.
    pub fn sequential() -> Self {
        Self::new(false, usize::MAX)
    }

    fn use_parallel(&self, len: usize) -> bool {
        self.parallel && len >= self.min_parallel_batch
    }

    /// Fuse one record per symbol in the union of all four tables.
    ///
    /// Output order follows [`StrategyTables::symbols`] regardless of how the
    /// work was scheduled.
    pub fn fuse_tables(&self, tables: &StrategyTables) -> Vec<FusedSignal> {
        let symbols = tables.symbols();
        if symbols.is_empty() {
            return Vec::new();
        }

        let mr_buy = index_table(&tables.mr_buy);
        let mr_sell = index_table(&tables.mr_sell);
        let mom_buy = index_table(&tables.mom_buy);
        let mom_sell = index_table(&tables.mom_sell);

        let fuse_symbol = |symbol: &&str| {
            let lookups = [
                mr_buy.get(symbol),
                mr_sell.get(symbol),
                mom_buy.get(symbol),
                mom_sell.get(symbol),
            ];
            let signal = |i: usize| lookups[i].map_or(StrategySignal::ABSENT, |r| r.signal);
            let inputs = StrategyInputs::new(
                signal(0).buy_strength,
                signal(1).sell_strength,
                signal(2).buy_strength,
                signal(3).sell_strength,
            );
            let (price, rsi) = lookups
                .iter()
                .flatten()
                .next()
                .map_or((0.0, 0.0), |r| (r.current_price, r.rsi));
            fuse(*symbol, price, rsi, inputs)
        };

        let fused: Vec<FusedSignal> = if self.use_parallel(symbols.len()) {
            symbols.par_iter().map(fuse_symbol).collect()
        } else {
            symbols.iter().map(fuse_symbol).collect()
        };

        debug!("Fused {} symbols", fused.len());
        fused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn row(symbol: &str, price: f64, buy: f64, sell: f64) -> SignalRow {
        SignalRow::new(symbol, price, 50.0, StrategySignal::new(buy, sell))
    }

    #[test]
    fn test_consensus_scenario() {
        let inputs = StrategyInputs::new(0.6, 0.0, 0.6, 0.0);
        let fused = fuse("A", 10.0, 40.0, inputs);
        assert_eq!(fused.strategy_type, StrategyType::Consensus);
        assert!(approx(fused.combined_buy_signal, 0.72));
        assert_eq!(fused.confidence_score, 0.9);
        assert!(approx(fused.signal_strength, 0.72));
    }

    #[test]
    fn test_strong_mean_reversion_without_momentum_support() {
        // mom_buy 0.05 misses the "some momentum" rule, so rule 4 applies.
        let inputs = StrategyInputs::new(0.8, 0.0, 0.05, 0.0);
        let fused = fuse("B", 10.0, 25.0, inputs);
        assert!(approx(fused.combined_buy_signal, 0.64));
        assert_eq!(fused.strategy_type, StrategyType::MeanReversion);
        assert_eq!(fused.confidence_score, 0.75);
    }

    #[test]
    fn test_contrarian_scenario() {
        let inputs = StrategyInputs::new(0.45, 0.0, 0.0, 0.45);
        assert_eq!(classify(&inputs), StrategyType::Contrarian);
        assert_eq!(confidence(&inputs), ConfidenceLevel::Contrarian);
    }

    #[test]
    fn test_all_zero_is_weak() {
        let fused = fuse("D", 10.0, 50.0, StrategyInputs::default());
        assert_eq!(fused.strategy_type, StrategyType::Weak);
        assert_eq!(fused.combined_buy_signal, 0.0);
        assert_eq!(fused.combined_sell_signal, 0.0);
        assert_eq!(fused.confidence_score, 0.3);
    }

    #[test]
    fn test_combined_strength_cascade_order() {
        // Rule 2: momentum breakout with support
        assert!(approx(combined_strength(0.3, 0.9), 0.9 * 0.8 + 0.3 * 0.2));
        // Rule 3: strong mean reversion with some momentum
        assert!(approx(combined_strength(0.9, 0.2), 0.9 * 0.8 + 0.2 * 0.2));
        // Rule 4: momentum alone
        assert!(approx(combined_strength(0.1, 0.65), 0.65 * 0.8));
        // Rule 5: weak
        assert!(approx(combined_strength(0.4, 0.2), 0.3 * 0.6));
        // Full agreement exceeds 1.0 and is kept.
        assert!(approx(combined_strength(1.0, 1.0), 1.2));
    }

    #[test]
    fn test_momentum_dominant() {
        let inputs = StrategyInputs::new(0.2, 0.1, 0.0, 0.65);
        assert_eq!(classify(&inputs), StrategyType::Momentum);
        assert_eq!(confidence(&inputs), ConfidenceLevel::Moderate);
    }

    #[test]
    fn test_equal_maxima_fall_through_to_contrarian() {
        // Neither strategy strictly dominates.
        let inputs = StrategyInputs::new(0.55, 0.0, 0.0, 0.55);
        assert_eq!(classify(&inputs), StrategyType::Contrarian);
        assert_eq!(confidence(&inputs), ConfidenceLevel::Moderate);
    }

    #[test]
    fn test_swapped_inputs() {
        let inputs = StrategyInputs::new(0.1, 0.2, 0.3, 0.4);
        assert_eq!(inputs.swapped(), StrategyInputs::new(0.3, 0.4, 0.1, 0.2));
        assert_eq!(inputs.swapped().swapped(), inputs);
    }

    #[test]
    fn test_nan_inputs_take_default_branches() {
        let inputs = StrategyInputs::new(f64::NAN, 0.0, 0.0, 0.0);
        assert_eq!(classify(&inputs), StrategyType::Weak);
        assert_eq!(confidence(&inputs), ConfidenceLevel::Low);
    }

    #[test]
    fn test_fuse_tables_union_and_defaults() {
        let tables = StrategyTables {
            mr_buy: vec![row("AAA", 10.0, 0.6, 0.1)],
            mr_sell: vec![row("BBB", 20.0, 0.0, 0.7)],
            mom_buy: vec![row("AAA", 11.0, 0.6, 0.0), row("CCC", 30.0, 0.9, 0.0)],
            mom_sell: vec![],
        };

        let fused = FusionEngine::sequential().fuse_tables(&tables);
        let symbols: Vec<&str> = fused.iter().map(|f| f.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAA", "BBB", "CCC"]);

        let aaa = &fused[0];
        // Price comes from the mean-reversion buy table first.
        assert_eq!(aaa.current_price, 10.0);
        // The sell strength in a buy table is ignored.
        assert_eq!(aaa.mr_sell, 0.0);
        assert_eq!(aaa.strategy_type, StrategyType::Consensus);

        let bbb = &fused[1];
        assert_eq!(bbb.mr_sell, 0.7);
        assert_eq!(bbb.mom_sell, 0.0);
        assert_eq!(bbb.strategy_type, StrategyType::MeanReversion);

        let ccc = &fused[2];
        assert_eq!(ccc.current_price, 30.0);
        assert_eq!(ccc.strategy_type, StrategyType::Momentum);
    }

    #[test]
    fn test_duplicate_rows_keep_first() {
        let tables = StrategyTables {
            mr_buy: vec![row("DUP", 1.0, 0.2, 0.0), row("DUP", 2.0, 0.9, 0.0)],
            ..Default::default()
        };
        let fused = FusionEngine::sequential().fuse_tables(&tables);
        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].mr_buy, 0.2);
        assert_eq!(fused[0].current_price, 1.0);
    }

    #[test]
    fn test_empty_tables() {
        let tables = StrategyTables::default();
        assert!(tables.is_empty());
        assert!(FusionEngine::default().fuse_tables(&tables).is_empty());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let rows: Vec<SignalRow> = (0..200)
            .map(|i| row(&format!("S{:03}", i), 10.0 + i as f64, (i % 10) as f64 / 10.0, 0.0))
            .collect();
        let sells: Vec<SignalRow> = rows
            .iter()
            .rev()
            .map(|r| row(&r.symbol, r.current_price, 0.0, 1.0 - r.signal.buy_strength))
            .collect();
        let tables = StrategyTables {
            mr_buy: rows.clone(),
            mr_sell: sells.clone(),
            mom_buy: sells,
            mom_sell: rows,
        };

        let parallel = FusionEngine::new(true, 1).fuse_tables(&tables);
        let sequential = FusionEngine::sequential().fuse_tables(&tables);
        assert_eq!(parallel, sequential);
    }
}
