//! Analysis pipeline.
//!
//! Screens indicator records, scores them with both strategies, builds the
//! four per-strategy tables, fuses them and ranks the result.

use crate::analytics::StrategyDistribution;
use crate::fusion::{FusionEngine, StrategyTables};
use crate::ranking::{top_by, RankingLimits, Rankings, DEFAULT_TOP_N};
use crate::strategies::{score_record, SignalPair};
use crate::types::{FusedSignal, IndicatorRecord, SignalRow, StrategySignal};
use crate::validation::{screen_records, screen_tables, RejectedRecord, ScreeningConfig};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Configuration for the analysis engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Rows kept per strategy table before fusion. `None` fuses every
    /// scored symbol.
    pub table_top_n: Option<usize>,
    /// Fusion scheduling.
    pub fusion: FusionEngine,
    /// Record screening policy.
    pub screening: ScreeningConfig,
    /// Ranking and bucket limits.
    pub limits: RankingLimits,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            table_top_n: Some(DEFAULT_TOP_N),
            fusion: FusionEngine::default(),
            screening: ScreeningConfig::default(),
            limits: RankingLimits::default(),
        }
    }
}

/// Both strategy signals for one accepted record.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub symbol: String,
    pub current_price: f64,
    pub rsi: f64,
    pub signals: SignalPair,
}

impl ScoredRecord {
    fn row(&self, signal: StrategySignal) -> SignalRow {
        SignalRow::new(self.symbol.clone(), self.current_price, self.rsi, signal)
    }
}

/// Output of one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Records handed to the run.
    pub records_total: usize,
    /// Records that passed screening and were scored.
    pub records_scored: usize,
    /// One fused signal per symbol, in table order.
    pub fused: Vec<FusedSignal>,
    pub rankings: Rankings,
    pub distribution: StrategyDistribution,
    pub rejected: Vec<RejectedRecord>,
}

impl AnalysisReport {
    pub fn is_empty(&self) -> bool {
        self.fused.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Buy,
    Sell,
}

/// One side of one strategy as a table, strongest first when truncated.
fn table(
    scored: &[ScoredRecord],
    n: Option<usize>,
    strategy: fn(&SignalPair) -> StrategySignal,
    side: Side,
) -> Vec<SignalRow> {
    let strength = |s: &ScoredRecord| {
        let signal = strategy(&s.signals);
        match side {
            Side::Buy => signal.buy_strength,
            Side::Sell => signal.sell_strength,
        }
    };

    let mut ranked: Vec<&ScoredRecord> = scored.iter().collect();
    if let Some(n) = n {
        ranked.sort_by(|a, b| strength(b).total_cmp(&strength(a)));
        ranked.truncate(n);
    }

    ranked
        .into_iter()
        .map(|s| {
            let value = strength(s);
            let signal = match side {
                Side::Buy => StrategySignal::new(value, 0.0),
                Side::Sell => StrategySignal::new(0.0, value),
            };
            s.row(signal)
        })
        .collect()
}

/// Build the four per-strategy tables from scored records.
///
/// With `table_top_n` set, each table keeps only its strongest rows, so a
/// symbol reaches fusion only if at least one strategy ranks it. With
/// `None` every table carries every record in input order.
pub fn build_tables(scored: &[ScoredRecord], table_top_n: Option<usize>) -> StrategyTables {
    let mean_reversion = |p: &SignalPair| p.mean_reversion;
    let momentum = |p: &SignalPair| p.momentum;

    StrategyTables {
        mr_buy: table(scored, table_top_n, mean_reversion, Side::Buy),
        mr_sell: table(scored, table_top_n, mean_reversion, Side::Sell),
        mom_buy: table(scored, table_top_n, momentum, Side::Buy),
        mom_sell: table(scored, table_top_n, momentum, Side::Sell),
    }
}

/// Main analysis engine.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    /// Create a new engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Score every record with both strategies, preserving input order.
    pub fn score(&self, records: &[IndicatorRecord]) -> Vec<ScoredRecord> {
        let score_one = |record: &IndicatorRecord| ScoredRecord {
            symbol: record.symbol.clone(),
            current_price: record.current_price,
            rsi: record.rsi,
            signals: score_record(record),
        };

        let fusion = &self.config.fusion;
        if fusion.parallel && records.len() >= fusion.min_parallel_batch {
            records.par_iter().map(score_one).collect()
        } else {
            records.iter().map(score_one).collect()
        }
    }

    /// Run the full pipeline over a batch of indicator records.
    ///
    /// Rejected records are reported, never fatal. An empty batch yields an
    /// empty report.
    pub fn run(&self, records: Vec<IndicatorRecord>) -> AnalysisReport {
        let records_total = records.len();
        info!("Analyzing {} records", records_total);

        let screened = screen_records(records, &self.config.screening);
        let scored = self.score(&screened.accepted);
        let tables = build_tables(&scored, self.config.table_top_n);
        debug!(
            "Built strategy tables: {} / {} / {} / {} rows",
            tables.mr_buy.len(),
            tables.mr_sell.len(),
            tables.mom_buy.len(),
            tables.mom_sell.len()
        );

        let mut report = self.fuse_tables(&tables);
        report.records_total = records_total;
        report.records_scored = scored.len();
        let mut rejected = screened.rejected;
        rejected.append(&mut report.rejected);
        report.rejected = rejected;
        report
    }

    /// Fuse pre-built strategy tables and rank the result.
    ///
    /// With `drop_non_finite` screening, rows holding NaN or infinite values
    /// are left out and reported in [`AnalysisReport::rejected`].
    pub fn fuse_tables(&self, tables: &StrategyTables) -> AnalysisReport {
        let (fused, rejected) = if self.config.screening.drop_non_finite {
            let (screened, rejected) = screen_tables(tables);
            (self.config.fusion.fuse_tables(&screened), rejected)
        } else {
            (self.config.fusion.fuse_tables(tables), Vec::new())
        };
        let rankings = Rankings::build(&fused, &self.config.limits);
        let distribution = StrategyDistribution::from_signals(&fused);

        info!(
            "Fused {} symbols: {} consensus, {} contrarian",
            fused.len(),
            rankings.consensus.len(),
            rankings.contrarian.len()
        );

        AnalysisReport {
            records_total: 0,
            records_scored: 0,
            fused,
            rankings,
            distribution,
            rejected,
        }
    }

    /// The strongest fused signals overall, by signal strength.
    pub fn strongest(report: &AnalysisReport, n: usize) -> Vec<FusedSignal> {
        top_by(&report.fused, n, |s| s.signal_strength)
    }
}
