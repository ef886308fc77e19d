//! Strategy distribution and terminal reporting.

use crate::engine::AnalysisReport;
use crate::types::{FusedSignal, StrategyType};
use crate::validation::ValidationSummary;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use tabled::{builder::Builder, settings::Style};

/// Count and share of one strategy label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionEntry {
    pub strategy_type: StrategyType,
    pub count: usize,
    /// Share of the fused set, in percent.
    pub percentage: f64,
}

/// How the fused set splits across strategy labels.
///
/// Entries are ordered by count descending; equal counts keep label order.
/// Labels that never occur are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyDistribution {
    pub total: usize,
    pub entries: Vec<DistributionEntry>,
}

impl StrategyDistribution {
    pub fn from_signals(signals: &[FusedSignal]) -> Self {
        let total = signals.len();
        if total == 0 {
            return Self::default();
        }

        let mut entries: Vec<DistributionEntry> = StrategyType::ALL
            .iter()
            .map(|&strategy_type| {
                let count = signals
                    .iter()
                    .filter(|s| s.strategy_type == strategy_type)
                    .count();
                DistributionEntry {
                    strategy_type,
                    count,
                    percentage: count as f64 / total as f64 * 100.0,
                }
            })
            .filter(|e| e.count > 0)
            .collect();

        // ALL is in label order and the sort is stable.
        entries.sort_by(|a, b| b.count.cmp(&a.count));

        Self { total, entries }
    }

    /// Count for one label, zero when absent.
    pub fn count(&self, strategy_type: StrategyType) -> usize {
        self.entries
            .iter()
            .find(|e| e.strategy_type == strategy_type)
            .map_or(0, |e| e.count)
    }
}

/// A column of a signal table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Symbol,
    CurrentPrice,
    Rsi,
    MrBuy,
    MrSell,
    MomBuy,
    MomSell,
    CombinedBuy,
    CombinedSell,
    StrategyType,
    Confidence,
    SignalStrength,
}

impl Column {
    pub fn header(&self) -> &'static str {
        match self {
            Column::Symbol => "Symbol",
            Column::CurrentPrice => "Current_Price",
            Column::Rsi => "RSI",
            Column::MrBuy => "MR_Buy_Signal",
            Column::MrSell => "MR_Sell_Signal",
            Column::MomBuy => "Mom_Buy_Signal",
            Column::MomSell => "Mom_Sell_Signal",
            Column::CombinedBuy => "Combined_Buy_Signal",
            Column::CombinedSell => "Combined_Sell_Signal",
            Column::StrategyType => "Strategy_Type",
            Column::Confidence => "Confidence_Score",
            Column::SignalStrength => "Signal_Strength",
        }
    }

    fn value(&self, signal: &FusedSignal, precision: usize) -> String {
        let num = |v: f64| format!("{:.*}", precision, v);
        match self {
            Column::Symbol => signal.symbol.clone(),
            Column::CurrentPrice => format!("{:.2}", signal.current_price),
            Column::Rsi => format!("{:.1}", signal.rsi),
            Column::MrBuy => num(signal.mr_buy),
            Column::MrSell => num(signal.mr_sell),
            Column::MomBuy => num(signal.mom_buy),
            Column::MomSell => num(signal.mom_sell),
            Column::CombinedBuy => num(signal.combined_buy_signal),
            Column::CombinedSell => num(signal.combined_sell_signal),
            Column::StrategyType => signal.strategy_type.to_string(),
            Column::Confidence => num(signal.confidence_score),
            Column::SignalStrength => num(signal.signal_strength),
        }
    }

    /// Columns shown for a strategy bucket.
    pub fn for_bucket(strategy_type: StrategyType) -> &'static [Column] {
        match strategy_type {
            StrategyType::Consensus => &[
                Column::Symbol,
                Column::CurrentPrice,
                Column::CombinedBuy,
                Column::CombinedSell,
                Column::StrategyType,
                Column::Confidence,
            ],
            StrategyType::Momentum => &[
                Column::Symbol,
                Column::CurrentPrice,
                Column::MomBuy,
                Column::MomSell,
                Column::Confidence,
            ],
            StrategyType::MeanReversion => &[
                Column::Symbol,
                Column::CurrentPrice,
                Column::MrBuy,
                Column::MrSell,
                Column::Confidence,
            ],
            StrategyType::Contrarian => &[
                Column::Symbol,
                Column::CurrentPrice,
                Column::MrBuy,
                Column::MrSell,
                Column::MomBuy,
                Column::MomSell,
                Column::Confidence,
            ],
            StrategyType::Weak => &[
                Column::Symbol,
                Column::CurrentPrice,
                Column::SignalStrength,
                Column::Confidence,
            ],
        }
    }
}

/// Render selected columns of signals as a table.
pub fn signal_table(signals: &[FusedSignal], columns: &[Column], precision: usize) -> String {
    let mut builder = Builder::new();
    builder.push_record(columns.iter().map(|c| c.header().to_string()));
    for signal in signals {
        builder.push_record(columns.iter().map(|c| c.value(signal, precision)));
    }
    builder.build().with(Style::rounded()).to_string()
}

/// Terminal report settings.
#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    /// Decimal places for signal values.
    pub precision: usize,
    /// Rows in the top buy and sell summaries.
    pub summary_limit: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            precision: 3,
            summary_limit: 5,
        }
    }
}

/// Format results for terminal display.
pub struct ResultFormatter;

impl ResultFormatter {
    fn bucket_title(strategy_type: StrategyType, limit: usize) -> String {
        match strategy_type {
            StrategyType::Consensus => format!("Top {} Consensus Signals (both strategies agree)", limit),
            StrategyType::Momentum => format!("Top {} Momentum-Driven Signals", limit),
            StrategyType::MeanReversion => format!("Top {} Mean Reversion Signals", limit),
            StrategyType::Contrarian => format!("Top {} Contrarian Signals (strategies disagree)", limit),
            StrategyType::Weak => "Weak Signals".to_string(),
        }
    }

    /// Print the full analysis report to stdout.
    pub fn print_report(report: &AnalysisReport, options: &ReportOptions) {
        println!();
        println!("{}", "═".repeat(60).blue());
        println!("{}", " COMBINED STRATEGY ANALYSIS ".bold().blue());
        println!("{}", "═".repeat(60).blue());
        println!();

        println!("{}", "Overview".bold().underline());
        println!("  Records:         {:>8}", report.records_total);
        println!("  Scored:          {:>8}", report.records_scored);
        println!("  Rejected:        {:>8}", report.rejected.len());
        println!("  Fused Symbols:   {:>8}", report.fused.len());
        println!();

        if report.is_empty() {
            println!("{}", "No combined signals to report.".yellow());
            println!("{}", "═".repeat(60).blue());
            return;
        }

        for strategy_type in [
            StrategyType::Consensus,
            StrategyType::Momentum,
            StrategyType::MeanReversion,
            StrategyType::Contrarian,
        ] {
            let bucket = report.rankings.bucket(strategy_type);
            if bucket.is_empty() {
                continue;
            }
            println!(
                "{}",
                Self::bucket_title(strategy_type, bucket.len()).bold().underline()
            );
            println!(
                "{}",
                signal_table(bucket, Column::for_bucket(strategy_type), options.precision)
            );
            println!();
        }

        Self::print_distribution(&report.distribution);
        Self::print_summary(
            "Top Buy Signals",
            &report.rankings.top_buys,
            options,
            |s| s.combined_buy_signal,
        );
        Self::print_summary(
            "Top Sell Signals",
            &report.rankings.top_sells,
            options,
            |s| s.combined_sell_signal,
        );

        if !report.rejected.is_empty() {
            println!("{}", "Rejected Records".bold().underline());
            for rejected in &report.rejected {
                println!("  {}: {}", rejected.symbol.red(), rejected.reason);
            }
            println!();
        }

        println!("{}", "═".repeat(60).blue());
    }

    /// Print the strategy distribution.
    pub fn print_distribution(distribution: &StrategyDistribution) {
        println!("{}", "Strategy Distribution".bold().underline());
        for entry in &distribution.entries {
            println!(
                "  {:<16} {:>5} symbols ({:.1}%)",
                entry.strategy_type.to_string(),
                entry.count,
                entry.percentage
            );
        }
        println!();
    }

    fn print_summary<F>(title: &str, signals: &[FusedSignal], options: &ReportOptions, key: F)
    where
        F: Fn(&FusedSignal) -> f64,
    {
        println!("{}", title.bold().underline());
        if signals.is_empty() {
            println!("  No signals found");
        }
        for signal in signals.iter().take(options.summary_limit) {
            println!(
                "  {:<8} ${:>10.2} | Signal: {} | {}",
                signal.symbol.bold(),
                signal.current_price,
                Self::format_strength(key(signal), options.precision),
                signal.strategy_type
            );
        }
        println!();
    }

    /// Color a strength by tier.
    fn format_strength(value: f64, precision: usize) -> String {
        let text = format!("{:.*}", precision, value);
        if value > 0.7 {
            text.green().bold().to_string()
        } else if value > 0.5 {
            text.green().to_string()
        } else if value > 0.3 {
            text.yellow().to_string()
        } else {
            text.dimmed().to_string()
        }
    }

    /// Print the outcome of screening a record file.
    pub fn print_validation(summary: &ValidationSummary) {
        println!("{}", "Record Validation".bold().underline());
        println!("  Records:         {:>8}", summary.total);
        println!("  Accepted:        {:>8}", summary.accepted);
        println!("  Rejected:        {:>8}", summary.rejected.len());

        if !summary.non_finite_by_field.is_empty() {
            println!();
            println!("  Non-finite values by field:");
            for (field, count) in &summary.non_finite_by_field {
                println!("    {:<22} {:>5}", field, count);
            }
        }

        for rejected in &summary.rejected {
            println!("  {} {}: {}", "✗".red(), rejected.symbol, rejected.reason);
        }

        if summary.is_clean() {
            println!("{}", "  All records valid".green());
        }
    }

    /// Export the report to JSON.
    pub fn to_json(report: &AnalysisReport) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(report)?)
    }
}
