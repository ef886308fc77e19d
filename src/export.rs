//! Export utilities for analysis results.
//!
//! | File | Contents |
//! |------|----------|
//! | `combined_strategy_analysis.csv` | every fused signal |
//! | `consensus_signals.csv` | consensus bucket |
//! | `momentum_dominant_signals.csv` | momentum bucket |
//! | `mean_reversion_dominant_signals.csv` | mean-reversion bucket |
//! | `contrarian_signals.csv` | contrarian bucket |
//! | `top_buy_signals.csv` / `top_sell_signals.csv` | top-N lists |
//! | `analysis_report.json` | the whole report |
//!
//! # Example
//!
//! ```no_run
//! use confluence::engine::Engine;
//! use confluence::export::Exporter;
//!
//! let report = Engine::default().run(Vec::new());
//! let written = Exporter::new(&report).export_all("output")?;
//! println!("wrote {} files", written.len());
//! # Ok::<(), confluence::error::FusionError>(())
//! ```

use crate::engine::AnalysisReport;
use crate::error::Result;
use crate::types::{FusedSignal, StrategyType};
use csv::WriterBuilder;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Column names of a fused signal export, in order.
pub const FUSED_COLUMNS: [&str; 12] = [
    "Symbol",
    "Current_Price",
    "RSI",
    "MR_Buy_Signal",
    "MR_Sell_Signal",
    "Mom_Buy_Signal",
    "Mom_Sell_Signal",
    "Combined_Buy_Signal",
    "Combined_Sell_Signal",
    "Strategy_Type",
    "Confidence_Score",
    "Signal_Strength",
];

pub const COMBINED_FILE: &str = "combined_strategy_analysis.csv";
pub const TOP_BUY_FILE: &str = "top_buy_signals.csv";
pub const TOP_SELL_FILE: &str = "top_sell_signals.csv";
pub const REPORT_FILE: &str = "analysis_report.json";

/// Export file name for a strategy bucket.
pub fn bucket_file(strategy_type: StrategyType) -> Option<&'static str> {
    match strategy_type {
        StrategyType::Consensus => Some("consensus_signals.csv"),
        StrategyType::Momentum => Some("momentum_dominant_signals.csv"),
        StrategyType::MeanReversion => Some("mean_reversion_dominant_signals.csv"),
        StrategyType::Contrarian => Some("contrarian_signals.csv"),
        StrategyType::Weak => None,
    }
}

/// Write fused signals as CSV.
///
/// The header row is written even when there are no signals.
pub fn write_signals_csv<W: Write>(signals: &[FusedSignal], out: W) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(FUSED_COLUMNS)?;
    for signal in signals {
        writer.serialize(signal)?;
    }
    writer.flush()?;
    Ok(())
}

/// Fused signals as a CSV string.
pub fn signals_to_csv(signals: &[FusedSignal]) -> Result<String> {
    let mut buf = Vec::new();
    write_signals_csv(signals, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write fused signals to a CSV file.
pub fn export_signals_csv(signals: &[FusedSignal], path: impl AsRef<Path>) -> Result<()> {
    let file = File::create(path)?;
    write_signals_csv(signals, file)
}

/// Exporter for an analysis report.
pub struct Exporter<'a> {
    report: &'a AnalysisReport,
}

impl<'a> Exporter<'a> {
    /// Create a new exporter.
    pub fn new(report: &'a AnalysisReport) -> Self {
        Self { report }
    }

    /// Export the full fused set to CSV.
    pub fn export_combined_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        export_signals_csv(&self.report.fused, path)
    }

    /// Export the whole report to JSON.
    pub fn export_report_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self.report)?;
        Ok(())
    }

    /// Write every export file into `dir`, creating it if needed.
    ///
    /// Returns the written paths.
    pub fn export_all(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let rankings = &self.report.rankings;
        let mut written = Vec::new();

        for strategy_type in StrategyType::ALL {
            if let Some(name) = bucket_file(strategy_type) {
                let path = dir.join(name);
                export_signals_csv(rankings.bucket(strategy_type), &path)?;
                written.push(path);
            }
        }

        let path = dir.join(COMBINED_FILE);
        self.export_combined_csv(&path)?;
        written.push(path);

        let path = dir.join(TOP_BUY_FILE);
        export_signals_csv(&rankings.top_buys, &path)?;
        written.push(path);

        let path = dir.join(TOP_SELL_FILE);
        export_signals_csv(&rankings.top_sells, &path)?;
        written.push(path);

        let path = dir.join(REPORT_FILE);
        self.export_report_json(&path)?;
        written.push(path);

        info!("Exported {} files to {}", written.len(), dir.display());
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::{fuse, StrategyInputs};
    use tempfile::TempDir;

    #[test]
    fn test_csv_columns_and_labels() {
        let signals = vec![fuse("AAPL", 190.0, 42.0, StrategyInputs::new(0.8, 0.0, 0.05, 0.0))];
        let csv = signals_to_csv(&signals).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), FUSED_COLUMNS.join(","));
        let row = lines.next().unwrap();
        assert!(row.starts_with("AAPL,190.0,42.0,0.8,"));
        assert!(row.contains(",MEAN_REVERSION,0.75,"));
    }

    #[test]
    fn test_empty_export_has_header() {
        let csv = signals_to_csv(&[]).unwrap();
        assert_eq!(csv.trim_end(), FUSED_COLUMNS.join(","));
    }

    #[test]
    fn test_export_all() {
        let dir = TempDir::new().unwrap();
        let report = AnalysisReport::default();
        let written = Exporter::new(&report).export_all(dir.path()).unwrap();

        assert_eq!(written.len(), 8);
        for name in [
            "consensus_signals.csv",
            "momentum_dominant_signals.csv",
            "mean_reversion_dominant_signals.csv",
            "contrarian_signals.csv",
            COMBINED_FILE,
            TOP_BUY_FILE,
            TOP_SELL_FILE,
            REPORT_FILE,
        ] {
            assert!(dir.path().join(name).exists(), "missing {}", name);
        }
    }

    #[test]
    fn test_weak_has_no_file() {
        assert_eq!(bucket_file(StrategyType::Weak), None);
    }
}
