//! Record screening ahead of fusion.
//!
//! The scoring and fusion cascades never reject input: a NaN simply fails
//! every comparison and lands in the default branch. Screening is the policy
//! layer in front of them. It drops records that would rank on garbage and
//! reports why, one record at a time, so a bad symbol never aborts a run.
//!
//! # Example
//!
//! ```
//! use confluence::types::IndicatorRecord;
//! use confluence::validation::{screen_records, ScreeningConfig};
//!
//! let records = vec![
//!     IndicatorRecord::neutral("AAPL", 190.0),
//!     IndicatorRecord { z_score: f64::NAN, ..IndicatorRecord::neutral("BAD", 5.0) },
//! ];
//! let screened = screen_records(records, &ScreeningConfig::default());
//! assert_eq!(screened.accepted.len(), 1);
//! assert_eq!(screened.rejected[0].symbol, "BAD");
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

use crate::error::FusionError;
use crate::fusion::StrategyTables;
use crate::types::{IndicatorRecord, SignalRow, MIN_HISTORY};

/// Configuration for record screening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningConfig {
    /// Drop records holding NaN or infinite values (default: true).
    pub drop_non_finite: bool,
    /// Minimum observation count for records that report one (default: 50).
    pub min_history: usize,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            drop_non_finite: true,
            min_history: MIN_HISTORY,
        }
    }
}

impl ScreeningConfig {
    /// Only structural checks; non-finite values pass through to the engine.
    pub fn lenient() -> Self {
        Self {
            drop_non_finite: false,
            ..Default::default()
        }
    }
}

/// A record that did not make it into the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRecord {
    pub symbol: String,
    pub reason: String,
}

/// Outcome of screening a batch of records.
#[derive(Debug, Clone, Default)]
pub struct ScreenedRecords {
    pub accepted: Vec<IndicatorRecord>,
    pub rejected: Vec<RejectedRecord>,
}

/// Check a single record against the screening policy.
pub fn check_record(record: &IndicatorRecord, config: &ScreeningConfig) -> Result<(), FusionError> {
    record.validate(config.min_history)?;

    if config.drop_non_finite {
        let bad = record.non_finite_fields();
        if !bad.is_empty() {
            return Err(FusionError::invalid_record(
                &record.symbol,
                format!("non-finite values in {}", bad.join(", ")),
            ));
        }
    }

    Ok(())
}

/// Split records into those fit for fusion and those rejected.
///
/// Duplicate symbols keep their first occurrence.
pub fn screen_records(records: Vec<IndicatorRecord>, config: &ScreeningConfig) -> ScreenedRecords {
    let mut screened = ScreenedRecords::default();
    let mut seen = HashSet::new();

    for record in records {
        let outcome = check_record(&record, config).and_then(|_| {
            if seen.contains(&record.symbol) {
                Err(FusionError::invalid_record(&record.symbol, "duplicate symbol"))
            } else {
                Ok(())
            }
        });

        match outcome {
            Ok(()) => {
                seen.insert(record.symbol.clone());
                screened.accepted.push(record);
            }
            Err(e) => {
                let reason = match e {
                    FusionError::InvalidRecord { reason, .. } => reason,
                    other => other.to_string(),
                };
                debug!("Rejected {}: {}", record.symbol, reason);
                screened.rejected.push(RejectedRecord {
                    symbol: record.symbol,
                    reason,
                });
            }
        }
    }

    if !screened.rejected.is_empty() {
        warn!(
            "Rejected {} of {} records",
            screened.rejected.len(),
            screened.rejected.len() + screened.accepted.len()
        );
    }

    screened
}

/// Check one row of a strategy signal table.
pub fn check_signal_row(row: &SignalRow) -> Result<(), FusionError> {
    let fields = [
        ("current_price", row.current_price),
        ("rsi", row.rsi),
        ("buy_strength", row.signal.buy_strength),
        ("sell_strength", row.signal.sell_strength),
    ];
    let bad: Vec<&str> = fields
        .iter()
        .filter(|(_, v)| !v.is_finite())
        .map(|(name, _)| *name)
        .collect();

    if bad.is_empty() {
        Ok(())
    } else {
        Err(FusionError::invalid_record(
            &row.symbol,
            format!("non-finite values in {}", bad.join(", ")),
        ))
    }
}

fn screen_table(name: &str, rows: &[SignalRow], rejected: &mut Vec<RejectedRecord>) -> Vec<SignalRow> {
    let mut kept = Vec::with_capacity(rows.len());
    for row in rows {
        match check_signal_row(row) {
            Ok(()) => kept.push(row.clone()),
            Err(e) => {
                let reason = match e {
                    FusionError::InvalidRecord { reason, .. } => format!("{} table: {}", name, reason),
                    other => other.to_string(),
                };
                debug!("Rejected {}: {}", row.symbol, reason);
                rejected.push(RejectedRecord {
                    symbol: row.symbol.clone(),
                    reason,
                });
            }
        }
    }
    kept
}

/// Drop signal-table rows holding NaN or infinite values.
///
/// A rejected row only removes the symbol from that table; the symbol can
/// still be fused from the other three.
pub fn screen_tables(tables: &StrategyTables) -> (StrategyTables, Vec<RejectedRecord>) {
    let mut rejected = Vec::new();
    let screened = StrategyTables {
        mr_buy: screen_table("mr_buy", &tables.mr_buy, &mut rejected),
        mr_sell: screen_table("mr_sell", &tables.mr_sell, &mut rejected),
        mom_buy: screen_table("mom_buy", &tables.mom_buy, &mut rejected),
        mom_sell: screen_table("mom_sell", &tables.mom_sell, &mut rejected),
    };

    if !rejected.is_empty() {
        warn!("Rejected {} signal table rows", rejected.len());
    }

    (screened, rejected)
}

/// Summary of a record file, for the `validate` command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total: usize,
    pub accepted: usize,
    pub rejected: Vec<RejectedRecord>,
    /// How many records hold a non-finite value, per field.
    pub non_finite_by_field: BTreeMap<String, usize>,
}

impl ValidationSummary {
    pub fn from_records(records: &[IndicatorRecord], config: &ScreeningConfig) -> Self {
        let mut non_finite_by_field = BTreeMap::new();
        for record in records {
            for field in record.non_finite_fields() {
                *non_finite_by_field.entry(field.to_string()).or_insert(0) += 1;
            }
        }

        let screened = screen_records(records.to_vec(), config);
        Self {
            total: records.len(),
            accepted: screened.accepted.len(),
            rejected: screened.rejected,
            non_finite_by_field,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_valid_records() {
        let records = vec![
            IndicatorRecord::neutral("A", 1.0),
            IndicatorRecord::neutral("B", 2.0),
        ];
        let screened = screen_records(records, &ScreeningConfig::default());
        assert_eq!(screened.accepted.len(), 2);
        assert!(screened.rejected.is_empty());
    }

    #[test]
    fn test_rejects_non_finite_and_continues() {
        let records = vec![
            IndicatorRecord {
                rsi: f64::NAN,
                ..IndicatorRecord::neutral("NAN", 1.0)
            },
            IndicatorRecord::neutral("OK", 1.0),
        ];
        let screened = screen_records(records, &ScreeningConfig::default());
        assert_eq!(screened.accepted.len(), 1);
        assert_eq!(screened.accepted[0].symbol, "OK");
        assert_eq!(screened.rejected[0].symbol, "NAN");
        assert!(screened.rejected[0].reason.contains("rsi"));
    }

    #[test]
    fn test_lenient_keeps_non_finite() {
        let records = vec![IndicatorRecord {
            roc_5: f64::INFINITY,
            ..IndicatorRecord::neutral("INF", 1.0)
        }];
        let screened = screen_records(records, &ScreeningConfig::lenient());
        assert_eq!(screened.accepted.len(), 1);
    }

    #[test]
    fn test_duplicate_symbol_keeps_first() {
        let records = vec![
            IndicatorRecord::neutral("DUP", 1.0),
            IndicatorRecord::neutral("DUP", 2.0),
        ];
        let screened = screen_records(records, &ScreeningConfig::default());
        assert_eq!(screened.accepted.len(), 1);
        assert_eq!(screened.accepted[0].current_price, 1.0);
        assert_eq!(screened.rejected[0].reason, "duplicate symbol");
    }

    #[test]
    fn test_empty_input() {
        let screened = screen_records(Vec::new(), &ScreeningConfig::default());
        assert!(screened.accepted.is_empty());
        assert!(screened.rejected.is_empty());
    }

    #[test]
    fn test_screen_tables_drops_non_finite_rows() {
        use crate::types::StrategySignal;

        let tables = StrategyTables {
            mr_buy: vec![
                SignalRow::new("GOOD", 10.0, 30.0, StrategySignal::new(0.9, 0.0)),
                SignalRow::new("BAD", 10.0, 30.0, StrategySignal::new(f64::NAN, 0.0)),
            ],
            mom_buy: vec![SignalRow::new("BAD", f64::INFINITY, 30.0, StrategySignal::new(0.5, 0.0))],
            mom_sell: vec![SignalRow::new("BAD", 10.0, 30.0, StrategySignal::new(0.0, 0.6))],
            ..Default::default()
        };

        let (screened, rejected) = screen_tables(&tables);
        assert_eq!(screened.mr_buy.len(), 1);
        assert_eq!(screened.mr_buy[0].symbol, "GOOD");
        assert!(screened.mom_buy.is_empty());
        // The clean row for BAD in another table survives.
        assert_eq!(screened.mom_sell.len(), 1);

        assert_eq!(rejected.len(), 2);
        assert!(rejected[0].reason.starts_with("mr_buy table"));
        assert!(rejected[0].reason.contains("buy_strength"));
        assert!(rejected[1].reason.contains("current_price"));
    }

    #[test]
    fn test_validation_summary() {
        let records = vec![
            IndicatorRecord {
                rsi: f64::NAN,
                macd: f64::NAN,
                ..IndicatorRecord::neutral("X", 1.0)
            },
            IndicatorRecord {
                rsi: f64::NAN,
                ..IndicatorRecord::neutral("Y", 1.0)
            },
            IndicatorRecord::neutral("Z", 1.0),
        ];
        let summary = ValidationSummary::from_records(&records, &ScreeningConfig::default());
        assert_eq!(summary.total, 3);
        assert_eq!(summary.accepted, 1);
        assert!(!summary.is_clean());
        assert_eq!(summary.non_finite_by_field.get("rsi"), Some(&2));
        assert_eq!(summary.non_finite_by_field.get("macd"), Some(&1));
    }
}
