//! Loading indicator records and strategy signal tables.

use crate::error::{FusionError, Result};
use crate::types::{IndicatorRecord, PriorObservation, SignalRow, StrategySignal};
use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info, warn};

/// Raw CSV row for an indicator record.
///
/// Previous-observation columns are optional. When they are missing the
/// current value is used, which means no crossing is detected.
#[derive(Debug, Deserialize)]
struct RecordRow {
    #[serde(alias = "Symbol", alias = "SYMBOL", alias = "Ticker", alias = "ticker")]
    symbol: String,
    #[serde(alias = "Date", alias = "date", alias = "As_Of", default)]
    as_of: Option<NaiveDate>,
    #[serde(alias = "Observations", alias = "Data_Points", default)]
    observations: Option<usize>,
    #[serde(alias = "Current_Price", alias = "Close", alias = "close", alias = "price")]
    current_price: f64,
    #[serde(alias = "RSI", alias = "Rsi")]
    rsi: f64,
    #[serde(alias = "Z_Score", alias = "ZScore", alias = "zscore")]
    z_score: f64,
    #[serde(alias = "BB_Position", alias = "Bollinger_Position", alias = "bb_position")]
    bollinger_position: f64,
    #[serde(alias = "Volume_Ratio")]
    volume_ratio: f64,
    #[serde(alias = "Price_Change_5d", alias = "Price_Change_5D")]
    price_change_5d: f64,
    #[serde(alias = "MACD")]
    macd: f64,
    #[serde(alias = "MACD_Signal")]
    macd_signal: f64,
    #[serde(alias = "ROC_5")]
    roc_5: f64,
    #[serde(alias = "ROC_20")]
    roc_20: f64,
    #[serde(alias = "Price_vs_SMA10")]
    price_vs_sma10: f64,
    #[serde(alias = "Price_vs_SMA20")]
    price_vs_sma20: f64,
    #[serde(alias = "Price_vs_SMA50")]
    price_vs_sma50: f64,
    #[serde(alias = "Price_vs_SMA200")]
    price_vs_sma200: f64,
    #[serde(alias = "Prev_RSI", default)]
    prev_rsi: Option<f64>,
    #[serde(alias = "Prev_MACD", default)]
    prev_macd: Option<f64>,
    #[serde(alias = "Prev_MACD_Signal", default)]
    prev_macd_signal: Option<f64>,
}

impl From<RecordRow> for IndicatorRecord {
    fn from(row: RecordRow) -> Self {
        let previous = PriorObservation::new(
            row.prev_rsi.unwrap_or(row.rsi),
            row.prev_macd.unwrap_or(row.macd),
            row.prev_macd_signal.unwrap_or(row.macd_signal),
        );
        IndicatorRecord {
            symbol: row.symbol,
            as_of: row.as_of,
            observations: row.observations,
            current_price: row.current_price,
            rsi: row.rsi,
            z_score: row.z_score,
            bollinger_position: row.bollinger_position,
            volume_ratio: row.volume_ratio,
            price_change_5d: row.price_change_5d,
            macd: row.macd,
            macd_signal: row.macd_signal,
            roc_5: row.roc_5,
            roc_20: row.roc_20,
            price_vs_sma10: row.price_vs_sma10,
            price_vs_sma20: row.price_vs_sma20,
            price_vs_sma50: row.price_vs_sma50,
            price_vs_sma200: row.price_vs_sma200,
            previous,
        }
    }
}

/// Raw CSV row of a per-strategy signal table.
///
/// Mean-reversion tables name their strengths `Buy_Signal_Strength` /
/// `Sell_Signal_Strength`; momentum tables use `Momentum_Buy_Signal` /
/// `Momentum_Sell_Signal`. A table usually carries only one side.
#[derive(Debug, Deserialize)]
struct SignalTableRow {
    #[serde(alias = "Symbol", alias = "SYMBOL")]
    symbol: String,
    #[serde(alias = "Current_Price", alias = "price")]
    current_price: f64,
    #[serde(alias = "RSI", default)]
    rsi: Option<f64>,
    #[serde(
        alias = "Buy_Signal_Strength",
        alias = "Momentum_Buy_Signal",
        alias = "buy_strength",
        default
    )]
    buy: Option<f64>,
    #[serde(
        alias = "Sell_Signal_Strength",
        alias = "Momentum_Sell_Signal",
        alias = "sell_strength",
        default
    )]
    sell: Option<f64>,
}

impl From<SignalTableRow> for SignalRow {
    fn from(row: SignalTableRow) -> Self {
        SignalRow::new(
            row.symbol,
            row.current_price,
            row.rsi.unwrap_or(0.0),
            StrategySignal::new(row.buy.unwrap_or(0.0), row.sell.unwrap_or(0.0)),
        )
    }
}

/// Input loading options.
#[derive(Debug, Clone)]
pub struct DataConfig {
    /// Whether the CSV has headers.
    pub has_headers: bool,
    /// CSV delimiter character.
    pub delimiter: u8,
    /// Skip invalid rows instead of failing.
    pub skip_invalid: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            has_headers: true,
            delimiter: b',',
            skip_invalid: true,
        }
    }
}

impl DataConfig {
    /// Fail on the first malformed row.
    pub fn strict() -> Self {
        Self {
            skip_invalid: false,
            ..Default::default()
        }
    }
}

/// Input file format, detected from the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Csv,
    Json,
}

impl DataFormat {
    /// Detect format from file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" | "tsv" | "txt" => Some(DataFormat::Csv),
            "json" => Some(DataFormat::Json),
            _ => None,
        }
    }
}

/// Deserialize every row of a CSV file, skipping or failing on bad rows.
fn read_rows<T, R>(path: &Path, config: &DataConfig) -> Result<Vec<R>>
where
    T: for<'de> Deserialize<'de>,
    R: From<T>,
{
    let mut reader = ReaderBuilder::new()
        .has_headers(config.has_headers)
        .delimiter(config.delimiter)
        .trim(Trim::All)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    let mut skipped = 0;

    for (idx, result) in reader.deserialize::<T>().enumerate() {
        match result {
            Ok(row) => rows.push(R::from(row)),
            Err(e) => {
                if config.skip_invalid {
                    debug!("Skipping row {}: {}", idx + 1, e);
                    skipped += 1;
                } else {
                    return Err(FusionError::CsvError(e));
                }
            }
        }
    }

    if skipped > 0 {
        warn!("Skipped {} invalid rows in {}", skipped, path.display());
    }

    Ok(rows)
}

/// Load indicator records from a CSV file.
pub fn load_records_csv(path: impl AsRef<Path>, config: &DataConfig) -> Result<Vec<IndicatorRecord>> {
    let path = path.as_ref();
    info!("Loading indicator records from: {}", path.display());

    let records = read_rows::<RecordRow, IndicatorRecord>(path, config)?;
    info!("Loaded {} records", records.len());
    Ok(records)
}

/// Load indicator records from a JSON array.
pub fn load_records_json(path: impl AsRef<Path>) -> Result<Vec<IndicatorRecord>> {
    let path = path.as_ref();
    info!("Loading indicator records from: {}", path.display());

    let file = File::open(path)?;
    let records: Vec<IndicatorRecord> = serde_json::from_reader(BufReader::new(file))?;
    info!("Loaded {} records", records.len());
    Ok(records)
}

/// Load indicator records, picking the format from the file extension.
pub fn load_records(path: impl AsRef<Path>, config: &DataConfig) -> Result<Vec<IndicatorRecord>> {
    let path = path.as_ref();
    let format = DataFormat::from_path(path).ok_or_else(|| {
        FusionError::DataError(format!(
            "Unknown file format for: {}. Supported: .csv, .json",
            path.display()
        ))
    })?;

    match format {
        DataFormat::Csv => load_records_csv(path, config),
        DataFormat::Json => load_records_json(path),
    }
}

/// Load one per-strategy signal table from CSV.
///
/// Missing strength and RSI columns read as 0.
pub fn load_signal_table(path: impl AsRef<Path>, config: &DataConfig) -> Result<Vec<SignalRow>> {
    let path = path.as_ref();
    info!("Loading signal table from: {}", path.display());

    let rows = read_rows::<SignalTableRow, SignalRow>(path, config)?;
    debug!("Loaded {} signal rows", rows.len());
    Ok(rows)
}
