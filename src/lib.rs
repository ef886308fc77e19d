//! Confluence - two-strategy signal fusion for equity screening.
//!
//! # Overview
//!
//! Confluence scores a universe of symbols with two independent strategies
//! and fuses their readings into one ranked recommendation per symbol:
//!
//! - **Mean reversion**: averaged oversold/overbought components (Bollinger
//!   position, RSI, z-score, volume, 5-day drift)
//! - **Momentum**: additive trend-continuation weights (RSI and MACD
//!   crossings, rate of change, moving-average alignment, volume)
//! - **Fusion**: combined buy/sell strength, a strategy label
//!   (`CONSENSUS`, `MOMENTUM`, `MEAN_REVERSION`, `CONTRARIAN`, `WEAK`) and a
//!   confidence tier
//! - **Ranking**: top-N buy and sell lists plus per-label buckets
//! - **Configuration files**: TOML-based settings for reproducible runs
//!
//! Indicator computation and market data retrieval live upstream; records
//! arrive with their indicators already calculated.
//!
//! # Quick Start
//!
//! ```
//! use confluence::engine::Engine;
//! use confluence::types::{IndicatorRecord, StrategyType};
//!
//! let oversold = IndicatorRecord {
//!     rsi: 22.0,
//!     z_score: -2.8,
//!     bollinger_position: -0.1,
//!     price_change_5d: -0.06,
//!     ..IndicatorRecord::neutral("DIP", 50.0)
//! };
//!
//! let report = Engine::default().run(vec![oversold]);
//! assert_eq!(report.fused[0].strategy_type, StrategyType::MeanReversion);
//! ```
//!
//! # Fusing Existing Tables
//!
//! When the per-strategy signal tables are produced elsewhere, fuse them
//! directly:
//!
//! ```
//! use confluence::fusion::{FusionEngine, StrategyTables};
//! use confluence::types::{SignalRow, StrategySignal};
//!
//! let tables = StrategyTables {
//!     mr_buy: vec![SignalRow::new("AMD", 120.0, 31.0, StrategySignal::new(0.6, 0.0))],
//!     mom_buy: vec![SignalRow::new("AMD", 120.0, 31.0, StrategySignal::new(0.6, 0.0))],
//!     ..Default::default()
//! };
//! let fused = FusionEngine::default().fuse_tables(&tables);
//! assert!((fused[0].combined_buy_signal - 0.72).abs() < 1e-9);
//! ```
//!
//! # Modules
//!
//! - [`types`]: Core data types (IndicatorRecord, StrategySignal, FusedSignal)
//! - [`strategy`]: Signal calculator trait
//! - [`strategies`]: Mean-reversion and momentum calculators
//! - [`fusion`]: Combination, classification and confidence cascades
//! - [`ranking`]: Top-N lists and strategy buckets
//! - [`validation`]: Record screening ahead of fusion
//! - [`engine`]: End-to-end analysis pipeline
//! - [`analytics`]: Strategy distribution and terminal reporting
//! - [`data`]: CSV/JSON record and signal table loading
//! - [`export`]: CSV and JSON exports
//! - [`config`]: TOML configuration file support

pub mod analytics;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod export;
pub mod fusion;
pub mod ranking;
pub mod strategies;
pub mod strategy;
pub mod types;
pub mod validation;

// Re-exports for convenience
pub use analytics::{ResultFormatter, StrategyDistribution};
pub use config::ConfluenceConfig;
pub use engine::{AnalysisReport, Engine, EngineConfig};
pub use error::{FusionError, Result};
pub use fusion::{classify, combined_strength, confidence, fuse, FusionEngine, StrategyInputs, StrategyTables};
pub use ranking::{RankingLimits, Rankings};
pub use strategies::{MeanReversion, Momentum};
pub use strategy::SignalCalculator;
pub use types::{
    ConfidenceLevel, FusedSignal, IndicatorRecord, PriorObservation, SignalRow, StrategyKind,
    StrategySignal, StrategyType,
};
pub use validation::{RejectedRecord, ScreeningConfig};
