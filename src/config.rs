//! Configuration file support for analysis runs.
//!
//! Loads run settings from TOML files so a ranking can be reproduced.

use crate::engine::EngineConfig;
use crate::error::{FusionError, Result};
use crate::fusion::FusionEngine;
use crate::ranking::RankingLimits;
use crate::types::MIN_HISTORY;
use crate::validation::ScreeningConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Complete run configuration loaded from a file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfluenceConfig {
    /// Ranking and bucket limits.
    #[serde(default)]
    pub ranking: RankingSettings,
    /// Pipeline settings.
    #[serde(default)]
    pub engine: EngineSettings,
    /// Record screening.
    #[serde(default)]
    pub validation: ValidationSettings,
    /// Report and export settings.
    #[serde(default)]
    pub output: OutputSettings,
}

/// Ranking limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingSettings {
    /// Length of the top buy and sell lists.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_bucket_limit")]
    pub consensus_limit: usize,
    #[serde(default = "default_bucket_limit")]
    pub momentum_limit: usize,
    #[serde(default = "default_bucket_limit")]
    pub mean_reversion_limit: usize,
    #[serde(default = "default_contrarian_limit")]
    pub contrarian_limit: usize,
    /// Rows shown in the terminal buy/sell summaries.
    #[serde(default = "default_summary_limit")]
    pub summary_limit: usize,
}

fn default_top_n() -> usize { 15 }
fn default_bucket_limit() -> usize { 10 }
fn default_contrarian_limit() -> usize { 5 }
fn default_summary_limit() -> usize { 5 }

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            top_n: 15,
            consensus_limit: 10,
            momentum_limit: 10,
            mean_reversion_limit: 10,
            contrarian_limit: 5,
            summary_limit: 5,
        }
    }
}

/// Pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Rows kept per strategy table before fusion. 0 fuses every symbol.
    #[serde(default = "default_top_n")]
    pub table_top_n: usize,
    /// Score and fuse symbols on the rayon pool.
    #[serde(default = "default_true")]
    pub parallel: bool,
    /// Smallest batch worth parallelizing.
    #[serde(default = "default_min_parallel_batch")]
    pub min_parallel_batch: usize,
}

fn default_true() -> bool { true }
fn default_min_parallel_batch() -> usize { 64 }

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            table_top_n: 15,
            parallel: true,
            min_parallel_batch: 64,
        }
    }
}

/// Record screening settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSettings {
    #[serde(default = "default_true")]
    pub drop_non_finite: bool,
    #[serde(default = "default_min_history")]
    pub min_history: usize,
}

fn default_min_history() -> usize { MIN_HISTORY }

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            drop_non_finite: true,
            min_history: MIN_HISTORY,
        }
    }
}

/// Report and export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Directory for CSV and JSON exports.
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    /// Decimal places in the terminal report.
    #[serde(default = "default_precision")]
    pub precision: usize,
}

fn default_directory() -> PathBuf { PathBuf::from("output") }
fn default_precision() -> usize { 3 }

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            precision: 3,
        }
    }
}

impl ConfluenceConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let content = fs::read_to_string(path)?;
        let config: ConfluenceConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| FusionError::ConfigError(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Reject limits that would make every ranking empty.
    pub fn validate(&self) -> Result<()> {
        let limits = [
            ("ranking.top_n", self.ranking.top_n),
            ("ranking.consensus_limit", self.ranking.consensus_limit),
            ("ranking.momentum_limit", self.ranking.momentum_limit),
            ("ranking.mean_reversion_limit", self.ranking.mean_reversion_limit),
            ("ranking.contrarian_limit", self.ranking.contrarian_limit),
            ("ranking.summary_limit", self.ranking.summary_limit),
        ];
        for (name, value) in limits {
            if value == 0 {
                return Err(FusionError::ConfigError(format!("{} must be at least 1", name)));
            }
        }
        if self.engine.min_parallel_batch == 0 {
            return Err(FusionError::ConfigError(
                "engine.min_parallel_batch must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn ranking_limits(&self) -> RankingLimits {
        RankingLimits {
            top_n: self.ranking.top_n,
            consensus: self.ranking.consensus_limit,
            momentum: self.ranking.momentum_limit,
            mean_reversion: self.ranking.mean_reversion_limit,
            contrarian: self.ranking.contrarian_limit,
        }
    }

    /// Record screening policy from the `[validation]` section.
    pub fn screening_config(&self) -> ScreeningConfig {
        ScreeningConfig {
            drop_non_finite: self.validation.drop_non_finite,
            min_history: self.validation.min_history,
        }
    }

    /// Convert to the engine's runtime configuration.
    pub fn to_engine_config(&self) -> Result<EngineConfig> {
        self.validate()?;

        let table_top_n = match self.engine.table_top_n {
            0 => None,
            n => Some(n),
        };

        Ok(EngineConfig {
            table_top_n,
            fusion: FusionEngine::new(self.engine.parallel, self.engine.min_parallel_batch),
            screening: self.screening_config(),
            limits: self.ranking_limits(),
        })
    }

    /// Generate an example configuration file content.
    pub fn example() -> String {
        r#"# Confluence configuration file
# Controls how indicator records are screened, fused and ranked

[ranking]
top_n = 15                  # top buy / sell list length
consensus_limit = 10
momentum_limit = 10
mean_reversion_limit = 10
contrarian_limit = 5
summary_limit = 5           # rows in the terminal summaries

[engine]
table_top_n = 15            # rows per strategy table; 0 fuses every symbol
parallel = true
min_parallel_batch = 64

[validation]
drop_non_finite = true
min_history = 50

[output]
directory = "output"
precision = 3
"#
        .to_string()
    }
}
