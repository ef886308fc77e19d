//! Command-line interface for the fusion engine.

use confluence::analytics::{ReportOptions, ResultFormatter};
use confluence::config::ConfluenceConfig;
use confluence::data::{load_records, load_signal_table, DataConfig};
use confluence::engine::{AnalysisReport, Engine};
use confluence::error::Result;
use confluence::export::{signals_to_csv, Exporter};
use confluence::fusion::StrategyTables;
use confluence::validation::ValidationSummary;

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Confluence - fuses mean-reversion and momentum signals into ranked picks.
#[derive(Parser)]
#[command(name = "confluence")]
#[command(version)]
#[command(about = "Fuse mean-reversion and momentum signals into ranked recommendations")]
#[command(long_about = None)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score, fuse and rank a file of indicator records
    Analyze {
        /// Indicator records (CSV or JSON)
        #[arg(short, long)]
        records: PathBuf,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write CSV and JSON exports to this directory
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Fail on malformed rows instead of skipping them
        #[arg(long)]
        strict: bool,
    },

    /// Fuse four pre-computed strategy signal tables
    Fuse {
        /// Mean-reversion buy table (CSV)
        #[arg(long)]
        mr_buy: PathBuf,

        /// Mean-reversion sell table (CSV)
        #[arg(long)]
        mr_sell: PathBuf,

        /// Momentum buy table (CSV)
        #[arg(long)]
        mom_buy: PathBuf,

        /// Momentum sell table (CSV)
        #[arg(long)]
        mom_sell: PathBuf,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write CSV and JSON exports to this directory
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Validate a file of indicator records
    Validate {
        /// Indicator records (CSV or JSON)
        #[arg(short, long)]
        records: PathBuf,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Fail on malformed rows instead of skipping them
        #[arg(long)]
        strict: bool,
    },

    /// Generate an example configuration file
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = "confluence.toml")]
        output: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

impl Cli {
    /// Initialize logging based on verbosity level.
    pub fn init_logging(&self) {
        let level = match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };

        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .finish();

        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("Failed to set tracing subscriber: {}", e);
        }
    }
}

/// Run the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    cli.init_logging();

    match &cli.command {
        Commands::Analyze {
            records,
            config,
            output_dir,
            strict,
        } => run_analysis(records, config.as_ref(), output_dir.as_ref(), *strict, cli.output),

        Commands::Fuse {
            mr_buy,
            mr_sell,
            mom_buy,
            mom_sell,
            config,
            output_dir,
        } => {
            let paths = [mr_buy, mr_sell, mom_buy, mom_sell];
            run_fuse(paths, config.as_ref(), output_dir.as_ref(), cli.output)
        }

        Commands::Validate {
            records,
            config,
            strict,
        } => validate_records(records, config.as_ref(), *strict, cli.output),

        Commands::Init { output } => init_config(output),
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<ConfluenceConfig> {
    match path {
        Some(path) => ConfluenceConfig::load(path),
        None => Ok(ConfluenceConfig::default()),
    }
}

fn data_config(strict: bool) -> DataConfig {
    if strict {
        DataConfig::strict()
    } else {
        DataConfig::default()
    }
}

fn run_analysis(
    records_path: &PathBuf,
    config_path: Option<&PathBuf>,
    output_dir: Option<&PathBuf>,
    strict: bool,
    output: OutputFormat,
) -> Result<()> {
    let config = load_config(config_path)?;
    let records = load_records(records_path, &data_config(strict))?;
    let engine = Engine::new(config.to_engine_config()?);
    let report = engine.run(records);

    emit(&report, &config, output_dir, output)
}

fn run_fuse(
    paths: [&PathBuf; 4],
    config_path: Option<&PathBuf>,
    output_dir: Option<&PathBuf>,
    output: OutputFormat,
) -> Result<()> {
    let config = load_config(config_path)?;
    let data_config = DataConfig::default();

    let [mr_buy, mr_sell, mom_buy, mom_sell] = paths;
    let tables = StrategyTables {
        mr_buy: load_signal_table(mr_buy, &data_config)?,
        mr_sell: load_signal_table(mr_sell, &data_config)?,
        mom_buy: load_signal_table(mom_buy, &data_config)?,
        mom_sell: load_signal_table(mom_sell, &data_config)?,
    };

    let engine = Engine::new(config.to_engine_config()?);
    let report = engine.fuse_tables(&tables);

    emit(&report, &config, output_dir, output)
}

fn emit(
    report: &AnalysisReport,
    config: &ConfluenceConfig,
    output_dir: Option<&PathBuf>,
    output: OutputFormat,
) -> Result<()> {
    match output {
        OutputFormat::Text => {
            let options = ReportOptions {
                precision: config.output.precision,
                summary_limit: config.ranking.summary_limit,
            };
            ResultFormatter::print_report(report, &options);
        }
        OutputFormat::Json => println!("{}", ResultFormatter::to_json(report)?),
        OutputFormat::Csv => print!("{}", signals_to_csv(&report.fused)?),
    }

    if let Some(dir) = output_dir {
        let written = Exporter::new(report).export_all(dir)?;
        info!("Wrote {} export files", written.len());
        if output == OutputFormat::Text {
            println!("\nResults saved to {}", dir.display());
        }
    }

    Ok(())
}

fn validate_records(
    records_path: &PathBuf,
    config_path: Option<&PathBuf>,
    strict: bool,
    output: OutputFormat,
) -> Result<()> {
    let config = load_config(config_path)?;
    let records = load_records(records_path, &data_config(strict))?;
    let summary = ValidationSummary::from_records(&records, &config.screening_config());

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        _ => ResultFormatter::print_validation(&summary),
    }

    Ok(())
}

fn init_config(output: &PathBuf) -> Result<()> {
    let example = ConfluenceConfig::example();
    fs::write(output, example)?;
    println!("Created example configuration file: {}", output.display());
    println!("\nEdit this file to customize the analysis, then run:");
    println!("  confluence analyze -r records.csv -c {}", output.display());
    Ok(())
}
