use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

use opex_rs::config::{AnalysisParameters, AnchorMode, Config, VrocConfig, parse_iso_date};
use opex_rs::error::ConfigError;

#[derive(Parser, Debug)]
#[command(
    name = "opex",
    about = "Monthly options-expiration cycle statistics"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Segment daily bars into expiration cycles and report spread statistics
    #[command(name = "cycles")]
    Cycles(CyclesArgs),
    /// Flag days with an outsized volume rate of change
    #[command(name = "vroc")]
    Vroc(VrocArgs),
}

#[derive(Parser, Debug)]
pub struct CyclesArgs {
    /// Daily OHLC bars (Date, Open, High, Low, Close)
    #[arg(long = "prices", value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub prices: PathBuf,

    /// Settlement prices (Date, SettlePrice)
    #[arg(long = "settlements", value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub settlements: PathBuf,

    /// Ignore bars dated before this day (YYYY-MM-DD)
    #[arg(long = "start-date")]
    pub start_date: Option<String>,

    /// Which bar opens each cycle
    #[arg(long = "anchor", value_enum, default_value = "monday-tuesday")]
    pub anchor: AnchorValue,

    /// Directory for cycles.csv, summary.json and opex.log
    #[arg(long = "output-dir", value_hint = clap::ValueHint::DirPath)]
    pub output_dir: Option<PathBuf>,

    /// Disable the opex.log file (stdout logging only)
    #[arg(long = "no-file-log", default_value_t = false)]
    pub no_file_log: bool,

    /// Skip the per-cycle report lines (summary still printed)
    #[arg(long = "quiet", default_value_t = false)]
    pub quiet: bool,

    /// Do not write cycles.csv or summary.json into the output directory
    #[arg(long = "no-artifacts", default_value_t = false)]
    pub no_artifacts: bool,
}

#[derive(Parser, Debug)]
pub struct VrocArgs {
    /// Daily volume file (Date, TotalVolume, optional PCRatio/PVolume/CVolume)
    #[arg(long = "volume", value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub volume: PathBuf,

    /// Lookback in trading days
    #[arg(long = "period", default_value_t = 15)]
    pub period: usize,

    /// Percent change a day must exceed to be flagged
    #[arg(long = "threshold", default_value_t = 100.0)]
    pub threshold: f64,

    /// Directory for vroc.csv and opex.log
    #[arg(long = "output-dir", value_hint = clap::ValueHint::DirPath)]
    pub output_dir: Option<PathBuf>,

    /// Disable the opex.log file (stdout logging only)
    #[arg(long = "no-file-log", default_value_t = false)]
    pub no_file_log: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AnchorValue {
    #[value(name = "monday-tuesday")]
    MondayTuesday,
    #[value(name = "next-session")]
    NextSession,
}

impl AnchorValue {
    fn to_mode(self) -> AnchorMode {
        match self {
            AnchorValue::MondayTuesday => AnchorMode::MondayTuesday,
            AnchorValue::NextSession => AnchorMode::NextSession,
        }
    }
}

impl Cli {
    pub fn parse() -> Self {
        <Cli as Parser>::parse()
    }
}

impl Commands {
    /// Log file location, if file logging is enabled for this invocation.
    pub fn log_file(&self) -> Option<PathBuf> {
        let (output_dir, no_file_log) = match self {
            Commands::Cycles(args) => (args.output_dir.as_ref(), args.no_file_log),
            Commands::Vroc(args) => (args.output_dir.as_ref(), args.no_file_log),
        };
        if no_file_log {
            return None;
        }
        output_dir.map(|dir| dir.join("opex.log"))
    }
}

impl CyclesArgs {
    pub fn into_config(self) -> Result<Config> {
        let parameters = match parse_optional_date(self.start_date.as_deref())? {
            Some(start_date) => AnalysisParameters { start_date },
            None => AnalysisParameters::default(),
        };
        Ok(Config {
            prices_csv: self.prices,
            settlements_csv: self.settlements,
            output_dir: self.output_dir,
            parameters,
            anchor_mode: self.anchor.to_mode(),
            quiet: self.quiet,
            write_artifacts: !self.no_artifacts,
        })
    }
}

impl VrocArgs {
    pub fn into_config(self) -> VrocConfig {
        VrocConfig {
            volume_csv: self.volume,
            output_dir: self.output_dir,
            period: self.period,
            threshold: self.threshold,
        }
    }
}

fn parse_optional_date(value: Option<&str>) -> Result<Option<NaiveDate>, ConfigError> {
    value.map(parse_iso_date).transpose()
}
