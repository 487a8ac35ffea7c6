pub mod bar;
pub mod calendar;
pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod segmenter;
pub mod settlement;
pub mod stats;
pub mod tracker;
pub mod vroc;

pub use bar::{DayBar, SettlementRecord, VolumeBar};
pub use config::{AnalysisParameters, AnchorMode, Config, VrocConfig};
pub use error::{ConfigError, IntegrityError, SettlementError};
pub use pipeline::{AnalysisPipeline, run_vroc};
pub use report::{AnchorKind, CycleReport, ExpirationKind};
pub use segmenter::{AnalysisOutcome, CycleSegmenter, Phase, analyze};
pub use settlement::SettlementBook;
pub use stats::{AggregateStats, StatsSummary};
