use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use crate::config::{Config, VrocConfig};
use crate::data::{fingerprint_file, load_day_bars, load_settlements, load_volume};
use crate::report::{
    self, CycleReport, InputFingerprint, REPORT_DATE_FORMAT, RunSummary, render_summary,
};
use crate::segmenter::{AnalysisOutcome, CycleSegmenter};
use crate::settlement::SettlementBook;
use crate::vroc::{self, VrocSignal};

/// Load, segment, summarise, and (optionally) persist one analysis run.
pub struct AnalysisPipeline {
    config: Config,
}

impl AnalysisPipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn run(&self) -> Result<AnalysisOutcome> {
        let start_time = Instant::now();
        self.config.validate()?;

        let inputs = [&self.config.prices_csv, &self.config.settlements_csv]
            .into_iter()
            .map(|path| fingerprint_file(path))
            .collect::<Result<Vec<_>>>()?;
        for input in &inputs {
            info!(path = %input.path.display(), sha256 = %input.sha256, "Input fingerprint");
        }

        let bars = load_day_bars(&self.config.prices_csv)?;
        let records = load_settlements(&self.config.settlements_csv)?;
        let settlements = SettlementBook::from_records(records);
        let duplicates = settlements.duplicate_dates();
        if !duplicates.is_empty() {
            warn!(
                path = %self.config.settlements_csv.display(),
                dates = ?duplicates,
                "Settlement file contains duplicate dates; those expirations cannot be resolved"
            );
        }

        info!(
            anchor_mode = ?self.config.anchor_mode,
            start_date = %self.config.parameters.start_date,
            day_bars = bars.len(),
            settlements = settlements.len(),
            "Starting expiration cycle analysis"
        );

        let mut segmenter =
            CycleSegmenter::new(&settlements, self.config.parameters, self.config.anchor_mode);
        for day in &bars {
            match segmenter.process(day) {
                Ok(Some(report)) => self.log_cycle(&report),
                Ok(None) => {}
                Err(err) => {
                    error!(
                        date = %err.date().format(REPORT_DATE_FORMAT),
                        error = %err,
                        cycles_closed = segmenter.cycles().len(),
                        "Data integrity violation; no summary will be reported"
                    );
                    return Err(err).context("Expiration cycle analysis aborted");
                }
            }
        }
        let outcome = segmenter.finish();

        info!("{}", render_summary(outcome.summary.as_ref()));

        if self.config.write_artifacts {
            if let Some(dir) = &self.config.output_dir {
                self.write_artifacts(dir, &inputs, &outcome)?;
            }
        }

        info!(
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            cycles = outcome.cycles.len(),
            bars_processed = outcome.bars_processed,
            bars_skipped = outcome.bars_skipped,
            "Analysis complete"
        );
        Ok(outcome)
    }

    fn log_cycle(&self, report: &CycleReport) {
        if !self.config.quiet {
            info!("{}", report);
        }
        debug!(
            expiration = %report.expiration_date,
            expiration_kind = report.expiration_kind.as_str(),
            anchor_kind = report.anchor_kind.as_str(),
            opening_price = report.opening_price,
            settle = report.expiry_settle_price,
            spread = report.spread,
            high = report.period_high,
            low = report.period_low,
            biggest_move = report.biggest_move_amount,
            "Cycle detail"
        );
    }

    fn write_artifacts(
        &self,
        dir: &std::path::Path,
        inputs: &[InputFingerprint],
        outcome: &AnalysisOutcome,
    ) -> Result<()> {
        let cycles_path = report::write_cycles_csv(dir, &outcome.cycles)?;
        let summary = RunSummary {
            config: &self.config,
            inputs,
            bars_processed: outcome.bars_processed,
            bars_skipped: outcome.bars_skipped,
            expirations_seen: outcome.expirations_seen,
            summary: outcome.summary.as_ref(),
        };
        let summary_path = report::write_summary_json(dir, &summary)?;
        info!(
            cycles = %cycles_path.display(),
            summary = %summary_path.display(),
            "Artefacts written"
        );
        Ok(())
    }
}

/// Flag days whose volume jumped more than `threshold` percent over `period` days.
pub fn run_vroc(config: &VrocConfig) -> Result<Vec<VrocSignal>> {
    let start_time = Instant::now();
    config.validate()?;

    let input = fingerprint_file(&config.volume_csv)?;
    info!(path = %input.path.display(), sha256 = %input.sha256, "Input fingerprint");

    let bars = load_volume(&config.volume_csv)
        .with_context(|| format!("Failed to load volume data from {}", config.volume_csv.display()))?;
    info!(
        period_days = config.period,
        threshold_pct = config.threshold,
        rows = bars.len(),
        "Starting VROC scan"
    );

    let signals = vroc::scan(&bars, config.period, config.threshold);
    for signal in &signals {
        info!(
            "VROC at {:.2} on {}",
            signal.vroc,
            signal.date.format(REPORT_DATE_FORMAT)
        );
    }

    if let Some(dir) = &config.output_dir {
        let path = report::write_vroc_csv(dir, &signals)?;
        info!(path = %path.display(), "VROC signals written");
    }

    info!(
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        signals = signals.len(),
        "VROC scan complete"
    );
    Ok(signals)
}
