use std::fmt::{self, Write as _};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;

use crate::stats::{StatsSummary, round_price};
use crate::tracker::CycleState;
use crate::vroc::VrocSignal;

pub const REPORT_DATE_FORMAT: &str = "%d/%m/%Y";
pub const CYCLES_FILE: &str = "cycles.csv";
pub const SUMMARY_FILE: &str = "summary.json";
pub const VROC_FILE: &str = "vroc.csv";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpirationKind {
    Friday,
    ThursdayFallback,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorKind {
    NextSession,
    Monday,
    Tuesday,
}

impl ExpirationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ExpirationKind::Friday => "friday",
            ExpirationKind::ThursdayFallback => "thursday_fallback",
        }
    }
}

impl AnchorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AnchorKind::NextSession => "next_session",
            AnchorKind::Monday => "monday",
            AnchorKind::Tuesday => "tuesday",
        }
    }
}

/// One closed cycle. Prices are already rounded to 2 decimals.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CycleReport {
    pub expiration_date: NaiveDate,
    pub start_date: NaiveDate,
    pub opening_price: f64,
    pub period_high: f64,
    pub period_high_date: NaiveDate,
    pub period_low: f64,
    pub period_low_date: NaiveDate,
    pub expiry_settle_price: f64,
    pub spread: f64,
    pub biggest_move_amount: f64,
    pub biggest_move_date: NaiveDate,
    pub expiration_kind: ExpirationKind,
    pub anchor_kind: AnchorKind,
}

impl CycleReport {
    pub fn new(
        expiration: NaiveDate,
        expiration_kind: ExpirationKind,
        anchor_kind: AnchorKind,
        state: &CycleState,
        settle_price: f64,
        spread: f64,
    ) -> Self {
        Self {
            expiration_date: expiration,
            start_date: state.anchor.date,
            opening_price: round_price(state.anchor.open),
            period_high: round_price(state.period_high.high),
            period_high_date: state.period_high.date,
            period_low: round_price(state.period_low.low),
            period_low_date: state.period_low.date,
            expiry_settle_price: round_price(settle_price),
            spread,
            biggest_move_amount: round_price(state.biggest_move_amount),
            biggest_move_date: state.biggest_move.date,
            expiration_kind,
            anchor_kind,
        }
    }
}

fn fmt_date(date: NaiveDate) -> String {
    date.format(REPORT_DATE_FORMAT).to_string()
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Expiration Date: {}, Start Date: {}, Opening Price: {:.2}, High: {:.2} on {}, Low: {:.2} on {}, Expiry Price: {:.2}, Spread: {:.2}, Biggest Move (Close - Open): {:.2} on {}",
            fmt_date(self.expiration_date),
            fmt_date(self.start_date),
            self.opening_price,
            self.period_high,
            fmt_date(self.period_high_date),
            self.period_low,
            fmt_date(self.period_low_date),
            self.expiry_settle_price,
            self.spread,
            self.biggest_move_amount,
            fmt_date(self.biggest_move_date),
        )
    }
}

/// Multi-line final summary. Prints "no data" instead of dividing by zero.
pub fn render_summary(summary: Option<&StatsSummary>) -> String {
    let mut buffer = String::new();
    let _ = writeln!(buffer, "📊 Expiration cycle summary:");
    let Some(summary) = summary else {
        let _ = writeln!(buffer, "   Total expirations: 0");
        let _ = writeln!(buffer, "   no data: no cycles were closed");
        return buffer;
    };
    let _ = writeln!(buffer, "   Total expirations: {}", summary.total_cycles);
    let _ = writeln!(
        buffer,
        "   Percentage of positive spreads: {:.2}%",
        summary.pct_positive_spread
    );
    for (threshold, pct) in [
        (100, summary.pct_under_100),
        (80, summary.pct_under_80),
        (60, summary.pct_under_60),
        (40, summary.pct_under_40),
        (20, summary.pct_under_20),
    ] {
        let _ = writeln!(buffer, "   Percentage of spreads under {threshold}: {pct:.2}%");
    }
    buffer
}

/// SHA-256 of an input file, recorded so a summary names the exact data it used.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InputFingerprint {
    pub path: PathBuf,
    pub sha256: String,
}

#[derive(Debug, Serialize)]
pub struct RunSummary<'a, C: Serialize> {
    pub config: &'a C,
    pub inputs: &'a [InputFingerprint],
    pub bars_processed: usize,
    pub bars_skipped: usize,
    pub expirations_seen: usize,
    pub summary: Option<&'a StatsSummary>,
}

fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))
}

fn write_frame(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Unable to create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("Failed to write {}", path.display()))
}

pub fn write_cycles_csv(dir: &Path, cycles: &[CycleReport]) -> Result<PathBuf> {
    ensure_dir(dir)?;
    let iso = |f: fn(&CycleReport) -> NaiveDate| -> Vec<String> {
        cycles.iter().map(|c| f(c).to_string()).collect()
    };
    let num = |f: fn(&CycleReport) -> f64| -> Vec<f64> { cycles.iter().map(f).collect() };

    let mut df = df!(
        "expiration_date" => iso(|c| c.expiration_date),
        "start_date" => iso(|c| c.start_date),
        "opening_price" => num(|c| c.opening_price),
        "period_high" => num(|c| c.period_high),
        "period_high_date" => iso(|c| c.period_high_date),
        "period_low" => num(|c| c.period_low),
        "period_low_date" => iso(|c| c.period_low_date),
        "expiry_settle_price" => num(|c| c.expiry_settle_price),
        "spread" => num(|c| c.spread),
        "biggest_move_amount" => num(|c| c.biggest_move_amount),
        "biggest_move_date" => iso(|c| c.biggest_move_date),
        "expiration_kind" => cycles.iter().map(|c| c.expiration_kind.as_str()).collect::<Vec<_>>(),
        "anchor_kind" => cycles.iter().map(|c| c.anchor_kind.as_str()).collect::<Vec<_>>(),
    )
    .context("Failed to assemble cycle report frame")?;

    let path = dir.join(CYCLES_FILE);
    write_frame(&mut df, &path)?;
    Ok(path)
}

pub fn write_vroc_csv(dir: &Path, signals: &[VrocSignal]) -> Result<PathBuf> {
    ensure_dir(dir)?;
    let mut df = df!(
        "date" => signals.iter().map(|s| s.date.to_string()).collect::<Vec<_>>(),
        "vroc" => signals.iter().map(|s| s.vroc).collect::<Vec<_>>(),
    )
    .context("Failed to assemble VROC frame")?;
    let path = dir.join(VROC_FILE);
    write_frame(&mut df, &path)?;
    Ok(path)
}

pub fn write_summary_json<C: Serialize>(dir: &Path, summary: &RunSummary<'_, C>) -> Result<PathBuf> {
    ensure_dir(dir)?;
    let path = dir.join(SUMMARY_FILE);
    let body = serde_json::to_string_pretty(summary).context("Failed to serialize run summary")?;
    fs::write(&path, body).with_context(|| format!("Unable to write {}", path.display()))?;
    Ok(path)
}
