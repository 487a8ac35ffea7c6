use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use itertools::Itertools;
use polars::prelude::*;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::bar::{DayBar, SettlementRecord, VolumeBar};
use crate::config::parse_date;
use crate::report::InputFingerprint;

const DATE_ALIASES: &[&str] = &["Date", "date", "timestamp", "TradeDate"];
const OPEN_ALIASES: &[&str] = &["Open"];
const HIGH_ALIASES: &[&str] = &["High"];
const LOW_ALIASES: &[&str] = &["Low"];
const CLOSE_ALIASES: &[&str] = &["Close"];
const SETTLE_ALIASES: &[&str] = &["SettlePrice", "settle_price", "Settle"];
const VOLUME_ALIASES: &[&str] = &["TotalVolume", "total_volume", "Volume"];
const PC_RATIO_ALIASES: &[&str] = &["PCRatio", "pc_ratio", "put_call_ratio"];
const PUT_VOLUME_ALIASES: &[&str] = &["PVolume", "put_volume"];
const CALL_VOLUME_ALIASES: &[&str] = &["CVolume", "call_volume"];

fn read_frame(path: &Path) -> Result<DataFrame> {
    // Dates stay as strings; exported files mix layouts that polars would
    // otherwise guess differently per file.
    let lazy = LazyCsvReader::new(path)
        .has_header(true)
        .with_ignore_errors(true)
        .finish()
        .with_context(|| format!("Failed to initialize CSV reader for {}", path.display()))?;
    lazy.collect()
        .with_context(|| format!("Failed to collect columnar data from {}", path.display()))
}

fn find_column<'a>(df: &'a DataFrame, aliases: &[&str]) -> Option<&'a Series> {
    df.get_columns().iter().find(|series| {
        aliases
            .iter()
            .any(|alias| series.name().eq_ignore_ascii_case(alias))
    })
}

fn require_column<'a>(df: &'a DataFrame, aliases: &[&str], path: &Path) -> Result<&'a Series> {
    find_column(df, aliases).with_context(|| {
        format!(
            "Missing required column '{}' in {}",
            aliases.join("' / '"),
            path.display()
        )
    })
}

fn series_to_f64(series: &Series) -> Result<Vec<f64>> {
    match series.dtype() {
        DataType::Float64 => Ok(series
            .f64()
            .context("Failed to interpret as f64")?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect()),
        DataType::Float32 => Ok(series
            .f32()
            .context("Failed to interpret as f32")?
            .into_iter()
            .map(|v| v.map(|x| x as f64).unwrap_or(f64::NAN))
            .collect()),
        DataType::Int64 => Ok(series
            .i64()
            .context("Failed to interpret as i64")?
            .into_iter()
            .map(|v| v.map(|x| x as f64).unwrap_or(f64::NAN))
            .collect()),
        DataType::Int32 => Ok(series
            .i32()
            .context("Failed to interpret as i32")?
            .into_iter()
            .map(|v| v.map(|x| x as f64).unwrap_or(f64::NAN))
            .collect()),
        DataType::UInt64 => Ok(series
            .u64()
            .context("Failed to interpret as u64")?
            .into_iter()
            .map(|v| v.map(|x| x as f64).unwrap_or(f64::NAN))
            .collect()),
        DataType::UInt32 => Ok(series
            .u32()
            .context("Failed to interpret as u32")?
            .into_iter()
            .map(|v| v.map(|x| x as f64).unwrap_or(f64::NAN))
            .collect()),
        // A column that is entirely empty is inferred as strings.
        DataType::String => Ok(series
            .str()
            .context("Failed to interpret as string")?
            .into_iter()
            .map(|v| {
                v.and_then(|raw| raw.trim().parse::<f64>().ok())
                    .unwrap_or(f64::NAN)
            })
            .collect()),
        other => Err(anyhow!(
            "Unsupported numeric dtype for {}: {other:?}",
            series.name()
        )),
    }
}

fn series_to_dates(series: &Series, path: &Path) -> Result<Vec<NaiveDate>> {
    let as_text = series
        .cast(&DataType::String)
        .with_context(|| format!("Failed to read '{}' as text", series.name()))?;
    let ca = as_text
        .str()
        .with_context(|| format!("Column '{}' is not textual", series.name()))?;
    ca.into_iter()
        .enumerate()
        .map(|(row, value)| {
            let raw = value.with_context(|| {
                format!("Empty date at row {} of {}", row + 1, path.display())
            })?;
            parse_date(raw)
                .with_context(|| format!("Bad date at row {} of {}", row + 1, path.display()))
        })
        .collect()
}

fn finite_column(series: &Series, path: &Path) -> Result<Vec<f64>> {
    let values = series_to_f64(series)?;
    if let Some(row) = values.iter().position(|v| !v.is_finite()) {
        bail!(
            "Missing or non-finite '{}' at row {} of {}",
            series.name(),
            row + 1,
            path.display()
        );
    }
    Ok(values)
}

fn optional_column(df: &DataFrame, aliases: &[&str]) -> Result<Option<Vec<f64>>> {
    find_column(df, aliases).map(series_to_f64).transpose()
}

/// Load daily OHLC bars, sorted ascending by date.
pub fn load_day_bars(path: &Path) -> Result<Vec<DayBar>> {
    let df = read_frame(path)?;
    let dates = series_to_dates(require_column(&df, DATE_ALIASES, path)?, path)?;
    let open = finite_column(require_column(&df, OPEN_ALIASES, path)?, path)?;
    let high = finite_column(require_column(&df, HIGH_ALIASES, path)?, path)?;
    let low = finite_column(require_column(&df, LOW_ALIASES, path)?, path)?;
    let close = finite_column(require_column(&df, CLOSE_ALIASES, path)?, path)?;

    let mut bars: Vec<DayBar> = dates
        .into_iter()
        .enumerate()
        .map(|(i, date)| DayBar::new(date, open[i], high[i], low[i], close[i]))
        .collect();
    bars.sort_by_key(|bar| bar.date);

    if let Some((first, _)) = bars.iter().tuple_windows().find(|(a, b)| a.date == b.date) {
        bail!(
            "Duplicate day bar for {} in {}",
            first.date,
            path.display()
        );
    }

    info!(path = %path.display(), rows = bars.len(), "Loaded day bars");
    Ok(bars)
}

/// Load settlement prices. Duplicate dates are kept; they only fail when that
/// expiration is actually resolved.
pub fn load_settlements(path: &Path) -> Result<Vec<SettlementRecord>> {
    let df = read_frame(path)?;
    let dates = series_to_dates(require_column(&df, DATE_ALIASES, path)?, path)?;
    let prices = finite_column(require_column(&df, SETTLE_ALIASES, path)?, path)?;

    let mut records: Vec<SettlementRecord> = dates
        .into_iter()
        .zip(prices)
        .map(|(date, price)| SettlementRecord::new(date, price))
        .collect();
    records.sort_by_key(|record| record.date);

    info!(path = %path.display(), rows = records.len(), "Loaded settlements");
    Ok(records)
}

/// Load daily volume bars for the VROC scan, sorted ascending by date.
pub fn load_volume(path: &Path) -> Result<Vec<VolumeBar>> {
    let df = read_frame(path)?;
    let dates = series_to_dates(require_column(&df, DATE_ALIASES, path)?, path)?;
    let volume = finite_column(require_column(&df, VOLUME_ALIASES, path)?, path)?;
    let pc_ratio = optional_column(&df, PC_RATIO_ALIASES)?;
    let put_volume = optional_column(&df, PUT_VOLUME_ALIASES)?;
    let call_volume = optional_column(&df, CALL_VOLUME_ALIASES)?;

    let pick = |column: &Option<Vec<f64>>, i: usize| {
        column
            .as_ref()
            .map(|values| values[i])
            .filter(|v| v.is_finite())
    };

    let mut bars: Vec<VolumeBar> = dates
        .into_iter()
        .enumerate()
        .map(|(i, date)| VolumeBar {
            put_call_ratio: pick(&pc_ratio, i),
            put_volume: pick(&put_volume, i),
            call_volume: pick(&call_volume, i),
            ..VolumeBar::new(date, volume[i])
        })
        .collect();
    bars.sort_by_key(|bar| bar.date);

    if let Some((first, _)) = bars.iter().tuple_windows().find(|(a, b)| a.date == b.date) {
        bail!(
            "Duplicate volume row for {} in {}",
            first.date,
            path.display()
        );
    }

    info!(path = %path.display(), rows = bars.len(), "Loaded volume bars");
    Ok(bars)
}

/// SHA-256 of the raw file bytes.
pub fn fingerprint_file(path: &Path) -> Result<InputFingerprint> {
    let mut file = File::open(path)
        .with_context(|| format!("Unable to open {} for fingerprinting", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let read = file
            .read(&mut buffer)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(InputFingerprint {
        path: path.to_path_buf(),
        sha256: hex::encode(hasher.finalize()),
    })
}
