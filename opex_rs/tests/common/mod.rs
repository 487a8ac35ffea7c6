#![allow(dead_code)]

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, Weekday};
use opex_rs::{DayBar, SettlementBook, SettlementRecord};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn base_date() -> NaiveDate {
    date(2024, 1, 1)
}

/// Deterministic bar: open rises one point per calendar day from 4000 on
/// 2024-01-01, every body is +1, and the range is open +/- 5.
pub fn synthetic_bar(day: NaiveDate) -> DayBar {
    let offset = (day - base_date()).num_days() as f64;
    let open = 4000.0 + offset;
    DayBar::new(day, open, open + 5.0, open - 5.0, open + 1.0)
}

/// Weekday bars over `[from, to]`, minus the dates in `skip`.
pub fn weekday_bars(from: NaiveDate, to: NaiveDate, skip: &[NaiveDate]) -> Vec<DayBar> {
    from.iter_days()
        .take_while(|day| *day <= to)
        .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
        .filter(|day| !skip.contains(day))
        .map(synthetic_bar)
        .collect()
}

pub fn book(entries: &[(NaiveDate, f64)]) -> SettlementBook {
    SettlementBook::from_records(
        entries
            .iter()
            .map(|(day, price)| SettlementRecord::new(*day, *price)),
    )
}

pub fn prices_csv(bars: &[DayBar]) -> String {
    let mut out = String::from("Date,Open,High,Low,Close\n");
    for bar in bars {
        let _ = writeln!(
            out,
            "{},{},{},{},{}",
            bar.date, bar.open, bar.high, bar.low, bar.close
        );
    }
    out
}

pub fn settlements_csv(entries: &[(NaiveDate, f64)]) -> String {
    let mut out = String::from("Date,SettlePrice\n");
    for (day, price) in entries {
        let _ = writeln!(out, "{day},{price}");
    }
    out
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write fixture");
    path
}
