use chrono::NaiveDate;
use serde::Serialize;

/// One daily OHLC bar of the index series.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DayBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl DayBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
        }
    }

    /// Signed intraday move (close - open).
    pub fn body(&self) -> f64 {
        self.close - self.open
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SettlementRecord {
    pub date: NaiveDate,
    pub settle_price: f64,
}

impl SettlementRecord {
    pub fn new(date: NaiveDate, settle_price: f64) -> Self {
        Self { date, settle_price }
    }
}

/// Daily option volume row used by the VROC scan.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct VolumeBar {
    pub date: NaiveDate,
    pub total_volume: f64,
    pub put_call_ratio: Option<f64>,
    pub put_volume: Option<f64>,
    pub call_volume: Option<f64>,
}

impl VolumeBar {
    pub fn new(date: NaiveDate, total_volume: f64) -> Self {
        Self {
            date,
            total_volume,
            put_call_ratio: None,
            put_volume: None,
            call_volume: None,
        }
    }
}
