use chrono::NaiveDate;
use serde::Serialize;

use crate::bar::VolumeBar;

/// A day whose volume rate of change cleared the threshold.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct VrocSignal {
    pub date: NaiveDate,
    pub vroc: f64,
}

/// Percent change of `volumes[index]` over `volumes[index - period]`.
///
/// `None` until a full lookback is available, or when the reference volume
/// is zero.
pub fn volume_rate_of_change(volumes: &[f64], index: usize, period: usize) -> Option<f64> {
    if period == 0 || index < period || index >= volumes.len() {
        return None;
    }
    let reference = volumes[index - period];
    if reference == 0.0 {
        return None;
    }
    Some((volumes[index] - reference) / reference * 100.0)
}

/// Every day with VROC strictly above `threshold`, in date order.
pub fn scan(bars: &[VolumeBar], period: usize, threshold: f64) -> Vec<VrocSignal> {
    let volumes: Vec<f64> = bars.iter().map(|bar| bar.total_volume).collect();
    bars.iter()
        .enumerate()
        .filter_map(|(i, bar)| {
            volume_rate_of_change(&volumes, i, period)
                .filter(|vroc| *vroc > threshold)
                .map(|vroc| VrocSignal {
                    date: bar.date,
                    vroc,
                })
        })
        .collect()
}
