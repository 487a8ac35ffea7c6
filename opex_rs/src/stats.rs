use serde::Serialize;

/// Absolute-spread ladder, widest first.
pub const SPREAD_THRESHOLDS: [f64; 5] = [100.0, 80.0, 60.0, 40.0, 20.0];

/// Round half away from zero to 2 decimal places.
///
/// Used for spreads and for every reported price so that equal inputs
/// always print and compare equal.
pub fn round_price(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Cumulative counters across closed cycles.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AggregateStats {
    total: usize,
    positive: usize,
    under: [usize; SPREAD_THRESHOLDS.len()],
}

impl AggregateStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, spread: f64) {
        self.total += 1;
        if spread > 0.0 {
            self.positive += 1;
        }
        let absolute = spread.abs();
        for (count, threshold) in self.under.iter_mut().zip(SPREAD_THRESHOLDS) {
            if absolute < threshold {
                *count += 1;
            }
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn positive(&self) -> usize {
        self.positive
    }

    pub fn bucket_counts(&self) -> [(f64, usize); SPREAD_THRESHOLDS.len()] {
        let mut out = [(0.0, 0); SPREAD_THRESHOLDS.len()];
        for (slot, (threshold, count)) in out
            .iter_mut()
            .zip(SPREAD_THRESHOLDS.iter().zip(self.under.iter()))
        {
            *slot = (*threshold, *count);
        }
        out
    }

    /// Percentages over all recorded cycles; `None` when nothing was recorded.
    pub fn summary(&self) -> Option<StatsSummary> {
        if self.total == 0 {
            return None;
        }
        let pct = |count: usize| count as f64 / self.total as f64 * 100.0;
        Some(StatsSummary {
            total_cycles: self.total,
            pct_positive_spread: pct(self.positive),
            pct_under_100: pct(self.under[0]),
            pct_under_80: pct(self.under[1]),
            pct_under_60: pct(self.under[2]),
            pct_under_40: pct(self.under[3]),
            pct_under_20: pct(self.under[4]),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatsSummary {
    pub total_cycles: usize,
    pub pct_positive_spread: f64,
    pub pct_under_100: f64,
    pub pct_under_80: f64,
    pub pct_under_60: f64,
    pub pct_under_40: f64,
    pub pct_under_20: f64,
}
