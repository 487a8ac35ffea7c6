use crate::bar::DayBar;

/// Running extrema for one open cycle.
///
/// Every field holds the bar the value was observed on so reports can name
/// the day alongside the price.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CycleState {
    pub anchor: DayBar,
    pub period_high: DayBar,
    pub period_low: DayBar,
    pub biggest_move: DayBar,
    /// Signed close - open of `biggest_move`.
    pub biggest_move_amount: f64,
}

impl CycleState {
    pub fn seed(day: DayBar) -> Self {
        Self {
            anchor: day,
            period_high: day,
            period_low: day,
            biggest_move: day,
            biggest_move_amount: day.body(),
        }
    }

    /// Strict comparisons keep the earliest day on ties.
    pub fn update(&mut self, day: &DayBar) {
        if day.high > self.period_high.high {
            self.period_high = *day;
        }
        if day.low < self.period_low.low {
            self.period_low = *day;
        }
        let body = day.body();
        if body.abs() > self.biggest_move_amount.abs() {
            self.biggest_move = *day;
            self.biggest_move_amount = body;
        }
    }
}

/// Interval tracker for a single anchor candidate.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum IntervalTracker {
    #[default]
    Empty,
    Seeded(CycleState),
}

impl IntervalTracker {
    pub fn seed(&mut self, day: DayBar) {
        *self = IntervalTracker::Seeded(CycleState::seed(day));
    }

    /// No-op until seeded.
    pub fn update(&mut self, day: &DayBar) {
        if let IntervalTracker::Seeded(state) = self {
            state.update(day);
        }
    }

    pub fn clear(&mut self) {
        *self = IntervalTracker::Empty;
    }

    pub fn state(&self) -> Option<&CycleState> {
        match self {
            IntervalTracker::Empty => None,
            IntervalTracker::Seeded(state) => Some(state),
        }
    }
}
