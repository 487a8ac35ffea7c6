//! Single-pass expiration-cycle state machine.
//!
//! Each bar is processed in a fixed order:
//!
//! 1. month reset (first week clears the per-month expiration bookkeeping
//!    and any stale weekday anchors),
//! 2. anchor seeding / interval update,
//! 3. Thursday fallback capture,
//! 4. Friday expiration closure, or
//! 5. Thursday fallback closure once day-of-month passes 21 with no Friday.
//!
//! The first expiration of a run only opens the first cycle; every later
//! one closes the open cycle, resolves its settlement price, and records
//! the spread.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::bar::DayBar;
use crate::calendar::{self, DayRoles};
use crate::config::{AnalysisParameters, AnchorMode};
use crate::error::IntegrityError;
use crate::report::{AnchorKind, CycleReport, ExpirationKind};
use crate::settlement::SettlementBook;
use crate::stats::{AggregateStats, StatsSummary, round_price};
use crate::tracker::{CycleState, IntervalTracker};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// No expiration seen yet; the first one has nothing to report.
    SeekingFirstExpiration,
    /// An expiration closed; the next anchor has not been established.
    SeekingAnchor,
    /// An anchor is set and the cycle is accumulating extrema.
    InCycle,
}

/// Per-month expiration bookkeeping, cleared in the first week.
#[derive(Clone, Copy, Debug, Default)]
struct MonthState {
    found_expiration: bool,
    thursday_fallback: Option<DayBar>,
}

#[derive(Clone, Debug)]
enum Anchors {
    /// The bar after the previous expiration opens the cycle.
    NextSession { cycle: IntervalTracker },
    /// Monday of the expiration week, falling back to Tuesday.
    Weekday {
        monday: IntervalTracker,
        tuesday: IntervalTracker,
    },
}

impl Anchors {
    fn new(mode: AnchorMode) -> Self {
        match mode {
            AnchorMode::NextSession => Anchors::NextSession {
                cycle: IntervalTracker::Empty,
            },
            AnchorMode::MondayTuesday => Anchors::Weekday {
                monday: IntervalTracker::Empty,
                tuesday: IntervalTracker::Empty,
            },
        }
    }

    fn reset_month(&mut self) {
        if let Anchors::Weekday { monday, tuesday } = self {
            monday.clear();
            tuesday.clear();
        }
    }

    /// Returns true when this bar seeded a new anchor.
    fn observe(&mut self, day: &DayBar, roles: &DayRoles, phase: Phase) -> bool {
        match self {
            Anchors::NextSession { cycle } => {
                if phase == Phase::SeekingAnchor {
                    cycle.seed(*day);
                    true
                } else {
                    cycle.update(day);
                    false
                }
            }
            Anchors::Weekday { monday, tuesday } => {
                monday.update(day);
                tuesday.update(day);
                let mut seeded = false;
                if roles.monday_anchor {
                    monday.seed(*day);
                    seeded = true;
                }
                if roles.tuesday_anchor {
                    tuesday.seed(*day);
                    seeded = true;
                }
                seeded
            }
        }
    }

    /// Cycle to report at closure; Monday wins over Tuesday.
    fn closing(&self) -> Option<(AnchorKind, CycleState)> {
        match self {
            Anchors::NextSession { cycle } => {
                cycle.state().map(|state| (AnchorKind::NextSession, *state))
            }
            Anchors::Weekday { monday, tuesday } => monday
                .state()
                .map(|state| (AnchorKind::Monday, *state))
                .or_else(|| tuesday.state().map(|state| (AnchorKind::Tuesday, *state))),
        }
    }

    fn clear(&mut self) {
        match self {
            Anchors::NextSession { cycle } => cycle.clear(),
            Anchors::Weekday { monday, tuesday } => {
                monday.clear();
                tuesday.clear();
            }
        }
    }
}

/// Everything a completed pass produced.
#[derive(Clone, Debug)]
pub struct AnalysisOutcome {
    pub cycles: Vec<CycleReport>,
    pub stats: AggregateStats,
    pub summary: Option<StatsSummary>,
    pub bars_processed: usize,
    pub bars_skipped: usize,
    pub expirations_seen: usize,
}

pub struct CycleSegmenter<'a> {
    settlements: &'a SettlementBook,
    parameters: AnalysisParameters,
    phase: Phase,
    month: MonthState,
    anchors: Anchors,
    stats: AggregateStats,
    cycles: Vec<CycleReport>,
    last_date: Option<NaiveDate>,
    bars_processed: usize,
    bars_skipped: usize,
    expirations_seen: usize,
}

impl<'a> CycleSegmenter<'a> {
    pub fn new(
        settlements: &'a SettlementBook,
        parameters: AnalysisParameters,
        anchor_mode: AnchorMode,
    ) -> Self {
        Self {
            settlements,
            parameters,
            phase: Phase::SeekingFirstExpiration,
            month: MonthState::default(),
            anchors: Anchors::new(anchor_mode),
            stats: AggregateStats::new(),
            cycles: Vec::new(),
            last_date: None,
            bars_processed: 0,
            bars_skipped: 0,
            expirations_seen: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn stats(&self) -> &AggregateStats {
        &self.stats
    }

    pub fn cycles(&self) -> &[CycleReport] {
        &self.cycles
    }

    /// Feed the next bar. Returns the cycle report when this bar closed one.
    pub fn process(&mut self, day: &DayBar) -> Result<Option<CycleReport>, IntegrityError> {
        // Ordering is checked on every bar, including ones the start date drops.
        if let Some(previous) = self.last_date {
            if day.date <= previous {
                return Err(IntegrityError::UnsortedBars {
                    index: self.bars_processed + self.bars_skipped,
                    previous,
                    current: day.date,
                });
            }
        }
        self.last_date = Some(day.date);

        if day.date < self.parameters.start_date {
            self.bars_skipped += 1;
            return Ok(None);
        }
        self.bars_processed += 1;

        let roles = DayRoles::classify(day.date);

        if roles.month_reset {
            self.month = MonthState::default();
            self.anchors.reset_month();
        }

        if self.anchors.observe(day, &roles, self.phase) && self.phase == Phase::SeekingAnchor {
            self.phase = Phase::InCycle;
        }

        if roles.thursday_fallback {
            self.month.thursday_fallback = Some(*day);
        }

        if roles.friday_expiration {
            self.month.found_expiration = true;
            return self.close_cycle(day.date, ExpirationKind::Friday);
        }

        if calendar::is_past_expiration_without_friday(day.date, self.month.found_expiration) {
            let Some(thursday) = self.month.thursday_fallback else {
                debug!(
                    date = %day.date,
                    third_friday = ?calendar::third_friday(day.date),
                    "no Thursday or Friday expiration bar this month"
                );
                return Err(IntegrityError::MissingExpiration { date: day.date });
            };
            self.month.found_expiration = true;
            debug!(
                thursday = %thursday.date,
                detected_on = %day.date,
                "no Friday expiration this month; using Thursday fallback"
            );
            return self.close_cycle(thursday.date, ExpirationKind::ThursdayFallback);
        }

        Ok(None)
    }

    fn close_cycle(
        &mut self,
        expiration: NaiveDate,
        kind: ExpirationKind,
    ) -> Result<Option<CycleReport>, IntegrityError> {
        self.expirations_seen += 1;

        if self.phase == Phase::SeekingFirstExpiration {
            info!(expiration = %expiration, kind = ?kind, "First expiration found");
            self.anchors.clear();
            self.phase = Phase::SeekingAnchor;
            return Ok(None);
        }

        let settle_price = self.settlements.resolve(expiration)?;
        let (anchor_kind, state) = self
            .anchors
            .closing()
            .ok_or(IntegrityError::MissingAnchor { expiration })?;

        let spread = round_price(settle_price - state.anchor.open);
        self.stats.record(spread);

        let report = CycleReport::new(expiration, kind, anchor_kind, &state, settle_price, spread);
        debug!(
            expiration = %report.expiration_date,
            start = %report.start_date,
            spread = report.spread,
            anchor = ?anchor_kind,
            "cycle closed"
        );
        self.cycles.push(report.clone());

        self.anchors.clear();
        self.phase = Phase::SeekingAnchor;
        Ok(Some(report))
    }

    pub fn finish(self) -> AnalysisOutcome {
        let summary = self.stats.summary();
        AnalysisOutcome {
            cycles: self.cycles,
            stats: self.stats,
            summary,
            bars_processed: self.bars_processed,
            bars_skipped: self.bars_skipped,
            expirations_seen: self.expirations_seen,
        }
    }
}

/// Run the segmenter over a full, date-ascending series.
pub fn analyze(
    bars: &[DayBar],
    settlements: &SettlementBook,
    parameters: AnalysisParameters,
    anchor_mode: AnchorMode,
) -> Result<AnalysisOutcome, IntegrityError> {
    let mut segmenter = CycleSegmenter::new(settlements, parameters, anchor_mode);
    for day in bars {
        segmenter.process(day)?;
    }
    Ok(segmenter.finish())
}
