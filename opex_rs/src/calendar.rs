//! Calendar predicates for the monthly options-expiration convention.
//!
//! Standard monthly options expire on the third Friday of the month, which
//! always falls on day 15..=21. When that Friday is a market holiday the
//! expiration moves to the preceding Thursday (day 14..=20). The anchor
//! windows locate the Monday (11..=17) and Tuesday (12..=18) of the
//! expiration week. All bounds are inclusive.

use chrono::{Datelike, NaiveDate, Weekday};

pub const MONTH_RESET_WINDOW: (u32, u32) = (1, 7);
pub const MONDAY_ANCHOR_WINDOW: (u32, u32) = (11, 17);
pub const TUESDAY_ANCHOR_WINDOW: (u32, u32) = (12, 18);
pub const THURSDAY_FALLBACK_WINDOW: (u32, u32) = (14, 20);
pub const FRIDAY_EXPIRATION_WINDOW: (u32, u32) = (15, 21);

fn in_window(date: NaiveDate, window: (u32, u32)) -> bool {
    let day = date.day();
    day >= window.0 && day <= window.1
}

/// First week of the month: per-month expiration bookkeeping starts over.
pub fn is_month_reset_window(date: NaiveDate) -> bool {
    in_window(date, MONTH_RESET_WINDOW)
}

pub fn is_friday_expiration_window(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Fri && in_window(date, FRIDAY_EXPIRATION_WINDOW)
}

pub fn is_thursday_fallback_candidate(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Thu && in_window(date, THURSDAY_FALLBACK_WINDOW)
}

/// The Friday window has closed without an expiration being confirmed.
pub fn is_past_expiration_without_friday(date: NaiveDate, found_expiration: bool) -> bool {
    date.day() > FRIDAY_EXPIRATION_WINDOW.1 && !found_expiration
}

pub fn is_monday_anchor_window(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Mon && in_window(date, MONDAY_ANCHOR_WINDOW)
}

pub fn is_tuesday_anchor_window(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Tue && in_window(date, TUESDAY_ANCHOR_WINDOW)
}

/// Third Friday of the month containing `date`.
pub fn third_friday(date: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(date.year(), date.month(), Weekday::Fri, 3)
}

/// Calendar role of a single day, in the order the segmenter evaluates them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DayRoles {
    pub month_reset: bool,
    pub monday_anchor: bool,
    pub tuesday_anchor: bool,
    pub thursday_fallback: bool,
    pub friday_expiration: bool,
}

impl DayRoles {
    pub fn classify(date: NaiveDate) -> Self {
        Self {
            month_reset: is_month_reset_window(date),
            monday_anchor: is_monday_anchor_window(date),
            tuesday_anchor: is_tuesday_anchor_window(date),
            thursday_fallback: is_thursday_fallback_candidate(date),
            friday_expiration: is_friday_expiration_window(date),
        }
    }
}
