mod common;

use common::{book, date, synthetic_bar, weekday_bars};
use opex_rs::{
    AnalysisParameters, AnchorKind, AnchorMode, CycleSegmenter, ExpirationKind, IntegrityError,
    SettlementError, analyze,
};

fn from_2000() -> AnalysisParameters {
    AnalysisParameters::default()
}

#[test]
fn single_expiration_bar_yields_no_cycles() {
    let bars = weekday_bars(date(2024, 1, 19), date(2024, 1, 19), &[]);
    let outcome = analyze(&bars, &book(&[]), from_2000(), AnchorMode::NextSession)
        .expect("analysis succeeds");
    assert!(outcome.cycles.is_empty());
    assert!(outcome.summary.is_none());
    assert_eq!(outcome.expirations_seen, 1);
    assert_eq!(outcome.bars_processed, 1);
}

#[test]
fn next_session_cycle_opens_after_previous_expiration() {
    let bars = weekday_bars(date(2024, 1, 2), date(2024, 2, 29), &[]);
    let settlements = book(&[(date(2024, 2, 16), 4100.25)]);
    let outcome = analyze(&bars, &settlements, from_2000(), AnchorMode::NextSession)
        .expect("analysis succeeds");

    assert_eq!(outcome.cycles.len(), 1);
    let cycle = &outcome.cycles[0];
    assert_eq!(cycle.expiration_date, date(2024, 2, 16));
    assert_eq!(cycle.expiration_kind, ExpirationKind::Friday);
    assert_eq!(cycle.anchor_kind, AnchorKind::NextSession);
    assert_eq!(cycle.start_date, date(2024, 1, 22));
    assert_eq!(cycle.opening_price, 4021.0);
    assert_eq!(cycle.period_high, 4051.0);
    assert_eq!(cycle.period_high_date, date(2024, 2, 16));
    assert_eq!(cycle.period_low, 4016.0);
    assert_eq!(cycle.period_low_date, date(2024, 1, 22));
    assert_eq!(cycle.biggest_move_amount, 1.0);
    assert_eq!(cycle.biggest_move_date, date(2024, 1, 22));
    assert_eq!(cycle.expiry_settle_price, 4100.25);
    assert_eq!(cycle.spread, 79.25);

    let summary = outcome.summary.expect("one cycle recorded");
    assert_eq!(summary.total_cycles, 1);
    assert_eq!(summary.pct_positive_spread, 100.0);
    assert_eq!(summary.pct_under_100, 100.0);
    assert_eq!(summary.pct_under_80, 100.0);
    assert_eq!(summary.pct_under_60, 0.0);
    assert_eq!(summary.pct_under_20, 0.0);
}

#[test]
fn monday_of_expiration_week_anchors_the_cycle() {
    let bars = weekday_bars(date(2024, 1, 2), date(2024, 2, 29), &[]);
    let settlements = book(&[(date(2024, 2, 16), 4100.25)]);
    let outcome = analyze(&bars, &settlements, from_2000(), AnchorMode::MondayTuesday)
        .expect("analysis succeeds");

    assert_eq!(outcome.cycles.len(), 1);
    let cycle = &outcome.cycles[0];
    assert_eq!(cycle.anchor_kind, AnchorKind::Monday);
    assert_eq!(cycle.start_date, date(2024, 2, 12));
    assert_eq!(cycle.opening_price, 4042.0);
    assert_eq!(cycle.period_low, 4037.0);
    assert_eq!(cycle.period_low_date, date(2024, 2, 12));
    assert_eq!(cycle.period_high, 4051.0);
    assert_eq!(cycle.spread, 58.25);
}

#[test]
fn tuesday_anchor_covers_a_missing_monday() {
    let bars = weekday_bars(date(2024, 1, 2), date(2024, 2, 29), &[date(2024, 2, 12)]);
    let settlements = book(&[(date(2024, 2, 16), 4100.25)]);
    let outcome = analyze(&bars, &settlements, from_2000(), AnchorMode::MondayTuesday)
        .expect("analysis succeeds");

    let cycle = &outcome.cycles[0];
    assert_eq!(cycle.anchor_kind, AnchorKind::Tuesday);
    assert_eq!(cycle.start_date, date(2024, 2, 13));
    assert_eq!(cycle.opening_price, 4043.0);
    assert_eq!(cycle.period_low, 4038.0);
    assert_eq!(cycle.spread, 57.25);
}

#[test]
fn missing_monday_and_tuesday_is_a_missing_anchor() {
    let bars = weekday_bars(
        date(2024, 1, 2),
        date(2024, 2, 29),
        &[date(2024, 2, 12), date(2024, 2, 13)],
    );
    let settlements = book(&[(date(2024, 2, 16), 4100.25)]);
    let err = analyze(&bars, &settlements, from_2000(), AnchorMode::MondayTuesday).unwrap_err();
    assert_eq!(
        err,
        IntegrityError::MissingAnchor {
            expiration: date(2024, 2, 16)
        }
    );
}

#[test]
fn thursday_fallback_closes_once_friday_window_passes() {
    let bars = weekday_bars(date(2024, 1, 2), date(2024, 3, 29), &[date(2024, 2, 16)]);
    let settlements = book(&[(date(2024, 2, 15), 4090.0), (date(2024, 3, 15), 4080.5)]);
    let outcome = analyze(&bars, &settlements, from_2000(), AnchorMode::NextSession)
        .expect("analysis succeeds");

    assert_eq!(outcome.cycles.len(), 2);
    let fallback = &outcome.cycles[0];
    assert_eq!(fallback.expiration_date, date(2024, 2, 15));
    assert_eq!(fallback.expiration_kind, ExpirationKind::ThursdayFallback);
    assert_eq!(fallback.spread, 69.0);
    // The detection day (Feb 22) still belongs to the closing cycle.
    assert_eq!(fallback.period_high, 4057.0);
    assert_eq!(fallback.period_high_date, date(2024, 2, 22));

    let next = &outcome.cycles[1];
    assert_eq!(next.start_date, date(2024, 2, 23));
    assert_eq!(next.opening_price, 4053.0);
    assert_eq!(next.expiration_date, date(2024, 3, 15));
    assert_eq!(next.expiration_kind, ExpirationKind::Friday);
    assert_eq!(next.spread, 27.5);
}

#[test]
fn month_without_thursday_or_friday_is_fatal() {
    let bars = weekday_bars(
        date(2024, 1, 2),
        date(2024, 2, 29),
        &[date(2024, 2, 15), date(2024, 2, 16)],
    );
    let settlements = book(&[(date(2024, 2, 16), 4100.25)]);
    for mode in [AnchorMode::NextSession, AnchorMode::MondayTuesday] {
        let err = analyze(&bars, &settlements, from_2000(), mode).unwrap_err();
        assert_eq!(
            err,
            IntegrityError::MissingExpiration {
                date: date(2024, 2, 22)
            }
        );
        assert_eq!(err.date(), date(2024, 2, 22));
    }
}

#[test]
fn unresolved_settlement_aborts_without_recording() {
    let bars = weekday_bars(date(2024, 1, 2), date(2024, 2, 29), &[]);

    let missing = book(&[(date(2024, 2, 15), 4090.0)]);
    let mut segmenter = CycleSegmenter::new(&missing, from_2000(), AnchorMode::NextSession);
    let err = bars
        .iter()
        .map(|day| segmenter.process(day))
        .find_map(Result::err)
        .expect("settlement lookup fails");
    assert_eq!(
        err,
        IntegrityError::Settlement(SettlementError::NotFound {
            date: date(2024, 2, 16)
        })
    );
    assert_eq!(segmenter.stats().total(), 0);
    assert!(segmenter.cycles().is_empty());

    let duplicated = book(&[(date(2024, 2, 16), 4100.0), (date(2024, 2, 16), 4101.0)]);
    let err = analyze(&bars, &duplicated, from_2000(), AnchorMode::MondayTuesday).unwrap_err();
    assert_eq!(
        err,
        IntegrityError::Settlement(SettlementError::Ambiguous {
            date: date(2024, 2, 16),
            matches: 2
        })
    );
}

#[test]
fn duplicate_settlement_on_an_unused_date_is_harmless() {
    let bars = weekday_bars(date(2024, 1, 2), date(2024, 2, 29), &[]);
    let settlements = book(&[
        (date(2024, 2, 16), 4100.25),
        (date(2024, 2, 9), 1.0),
        (date(2024, 2, 9), 2.0),
    ]);
    let outcome = analyze(&bars, &settlements, from_2000(), AnchorMode::NextSession)
        .expect("analysis succeeds");
    assert_eq!(outcome.cycles.len(), 1);
}

#[test]
fn series_starting_after_third_friday_needs_an_expiration_bar() {
    let bars = weekday_bars(date(2024, 1, 22), date(2024, 3, 29), &[]);
    let settlements = book(&[(date(2024, 3, 15), 4100.0)]);
    for mode in [AnchorMode::NextSession, AnchorMode::MondayTuesday] {
        let err = analyze(&bars, &settlements, from_2000(), mode).unwrap_err();
        assert_eq!(
            err,
            IntegrityError::MissingExpiration {
                date: date(2024, 1, 22)
            }
        );
    }
}

#[test]
fn start_date_filter_matches_a_trimmed_series() {
    let all = weekday_bars(date(2024, 1, 2), date(2024, 3, 29), &[]);
    let trimmed = weekday_bars(date(2024, 1, 8), date(2024, 3, 29), &[]);
    let settlements = book(&[(date(2024, 2, 16), 4100.25), (date(2024, 3, 15), 4100.0)]);
    let parameters = AnalysisParameters {
        start_date: date(2024, 1, 8),
    };

    let filtered = analyze(&all, &settlements, parameters, AnchorMode::NextSession)
        .expect("filtered analysis succeeds");
    let direct = analyze(&trimmed, &settlements, from_2000(), AnchorMode::NextSession)
        .expect("direct analysis succeeds");

    assert_eq!(filtered.bars_skipped, 4);
    assert_eq!(filtered.bars_processed, direct.bars_processed);
    assert_eq!(filtered.cycles, direct.cycles);
    assert_eq!(filtered.cycles.len(), 2);
}

#[test]
fn weekday_anchor_survives_a_thursday_fallback_close() {
    let bars = weekday_bars(date(2024, 1, 2), date(2024, 3, 29), &[date(2024, 2, 16)]);
    let settlements = book(&[(date(2024, 2, 15), 4090.0), (date(2024, 3, 15), 4080.5)]);
    let outcome = analyze(&bars, &settlements, from_2000(), AnchorMode::MondayTuesday)
        .expect("analysis succeeds");

    assert_eq!(outcome.cycles.len(), 2);
    let fallback = &outcome.cycles[0];
    assert_eq!(fallback.anchor_kind, AnchorKind::Monday);
    assert_eq!(fallback.start_date, date(2024, 2, 12));
    assert_eq!(fallback.expiration_kind, ExpirationKind::ThursdayFallback);
    assert_eq!(fallback.expiration_date, date(2024, 2, 15));
    assert_eq!(fallback.spread, 48.0);
    // Bars up to the detection day extend the cycle past the Thursday.
    assert_eq!(fallback.period_high, 4057.0);
    assert_eq!(fallback.period_high_date, date(2024, 2, 22));
    assert!(
        fallback.to_string().contains("High: 4057.00 on 22/02/2024"),
        "{fallback}"
    );

    let next = &outcome.cycles[1];
    assert_eq!(next.anchor_kind, AnchorKind::Monday);
    assert_eq!(next.start_date, date(2024, 3, 11));
    assert_eq!(next.opening_price, 4070.0);
    assert_eq!(next.spread, 10.5);
}

#[test]
fn stale_monday_from_a_previous_month_is_not_reused() {
    let bars: Vec<_> = weekday_bars(date(2024, 1, 2), date(2024, 2, 12), &[])
        .into_iter()
        .chain(weekday_bars(
            date(2024, 3, 1),
            date(2024, 3, 29),
            &[date(2024, 3, 11), date(2024, 3, 12)],
        ))
        .collect();
    let settlements = book(&[(date(2024, 3, 15), 4100.0)]);
    let err = analyze(&bars, &settlements, from_2000(), AnchorMode::MondayTuesday).unwrap_err();
    assert_eq!(
        err,
        IntegrityError::MissingAnchor {
            expiration: date(2024, 3, 15)
        }
    );
}

#[test]
fn unsorted_input_is_rejected_with_position() {
    let mut bars = weekday_bars(date(2024, 1, 2), date(2024, 1, 10), &[]);
    bars.swap(3, 4);
    let err = analyze(&bars, &book(&[]), from_2000(), AnchorMode::NextSession).unwrap_err();
    assert_eq!(
        err,
        IntegrityError::UnsortedBars {
            index: 4,
            previous: date(2024, 1, 8),
            current: date(2024, 1, 5),
        }
    );
}

#[test]
fn ordering_is_checked_before_the_start_date_filter() {
    let bars = vec![
        synthetic_bar(date(2024, 1, 10)),
        synthetic_bar(date(2024, 1, 3)),
    ];
    let parameters = AnalysisParameters {
        start_date: date(2024, 1, 5),
    };
    let err = analyze(&bars, &book(&[]), parameters, AnchorMode::NextSession).unwrap_err();
    assert_eq!(
        err,
        IntegrityError::UnsortedBars {
            index: 1,
            previous: date(2024, 1, 10),
            current: date(2024, 1, 3),
        }
    );
}
