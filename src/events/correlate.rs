//! Match a detected break date against an event catalog.
//!
//! Purpose
//! -------
//! Select the catalog events that fall within a symmetric window of days
//! around the break date, so a report can name plausible causes.
//!
//! Key behaviors
//! -------------
//! - The window is inclusive on both sides:
//!   `break_date − W ≤ event.date ≤ break_date + W`.
//! - The result preserves catalog order; the catalog is only borrowed.
//! - No match is a valid, empty result.
//! - Window bounds saturate at the representable date range instead of
//!   overflowing.
use chrono::{Duration, NaiveDate};

use crate::{
    changepoint::errors::{ChangePointError, ChangePointResult},
    events::catalog::Event,
};

/// Half-width, in days, used by the reference analysis.
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Symmetric correlation window in whole days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CorrelationWindow {
    days: i64,
}

impl CorrelationWindow {
    /// Errors
    /// ------
    /// - `InvalidWindow` for a negative day count.
    pub fn days(days: i64) -> ChangePointResult<Self> {
        if days < 0 {
            return Err(ChangePointError::InvalidWindow { days });
        }
        Ok(CorrelationWindow { days })
    }

    pub fn as_days(&self) -> i64 {
        self.days
    }

    /// Inclusive `[start, end]` around `center`.
    pub fn bounds(&self, center: NaiveDate) -> (NaiveDate, NaiveDate) {
        let Some(span) = Duration::try_days(self.days) else {
            return (NaiveDate::MIN, NaiveDate::MAX);
        };
        let start = center.checked_sub_signed(span).unwrap_or(NaiveDate::MIN);
        let end = center.checked_add_signed(span).unwrap_or(NaiveDate::MAX);
        (start, end)
    }
}

impl Default for CorrelationWindow {
    fn default() -> Self {
        CorrelationWindow { days: DEFAULT_WINDOW_DAYS }
    }
}

/// Events near a break date.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CorrelationResult {
    pub break_date: NaiveDate,
    pub window: CorrelationWindow,
    /// Matching events in catalog order.
    pub events: Vec<Event>,
}

impl CorrelationResult {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Signed days from the break date to `event` (negative = before).
    pub fn offset_days(&self, event: &Event) -> i64 {
        (event.date - self.break_date).num_days()
    }

    /// Matching event closest to the break date; the earlier catalog entry
    /// wins ties.
    pub fn nearest(&self) -> Option<&Event> {
        self.events.iter().min_by_key(|e| self.offset_days(e).abs())
    }
}

/// Events of `events` within `window` of `break_date`.
pub fn correlate(
    break_date: NaiveDate, events: &[Event], window: CorrelationWindow,
) -> ChangePointResult<CorrelationResult> {
    let (start, end) = window.bounds(break_date);
    let matched = events.iter().filter(|e| start <= e.date && e.date <= end).cloned().collect();
    Ok(CorrelationResult { break_date, window, events: matched })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn catalog() -> Vec<Event> {
        vec![
            Event::new(date(2019, 6, 15), "Event A", "Trade tensions escalate"),
            Event::new(date(2020, 2, 15), "Event B", "Global pandemic impacts demand"),
            Event::new(date(2020, 12, 1), "Event C", "OPEC announces production cuts"),
            Event::new(date(2021, 3, 1), "Event D", "Geopolitical conflict disrupts supply"),
        ]
    }

    #[test]
    // Purpose
    // -------
    // Events exactly `W` days away on either side are included; `W + 1` is
    // not.
    fn window_is_inclusive_on_both_sides() {
        let center = date(2020, 6, 1);
        let events = vec![
            Event::new(center - Duration::days(31), "early", ""),
            Event::new(center - Duration::days(30), "lower edge", ""),
            Event::new(center + Duration::days(30), "upper edge", ""),
            Event::new(center + Duration::days(31), "late", ""),
        ];
        let result = correlate(center, &events, CorrelationWindow::default()).unwrap();
        let names: Vec<&str> = result.events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["lower edge", "upper edge"]);
    }

    #[test]
    // Purpose
    // -------
    // A zero-day window matches only same-day events; a miss is empty, not
    // an error.
    fn zero_window_and_empty_result() {
        let events = catalog();
        let window = CorrelationWindow::days(0).unwrap();
        let hit = correlate(date(2020, 2, 15), &events, window).unwrap();
        assert_eq!(hit.len(), 1);
        let miss = correlate(date(2020, 2, 14), &events, window).unwrap();
        assert!(miss.is_empty());
        assert_eq!(miss.break_date, date(2020, 2, 14));
    }

    #[test]
    fn negative_window_is_rejected() {
        assert_eq!(
            CorrelationWindow::days(-1).unwrap_err(),
            ChangePointError::InvalidWindow { days: -1 }
        );
    }

    #[test]
    // Purpose
    // -------
    // Offsets are signed and `nearest` picks the smallest absolute offset.
    fn offsets_and_nearest() {
        let events = catalog();
        let window = CorrelationWindow::days(120).unwrap();
        let result = correlate(date(2020, 12, 20), &events, window).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.offset_days(&result.events[0]), -19);
        assert_eq!(result.offset_days(&result.events[1]), 71);
        assert_eq!(result.nearest().unwrap().name, "Event C");
    }

    #[test]
    fn huge_window_saturates() {
        for days in [1_000_000_000, i64::MAX] {
            let window = CorrelationWindow::days(days).unwrap();
            let result = correlate(date(2020, 1, 1), &catalog(), window).unwrap();
            assert_eq!(result.len(), 4);
        }
    }

    fn arb_events() -> impl Strategy<Value = Vec<Event>> {
        prop::collection::vec((0i64..400, "[A-Z][a-z]{0,6}"), 0..20).prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, (offset, name))| {
                    Event::new(date(2020, 1, 1) + Duration::days(offset), format!("{name}{i}"), "")
                })
                .collect()
        })
    }

    proptest! {
        // Purpose
        // -------
        // Matching is a pure filter: permuting the catalog permutes nothing
        // but the order, and the result is a subsequence of the catalog.
        #[test]
        fn correlate_is_an_order_preserving_filter(
            events in arb_events(),
            center_offset in 0i64..400,
            days in 0i64..60,
            rotate in 0usize..20,
        ) {
            let center = date(2020, 1, 1) + Duration::days(center_offset);
            let window = CorrelationWindow::days(days).unwrap();
            let result = correlate(center, &events, window).unwrap();

            let mut permuted = events.clone();
            if !permuted.is_empty() {
                let r = rotate % permuted.len();
                permuted.rotate_left(r);
                permuted.reverse();
            }
            let other = correlate(center, &permuted, window).unwrap();
            let a: BTreeSet<&str> = result.events.iter().map(|e| e.name.as_str()).collect();
            let b: BTreeSet<&str> = other.events.iter().map(|e| e.name.as_str()).collect();
            prop_assert_eq!(a, b);

            let mut catalog_iter = events.iter();
            for matched in &result.events {
                prop_assert!(catalog_iter.any(|e| e == matched));
                prop_assert!((matched.date - center).num_days().abs() <= days);
            }
        }
    }
}
