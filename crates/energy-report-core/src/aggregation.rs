// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Reduction of statistics buckets into report totals.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::trace;

use crate::metrics::Aggregation;
use crate::period::DateWindow;
use crate::statistics::StatisticRow;

/// Total and per-day values of one statistic over a window
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedStatistic {
    pub total: f64,
    pub daily: BTreeMap<NaiveDate, f64>,
}

/// Latest finite `state` per local calendar day, restricted to the window
#[must_use]
pub fn last_state_per_day(
    rows: &[StatisticRow],
    window: &DateWindow,
    tz: &Tz,
) -> BTreeMap<NaiveDate, f64> {
    let mut latest: BTreeMap<NaiveDate, (DateTime<Utc>, f64)> = BTreeMap::new();

    for row in rows {
        let Some(state) = row.state.filter(|value| value.is_finite()) else {
            continue;
        };
        let day = row.start.with_timezone(tz).date_naive();
        if !window.contains(day) {
            trace!("Skipping bucket {} outside {}", row.start, window);
            continue;
        }

        match latest.entry(day) {
            Entry::Vacant(entry) => {
                entry.insert((row.start, state));
            }
            Entry::Occupied(mut entry) => {
                if row.start >= entry.get().0 {
                    entry.insert((row.start, state));
                }
            }
        }
    }

    latest
        .into_iter()
        .map(|(day, (_, state))| (day, state))
        .collect()
}

/// Sum of each day's last state, `None` when no day has a value
#[must_use]
pub fn sum_last_states(rows: &[StatisticRow], window: &DateWindow, tz: &Tz) -> Option<f64> {
    let per_day = last_state_per_day(rows, window, tz);
    if per_day.is_empty() {
        None
    } else {
        Some(per_day.values().sum())
    }
}

/// Total change of buckets starting inside `[start, end)`
///
/// Without a `change` column the total is the last cumulative `sum` inside the bounds
/// minus the `sum` of the latest bucket before `start`. `sum` is the running total at
/// the end of a bucket, so without that earlier bucket the first bucket's own
/// consumption is unknown and the result is `None`.
#[must_use]
pub fn total_change(
    rows: &[StatisticRow],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Option<f64> {
    let changes: Vec<f64> = rows
        .iter()
        .filter(|row| row.start >= start && row.start < end)
        .filter_map(|row| row.change)
        .filter(|value| value.is_finite())
        .collect();
    if !changes.is_empty() {
        return Some(changes.iter().sum());
    }

    let latest_sum = |in_range: &dyn Fn(&StatisticRow) -> bool| {
        rows.iter()
            .filter(|row| in_range(row))
            .filter_map(|row| row.sum.filter(|v| v.is_finite()).map(|sum| (row.start, sum)))
            .max_by_key(|(bucket, _)| *bucket)
            .map(|(_, sum)| sum)
    };

    let last = latest_sum(&|row| row.start >= start && row.start < end)?;
    let Some(baseline) = latest_sum(&|row| row.start < start) else {
        trace!("No bucket before {start} to diff cumulative sums against");
        return None;
    };
    Some(last - baseline)
}

/// Per-day sum of `change`, restricted to the window
#[must_use]
pub fn daily_change(
    rows: &[StatisticRow],
    window: &DateWindow,
    tz: &Tz,
) -> BTreeMap<NaiveDate, f64> {
    let mut daily = BTreeMap::new();
    for row in rows {
        let Some(change) = row.change.filter(|value| value.is_finite()) else {
            continue;
        };
        let day = row.start.with_timezone(tz).date_naive();
        if window.contains(day) {
            *daily.entry(day).or_insert(0.0) += change;
        }
    }
    daily
}

/// Aggregate the rows of one statistic with the given rule
#[must_use]
pub fn aggregate(
    rows: &[StatisticRow],
    aggregation: Aggregation,
    window: &DateWindow,
    tz: &Tz,
) -> Option<AggregatedStatistic> {
    match aggregation {
        Aggregation::Change => {
            let (start, end) = window.utc_bounds(tz);
            let total = total_change(rows, start, end)?;
            Some(AggregatedStatistic {
                total,
                daily: daily_change(rows, window, tz),
            })
        }
        Aggregation::LastStatePerDay => {
            let daily = last_state_per_day(rows, window, tz);
            if daily.is_empty() {
                return None;
            }
            Some(AggregatedStatistic {
                total: daily.values().sum(),
                daily,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn brussels() -> Tz {
        "Europe/Brussels".parse().unwrap()
    }

    fn local(tz: &Tz, y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        tz.with_ymd_and_hms(y, m, d, h, 0, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_single_day_uses_last_state_within_day() {
        let tz = brussels();
        let rows = vec![
            StatisticRow::at(local(&tz, 2024, 3, 5, 8)).with_state(0.004),
            StatisticRow::at(local(&tz, 2024, 3, 5, 23)).with_state(0.013),
            // Next day's reset must not leak into the report
            StatisticRow::at(local(&tz, 2024, 3, 6, 0)).with_state(0.001),
        ];
        let window = DateWindow::single_day(day(2024, 3, 5));

        assert_eq!(sum_last_states(&rows, &window, &tz), Some(0.013));
    }

    #[test]
    fn test_multi_day_sums_each_days_last_state() {
        let tz = brussels();
        let rows = vec![
            StatisticRow::at(local(&tz, 2024, 3, 5, 0)).with_state(0.013),
            StatisticRow::at(local(&tz, 2024, 3, 6, 0)).with_state(0.010),
            StatisticRow::at(local(&tz, 2024, 3, 6, 12)).with_state(0.013),
            StatisticRow::at(local(&tz, 2024, 3, 7, 0)).with_state(0.013),
        ];
        let window = DateWindow::new(day(2024, 3, 5), day(2024, 3, 7)).unwrap();

        let total = sum_last_states(&rows, &window, &tz).unwrap();
        assert!((total - 0.039).abs() < 1e-12);
        assert_eq!(crate::format::format_number(total), "0.039");
    }

    #[test]
    fn test_rows_out_of_order_keep_latest_bucket() {
        let tz = brussels();
        let rows = vec![
            StatisticRow::at(local(&tz, 2024, 3, 5, 20)).with_state(2.0),
            StatisticRow::at(local(&tz, 2024, 3, 5, 10)).with_state(1.0),
        ];
        let window = DateWindow::single_day(day(2024, 3, 5));
        assert_eq!(sum_last_states(&rows, &window, &tz), Some(2.0));
    }

    #[test]
    fn test_no_states_gives_none() {
        let tz = brussels();
        let rows = vec![StatisticRow::at(local(&tz, 2024, 3, 5, 1)).with_change(1.0)];
        let window = DateWindow::single_day(day(2024, 3, 5));
        assert_eq!(sum_last_states(&rows, &window, &tz), None);
    }

    #[test]
    fn test_total_change_respects_bounds() {
        let tz = brussels();
        let window = DateWindow::single_day(day(2024, 3, 5));
        let (start, end) = window.utc_bounds(&tz);
        let rows = vec![
            StatisticRow::at(local(&tz, 2024, 3, 4, 23)).with_change(5.0),
            StatisticRow::at(local(&tz, 2024, 3, 5, 0)).with_change(1.5),
            StatisticRow::at(local(&tz, 2024, 3, 5, 23)).with_change(0.5),
            StatisticRow::at(local(&tz, 2024, 3, 6, 0)).with_change(7.0),
        ];
        assert_eq!(total_change(&rows, start, end), Some(2.0));
    }

    #[test]
    fn test_total_change_falls_back_to_sum_difference() {
        let tz = brussels();
        let window = DateWindow::single_day(day(2024, 3, 5));
        let (start, end) = window.utc_bounds(&tz);
        // 1 kWh per hour, cumulative sum at the end of each bucket
        let rows = vec![
            StatisticRow::at(local(&tz, 2024, 3, 4, 23)).with_sum(100.0),
            StatisticRow::at(local(&tz, 2024, 3, 5, 0)).with_sum(101.0),
            StatisticRow::at(local(&tz, 2024, 3, 5, 1)).with_sum(102.0),
            StatisticRow::at(local(&tz, 2024, 3, 5, 2)).with_sum(103.0),
        ];
        assert_eq!(total_change(&rows, start, end), Some(3.0));
        assert_eq!(total_change(&[], start, end), None);
    }

    #[test]
    fn test_total_change_without_baseline_is_unknown() {
        let tz = brussels();
        let window = DateWindow::single_day(day(2024, 3, 5));
        let (start, end) = window.utc_bounds(&tz);
        let rows = vec![
            StatisticRow::at(local(&tz, 2024, 3, 5, 0)).with_sum(101.0),
            StatisticRow::at(local(&tz, 2024, 3, 5, 1)).with_sum(102.0),
            StatisticRow::at(local(&tz, 2024, 3, 5, 2)).with_sum(103.0),
        ];
        assert_eq!(total_change(&rows, start, end), None);
    }

    #[test]
    fn test_daily_change_groups_by_local_day() {
        let tz = brussels();
        let window = DateWindow::new(day(2024, 3, 5), day(2024, 3, 6)).unwrap();
        let rows = vec![
            StatisticRow::at(local(&tz, 2024, 3, 5, 0)).with_change(1.0),
            StatisticRow::at(local(&tz, 2024, 3, 5, 18)).with_change(2.0),
            StatisticRow::at(local(&tz, 2024, 3, 6, 0)).with_change(4.0),
        ];
        let daily = daily_change(&rows, &window, &tz);
        assert_eq!(daily.get(&day(2024, 3, 5)), Some(&3.0));
        assert_eq!(daily.get(&day(2024, 3, 6)), Some(&4.0));
    }

    #[test]
    fn test_aggregate_dispatches_on_rule() {
        let tz = brussels();
        let window = DateWindow::single_day(day(2024, 3, 5));
        let rows = vec![
            StatisticRow::at(local(&tz, 2024, 3, 5, 0))
                .with_change(1.0)
                .with_state(3.0),
            StatisticRow::at(local(&tz, 2024, 3, 5, 1))
                .with_change(2.0)
                .with_state(5.0),
        ];
        let change = aggregate(&rows, Aggregation::Change, &window, &tz).unwrap();
        assert_eq!(change.total, 3.0);
        let last = aggregate(&rows, Aggregation::LastStatePerDay, &window, &tz).unwrap();
        assert_eq!(last.total, 5.0);
    }
}
