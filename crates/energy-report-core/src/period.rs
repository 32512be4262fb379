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

//! Calendar windows of a report and their mapping onto UTC instants.

use chrono::{
    DateTime, Datelike, LocalResult, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta,
    TimeZone, Utc,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, ReportResult};
use crate::statistics::StatisticsPeriod;

/// Report type requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    #[default]
    #[serde(alias = "daily")]
    Day,
    #[serde(alias = "weekly")]
    Week,
    #[serde(alias = "monthly")]
    Month,
}

impl ReportPeriod {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Translation key of the report type
    #[must_use]
    pub fn label_key(&self) -> &'static str {
        match self {
            Self::Day => "report-type-day",
            Self::Week => "report-type-week",
            Self::Month => "report-type-month",
        }
    }
}

impl std::fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReportPeriod {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "daily" => Ok(Self::Day),
            "week" | "weekly" => Ok(Self::Week),
            "month" | "monthly" => Ok(Self::Month),
            other => Err(ReportError::InvalidRequest(format!(
                "Unknown report period '{other}' (expected day, week or month)"
            ))),
        }
    }
}

/// Inclusive range of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// # Errors
    ///
    /// Returns `ReportError::InvalidDateRange` when `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> ReportResult<Self> {
        if start > end {
            return Err(ReportError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    #[must_use]
    pub fn single_day(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// Number of calendar days, both ends included
    #[must_use]
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    #[must_use]
    pub fn is_single_day(&self) -> bool {
        self.start == self.end
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Every day of the window in order
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let days = usize::try_from(self.days()).unwrap_or(0);
        self.start.iter_days().take(days)
    }

    /// Statistics granularity used to query this window
    #[must_use]
    pub fn bucket(&self) -> StatisticsPeriod {
        if self.is_single_day() {
            StatisticsPeriod::Hour
        } else {
            StatisticsPeriod::Day
        }
    }

    /// `[start 00:00, end + 1 00:00)` in `tz`, converted to UTC
    #[must_use]
    pub fn utc_bounds(&self, tz: &Tz) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = local_midnight(self.start, tz);
        let end = match self.end.succ_opt() {
            Some(next) => local_midnight(next, tz),
            None => start + TimeDelta::days(self.days()),
        };
        (start, end)
    }

    /// Default comparison window immediately before this one
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidRequest` when the shifted dates fall outside the calendar.
    pub fn previous(&self, period: ReportPeriod) -> ReportResult<Self> {
        if period == ReportPeriod::Month && self.is_calendar_month() {
            let start = self
                .start
                .checked_sub_months(Months::new(1))
                .ok_or_else(|| out_of_range(self.start))?;
            let end = shift(self.start, -1)?;
            return Ok(Self { start, end });
        }

        let length = self.days();
        Ok(Self {
            start: shift(self.start, -length)?,
            end: shift(self.end, -length)?,
        })
    }

    /// Whether the window covers exactly one calendar month
    #[must_use]
    pub fn is_calendar_month(&self) -> bool {
        self.start.day() == 1 && last_day_of_month(self.start) == Some(self.end)
    }
}

impl std::fmt::Display for DateWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Resolve the report window from the requested period and optional dates
///
/// # Errors
///
/// Returns `ReportError::InvalidDateRange` when `start` is after `end`.
pub fn resolve_window(
    period: ReportPeriod,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> ReportResult<DateWindow> {
    match (start, end) {
        (Some(start), Some(end)) => DateWindow::new(start, end),
        (Some(start), None) => {
            let end = match period {
                ReportPeriod::Day => start,
                ReportPeriod::Week => shift(start, 6)?,
                ReportPeriod::Month => last_day_of_month(start).ok_or_else(|| out_of_range(start))?,
            };
            DateWindow::new(start, end)
        }
        (None, Some(end)) => {
            let start = match period {
                ReportPeriod::Day => end,
                ReportPeriod::Week => shift(end, -6)?,
                ReportPeriod::Month => first_day_of_month(end),
            };
            DateWindow::new(start, end)
        }
        (None, None) => match period {
            ReportPeriod::Day => Ok(DateWindow::single_day(today)),
            ReportPeriod::Week => {
                let monday = shift(today, -i64::from(today.weekday().num_days_from_monday()))?;
                DateWindow::new(monday, shift(monday, 6)?)
            }
            ReportPeriod::Month => {
                let first = first_day_of_month(today);
                let last = last_day_of_month(today).ok_or_else(|| out_of_range(today))?;
                DateWindow::new(first, last)
            }
        },
    }
}

/// Resolve the comparison window; explicit dates win over the default previous window
///
/// # Errors
///
/// Returns `ReportError::InvalidDateRange` when the explicit dates are reversed.
pub fn resolve_comparison_window(
    primary: &DateWindow,
    period: ReportPeriod,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> ReportResult<DateWindow> {
    let length = primary.days();
    match (start, end) {
        (Some(start), Some(end)) => DateWindow::new(start, end),
        (Some(start), None) => DateWindow::new(start, shift(start, length - 1)?),
        (None, Some(end)) => DateWindow::new(shift(end, 1 - length)?, end),
        (None, None) => primary.previous(period),
    }
}

fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn last_day_of_month(date: NaiveDate) -> Option<NaiveDate> {
    first_day_of_month(date)
        .checked_add_months(Months::new(1))?
        .pred_opt()
}

fn shift(date: NaiveDate, days: i64) -> ReportResult<NaiveDate> {
    date.checked_add_signed(TimeDelta::days(days))
        .ok_or_else(|| out_of_range(date))
}

fn out_of_range(date: NaiveDate) -> ReportError {
    ReportError::InvalidRequest(format!("Date {date} is out of the supported range"))
}

/// First instant of `date` in `tz`
///
/// Ambiguous midnights resolve to the earliest instant; a midnight skipped by a DST jump
/// resolves to the first valid hour after it.
fn local_midnight(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    for hour in 0..24 {
        let candidate = midnight + TimeDelta::hours(hour);
        match tz.from_local_datetime(&candidate) {
            LocalResult::Single(t) | LocalResult::Ambiguous(t, _) => {
                return t.with_timezone(&Utc);
            }
            LocalResult::None => continue,
        }
    }
    Utc.from_utc_datetime(&midnight)
}

/// Local wall-clock time of a UTC instant
#[must_use]
pub fn to_local(instant: DateTime<Utc>, tz: &Tz) -> NaiveDateTime {
    instant.with_timezone(tz).naive_local()
}
