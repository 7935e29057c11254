//! Recurrence rules for tasks that span a date range
//!
//! A `ScheduleRule` is a tagged union: the `kind` field selects exactly one
//! variant, so a rule can never mix, say, weekdays with a period.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::validate::Violation;

/// Highest ordinal accepted for each day-set variant
pub const MAX_WORKDAY: u8 = 5;
pub const MAX_WEEKDAY: u8 = 7;
pub const MAX_WEEKEND: u8 = 2;
pub const MAX_MONTHDAY: u8 = 31;

/// Which calendar dates inside a range a task applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum ScheduleRule {
    /// Explicit dates for this task
    Specific {
        /// Dates in YYYY-MM-DD format, each inside the task's date range
        dates: Vec<NaiveDate>,
    },

    /// Every day in the range
    ///
    /// Braced so that stray keys such as `days` are rejected.
    Everyday {},

    /// Selected working days
    OnWorkday {
        /// Use 1 for Monday, 2 for Tuesday, ..., up to 5 for Friday.
        /// For example [1, 2, 3] for Monday to Wednesday, or [3, 5] for Wednesday and Friday.
        days: Vec<u8>,
    },

    /// Selected days of the week
    OnWeekday {
        /// Use 1 for Monday, 2 for Tuesday, ..., up to 7 for Sunday.
        /// For example [1, 2, 3] for Monday to Wednesday, or [3, 7] for Wednesday and Sunday.
        days: Vec<u8>,
    },

    /// Selected weekend days
    OnWeekend {
        /// Use 1 for Saturday, 2 for Sunday, or [1, 2] for both.
        days: Vec<u8>,
    },

    /// Selected days of the month
    OnMonthday {
        /// Use 1 for the first day of the month up to 31. Days past the end of a
        /// shorter month fall on that month's last day.
        days: Vec<u8>,
    },

    /// Repeats every N days starting on the range's start date
    Periodic {
        /// Period of the task in days
        period_days: u32,
    },
}

impl ScheduleRule {
    /// Stable wire name of the variant
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Specific { .. } => "specific",
            Self::Everyday {} => "everyday",
            Self::OnWorkday { .. } => "on_workday",
            Self::OnWeekday { .. } => "on_weekday",
            Self::OnWeekend { .. } => "on_weekend",
            Self::OnMonthday { .. } => "on_monthday",
            Self::Periodic { .. } => "periodic",
        }
    }

    /// Expand the rule into concrete dates within `[start, end]`
    ///
    /// The result is ascending and free of duplicates. An inverted range
    /// yields nothing.
    pub fn occurrences(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        debug!("ScheduleRule::occurrences: kind={} start={} end={}", self.kind(), start, end);
        if start > end {
            debug!("ScheduleRule::occurrences: inverted range");
            return Vec::new();
        }

        let mut dates: Vec<NaiveDate> = match self {
            Self::Specific { dates } => dates.iter().copied().filter(|d| *d >= start && *d <= end).collect(),
            Self::Everyday {} => days_between(start, end).collect(),
            Self::OnWorkday { days } | Self::OnWeekday { days } => days_between(start, end)
                .filter(|d| days.contains(&(d.weekday().number_from_monday() as u8)))
                .collect(),
            Self::OnWeekend { days } => days_between(start, end)
                .filter(|d| match d.weekday() {
                    Weekday::Sat => days.contains(&1),
                    Weekday::Sun => days.contains(&2),
                    _ => false,
                })
                .collect(),
            Self::OnMonthday { days } => monthday_occurrences(days, start, end),
            Self::Periodic { period_days } => periodic_occurrences(*period_days, start, end),
        };

        dates.sort();
        dates.dedup();
        debug!("ScheduleRule::occurrences: {} dates", dates.len());
        dates
    }

    /// Record every range or shape problem under `path`
    pub fn check(&self, path: &str, start: NaiveDate, end: NaiveDate, out: &mut Vec<Violation>) {
        match self {
            Self::Specific { dates } => {
                if dates.is_empty() {
                    out.push(Violation::new(format!("{path}.dates"), "at least one date is required"));
                }
                for (i, date) in dates.iter().enumerate() {
                    if *date < start || *date > end {
                        out.push(Violation::new(
                            format!("{path}.dates[{i}]"),
                            format!("{date} is outside the range {start}..{end}"),
                        ));
                    }
                }
            }
            Self::Everyday {} => {}
            Self::OnWorkday { days } => check_ordinals(&format!("{path}.days"), days, MAX_WORKDAY, out),
            Self::OnWeekday { days } => check_ordinals(&format!("{path}.days"), days, MAX_WEEKDAY, out),
            Self::OnWeekend { days } => check_ordinals(&format!("{path}.days"), days, MAX_WEEKEND, out),
            Self::OnMonthday { days } => check_ordinals(&format!("{path}.days"), days, MAX_MONTHDAY, out),
            Self::Periodic { period_days } => {
                if *period_days == 0 {
                    out.push(Violation::new(format!("{path}.period_days"), "period must be at least 1 day"));
                }
            }
        }
    }
}

impl std::fmt::Display for ScheduleRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Specific { dates } => {
                let list: Vec<String> = dates.iter().map(|d| d.to_string()).collect();
                write!(f, "on {}", list.join(", "))
            }
            Self::Everyday {} => write!(f, "every day"),
            Self::OnWorkday { days } | Self::OnWeekday { days } => {
                let names: Vec<&str> = days.iter().map(|d| weekday_name(*d)).collect();
                write!(f, "every {}", names.join(", "))
            }
            Self::OnWeekend { days } => {
                let names: Vec<&str> = days
                    .iter()
                    .map(|d| match d {
                        1 => "Sat",
                        2 => "Sun",
                        _ => "?",
                    })
                    .collect();
                write!(f, "every {}", names.join(", "))
            }
            Self::OnMonthday { days } => {
                let list: Vec<String> = days.iter().map(|d| d.to_string()).collect();
                write!(f, "monthly on day {}", list.join(", "))
            }
            Self::Periodic { period_days } => write!(f, "every {} days", period_days),
        }
    }
}

fn weekday_name(ordinal: u8) -> &'static str {
    match ordinal {
        1 => "Mon",
        2 => "Tue",
        3 => "Wed",
        4 => "Thu",
        5 => "Fri",
        6 => "Sat",
        7 => "Sun",
        _ => "?",
    }
}

fn check_ordinals(path: &str, days: &[u8], max: u8, out: &mut Vec<Violation>) {
    if days.is_empty() {
        out.push(Violation::new(path, "at least one day is required"));
    }
    for (i, day) in days.iter().enumerate() {
        if *day == 0 || *day > max {
            out.push(Violation::new(
                format!("{path}[{i}]"),
                format!("{day} is outside 1..={max}"),
            ));
        }
    }
}

fn days_between(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}

/// Number of days in the given month
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

fn monthday_occurrences(days: &[u8], start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let (mut year, mut month) = (start.year(), start.month());

    while (year, month) <= (end.year(), end.month()) {
        let last = days_in_month(year, month);
        for day in days.iter().filter(|d| **d >= 1) {
            let clipped = (*day as u32).min(last);
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, clipped)
                && date >= start
                && date <= end
            {
                dates.push(date);
            }
        }
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }

    dates
}

fn periodic_occurrences(period_days: u32, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    if period_days == 0 {
        return Vec::new();
    }

    let mut dates = Vec::new();
    let mut current = Some(start);
    while let Some(date) = current
        && date <= end
    {
        dates.push(date);
        current = date.checked_add_days(Days::new(period_days as u64));
    }
    dates
}
