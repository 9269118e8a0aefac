//! Calendar arithmetic for wall-clock series: unit flooring, ranges,
//! periodic masks and calendar binning.

use crate::common::time::TimePoint;
use crate::domain::Domain;
use crate::error::{SeriesError, SeriesResult};
use crate::histogram::{Histogram, HistogramValue};
use crate::series::TimeSeries;
use chrono::{DateTime, Datelike, Duration, Months, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

impl TimeUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Seconds => "seconds",
            TimeUnit::Minutes => "minutes",
            TimeUnit::Hours => "hours",
            TimeUnit::Days => "days",
            TimeUnit::Weeks => "weeks",
            TimeUnit::Months => "months",
            TimeUnit::Years => "years",
        }
    }
}

impl Display for TimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TimeUnit {
    type Err = SeriesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        match lowered.trim_end_matches('s') {
            "second" => Ok(TimeUnit::Seconds),
            "minute" => Ok(TimeUnit::Minutes),
            "hour" => Ok(TimeUnit::Hours),
            "day" => Ok(TimeUnit::Days),
            "week" => Ok(TimeUnit::Weeks),
            "month" => Ok(TimeUnit::Months),
            "year" => Ok(TimeUnit::Years),
            _ => Err(SeriesError::unknown_option(
                "time unit",
                s,
                "seconds, minutes, hours, days, weeks, months, years",
            )),
        }
    }
}

/// Floor `t` to a whole multiple of `n_units` of the unit. Multiples
/// of the fixed-width units are counted from the epoch; weeks start on
/// Monday.
pub fn datetime_floor(t: DateTime<Utc>, unit: TimeUnit, n_units: u32) -> DateTime<Utc> {
    let n = n_units.max(1) as i64;
    let floor_counted = |count_seconds: i64| {
        let counted = t.timestamp().div_euclid(count_seconds);
        let floored = counted - counted.rem_euclid(n);
        Utc.timestamp_opt(floored * count_seconds, 0).single()
    };
    let result = match unit {
        TimeUnit::Seconds => floor_counted(1),
        TimeUnit::Minutes => floor_counted(60),
        TimeUnit::Hours => floor_counted(3600),
        TimeUnit::Days => floor_counted(86_400),
        TimeUnit::Weeks => {
            let days_from_monday = t.weekday().num_days_from_monday() as i64;
            let day = t.timestamp().div_euclid(86_400) - days_from_monday;
            // week index relative to the Monday before the epoch
            let week = (day + 3).div_euclid(7);
            let floored = week - week.rem_euclid(n);
            Utc.timestamp_opt((floored * 7 - 3) * 86_400, 0).single()
        }
        TimeUnit::Months => {
            let month_index = t.year() as i64 * 12 + t.month0() as i64;
            let floored = month_index - month_index.rem_euclid(n);
            Utc.with_ymd_and_hms(
                floored.div_euclid(12) as i32,
                floored.rem_euclid(12) as u32 + 1,
                1,
                0,
                0,
                0,
            )
            .single()
        }
        TimeUnit::Years => {
            let year = t.year() as i64;
            let floored = year - year.rem_euclid(n);
            Utc.with_ymd_and_hms(floored as i32, 1, 1, 0, 0, 0).single()
        }
    };
    result.unwrap_or(t)
}

/// `t` advanced by `n_units` of the unit. Month and year steps use
/// calendar arithmetic; everything else is a fixed span.
pub fn datetime_advance(t: DateTime<Utc>, unit: TimeUnit, n_units: u32) -> DateTime<Utc> {
    let n = n_units.max(1);
    match unit {
        TimeUnit::Seconds => t.add_span(Duration::seconds(n as i64)),
        TimeUnit::Minutes => t.add_span(Duration::minutes(n as i64)),
        TimeUnit::Hours => t.add_span(Duration::hours(n as i64)),
        TimeUnit::Days => t.add_span(Duration::days(n as i64)),
        TimeUnit::Weeks => t.add_span(Duration::weeks(n as i64)),
        TimeUnit::Months => t.checked_add_months(Months::new(n)).unwrap_or(t),
        TimeUnit::Years => t.checked_add_months(Months::new(n * 12)).unwrap_or(t),
    }
}

/// Regular times from `start` up to `end`, stepping by `n_units` of
/// the unit.
pub fn datetime_range(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    unit: TimeUnit,
    n_units: u32,
    inclusive_end: bool,
) -> Vec<DateTime<Utc>> {
    let mut result = Vec::new();
    let mut current = start;
    loop {
        let in_range = match current.cmp(&end) {
            Ordering::Less => true,
            Ordering::Equal => inclusive_end,
            Ordering::Greater => false,
        };
        if !in_range {
            break;
        }
        result.push(current);
        let next = datetime_advance(current, unit, n_units);
        if next <= current {
            break;
        }
        current = next;
    }
    result
}

/// Weekday as a number counted from Monday, parsed from a name
/// ("monday", "mon") or a digit ("0"–"6").
pub fn weekday_number(weekday: &str) -> SeriesResult<u32> {
    if let Ok(number) = weekday.parse::<u32>() {
        if number <= 6 {
            return Ok(number);
        }
    }
    weekday
        .parse::<Weekday>()
        .map(|day| day.num_days_from_monday())
        .map_err(|_| {
            SeriesError::unknown_option("weekday", weekday, "monday..sunday, mon..sun, 0..6")
        })
}

pub fn duration_to_seconds(duration: Duration) -> f64 {
    <DateTime<Utc> as TimePoint>::span_seconds(duration)
}

/// The mask that is on during one hour of every day in `[start, end]`.
pub fn hour_of_day(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    hour: u32,
) -> SeriesResult<Domain<DateTime<Utc>>> {
    if hour > 23 {
        return Err(SeriesError::InvalidBounds(format!(
            "hour of day must be 0..=23, got {hour}"
        )));
    }
    let floored = datetime_floor(start, TimeUnit::Days, 1);
    let mut intervals = Vec::new();
    for day in datetime_range(floored, end, TimeUnit::Days, 1, true) {
        let interval_start = day.add_span(Duration::hours(hour as i64));
        intervals.push((interval_start, interval_start.add_span(Duration::hours(1))));
    }
    let domain = Domain::from_intervals(intervals);
    Ok(domain.intersect(&Domain::from_intervals([(start, end)])))
}

/// The mask that is on during one day of every week in `[start, end]`.
pub fn day_of_week(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    weekday: &str,
) -> SeriesResult<Domain<DateTime<Utc>>> {
    let number = weekday_number(weekday)?;
    let floored = datetime_floor(start, TimeUnit::Days, 1);
    let week_ahead = floored.add_span(Duration::days(7));
    let first_day = datetime_range(floored, week_ahead, TimeUnit::Days, 1, false)
        .into_iter()
        .find(|day| day.weekday().num_days_from_monday() == number);
    let Some(first_day) = first_day else {
        return Ok(Domain::new());
    };

    let mut intervals = Vec::new();
    for week_start in datetime_range(first_day, end, TimeUnit::Weeks, 1, true) {
        intervals.push((week_start, week_start.add_span(Duration::days(1))));
    }
    let domain = Domain::from_intervals(intervals);
    Ok(domain.intersect(&Domain::from_intervals([(start, end)])))
}

impl Domain<DateTime<Utc>> {
    /// Calendar-aligned sub-spans of every interval clamped to
    /// `[start, end]`: each span is `n_units` of the unit wide,
    /// starting from the floor of the clamped interval start.
    /// Adjacent duplicates are suppressed.
    pub fn spans_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        unit: TimeUnit,
        n_units: u32,
    ) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        let mut result = Vec::new();
        let mut previous: Option<DateTime<Utc>> = None;
        for (interval_start, interval_end) in self.intervals() {
            let clamped_start = interval_start.max(start);
            let clamped_end = interval_end.min(end);
            if clamped_start >= clamped_end {
                continue;
            }
            let mut current = datetime_floor(clamped_start, unit, n_units);
            while current < clamped_end {
                let next = datetime_advance(current, unit, n_units);
                if next <= current {
                    break;
                }
                if previous != Some(current) {
                    result.push((current, next));
                }
                previous = Some(current);
                current = next;
            }
        }
        result
    }
}

impl<V: HistogramValue> TimeSeries<DateTime<Utc>, V> {
    /// Distributions per calendar bin: the window (or mask) is cut
    /// into `n_units`-of-`unit` spans and a non-normalized
    /// distribution is computed over each.
    pub fn bin(
        &self,
        unit: TimeUnit,
        n_units: u32,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        mask: Option<&Domain<DateTime<Utc>>>,
    ) -> SeriesResult<BTreeMap<DateTime<Utc>, Histogram<V>>> {
        if mask.is_some_and(|m| m.is_empty()) {
            return Ok(BTreeMap::new());
        }
        if let (Some(s), Some(e)) = (start, end) {
            if s == e {
                return Ok(BTreeMap::new());
            }
        }
        let (start, end, mask) = self.resolve_bounds_masked(start, end, mask)?;
        let start = datetime_floor(start, unit, n_units);

        let mut result = BTreeMap::new();
        for (bin_start, bin_end) in mask.spans_between(start, end, unit, n_units) {
            let histogram =
                self.distribution(Some(bin_start), Some(bin_end), false, Some(&mask))?;
            result.insert(bin_start, histogram);
        }
        Ok(result)
    }

    /// One (normalized) distribution per hour of the day over
    /// `[start, end]`, for hours `first..=last`.
    pub fn distribution_by_hour_of_day(
        &self,
        first: u32,
        last: u32,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> SeriesResult<Vec<(u32, Histogram<V>)>> {
        let (start, end) = self.resolve_bounds(start, end, false)?;
        let mut result = Vec::new();
        for hour in first..=last {
            let mask = hour_of_day(start, end, hour)?;
            result.push((hour, self.distribution(None, None, true, Some(&mask))?));
        }
        Ok(result)
    }

    /// One (normalized) distribution per day of the week over
    /// `[start, end]`, for weekdays `first..=last` counted from
    /// Monday.
    pub fn distribution_by_day_of_week(
        &self,
        first: u32,
        last: u32,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> SeriesResult<Vec<(u32, Histogram<V>)>> {
        let (start, end) = self.resolve_bounds(start, end, false)?;
        let mut result = Vec::new();
        for number in first..=last.min(6) {
            let mask = day_of_week(start, end, &number.to_string())?;
            result.push((number, self.distribution(None, None, true, Some(&mask))?));
        }
        Ok(result)
    }
}

/// Re-key binned distributions (e.g. days into months), merging the
/// histograms that land on the same new key.
pub fn rebin<V: HistogramValue>(
    binned: &BTreeMap<DateTime<Utc>, Histogram<V>>,
    key_fn: impl Fn(&DateTime<Utc>) -> DateTime<Utc>,
) -> BTreeMap<DateTime<Utc>, Histogram<V>> {
    let mut result: BTreeMap<DateTime<Utc>, Histogram<V>> = BTreeMap::new();
    for (bin_start, histogram) in binned {
        result
            .entry(key_fn(bin_start))
            .and_modify(|h| h.merge(histogram))
            .or_insert_with(|| histogram.clone());
    }
    result
}
