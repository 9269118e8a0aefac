use crate::common::time::TimePoint;
use crate::series::{PeriodIter, SeriesDefault, TimeSeries};
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::ops::BitAnd;

/// A boolean-valued step function representing a union of half-open
/// intervals: every maximal run of `true` is an interval. The default
/// before the first measurement is always `false`, so keys written at
/// `true` edges open an interval and keys at `false` edges close it.
///
/// Domains are the mask type of the crate: summaries and traversals
/// restricted "where some condition holds" take a `Domain`.
#[derive(Clone, Debug)]
pub struct Domain<T> {
    series: TimeSeries<T, bool>,
}

impl<T: TimePoint> PartialEq for Domain<T> {
    fn eq(&self, other: &Self) -> bool {
        self.series == other.series
    }
}

impl<T: TimePoint> Default for Domain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimePoint> Domain<T> {
    pub fn new() -> Self {
        Domain {
            series: TimeSeries::with_default(SeriesDefault::Value(false)),
        }
    }

    /// Build from `(start, end)` pairs. Degenerate pairs with
    /// `start >= end` are ignored; overlapping pairs merge.
    pub fn from_intervals(intervals: impl IntoIterator<Item = (T, T)>) -> Self {
        let mut result = Self::new();
        for (start, end) in intervals {
            if start.cmp_time(&end) == Ordering::Less {
                // infallible: the inner series always has a default
                let _ = result.series.set_interval(start, end, true, true);
            }
        }
        result.series.compact();
        result
    }

    pub fn as_series(&self) -> &TimeSeries<T, bool> {
        &self.series
    }

    pub fn into_series(self) -> TimeSeries<T, bool> {
        self.series
    }

    pub(crate) fn set_raw(&mut self, t: T, value: bool, compact: bool) {
        self.series.set(t, value, compact);
    }

    /// Whether `t` falls inside one of the intervals.
    pub fn value_at(&self, t: T) -> bool {
        self.series.get(t).unwrap_or(false)
    }

    /// The `(start, end)` pairs of every interval, in time order.
    pub fn intervals(&self) -> impl Iterator<Item = (T, T)> + '_ {
        let start = T::min_sentinel();
        let items = self.series.items();
        let start_index = self.series.points.bisect_right(&start);
        let start_value = start_index
            .checked_sub(1)
            .and_then(|i| items.get(i))
            .map_or(false, |(_, v)| *v);
        PeriodIter::new(&items[start_index..], start, start_value, T::max_sentinel())
            .filter(|(_, _, v)| *v)
            .map(|(t0, t1, _)| (t0, t1))
    }

    pub fn is_empty(&self) -> bool {
        self.intervals().next().is_none()
    }

    /// First recorded edge, or the -∞ sentinel when there is none.
    pub fn lower(&self) -> T {
        self.series
            .first_item()
            .map_or_else(T::min_sentinel, |(t, _)| *t)
    }

    /// Last recorded edge, or the +∞ sentinel when there is none.
    pub fn upper(&self) -> T {
        self.series
            .last_item()
            .map_or_else(T::max_sentinel, |(t, _)| *t)
    }

    /// Pointwise intersection over the window where both sides can
    /// overlap. The result carries no redundant edges.
    pub fn intersect(&self, other: &Domain<T>) -> Domain<T> {
        if self.is_empty() || other.is_empty() {
            return Domain::new();
        }
        let lower = self.lower().max_time(other.lower());
        let upper = self.upper().min_time(other.upper());
        if lower.cmp_time(&upper) != Ordering::Less {
            return Domain::new();
        }

        // evaluate the AND at every edge either side has inside the
        // window, plus the window boundaries themselves
        let mut times: Vec<T> = vec![lower, upper];
        for side in [&self.series, &other.series] {
            let from = side.points.bisect_left(&lower);
            let to = side.points.bisect_right(&upper);
            times.extend(side.items()[from..to].iter().map(|(t, _)| *t));
        }
        times.sort_by(|a, b| a.cmp_time(b));
        times.dedup_by(|a, b| a.cmp_time(b) == Ordering::Equal);

        let mut result = Domain::new();
        for t in times {
            result
                .series
                .set(t, self.value_at(t) && other.value_at(t), true);
        }
        result
    }
}

impl<T: TimePoint> BitAnd for &Domain<T> {
    type Output = Domain<T>;

    fn bitand(self, rhs: Self) -> Domain<T> {
        self.intersect(rhs)
    }
}

impl<T> Serialize for Domain<T>
where
    T: TimePoint + Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.series.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Domain<T>
where
    T: TimePoint + Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut series = TimeSeries::<T, bool>::deserialize(deserializer)?;
        // the default of a domain is not negotiable
        series.set_default(SeriesDefault::Value(false));
        Ok(Domain { series })
    }
}
