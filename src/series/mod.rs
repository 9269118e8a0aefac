use crate::common::time::TimePoint;
use crate::common::value::Lerp;
use crate::error::{SeriesError, SeriesResult};
use crate::points::PointList;
use crate::sampling::Interpolation;
use serde::de::Deserializer;
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use tracing::debug;

mod boundary;
mod ops;
mod periods;
mod summary;

pub use periods::PeriodIter;

/// What a series is worth at any time strictly before its first
/// measurement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum SeriesDefault<V> {
    /// Extend the first recorded value backwards in time. An empty
    /// series with this default is *floating*: it has no value
    /// anywhere, and value queries fail.
    #[default]
    ExtendBack,
    /// A fixed value.
    Value(V),
}

/// A time series of measurements taken at unevenly-spaced times,
/// interpreted as a step function: between measurements the value is
/// the most recent prior measurement.
///
/// ```
/// use step_series::TimeSeries;
///
/// let ts: TimeSeries<f64, i64> =
///     [(1.0, 2), (2.0, 3), (6.0, 1), (8.0, 4)].into_iter().collect();
/// assert_eq!(ts.get(7.0).unwrap(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct TimeSeries<T, V> {
    pub(crate) points: PointList<T, V>,
    default: SeriesDefault<V>,
}

impl<T: TimePoint, V> Default for TimeSeries<T, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimePoint, V> TimeSeries<T, V> {
    /// Create a new empty series with the `ExtendBack` default.
    pub fn new() -> Self {
        TimeSeries {
            points: PointList::new(),
            default: SeriesDefault::ExtendBack,
        }
    }

    pub fn with_default(default: SeriesDefault<V>) -> Self {
        TimeSeries {
            points: PointList::new(),
            default,
        }
    }

    /// Build from `(time, value)` pairs in any order. Pairs at an
    /// identical time resolve last-wins.
    pub fn from_points(
        pairs: impl IntoIterator<Item = (T, V)>,
        default: SeriesDefault<V>,
    ) -> Self {
        TimeSeries {
            points: PointList::from_unsorted(pairs.into_iter().collect()),
            default,
        }
    }

    /// An empty series with `ExtendBack` default is floating: no value
    /// is defined anywhere.
    pub fn is_floating(&self) -> bool {
        self.points.is_empty() && matches!(self.default, SeriesDefault::ExtendBack)
    }

    pub fn default_policy(&self) -> &SeriesDefault<V> {
        &self.default
    }

    pub fn set_default(&mut self, default: SeriesDefault<V>) {
        self.default = default;
    }

    /// Number of recorded measurements.
    pub fn n_measurements(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The ordered `(time, value)` pairs.
    pub fn items(&self) -> &[(T, V)] {
        self.points.as_slice()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (T, V)> {
        self.points.iter()
    }

    pub fn first_item(&self) -> Option<&(T, V)> {
        self.points.first()
    }

    pub fn last_item(&self) -> Option<&(T, V)> {
        self.points.last()
    }

    /// The `(time, value)` pair at the given rank.
    pub fn item_at(&self, index: usize) -> Option<&(T, V)> {
        self.points.get(index)
    }

    /// Sliding groups of `n` consecutive measurements.
    pub fn iter_intervals(
        &self,
        n: usize,
    ) -> SeriesResult<impl Iterator<Item = &[(T, V)]>> {
        if n == 0 {
            return Err(SeriesError::InvalidBounds(
                "interval group size must be at least 1".to_string(),
            ));
        }
        Ok(self.points.as_slice().windows(n))
    }
}

impl<T: TimePoint, V: Clone> TimeSeries<T, V> {
    /// The value this series takes before its first measurement.
    /// Fails with `FloatingSeries` when there is nothing to extend
    /// back from.
    pub fn default_value(&self) -> SeriesResult<V> {
        match &self.default {
            SeriesDefault::Value(v) => Ok(v.clone()),
            SeriesDefault::ExtendBack => self
                .points
                .first()
                .map(|(_, v)| v.clone())
                .ok_or(SeriesError::FloatingSeries),
        }
    }

    /// Value at `t`: the measurement at the greatest recorded time
    /// <= `t`, or the default before the first measurement.
    pub fn get(&self, t: T) -> SeriesResult<V> {
        let idx = self.points.bisect_right(&t);
        if idx == 0 {
            return self.default_value();
        }
        match self.points.get(idx - 1) {
            Some((_, v)) => Ok(v.clone()),
            None => self.default_value(),
        }
    }

    /// Value at `t` under an explicit interpolation policy.
    pub fn get_interpolated(&self, t: T, interpolation: Interpolation) -> SeriesResult<V>
    where
        V: Lerp,
    {
        match interpolation {
            Interpolation::Previous => self.get(t),
            Interpolation::Linear => self.get_linear(t),
        }
    }

    fn get_linear(&self, t: T) -> SeriesResult<V>
    where
        V: Lerp,
    {
        let right = self.points.bisect_right(&t);
        if right == 0 {
            return self.default_value();
        }
        match (self.points.get(right - 1), self.points.get(right)) {
            (Some((left_t, left_v)), Some((right_t, right_v))) => {
                let fraction = T::fraction_between(&t, left_t, right_t);
                Ok(V::lerp(left_v, right_v, fraction))
            }
            // at or beyond the last measurement
            (Some((_, last_v)), None) => Ok(last_v.clone()),
            _ => self.default_value(),
        }
    }
}

impl<T: TimePoint, V: Clone + PartialEq> TimeSeries<T, V> {
    /// Record `value` at time `t`. With `compact`, the write is
    /// skipped when the series is non-empty and already takes `value`
    /// at `t`, so no redundant step is stored.
    pub fn set(&mut self, t: T, value: V, compact: bool) {
        if compact && !self.points.is_empty() {
            if let Ok(current) = self.get(t) {
                if current == value {
                    return;
                }
            }
        }
        self.points.insert_or_replace(t, value);
    }

    /// Remove the measurement recorded exactly at `t`.
    pub fn remove(&mut self, t: T) -> SeriesResult<()> {
        self.points
            .remove_exact(&t)
            .map(|_| ())
            .ok_or_else(|| SeriesError::NoSuchMeasurement(format!("{t:?}")))
    }

    /// Drop measurements that repeat the previous value, leaving the
    /// step function unchanged at every time.
    pub fn compact(&mut self) {
        let mut redundant: Vec<T> = Vec::new();
        let mut previous: Option<&V> = None;
        for (t, v) in self.points.iter() {
            if previous.map_or(false, |p| p == v) {
                redundant.push(*t);
            }
            previous = Some(v);
        }
        for t in redundant {
            self.points.remove_exact(&t);
        }
    }

    /// Set the value over `[start, end)`, preserving the value the
    /// series had at `end`. Keys strictly inside the interval collapse
    /// into the single step at `start`.
    pub fn set_interval(
        &mut self,
        start: T,
        end: T,
        value: V,
        compact: bool,
    ) -> SeriesResult<()> {
        let periods = self.periods(Some(start), Some(end))?;
        // captured before any mutation so a measurement exactly at
        // `end` keeps its height
        let resume_value = self.get(end)?;
        debug!(n_periods = periods.len(), compact, "rewriting interval");
        for (i, (t0, _t1, _v)) in periods.into_iter().enumerate() {
            if i == 0 {
                self.set(t0, value.clone(), compact);
            } else {
                self.points.remove_exact(&t0);
            }
        }
        self.set(end, resume_value, compact);
        Ok(())
    }

    /// Remove every measurement inside `[start, end)`. The step
    /// heights before `start` and at `end` are untouched.
    pub fn remove_points_from_interval(&mut self, start: T, end: T) -> SeriesResult<()> {
        let periods = self.periods(Some(start), Some(end))?;
        debug!(n_periods = periods.len(), "clearing interval");
        for (t0, _t1, _v) in periods {
            self.points.remove_exact(&t0);
        }
        Ok(())
    }

    /// An equivalent series restricted to `[start, end]`, always
    /// carrying measurements at both endpoints. The result's default
    /// is the resolved default of this series.
    pub fn slice(&self, start: T, end: T) -> SeriesResult<TimeSeries<T, V>> {
        let default = SeriesDefault::Value(self.default_value()?);
        let mut result = TimeSeries::with_default(default);
        for (t0, _t1, v) in self.periods(Some(start), Some(end))? {
            result.set(t0, v, false);
        }
        result.set(end, self.get(end)?, false);
        Ok(result)
    }
}

impl<T: TimePoint, V> FromIterator<(T, V)> for TimeSeries<T, V> {
    fn from_iter<I: IntoIterator<Item = (T, V)>>(iter: I) -> Self {
        Self::from_points(iter, SeriesDefault::ExtendBack)
    }
}

/// Two series are equal iff their ordered pair lists are equal;
/// defaults are not compared.
impl<T: TimePoint, V: PartialEq> PartialEq for TimeSeries<T, V> {
    fn eq(&self, other: &Self) -> bool {
        self.points.as_slice() == other.points.as_slice()
    }
}

impl<T, V> Serialize for TimeSeries<T, V>
where
    T: TimePoint + Serialize,
    V: Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TimeSeries", 2)?;
        state.serialize_field("points", self.points.as_slice())?;
        state.serialize_field("default", &self.default)?;
        state.end()
    }
}

impl<'de, T, V> Deserialize<'de> for TimeSeries<T, V>
where
    T: TimePoint + Deserialize<'de>,
    V: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(rename = "TimeSeries")]
        struct Repr<T, V> {
            points: Vec<(T, V)>,
            default: SeriesDefault<V>,
        }

        let repr = Repr::deserialize(deserializer)?;
        // renormalize: serialized input is not trusted to be sorted
        Ok(TimeSeries::from_points(repr.points, repr.default))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic() -> TimeSeries<f64, i64> {
        [(1.0, 2), (2.0, 3), (6.0, 1), (8.0, 4)].into_iter().collect()
    }

    #[test]
    fn test_get_previous() {
        let ts = basic();
        assert_eq!(ts.get(0.0).unwrap(), 2);
        assert_eq!(ts.get(1.0).unwrap(), 2);
        assert_eq!(ts.get(1.5).unwrap(), 2);
        assert_eq!(ts.get(6.0).unwrap(), 1);
        assert_eq!(ts.get(7.0).unwrap(), 1);
        assert_eq!(ts.get(8.0).unwrap(), 4);
        assert_eq!(ts.get(10.0).unwrap(), 4);
    }

    #[test]
    fn test_get_floating_fails() {
        let ts: TimeSeries<f64, i64> = TimeSeries::new();
        assert_eq!(ts.get(0.0), Err(SeriesError::FloatingSeries));
        assert!(ts.is_floating());
    }

    #[test]
    fn test_explicit_default_before_first() {
        let mut ts = TimeSeries::with_default(SeriesDefault::Value(7));
        assert_eq!(ts.get(0.0).unwrap(), 7);
        ts.set(5.0, 1, false);
        assert_eq!(ts.get(0.0).unwrap(), 7);
        assert_eq!(ts.get(5.0).unwrap(), 1);
    }

    #[test]
    fn test_get_linear() {
        let ts: TimeSeries<f64, f64> =
            [(0.0, 0.0), (4.0, 8.0)].into_iter().collect();
        assert_eq!(ts.get_interpolated(1.0, Interpolation::Linear).unwrap(), 2.0);
        assert_eq!(ts.get_interpolated(4.0, Interpolation::Linear).unwrap(), 8.0);
        assert_eq!(ts.get_interpolated(9.0, Interpolation::Linear).unwrap(), 8.0);
        // before the first measurement the default applies
        assert_eq!(ts.get_interpolated(-1.0, Interpolation::Linear).unwrap(), 0.0);
    }

    #[test]
    fn test_set_compact_skips_redundant() {
        let mut ts: TimeSeries<f64, i64> = [(1.0, 5)].into_iter().collect();
        ts.set(3.0, 5, true);
        assert_eq!(ts.n_measurements(), 1);
        ts.set(3.0, 6, true);
        assert_eq!(ts.n_measurements(), 2);
        // an empty series always records the first write
        let mut empty: TimeSeries<f64, i64> = TimeSeries::new();
        empty.set(0.0, 1, true);
        assert_eq!(empty.n_measurements(), 1);
    }

    #[test]
    fn test_remove() {
        let mut ts = basic();
        ts.remove(2.0).unwrap();
        assert_eq!(ts.n_measurements(), 3);
        assert!(matches!(
            ts.remove(2.0),
            Err(SeriesError::NoSuchMeasurement(_))
        ));
    }

    #[test]
    fn test_compact() {
        let mut ts: TimeSeries<f64, i64> =
            [(0.0, 1), (1.0, 1), (2.0, 2), (3.0, 2), (4.0, 1)].into_iter().collect();
        ts.compact();
        assert_eq!(ts.items(), &[(0.0, 1), (2.0, 2), (4.0, 1)]);
    }

    #[test]
    fn test_set_interval() {
        let mut ts: TimeSeries<f64, i64> = TimeSeries::new();
        assert!(ts.set_interval(2.0, 4.0, 5, false).is_err());

        ts.set(1.2, 1, false);
        ts.set(3.0, 0, false);
        ts.set(6.0, 2, false);

        ts.set_interval(2.0, 4.0, 5, false).unwrap();
        assert_eq!(ts.items(), &[(1.2, 1), (2.0, 5), (4.0, 0), (6.0, 2)]);

        ts.set_interval(3.0, 5.0, 4, false).unwrap();
        assert_eq!(
            ts.items(),
            &[(1.2, 1), (2.0, 5), (3.0, 4), (5.0, 0), (6.0, 2)]
        );
    }

    #[test]
    fn test_set_interval_compact_right_endpoint() {
        let base: TimeSeries<f64, i64> =
            [(1.2, 1), (2.0, 5), (3.0, 4), (5.0, 0), (6.0, 2)].into_iter().collect();

        let mut plain = base.clone();
        plain.set_interval(3.0, 4.0, 4, false).unwrap();
        assert_eq!(
            plain.items(),
            &[(1.2, 1), (2.0, 5), (3.0, 4), (4.0, 4), (5.0, 0), (6.0, 2)]
        );

        let mut compacted = base.clone();
        compacted.set_interval(3.0, 4.0, 4, true).unwrap();
        assert_eq!(
            compacted.items(),
            &[(1.2, 1), (2.0, 5), (3.0, 4), (5.0, 0), (6.0, 2)]
        );
    }

    #[test]
    fn test_interval_write_preserves_value_at_end() {
        let mut ts: TimeSeries<f64, i64> =
            [(0.0, 1), (10.0, 9)].into_iter().collect();
        let before = ts.get(7.0).unwrap();
        ts.set_interval(2.0, 7.0, 5, false).unwrap();
        for t in [2.0, 3.5, 6.9] {
            assert_eq!(ts.get(t).unwrap(), 5);
        }
        assert_eq!(ts.get(7.0).unwrap(), before);
        assert_eq!(ts.get(10.0).unwrap(), 9);
    }

    #[test]
    fn test_remove_points_from_interval() {
        let mut ts: TimeSeries<f64, i64> =
            [(0.0, 0), (1.0, 2), (3.0, 1), (4.0, 0)].into_iter().collect();
        ts.set_default(SeriesDefault::Value(0));

        assert_eq!(ts.get(5.0).unwrap(), 0);
        ts.remove_points_from_interval(3.5, 4.5).unwrap();
        assert_eq!(ts.get(5.0).unwrap(), 1);

        ts.set(4.0, 0, false);
        ts.remove_points_from_interval(3.0, 4.5).unwrap();
        assert_eq!(ts.get(5.0).unwrap(), 2);

        ts.set(3.0, 1, false);
        ts.set(4.0, 0, false);
        ts.remove_points_from_interval(3.5, 4.0).unwrap();
        assert_eq!(ts.get(5.0).unwrap(), 0);
    }

    #[test]
    fn test_slice_emits_both_endpoints() {
        let ts = basic();
        let sliced = ts.slice(1.5, 6.0).unwrap();
        assert_eq!(sliced.items(), &[(1.5, 2), (2.0, 3), (6.0, 1)]);
        // end exactly on a measurement still lands in the result
        let sliced = ts.slice(0.0, 8.0).unwrap();
        assert_eq!(
            sliced.items(),
            &[(0.0, 2), (1.0, 2), (2.0, 3), (6.0, 1), (8.0, 4)]
        );
    }

    #[test]
    fn test_equality_ignores_default() {
        let a: TimeSeries<f64, i64> = [(1.0, 2)].into_iter().collect();
        let mut b: TimeSeries<f64, i64> = [(1.0, 2)].into_iter().collect();
        b.set_default(SeriesDefault::Value(9));
        assert_eq!(a, b);
        let c: TimeSeries<f64, i64> = [(1.0, 3)].into_iter().collect();
        assert_ne!(a, c);
    }

    #[test]
    fn test_iter_intervals() {
        let ts = basic();
        let pairs: Vec<&[(f64, i64)]> = ts.iter_intervals(2).unwrap().collect();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0], &[(1.0, 2), (2.0, 3)]);
        assert_eq!(pairs[2], &[(6.0, 1), (8.0, 4)]);
        assert!(ts.iter_intervals(0).is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let ts = basic();
        let json = serde_json::to_string(&ts).unwrap();
        let back: TimeSeries<f64, i64> = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, back);
    }
}
