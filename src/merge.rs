use crate::common::time::TimePoint;
use crate::error::SeriesResult;
use crate::series::{SeriesDefault, TimeSeries};
use min_max_heap::MinMaxHeap;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::ops::Add;
use tracing::debug;

/// Heap entry for the synchronized traversal: ordered by time with the
/// series index as a deterministic tie-break.
struct MergeEntry<T> {
    t: T,
    index: usize,
}

impl<T: TimePoint> PartialEq for MergeEntry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T: TimePoint> Eq for MergeEntry<T> {}

impl<T: TimePoint> PartialOrd for MergeEntry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: TimePoint> Ord for MergeEntry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.t
            .cmp_time(&other.t)
            .then(self.index.cmp(&other.index))
    }
}

/// Iterate several series in time order, yielding `(t, state)` where
/// `state` holds the value of every input at `t`. Each yield is a
/// snapshot; the caller owns it.
pub struct MergeIter<'a, T, V> {
    series: Vec<&'a TimeSeries<T, V>>,
    cursors: Vec<usize>,
    heap: MinMaxHeap<MergeEntry<T>>,
    state: SmallVec<[V; 4]>,
}

impl<'a, T: TimePoint, V: Clone> Iterator for MergeIter<'a, T, V> {
    type Item = (T, Vec<V>);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.heap.pop_min()?;
        let index = entry.index;
        let items = self.series[index].items();
        let (t, value) = &items[self.cursors[index]];
        self.state[index] = value.clone();
        self.cursors[index] += 1;
        if let Some((next_t, _)) = items.get(self.cursors[index]) {
            self.heap.push(MergeEntry {
                t: *next_t,
                index,
            });
        }
        Some((*t, self.state.to_vec()))
    }
}

/// Start a synchronized traversal over `series_list`. Every input must
/// have a defined value everywhere (non-empty, or an explicit
/// default), else the state before its first measurement would be
/// meaningless.
pub fn iter_merge<'a, T, V>(
    series_list: &[&'a TimeSeries<T, V>],
) -> SeriesResult<MergeIter<'a, T, V>>
where
    T: TimePoint,
    V: Clone,
{
    let state = series_list
        .iter()
        .map(|series| series.default_value())
        .collect::<SeriesResult<SmallVec<[V; 4]>>>()?;

    let mut heap = MinMaxHeap::with_capacity(series_list.len());
    for (index, series) in series_list.iter().enumerate() {
        if let Some((t, _)) = series.first_item() {
            heap.push(MergeEntry { t: *t, index });
        }
    }

    Ok(MergeIter {
        series: series_list.to_vec(),
        cursors: vec![0; series_list.len()],
        heap,
        state,
    })
}

/// Merge several series into one, combining the per-series states with
/// `op`. Yields at tied timestamps collapse so only the final state of
/// each instant is written; writes are compacted when `compact` is
/// set.
///
/// When no `default` is supplied one is inferred: if every input has
/// the same default it is reused (mapped through `op`), otherwise the
/// merged series extends back.
pub fn merge_with<T, V, U, F>(
    series_list: &[&TimeSeries<T, V>],
    default: Option<SeriesDefault<U>>,
    compact: bool,
    op: F,
) -> SeriesResult<TimeSeries<T, U>>
where
    T: TimePoint,
    V: Clone + PartialEq,
    U: Clone + PartialEq,
    F: Fn(&[V]) -> U,
{
    let default = match default {
        Some(default) => default,
        None => infer_default(series_list, &op),
    };
    let mut result = TimeSeries::with_default(default);
    if series_list.is_empty() {
        return Ok(result);
    }
    debug!(n_series = series_list.len(), compact, "merging series");

    let mut pending: Option<(T, Vec<V>)> = None;
    for (t, state) in iter_merge(series_list)? {
        match &pending {
            Some((previous_t, _)) if previous_t.cmp_time(&t) == Ordering::Equal => {
                pending = Some((t, state));
            }
            Some((previous_t, previous_state)) => {
                result.set(*previous_t, op(previous_state), compact);
                pending = Some((t, state));
            }
            None => pending = Some((t, state)),
        }
    }
    if let Some((t, state)) = pending {
        result.set(t, op(&state), compact);
    }
    Ok(result)
}

/// Merge into a series of state vectors, one entry per input in input
/// order.
pub fn merge<T, V>(
    series_list: &[&TimeSeries<T, V>],
    default: Option<SeriesDefault<Vec<V>>>,
    compact: bool,
) -> SeriesResult<TimeSeries<T, Vec<V>>>
where
    T: TimePoint,
    V: Clone + PartialEq,
{
    merge_with(series_list, default, compact, |state| state.to_vec())
}

/// Sum an arbitrary collection of series. The empty collection is the
/// identity: it merges to an empty floating series, so folding sums
/// over a list behaves like repeated `sum_with`.
pub fn sum_all<T, V>(series_list: &[&TimeSeries<T, V>]) -> SeriesResult<TimeSeries<T, V>>
where
    T: TimePoint,
    V: Clone + PartialEq + Add<Output = V>,
{
    merge_with(series_list, None, true, |state| {
        state
            .iter()
            .cloned()
            .reduce(|a, b| a + b)
            .expect("merge state holds one value per input series")
    })
}

fn infer_default<T, V, U, F>(
    series_list: &[&TimeSeries<T, V>],
    op: &F,
) -> SeriesDefault<U>
where
    T: TimePoint,
    V: Clone + PartialEq,
    F: Fn(&[V]) -> U,
{
    let mut defaults = Vec::with_capacity(series_list.len());
    for series in series_list {
        match series.default_policy() {
            SeriesDefault::Value(v) => defaults.push(v.clone()),
            SeriesDefault::ExtendBack => return SeriesDefault::ExtendBack,
        }
    }
    if defaults.is_empty() || defaults.windows(2).any(|w| w[0] != w[1]) {
        return SeriesDefault::ExtendBack;
    }
    SeriesDefault::Value(op(&defaults))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SeriesError;

    fn series_a() -> TimeSeries<f64, i64> {
        [(0.0, 1), (2.0, 3), (4.0, 5)].into_iter().collect()
    }

    fn series_b() -> TimeSeries<f64, i64> {
        [(1.0, 10), (2.0, 20)].into_iter().collect()
    }

    #[test]
    fn test_iter_merge_orders_by_time() {
        let a = series_a();
        let b = series_b();
        let yields: Vec<_> = iter_merge(&[&a, &b]).unwrap().collect();
        let times: Vec<f64> = yields.iter().map(|(t, _)| *t).collect();
        assert_eq!(times, vec![0.0, 1.0, 2.0, 2.0, 4.0]);
        // states carry the running value of every input
        assert_eq!(yields[0].1, vec![1, 10]); // b not yet measured: default
        assert_eq!(yields[1].1, vec![1, 10]);
        // tied timestamps resolve in input order
        assert_eq!(yields[2].1, vec![3, 10]);
        assert_eq!(yields[3].1, vec![3, 20]);
        assert_eq!(yields[4].1, vec![5, 20]);
    }

    #[test]
    fn test_iter_merge_rejects_floating() {
        let a = series_a();
        let floating: TimeSeries<f64, i64> = TimeSeries::new();
        assert!(matches!(
            iter_merge(&[&a, &floating]),
            Err(SeriesError::FloatingSeries)
        ));
    }

    #[test]
    fn test_merge_collapses_ties() {
        let a = series_a();
        let b = series_b();
        let merged = merge(&[&a, &b], None, true).unwrap();
        let times: Vec<f64> = merged.iter().map(|(t, _)| *t).collect();
        // the state at t=1 repeats the state at t=0, so the compact
        // write drops it; the tie at t=2 collapses to the last state
        assert_eq!(times, vec![0.0, 2.0, 4.0]);
        assert_eq!(merged.get(2.0).unwrap(), vec![3, 20]);
    }

    #[test]
    fn test_merge_singleton_identity() {
        let a = series_a();
        let merged = merge_with(&[&a], None, true, |state| state[0]).unwrap();
        assert_eq!(merged, a);
    }

    #[test]
    fn test_merge_empty_list() {
        let merged: TimeSeries<f64, Vec<i64>> = merge(&[], None, true).unwrap();
        assert!(merged.is_floating());
    }

    #[test]
    fn test_sum_all() {
        let a = series_a();
        let b = series_b();
        let total = sum_all(&[&a, &b]).unwrap();
        assert_eq!(total.get(0.0).unwrap(), 11);
        assert_eq!(total.get(1.5).unwrap(), 11);
        assert_eq!(total.get(2.0).unwrap(), 23);
        assert_eq!(total.get(4.0).unwrap(), 25);
    }

    #[test]
    fn test_sum_identity_fold() {
        let a = series_a();
        let b = series_b();
        // folding through the empty identity equals the binary sum
        let folded = sum_all(&[&a]).unwrap().sum_with(&b).unwrap();
        assert_eq!(folded, a.sum_with(&b).unwrap());
    }

    #[test]
    fn test_default_inference_unanimous() {
        let mut a = series_a();
        let mut b = series_b();
        a.set_default(SeriesDefault::Value(2));
        b.set_default(SeriesDefault::Value(2));
        let total = sum_all(&[&a, &b]).unwrap();
        assert_eq!(total.default_policy(), &SeriesDefault::Value(4));
    }

    #[test]
    fn test_default_inference_mixed_extends_back() {
        let mut a = series_a();
        let b = series_b();
        a.set_default(SeriesDefault::Value(2));
        let total = sum_all(&[&a, &b]).unwrap();
        assert_eq!(total.default_policy(), &SeriesDefault::ExtendBack);
    }

    #[test]
    fn test_merge_carries_missing_values() {
        let mut a: TimeSeries<f64, Option<bool>> =
            TimeSeries::with_default(SeriesDefault::Value(None));
        let mut b: TimeSeries<f64, Option<bool>> =
            TimeSeries::with_default(SeriesDefault::Value(None));
        a.set(0.0, None, false);
        b.set(0.0, Some(true), false);
        let merged = merge(&[&a, &b], None, true).unwrap();
        let state = merged.get(0.0).unwrap();
        assert!(state.contains(&None));
        assert!(state.contains(&Some(true)));
    }
}
