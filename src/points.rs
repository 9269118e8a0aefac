use crate::common::time::TimePoint;
use std::cmp::Ordering;

/// Ordered measurement storage: a vector of `(time, value)` pairs kept
/// sorted by time with no duplicate keys, searched by bisection. Rank
/// access and slice iteration come for free from the backing vector.
#[derive(Clone, Debug)]
pub(crate) struct PointList<T, V>(Vec<(T, V)>);

impl<T: TimePoint, V> PointList<T, V> {
    pub fn new() -> Self {
        PointList(Vec::new())
    }

    /// Build from arbitrary input order. Entries are stably sorted by
    /// time; duplicates at an identical time resolve last-wins.
    pub fn from_unsorted(mut pairs: Vec<(T, V)>) -> Self {
        pairs.sort_by(|a, b| a.0.cmp_time(&b.0));
        // stable sort keeps input order within a tie, so the last
        // entry of each run is the one to keep
        let mut deduped: Vec<(T, V)> = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let ties_with_last = deduped
                .last()
                .map_or(false, |last| last.0.cmp_time(&pair.0) == Ordering::Equal);
            if ties_with_last {
                let last_index = deduped.len() - 1;
                deduped[last_index] = pair;
            } else {
                deduped.push(pair);
            }
        }
        PointList(deduped)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[(T, V)] {
        &self.0
    }

    pub fn first(&self) -> Option<&(T, V)> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&(T, V)> {
        self.0.last()
    }

    pub fn get(&self, index: usize) -> Option<&(T, V)> {
        self.0.get(index)
    }

    /// Index of the first entry with time >= `t`.
    pub fn bisect_left(&self, t: &T) -> usize {
        self.0.partition_point(|(pt, _)| pt.cmp_time(t) == Ordering::Less)
    }

    /// Index of the first entry with time > `t`.
    pub fn bisect_right(&self, t: &T) -> usize {
        self.0.partition_point(|(pt, _)| pt.cmp_time(t) != Ordering::Greater)
    }

    pub fn find(&self, t: &T) -> Option<usize> {
        self.0.binary_search_by(|(pt, _)| pt.cmp_time(t)).ok()
    }

    pub fn insert_or_replace(&mut self, t: T, v: V) {
        match self.0.binary_search_by(|(pt, _)| pt.cmp_time(&t)) {
            Ok(pos) => self.0[pos] = (t, v),
            Err(pos) => self.0.insert(pos, (t, v)),
        }
    }

    pub fn remove_exact(&mut self, t: &T) -> Option<V> {
        self.find(t).map(|pos| self.0.remove(pos).1)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (T, V)> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PointList<f64, i64> {
        PointList::from_unsorted(vec![(6.0, 1), (1.0, 2), (8.0, 4), (2.0, 3)])
    }

    #[test]
    fn test_from_unsorted_sorts() {
        let points = sample();
        let times: Vec<f64> = points.iter().map(|(t, _)| *t).collect();
        assert_eq!(times, vec![1.0, 2.0, 6.0, 8.0]);
    }

    #[test]
    fn test_duplicates_last_wins() {
        let points = PointList::from_unsorted(vec![(1.0, 10), (2.0, 20), (1.0, 11)]);
        assert_eq!(points.len(), 2);
        assert_eq!(points.get(0), Some(&(1.0, 11)));
    }

    #[test]
    fn test_bisect() {
        let points = sample();
        assert_eq!(points.bisect_right(&1.0), 1);
        assert_eq!(points.bisect_right(&1.5), 1);
        assert_eq!(points.bisect_left(&1.0), 0);
        assert_eq!(points.bisect_right(&0.0), 0);
        assert_eq!(points.bisect_right(&9.0), 4);
    }

    #[test]
    fn test_insert_or_replace() {
        let mut points = sample();
        points.insert_or_replace(1.5, 9);
        assert_eq!(points.len(), 5);
        points.insert_or_replace(1.5, 7);
        assert_eq!(points.len(), 5);
        assert_eq!(points.get(1), Some(&(1.5, 7)));
    }

    #[test]
    fn test_remove_exact() {
        let mut points = sample();
        assert_eq!(points.remove_exact(&2.0), Some(3));
        assert_eq!(points.remove_exact(&2.0), None);
        assert_eq!(points.len(), 3);
    }
}
