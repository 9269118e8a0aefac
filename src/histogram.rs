use crate::common::hash::StableHash;
use crate::common::value::Scalar;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::Debug;

/// Bound alias for values a histogram can bucket.
pub trait HistogramValue: Clone + PartialEq + PartialOrd + StableHash + Debug {}

impl<V: Clone + PartialEq + PartialOrd + StableHash + Debug> HistogramValue for V {}

#[derive(Clone, Debug, Serialize, Deserialize)]
enum Buckets<V> {
    /// Buckets kept sorted by value.
    Ordered(Vec<(V, f64)>),
    /// Fallback when values stop being mutually orderable (e.g. NaN
    /// keys): bucket identity switches to a stable hash.
    Hashed(AHashMap<u64, (V, f64)>),
}

/// A value → total-duration weighting, the sink of `distribution`.
/// Weights are durations in seconds and need not be integral.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Histogram<V> {
    buckets: Buckets<V>,
}

impl<V: HistogramValue> Default for Histogram<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: HistogramValue> Histogram<V> {
    pub fn new() -> Self {
        Histogram {
            buckets: Buckets::Ordered(Vec::new()),
        }
    }

    pub fn from_weights(pairs: impl IntoIterator<Item = (V, f64)>) -> Self {
        let mut result = Self::new();
        for (value, weight) in pairs {
            result.add(value, weight);
        }
        result
    }

    /// Accumulate `weight` into the bucket for `value`. If `value`
    /// does not order against an existing bucket, every bucket is
    /// re-keyed by stable hash and accumulation proceeds there.
    pub fn add(&mut self, value: V, weight: f64) {
        if let Buckets::Ordered(buckets) = &mut self.buckets {
            let mut insert_at = Some(buckets.len());
            for (i, (v, w)) in buckets.iter_mut().enumerate() {
                if v == &value {
                    *w += weight;
                    return;
                }
                match (*v).partial_cmp(&value) {
                    Some(Ordering::Greater) => {
                        insert_at = Some(i);
                        break;
                    }
                    Some(_) => {}
                    None => {
                        insert_at = None;
                        break;
                    }
                }
            }
            match insert_at {
                Some(at) => {
                    buckets.insert(at, (value, weight));
                    return;
                }
                // an unorderable pair was hit: re-key every bucket
                None => self.rehash(),
            }
        }
        if let Buckets::Hashed(buckets) = &mut self.buckets {
            let entry = buckets.entry(value.stable_hash()).or_insert((value, 0.0));
            entry.1 += weight;
        }
    }

    fn rehash(&mut self) {
        if let Buckets::Ordered(buckets) = &mut self.buckets {
            let mut map = AHashMap::with_capacity(buckets.len());
            for (v, w) in buckets.drain(..) {
                let entry = map.entry(v.stable_hash()).or_insert((v, 0.0));
                entry.1 += w;
            }
            self.buckets = Buckets::Hashed(map);
        }
    }

    pub fn weight(&self, value: &V) -> f64 {
        match &self.buckets {
            Buckets::Ordered(buckets) => buckets
                .iter()
                .find(|(v, _)| v == value)
                .map_or(0.0, |(_, w)| *w),
            Buckets::Hashed(buckets) => buckets
                .get(&value.stable_hash())
                .map_or(0.0, |(_, w)| *w),
        }
    }

    pub fn n_buckets(&self) -> usize {
        match &self.buckets {
            Buckets::Ordered(buckets) => buckets.len(),
            Buckets::Hashed(buckets) => buckets.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.n_buckets() == 0
    }

    pub fn total(&self) -> f64 {
        self.iter().map(|(_, w)| w).sum()
    }

    /// Buckets in a deterministic order: value order normally, stable
    /// hash order after the fallback kicked in.
    pub fn iter(&self) -> Box<dyn Iterator<Item = (&V, f64)> + '_> {
        match &self.buckets {
            Buckets::Ordered(buckets) => {
                Box::new(buckets.iter().map(|(v, w)| (v, *w)))
            }
            Buckets::Hashed(buckets) => {
                let mut keys: Vec<&u64> = buckets.keys().collect();
                keys.sort_unstable();
                Box::new(keys.into_iter().map(move |k| {
                    let (v, w) = &buckets[k];
                    (v, *w)
                }))
            }
        }
    }

    /// Fold another histogram into this one.
    pub fn merge(&mut self, other: &Histogram<V>) {
        for (v, w) in other.iter() {
            self.add(v.clone(), w);
        }
    }

    /// A copy whose weights sum to one. An empty histogram normalizes
    /// to an empty histogram.
    pub fn normalized(&self) -> Histogram<V> {
        let total = self.total();
        if total == 0.0 {
            return self.clone();
        }
        let mut result = self.clone();
        match &mut result.buckets {
            Buckets::Ordered(buckets) => {
                for (_, w) in buckets.iter_mut() {
                    *w /= total;
                }
            }
            Buckets::Hashed(buckets) => {
                for (_, w) in buckets.values_mut() {
                    *w /= total;
                }
            }
        }
        result
    }
}

impl<V: HistogramValue + Scalar> Histogram<V> {
    /// Duration-weighted mean of the bucket values. `None` when the
    /// histogram carries no weight.
    pub fn mean(&self) -> Option<f64> {
        let total = self.total();
        if total == 0.0 {
            return None;
        }
        let weighted: f64 = self.iter().map(|(v, w)| v.to_f64() * w).sum();
        Some(weighted / total)
    }
}

impl<V: HistogramValue> PartialEq for Histogram<V> {
    fn eq(&self, other: &Self) -> bool {
        if self.n_buckets() != other.n_buckets() {
            return false;
        }
        self.iter()
            .all(|(v, w)| (other.weight(v) - w).abs() <= f64::EPSILON * w.abs().max(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_accumulate_and_total() {
        let mut hist = Histogram::new();
        hist.add(1.0, 2.0);
        hist.add(3.0, 1.0);
        hist.add(1.0, 4.0);
        assert_eq!(hist.n_buckets(), 2);
        assert_eq!(hist.weight(&1.0), 6.0);
        assert_eq!(hist.total(), 7.0);
    }

    #[test]
    fn test_mean() {
        let hist = Histogram::from_weights([(0.0, 3.0), (10.0, 1.0)]);
        assert_relative_eq!(hist.mean().unwrap(), 2.5);
        let empty: Histogram<f64> = Histogram::new();
        assert_eq!(empty.mean(), None);
    }

    #[test]
    fn test_normalized_sums_to_one() {
        let hist = Histogram::from_weights([(1.0, 2.0), (2.0, 6.0)]);
        let norm = hist.normalized();
        assert_relative_eq!(norm.total(), 1.0);
        assert_relative_eq!(norm.weight(&2.0), 0.75);
        // mean is invariant under normalization
        assert_relative_eq!(hist.mean().unwrap(), norm.mean().unwrap());
    }

    #[test]
    fn test_unorderable_values_fall_back_to_hash() {
        let mut hist = Histogram::new();
        hist.add(1.0, 2.0);
        hist.add(f64::NAN, 3.0);
        hist.add(1.0, 1.0);
        assert_eq!(hist.n_buckets(), 2);
        assert_eq!(hist.weight(&1.0), 3.0);
        assert_eq!(hist.weight(&f64::NAN), 3.0);
        assert_eq!(hist.total(), 6.0);
    }

    #[test]
    fn test_merge() {
        let mut a = Histogram::from_weights([(1, 1.0), (2, 2.0)]);
        let b = Histogram::from_weights([(2, 3.0), (4, 1.0)]);
        a.merge(&b);
        assert_eq!(a.weight(&2), 5.0);
        assert_eq!(a.n_buckets(), 3);
    }

    #[test]
    fn test_bucket_order() {
        let hist = Histogram::from_weights([(5.0, 1.0), (1.0, 1.0), (3.0, 1.0)]);
        let values: Vec<f64> = hist.iter().map(|(v, _)| *v).collect();
        assert_eq!(values, vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn test_serde_round_trip() {
        let hist = Histogram::from_weights([(1.0, 2.0), (2.0, 3.0)]);
        let json = serde_json::to_string(&hist).unwrap();
        let back: Histogram<f64> = serde_json::from_str(&json).unwrap();
        assert_eq!(hist, back);
    }
}
