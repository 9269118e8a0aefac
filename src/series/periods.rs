use crate::common::time::TimePoint;
use crate::error::SeriesResult;
use crate::series::TimeSeries;

/// Iterator over the constant-value segments of a series within a
/// bounded window, yielding `(t0, t1, value)` triples. The first
/// triple starts exactly at the window start; the last ends exactly at
/// the window end. `end` is exclusive for step-value assignment: when
/// the final measurement falls exactly on `end`, no zero-width triple
/// is produced for it.
pub struct PeriodIter<'a, T, V> {
    items: &'a [(T, V)],
    index: usize,
    t0: T,
    value: V,
    end: T,
    done: bool,
}

impl<'a, T: TimePoint, V: Clone> PeriodIter<'a, T, V> {
    pub(crate) fn new(items: &'a [(T, V)], start: T, start_value: V, end: T) -> Self {
        PeriodIter {
            items,
            index: 0,
            t0: start,
            value: start_value,
            end,
            done: false,
        }
    }
}

impl<'a, T: TimePoint, V: Clone> Iterator for PeriodIter<'a, T, V> {
    type Item = (T, T, V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Some((t1, v1)) = self.items.get(self.index) {
            self.index += 1;
            let triple = (self.t0, *t1, self.value.clone());
            self.t0 = *t1;
            self.value = v1.clone();
            return Some(triple);
        }
        self.done = true;
        if self.t0.is_before(&self.end) {
            return Some((self.t0, self.end, self.value.clone()));
        }
        None
    }
}

impl<T: TimePoint, V: Clone> TimeSeries<T, V> {
    /// Iterate the periods of the step function over `[start, end]`.
    /// Missing boundaries extend to the infinity sentinels.
    pub fn iter_periods(
        &self,
        start: Option<T>,
        end: Option<T>,
    ) -> SeriesResult<PeriodIter<'_, T, V>> {
        let (start, end) = self.resolve_bounds(start, end, true)?;
        let start_index = self.points.bisect_right(&start);
        let start_value = match start_index.checked_sub(1).and_then(|i| self.points.get(i)) {
            Some((_, v)) => v.clone(),
            None => self.default_value()?,
        };
        let end_index = self.points.bisect_right(&end);
        Ok(PeriodIter::new(
            &self.points.as_slice()[start_index..end_index],
            start,
            start_value,
            end,
        ))
    }

    /// Like [`iter_periods`](Self::iter_periods) but only yielding
    /// triples accepted by the predicate.
    pub fn iter_periods_where<'s, F>(
        &'s self,
        start: Option<T>,
        end: Option<T>,
        predicate: F,
    ) -> SeriesResult<impl Iterator<Item = (T, T, V)> + 's>
    where
        F: Fn(&T, &T, &V) -> bool + 's,
    {
        Ok(self
            .iter_periods(start, end)?
            .filter(move |(t0, t1, v)| predicate(t0, t1, v)))
    }

    /// Eagerly materialized periods, for callers that mutate the
    /// series while walking them.
    pub(crate) fn periods(
        &self,
        start: Option<T>,
        end: Option<T>,
    ) -> SeriesResult<Vec<(T, T, V)>> {
        Ok(self.iter_periods(start, end)?.collect())
    }
}
