use crate::common::time::TimePoint;
use crate::common::value::Scalar;
use crate::domain::Domain;
use crate::error::{SeriesError, SeriesResult};
use crate::histogram::{Histogram, HistogramValue};
use crate::series::TimeSeries;

impl<T: TimePoint, V: Clone> TimeSeries<T, V> {
    /// Number of measurements inside `[start, end]`, restricted by an
    /// optional mask. Missing boundaries extend to infinity. The
    /// `include_*` flags control whether measurements exactly on a
    /// boundary are counted.
    pub fn n_points(
        &self,
        start: Option<T>,
        end: Option<T>,
        mask: Option<&Domain<T>>,
        include_start: bool,
        include_end: bool,
    ) -> SeriesResult<usize> {
        if self.points.is_empty() {
            return Ok(0);
        }
        let start = Some(start.unwrap_or_else(T::min_sentinel));
        let end = Some(end.unwrap_or_else(T::max_sentinel));
        let (_, _, mask) = self.resolve_bounds_masked(start, end, mask)?;

        let mut count = 0;
        for (s, e) in mask.intervals() {
            let upto = if include_end {
                self.points.bisect_right(&e)
            } else {
                self.points.bisect_left(&e)
            };
            let from = if include_start {
                self.points.bisect_left(&s)
            } else {
                self.points.bisect_right(&s)
            };
            count += upto.saturating_sub(from);
        }
        Ok(count)
    }
}

impl<T: TimePoint, V: HistogramValue> TimeSeries<T, V> {
    /// Distribution of values over `[start, end]` restricted by an
    /// optional mask: each value is weighted by the total duration in
    /// seconds the series spent at it. With `normalized`, weights sum
    /// to one.
    pub fn distribution(
        &self,
        start: Option<T>,
        end: Option<T>,
        normalized: bool,
        mask: Option<&Domain<T>>,
    ) -> SeriesResult<Histogram<V>> {
        if self.is_floating() {
            return Err(SeriesError::FloatingSeries);
        }
        let (_, _, mask) = self.resolve_bounds_masked(start, end, mask)?;

        let mut histogram = Histogram::new();
        for (s, e) in mask.intervals().collect::<Vec<_>>() {
            for (t0, t1, value) in self.periods(Some(s), Some(e))? {
                let duration = T::span_seconds(T::span_between(&t0, &t1));
                histogram.add(value, duration);
            }
        }
        Ok(if normalized {
            histogram.normalized()
        } else {
            histogram
        })
    }

    /// Duration-weighted mean value over `[start, end]`, optionally
    /// restricted by a mask.
    pub fn mean(
        &self,
        start: Option<T>,
        end: Option<T>,
        mask: Option<&Domain<T>>,
    ) -> SeriesResult<f64>
    where
        V: Scalar,
    {
        self.distribution(start, end, false, mask)?
            .mean()
            .ok_or_else(|| {
                SeriesError::InvalidBounds("mean over a window of zero duration".to_string())
            })
    }
}
