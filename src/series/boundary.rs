use crate::common::time::TimePoint;
use crate::domain::Domain;
use crate::error::{SeriesError, SeriesResult};
use crate::series::TimeSeries;
use std::cmp::Ordering;

/// Normalization of optional `(start, end, mask)` arguments into a
/// concrete window. Missing boundaries fall back to the infinity
/// sentinels when allowed, otherwise to the first/last recorded time.
impl<T: TimePoint, V: Clone> TimeSeries<T, V> {
    fn resolve_bound(
        &self,
        value: Option<T>,
        allow_infinite: bool,
        lower: bool,
    ) -> SeriesResult<T> {
        match value {
            Some(t) => Ok(t),
            None if allow_infinite => Ok(if lower {
                T::min_sentinel()
            } else {
                T::max_sentinel()
            }),
            None => {
                let item = if lower {
                    self.points.first()
                } else {
                    self.points.last()
                };
                item.map(|(t, _)| *t).ok_or_else(|| {
                    if self.is_floating() {
                        SeriesError::FloatingSeries
                    } else {
                        let which = if lower { "lower" } else { "upper" };
                        SeriesError::InvalidBounds(format!(
                            "no default {which} boundary for an empty series"
                        ))
                    }
                })
            }
        }
    }

    pub(crate) fn resolve_bounds(
        &self,
        start: Option<T>,
        end: Option<T>,
        allow_infinite: bool,
    ) -> SeriesResult<(T, T)> {
        let start = self.resolve_bound(start, allow_infinite, true)?;
        let end = self.resolve_bound(end, allow_infinite, false)?;
        if start.cmp_time(&end) != Ordering::Less {
            return Err(SeriesError::InvalidBounds(format!(
                "start can't be >= end ({start:?} >= {end:?})"
            )));
        }
        Ok((start, end))
    }

    /// Resolve `(start, end, mask)` into a concrete window and a mask
    /// restricted to it. A mask alone supplies both boundaries.
    pub(crate) fn resolve_bounds_masked(
        &self,
        start: Option<T>,
        end: Option<T>,
        mask: Option<&Domain<T>>,
    ) -> SeriesResult<(T, T, Domain<T>)> {
        if let Some(mask) = mask {
            if mask.is_empty() {
                return Err(SeriesError::InvalidBounds(
                    "mask can not be empty".to_string(),
                ));
            }
            if start.is_none() && end.is_none() {
                return Ok((mask.lower(), mask.upper(), mask.clone()));
            }
        }
        let (start, end) = self.resolve_bounds(start, end, false)?;
        let window = Domain::from_intervals([(start, end)]);
        let mask = match mask {
            Some(mask) => mask.intersect(&window),
            None => window,
        };
        Ok((start, end, mask))
    }
}
