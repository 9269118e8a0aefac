use crate::common::time::TimePoint;
use crate::common::value::{Lerp, Scalar};
use crate::error::{SeriesError, SeriesResult};
use crate::histogram::HistogramValue;
use crate::series::TimeSeries;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::Display;
use std::str::FromStr;
use tracing::debug;

/// How point queries behave between measurements.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interpolation {
    /// The value of the most recent prior measurement.
    #[default]
    Previous,
    /// Linear interpolation between the surrounding measurements.
    Linear,
}

impl Interpolation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interpolation::Previous => "previous",
            Interpolation::Linear => "linear",
        }
    }
}

impl Display for Interpolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Interpolation {
    type Err = SeriesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            s if s.eq_ignore_ascii_case("previous") => Ok(Interpolation::Previous),
            s if s.eq_ignore_ascii_case("linear") => Ok(Interpolation::Linear),
            other => Err(SeriesError::unknown_option(
                "interpolation",
                other,
                "previous, linear",
            )),
        }
    }
}

/// Where a moving-average window sits relative to its output time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    #[default]
    Center,
    Left,
    Right,
}

impl Placement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Placement::Center => "center",
            Placement::Left => "left",
            Placement::Right => "right",
        }
    }
}

impl Display for Placement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Placement {
    type Err = SeriesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            s if s.eq_ignore_ascii_case("center") => Ok(Placement::Center),
            s if s.eq_ignore_ascii_case("left") => Ok(Placement::Left),
            s if s.eq_ignore_ascii_case("right") => Ok(Placement::Right),
            other => Err(SeriesError::unknown_option(
                "placement",
                other,
                "center, left, right",
            )),
        }
    }
}

/// Aggregation applied to each cell of the interval resampler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateOp {
    /// Time-weighted mean over the cell.
    #[default]
    Mean,
    Max,
    Min,
}

impl AggregateOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateOp::Mean => "mean",
            AggregateOp::Max => "max",
            AggregateOp::Min => "min",
        }
    }

    fn init(&self, value: f64) -> f64 {
        match self {
            AggregateOp::Mean => 0.0,
            AggregateOp::Max | AggregateOp::Min => value,
        }
    }

    fn update(&self, agg: f64, duration: f64, value: f64) -> f64 {
        match self {
            AggregateOp::Mean => agg + duration * value,
            AggregateOp::Max => agg.max(value),
            AggregateOp::Min => agg.min(value),
        }
    }

    fn finish(&self, agg: f64, cell_duration: f64) -> f64 {
        match self {
            AggregateOp::Mean => agg / cell_duration,
            AggregateOp::Max | AggregateOp::Min => agg,
        }
    }
}

impl Display for AggregateOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AggregateOp {
    type Err = SeriesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            s if s.eq_ignore_ascii_case("mean") => Ok(AggregateOp::Mean),
            s if s.eq_ignore_ascii_case("max") => Ok(AggregateOp::Max),
            s if s.eq_ignore_ascii_case("min") => Ok(AggregateOp::Min),
            other => Err(SeriesError::unknown_option(
                "aggregation",
                other,
                "mean, max, min",
            )),
        }
    }
}

fn check_period<T: TimePoint>(start: T, end: T, period: T::Span) -> SeriesResult<()> {
    let period_seconds = T::span_seconds(period);
    if period_seconds <= 0.0 {
        return Err(SeriesError::InvalidPeriod(
            "sampling period must be > 0".to_string(),
        ));
    }
    let window_seconds = T::span_seconds(T::span_between(&start, &end));
    if period_seconds > window_seconds {
        return Err(SeriesError::InvalidPeriod(
            "sampling period is greater than the duration between start and end".to_string(),
        ));
    }
    Ok(())
}

/// Grid points `start, start+period, …` up to and including `end`.
fn build_grid<T: TimePoint>(start: T, end: T, period: T::Span) -> Vec<T> {
    let mut grid = vec![start];
    loop {
        let next = grid[grid.len() - 1].add_span(period);
        if next.is_after(&end) {
            break;
        }
        grid.push(next);
    }
    grid
}

/// Largest grid index whose time is <= `t`. The grid always starts at
/// or before `t` here, so the index is well defined.
fn cell_of<T: TimePoint>(grid: &[T], t: &T) -> usize {
    grid.partition_point(|g| g.cmp_time(t) != Ordering::Greater)
        .saturating_sub(1)
}

impl<T: TimePoint, V: Clone> TimeSeries<T, V> {
    /// Sample the series at regular times `start, start+period, …, end`
    /// (inclusive of `end`). Boundaries default to the first and last
    /// measurements.
    pub fn sample(
        &self,
        period: T::Span,
        start: Option<T>,
        end: Option<T>,
        interpolation: Interpolation,
    ) -> SeriesResult<Vec<(T, V)>>
    where
        V: Lerp,
    {
        let (start, end) = self.resolve_bounds(start, end, false)?;
        check_period::<T>(start, end, period)?;

        let mut result = Vec::new();
        let mut current = start;
        while current.cmp_time(&end) != Ordering::Greater {
            result.push((current, self.get_interpolated(current, interpolation)?));
            current = current.add_span(period);
        }
        Ok(result)
    }
}

impl<T: TimePoint, V: Clone + PartialEq + Scalar> TimeSeries<T, V> {
    /// Resample onto a regular grid over `[start, end)`, aggregating
    /// the step function over each grid cell by the time-weighted
    /// mean, the maximum or the minimum. Every grid point in
    /// `[start, end)` receives a value; `end` itself is excluded from
    /// the output.
    pub fn sample_interval(
        &self,
        period: T::Span,
        start: Option<T>,
        end: Option<T>,
        operation: AggregateOp,
    ) -> SeriesResult<Vec<(T, f64)>> {
        let (start, end) = self.resolve_bounds(start, end, false)?;
        check_period::<T>(start, end, period)?;

        let grid = build_grid(start, end, period);
        let n_cells = grid.len() - 1;
        debug!(n_cells, op = %operation, "interval resample");

        // the inflection sequence covering [start, end]: the window
        // start, every measurement inside, and the window end
        let mut inflections: Vec<(T, f64)> = Vec::new();
        inflections.push((start, self.get(start)?.to_f64()));
        let from = self.points.bisect_left(&start);
        let to = self.points.bisect_right(&end);
        for (t, v) in &self.points.as_slice()[from..to] {
            inflections.push((*t, v.to_f64()));
        }
        inflections.push((end, self.get(end)?.to_f64()));

        let (mut cell_start, mut cell_end) = (grid[0], grid[1]);
        let mut i0 = 0usize;
        let (mut t0, mut v0) = inflections[0];
        let mut agg = operation.init(v0);

        // sparse (cell, aggregate) emissions; cells skipped entirely
        // hold a constant value and are forward-filled below
        let mut emitted: Vec<(usize, f64)> = Vec::new();
        for &(t1, v1) in &inflections[1..] {
            let i1 = cell_of(&grid, &t1).min(n_cells);
            if i1 != i0 {
                let tail = T::span_seconds(T::span_between(&t0, &cell_end));
                agg = operation.update(agg, tail, v0);
                let width = T::span_seconds(T::span_between(&cell_start, &cell_end));
                emitted.push((i0, operation.finish(agg, width)));
                if i1 > i0 + 1 {
                    emitted.push((i0 + 1, v0));
                }
                if i1 == n_cells {
                    break;
                }
                cell_start = grid[i1];
                cell_end = grid[i1 + 1];
                i0 = i1;
                t0 = cell_start;
                agg = operation.init(v0);
            }
            let duration = T::span_seconds(T::span_between(&t0, &t1));
            agg = operation.update(agg, duration, v0);
            i0 = i1;
            t0 = t1;
            v0 = v1;
        }

        let mut result = Vec::with_capacity(n_cells);
        let mut next_emitted = 0;
        let mut last = f64::NAN;
        for (k, grid_time) in grid.iter().enumerate().take(n_cells) {
            while next_emitted < emitted.len() && emitted[next_emitted].0 == k {
                last = emitted[next_emitted].1;
                next_emitted += 1;
            }
            result.push((*grid_time, last));
        }
        Ok(result)
    }
}

impl<T: TimePoint, V: HistogramValue + Scalar> TimeSeries<T, V> {
    /// Windowed averages at regular output times: for each `t` in
    /// `start, start+period, …, end`, the time-weighted mean over a
    /// window of `window` (defaulting to `period`) placed around,
    /// after or before `t`.
    pub fn moving_average(
        &self,
        period: T::Span,
        window: Option<T::Span>,
        start: Option<T>,
        end: Option<T>,
        placement: Placement,
    ) -> SeriesResult<Vec<(T, f64)>> {
        let (start, end) = self.resolve_bounds(start, end, false)?;
        check_period::<T>(start, end, period)?;
        let window = window.unwrap_or(period);
        let half = T::span_half(window);

        let mut result = Vec::new();
        let mut current = start;
        while current.cmp_time(&end) != Ordering::Greater {
            let (window_start, window_end) = match placement {
                Placement::Center => (current.sub_span(half), current.add_span(half)),
                Placement::Left => (current, current.add_span(window)),
                Placement::Right => (current.sub_span(window), current),
            };
            let mean = self.mean(Some(window_start), Some(window_end), None)?;
            result.push((current, mean));
            current = current.add_span(period);
        }
        Ok(result)
    }
}
