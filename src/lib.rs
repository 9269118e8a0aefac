//! Time series of measurements taken at unevenly-spaced times,
//! manipulated as step functions: between measurements a series holds
//! the value of the most recent prior measurement.
//!
//! The crate centers on [`TimeSeries`], an ordered time → value map
//! with point and interval read/write semantics. Everything else is
//! built on its period iterator: regular resampling with interval
//! aggregation ([`TimeSeries::sample_interval`]), windowed averages,
//! heap-driven n-ary merging ([`merge`]), duration-weighted value
//! distributions ([`Histogram`]) and boolean masks ([`Domain`]).
//!
//! Time is abstract: any [`TimePoint`] works, with implementations
//! for `f64`/`i64` (spans in seconds) and `chrono::DateTime<Utc>`
//! (spans as `chrono::Duration`).

pub mod calendar;
mod common;
mod domain;
mod error;
mod histogram;
mod merge;
mod points;
mod sampling;
mod series;

pub use common::hash::StableHash;
pub use common::time::TimePoint;
pub use common::value::{Lerp, Scalar, Truthy};
pub use domain::Domain;
pub use error::{SeriesError, SeriesResult};
pub use histogram::{Histogram, HistogramValue};
pub use merge::{iter_merge, merge, merge_with, sum_all, MergeIter};
pub use sampling::{AggregateOp, Interpolation, Placement};
pub use series::{PeriodIter, SeriesDefault, TimeSeries};
