use chrono::{DateTime, Duration, Utc};
use std::cmp::Ordering;
use std::fmt::Debug;

/// The time axis of a series: a totally-ordered point type with a
/// measurable span between any two points.
///
/// Implementations exist for plain numeric times (`f64`, `i64`, where
/// spans are numeric differences in seconds) and for wall-clock times
/// (`DateTime<Utc>`, where spans are `chrono::Duration`). Open-ended
/// windows are expressed through the `min_sentinel`/`max_sentinel`
/// values, which compare correctly against any concrete point.
pub trait TimePoint: Copy + PartialEq + Debug {
    /// The duration between two points of this type.
    type Span: Copy + PartialEq + PartialOrd + Debug;

    /// Total-order comparison. `f64` uses `total_cmp`, so series keyed
    /// by floats never hit an incomparable pair.
    fn cmp_time(&self, other: &Self) -> Ordering;

    /// The sentinel preceding every concrete time (-∞).
    fn min_sentinel() -> Self;

    /// The sentinel following every concrete time (+∞).
    fn max_sentinel() -> Self;

    fn add_span(&self, span: Self::Span) -> Self;

    /// `end - start`.
    fn span_between(start: &Self, end: &Self) -> Self::Span;

    fn span_seconds(span: Self::Span) -> f64;

    fn span_neg(span: Self::Span) -> Self::Span;

    fn span_half(span: Self::Span) -> Self::Span;

    fn zero_span() -> Self::Span;

    fn sub_span(&self, span: Self::Span) -> Self {
        self.add_span(Self::span_neg(span))
    }

    fn is_before(&self, other: &Self) -> bool {
        self.cmp_time(other) == Ordering::Less
    }

    fn is_after(&self, other: &Self) -> bool {
        self.cmp_time(other) == Ordering::Greater
    }

    fn min_time(self, other: Self) -> Self {
        if self.is_after(&other) {
            other
        } else {
            self
        }
    }

    fn max_time(self, other: Self) -> Self {
        if self.is_before(&other) {
            other
        } else {
            self
        }
    }

    /// Position of `t` within `[left, right]` as a fraction in `[0, 1]`.
    fn fraction_between(t: &Self, left: &Self, right: &Self) -> f64 {
        let total = Self::span_seconds(Self::span_between(left, right));
        if total == 0.0 {
            return 0.0;
        }
        Self::span_seconds(Self::span_between(left, t)) / total
    }
}

impl TimePoint for f64 {
    type Span = f64;

    fn cmp_time(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }

    fn min_sentinel() -> Self {
        f64::NEG_INFINITY
    }

    fn max_sentinel() -> Self {
        f64::INFINITY
    }

    fn add_span(&self, span: Self::Span) -> Self {
        self + span
    }

    fn span_between(start: &Self, end: &Self) -> Self::Span {
        end - start
    }

    fn span_seconds(span: Self::Span) -> f64 {
        span
    }

    fn span_neg(span: Self::Span) -> Self::Span {
        -span
    }

    fn span_half(span: Self::Span) -> Self::Span {
        span / 2.0
    }

    fn zero_span() -> Self::Span {
        0.0
    }
}

impl TimePoint for i64 {
    type Span = i64;

    fn cmp_time(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn min_sentinel() -> Self {
        i64::MIN
    }

    fn max_sentinel() -> Self {
        i64::MAX
    }

    fn add_span(&self, span: Self::Span) -> Self {
        self.saturating_add(span)
    }

    fn span_between(start: &Self, end: &Self) -> Self::Span {
        end.saturating_sub(*start)
    }

    fn span_seconds(span: Self::Span) -> f64 {
        span as f64
    }

    fn span_neg(span: Self::Span) -> Self::Span {
        -span
    }

    fn span_half(span: Self::Span) -> Self::Span {
        span / 2
    }

    fn zero_span() -> Self::Span {
        0
    }
}

impl TimePoint for DateTime<Utc> {
    type Span = Duration;

    fn cmp_time(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn min_sentinel() -> Self {
        DateTime::<Utc>::MIN_UTC
    }

    fn max_sentinel() -> Self {
        DateTime::<Utc>::MAX_UTC
    }

    fn add_span(&self, span: Self::Span) -> Self {
        // saturate at the sentinels rather than overflow
        self.checked_add_signed(span).unwrap_or_else(|| {
            if span >= Duration::zero() {
                DateTime::<Utc>::MAX_UTC
            } else {
                DateTime::<Utc>::MIN_UTC
            }
        })
    }

    fn span_between(start: &Self, end: &Self) -> Self::Span {
        *end - *start
    }

    fn span_seconds(span: Self::Span) -> f64 {
        match span.num_microseconds() {
            Some(us) => us as f64 / 1e6,
            None => span.num_milliseconds() as f64 / 1e3,
        }
    }

    fn span_neg(span: Self::Span) -> Self::Span {
        -span
    }

    fn span_half(span: Self::Span) -> Self::Span {
        span / 2
    }

    fn zero_span() -> Self::Span {
        Duration::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_float_sentinels_order() {
        let t = 1.5f64;
        assert_eq!(f64::min_sentinel().cmp_time(&t), Ordering::Less);
        assert_eq!(f64::max_sentinel().cmp_time(&t), Ordering::Greater);
        assert_eq!(t.cmp_time(&1.5), Ordering::Equal);
    }

    #[test]
    fn test_datetime_sentinels_order() {
        let t = Utc.with_ymd_and_hms(2012, 1, 4, 12, 0, 0).unwrap();
        assert!(DateTime::<Utc>::min_sentinel().is_before(&t));
        assert!(DateTime::<Utc>::max_sentinel().is_after(&t));
    }

    #[test]
    fn test_datetime_span_seconds() {
        let a = Utc.with_ymd_and_hms(2012, 1, 1, 0, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2012, 1, 2, 6, 0, 0).unwrap();
        let span = TimePoint::span_between(&a, &b);
        assert_eq!(DateTime::<Utc>::span_seconds(span), 108_000.0);
    }

    #[test]
    fn test_fraction_between() {
        assert_eq!(f64::fraction_between(&3.0, &2.0, &6.0), 0.25);
        assert_eq!(f64::fraction_between(&2.0, &2.0, &2.0), 0.0);
    }

    #[test]
    fn test_saturating_datetime_add() {
        let t = DateTime::<Utc>::MAX_UTC;
        assert_eq!(t.add_span(Duration::days(1)), DateTime::<Utc>::MAX_UTC);
    }
}
