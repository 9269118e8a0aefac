use crate::common::time::TimePoint;
use crate::common::value::Truthy;
use crate::domain::Domain;
use crate::error::SeriesResult;
use crate::merge::sum_all;
use crate::series::TimeSeries;
use std::ops::{Mul, Sub};

/// Elementwise combinations. Operations between two series evaluate at
/// the union of their measurement times; operations against a bare
/// scalar keep the measurement times of the left operand. Results
/// always carry the `ExtendBack` default.
impl<T: TimePoint, V: Clone + PartialEq> TimeSeries<T, V> {
    /// `result(t) = f(self(t))` at every measurement time of `self`.
    pub fn map<U, F>(&self, f: F) -> TimeSeries<T, U>
    where
        U: Clone + PartialEq,
        F: Fn(&V) -> U,
    {
        let mut result = TimeSeries::new();
        for (t, v) in self.iter() {
            result.set(*t, f(v), false);
        }
        result
    }

    /// `result(t) = f(self(t), other(t))` at the union of both series'
    /// measurement times.
    pub fn zip_with<W, U, F>(
        &self,
        other: &TimeSeries<T, W>,
        f: F,
    ) -> SeriesResult<TimeSeries<T, U>>
    where
        W: Clone + PartialEq,
        U: Clone + PartialEq,
        F: Fn(&V, &W) -> U,
    {
        let mut result = TimeSeries::new();
        for (t, v) in self.iter() {
            result.set(*t, f(v, &other.get(*t)?), false);
        }
        for (t, w) in other.iter() {
            result.set(*t, f(&self.get(*t)?, w), false);
        }
        Ok(result)
    }

    /// `sum(t) = self(t) + other(t)`.
    pub fn sum_with(&self, other: &TimeSeries<T, V>) -> SeriesResult<TimeSeries<T, V>>
    where
        V: std::ops::Add<Output = V>,
    {
        sum_all(&[self, other])
    }

    /// `difference(t) = self(t) - other(t)`.
    pub fn difference(&self, other: &TimeSeries<T, V>) -> SeriesResult<TimeSeries<T, V>>
    where
        V: Sub<Output = V>,
    {
        self.zip_with(other, |a, b| a.clone() - b.clone())
    }

    /// `multiply(t) = self(t) * other(t)`.
    pub fn multiply(&self, other: &TimeSeries<T, V>) -> SeriesResult<TimeSeries<T, V>>
    where
        V: Mul<Output = V>,
    {
        self.zip_with(other, |a, b| a.clone() * b.clone())
    }

    pub fn sum_scalar(&self, scalar: V) -> TimeSeries<T, V>
    where
        V: std::ops::Add<Output = V>,
    {
        self.map(|v| v.clone() + scalar.clone())
    }

    pub fn difference_scalar(&self, scalar: V) -> TimeSeries<T, V>
    where
        V: Sub<Output = V>,
    {
        self.map(|v| v.clone() - scalar.clone())
    }

    pub fn multiply_scalar(&self, scalar: V) -> TimeSeries<T, V>
    where
        V: Mul<Output = V>,
    {
        self.map(|v| v.clone() * scalar.clone())
    }

    pub fn logical_and<W>(
        &self,
        other: &TimeSeries<T, W>,
    ) -> SeriesResult<TimeSeries<T, bool>>
    where
        V: Truthy,
        W: Clone + PartialEq + Truthy,
    {
        self.zip_with(other, |a, b| a.is_truthy() && b.is_truthy())
    }

    pub fn logical_or<W>(
        &self,
        other: &TimeSeries<T, W>,
    ) -> SeriesResult<TimeSeries<T, bool>>
    where
        V: Truthy,
        W: Clone + PartialEq + Truthy,
    {
        self.zip_with(other, |a, b| a.is_truthy() || b.is_truthy())
    }

    pub fn logical_xor<W>(
        &self,
        other: &TimeSeries<T, W>,
    ) -> SeriesResult<TimeSeries<T, bool>>
    where
        V: Truthy,
        W: Clone + PartialEq + Truthy,
    {
        self.zip_with(other, |a, b| a.is_truthy() != b.is_truthy())
    }

    /// `true` wherever the series exceeds `value` (or reaches it, with
    /// `inclusive`).
    pub fn threshold(&self, value: V, inclusive: bool) -> TimeSeries<T, bool>
    where
        V: PartialOrd,
    {
        self.map(move |x| if inclusive { *x >= value } else { *x > value })
    }

    /// Truth value of every measurement.
    pub fn to_bool(&self, invert: bool) -> TimeSeries<T, bool>
    where
        V: Truthy,
    {
        self.map(|x| x.is_truthy() != invert)
    }

    /// The domain where the series is truthy over `[start, end]`
    /// (boundaries extend to infinity when missing).
    pub fn to_domain(&self, start: Option<T>, end: Option<T>) -> SeriesResult<Domain<T>>
    where
        V: Truthy,
    {
        let mut result = Domain::new();
        for (t0, t1, value) in self.periods(start, end)? {
            if value.is_truthy() {
                result.set_raw(t0, true, true);
                result.set_raw(t1, false, true);
            }
        }
        Ok(result)
    }
}
