//! Calculation rule contract

use super::period::BasisPeriod;
use crate::error::Result;
use std::marker::PhantomData;

/// A pure calculation from a period to a typed result.
///
/// Results are memoized on the period per `Output` type, so a rule set must
/// register at most one rule per result type.
pub trait Rule: Send + Sync {
    type Output: Clone + Send + 'static;

    fn compute(&self, period: &BasisPeriod) -> Result<Self::Output>;
}

/// Adapts a closure into a [`Rule`]
pub struct RuleFn<F, T> {
    f: F,
    _output: PhantomData<fn() -> T>,
}

pub fn rule_fn<F, T>(f: F) -> RuleFn<F, T>
where
    F: Fn(&BasisPeriod) -> Result<T> + Send + Sync,
    T: Clone + Send + 'static,
{
    RuleFn {
        f,
        _output: PhantomData,
    }
}

impl<F, T> Rule for RuleFn<F, T>
where
    F: Fn(&BasisPeriod) -> Result<T> + Send + Sync,
    T: Clone + Send + 'static,
{
    type Output = T;

    fn compute(&self, period: &BasisPeriod) -> Result<T> {
        (self.f)(period)
    }
}
