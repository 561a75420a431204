//! Periodized time-series input: periods, bases and the rule contract
//!
//! A [`Basis`] is an ordered sequence of non-overlapping [`BasisPeriod`]s.
//! Each period carries a closed set of facts ([`PeriodFacts`]), shared links
//! to the source records it overlaps ([`Couplings`]), and a per-period memo
//! of [`Rule`] results keyed by result type.

mod facts;
mod period;
mod rule;
mod timeline;

pub use facts::{BasisFacts, PeriodFacts};
pub use period::{BasisPeriod, Couplings};
pub use rule::{rule_fn, Rule, RuleFn};
pub use timeline::Basis;
