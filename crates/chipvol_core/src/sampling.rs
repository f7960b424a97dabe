//! Sampling callbacks consumed by the simulation engine
//!
//! The engine knows nothing about distributions. Callers describe revenue,
//! share and price uncertainty by implementing [`SalesSampler`] (or by
//! wrapping three closures in an [`FnSampler`]).
//!
//! # Correlation across periods
//!
//! The engine calls `revenue` and `shares` once per (trial, period) and
//! `price` once per (trial, period, variant) with a positive share. Each call
//! is independent: the engine never correlates draws across periods or across
//! variants, and it never caches results. A parameter that must be shared by
//! every period of a trial (e.g. one gross-margin draw) has to be pre-sampled
//! by the caller once per trial and read by reference inside the callbacks.
//! [`SalesSampler::begin_trial`] marks the trial boundary for exactly that
//! purpose.

use crate::model::{Period, ShareMap, Variant};

/// Source of revenue, share and price draws
pub trait SalesSampler {
    /// Called once at the start of every trial, before any other callback.
    ///
    /// Pre-sample trial-wide parameters here. The default does nothing.
    fn begin_trial(&mut self, _trial: usize) {}

    /// Total accelerator revenue for the period
    fn revenue(&mut self, period: &Period) -> f64;

    /// Share of the period's revenue per variant. Should sum to 1; the
    /// engine does not check.
    fn shares(&mut self, period: &Period) -> ShareMap;

    /// Unit price of a variant in the period. Only called for variants with
    /// a positive share.
    fn price(&mut self, period: &Period, variant: &Variant) -> f64;
}

impl<S: SalesSampler + ?Sized> SalesSampler for &mut S {
    fn begin_trial(&mut self, trial: usize) {
        (**self).begin_trial(trial);
    }

    fn revenue(&mut self, period: &Period) -> f64 {
        (**self).revenue(period)
    }

    fn shares(&mut self, period: &Period) -> ShareMap {
        (**self).shares(period)
    }

    fn price(&mut self, period: &Period, variant: &Variant) -> f64 {
        (**self).price(period, variant)
    }
}

/// Adapter turning three closures into a [`SalesSampler`]
pub struct FnSampler<R, S, P> {
    revenue: R,
    shares: S,
    price: P,
}

impl<R, S, P> FnSampler<R, S, P>
where
    R: FnMut(&Period) -> f64,
    S: FnMut(&Period) -> ShareMap,
    P: FnMut(&Period, &Variant) -> f64,
{
    pub fn new(revenue: R, shares: S, price: P) -> Self {
        Self {
            revenue,
            shares,
            price,
        }
    }
}

impl<R, S, P> SalesSampler for FnSampler<R, S, P>
where
    R: FnMut(&Period) -> f64,
    S: FnMut(&Period) -> ShareMap,
    P: FnMut(&Period, &Variant) -> f64,
{
    fn revenue(&mut self, period: &Period) -> f64 {
        (self.revenue)(period)
    }

    fn shares(&mut self, period: &Period) -> ShareMap {
        (self.shares)(period)
    }

    fn price(&mut self, period: &Period, variant: &Variant) -> f64 {
        (self.price)(period, variant)
    }
}
