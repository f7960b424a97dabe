//! Scenario-backed sampling callbacks for the estimation engine

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use chipvol_core::{Period, SalesSampler, ShareMap, Variant, normalize_shares};
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

use crate::profile::ProfileSampler;
use crate::scenario::{Scenario, ScenarioError};

struct PeriodModel {
    revenue: ProfileSampler,
    shares: Vec<(Variant, ProfileSampler)>,
    prices: HashMap<Variant, ProfileSampler>,
}

/// A scenario with every profile turned into a ready-to-sample distribution.
///
/// Immutable once built, so one compiled scenario can back any number of
/// [`ScenarioSampler`]s across threads.
pub struct CompiledScenario {
    periods: HashMap<Period, PeriodModel>,
    default_prices: HashMap<Variant, ProfileSampler>,
    trial_price_factor: Option<ProfileSampler>,
    /// Share draws that could not be normalized, across all samplers
    dropped_share_draws: AtomicUsize,
}

impl CompiledScenario {
    pub fn new(scenario: &Scenario) -> Result<Self, ScenarioError> {
        let default_prices = scenario
            .variants
            .iter()
            .map(|v| {
                let sampler = v.price.sampler(&format!("price of {}", v.name))?;
                Ok((Variant::from(v.name.as_str()), sampler))
            })
            .collect::<Result<HashMap<_, _>, ScenarioError>>()?;

        let mut periods = HashMap::with_capacity(scenario.periods.len());
        for period in &scenario.periods {
            let revenue = period
                .revenue
                .sampler(&format!("revenue of {}", period.name))?;
            let shares = period
                .shares
                .iter()
                .map(|(variant, weight)| {
                    let context = format!("share of {variant} in {}", period.name);
                    let sampler = weight.sampler(&context)?;
                    Ok((Variant::from(variant.as_str()), sampler))
                })
                .collect::<Result<Vec<_>, ScenarioError>>()?;
            let prices = period
                .prices
                .iter()
                .map(|(variant, price)| {
                    let context = format!("price of {variant} in {}", period.name);
                    let sampler = price.sampler(&context)?;
                    Ok((Variant::from(variant.as_str()), sampler))
                })
                .collect::<Result<HashMap<_, _>, ScenarioError>>()?;

            periods.insert(
                Period::from(period.name.as_str()),
                PeriodModel {
                    revenue,
                    shares,
                    prices,
                },
            );
        }

        let trial_price_factor = scenario
            .trial_price_factor
            .as_ref()
            .map(|factor| factor.sampler("trial price factor"))
            .transpose()?;

        Ok(Self {
            periods,
            default_prices,
            trial_price_factor,
            dropped_share_draws: AtomicUsize::new(0),
        })
    }

    /// Number of share draws replaced by an empty share map so far
    pub fn dropped_share_draws(&self) -> usize {
        self.dropped_share_draws.load(Ordering::Relaxed)
    }
}

/// Seed for batch `batch` of a parallel run: the `batch`-th output of a
/// generator seeded with `seed`. Distinct base seeds give unrelated batch
/// streams.
pub fn batch_seed(seed: u64, batch: usize) -> u64 {
    let mut seeder = SmallRng::seed_from_u64(seed);
    for _ in 0..batch {
        seeder.next_u64();
    }
    seeder.next_u64()
}

/// [`SalesSampler`] drawing from a [`CompiledScenario`] with its own RNG
pub struct ScenarioSampler<'a> {
    model: &'a CompiledScenario,
    rng: SmallRng,
    /// Trial-wide price multiplier, redrawn in `begin_trial`
    price_factor: f64,
}

impl<'a> ScenarioSampler<'a> {
    pub fn new(model: &'a CompiledScenario, seed: u64) -> Self {
        Self {
            model,
            rng: SmallRng::seed_from_u64(seed),
            price_factor: 1.0,
        }
    }

    /// Sampler for one batch of the parallel engine, seeded by [`batch_seed`]
    pub fn for_batch(model: &'a CompiledScenario, seed: u64, batch: usize) -> Self {
        Self::new(model, batch_seed(seed, batch))
    }

    fn period_model(&self, period: &Period) -> Option<&'a PeriodModel> {
        let model = self.model.periods.get(period);
        if model.is_none() {
            tracing::warn!(%period, "period not in scenario");
        }
        model
    }
}

impl SalesSampler for ScenarioSampler<'_> {
    fn begin_trial(&mut self, _trial: usize) {
        if let Some(factor) = &self.model.trial_price_factor {
            self.price_factor = factor.sample(&mut self.rng);
        }
    }

    fn revenue(&mut self, period: &Period) -> f64 {
        match self.period_model(period) {
            Some(model) => model.revenue.sample(&mut self.rng),
            None => 0.0,
        }
    }

    fn shares(&mut self, period: &Period) -> ShareMap {
        let Some(model) = self.period_model(period) else {
            return ShareMap::new();
        };

        let raw: ShareMap = model
            .shares
            .iter()
            .map(|(variant, weight)| (variant.clone(), weight.sample(&mut self.rng)))
            .collect();

        // A draw that cannot be normalized (weights overflowing to infinity)
        // records zero volume for every variant of the period. It is counted
        // so the run can report it.
        normalize_shares(&raw).unwrap_or_else(|err| {
            self.model.dropped_share_draws.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(%period, "dropping share draw: {err}");
            ShareMap::new()
        })
    }

    fn price(&mut self, period: &Period, variant: &Variant) -> f64 {
        let override_price = self
            .period_model(period)
            .and_then(|model| model.prices.get(variant));
        let price = match override_price.or_else(|| self.model.default_prices.get(variant)) {
            Some(sampler) => sampler.sample(&mut self.rng),
            None => {
                tracing::warn!(%period, %variant, "no price profile for variant");
                f64::NAN
            }
        };
        price * self.price_factor
    }
}
