//! Parametric value profiles used to describe uncertain scenario inputs
//!
//! A [`ValueProfile`] is the serializable description (as found in a scenario
//! file). [`ValueProfile::sampler`] validates it and builds a
//! [`ProfileSampler`] holding the constructed distribution, so that sampling
//! inside the engine's hot loop cannot fail.

use rand::Rng;
use rand::distr::{Distribution, Uniform};
use rand_distr::{LogNormal, Normal, Triangular};
use serde::{Deserialize, Serialize};

use crate::scenario::ScenarioError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ValueProfile {
    Fixed {
        value: f64,
    },
    Normal {
        mean: f64,
        std_dev: f64,
    },
    /// Log-normal with `mu`/`sigma` of the underlying normal.
    /// The median of the profile is `exp(mu)`.
    LogNormal {
        mu: f64,
        sigma: f64,
    },
    /// Uniform over `[low, high)`
    Uniform {
        low: f64,
        high: f64,
    },
    /// Triangular with lower bound, peak and upper bound. Handy for
    /// "low / best guess / high" analyst estimates.
    Triangular {
        min: f64,
        mode: f64,
        max: f64,
    },
}

impl ValueProfile {
    pub fn fixed(value: f64) -> Self {
        ValueProfile::Fixed { value }
    }

    /// Log-normal profile centred on `median` with log-space spread `sigma`
    pub fn log_normal_around(median: f64, sigma: f64) -> Self {
        ValueProfile::LogNormal {
            mu: median.ln(),
            sigma,
        }
    }

    /// Validate parameters and build the distribution.
    ///
    /// `context` names the profile in error messages (e.g. `"revenue of Q1_FY25"`).
    pub fn sampler(&self, context: &str) -> Result<ProfileSampler, ScenarioError> {
        let invalid = |reason: &str| ScenarioError::InvalidProfile {
            context: context.to_string(),
            reason: reason.to_string(),
        };

        match *self {
            ValueProfile::Fixed { value } => {
                if value.is_finite() {
                    Ok(ProfileSampler::Fixed(value))
                } else {
                    Err(invalid("value must be finite"))
                }
            }
            ValueProfile::Normal { mean, std_dev } => Normal::new(mean, std_dev)
                .map(ProfileSampler::Normal)
                .map_err(|_| invalid("std_dev must be non-negative and finite")),
            ValueProfile::LogNormal { mu, sigma } => LogNormal::new(mu, sigma)
                .map(ProfileSampler::LogNormal)
                .map_err(|_| invalid("sigma must be non-negative and finite")),
            ValueProfile::Uniform { low, high } => Uniform::new(low, high)
                .map(ProfileSampler::Uniform)
                .map_err(|_| invalid("low must be below high and both finite")),
            ValueProfile::Triangular { min, mode, max } => Triangular::new(min, max, mode)
                .map(ProfileSampler::Triangular)
                .map_err(|_| invalid("requires min <= mode <= max with min < max")),
        }
    }

    /// Whether every draw is guaranteed to be `>= 0`
    pub fn is_non_negative(&self) -> bool {
        match *self {
            ValueProfile::Fixed { value } => value >= 0.0,
            ValueProfile::Normal { mean, std_dev } => std_dev == 0.0 && mean >= 0.0,
            ValueProfile::LogNormal { .. } => true,
            ValueProfile::Uniform { low, .. } => low >= 0.0,
            ValueProfile::Triangular { min, .. } => min >= 0.0,
        }
    }

    /// Whether every draw is guaranteed to be `> 0`
    pub fn is_strictly_positive(&self) -> bool {
        match *self {
            ValueProfile::Fixed { value } => value > 0.0,
            ValueProfile::Normal { mean, std_dev } => std_dev == 0.0 && mean > 0.0,
            ValueProfile::LogNormal { .. } => true,
            ValueProfile::Uniform { low, .. } => low > 0.0,
            ValueProfile::Triangular { min, .. } => min > 0.0,
        }
    }
}

/// A validated, ready-to-sample profile
#[derive(Debug, Clone)]
pub enum ProfileSampler {
    Fixed(f64),
    Normal(Normal<f64>),
    LogNormal(LogNormal<f64>),
    Uniform(Uniform<f64>),
    Triangular(Triangular<f64>),
}

impl ProfileSampler {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            ProfileSampler::Fixed(value) => *value,
            ProfileSampler::Normal(d) => d.sample(rng),
            ProfileSampler::LogNormal(d) => d.sample(rng),
            ProfileSampler::Uniform(d) => d.sample(rng),
            ProfileSampler::Triangular(d) => d.sample(rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    #[test]
    fn test_fixed_always_returns_value() {
        let sampler = ValueProfile::fixed(25_000.0).sampler("price").unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..10 {
            assert_eq!(sampler.sample(&mut rng), 25_000.0);
        }
    }

    #[test]
    fn test_uniform_stays_in_bounds() {
        let sampler = ValueProfile::Uniform {
            low: 10.0,
            high: 20.0,
        }
        .sampler("price")
        .unwrap();
        let mut rng = SmallRng::seed_from_u64(2);
        for _ in 0..1000 {
            let x = sampler.sample(&mut rng);
            assert!((10.0..20.0).contains(&x));
        }
    }

    #[test]
    fn test_triangular_stays_in_bounds() {
        let sampler = ValueProfile::Triangular {
            min: 0.2,
            mode: 0.5,
            max: 0.6,
        }
        .sampler("share")
        .unwrap();
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..1000 {
            let x = sampler.sample(&mut rng);
            assert!((0.2..=0.6).contains(&x));
        }
    }

    #[test]
    fn test_log_normal_around_median() {
        let profile = ValueProfile::log_normal_around(1.0e10, 0.2);
        let sampler = profile.sampler("revenue").unwrap();
        let mut rng = SmallRng::seed_from_u64(4);
        let mut draws: Vec<f64> = (0..4001).map(|_| sampler.sample(&mut rng)).collect();
        draws.sort_by(f64::total_cmp);
        let median = draws[2000];
        assert!((median / 1.0e10 - 1.0).abs() < 0.05, "median {median}");
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let bad = [
            ValueProfile::Normal {
                mean: 1.0,
                std_dev: -1.0,
            },
            ValueProfile::Uniform {
                low: 5.0,
                high: 1.0,
            },
            ValueProfile::Triangular {
                min: 0.0,
                mode: 2.0,
                max: 1.0,
            },
            ValueProfile::fixed(f64::NAN),
        ];
        for profile in bad {
            let err = profile.sampler("test").unwrap_err();
            assert!(matches!(err, ScenarioError::InvalidProfile { .. }), "{profile:?}");
        }
    }

    #[test]
    fn test_support_checks() {
        assert!(ValueProfile::fixed(0.0).is_non_negative());
        assert!(!ValueProfile::fixed(0.0).is_strictly_positive());
        assert!(
            !ValueProfile::Normal {
                mean: 1.0,
                std_dev: 0.1
            }
            .is_non_negative()
        );
        assert!(ValueProfile::log_normal_around(2.0, 0.5).is_strictly_positive());
        assert!(
            ValueProfile::Uniform {
                low: 0.0,
                high: 1.0
            }
            .is_non_negative()
        );
    }
}
