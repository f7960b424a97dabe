//! Scenario files
//!
//! A scenario describes everything needed for one estimate: the periods to
//! estimate, the accelerator variants with their throughput and default
//! price, and per-period revenue and share profiles. Scenarios are stored as
//! YAML:
//!
//! ```yaml
//! name: Accelerator volumes
//! samples: 5000
//! seed: 42
//! trial_price_factor: {type: Normal, mean: 1.0, std_dev: 0.05}
//! variants:
//!   - name: H100
//!     tops: 1979.0
//!     price: {type: Uniform, low: 20000.0, high: 30000.0}
//! periods:
//!   - name: Q1_FY25
//!     start: "2024-01-29"
//!     end: "2024-04-28"
//!     revenue: {type: Normal, mean: 1.8e10, std_dev: 1.0e9}
//!     shares:
//!       H100: {type: Fixed, value: 1.0}
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;

use chipvol_core::{ChipSpec, ChipSpecs, H100_TOPS, Period, Variant};
use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::profile::ValueProfile;

/// Errors raised while loading or validating a scenario
#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioError {
    Io(String),
    Parse(String),
    Serialize(String),
    NoPeriods,
    NoVariants,
    DuplicatePeriod(String),
    DuplicateVariant(String),
    UnknownVariant {
        period: String,
        variant: String,
    },
    InvalidProfile {
        context: String,
        reason: String,
    },
    /// A share weight profile can produce negative draws
    NegativeShareWeight {
        period: String,
        variant: String,
    },
    /// No share weight of the period is guaranteed positive, so a draw could sum to zero
    NoPositiveShare(String),
    InvalidTops {
        variant: String,
        tops: f64,
    },
    InvalidReferenceTops(f64),
    InvalidDateRange {
        period: String,
        start: Date,
        end: Date,
    },
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioError::Io(msg) => write!(f, "IO error: {msg}"),
            ScenarioError::Parse(msg) => write!(f, "Parse error: {msg}"),
            ScenarioError::Serialize(msg) => write!(f, "Serialization error: {msg}"),
            ScenarioError::NoPeriods => write!(f, "scenario declares no periods"),
            ScenarioError::NoVariants => write!(f, "scenario declares no variants"),
            ScenarioError::DuplicatePeriod(name) => write!(f, "period {name} declared twice"),
            ScenarioError::DuplicateVariant(name) => write!(f, "variant {name} declared twice"),
            ScenarioError::UnknownVariant { period, variant } => {
                write!(f, "period {period} references undeclared variant {variant}")
            }
            ScenarioError::InvalidProfile { context, reason } => {
                write!(f, "invalid profile for {context}: {reason}")
            }
            ScenarioError::NegativeShareWeight { period, variant } => {
                write!(f, "share weight of {variant} in {period} can be negative")
            }
            ScenarioError::NoPositiveShare(period) => {
                write!(
                    f,
                    "period {period} needs at least one share weight that is always positive"
                )
            }
            ScenarioError::InvalidTops { variant, tops } => {
                write!(f, "variant {variant} has invalid throughput {tops}")
            }
            ScenarioError::InvalidReferenceTops(tops) => {
                write!(f, "reference throughput {tops} must be positive")
            }
            ScenarioError::InvalidDateRange { period, start, end } => {
                write!(f, "period {period} ends ({end}) before it starts ({start})")
            }
        }
    }
}

impl std::error::Error for ScenarioError {}

/// A complete estimation scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Default trial count (the CLI flag takes precedence)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples: Option<usize>,

    /// Default RNG seed (the CLI flag takes precedence)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Throughput of the reference device for compute equivalents.
    /// Defaults to an H100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_tops: Option<f64>,

    /// Multiplier applied to every price in a trial, drawn once per trial.
    /// Models pricing uncertainty that moves all periods together.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trial_price_factor: Option<ValueProfile>,

    pub variants: Vec<VariantData>,
    pub periods: Vec<PeriodData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantData {
    pub name: String,
    /// 8-bit TOPS
    pub tops: f64,
    /// Default unit price, used unless a period overrides it
    pub price: ValueProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodData {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Date>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Date>,

    /// Total accelerator revenue in dollars
    pub revenue: ValueProfile,

    /// Raw share weights by variant name, normalized on every draw.
    /// Variants not listed have no volume in this period.
    pub shares: BTreeMap<String, ValueProfile>,

    /// Per-period price overrides by variant name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub prices: BTreeMap<String, ValueProfile>,
}

impl Scenario {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ScenarioError> {
        serde_saphyr::from_str(yaml).map_err(|e| ScenarioError::Parse(e.to_string()))
    }

    /// Save to YAML string
    pub fn to_yaml(&self) -> Result<String, ScenarioError> {
        serde_saphyr::to_string(self).map_err(|e| ScenarioError::Serialize(e.to_string()))
    }

    /// Read, parse and validate a scenario file
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ScenarioError::Io(format!("{}: {e}", path.display())))?;
        let scenario = Self::from_yaml(&content)?;
        scenario.validate()?;

        tracing::info!(
            scenario = %scenario.name,
            periods = scenario.periods.len(),
            variants = scenario.variants.len(),
            "Loaded scenario from {}",
            path.display()
        );
        Ok(scenario)
    }

    /// Check structural consistency and profile parameters
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.periods.is_empty() {
            return Err(ScenarioError::NoPeriods);
        }
        if self.variants.is_empty() {
            return Err(ScenarioError::NoVariants);
        }
        if let Some(tops) = self.reference_tops
            && !(tops.is_finite() && tops > 0.0)
        {
            return Err(ScenarioError::InvalidReferenceTops(tops));
        }
        if let Some(factor) = &self.trial_price_factor {
            factor.sampler("trial price factor")?;
            if !factor.is_strictly_positive() {
                tracing::warn!("trial price factor can be non-positive; prices may degenerate");
            }
        }

        let mut variant_names = HashSet::new();
        for variant in &self.variants {
            if !variant_names.insert(variant.name.as_str()) {
                return Err(ScenarioError::DuplicateVariant(variant.name.clone()));
            }
            if !(variant.tops.is_finite() && variant.tops > 0.0) {
                return Err(ScenarioError::InvalidTops {
                    variant: variant.name.clone(),
                    tops: variant.tops,
                });
            }
            variant.price.sampler(&format!("price of {}", variant.name))?;
            if !variant.price.is_strictly_positive() {
                tracing::warn!(
                    variant = %variant.name,
                    "price profile can be non-positive; unit counts may be infinite or negative"
                );
            }
        }

        let mut period_names = HashSet::new();
        for period in &self.periods {
            if !period_names.insert(period.name.as_str()) {
                return Err(ScenarioError::DuplicatePeriod(period.name.clone()));
            }
            self.validate_period(period, &variant_names)?;
        }

        Ok(())
    }

    fn validate_period(
        &self,
        period: &PeriodData,
        variant_names: &HashSet<&str>,
    ) -> Result<(), ScenarioError> {
        if let (Some(start), Some(end)) = (period.start, period.end)
            && end < start
        {
            return Err(ScenarioError::InvalidDateRange {
                period: period.name.clone(),
                start,
                end,
            });
        }

        period
            .revenue
            .sampler(&format!("revenue of {}", period.name))?;
        if !period.revenue.is_non_negative() {
            tracing::debug!(period = %period.name, "revenue profile can be negative");
        }

        for (variant, weight) in &period.shares {
            if !variant_names.contains(variant.as_str()) {
                return Err(ScenarioError::UnknownVariant {
                    period: period.name.clone(),
                    variant: variant.clone(),
                });
            }
            weight.sampler(&format!("share of {variant} in {}", period.name))?;
            if !weight.is_non_negative() {
                return Err(ScenarioError::NegativeShareWeight {
                    period: period.name.clone(),
                    variant: variant.clone(),
                });
            }
        }
        if !period.shares.values().any(ValueProfile::is_strictly_positive) {
            return Err(ScenarioError::NoPositiveShare(period.name.clone()));
        }

        for (variant, price) in &period.prices {
            if !variant_names.contains(variant.as_str()) {
                return Err(ScenarioError::UnknownVariant {
                    period: period.name.clone(),
                    variant: variant.clone(),
                });
            }
            price.sampler(&format!("price of {variant} in {}", period.name))?;
        }

        Ok(())
    }

    pub fn period_ids(&self) -> Vec<Period> {
        self.periods
            .iter()
            .map(|p| Period::from(p.name.as_str()))
            .collect()
    }

    pub fn variant_ids(&self) -> Vec<Variant> {
        self.variants
            .iter()
            .map(|v| Variant::from(v.name.as_str()))
            .collect()
    }

    pub fn chip_specs(&self) -> ChipSpecs {
        self.variants
            .iter()
            .map(|v| (Variant::from(v.name.as_str()), ChipSpec::new(v.tops)))
            .collect()
    }

    pub fn reference_tops(&self) -> f64 {
        self.reference_tops.unwrap_or(H100_TOPS)
    }

    pub fn period(&self, name: &str) -> Option<&PeriodData> {
        self.periods.iter().find(|p| p.name == name)
    }
}
