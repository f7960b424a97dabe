mod chip;
mod ids;
mod results;

use std::collections::HashMap;

pub use chip::{ChipSpec, ChipSpecs, H100_TOPS};
pub use ids::{Period, Variant};
pub use results::{SalesEstimate, SampleDistribution};

/// Variant -> fraction of a period's revenue, drawn fresh each trial
pub type ShareMap = HashMap<Variant, f64>;
