//! Scenario-driven accelerator volume estimates
//!
//! Wraps `chipvol_core` with YAML scenarios, distribution-backed samplers,
//! console and CSV reporting, and logging setup for the `chipvol` binary.

// ============================================================================
// Configuration
// ============================================================================

pub mod profile;
pub mod scenario;

// ============================================================================
// Estimation and reporting
// ============================================================================

pub mod app;
pub mod report;
pub mod sampler;

pub mod logging;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use app::{RunOptions, Settings, run};
pub use logging::init_logging;
pub use profile::{ProfileSampler, ValueProfile};
pub use sampler::{CompiledScenario, ScenarioSampler};
pub use scenario::{Scenario, ScenarioError};
