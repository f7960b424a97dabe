//! Scenario tests for the chipvol_core estimation engine
//!
//! Tests are organized by topic:
//! - `engine` - Sequential engine contract (call counts, zero shares, degenerate prices)
//! - `parallel` - Batch-parallel engine against the sequential reference
//! - `summary` - Totals, exports and cumulative summaries built on engine output

#[cfg(feature = "parallel")]
mod parallel;
