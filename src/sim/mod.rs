//! Simulation core: demand projection, market allocation, baseline, costs.

pub mod allocator;
pub mod baseline;
pub mod cost;
pub mod demand;
pub mod summary;
pub mod types;

pub use allocator::{OptimizedResult, run_optimized};
pub use baseline::{BaselineResult, run_baseline};
pub use summary::ComparisonSummary;
pub use types::{BaselineSlot, SimConfig, SlotAllocation};
