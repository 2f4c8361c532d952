//! Recurring fetch-and-store of the configured location's current reading.

pub mod pipeline;
pub mod scheduler;

pub use pipeline::RefreshPipeline;
pub use scheduler::{CycleState, Scheduler};
