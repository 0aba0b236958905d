//! Workflow drivers and the step executor they share.

pub mod debate;
mod executor;
pub mod sequential;

pub use debate::DebatePlan;
pub use executor::StepRunner;
