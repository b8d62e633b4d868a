//! Weekly timetable generation for class sections.
//!
//! Course assignments are expanded into atomic course instances, paired labs
//! are co-placed, and the rest are placed greedily into a day/period grid.
//! Instances that find no slot are reported, never treated as errors.

pub mod data;
pub mod error;
pub mod expander;
pub mod grid;
pub mod report;
pub mod server;
pub mod solver;

pub use data::{GenerationInput, GenerationOutput};
pub use error::ConfigError;
pub use solver::generate;
