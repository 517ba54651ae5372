// sluice/src/pipeline/mod.rs

//! Defines the `Pipeline` builder, its channel wiring, and execution through the bootstrap runner.

pub mod definition;
pub mod execution;

// Re-export the main Pipeline struct
pub use definition::{Pipeline, WiredPipeline};
