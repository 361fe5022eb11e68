// LogNorm - core/mod.rs
//
// Core business logic layer: classification, registry, row transformation,
// discovery and CSV output.
// Must NOT depend on: app or platform.

pub mod classifier;
pub mod discovery;
pub mod export;
pub mod model;
pub mod registry;
pub mod transform;
