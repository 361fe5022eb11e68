// LogNorm - app/mod.rs
//
// Application layer: batch orchestration.
// Dependencies: core layer.
// Must NOT depend on: platform specifics.

pub mod batch;
