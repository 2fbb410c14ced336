// ErrHarvest - app/mod.rs
//
// Application layer: file tailing, the harvest pipeline, and the poll loop.
// Dependencies: core, store, platform, util.

pub mod pipeline;
pub mod runner;
pub mod tail;
