// ErrHarvest - store/mod.rs
//
// Persistence layer: resume positions and harvested-entry sinks.
// Dependencies: core (model types), platform (atomic writes), util.
// Must NOT depend on: app.

pub mod position;
pub mod sink;
