// ErrHarvest - platform/mod.rs
//
// Platform abstraction layer: directories, config file, filesystem helpers.
// Dependencies: standard library, directories crate, util, store::sink
// (output format names).
// Must NOT depend on: core, app.

pub mod config;
pub mod fs;
