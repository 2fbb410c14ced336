// ErrHarvest - core/mod.rs
//
// Core logic: entry model, splitting, parsing, and locating the active file.
// Dependencies: util only. Filesystem access is limited to listing the
// watched folder in `locator`.
// Must NOT depend on: app, store, platform.

pub mod locator;
pub mod model;
pub mod parser;
pub mod splitter;
