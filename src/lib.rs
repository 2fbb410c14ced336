// ErrHarvest - lib.rs
//
// Library entry point, exposing all modules for the binary and for
// integration testing.

pub mod app;
pub mod core;
pub mod platform;
pub mod store;
pub mod util;
