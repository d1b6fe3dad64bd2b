//! Logging setup for the `ephem` binaries.

mod logger;
pub use logger::*;
