//! Data model shared by the launch, readiness and reaping components.
//!
//! Nothing in this crate talks to the network; it only describes what flows
//! between the chat command surface, the orchestration platform and the
//! components in `ephem-core`.

mod domain;
pub use domain::*;

mod command;
pub use command::*;
