//! Control loop for on-demand tasks: launch with one-task-per-requester,
//! readiness notification, and timeout-driven reaping.
//!
//! Each component is a stateless unit of work. They share nothing but the
//! platform ports in [`ports`], which are injected at construction so every
//! component can run against [`memory::MemoryCluster`] in tests.

pub mod error;
pub use error::{ConfigError, EmitError, LaunchError, NotifyError, PlatformError, ReadinessFault, ReapError};

pub mod ports;
pub use ports::{CapacityGroups, EventSink, Hosts, Notifier, Orchestrator, OutputSource};

pub mod config;
pub use config::{StackOutputs, resolve_launch_config};

pub mod launch;
pub use launch::{LaunchCoordinator, Launched};

pub mod readiness;
pub use readiness::{PollPolicy, Readiness, ReadinessNotifier};

pub mod reaper;
pub use reaper::{CapacityStrategy, TimeoutReaper, optimal_capacity};

pub mod dispatch;
pub use dispatch::SpawnDispatcher;

pub mod memory;
