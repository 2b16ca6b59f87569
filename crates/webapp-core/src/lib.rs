//! Configuration registry and runtime topology for the webapp runtime
//!
//! This crate is the orchestration layer above `webapp-fs`: it resolves,
//! merges, and memoizes application settings from heterogeneous sources and
//! derives the runtime concurrency topology.
//!
//! - **SettingsRegistry**: owns application settings, environment-scoped
//!   database profiles, optional auxiliary subsystem settings, and the
//!   named-config cache
//! - **Precedence merge**: built-in subsystem defaults fill only the keys an
//!   operator left absent or blank
//! - **Topology**: execution model and concurrency limits with
//!   hardware-aware fallback
//! - **Memo**: the compute-once cell backing every memoized value
//!
//! The registry's contract is "always produce a usable configuration":
//! every failure in this crate warns and falls back, never terminates.
//!
//! # Example
//!
//! ```no_run
//! use webapp_core::SettingsRegistry;
//!
//! let registry = SettingsRegistry::bootstrap(std::env::args().skip(1));
//! let topology = registry.topology();
//! let worker_pool_size = topology.max_threads_per_server;
//! ```

pub mod defaults;
pub mod error;
pub mod logging;
pub mod memo;
pub mod merge;
pub mod registry;
pub mod topology;

pub use defaults::subsystem_defaults;
pub use error::{Error, Result};
pub use memo::Memo;
pub use merge::merge_defaults;
pub use registry::SettingsRegistry;
pub use topology::{ExecutionModel, Topology, hardware_thread_count, resolve_max_servers, resolve_max_threads_per_server, resolve_model};
