//! Runtime topology: execution model and concurrency limits
//!
//! Directives come from the application settings under flattened
//! `MPM.<model>.<directive>` keys. Every resolution is total: an unusable or
//! missing directive logs a warning and falls back, so a working topology is
//! always produced.

use serde::{Deserialize, Serialize};

/// Fallback for the per-server thread/worker limit when neither directive is
/// usable.
const DEFAULT_THREADS_PER_SERVER: i64 = 128;

/// How request-serving capacity is laid out across processes and threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionModel {
    /// One process, many worker threads
    SingleProcessThreaded,
    /// Several worker processes, each with its own workers (Linux only)
    HybridMultiProcess,
}

impl ExecutionModel {
    /// The directive spelling of this model, as written in settings files.
    pub fn directive_name(&self) -> &'static str {
        match self {
            Self::SingleProcessThreaded => "thread",
            Self::HybridMultiProcess => "hybrid",
        }
    }

    /// Whether the host platform can run the hybrid multi-process model.
    pub fn hybrid_supported() -> bool {
        cfg!(target_os = "linux")
    }
}

/// Resolved runtime concurrency parameters; computed once, immutable
/// thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    pub model: ExecutionModel,
    /// Always > 0
    pub max_servers: i32,
    /// >= 0; sizes each server's worker pool
    pub max_threads_per_server: i32,
}

/// Hardware thread count, at least 1.
pub fn hardware_thread_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Resolve the execution model from its settings directive.
///
/// `"thread"` and `"hybrid"` (case-insensitive) are recognized; `"hybrid"`
/// on a platform without support, and any other value including the empty
/// string, warn and fall back to the single-process threaded model.
pub fn resolve_model(directive: &str) -> ExecutionModel {
    match directive.to_lowercase().as_str() {
        "thread" => ExecutionModel::SingleProcessThreaded,
        "hybrid" => {
            if ExecutionModel::hybrid_supported() {
                ExecutionModel::HybridMultiProcess
            } else {
                tracing::warn!("hybrid execution model is Linux-only; falling back to thread");
                ExecutionModel::SingleProcessThreaded
            }
        }
        other => {
            tracing::warn!(directive = other, "unsupported execution model; falling back to thread");
            ExecutionModel::SingleProcessThreaded
        }
    }
}

/// Resolve the maximum number of application servers.
///
/// A positive directive wins; otherwise the hardware thread count (at least
/// 1) is used and the chosen value is logged.
pub fn resolve_max_servers(directive: Option<i64>) -> i32 {
    match directive {
        Some(n) if n > 0 => n as i32,
        _ => {
            let fallback = hardware_thread_count().max(1) as i32;
            tracing::warn!(max_servers = fallback, "max app servers not set; using hardware thread count");
            fallback
        }
    }
}

/// Resolve the per-server thread (or worker) limit.
///
/// Directives are checked in fixed priority order: the model's primary
/// directive, then its secondary directive, then the built-in default of
/// 128. `lookup` receives the directive leaf name and returns the configured
/// integer, if any. The result is never negative: a negative secondary
/// directive reads as unset, while an explicit 0 is kept (the limit is not
/// applicable then).
pub fn resolve_max_threads_per_server(
    model: ExecutionModel,
    lookup: impl Fn(&str) -> Option<i64>,
) -> i32 {
    let (primary, secondary) = match model {
        ExecutionModel::SingleProcessThreaded => ("MaxThreadsPerAppServer", "MaxServers"),
        ExecutionModel::HybridMultiProcess => ("MaxWorkersPerAppServer", "MaxWorkersPerServer"),
    };

    let max = match lookup(primary).filter(|n| *n > 0) {
        Some(n) => n,
        None => lookup(secondary)
            .filter(|n| *n >= 0)
            .unwrap_or(DEFAULT_THREADS_PER_SERVER),
    };
    max as i32
}
