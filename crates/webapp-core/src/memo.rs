//! Generic compute-once cell
//!
//! Every expensive derived value in the engine (topology fields, database
//! counts, merged internal-use settings, each named config) sits in its own
//! independent [`Memo`] cell so unrelated lookups never serialize against
//! each other.

use std::sync::OnceLock;

/// A compute-once cell: Unset → Computing → Value.
///
/// The first caller claims the computation; concurrent callers arriving while
/// it runs block until the value is published and then observe the identical
/// result. There is no invalidation — a published value lives for the process
/// lifetime.
#[derive(Debug, Default)]
pub struct Memo<T> {
    cell: OnceLock<T>,
}

impl<T> Memo<T> {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Return the cached value, computing it with `compute` exactly once
    /// across all threads.
    pub fn get_or_compute(&self, compute: impl FnOnce() -> T) -> &T {
        self.cell.get_or_init(compute)
    }

    /// Peek at the value without triggering a computation.
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }
}
