//! Global per-process fault tally.
//!
//! Every fault increments the counter for its logical process, before and
//! regardless of admission, dedup, or log capacity. This is the one structure
//! with guaranteed concurrent writers: cores fault independently on behalf of
//! processes that may share a counter slot, so the increment must be atomic
//! with no lost updates. Relaxed ordering is enough; it is a tally, not a
//! sequence.

use core::sync::atomic::{AtomicU64, Ordering};

use crate::faults::MAX_TEST_PROCS;
use crate::whoami::ProcId;

pub struct FaultCounters {
    counts: [AtomicU64; MAX_TEST_PROCS],
}

impl FaultCounters {
    pub const fn new() -> Self {
        const ZERO: AtomicU64 = AtomicU64::new(0);
        Self {
            counts: [ZERO; MAX_TEST_PROCS],
        }
    }

    /// Count one fault for a process. Out-of-range ids are ignored; the fault
    /// path must not trap.
    #[inline]
    pub fn record(&self, proc: ProcId) {
        if let Some(count) = self.counts.get(proc.0) {
            count.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn count(&self, proc: ProcId) -> u64 {
        self.counts
            .get(proc.0)
            .map_or(0, |count| count.load(Ordering::Relaxed))
    }

    /// Zero every counter for the next run.
    pub fn reset(&self) {
        for count in &self.counts {
            count.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for FaultCounters {
    fn default() -> Self {
        Self::new()
    }
}
