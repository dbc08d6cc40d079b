//! Execution-context lookup: which logical test thread a core is running.
//!
//! The harness's scheduling layer binds each physical core to a
//! (test-instance, logical-process) pair before a run and rebinds between
//! runs. The fault handler resolves that binding at fault time through the
//! [`ContextSource`] capability, so it never reaches for ambient globals and
//! can be driven with synthetic contexts in tests.

use core::sync::atomic::{AtomicUsize, Ordering};

/// Number of physical cores the binding table covers.
pub const MAX_CORES: usize = 8;

/// Physical core index.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct CoreId(pub usize);

/// One execution of the test harness, scoping symbol tables and per-run state.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct InstanceId(pub usize);

/// Logical test thread, distinct from the physical core it runs on.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ProcId(pub usize);

/// Resolved execution context of the trapping core.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Whoami {
    pub core: CoreId,
    pub instance: InstanceId,
    pub proc: ProcId,
}

/// Source of the current execution context, implemented by the harness's
/// scheduling layer (or a synthetic fixture in tests).
pub trait ContextSource: Sync {
    fn current(&self) -> Whoami;
}

struct CoreSlot {
    instance: AtomicUsize,
    proc: AtomicUsize,
}

/// Per-core (instance, process) binding table.
///
/// Written by the scheduler between runs, read from exception context during
/// runs. The two fields are independent atomics: the scheduler only rebinds a
/// core while no test code runs on it, so a fault never observes a torn pair.
pub struct CoreMap {
    slots: [CoreSlot; MAX_CORES],
}

impl CoreMap {
    pub const fn new() -> Self {
        const SLOT: CoreSlot = CoreSlot {
            instance: AtomicUsize::new(0),
            proc: AtomicUsize::new(0),
        };
        Self {
            slots: [SLOT; MAX_CORES],
        }
    }

    /// Bind a core to a (instance, process) pair. Setup context only.
    pub fn bind(&self, core: CoreId, instance: InstanceId, proc: ProcId) {
        let slot = &self.slots[core.0];
        slot.instance.store(instance.0, Ordering::Relaxed);
        slot.proc.store(proc.0, Ordering::Relaxed);
    }

    /// Resolve the binding for a core. Core ids beyond the table collapse to
    /// the last slot rather than trapping; this runs in exception context.
    pub fn whoami_for(&self, core: CoreId) -> Whoami {
        let idx = core.0.min(MAX_CORES - 1);
        let slot = &self.slots[idx];
        Whoami {
            core,
            instance: InstanceId(slot.instance.load(Ordering::Relaxed)),
            proc: ProcId(slot.proc.load(Ordering::Relaxed)),
        }
    }
}

impl Default for CoreMap {
    fn default() -> Self {
        Self::new()
    }
}
