//! Synchronous-fault handler core.
//!
//! One invocation runs per trapping core, in exception context, and always to
//! completion: count, classify, admit, dedup, record, resume. Nothing here
//! allocates, blocks, or panics, and no step can fail outward: degraded
//! conditions (full log, unresolvable address, declined admission) are
//! handled by dropping detail, never by propagating an error.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use crate::arch::aarch64::esr;
use crate::faults::counter::FaultCounters;
use crate::faults::log::FaultLogTable;
use crate::faults::record::FaultRecord;
use crate::faults::services::{AdmissionFilter, SymbolResolver};
use crate::faults::MAX_TEST_PROCS;
use crate::whoami::{ContextSource, ProcId, Whoami};

/// The saved trap state the handler is allowed to touch.
///
/// Entry glue builds one from the full exception frame and writes the pc back
/// after the handler returns; everything else in the frame stays untouched.
pub struct ResumeContext {
    pub pc: u64,
}

/// What to do with the saved pc before returning to the trapped context.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ResumePolicy {
    /// Resume at the process's registered recovery label.
    Precise,
    /// Step over the faulting instruction.
    Skip,
    /// Leave the pc alone. Resumes at the faulting instruction and will fault
    /// again while the condition persists, which is a valid test-specific setup.
    None,
}

/// Runtime handler configuration, fixed for the duration of a run.
#[derive(Clone, Copy, Debug)]
pub struct FaultConfig {
    /// Record classified faults into the per-thread logs. When off, faults
    /// are still counted and resumption still applies.
    pub detailed_log: bool,
    pub resume: ResumePolicy,
    /// Also bind the handler into the per-core user-mode vector rows.
    pub install_user: bool,
    /// Per-thread log capacity; positive, clamped to the backing bound.
    pub max_faults_per_log: usize,
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            detailed_log: true,
            resume: ResumePolicy::None,
            install_user: false,
            max_faults_per_log: crate::faults::log::MAX_FAULTS_PER_LOG,
        }
    }
}

impl FaultConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_faults_per_log == 0 {
            return Err(ConfigError::ZeroLogCapacity);
        }
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ConfigError {
    /// `max_faults_per_log` must be positive.
    ZeroLogCapacity,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroLogCapacity => write!(f, "fault log capacity must be positive"),
        }
    }
}

/// Per-process recovery addresses for precise resumption, written by the
/// harness before the run starts.
pub struct ReturnLabels {
    labels: [AtomicU64; MAX_TEST_PROCS],
}

impl ReturnLabels {
    pub const fn new() -> Self {
        const UNSET: AtomicU64 = AtomicU64::new(0);
        Self {
            labels: [UNSET; MAX_TEST_PROCS],
        }
    }

    pub fn set(&self, proc: ProcId, addr: u64) {
        if let Some(label) = self.labels.get(proc.0) {
            label.store(addr, Ordering::Relaxed);
        }
    }

    pub fn get(&self, proc: ProcId) -> Option<u64> {
        self.labels
            .get(proc.0)
            .map(|label| label.load(Ordering::Relaxed))
    }
}

impl Default for ReturnLabels {
    fn default() -> Self {
        Self::new()
    }
}

/// The synchronous-exception dispatch target.
///
/// Holds the run configuration plus the injected harness capabilities; the
/// struct itself is stateless across invocations. Shared by reference from
/// every faulting core, so all state it reaches is atomic or lock-guarded.
pub struct FaultHandler<'a> {
    config: FaultConfig,
    symbols: &'a dyn SymbolResolver,
    admission: &'a dyn AdmissionFilter,
    context: &'a dyn ContextSource,
    logs: &'a FaultLogTable,
    counters: &'a FaultCounters,
    labels: &'a ReturnLabels,
}

impl<'a> FaultHandler<'a> {
    pub fn new(
        config: FaultConfig,
        symbols: &'a dyn SymbolResolver,
        admission: &'a dyn AdmissionFilter,
        context: &'a dyn ContextSource,
        logs: &'a FaultLogTable,
        counters: &'a FaultCounters,
        labels: &'a ReturnLabels,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            symbols,
            admission,
            context,
            logs,
            counters,
            labels,
        })
    }

    pub fn config(&self) -> &FaultConfig {
        &self.config
    }

    /// Handle one synchronous fault.
    ///
    /// `esr` and `far` are the trapping core's captured syndrome and fault
    /// address registers; `ctx` carries the saved pc in and the resumption
    /// target out.
    pub fn handle_sync(&self, ctx: &mut ResumeContext, esr: u64, far: u64) {
        let who = self.context.current();

        // The tally advances for every fault, before any recording decision.
        self.counters.record(who.proc);

        if self.config.detailed_log {
            self.record_fault(&who, ctx.pc, esr, far);
        }

        self.resume(&who, ctx);
    }

    fn record_fault(&self, who: &Whoami, pc: u64, esr: u64, far: u64) {
        let instr = self.symbols.instruction_symbol(pc);
        let data = esr::fault_address(esr, far)
            .and_then(|addr| self.symbols.data_symbol(addr, who.instance));
        let kind = esr::classify(esr);

        if !self.admission.admit(who.proc, instr, data, kind) {
            return;
        }

        let record = FaultRecord { instr, data, kind };
        // Out-of-range slots skip recording; counting already happened.
        if let Some(log) = self.logs.get(who.instance, who.proc) {
            let mut log = log.lock();
            if log.contains(&record) {
                return;
            }
            log.append(record);
        }
    }

    /// The one place the saved pc is mutated.
    fn resume(&self, who: &Whoami, ctx: &mut ResumeContext) {
        match self.config.resume {
            ResumePolicy::Precise => {
                if let Some(label) = self.labels.get(who.proc) {
                    ctx.pc = label;
                }
            }
            ResumePolicy::Skip => ctx.pc = ctx.pc.wrapping_add(esr::INSTRUCTION_WIDTH),
            ResumePolicy::None => {}
        }
    }
}
