//! Fault instrumentation for a bare-metal memory-model test harness.
//!
//! Litmus test threads deliberately execute accesses that trap (permission
//! faults, unknown instructions) while exercising hardware memory-consistency
//! behavior. This crate owns the synchronous-exception path for those traps:
//! it classifies each syndrome, resolves the faulting instruction and data
//! location back to harness symbols, deduplicates repeated faults per logical
//! test thread, records them into bounded per-thread logs, and resumes the
//! trapped context according to the configured policy.
//!
//! Everything on the fault path runs in exception context: no heap, no
//! blocking, no panics. Symbol resolution, admission policy, and current
//! thread lookup are harness services injected as capabilities, so the whole
//! path is testable with synthetic contexts on a hosted target.

#![cfg_attr(not(test), no_std)]

pub mod arch;
pub mod faults;
pub mod whoami;

pub use faults::counter::FaultCounters;
pub use faults::handler::{
    ConfigError, FaultConfig, FaultHandler, ResumeContext, ResumePolicy, ReturnLabels,
};
pub use faults::install::{
    dispatch_sync, install_fault_handler, register, CoreVectors, ExceptionLevel, SyncHandler,
};
pub use faults::log::{FaultLogTable, ThreadFaultLog, MAX_FAULTS_PER_LOG};
pub use faults::record::{FaultKind, FaultRecord, SymbolId};
pub use faults::services::{AdmissionFilter, SymbolResolver};
pub use faults::{MAX_TEST_INSTANCES, MAX_TEST_PROCS};
pub use whoami::{ContextSource, CoreId, CoreMap, InstanceId, ProcId, Whoami, MAX_CORES};
