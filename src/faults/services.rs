//! Harness services consumed by the fault path.
//!
//! Symbol resolution and recording policy belong to the harness, not to this
//! crate; both are injected as capabilities so the handler stays independently
//! testable. Implementations must be callable from exception context: no
//! blocking, no allocation.

use crate::faults::record::{FaultKind, SymbolId};
use crate::whoami::{InstanceId, ProcId};

/// Maps raw addresses back to litmus source symbols.
pub trait SymbolResolver: Sync {
    /// Resolve the faulting program counter to an instruction symbol.
    fn instruction_symbol(&self, pc: u64) -> SymbolId;

    /// Resolve a faulting data address against the instance's variable table.
    /// `None` means the address belongs to no tracked variable.
    fn data_symbol(&self, addr: u64, instance: InstanceId) -> Option<SymbolId>;
}

/// Recording policy, consulted before any log work.
///
/// Declining suppresses recording only; the global fault tally has already
/// advanced by the time this runs.
pub trait AdmissionFilter: Sync {
    fn admit(
        &self,
        proc: ProcId,
        instr: SymbolId,
        data: Option<SymbolId>,
        kind: FaultKind,
    ) -> bool;
}
