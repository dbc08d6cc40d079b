//! Fault record data model.

/// Harness-assigned identifier for a named instruction or variable in the
/// litmus source.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SymbolId(pub u32);

/// Category of synchronous trap, decoded from the syndrome's exception class.
///
/// Closed and total: every EC encoding maps to one of these, with `Other`
/// absorbing classes this handler is never installed for but must still
/// classify if they arrive.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FaultKind {
    DataAbort,
    InstructionAbort,
    UnknownInstruction,
    SpAlignment,
    SupervisorCall,
    Breakpoint,
    Other,
}

/// One classified fault, immutable once created.
///
/// `data` is `None` when the faulting location was not determinable from the
/// syndrome. Identity for dedup purposes is structural equality of the whole
/// triple.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FaultRecord {
    pub instr: SymbolId,
    pub data: Option<SymbolId>,
    pub kind: FaultKind,
}
