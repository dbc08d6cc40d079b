//! Register-access glue for real hardware.
//!
//! The portable fault path takes the syndrome, fault address, and saved pc as
//! plain values. This module is the one place those come out of the machine:
//! the vector-stub entry reads ESR_EL1/FAR_EL1, narrows the frame down to a
//! [`ResumeContext`], and writes the possibly-updated pc back afterwards.

use aarch64_cpu::registers::{ESR_EL1, FAR_EL1, MPIDR_EL1};
use tock_registers::interfaces::Readable;

use crate::arch::aarch64::frame::ExceptionFrame;
use crate::faults::handler::ResumeContext;
use crate::faults::install;
use crate::whoami::{ContextSource, CoreId, CoreMap, Whoami};

/// Identify the executing core from MPIDR_EL1 Aff0.
#[inline]
pub fn current_core() -> CoreId {
    CoreId((MPIDR_EL1.get() & 0xFF) as usize)
}

/// Context source for real hardware: the executing core comes from
/// MPIDR_EL1, its (instance, proc) binding from the scheduler's map.
pub struct HwContext<'a> {
    map: &'a CoreMap,
}

impl<'a> HwContext<'a> {
    pub fn new(map: &'a CoreMap) -> Self {
        Self { map }
    }
}

impl ContextSource for HwContext<'_> {
    fn current(&self) -> Whoami {
        self.map.whoami_for(current_core())
    }
}

/// Synchronous-exception entry, called from the vector stub with the saved
/// frame. Reads the syndrome registers and forwards into the installed
/// handler; the only frame field the handler may change is the pc.
///
/// # Safety
///
/// `frame` must point to a live frame in the save layout of
/// [`ExceptionFrame`], exclusively owned by this invocation.
#[no_mangle]
pub unsafe extern "C" fn litmus_sync_exception(frame: *mut ExceptionFrame) {
    let esr = ESR_EL1.get();
    let far = FAR_EL1.get();

    let frame = &mut *frame;
    let mut ctx = ResumeContext { pc: frame.pc };
    install::fault_entry(&mut ctx, esr, far);
    frame.pc = ctx.pc;
}
