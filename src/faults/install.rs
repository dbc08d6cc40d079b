//! Handler installation and dispatch.
//!
//! Each core carries a pair of synchronous-exception dispatch rows, indexed by
//! the syndrome's 6-bit exception class: one row for privileged (EL1) traps
//! and one for the core's user-mode (EL0) execution context. Installation
//! binds the fault entry into the data-abort and unknown-instruction slots,
//! EL1 always and EL0 only when unprivileged test execution is enabled, and is
//! a one-time setup step per core, before any test thread runs there.

use conquer_once::spin::OnceCell;

use crate::arch::aarch64::esr::class;
use crate::faults::handler::{FaultConfig, FaultHandler, ResumeContext};
use crate::whoami::CoreId;

/// Slots per dispatch row; the exception-class field is 6 bits.
pub const EC_SLOTS: usize = 64;

/// A vector-table slot: plain function pointer, shape shared with the stubs.
pub type SyncHandler = fn(&mut ResumeContext, esr: u64, far: u64);

/// Execution level a trap was taken from.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ExceptionLevel {
    El1,
    El0,
}

/// One core's synchronous-exception dispatch table.
pub struct CoreVectors {
    el1_sync: [Option<SyncHandler>; EC_SLOTS],
    el0_sync: [Option<SyncHandler>; EC_SLOTS],
    installed: bool,
}

impl CoreVectors {
    pub const fn new() -> Self {
        Self {
            el1_sync: [None; EC_SLOTS],
            el0_sync: [None; EC_SLOTS],
            installed: false,
        }
    }

    pub fn bind(&mut self, level: ExceptionLevel, ec: u8, handler: SyncHandler) {
        let row = match level {
            ExceptionLevel::El1 => &mut self.el1_sync,
            ExceptionLevel::El0 => &mut self.el0_sync,
        };
        row[(ec & 0x3F) as usize] = Some(handler);
    }

    pub fn handler(&self, level: ExceptionLevel, ec: u8) -> Option<SyncHandler> {
        let row = match level {
            ExceptionLevel::El1 => &self.el1_sync,
            ExceptionLevel::El0 => &self.el0_sync,
        };
        row[(ec & 0x3F) as usize]
    }
}

impl Default for CoreVectors {
    fn default() -> Self {
        Self::new()
    }
}

/// The handler instance faults dispatch into, published once at setup.
static ACTIVE: OnceCell<&'static FaultHandler<'static>> = OnceCell::uninit();

/// Publish the active fault handler. One-time setup; a second registration is
/// refused and the first one keeps winning.
pub fn register(handler: &'static FaultHandler<'static>) -> bool {
    if ACTIVE.try_init_once(|| handler).is_ok() {
        log::info!("fault handler registered");
        true
    } else {
        log::warn!("fault handler already registered; keeping the first");
        false
    }
}

/// Vector-slot target: forwards into the registered handler.
///
/// A fault arriving before registration is dropped here: nothing to count
/// with yet, and exception context has no way to report it.
pub fn fault_entry(ctx: &mut ResumeContext, esr: u64, far: u64) {
    if let Some(handler) = ACTIVE.get() {
        handler.handle_sync(ctx, esr, far);
    }
}

/// Bind the fault entry into a core's dispatch table.
///
/// Idempotent per core: the first call binds and logs, later calls return
/// without touching the rows. Must complete before test threads start on the
/// core.
pub fn install_fault_handler(core: CoreId, vectors: &mut CoreVectors, config: &FaultConfig) {
    if vectors.installed {
        return;
    }

    vectors.bind(ExceptionLevel::El1, class::DATA_ABORT_SAME, fault_entry);
    vectors.bind(ExceptionLevel::El1, class::UNKNOWN, fault_entry);

    if config.install_user {
        vectors.bind(ExceptionLevel::El0, class::DATA_ABORT_LOWER, fault_entry);
        vectors.bind(ExceptionLevel::El0, class::UNKNOWN, fault_entry);
    }

    vectors.installed = true;
    log::info!(
        "fault handler installed on core {} (user_mode={})",
        core.0,
        config.install_user
    );
}

/// Dispatch a synchronous trap through a core's table. Returns whether a
/// handler was bound for the syndrome's exception class.
pub fn dispatch_sync(
    vectors: &CoreVectors,
    level: ExceptionLevel,
    ctx: &mut ResumeContext,
    esr: u64,
    far: u64,
) -> bool {
    let ec = crate::arch::aarch64::esr::exception_class(esr);
    match vectors.handler(level, ec) {
        Some(handler) => {
            handler(ctx, esr, far);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn esr_for(ec: u8) -> u64 {
        (ec as u64) << 26
    }

    fn stub(ctx: &mut ResumeContext, _esr: u64, _far: u64) {
        ctx.pc = 0x5555;
    }

    #[test]
    fn install_binds_el1_slots() {
        let mut vectors = CoreVectors::new();
        install_fault_handler(CoreId(0), &mut vectors, &FaultConfig::default());

        assert!(vectors.handler(ExceptionLevel::El1, class::DATA_ABORT_SAME).is_some());
        assert!(vectors.handler(ExceptionLevel::El1, class::UNKNOWN).is_some());
        // Other classes stay unbound; this handler only takes the two it owns.
        assert!(vectors.handler(ExceptionLevel::El1, class::SVC_AARCH64).is_none());
    }

    #[test]
    fn el0_slots_bound_only_in_user_mode() {
        let mut privileged_only = CoreVectors::new();
        install_fault_handler(CoreId(0), &mut privileged_only, &FaultConfig::default());
        assert!(privileged_only
            .handler(ExceptionLevel::El0, class::DATA_ABORT_LOWER)
            .is_none());

        let user_config = FaultConfig {
            install_user: true,
            ..FaultConfig::default()
        };
        let mut with_user = CoreVectors::new();
        install_fault_handler(CoreId(1), &mut with_user, &user_config);
        assert!(with_user
            .handler(ExceptionLevel::El0, class::DATA_ABORT_LOWER)
            .is_some());
        assert!(with_user.handler(ExceptionLevel::El0, class::UNKNOWN).is_some());
    }

    #[test]
    fn install_is_idempotent_per_core() {
        let mut vectors = CoreVectors::new();
        install_fault_handler(CoreId(0), &mut vectors, &FaultConfig::default());
        // A second call must not rebind or grow anything; in particular it
        // must not add EL0 rows that the first call configured away.
        let user_config = FaultConfig {
            install_user: true,
            ..FaultConfig::default()
        };
        install_fault_handler(CoreId(0), &mut vectors, &user_config);
        assert!(vectors
            .handler(ExceptionLevel::El0, class::DATA_ABORT_LOWER)
            .is_none());
    }

    #[test]
    fn dispatch_routes_by_exception_class() {
        let mut vectors = CoreVectors::new();
        vectors.bind(ExceptionLevel::El1, class::DATA_ABORT_SAME, stub);

        let mut ctx = ResumeContext { pc: 0x40 };
        let handled = dispatch_sync(
            &vectors,
            ExceptionLevel::El1,
            &mut ctx,
            esr_for(class::DATA_ABORT_SAME),
            0,
        );
        assert!(handled);
        assert_eq!(ctx.pc, 0x5555);

        let mut ctx = ResumeContext { pc: 0x40 };
        let handled = dispatch_sync(
            &vectors,
            ExceptionLevel::El1,
            &mut ctx,
            esr_for(class::SVC_AARCH64),
            0,
        );
        assert!(!handled);
        assert_eq!(ctx.pc, 0x40);
    }

    #[test]
    fn unregistered_fault_entry_is_a_no_op() {
        // No test in this binary registers a handler, so the process-global
        // cell stays empty here; the registration path itself is covered in
        // the integration suite, which owns its process's one registration.
        let mut ctx = ResumeContext { pc: 0x40 };
        fault_entry(&mut ctx, esr_for(class::DATA_ABORT_SAME), 0x2000);
        assert_eq!(ctx.pc, 0x40);
    }
}
