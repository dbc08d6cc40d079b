//! AArch64 architecture support.

pub mod esr;
pub mod frame;

#[cfg(target_arch = "aarch64")]
pub mod hw;

pub use esr::{classify, exception_class, fault_address, INSTRUCTION_WIDTH};
pub use frame::ExceptionFrame;
