//! Architecture support.
//!
//! Syndrome decoding is plain bit manipulation and builds everywhere, so the
//! fault path stays testable on a hosted target. Only the register-access glue
//! in `aarch64::hw` is gated to real hardware.

pub mod aarch64;
