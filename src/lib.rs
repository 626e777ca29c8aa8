//! EMU robot controller library.
//!
//! Exposes the control core for integration testing and the device
//! binary.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod expression;
pub mod routine;
pub mod safety;
pub mod scheduler;
pub mod state;

pub mod protocol;

// Hardware-facing modules; host builds get simulation stubs.
pub mod adapters;
pub mod drivers;
pub mod pins;
pub mod sensors;
