//! Application core: pure domain logic, zero I/O.
//!
//! Command parsing, dispatch, the safety latch, routines and the face all
//! run here.  Every interaction with hardware or transports goes through
//! the **port traits** in [`ports`], so the whole layer is testable
//! without real peripherals.

pub mod commands;
pub mod control_loop;
pub mod dispatch;
pub mod events;
pub mod ports;
pub mod service;
