//! Application core — pure domain logic, zero I/O.
//!
//! The business rules of the monitor: sensing, alert evaluation, relay
//! resolution and remote command handling.  All interaction with
//! hardware and the network happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
