//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the controller's rules: the pending button set,
//! the re-pair gesture, Stop planning, and the awake/sleep duty cycle.
//! All interaction with hardware and the network happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable without
//! real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
