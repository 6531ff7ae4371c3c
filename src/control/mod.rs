//! Actuation control — who drives the fan relays.

pub mod mode;
