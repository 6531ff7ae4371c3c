//! Output drivers, the character LCD, hardware initialisation and the
//! task watchdog.

pub mod hw_init;
pub mod indicators;
pub mod lcd;
pub mod relay;
pub mod watchdog;
