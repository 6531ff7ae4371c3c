//! Fuzz target: `Command::parse`
//!
//! Arbitrary payload bytes must never panic, and anything accepted must
//! be byte-identical to a wire token.
//!
//! cargo fuzz run fuzz_command_parse

#![no_main]

use envguard::app::commands::Command;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(cmd) = Command::parse(data) {
        assert_eq!(cmd.as_str().as_bytes(), data);
    }
});
