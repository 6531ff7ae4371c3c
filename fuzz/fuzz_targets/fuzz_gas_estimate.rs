//! Fuzz target: `GasModel::estimate_ppm`
//!
//! Any raw count with any R0 bit pattern (NaN, infinities, subnormals,
//! negatives) must produce a finite value in `[0, PPM_CEILING]`.
//!
//! cargo fuzz run fuzz_gas_estimate

#![no_main]

use envguard::sensors::gas::GasModel;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 6 {
        return;
    }
    let raw = u16::from_le_bytes([data[0], data[1]]);
    let r0 = f32::from_le_bytes([data[2], data[3], data[4], data[5]]);

    let ppm = GasModel::estimate_ppm(raw, r0);
    assert!(ppm.is_finite());
    assert!((0.0..=GasModel::PPM_CEILING).contains(&ppm));
});
