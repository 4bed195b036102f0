//! Filter driver register-level behaviour over a recording bus.

// Test files legitimately use arithmetic for verification; allow at file level.
#![allow(clippy::arithmetic_side_effects)]
#![allow(clippy::float_cmp)]

use iir_firmware::filter::registers::{REG_A0, REG_A1, REG_B1, REG_CONTROL};
use iir_firmware::{ControlRegister, FilterCoefficientSet, FilterDriver};
use iir_platform::mocks::RecordingBus;

#[test]
fn default_coefficients_are_16384_0_16384() {
    let mut filter = FilterDriver::new(RecordingBus::new());
    filter.set_coefficients(&FilterCoefficientSet::new(0.5, 0.0, 0.5));

    let bus = filter.free();
    assert_eq!(bus.writes_to(REG_A0), vec![16_384]);
    assert_eq!(bus.writes_to(REG_A1), vec![0]);
    assert_eq!(bus.writes_to(REG_B1), vec![16_384]);
    assert!(bus.writes_to(REG_CONTROL).is_empty());
}

#[test]
fn start_sequence_writes_0x03_then_0x01() {
    let mut filter = FilterDriver::new(RecordingBus::new());
    filter.set_control(true, true);
    filter.set_control(true, false);

    assert_eq!(filter.free().writes(), &[(REG_CONTROL, 0x03), (REG_CONTROL, 0x01)]);
}

#[test]
fn every_control_combination_sets_only_its_bits() {
    for (enable, clear, expected) in [
        (false, false, 0b00),
        (true, false, 0b01),
        (false, true, 0b10),
        (true, true, 0b11),
    ] {
        let mut filter = FilterDriver::new(RecordingBus::new());
        filter.set_control(enable, clear);
        assert_eq!(filter.free().writes_to(REG_CONTROL), vec![expected]);
    }
}

#[test]
fn negative_coefficients_are_sign_extended() {
    let mut filter = FilterDriver::new(RecordingBus::new());
    filter.set_coefficients(&FilterCoefficientSet::new(-0.5, -1.0, -1.0 / 32_768.0));

    let bus = filter.free();
    assert_eq!(bus.writes_to(REG_A0), vec![0xFFFF_C000]);
    assert_eq!(bus.writes_to(REG_A1), vec![0xFFFF_8000]);
    assert_eq!(bus.writes_to(REG_B1), vec![0xFFFF_FFFF]);
}

#[test]
fn out_of_range_coefficient_is_written_wrapped() {
    let mut filter = FilterDriver::new(RecordingBus::new());
    let fixed = filter.set_coefficients(&FilterCoefficientSet::new(1.0, 1.5, 0.0));

    assert_eq!(fixed.a0.to_bits(), -32_768);
    assert_eq!(fixed.a1.to_bits(), -16_384);
    let bus = filter.free();
    assert_eq!(bus.writes_to(REG_A0), vec![0xFFFF_8000]);
}

#[test]
fn read_back_decodes_register_file() {
    let mut bus = RecordingBus::new();
    bus.set_register(REG_CONTROL, 0x01);
    bus.set_register(REG_A0, 0x0000_4000);
    bus.set_register(REG_A1, 0xFFFF_E000);
    bus.set_register(REG_B1, 0x0000_2000);
    let filter = FilterDriver::new(bus);

    assert_eq!(filter.control(), ControlRegister::RUN);
    assert_eq!(
        filter.coefficients(),
        FilterCoefficientSet::new(0.5, -0.25, 0.25)
    );
}
