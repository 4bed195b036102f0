//! Stereo IIR filter block driver
//!
//! Generic over [`RegisterBus`] so the same driver runs on MMIO and against the
//! recording bus in tests.
//!
//! # Start sequence
//!
//! 1. `set_control(true, true)`: run with the delay line held clear
//! 2. `set_coefficients(..)`
//! 3. `set_control(true, false)`: release the clear; new coefficients apply
//!
//! [`FilterDriver::configure`] performs exactly this sequence.

pub mod fixed_point;
pub mod registers;

pub use fixed_point::{ControlRegister, FilterCoefficientSet, FixedCoefficients, Q15};

use iir_platform::RegisterBus;

use crate::log::{debug, info};
use registers::{REG_A0, REG_A1, REG_B1, REG_CONTROL};

/// IIR filter block driver.
pub struct FilterDriver<B> {
    bus: B,
}

impl<B: RegisterBus> FilterDriver<B> {
    /// Create a driver over the filter's register window. No register is
    /// touched.
    pub const fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Convert `coefficients` to Q1.15 (truncating) and write A0, A1, B1.
    ///
    /// Out-of-range values are written wrapped, not rejected; see
    /// [`Q15::from_f32_truncating`]. Returns what was written.
    pub fn set_coefficients(&mut self, coefficients: &FilterCoefficientSet) -> FixedCoefficients {
        if !coefficients.is_representable() {
            info!("Coefficient outside Q1.15 range; written wrapped");
        }
        let fixed = coefficients.to_fixed();
        self.bus.write_register(REG_A0, fixed.a0.register_value());
        self.bus.write_register(REG_A1, fixed.a1.register_value());
        self.bus.write_register(REG_B1, fixed.b1.register_value());
        info!(
            "Coeffs Updated: A0={}, A1={}, B1={}",
            fixed.a0.to_bits(),
            fixed.a1.to_bits(),
            fixed.b1.to_bits()
        );
        fixed
    }

    /// Write the control register: bit 0 = `enable`, bit 1 = `clear`.
    pub fn set_control(&mut self, enable: bool, clear: bool) {
        let control = ControlRegister::new(enable, clear);
        debug!("filter control <- {}", control.bits());
        self.bus.write_register(REG_CONTROL, control.bits());
    }

    /// Reset-then-run with `coefficients` loaded in between.
    pub fn configure(&mut self, coefficients: &FilterCoefficientSet) -> FixedCoefficients {
        let ControlRegister { enable, clear } = ControlRegister::RESET_AND_RUN;
        self.set_control(enable, clear);
        let fixed = self.set_coefficients(coefficients);
        let ControlRegister { enable, clear } = ControlRegister::RUN;
        self.set_control(enable, clear);
        fixed
    }

    /// Read back the coefficient registers.
    pub fn fixed_coefficients(&self) -> FixedCoefficients {
        FixedCoefficients {
            a0: Q15::from_register(self.bus.read_register(REG_A0)),
            a1: Q15::from_register(self.bus.read_register(REG_A1)),
            b1: Q15::from_register(self.bus.read_register(REG_B1)),
        }
    }

    /// Read back the coefficients as floats.
    pub fn coefficients(&self) -> FilterCoefficientSet {
        self.fixed_coefficients().to_f32()
    }

    /// Read back the control register.
    pub fn control(&self) -> ControlRegister {
        ControlRegister::from_bits(self.bus.read_register(REG_CONTROL))
    }

    /// Give the register bus back.
    pub fn free(self) -> B {
        self.bus
    }
}
