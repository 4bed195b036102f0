//! IIR filter block register map
//!
//! Four 32-bit AXI-Lite registers at byte offsets from the block's base.
//! Coefficients are Q1.15 values sign-extended to 32 bits; the block uses the
//! low 16 bits.
//!
//! The filter computes, per lane, `y[n] = A0·x[n] + A1·x[n-1] + B1·y[n-1]`.
//! New coefficients take effect the next time the block is enabled.

// ---------------------------------------------------------------------------
// Register offsets
// ---------------------------------------------------------------------------

/// Control register: bit 0 = enable, bit 1 = clear state.
pub const REG_CONTROL: usize = 0x00;

/// Feed-forward coefficient for the current input sample.
pub const REG_A0: usize = 0x04;

/// Feed-forward coefficient for the previous input sample.
pub const REG_A1: usize = 0x08;

/// Feedback coefficient for the previous output sample.
pub const REG_B1: usize = 0x0C;

// ---------------------------------------------------------------------------
// Control bits
// ---------------------------------------------------------------------------

/// Run the filter datapath.
pub const CONTROL_ENABLE: u32 = 1 << 0;

/// Clear the filter's delay elements. Held while set.
pub const CONTROL_CLEAR: u32 = 1 << 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_offsets_are_word_spaced() {
        assert_eq!(REG_CONTROL, 0x00);
        assert_eq!(REG_A0, 0x04);
        assert_eq!(REG_A1, 0x08);
        assert_eq!(REG_B1, 0x0C);
    }

    #[test]
    fn control_bits() {
        assert_eq!(CONTROL_ENABLE, 0b01);
        assert_eq!(CONTROL_CLEAR, 0b10);
    }
}
