//! Register access abstraction
//!
//! Every peripheral in this system (the IIR filter block and the AXI DMA core)
//! is driven through 32-bit registers at byte offsets from a base address.
//! [`RegisterBus`] is the capability; [`Mmio`] is the hardware implementation
//! and `mocks::RecordingBus` the host double.

/// 32-bit register read/write capability.
///
/// Offsets are in bytes. Register writes on real hardware cannot fail, so
/// neither method returns a `Result`.
pub trait RegisterBus {
    /// Write `value` to the register at `offset`.
    fn write_register(&mut self, offset: usize, value: u32);

    /// Read the register at `offset`.
    fn read_register(&self, offset: usize) -> u32;

    /// Read-modify-write: clear `clear` bits, then set `set` bits.
    fn modify_register(&mut self, offset: usize, clear: u32, set: u32) {
        let value = self.read_register(offset);
        self.write_register(offset, (value & !clear) | set);
    }
}

impl<T: RegisterBus + ?Sized> RegisterBus for &mut T {
    fn write_register(&mut self, offset: usize, value: u32) {
        (**self).write_register(offset, value);
    }

    fn read_register(&self, offset: usize) -> u32 {
        (**self).read_register(offset)
    }
}

/// Volatile memory-mapped register window starting at `base`.
///
/// A window with `base == 0` addresses the whole physical space; offsets are
/// then absolute addresses. The AXI DMA driver uses it that way because its
/// base address comes from the config table at initialisation time.
#[derive(Debug)]
pub struct Mmio {
    base: usize,
}

impl Mmio {
    /// Create a register window at `base`.
    ///
    /// # Safety
    ///
    /// Every `base + offset` later passed to this window must be a mapped,
    /// 4-byte-aligned device register (or RAM) that is valid for volatile
    /// 32-bit access, and no other code may hold a Rust reference to it.
    #[must_use]
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    /// Base address of this window.
    pub const fn base(&self) -> usize {
        self.base
    }

    fn address(&self, offset: usize) -> *mut u32 {
        self.base.wrapping_add(offset) as *mut u32
    }
}

impl RegisterBus for Mmio {
    fn write_register(&mut self, offset: usize, value: u32) {
        // SAFETY: `Mmio::new` contract: base + offset is a valid, aligned,
        // exclusively owned device register.
        unsafe { core::ptr::write_volatile(self.address(offset), value) }
    }

    fn read_register(&self, offset: usize) -> u32 {
        // SAFETY: `Mmio::new` contract: base + offset is a valid, aligned,
        // exclusively owned device register.
        unsafe { core::ptr::read_volatile(self.address(offset)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mmio_reads_and_writes_backing_words() {
        let mut backing = [0u32; 4];
        // SAFETY: the window covers `backing`, a live, aligned local array that
        // is not otherwise borrowed while `regs` is used.
        let mut regs = unsafe { Mmio::new(backing.as_mut_ptr() as usize) };

        regs.write_register(0x04, 0xDEAD_BEEF);
        regs.write_register(0x0C, 0x0000_0003);

        assert_eq!(regs.read_register(0x04), 0xDEAD_BEEF);
        assert_eq!(regs.read_register(0x0C), 3);
        assert_eq!(regs.read_register(0x00), 0);
        assert_eq!(backing, [0, 0xDEAD_BEEF, 0, 3]);
    }

    #[test]
    fn modify_register_clears_then_sets() {
        let mut backing = [0b1111_0000u32];
        // SAFETY: single live local word, exclusively used through `regs`.
        let mut regs = unsafe { Mmio::new(backing.as_mut_ptr() as usize) };

        regs.modify_register(0, 0b1010_0000, 0b0000_0001);

        assert_eq!(regs.read_register(0), 0b0101_0001);
    }
}
