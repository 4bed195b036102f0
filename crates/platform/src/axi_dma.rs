//! Xilinx AXI DMA driver, simple (direct register) mode
//!
//! Drives an AXI DMA core built without scatter-gather through any
//! [`RegisterBus`]. Each channel runs one transfer at a time: program the
//! address, set run/stop, then write the length, which starts the transfer.
//!
//! The bus addresses the whole physical space (`Mmio::new(0)` on hardware);
//! the core's base address comes from the [`AxiDmaConfig`] table at
//! initialisation time, so one driver value can be pointed at any instance.
//!
//! # References
//! - Xilinx PG021: AXI DMA v7.1 LogiCORE IP Product Guide, "Register Space"

use crate::dma::{
    DmaEngine, DmaError, InitFailure, IrqMask, SubmitFailure, TransferDirection,
};
use crate::registers::RegisterBus;

/// Register offsets and bit fields of the AXI DMA core (PG021 table 2-5).
pub mod regs {
    /// MM2S (transmit) DMA control register.
    pub const MM2S_DMACR: usize = 0x00;
    /// MM2S DMA status register.
    pub const MM2S_DMASR: usize = 0x04;
    /// MM2S source address, low 32 bits.
    pub const MM2S_SA: usize = 0x18;
    /// MM2S source address, high 32 bits.
    pub const MM2S_SA_MSB: usize = 0x1C;
    /// MM2S transfer length in bytes. Writing it starts the transfer.
    pub const MM2S_LENGTH: usize = 0x28;

    /// S2MM (receive) DMA control register.
    pub const S2MM_DMACR: usize = 0x30;
    /// S2MM DMA status register.
    pub const S2MM_DMASR: usize = 0x34;
    /// S2MM destination address, low 32 bits.
    pub const S2MM_DA: usize = 0x48;
    /// S2MM destination address, high 32 bits.
    pub const S2MM_DA_MSB: usize = 0x4C;
    /// S2MM buffer length in bytes. Writing it arms the channel.
    pub const S2MM_LENGTH: usize = 0x58;

    /// DMACR: run/stop.
    pub const CR_RUNSTOP: u32 = 1 << 0;
    /// DMACR: soft reset of the whole core (self-clearing).
    pub const CR_RESET: u32 = 1 << 2;

    /// DMASR: channel halted.
    pub const SR_HALTED: u32 = 1 << 0;
    /// DMASR: channel idle (transfer finished).
    pub const SR_IDLE: u32 = 1 << 1;

    /// Polls of the reset bit before giving up.
    pub const RESET_TIMEOUT_POLLS: u32 = 500;
}

/// Build-time parameters of one AXI DMA instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxiDmaConfig {
    /// Device id used to look the instance up.
    pub device_id: u16,
    /// Physical base address of the register block.
    pub base_address: usize,
    /// Core includes the MM2S (transmit) channel.
    pub has_mm2s: bool,
    /// Core includes the S2MM (receive) channel.
    pub has_s2mm: bool,
    /// Core was built with scatter-gather.
    pub has_sg: bool,
    /// Width of the length registers, 8 to 26 bits.
    pub length_width_bits: u8,
    /// Width of the address bus, 32 or 64 bits.
    pub addr_width_bits: u8,
}

impl AxiDmaConfig {
    /// Largest transfer the length register can express, in bytes.
    pub const fn max_transfer_len(&self) -> usize {
        match 1usize.checked_shl(self.length_width_bits as u32) {
            Some(limit) => limit.saturating_sub(1),
            None => usize::MAX,
        }
    }

    /// Check that the driver supports this build of the core.
    pub const fn validate(&self) -> Result<(), InitFailure> {
        if self.has_sg {
            return Err(InitFailure::ScatterGatherUnsupported);
        }
        if !self.has_mm2s || !self.has_s2mm {
            return Err(InitFailure::MissingChannel);
        }
        if self.length_width_bits < 8 || self.length_width_bits > 26 {
            return Err(InitFailure::InvalidLengthWidth);
        }
        if self.addr_width_bits != 32 && self.addr_width_bits != 64 {
            return Err(InitFailure::Refused);
        }
        Ok(())
    }
}

/// Find the descriptor for `device_id`.
pub fn lookup_config(table: &[AxiDmaConfig], device_id: u16) -> Option<&AxiDmaConfig> {
    table.iter().find(|config| config.device_id == device_id)
}

const fn control_register(direction: TransferDirection) -> usize {
    match direction {
        TransferDirection::ReceiveFromDevice => regs::S2MM_DMACR,
        TransferDirection::TransmitToDevice => regs::MM2S_DMACR,
    }
}

const fn status_register(direction: TransferDirection) -> usize {
    match direction {
        TransferDirection::ReceiveFromDevice => regs::S2MM_DMASR,
        TransferDirection::TransmitToDevice => regs::MM2S_DMASR,
    }
}

/// Address, address-MSB and length registers of a channel.
const fn transfer_registers(direction: TransferDirection) -> (usize, usize, usize) {
    match direction {
        TransferDirection::ReceiveFromDevice => (regs::S2MM_DA, regs::S2MM_DA_MSB, regs::S2MM_LENGTH),
        TransferDirection::TransmitToDevice => (regs::MM2S_SA, regs::MM2S_SA_MSB, regs::MM2S_LENGTH),
    }
}

/// AXI DMA simple-mode engine.
pub struct AxiDma<B> {
    bus: B,
    table: &'static [AxiDmaConfig],
    active: Option<AxiDmaConfig>,
}

impl<B: RegisterBus> AxiDma<B> {
    /// Create a driver that resolves device ids against `table`.
    ///
    /// No register is touched until [`DmaEngine::initialize`].
    pub const fn new(bus: B, table: &'static [AxiDmaConfig]) -> Self {
        Self {
            bus,
            table,
            active: None,
        }
    }

    /// Raw status register of a channel, or `None` before initialisation.
    pub fn status(&self, direction: TransferDirection) -> Option<u32> {
        self.active
            .as_ref()
            .map(|config| self.read(config, status_register(direction)))
    }

    /// Give the register bus back.
    pub fn free(self) -> B {
        self.bus
    }

    fn read(&self, config: &AxiDmaConfig, offset: usize) -> u32 {
        self.bus.read_register(config.base_address.wrapping_add(offset))
    }

    fn write(&mut self, config: &AxiDmaConfig, offset: usize, value: u32) {
        self.bus
            .write_register(config.base_address.wrapping_add(offset), value);
    }

    fn modify(&mut self, config: &AxiDmaConfig, offset: usize, clear: u32, set: u32) {
        self.bus
            .modify_register(config.base_address.wrapping_add(offset), clear, set);
    }

    /// Soft-reset the core and wait for the self-clearing bit to drop.
    fn reset_core(&mut self, config: &AxiDmaConfig) -> Result<(), InitFailure> {
        // One reset bit resets both channels; MM2S_DMACR is the canonical one.
        self.write(config, regs::MM2S_DMACR, regs::CR_RESET);
        for _ in 0..regs::RESET_TIMEOUT_POLLS {
            if self.read(config, regs::MM2S_DMACR) & regs::CR_RESET == 0 {
                return Ok(());
            }
            core::hint::spin_loop();
        }
        Err(InitFailure::ResetTimeout)
    }
}

impl<B: RegisterBus> DmaEngine for AxiDma<B> {
    fn initialize(&mut self, device_id: u16) -> Result<(), DmaError> {
        let config = lookup_config(self.table, device_id)
            .copied()
            .ok_or(DmaError::ConfigNotFound { device_id })?;
        config
            .validate()
            .map_err(|reason| DmaError::InitializationFailed { reason })?;

        self.active = None;
        self.reset_core(&config)
            .map_err(|reason| DmaError::InitializationFailed { reason })?;
        self.active = Some(config);
        Ok(())
    }

    fn disable_interrupts(&mut self, mask: IrqMask, direction: TransferDirection) {
        if let Some(config) = self.active {
            self.modify(&config, control_register(direction), mask.bits(), 0);
        }
    }

    fn issue_transfer(
        &mut self,
        address: usize,
        length: usize,
        direction: TransferDirection,
    ) -> Result<(), DmaError> {
        let reject = |reason| DmaError::TransferSubmissionFailed { direction, reason };

        let config = self.active.ok_or(reject(SubmitFailure::NotInitialized))?;
        if length == 0 {
            return Err(reject(SubmitFailure::ZeroLength));
        }
        if length > config.max_transfer_len() {
            return Err(reject(SubmitFailure::LengthTooLarge));
        }
        if address & 0b11 != 0 || length & 0b11 != 0 {
            return Err(reject(SubmitFailure::Misaligned));
        }
        let length = u32::try_from(length).map_err(|_| reject(SubmitFailure::LengthTooLarge))?;

        let address = address as u64;
        #[allow(clippy::cast_possible_truncation)] // split into 32-bit halves
        let (low, high) = (address as u32, (address >> 32) as u32);
        if high != 0 && config.addr_width_bits <= 32 {
            return Err(reject(SubmitFailure::AddressOutOfRange));
        }

        // A halted channel is free; a running one must have gone idle.
        let status = self.read(&config, status_register(direction));
        if status & regs::SR_HALTED == 0 && status & regs::SR_IDLE == 0 {
            return Err(reject(SubmitFailure::ChannelBusy));
        }

        let (addr_reg, addr_msb_reg, length_reg) = transfer_registers(direction);
        self.write(&config, addr_reg, low);
        if config.addr_width_bits > 32 {
            self.write(&config, addr_msb_reg, high);
        }
        self.modify(&config, control_register(direction), 0, regs::CR_RUNSTOP);
        // Length last: this write starts the channel.
        self.write(&config, length_reg, length);
        Ok(())
    }

    fn is_busy(&self, direction: TransferDirection) -> bool {
        // Busy until the channel reports idle. A halted channel never does,
        // so a transfer that errors out reads as busy forever.
        self.status(direction)
            .is_some_and(|status| status & regs::SR_IDLE == 0)
    }

    fn reset(&mut self) {
        if let Some(config) = self.active.take() {
            // Teardown is best effort; a stuck reset is reported on the next
            // initialize instead.
            let _ = self.reset_core(&config);
        }
    }
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    const BASE: AxiDmaConfig = AxiDmaConfig {
        device_id: 0,
        base_address: 0xA000_0000,
        has_mm2s: true,
        has_s2mm: true,
        has_sg: false,
        length_width_bits: 26,
        addr_width_bits: 32,
    };

    #[test]
    fn register_offsets_match_pg021() {
        assert_eq!(regs::MM2S_DMACR, 0x00);
        assert_eq!(regs::MM2S_DMASR, 0x04);
        assert_eq!(regs::MM2S_SA, 0x18);
        assert_eq!(regs::MM2S_LENGTH, 0x28);
        assert_eq!(regs::S2MM_DMACR, 0x30);
        assert_eq!(regs::S2MM_DMASR, 0x34);
        assert_eq!(regs::S2MM_DA, 0x48);
        assert_eq!(regs::S2MM_LENGTH, 0x58);
    }

    #[test]
    fn max_transfer_len_follows_length_width() {
        assert_eq!(BASE.max_transfer_len(), (1 << 26) - 1);
        let narrow = AxiDmaConfig {
            length_width_bits: 14,
            ..BASE
        };
        assert_eq!(narrow.max_transfer_len(), 16_383);
    }

    #[test]
    fn validate_rejects_unsupported_builds() {
        assert_eq!(BASE.validate(), Ok(()));
        assert_eq!(
            AxiDmaConfig { has_sg: true, ..BASE }.validate(),
            Err(InitFailure::ScatterGatherUnsupported)
        );
        assert_eq!(
            AxiDmaConfig { has_s2mm: false, ..BASE }.validate(),
            Err(InitFailure::MissingChannel)
        );
        assert_eq!(
            AxiDmaConfig { length_width_bits: 27, ..BASE }.validate(),
            Err(InitFailure::InvalidLengthWidth)
        );
        assert_eq!(
            AxiDmaConfig { addr_width_bits: 40, ..BASE }.validate(),
            Err(InitFailure::Refused)
        );
    }

    #[test]
    fn lookup_finds_matching_device_only() {
        let table = [BASE, AxiDmaConfig { device_id: 3, ..BASE }];
        assert_eq!(lookup_config(&table, 3).map(|c| c.device_id), Some(3));
        assert!(lookup_config(&table, 1).is_none());
    }
}
