//! Board configuration
//!
//! Addresses, the DMA descriptor table and the buffer layout of the loopback
//! test. The layout is checked at compile time: both buffers sit inside the
//! DMA window, do not overlap each other or any register aperture, and are
//! whole cache lines.

use iir_platform::axi_dma::AxiDmaConfig;
use iir_platform::{MemoryRegion, CACHE_LINE_BYTES};

use crate::filter::FilterCoefficientSet;

// ---------------------------------------------------------------------------
// Register apertures
// ---------------------------------------------------------------------------

/// AXI-Lite base address of the IIR filter block.
pub const FILTER_BASE: usize = 0xA001_0000;

/// Base address of the AXI DMA core.
pub const DMA_BASE: usize = 0xA000_0000;

/// Size reserved for each register aperture in the address map.
pub const APERTURE_BYTES: usize = 0x1_0000;

/// Filter register aperture.
pub const FILTER_APERTURE: MemoryRegion = MemoryRegion::new(FILTER_BASE, APERTURE_BYTES);

/// AXI DMA register aperture.
pub const DMA_APERTURE: MemoryRegion = MemoryRegion::new(DMA_BASE, APERTURE_BYTES);

// ---------------------------------------------------------------------------
// DMA
// ---------------------------------------------------------------------------

/// Device id of the AXI DMA instance driving the filter.
pub const DMA_DEVICE_ID: u16 = 0;

/// Descriptor table for the AXI DMA driver. One simple-mode instance with
/// both channels, 26-bit length registers and a 32-bit address bus.
pub static AXI_DMA_CONFIG_TABLE: [AxiDmaConfig; 1] = [AxiDmaConfig {
    device_id: DMA_DEVICE_ID,
    base_address: DMA_BASE,
    has_mm2s: true,
    has_s2mm: true,
    has_sg: false,
    length_width_bits: 26,
    addr_width_bits: 32,
}];

// ---------------------------------------------------------------------------
// Memory layout
// ---------------------------------------------------------------------------

/// Frames per transfer buffer.
pub const TEST_LENGTH: usize = 128;

/// Bytes per transfer buffer (one 32-bit word per frame).
#[allow(clippy::arithmetic_side_effects)] // const-evaluated; overflow fails the build
pub const BUFFER_BYTES: usize = TEST_LENGTH * core::mem::size_of::<u32>();

/// DMA-reachable RAM window both buffers live in.
pub const DMA_WINDOW: MemoryRegion = MemoryRegion::new(0x1000_0000, 0x0040_0000);

/// Destination (receive) buffer offset into [`DMA_WINDOW`].
pub const RX_OFFSET: usize = 0x0010_0000;

/// Source (transmit) buffer offset into [`DMA_WINDOW`].
pub const TX_OFFSET: usize = 0x0020_0000;

/// Destination buffer, written by the S2MM channel.
pub const RX_REGION: MemoryRegion = DMA_WINDOW.offset(RX_OFFSET, BUFFER_BYTES);

/// Source buffer, read by the MM2S channel.
pub const TX_REGION: MemoryRegion = DMA_WINDOW.offset(TX_OFFSET, BUFFER_BYTES);

const _: () = assert!(DMA_WINDOW.contains(&RX_REGION), "RX buffer outside DMA window");
const _: () = assert!(DMA_WINDOW.contains(&TX_REGION), "TX buffer outside DMA window");
const _: () = assert!(!RX_REGION.overlaps(&TX_REGION), "RX and TX buffers overlap");
const _: () = assert!(RX_REGION.is_aligned_to(CACHE_LINE_BYTES));
const _: () = assert!(TX_REGION.is_aligned_to(CACHE_LINE_BYTES));
const _: () = assert!(DMA_WINDOW.is_clear_of(&[FILTER_APERTURE, DMA_APERTURE]));
const _: () = assert!(!FILTER_APERTURE.overlaps(&DMA_APERTURE));

// ---------------------------------------------------------------------------
// Routine defaults
// ---------------------------------------------------------------------------

/// Coefficients loaded by the test: A0 = 0.5, A1 = 0.0, B1 = 0.5.
pub const DEFAULT_COEFFICIENTS: FilterCoefficientSet = FilterCoefficientSet::new(0.5, 0.0, 0.5);

/// Decoded sample pairs printed after the transfer.
pub const REPORT_LEN: usize = 10;

const _: () = assert!(REPORT_LEN <= TEST_LENGTH);
