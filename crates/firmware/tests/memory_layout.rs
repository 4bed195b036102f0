//! Architecture tests: board memory layout.
//!
//! The layout is already checked by `const` assertions in `config`; these
//! tests pin the concrete values so an accidental edit shows up as a named
//! failure.

// Some assertions check documented compile-time constants for architectural correctness.
#![allow(clippy::assertions_on_constants)]
#![allow(clippy::arithmetic_side_effects)]

use iir_firmware::config::{
    AXI_DMA_CONFIG_TABLE, BUFFER_BYTES, DMA_APERTURE, DMA_BASE, DMA_DEVICE_ID, DMA_WINDOW,
    FILTER_APERTURE, FILTER_BASE, REPORT_LEN, RX_REGION, TEST_LENGTH, TX_REGION,
};
use iir_firmware::LoopbackBuffer;
use iir_platform::axi_dma::lookup_config;
use iir_platform::CACHE_LINE_BYTES;

#[test]
fn addresses_match_board() {
    assert_eq!(FILTER_BASE, 0xA001_0000);
    assert_eq!(DMA_BASE, 0xA000_0000);
    assert_eq!(DMA_WINDOW.base(), 0x1000_0000);
    assert_eq!(RX_REGION.base(), 0x1010_0000);
    assert_eq!(TX_REGION.base(), 0x1020_0000);
}

#[test]
fn buffers_hold_128_words() {
    assert_eq!(TEST_LENGTH, 128);
    assert_eq!(BUFFER_BYTES, 512);
    assert_eq!(RX_REGION.len(), BUFFER_BYTES);
    assert_eq!(TX_REGION.len(), BUFFER_BYTES);
    assert_eq!(core::mem::size_of::<LoopbackBuffer>(), BUFFER_BYTES);
}

#[test]
fn buffers_are_disjoint_and_inside_window() {
    assert!(!RX_REGION.overlaps(&TX_REGION));
    assert!(DMA_WINDOW.contains(&RX_REGION));
    assert!(DMA_WINDOW.contains(&TX_REGION));
}

#[test]
fn buffers_clear_register_apertures() {
    for region in [RX_REGION, TX_REGION] {
        assert!(region.is_clear_of(&[FILTER_APERTURE, DMA_APERTURE]));
    }
}

#[test]
fn buffers_are_cache_line_aligned() {
    assert!(RX_REGION.is_aligned_to(CACHE_LINE_BYTES));
    assert!(TX_REGION.is_aligned_to(CACHE_LINE_BYTES));
    assert_eq!(core::mem::align_of::<LoopbackBuffer>(), CACHE_LINE_BYTES);
}

#[test]
fn dma_table_describes_a_simple_mode_core() {
    let config = lookup_config(&AXI_DMA_CONFIG_TABLE, DMA_DEVICE_ID).copied();
    let Some(config) = config else {
        unreachable!("board DMA device missing from table");
    };
    assert_eq!(config.base_address, DMA_BASE);
    assert!(!config.has_sg);
    assert_eq!(config.validate(), Ok(()));
    assert!(config.max_transfer_len() >= BUFFER_BYTES);
}

#[test]
fn report_prints_ten_pairs() {
    assert_eq!(REPORT_LEN, 10);
}
