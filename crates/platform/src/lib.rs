//! Hardware abstraction layer for the stereo IIR DMA loopback test
//!
//! This crate provides the trait-based capabilities the test routine is built
//! on, so the same routine runs against real hardware or host-side doubles.
//!
//! # Architecture Layers
//!
//! ```text
//! Test routine (iir-firmware crate)
//!         ↓
//! Platform HAL (this crate - capabilities + drivers)
//!         ↓
//! Hardware Layer (MMIO, Cortex-M7 SCB, AXI DMA core)
//! ```
//!
//! # Capabilities
//!
//! - [`RegisterBus`] - 32-bit register read/write at a byte offset
//! - [`DmaEngine`] - one-shot simple-mode DMA (initialize, issue, busy, irq mask)
//! - [`CacheMaintenance`] - publish CPU writes / acquire DMA writes
//! - [`WaitStrategy`] - how the CPU busy-waits for the engine
//!
//! # Drivers
//!
//! - [`registers::Mmio`] - volatile MMIO register bus
//! - [`axi_dma::AxiDma`] - AXI DMA simple-mode driver over any [`RegisterBus`]
//! - [`cache::CoherentMemory`] - no-op cache backend for coherent systems
//! - `cache::CortexMDataCache` - Cortex-M7 D-cache clean/invalidate (`hardware`)
//!
//! # Features
//!
//! - `std`: host mocks in [`mocks`] (simulated SoC, recording bus)
//! - `hardware`: Cortex-M7 cache maintenance backend
//! - `defmt`: `defmt::Format` derives on public types
//!
//! # Example
//!
//! ```no_run
//! use iir_platform::{DmaEngine, DmaHandle};
//!
//! fn bring_up<E: DmaEngine>(handle: &mut DmaHandle<E>) -> Result<(), iir_platform::DmaError> {
//!     handle.initialize(0)
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // hex addresses and register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors: callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod axi_dma;
pub mod cache;
pub mod dma;
pub mod dma_safety;
pub mod registers;
pub mod wait;

#[cfg(any(test, feature = "std"))]
pub mod mocks;

// Re-export the capability traits
pub use cache::{CacheMaintenance, CoherentMemory};
pub use dma::{DmaBuffer, DmaBufferMut, DmaEngine, DmaError, DmaHandle, IrqMask, TransferDirection};
pub use registers::{Mmio, RegisterBus};
pub use wait::{Spin, SpinWithTimeout, WaitStrategy, WaitTimeout};

// Re-export memory layout types
pub use dma_safety::{MemoryRegion, CACHE_LINE_BYTES};
