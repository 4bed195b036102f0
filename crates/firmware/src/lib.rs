//! Stereo IIR filter DMA loopback test
//!
//! Configures a first-order stereo IIR filter block over its AXI-Lite
//! registers, pushes an impulse through it with a polled AXI DMA transfer
//! pair, and decodes what comes back.
//!
//! # Architecture
//!
//! ```text
//! Entry points (main.rs on hardware, bin/loopback.rs on the host)
//!         ↓
//! Routine (routine)
//!         ↓
//! Filter driver, buffers, transfer orchestrator, verification
//!         ↓
//! Platform HAL (iir-platform: register bus, DMA engine, cache, wait)
//! ```
//!
//! # Features
//!
//! - `hardware` - Build for the Cortex-M7 target (cortex-m-rt, defmt-rtt)
//! - `emulator` - Build the host simulation binary (tracing, simulated SoC)
//! - `std` - Enable standard library (host mocks from `iir-platform`)
//!
//! # Examples
//!
//! ## Hardware Target
//!
//! ```bash
//! cargo build --release --target thumbv7em-none-eabihf --features hardware
//! ```
//!
//! ## Host Simulation
//!
//! ```bash
//! cargo run -p iir-firmware --bin loopback --features emulator
//! ```

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
// unsafe fn body is not implicitly unsafe block
// Logging discipline: library code logs through `log`, never println
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![warn(clippy::dbg_macro)] // dbg! should not be left in committed code
// Intentional allows for this codebase:
#![allow(clippy::module_name_repetitions)] // common in Rust crates; not a real issue
#![allow(clippy::missing_errors_doc)] // most errors are self-explanatory
// Pedantic lints too noisy for firmware application code:
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]

mod log;

pub mod buffers;
pub mod config;
pub mod filter;
pub mod orchestrator;
pub mod routine;
pub mod verify;

// Re-export key types
pub use buffers::{impulse_test_vector, LoopbackBuffer, SampleFrame, StereoSample, TransferBuffer};
pub use filter::{ControlRegister, FilterCoefficientSet, FilterDriver, FixedCoefficients, Q15};
pub use orchestrator::{Transfer, TransferError, TransferState};
pub use routine::{run, RunConfig, RunError};
pub use verify::{decode_buffer, DecodedSamples, VerificationReport};
