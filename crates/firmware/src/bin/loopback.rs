//! Host simulation of the loopback test.
//!
//! Runs the same routine the hardware runs against the simulated SoC: a
//! recording register bus for the filter, a loopback DMA engine and a
//! write-back cache model. Completion uses a bounded wait, so a stalled engine
//! ends the run instead of hanging it.
//!
//! ```bash
//! RUST_LOG=debug cargo run -p iir-firmware --bin loopback --features emulator
//! ```

#![allow(missing_docs)]

use std::process::ExitCode;

use iir_firmware::config::DMA_DEVICE_ID;
use iir_firmware::{FilterDriver, LoopbackBuffer, RunConfig};
use iir_platform::mocks::{SimulatedSoc, StdDelay};
use iir_platform::{DmaHandle, SpinWithTimeout};
use tracing_subscriber::EnvFilter;

/// Busy polls before the simulated engine reports a channel idle.
const ENGINE_LATENCY_POLLS: u32 = 16;
/// Delay between completion polls.
const POLL_INTERVAL_US: u32 = 10;
/// Give up on completion after this long.
const COMPLETION_TIMEOUT_US: u32 = 100_000;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let soc = SimulatedSoc::new();
    let mut filter = FilterDriver::new(soc.register_bus());
    let mut dma = DmaHandle::new(soc.loopback_engine(DMA_DEVICE_ID).with_latency(ENGINE_LATENCY_POLLS));
    let mut cache = soc.write_back_cache();
    let wait = SpinWithTimeout::new(StdDelay, POLL_INTERVAL_US, COMPLETION_TIMEOUT_US);

    let mut source = Box::new(LoopbackBuffer::zeroed());
    let mut destination = Box::new(LoopbackBuffer::zeroed());

    let result = iir_firmware::run(
        &RunConfig::DEFAULT,
        &mut filter,
        &mut dma,
        &mut cache,
        wait,
        &mut source,
        &mut destination,
    );
    let _engine = dma.release();

    match result {
        Ok(report) => {
            tracing::info!(
                operations = soc.trace().events().len(),
                non_silent = report.non_silent_frames(),
                "loopback test complete"
            );
            ExitCode::SUCCESS
        }
        Err(_) => ExitCode::FAILURE,
    }
}
