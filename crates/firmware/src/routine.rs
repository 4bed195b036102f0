//! The loopback test routine.
//!
//! # Sequence
//!
//! 1. Initialise the DMA engine (interrupts masked, polling only)
//! 2. Zero the destination buffer, write the impulse into the source buffer
//! 3. Publish both buffers
//! 4. Configure the filter: reset-and-run, coefficients, run
//! 5. Issue receive, then transmit
//! 6. Poll until both channels are idle
//! 7. Acquire the destination, decode, report
//!
//! The first failure ends the run; nothing is retried. A failed DMA
//! initialisation happens before any buffer or filter register is touched.

use iir_platform::{CacheMaintenance, DmaEngine, DmaError, DmaHandle, RegisterBus, WaitStrategy};
use thiserror_no_std::Error;

use crate::buffers::{impulse_test_vector, LoopbackBuffer};
use crate::config::{DEFAULT_COEFFICIENTS, DMA_DEVICE_ID, TEST_LENGTH};
use crate::filter::{FilterCoefficientSet, FilterDriver};
use crate::log::{error, info};
use crate::orchestrator::{Transfer, TransferError, TransferState};
use crate::verify::VerificationReport;

/// Parameters of one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunConfig {
    /// AXI DMA device id to initialise.
    pub device_id: u16,
    /// Filter coefficients to load.
    pub coefficients: FilterCoefficientSet,
}

impl RunConfig {
    /// Board defaults: device 0, coefficients (0.5, 0.0, 0.5).
    pub const DEFAULT: Self = Self {
        device_id: DMA_DEVICE_ID,
        coefficients: DEFAULT_COEFFICIENTS,
    };
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Why the run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunError {
    /// The transfer pair failed.
    #[error("loopback transfer failed in state '{state}': {source}")]
    Transfer {
        /// Last state reached.
        state: TransferState,
        /// Cause.
        source: TransferError,
    },
}

impl RunError {
    fn at(state: TransferState) -> impl FnOnce(TransferError) -> Self {
        move |source| Self::Transfer { state, source }
    }

    /// The underlying transfer error.
    pub fn transfer_error(&self) -> TransferError {
        match self {
            Self::Transfer { source, .. } => *source,
        }
    }

    /// The DMA error, if that was the cause.
    pub fn dma_error(&self) -> Option<DmaError> {
        match self.transfer_error() {
            TransferError::Dma(err) => Some(err),
            TransferError::CompletionTimeout { .. } => None,
        }
    }
}

/// Run the loopback test once.
///
/// `source` and `destination` are overwritten. On success the report of the
/// received buffer is returned; it has already been logged.
pub fn run<F, E, C, W>(
    config: &RunConfig,
    filter: &mut FilterDriver<F>,
    dma: &mut DmaHandle<E>,
    cache: &mut C,
    wait: W,
    source: &mut LoopbackBuffer,
    destination: &mut LoopbackBuffer,
) -> Result<VerificationReport, RunError>
where
    F: RegisterBus,
    E: DmaEngine,
    C: CacheMaintenance,
    W: WaitStrategy,
{
    let result = run_inner(config, filter, dma, cache, wait, source, destination);
    if let Err(err) = &result {
        error!("{}", err);
        error!("transfer state: {}", TransferState::Failed);
    }
    result
}

fn run_inner<F, E, C, W>(
    config: &RunConfig,
    filter: &mut FilterDriver<F>,
    dma: &mut DmaHandle<E>,
    cache: &mut C,
    wait: W,
    source: &mut LoopbackBuffer,
    destination: &mut LoopbackBuffer,
) -> Result<VerificationReport, RunError>
where
    F: RegisterBus,
    E: DmaEngine,
    C: CacheMaintenance,
    W: WaitStrategy,
{
    dma.initialize(config.device_id)
        .map_err(TransferError::from)
        .map_err(RunError::at(TransferState::Idle))?;
    info!("DMA device {} initialized", config.device_id);

    destination.clear();
    source.fill_from(impulse_test_vector(TEST_LENGTH));

    let transfer = Transfer::prepare(dma, cache, &*source, destination)
        .map_err(RunError::at(TransferState::Idle))?;

    filter.configure(&config.coefficients);
    info!("Filter Configured via AXI-Lite.");

    let transfer = transfer
        .issue_receive()
        .map_err(RunError::at(TransferState::Initialized))?;
    let transfer = transfer
        .issue_transmit()
        .map_err(RunError::at(TransferState::ReceiveIssued))?;
    let completed = transfer
        .wait(wait)
        .map_err(RunError::at(TransferState::Polling))?;
    info!("DMA transfer complete after {} polls", completed.polls());

    info!("DMA Transfer Done. Checking Result");
    let report = VerificationReport::from_words(completed.destination().as_words(), TEST_LENGTH);
    report.log();
    Ok(report)
}
