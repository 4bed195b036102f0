//! DMA transfer orchestrator
//!
//! One loopback transfer pair as a typestate chain:
//!
//! ```text
//! Transfer<Prepared> ──issue_receive──▶ Transfer<ReceiveIssued>
//!                    ──issue_transmit─▶ Transfer<TransmitIssued>
//!                    ──wait───────────▶ Completed
//! ```
//!
//! The receive channel must be armed before the transmit channel starts
//! pushing data into the filter, otherwise the stream stalls with nowhere to
//! go. Only `Transfer<ReceiveIssued>` has `issue_transmit`, so the order is
//! checked by the compiler.
//!
//! Cache maintenance is part of the chain: `prepare` publishes both buffers,
//! `wait` acquires the destination once both channels are idle. The
//! destination stays mutably borrowed from `prepare` until `Completed`, so the
//! CPU cannot read it mid-flight.

use core::fmt;
use core::marker::PhantomData;

use iir_platform::dma::SubmitFailure;
use iir_platform::{
    CacheMaintenance, DmaBuffer, DmaBufferMut, DmaEngine, DmaError, DmaHandle, TransferDirection,
    WaitStrategy, WaitTimeout,
};
use thiserror_no_std::Error;

use crate::log::debug;

/// Where a transfer pair is in its lifecycle. Used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferState {
    /// Engine not initialised.
    Idle,
    /// Engine initialised, buffers published.
    Initialized,
    /// Receive channel armed.
    ReceiveIssued,
    /// Transmit channel started.
    TransmitIssued,
    /// CPU busy-polling both channels.
    Polling,
    /// Both channels idle, destination acquired.
    Done,
    /// A step failed; the run is over.
    Failed,
}

impl TransferState {
    /// Log label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Initialized => "initialized",
            Self::ReceiveIssued => "receive issued",
            Self::TransmitIssued => "transmit issued",
            Self::Polling => "polling",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transfer failures. Every one is fatal for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferError {
    /// The engine rejected initialisation or a transfer.
    #[error("{0}")]
    Dma(#[from] DmaError),
    /// A bounded wait strategy gave up before both channels went idle.
    #[error("DMA completion timed out after {polls} polls ({elapsed_us} us)")]
    CompletionTimeout {
        /// Busy polls performed.
        polls: u32,
        /// Time budget spent, in microseconds.
        elapsed_us: u32,
    },
}

impl From<WaitTimeout> for TransferError {
    fn from(timeout: WaitTimeout) -> Self {
        Self::CompletionTimeout {
            polls: timeout.polls,
            elapsed_us: timeout.elapsed_us,
        }
    }
}

/// Typestate markers.
pub mod stage {
    /// Buffers published, nothing issued.
    pub struct Prepared;
    /// Receive channel armed.
    pub struct ReceiveIssued;
    /// Both channels running.
    pub struct TransmitIssued;
}

/// A typestate marker with its [`TransferState`].
pub trait Stage {
    /// State this marker represents.
    const STATE: TransferState;
}

impl Stage for stage::Prepared {
    const STATE: TransferState = TransferState::Initialized;
}

impl Stage for stage::ReceiveIssued {
    const STATE: TransferState = TransferState::ReceiveIssued;
}

impl Stage for stage::TransmitIssued {
    const STATE: TransferState = TransferState::TransmitIssued;
}

/// An in-flight loopback transfer pair in stage `S`.
pub struct Transfer<'a, E, C, Tx: ?Sized, Rx: ?Sized, S> {
    handle: &'a mut DmaHandle<E>,
    cache: &'a mut C,
    source: &'a Tx,
    destination: &'a mut Rx,
    _stage: PhantomData<S>,
}

impl<'a, E, C, Tx, Rx, S> Transfer<'a, E, C, Tx, Rx, S>
where
    E: DmaEngine,
    C: CacheMaintenance,
    Tx: DmaBuffer + ?Sized,
    Rx: DmaBufferMut + ?Sized,
    S: Stage,
{
    /// Current lifecycle state.
    pub fn state(&self) -> TransferState {
        S::STATE
    }

    fn advance<T: Stage>(self) -> Transfer<'a, E, C, Tx, Rx, T> {
        debug!("transfer state: {}", T::STATE);
        Transfer {
            handle: self.handle,
            cache: self.cache,
            source: self.source,
            destination: self.destination,
            _stage: PhantomData,
        }
    }
}

impl<'a, E, C, Tx, Rx> Transfer<'a, E, C, Tx, Rx, stage::Prepared>
where
    E: DmaEngine,
    C: CacheMaintenance,
    Tx: DmaBuffer + ?Sized,
    Rx: DmaBufferMut + ?Sized,
{
    /// Publish both buffers to the engine and take ownership of the flight.
    ///
    /// The destination is published as well as the source: a dirty line
    /// evicted while the engine writes would overwrite received data.
    /// `handle` must already be initialised.
    pub fn prepare(
        handle: &'a mut DmaHandle<E>,
        cache: &'a mut C,
        source: &'a Tx,
        destination: &'a mut Rx,
    ) -> Result<Self, TransferError> {
        if !handle.is_initialized() {
            return Err(DmaError::TransferSubmissionFailed {
                direction: TransferDirection::ReceiveFromDevice,
                reason: SubmitFailure::NotInitialized,
            }
            .into());
        }
        cache.publish_to_device(source);
        cache.publish_to_device(&*destination);
        debug!("transfer state: {}", TransferState::Initialized);
        Ok(Self {
            handle,
            cache,
            source,
            destination,
            _stage: PhantomData,
        })
    }

    /// Arm the receive (S2MM) channel with the whole destination buffer.
    pub fn issue_receive(
        self,
    ) -> Result<Transfer<'a, E, C, Tx, Rx, stage::ReceiveIssued>, TransferError> {
        let (address, length) = (self.destination.address(), self.destination.byte_len());
        self.handle
            .engine_mut()
            .issue_transfer(address, length, TransferDirection::ReceiveFromDevice)?;
        Ok(self.advance())
    }
}

impl<'a, E, C, Tx, Rx> Transfer<'a, E, C, Tx, Rx, stage::ReceiveIssued>
where
    E: DmaEngine,
    C: CacheMaintenance,
    Tx: DmaBuffer + ?Sized,
    Rx: DmaBufferMut + ?Sized,
{
    /// Start the transmit (MM2S) channel with the whole source buffer.
    pub fn issue_transmit(
        self,
    ) -> Result<Transfer<'a, E, C, Tx, Rx, stage::TransmitIssued>, TransferError> {
        let (address, length) = (self.source.address(), self.source.byte_len());
        self.handle
            .engine_mut()
            .issue_transfer(address, length, TransferDirection::TransmitToDevice)?;
        Ok(self.advance())
    }
}

impl<'a, E, C, Tx, Rx> Transfer<'a, E, C, Tx, Rx, stage::TransmitIssued>
where
    E: DmaEngine,
    C: CacheMaintenance,
    Tx: DmaBuffer + ?Sized,
    Rx: DmaBufferMut + ?Sized,
{
    /// Busy-poll until neither channel is busy, then acquire the destination.
    ///
    /// With an unbounded strategy an engine that never finishes hangs here.
    pub fn wait<W: WaitStrategy>(self, mut wait: W) -> Result<Completed<'a, Rx>, TransferError> {
        debug!("transfer state: {}", TransferState::Polling);
        let Self {
            handle,
            cache,
            destination,
            ..
        } = self;

        let engine = handle.engine();
        let polls = wait.wait_until(|| {
            !(engine.is_busy(TransferDirection::TransmitToDevice)
                || engine.is_busy(TransferDirection::ReceiveFromDevice))
        })?;

        cache.acquire_from_device(&mut *destination);
        debug!("transfer state: {} after {} polls", TransferState::Done, polls);
        Ok(Completed { destination, polls })
    }
}

/// A finished transfer: the destination is acquired and readable.
pub struct Completed<'a, Rx: ?Sized> {
    destination: &'a Rx,
    polls: u32,
}

impl<'a, Rx: DmaBuffer + ?Sized> Completed<'a, Rx> {
    /// Always [`TransferState::Done`].
    pub fn state(&self) -> TransferState {
        TransferState::Done
    }

    /// Busy polls it took for both channels to go idle.
    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// The received data.
    pub fn destination(&self) -> &Rx {
        self.destination
    }

    /// Release the flight, keeping the shared borrow of the destination.
    pub fn into_destination(self) -> &'a Rx {
        self.destination
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use iir_platform::mocks::{SimulatedSoc, TraceEvent};
    use iir_platform::Spin;

    #[test]
    fn stages_report_their_state() {
        let soc = SimulatedSoc::new();
        let mut handle = DmaHandle::new(soc.loopback_engine(0));
        handle.initialize(0).unwrap();
        let mut cache = soc.write_back_cache();
        let source = [0x2710_2710u32; 16];
        let mut destination = [0u32; 16];

        let prepared = Transfer::prepare(&mut handle, &mut cache, &source, &mut destination).unwrap();
        assert_eq!(prepared.state(), TransferState::Initialized);
        let receiving = prepared.issue_receive().unwrap();
        assert_eq!(receiving.state(), TransferState::ReceiveIssued);
        let transmitting = receiving.issue_transmit().unwrap();
        assert_eq!(transmitting.state(), TransferState::TransmitIssued);
        let done = transmitting.wait(Spin).unwrap();
        assert_eq!(done.state(), TransferState::Done);
        assert_eq!(done.destination(), &source);
    }

    #[test]
    fn prepare_refuses_uninitialized_handle_without_cache_work() {
        let soc = SimulatedSoc::new();
        let mut handle = DmaHandle::new(soc.loopback_engine(0));
        let mut cache = soc.write_back_cache();
        let source = [0u32; 16];
        let mut destination = [0u32; 16];

        let err = Transfer::prepare(&mut handle, &mut cache, &source, &mut destination)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            TransferError::Dma(DmaError::TransferSubmissionFailed {
                reason: SubmitFailure::NotInitialized,
                ..
            })
        ));
        assert!(soc.trace().events().is_empty());
    }

    #[test]
    fn wait_counts_polls_until_both_channels_idle() {
        let soc = SimulatedSoc::new();
        let mut handle = DmaHandle::new(soc.loopback_engine(0).with_latency(3));
        handle.initialize(0).unwrap();
        let mut cache = soc.write_back_cache();
        let source = [1u32; 16];
        let mut destination = [0u32; 16];

        let done = Transfer::prepare(&mut handle, &mut cache, &source, &mut destination)
            .and_then(|t| t.issue_receive())
            .and_then(|t| t.issue_transmit())
            .and_then(|t| t.wait(Spin))
            .unwrap();

        // TX busy for 3 polls, then RX busy for 3 more.
        assert_eq!(done.polls(), 7);
        assert_eq!(
            soc.trace().events().last(),
            Some(&TraceEvent::Acquire {
                address: destination_address(&done),
                len: 64
            })
        );
    }

    fn destination_address(done: &Completed<'_, [u32; 16]>) -> usize {
        done.destination().address()
    }

    #[test]
    fn wait_timeout_converts_to_completion_timeout() {
        let err: TransferError = WaitTimeout {
            polls: 11,
            elapsed_us: 100,
        }
        .into();
        assert_eq!(
            err,
            TransferError::CompletionTimeout {
                polls: 11,
                elapsed_us: 100
            }
        );
    }
}
