//! Mock implementations for testing
//!
//! Host-side doubles for every platform capability. They share one
//! [`OpTrace`], so a test can assert on the interleaving of register writes,
//! cache maintenance and DMA operations across capabilities.
//!
//! [`SimulatedSoc`] models a non-coherent system: the CPU works on its own
//! buffers (the "cache"), while the DMA engine only ever sees
//! [`DeviceMemory`]. Data crosses between the two only through
//! [`WriteBackCache`], so a missing publish or acquire produces exactly the
//! stale-data symptom it would on hardware.

#![cfg(any(test, feature = "std"))]

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::vec::Vec;

use crate::dma::{
    DmaBuffer, DmaBufferMut, DmaEngine, DmaError, InitFailure, IrqMask, SubmitFailure,
    TransferDirection,
};
use crate::{CacheMaintenance, RegisterBus};

/// One observable platform operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// Register write through a traced [`RecordingBus`].
    RegisterWrite {
        /// Byte offset.
        offset: usize,
        /// Written value.
        value: u32,
    },
    /// `DmaEngine::initialize` was called.
    DmaInitialize {
        /// Requested device id.
        device_id: u16,
    },
    /// Interrupts were masked on a channel.
    InterruptsDisabled {
        /// Channel.
        direction: TransferDirection,
    },
    /// The engine accepted a transfer.
    TransferIssued {
        /// Channel.
        direction: TransferDirection,
        /// Buffer address.
        address: usize,
        /// Length in bytes.
        length: usize,
    },
    /// CPU writes were published to device memory.
    Publish {
        /// Buffer address.
        address: usize,
        /// Length in bytes.
        len: usize,
    },
    /// Device writes were acquired into the CPU view.
    Acquire {
        /// Buffer address.
        address: usize,
        /// Length in bytes.
        len: usize,
    },
    /// The engine was reset.
    DmaReset,
}

/// Shared, append-only operation log.
#[derive(Debug, Clone, Default)]
pub struct OpTrace(Rc<RefCell<Vec<TraceEvent>>>);

impl OpTrace {
    /// Create an empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn record(&self, event: TraceEvent) {
        self.0.borrow_mut().push(event);
    }

    /// Snapshot of all events so far.
    pub fn events(&self) -> Vec<TraceEvent> {
        self.0.borrow().clone()
    }

    /// Index of the first event matching `predicate`.
    pub fn position(&self, predicate: impl Fn(&TraceEvent) -> bool) -> Option<usize> {
        self.0.borrow().iter().position(predicate)
    }
}

/// Register file backed by a map, logging every write.
///
/// Unwritten registers read as zero.
#[derive(Debug, Default)]
pub struct RecordingBus {
    registers: BTreeMap<usize, u32>,
    writes: Vec<(usize, u32)>,
    trace: Option<OpTrace>,
}

impl RecordingBus {
    /// Create an empty, untraced bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bus that also records writes into `trace`.
    pub fn with_trace(trace: OpTrace) -> Self {
        Self {
            trace: Some(trace),
            ..Self::default()
        }
    }

    /// Preload a register without logging a write.
    pub fn set_register(&mut self, offset: usize, value: u32) {
        self.registers.insert(offset, value);
    }

    /// All writes in order, as `(offset, value)`.
    pub fn writes(&self) -> &[(usize, u32)] {
        &self.writes
    }

    /// Values written to `offset`, in order.
    pub fn writes_to(&self, offset: usize) -> Vec<u32> {
        self.writes
            .iter()
            .filter(|(o, _)| *o == offset)
            .map(|(_, v)| *v)
            .collect()
    }
}

impl RegisterBus for RecordingBus {
    fn write_register(&mut self, offset: usize, value: u32) {
        self.registers.insert(offset, value);
        self.writes.push((offset, value));
        if let Some(trace) = &self.trace {
            trace.record(TraceEvent::RegisterWrite { offset, value });
        }
    }

    fn read_register(&self, offset: usize) -> u32 {
        self.registers.get(&offset).copied().unwrap_or(0)
    }
}

/// Physical memory as seen by the DMA engine, one `u32` per 4-byte address.
///
/// Words never written read back as [`DeviceMemory::POISON`].
#[derive(Debug, Clone, Default)]
pub struct DeviceMemory(Rc<RefCell<BTreeMap<usize, u32>>>);

impl DeviceMemory {
    /// Value of device words nothing has written.
    pub const POISON: u32 = 0xA5A5_A5A5;

    /// Create empty (all-poison) memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read one word.
    pub fn read_word(&self, address: usize) -> u32 {
        self.0.borrow().get(&address).copied().unwrap_or(Self::POISON)
    }

    /// Write one word.
    pub fn write_word(&self, address: usize, value: u32) {
        self.0.borrow_mut().insert(address, value);
    }

    /// Copy `words` to consecutive addresses from `address`.
    pub fn store(&self, address: usize, words: &[u32]) {
        let mut memory = self.0.borrow_mut();
        for (index, word) in words.iter().enumerate() {
            memory.insert(word_address(address, index), *word);
        }
    }

    /// Fill `words` from consecutive addresses from `address`.
    pub fn load_into(&self, address: usize, words: &mut [u32]) {
        let memory = self.0.borrow();
        for (index, word) in words.iter_mut().enumerate() {
            *word = memory
                .get(&word_address(address, index))
                .copied()
                .unwrap_or(Self::POISON);
        }
    }
}

fn word_address(base: usize, index: usize) -> usize {
    base.wrapping_add(index.wrapping_mul(core::mem::size_of::<u32>()))
}

/// Non-coherent cache model: publish copies the CPU buffer into
/// [`DeviceMemory`], acquire copies device memory back over it.
#[derive(Debug, Clone)]
pub struct WriteBackCache {
    memory: DeviceMemory,
    trace: OpTrace,
}

impl CacheMaintenance for WriteBackCache {
    fn publish_to_device<B: DmaBuffer + ?Sized>(&mut self, buffer: &B) {
        self.trace.record(TraceEvent::Publish {
            address: buffer.address(),
            len: buffer.byte_len(),
        });
        self.memory.store(buffer.address(), buffer.words());
    }

    fn acquire_from_device<B: DmaBufferMut + ?Sized>(&mut self, buffer: &mut B) {
        self.trace.record(TraceEvent::Acquire {
            address: buffer.address(),
            len: buffer.byte_len(),
        });
        let address = buffer.address();
        self.memory.load_into(address, buffer.words_mut());
    }
}

/// Busy countdown meaning "never completes".
const STALLED: u32 = u32::MAX;

/// Stream loopback DMA engine: MM2S data lands unchanged in the armed S2MM
/// buffer.
///
/// A transmit with no receive armed has nowhere to go, so the transmit
/// channel stalls forever, as an AXI stream with no consumer would.
pub struct LoopbackEngine {
    device_id: u16,
    memory: DeviceMemory,
    trace: OpTrace,
    initialized: bool,
    refusal: Option<InitFailure>,
    latency_polls: u32,
    stalled: bool,
    submit_refusal: Option<(TransferDirection, SubmitFailure)>,
    stream_limit_words: Option<usize>,
    receiver: Option<(usize, usize)>,
    rx_busy: Cell<u32>,
    tx_busy: Cell<u32>,
}

impl LoopbackEngine {
    /// Identity loopback answering to `device_id`.
    pub fn new(device_id: u16, memory: DeviceMemory, trace: OpTrace) -> Self {
        Self {
            device_id,
            memory,
            trace,
            initialized: false,
            refusal: None,
            latency_polls: 0,
            stalled: false,
            submit_refusal: None,
            stream_limit_words: None,
            receiver: None,
            rx_busy: Cell::new(0),
            tx_busy: Cell::new(0),
        }
    }

    /// Report busy for `polls` busy queries after each transfer.
    #[must_use]
    pub fn with_latency(mut self, polls: u32) -> Self {
        self.latency_polls = polls;
        self
    }

    /// Deliver at most `words` words per transmit; the rest of the armed
    /// receive buffer is left as it was in device memory.
    #[must_use]
    pub fn with_stream_limit(mut self, words: usize) -> Self {
        self.stream_limit_words = Some(words);
        self
    }

    /// Reject initialisation with `reason` even for the right device id.
    #[must_use]
    pub fn refusing_init(mut self, reason: InitFailure) -> Self {
        self.refusal = Some(reason);
        self
    }

    /// Reject every transfer in `direction` with `reason`. Rejections are
    /// not traced.
    #[must_use]
    pub fn refusing_transfer(mut self, direction: TransferDirection, reason: SubmitFailure) -> Self {
        self.submit_refusal = Some((direction, reason));
        self
    }

    /// Accept transfers but never complete them.
    #[must_use]
    pub fn stalled(mut self) -> Self {
        self.stalled = true;
        self
    }

    fn busy_cell(&self, direction: TransferDirection) -> &Cell<u32> {
        match direction {
            TransferDirection::ReceiveFromDevice => &self.rx_busy,
            TransferDirection::TransmitToDevice => &self.tx_busy,
        }
    }

    fn completion_countdown(&self) -> u32 {
        if self.stalled {
            STALLED
        } else {
            self.latency_polls
        }
    }

    fn stream(&mut self, source: usize, length: usize) {
        let Some((destination, capacity)) = self.receiver.take() else {
            self.tx_busy.set(STALLED);
            return;
        };
        let words = length.min(capacity).wrapping_div(core::mem::size_of::<u32>());
        let words = self.stream_limit_words.map_or(words, |limit| words.min(limit));
        for index in 0..words {
            let word = self.memory.read_word(word_address(source, index));
            self.memory
                .write_word(word_address(destination, index), word);
        }
        let countdown = self.completion_countdown();
        self.tx_busy.set(countdown);
        self.rx_busy.set(countdown);
    }
}

impl DmaEngine for LoopbackEngine {
    fn initialize(&mut self, device_id: u16) -> Result<(), DmaError> {
        self.trace.record(TraceEvent::DmaInitialize { device_id });
        if device_id != self.device_id {
            return Err(DmaError::ConfigNotFound { device_id });
        }
        if let Some(reason) = self.refusal {
            return Err(DmaError::InitializationFailed { reason });
        }
        self.initialized = true;
        Ok(())
    }

    fn disable_interrupts(&mut self, _mask: IrqMask, direction: TransferDirection) {
        self.trace.record(TraceEvent::InterruptsDisabled { direction });
    }

    fn issue_transfer(
        &mut self,
        address: usize,
        length: usize,
        direction: TransferDirection,
    ) -> Result<(), DmaError> {
        let reject = |reason| DmaError::TransferSubmissionFailed { direction, reason };
        if !self.initialized {
            return Err(reject(SubmitFailure::NotInitialized));
        }
        if length == 0 {
            return Err(reject(SubmitFailure::ZeroLength));
        }
        if address & 0b11 != 0 || length & 0b11 != 0 {
            return Err(reject(SubmitFailure::Misaligned));
        }
        if self.busy_cell(direction).get() != 0 {
            return Err(reject(SubmitFailure::ChannelBusy));
        }
        if let Some((refused, reason)) = self.submit_refusal {
            if refused == direction {
                return Err(reject(reason));
            }
        }

        self.trace.record(TraceEvent::TransferIssued {
            direction,
            address,
            length,
        });
        match direction {
            TransferDirection::ReceiveFromDevice => {
                self.receiver = Some((address, length));
                // Completes when the stream delivers data.
                self.rx_busy.set(STALLED);
            }
            TransferDirection::TransmitToDevice => self.stream(address, length),
        }
        Ok(())
    }

    fn is_busy(&self, direction: TransferDirection) -> bool {
        let cell = self.busy_cell(direction);
        match cell.get() {
            0 => false,
            STALLED => true,
            remaining => {
                cell.set(remaining.saturating_sub(1));
                true
            }
        }
    }

    fn reset(&mut self) {
        self.trace.record(TraceEvent::DmaReset);
        self.initialized = false;
        self.receiver = None;
        self.rx_busy.set(0);
        self.tx_busy.set(0);
    }
}

/// A small non-coherent SoC: traced register buses, device memory, a
/// write-back cache and loopback DMA engines, all sharing one trace.
#[derive(Debug, Clone, Default)]
pub struct SimulatedSoc {
    trace: OpTrace,
    memory: DeviceMemory,
}

impl SimulatedSoc {
    /// Fresh SoC with empty trace and all-poison device memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared operation trace.
    pub fn trace(&self) -> &OpTrace {
        &self.trace
    }

    /// The DMA-side view of memory.
    pub fn memory(&self) -> &DeviceMemory {
        &self.memory
    }

    /// Register bus that records into the shared trace.
    pub fn register_bus(&self) -> RecordingBus {
        RecordingBus::with_trace(self.trace.clone())
    }

    /// Identity loopback engine configured as `device_id`.
    pub fn loopback_engine(&self, device_id: u16) -> LoopbackEngine {
        LoopbackEngine::new(device_id, self.memory.clone(), self.trace.clone())
    }

    /// Cache model between CPU buffers and device memory.
    pub fn write_back_cache(&self) -> WriteBackCache {
        WriteBackCache {
            memory: self.memory.clone(),
            trace: self.trace.clone(),
        }
    }
}

/// [`embedded_hal::delay::DelayNs`] backed by `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

impl embedded_hal::delay::DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }
}
