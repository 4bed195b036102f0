//! DMA abstraction layer
//!
//! Provides the one-shot, polled DMA capability used by the loopback test and
//! an explicit resource handle that owns the engine.
//!
//! There is no ambient engine instance: callers build a [`DmaHandle`] around a
//! concrete [`DmaEngine`], initialise it on demand, and pass it to whatever
//! issues transfers. Releasing the handle resets the engine.

use thiserror_no_std::Error;

/// Direction of a single DMA transfer, seen from memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferDirection {
    /// Device → memory (AXI DMA S2MM channel).
    ReceiveFromDevice,
    /// Memory → device (AXI DMA MM2S channel).
    TransmitToDevice,
}

impl TransferDirection {
    /// Both directions, receive first (the order transfers must be issued in).
    pub const BOTH: [Self; 2] = [Self::ReceiveFromDevice, Self::TransmitToDevice];

    /// Short channel label for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReceiveFromDevice => "RX",
            Self::TransmitToDevice => "TX",
        }
    }
}

impl core::fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interrupt-enable bits of a DMA channel control register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IrqMask(u32);

impl IrqMask {
    /// Interrupt on complete.
    pub const IOC: Self = Self(1 << 12);
    /// Interrupt on delay timer.
    pub const DELAY: Self = Self(1 << 13);
    /// Interrupt on error.
    pub const ERROR: Self = Self(1 << 14);
    /// All channel interrupts.
    pub const ALL: Self = Self(Self::IOC.0 | Self::DELAY.0 | Self::ERROR.0);

    /// Raw control-register bits.
    pub const fn bits(self) -> u32 {
        self.0
    }
}

/// Why the engine rejected its configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitFailure {
    /// The core was built with scatter-gather; only simple mode is supported.
    #[error("scatter-gather build, simple mode required")]
    ScatterGatherUnsupported,
    /// The core lacks the MM2S or S2MM channel.
    #[error("transmit or receive channel missing")]
    MissingChannel,
    /// Length register width outside what the core can be built with.
    #[error("invalid length register width")]
    InvalidLengthWidth,
    /// The self-clearing reset bit never cleared.
    #[error("reset did not complete")]
    ResetTimeout,
    /// The engine refused the configuration for another reason.
    #[error("configuration refused")]
    Refused,
}

/// Why the engine rejected a transfer request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SubmitFailure {
    /// `initialize` has not succeeded yet.
    #[error("engine not initialized")]
    NotInitialized,
    /// The channel is still running a previous transfer.
    #[error("channel busy")]
    ChannelBusy,
    /// Zero-length transfer.
    #[error("zero length")]
    ZeroLength,
    /// Longer than the length register can express.
    #[error("length exceeds engine maximum")]
    LengthTooLarge,
    /// Address or length not aligned to the stream word.
    #[error("address or length misaligned")]
    Misaligned,
    /// Address wider than the engine's address bus.
    #[error("address out of engine range")]
    AddressOutOfRange,
}

/// DMA errors. All of them are fatal for a one-shot run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaError {
    /// No configuration descriptor exists for the device id.
    #[error("DMA config not found for device {device_id}")]
    ConfigNotFound {
        /// Requested device id.
        device_id: u16,
    },
    /// The descriptor exists but the engine rejected it.
    #[error("DMA init failed: {reason}")]
    InitializationFailed {
        /// Rejection cause.
        reason: InitFailure,
    },
    /// The engine rejected a transfer at issue time.
    #[error("DMA {direction} submission failed: {reason}")]
    TransferSubmissionFailed {
        /// Channel the request was for.
        direction: TransferDirection,
        /// Rejection cause.
        reason: SubmitFailure,
    },
}

/// One-shot, polled DMA engine capability.
///
/// Implementations report rejection only at issue time; a transfer that was
/// accepted either completes or leaves the channel busy forever.
pub trait DmaEngine {
    /// Look up the descriptor for `device_id` and configure the engine.
    fn initialize(&mut self, device_id: u16) -> Result<(), DmaError>;

    /// Mask the given interrupt sources on one channel.
    fn disable_interrupts(&mut self, mask: IrqMask, direction: TransferDirection);

    /// Start a single transfer of `length` bytes at `address`.
    fn issue_transfer(
        &mut self,
        address: usize,
        length: usize,
        direction: TransferDirection,
    ) -> Result<(), DmaError>;

    /// Whether the channel is still moving data.
    fn is_busy(&self, direction: TransferDirection) -> bool;

    /// Stop both channels and return the engine to its reset state.
    fn reset(&mut self);
}

/// Explicit, lazily initialised owner of a [`DmaEngine`].
///
/// Constructing a handle touches no hardware. [`DmaHandle::initialize`]
/// configures the engine and masks every interrupt in both directions, since
/// completion is detected by polling only. [`DmaHandle::release`] is the
/// teardown: it resets an initialised engine and hands it back.
pub struct DmaHandle<E> {
    engine: E,
    device_id: Option<u16>,
}

impl<E: DmaEngine> DmaHandle<E> {
    /// Wrap an engine without touching it.
    pub const fn new(engine: E) -> Self {
        Self {
            engine,
            device_id: None,
        }
    }

    /// Initialise the engine for `device_id` in polling mode.
    ///
    /// Calling it again for the same device is a no-op. A different device id
    /// resets the engine first.
    pub fn initialize(&mut self, device_id: u16) -> Result<(), DmaError> {
        match self.device_id {
            Some(current) if current == device_id => return Ok(()),
            Some(_) => self.teardown(),
            None => {}
        }

        self.engine.initialize(device_id)?;
        for direction in TransferDirection::BOTH {
            self.engine.disable_interrupts(IrqMask::ALL, direction);
        }
        self.device_id = Some(device_id);
        Ok(())
    }

    /// Whether [`DmaHandle::initialize`] has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.device_id.is_some()
    }

    /// Device id the engine was initialised for.
    pub fn device_id(&self) -> Option<u16> {
        self.device_id
    }

    /// Shared access to the engine (busy queries).
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Exclusive access to the engine (issuing transfers).
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Reset the engine if it was initialised and return it.
    pub fn release(mut self) -> E {
        self.teardown();
        self.engine
    }

    fn teardown(&mut self) {
        if self.device_id.take().is_some() {
            self.engine.reset();
        }
    }
}

/// Word buffer the DMA engine can read (transmit source).
///
/// The stream is 32 bits wide, so buffers are exposed as `u32` words.
pub trait DmaBuffer {
    /// The words the engine will read.
    fn words(&self) -> &[u32];

    /// Bus address of the first word.
    fn address(&self) -> usize {
        self.words().as_ptr() as usize
    }

    /// Length in bytes.
    fn byte_len(&self) -> usize {
        core::mem::size_of_val(self.words())
    }

    /// Check if buffer is empty
    fn is_empty(&self) -> bool {
        self.words().is_empty()
    }
}

/// Word buffer the DMA engine can write (receive destination).
pub trait DmaBufferMut: DmaBuffer {
    /// The words the engine will write.
    fn words_mut(&mut self) -> &mut [u32];
}

impl DmaBuffer for [u32] {
    fn words(&self) -> &[u32] {
        self
    }
}

impl DmaBufferMut for [u32] {
    fn words_mut(&mut self) -> &mut [u32] {
        self
    }
}

impl<const N: usize> DmaBuffer for [u32; N] {
    fn words(&self) -> &[u32] {
        self
    }
}

impl<const N: usize> DmaBufferMut for [u32; N] {
    fn words_mut(&mut self) -> &mut [u32] {
        self
    }
}
