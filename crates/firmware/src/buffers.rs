//! Transfer buffers and the stereo sample format.
//!
//! The AXI stream between the DMA engine and the filter is 32 bits wide and
//! carries one stereo frame per beat: left lane in the high half-word, right
//! lane in the low half-word, both signed 16-bit.
//!
//! [`TransferBuffer`] is `#[repr(C, align(64))]` and a whole number of cache
//! lines long for every supported frame count, so clean/invalidate on it never
//! touches neighbouring data.

use core::fmt;

use iir_platform::{DmaBuffer, DmaBufferMut, MemoryRegion, CACHE_LINE_BYTES};

use crate::config::TEST_LENGTH;

/// Amplitude of the impulse placed in frame 0 of the test vector, both lanes.
pub const IMPULSE_AMPLITUDE: i16 = 10_000;

/// One stereo sample pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StereoSample {
    /// Left lane.
    pub left: i16,
    /// Right lane.
    pub right: i16,
}

impl StereoSample {
    /// Silence.
    pub const SILENCE: Self = Self::new(0, 0);

    /// Pair two lanes.
    pub const fn new(left: i16, right: i16) -> Self {
        Self { left, right }
    }

    /// Whether both lanes are zero.
    pub const fn is_silent(&self) -> bool {
        self.left == 0 && self.right == 0
    }
}

impl fmt::Display for StereoSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L={}, R={}", self.left, self.right)
    }
}

/// A stereo sample packed into one stream word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct SampleFrame(u32);

impl SampleFrame {
    /// Wrap a raw stream word.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw stream word.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Pack: left into bits 31..16, right into bits 15..0.
    pub const fn pack(sample: StereoSample) -> Self {
        Self((sample.left as u16 as u32).wrapping_shl(16) | sample.right as u16 as u32)
    }

    /// Unpack: high half-word is left, low half-word is right.
    pub const fn unpack(self) -> StereoSample {
        StereoSample::new(self.0.wrapping_shr(16) as u16 as i16, self.0 as u16 as i16)
    }
}

impl From<StereoSample> for SampleFrame {
    fn from(sample: StereoSample) -> Self {
        Self::pack(sample)
    }
}

impl From<SampleFrame> for StereoSample {
    fn from(frame: SampleFrame) -> Self {
        frame.unpack()
    }
}

/// The impulse test vector: `length` frames, frame 0 is
/// ([`IMPULSE_AMPLITUDE`], [`IMPULSE_AMPLITUDE`]), the rest silence.
pub fn impulse_test_vector(length: usize) -> impl Iterator<Item = SampleFrame> + Clone {
    let impulse = SampleFrame::pack(StereoSample::new(IMPULSE_AMPLITUDE, IMPULSE_AMPLITUDE));
    core::iter::once(impulse)
        .chain(core::iter::repeat(SampleFrame::default()))
        .take(length)
}

/// DMA transfer buffer of `N` stream words, cache-line aligned.
#[derive(Clone)]
#[repr(C, align(64))]
pub struct TransferBuffer<const N: usize> {
    words: [u32; N],
}

/// The buffer size the loopback test uses.
pub type LoopbackBuffer = TransferBuffer<TEST_LENGTH>;

const _: () = assert!(core::mem::align_of::<LoopbackBuffer>() == CACHE_LINE_BYTES);
#[allow(clippy::arithmetic_side_effects)] // const-evaluated
const _: () = assert!(core::mem::size_of::<LoopbackBuffer>() % CACHE_LINE_BYTES == 0);

impl<const N: usize> TransferBuffer<N> {
    /// Frames in the buffer.
    pub const LEN: usize = N;

    /// An all-zero buffer.
    pub const fn zeroed() -> Self {
        Self { words: [0; N] }
    }

    /// Reinterpret the fixed memory at `region` as a buffer.
    ///
    /// Returns `None` if `region` is not exactly this buffer's size or is not
    /// aligned for it.
    ///
    /// # Safety
    ///
    /// `region` must be RAM that is valid for reads and writes for the rest of
    /// the program, and no other reference to it may exist or be created.
    pub unsafe fn at(region: MemoryRegion) -> Option<&'static mut Self> {
        if region.len() != core::mem::size_of::<Self>()
            || !region.is_aligned_to(core::mem::align_of::<Self>())
        {
            return None;
        }
        // SAFETY: size and alignment checked above; validity and exclusivity
        // are the caller's contract.
        unsafe { (region.base() as *mut Self).as_mut() }
    }

    /// Zero every frame.
    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    /// Overwrite the buffer from `frames`, zero-filling any frames the
    /// iterator does not supply.
    pub fn fill_from(&mut self, frames: impl IntoIterator<Item = SampleFrame>) {
        let mut frames = frames.into_iter();
        for word in &mut self.words {
            *word = frames.next().map_or(0, SampleFrame::bits);
        }
    }

    /// Frames in order.
    pub fn frames(&self) -> impl Iterator<Item = SampleFrame> + '_ {
        self.words.iter().copied().map(SampleFrame::from_bits)
    }

    /// The raw stream words.
    pub fn as_words(&self) -> &[u32; N] {
        &self.words
    }
}

impl<const N: usize> Default for TransferBuffer<N> {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl<const N: usize> DmaBuffer for TransferBuffer<N> {
    fn words(&self) -> &[u32] {
        &self.words
    }
}

impl<const N: usize> DmaBufferMut for TransferBuffer<N> {
    fn words_mut(&mut self) -> &mut [u32] {
        &mut self.words
    }
}
