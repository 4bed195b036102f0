//! DMA memory-region checks and cache-line constants.
//!
//! The loopback test places its two transfer buffers at fixed offsets inside a
//! DMA-reachable RAM window. Those offsets used to be implicit assumptions; here
//! they are [`MemoryRegion`] values whose relationships (disjoint, contained,
//! cache-line aligned, clear of register apertures) are checked in `const`
//! context by the board configuration, so a bad layout fails the build.
//!
//! ## Usage
//! ```rust
//! use iir_platform::dma_safety::{MemoryRegion, CACHE_LINE_BYTES};
//!
//! const WINDOW: MemoryRegion = MemoryRegion::new(0x1000_0000, 0x0040_0000);
//! const RX: MemoryRegion = MemoryRegion::new(0x1010_0000, 512);
//! const TX: MemoryRegion = MemoryRegion::new(0x1020_0000, 512);
//!
//! const _: () = assert!(WINDOW.contains(&RX) && WINDOW.contains(&TX));
//! const _: () = assert!(!RX.overlaps(&TX));
//! const _: () = assert!(RX.is_aligned_to(CACHE_LINE_BYTES));
//! ```

/// Largest data cache line among supported targets (Cortex-A53: 64 B,
/// Cortex-M7: 32 B). DMA buffers aligned and sized to this never share a line
/// with unrelated data on either.
pub const CACHE_LINE_BYTES: usize = 64;

/// A half-open physical address range `[base, base + len)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MemoryRegion {
    base: usize,
    len: usize,
}

impl MemoryRegion {
    /// Describe `len` bytes starting at `base`.
    pub const fn new(base: usize, len: usize) -> Self {
        Self { base, len }
    }

    /// The sub-region `len` bytes long, `offset` bytes into this one.
    pub const fn offset(&self, offset: usize, len: usize) -> Self {
        Self::new(self.base.saturating_add(offset), len)
    }

    /// First address.
    pub const fn base(&self) -> usize {
        self.base
    }

    /// Length in bytes.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the region is empty.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// One past the last address (saturating at `usize::MAX`).
    pub const fn end(&self) -> usize {
        self.base.saturating_add(self.len)
    }

    /// Whether `other` lies entirely inside this region.
    pub const fn contains(&self, other: &Self) -> bool {
        other.base >= self.base && other.end() <= self.end()
    }

    /// Whether the two regions share at least one byte.
    pub const fn overlaps(&self, other: &Self) -> bool {
        !self.is_empty() && !other.is_empty() && self.base < other.end() && other.base < self.end()
    }

    /// Whether base and length are both multiples of `align`.
    pub const fn is_aligned_to(&self, align: usize) -> bool {
        matches!(
            (self.base.checked_rem(align), self.len.checked_rem(align)),
            (Some(0), Some(0))
        )
    }

    /// Whether none of `others` overlaps this region.
    pub const fn is_clear_of(&self, others: &[Self]) -> bool {
        let mut rest = others;
        while let [first, tail @ ..] = rest {
            if self.overlaps(first) {
                return false;
            }
            rest = tail;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: MemoryRegion = MemoryRegion::new(0x1000_0000, 0x0040_0000);

    #[test]
    fn offset_region_is_contained() {
        let rx = WINDOW.offset(0x0010_0000, 512);
        assert_eq!(rx.base(), 0x1010_0000);
        assert_eq!(rx.end(), 0x1010_0200);
        assert!(WINDOW.contains(&rx));
    }

    #[test]
    fn region_past_window_end_is_not_contained() {
        let tail = WINDOW.offset(0x003F_FF00, 512);
        assert!(!WINDOW.contains(&tail));
    }

    #[test]
    fn adjacent_regions_do_not_overlap() {
        let a = MemoryRegion::new(0x1000, 0x100);
        let b = MemoryRegion::new(0x1100, 0x100);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn one_shared_byte_overlaps() {
        let a = MemoryRegion::new(0x1000, 0x101);
        let b = MemoryRegion::new(0x1100, 0x100);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn empty_region_overlaps_nothing() {
        let empty = MemoryRegion::new(0x1080, 0);
        assert!(!empty.overlaps(&WINDOW));
        assert!(empty.is_clear_of(&[WINDOW]));
    }

    #[test]
    fn alignment_checks_base_and_length() {
        assert!(MemoryRegion::new(0x1000_0040, 512).is_aligned_to(CACHE_LINE_BYTES));
        assert!(!MemoryRegion::new(0x1000_0020, 512).is_aligned_to(CACHE_LINE_BYTES));
        assert!(!MemoryRegion::new(0x1000_0040, 500).is_aligned_to(CACHE_LINE_BYTES));
        assert!(!MemoryRegion::new(0x1000_0040, 512).is_aligned_to(0));
    }

    #[test]
    fn clear_of_detects_any_collision() {
        let rx = WINDOW.offset(0x0010_0000, 512);
        let apertures = [
            MemoryRegion::new(0xA000_0000, 0x1_0000),
            MemoryRegion::new(0x1010_0100, 4),
        ];
        assert!(!rx.is_clear_of(&apertures));
        assert!(rx.is_clear_of(&apertures[..1]));
    }
}
