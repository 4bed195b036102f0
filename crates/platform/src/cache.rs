//! Cache maintenance around DMA transfers.
//!
//! With the D-cache enabled, the CPU and the DMA engine see two different
//! views of a buffer:
//!
//! - CPU writes may sit in dirty cache lines that never reached RAM, so the
//!   engine reads stale data unless the range is **published** (cleaned)
//!   before the transfer is issued.
//! - Engine writes land in RAM behind the cache, so the CPU keeps reading
//!   stale lines unless the range is **acquired** (invalidated) after the
//!   engine finishes and before the CPU reads.
//!
//! Getting this wrong is never reported. It shows up only as wrong samples,
//! which is why the orchestrator performs both steps itself.
//!
//! The destination buffer is published too, before the receive transfer is
//! armed: a dirty line evicted mid-transfer would overwrite DMA data.
//!
//! # References
//! - ARM DDI0489F §B3.5: Cache coherency
//! - ST AN4839: Level 1 cache on STM32F7 Series and STM32H7 Series

use crate::dma::{DmaBuffer, DmaBufferMut};

/// Publish/acquire capability over DMA word buffers.
///
/// On hardware with automatic coherency both operations are no-ops
/// ([`CoherentMemory`]).
pub trait CacheMaintenance {
    /// Make prior CPU writes to `buffer` visible to the DMA engine.
    fn publish_to_device<B: DmaBuffer + ?Sized>(&mut self, buffer: &B);

    /// Make DMA engine writes to `buffer` visible to the CPU.
    fn acquire_from_device<B: DmaBufferMut + ?Sized>(&mut self, buffer: &mut B);
}

/// Cache backend for coherent memory (non-cacheable region, coherent
/// interconnect, or caches disabled).
#[derive(Debug, Default, Clone, Copy)]
pub struct CoherentMemory;

impl CacheMaintenance for CoherentMemory {
    fn publish_to_device<B: DmaBuffer + ?Sized>(&mut self, _buffer: &B) {}

    fn acquire_from_device<B: DmaBufferMut + ?Sized>(&mut self, _buffer: &mut B) {}
}

/// Cortex-M7 D-cache backend: clean by address to publish, invalidate by
/// address to acquire.
///
/// Buffers must start on a cache line and span whole lines
/// ([`crate::CACHE_LINE_BYTES`]); invalidating a partial line would also
/// discard CPU writes to whatever shares it.
#[cfg(feature = "hardware")]
pub struct CortexMDataCache {
    scb: cortex_m::peripheral::SCB,
}

#[cfg(feature = "hardware")]
impl CortexMDataCache {
    /// Take ownership of the SCB for cache maintenance.
    pub fn new(scb: cortex_m::peripheral::SCB) -> Self {
        Self { scb }
    }

    /// Give the SCB back.
    pub fn free(self) -> cortex_m::peripheral::SCB {
        self.scb
    }
}

#[cfg(feature = "hardware")]
impl CacheMaintenance for CortexMDataCache {
    fn publish_to_device<B: DmaBuffer + ?Sized>(&mut self, buffer: &B) {
        self.scb.clean_dcache_by_slice(buffer.words());
    }

    fn acquire_from_device<B: DmaBufferMut + ?Sized>(&mut self, buffer: &mut B) {
        // SAFETY: the buffer is exclusively borrowed, so no CPU writes to it
        // can be pending, and DMA buffers are whole cache lines, so no
        // neighbouring data shares the invalidated lines.
        unsafe { self.scb.invalidate_dcache_by_slice(buffer.words_mut()) }
    }
}
