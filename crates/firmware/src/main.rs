//! Stereo IIR DMA loopback test - hardware entry point
//!
//! Cortex-M7 soft SoC with an AXI DMA core and the IIR filter block on the
//! AXI-Lite bus. Runs the routine once, then sleeps on success or traps on
//! failure so a debugger attached through probe-rs stops at the fault.

#![no_std]
#![no_main]

use cortex_m::asm;
use cortex_m_rt::entry;
use iir_platform::axi_dma::AxiDma;
use iir_platform::cache::CortexMDataCache;
use iir_platform::{DmaHandle, Mmio, Spin};

use iir_firmware::config::{AXI_DMA_CONFIG_TABLE, FILTER_BASE, RX_REGION, TX_REGION};
use iir_firmware::{FilterDriver, LoopbackBuffer, RunConfig};

// Logging transport + panic handler
use defmt_rtt as _;
use panic_probe as _;

#[entry]
fn main() -> ! {
    defmt::info!("IIR DMA loopback test v{=str}", env!("CARGO_PKG_VERSION"));

    let Some(mut core) = cortex_m::Peripherals::take() else {
        defmt::error!("core peripherals already taken");
        asm::udf();
    };

    // Step 0: caches on. From here every DMA buffer needs explicit
    // publish/acquire, which the orchestrator does.
    core.SCB.enable_icache();
    core.SCB.enable_dcache(&mut core.CPUID);

    // Step 1: map the two transfer buffers onto their fixed regions.
    // SAFETY: RX_REGION and TX_REGION are disjoint RAM inside the DMA window
    // (checked at compile time in `config`), outside the linker's memory map,
    // and mapped nowhere else in this program.
    let buffers = unsafe { (LoopbackBuffer::at(TX_REGION), LoopbackBuffer::at(RX_REGION)) };
    let (Some(source), Some(destination)) = buffers else {
        defmt::error!("transfer buffer regions do not fit LoopbackBuffer");
        asm::udf();
    };

    // Step 2: register windows.
    // SAFETY: FILTER_BASE is the filter block's AXI-Lite aperture; nothing
    // else in this program accesses it.
    let mut filter = FilterDriver::new(unsafe { Mmio::new(FILTER_BASE) });
    // SAFETY: the AXI DMA driver only forms addresses inside the aperture of
    // the instance from AXI_DMA_CONFIG_TABLE, which nothing else accesses.
    let mut dma = DmaHandle::new(AxiDma::new(unsafe { Mmio::new(0) }, &AXI_DMA_CONFIG_TABLE));
    let mut cache = CortexMDataCache::new(core.SCB);

    match iir_firmware::run(
        &RunConfig::DEFAULT,
        &mut filter,
        &mut dma,
        &mut cache,
        Spin,
        source,
        destination,
    ) {
        Ok(_) => {
            defmt::info!("loopback test complete");
            let _engine = dma.release();
            loop {
                asm::wfi();
            }
        }
        // Already logged by the routine.
        Err(_) => asm::udf(),
    }
}
