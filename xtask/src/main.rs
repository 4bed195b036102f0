// Desktop/tooling crate: unwrap/expect/panic acceptable in non-embedded code.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod cargo;
mod check;
mod flash;
mod test;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Cross-compilation target of the loopback firmware.
pub const FIRMWARE_TARGET: &str = "thumbv7em-none-eabihf";

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "IIR loopback test development tasks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the firmware and flash it via probe-rs
    Flash {
        /// Build and flash release version
        #[arg(short, long)]
        release: bool,
        /// probe-rs chip name (or custom target description) of the board's
        /// Cortex-M7 core
        #[arg(long)]
        chip: String,
    },
    /// Check the hardware build, the host build and clippy
    Check,
    /// Run unit and integration tests
    Test {
        /// Run only unit tests
        #[arg(long)]
        unit: bool,
        /// Run only integration tests
        #[arg(long)]
        integration: bool,
    },
    /// Run the loopback routine against the simulated SoC on the host
    Run {
        /// RUST_LOG filter for the run
        #[arg(long, default_value = "info")]
        log: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Flash { release, chip } => flash::run(release, &chip),
        Commands::Check => check::run(),
        Commands::Test { unit, integration } => test::run(unit, integration),
        Commands::Run { log } => flash::run_emulated(&log),
    }
}
