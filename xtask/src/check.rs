use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;
use std::time::Instant;

use crate::cargo::step;
use crate::FIRMWARE_TARGET;

pub fn run() -> Result<()> {
    println!();
    println!("{}", "🔍 Checking firmware builds...".cyan().bold());
    println!();

    let total_start = Instant::now();

    step(
        "Hardware build",
        &[
            "check",
            "-p",
            "iir-firmware",
            "--target",
            FIRMWARE_TARGET,
            "--features",
            "hardware",
        ],
    )?;
    step(
        "Emulator build",
        &["check", "-p", "iir-firmware", "--features", "emulator"],
    )?;
    step(
        "Platform crate (no_std)",
        &[
            "check",
            "-p",
            "iir-platform",
            "--target",
            FIRMWARE_TARGET,
            "--no-default-features",
        ],
    )?;
    println!();

    println!("{}", "  Running clippy lints...".cyan());
    let clippy_output = Command::new("cargo")
        .args(["clippy", "--workspace", "--all-targets", "--features", "iir-firmware/std", "--", "-D", "warnings"])
        .output()
        .context("Failed to run clippy")?;

    if !clippy_output.status.success() {
        eprintln!("{}", "  ⚠ Clippy warnings found".yellow().bold());
        eprintln!();
        eprintln!("{}", String::from_utf8_lossy(&clippy_output.stderr));
        // Don't fail on clippy warnings, just show them
    } else {
        println!("{}", "  ✓ Clippy passed".green());
    }
    println!();

    let fmt_output = Command::new("cargo")
        .args(["fmt", "--all", "--check"])
        .output()
        .context("Failed to run cargo fmt")?;

    if !fmt_output.status.success() {
        eprintln!("{}", "  ⚠ Formatting issues found".yellow().bold());
        eprintln!("     Run 'cargo fmt --all' to fix");
    } else {
        println!("{}", "  ✓ Formatting check passed".green());
    }
    println!();

    println!(
        "{}",
        format!(
            "✓ All checks completed in {:.2}s",
            total_start.elapsed().as_secs_f64()
        )
        .green()
        .bold()
    );
    println!();

    Ok(())
}
