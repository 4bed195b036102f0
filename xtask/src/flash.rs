use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;
use std::time::Instant;

use crate::cargo::step;
use crate::FIRMWARE_TARGET;

fn binary_path(release: bool) -> String {
    let profile = if release { "release" } else { "debug" };
    format!("target/{FIRMWARE_TARGET}/{profile}/firmware")
}

pub fn run(release: bool, chip: &str) -> Result<()> {
    let mode = if release { "release" } else { "debug" };

    println!();
    println!(
        "{}",
        format!("🔨 Building firmware ({mode} mode)...").cyan().bold()
    );
    println!();

    let mut args = vec![
        "build",
        "-p",
        "iir-firmware",
        "--bin",
        "firmware",
        "--target",
        FIRMWARE_TARGET,
        "--features",
        "hardware",
    ];
    if release {
        args.push("--release");
    }
    step("Firmware build", &args)?;
    println!();

    show_binary_size(release);
    println!();

    println!("{}", format!("📡 Flashing to {chip}...").cyan().bold());
    println!("   {}", "Connecting to probe...".dimmed());

    let flash_start = Instant::now();
    let flash_output = Command::new("probe-rs")
        .arg("run")
        .arg(binary_path(release))
        .arg("--chip")
        .arg(chip)
        .arg("--probe-index")
        .arg("0")
        .output()
        .context("Failed to run probe-rs. Is probe-rs installed? (cargo install probe-rs-tools)")?;

    if !flash_output.status.success() {
        eprintln!("{}", "✗ Flash failed".red().bold());
        eprintln!();
        eprintln!("{}", String::from_utf8_lossy(&flash_output.stderr));
        anyhow::bail!("Flash failed - check that the probe is connected and the device is powered");
    }

    println!(
        "{}",
        format!(
            "✓ Flash successful in {:.2}s",
            flash_start.elapsed().as_secs_f64()
        )
        .green()
    );
    println!();
    println!(
        "   {}",
        format!("Use 'probe-rs attach --chip {chip}' to view RTT logs").dimmed()
    );
    println!();

    Ok(())
}

/// Run the host loopback binary with `RUST_LOG` set to `log`.
pub fn run_emulated(log: &str) -> Result<()> {
    println!();
    println!("{}", "▶ Running loopback on the simulated SoC...".cyan().bold());
    println!();

    let status = Command::new("cargo")
        .args([
            "run",
            "-p",
            "iir-firmware",
            "--bin",
            "loopback",
            "--features",
            "emulator",
        ])
        .env("RUST_LOG", log)
        .status()
        .context("Failed to run the loopback binary")?;

    if !status.success() {
        anyhow::bail!("Loopback run failed ({status})");
    }
    Ok(())
}

fn show_binary_size(release: bool) {
    let output = Command::new("rust-size")
        .arg(binary_path(release))
        .arg("-A")
        .output();

    if let Ok(out) = output {
        if out.status.success() {
            println!("{}", "📊 Binary size:".cyan());
            for line in String::from_utf8_lossy(&out.stdout).lines() {
                println!("   {}", line.dimmed());
            }
        }
    }
}
