use anyhow::Result;
use colored::Colorize;
use std::time::Instant;

use crate::cargo::step;

pub fn run(unit_only: bool, integration_only: bool) -> Result<()> {
    println!();
    println!("{}", "🧪 Running tests...".cyan().bold());
    println!();

    let total_start = Instant::now();

    if !integration_only {
        let output = step("Unit tests", &["test", "--lib", "--workspace"])?;
        println!("    {}", extract_test_summary(&String::from_utf8_lossy(&output.stdout)).dimmed());
    }

    if !unit_only {
        for package in ["iir-platform", "iir-firmware"] {
            let label = format!("Integration tests ({package})");
            let output = step(&label, &["test", "-p", package, "--tests"])?;
            println!("    {}", extract_test_summary(&String::from_utf8_lossy(&output.stdout)).dimmed());
        }
    }
    println!();

    println!(
        "{}",
        format!(
            "✓ All tests completed in {:.2}s",
            total_start.elapsed().as_secs_f64()
        )
        .green()
        .bold()
    );
    println!();

    Ok(())
}

fn extract_test_summary(output: &str) -> String {
    // Look for lines like "test result: ok. 5 passed; 0 failed; 0 ignored; 0 measured; 0 filtered out"
    output
        .lines()
        .filter_map(|line| line.split("test result:").nth(1))
        .last()
        .map(|summary| summary.trim().to_string())
        .unwrap_or_else(|| "(summary not available)".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_takes_last_result_line() {
        let output = "test a ... ok\ntest result: ok. 1 passed; 0 failed\n\ntest result: ok. 4 passed; 0 failed\n";
        assert_eq!(extract_test_summary(output), "ok. 4 passed; 0 failed");
    }

    #[test]
    fn summary_missing() {
        assert_eq!(extract_test_summary("nothing here"), "(summary not available)");
    }
}
