use anyhow::Result;
use colored::Colorize;
use std::time::Instant;

use crate::step::{self, cargo, OnFailure};
use crate::{FIRMWARE_PACKAGE, TARGET};

pub fn run() -> Result<()> {
    println!();
    println!("{}", "🔍 Checking builds...".cyan().bold());
    println!();

    let total_start = Instant::now();

    step::run(
        "Hardware target (RP2350, M1)",
        cargo(&["check", "-p", FIRMWARE_PACKAGE, "--target", TARGET, "--features", "hardware"]),
        OnFailure::Abort,
    )?;
    step::run(
        "Hardware target (RP2350, M2)",
        cargo(&[
            "check",
            "-p",
            FIRMWARE_PACKAGE,
            "--target",
            TARGET,
            "--features",
            "hardware,board-m2",
        ]),
        OnFailure::Abort,
    )?;
    step::run(
        "Platform crate (no_std)",
        cargo(&["check", "-p", "platform", "--target", TARGET, "--no-default-features"]),
        OnFailure::Abort,
    )?;
    step::run(
        "Host build (std)",
        cargo(&["check", "-p", FIRMWARE_PACKAGE, "--features", "std", "--all-targets"]),
        OnFailure::Abort,
    )?;

    // Lints and formatting are reported, not fatal.
    step::run(
        "Clippy",
        cargo(&["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"]),
        OnFailure::Warn,
    )?;
    if step::run("Formatting", cargo(&["fmt", "--all", "--check"]), OnFailure::Warn)?.is_none() {
        eprintln!("     Run 'cargo fmt --all' to fix");
    }

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
