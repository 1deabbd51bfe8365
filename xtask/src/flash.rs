use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;

use crate::step::{self, cargo, OnFailure};
use crate::{FIRMWARE_PACKAGE, TARGET};

/// probe-rs chip name for the RP2350.
const CHIP: &str = "RP235x";

/// Binary target name of the firmware.
const BINARY: &str = "digger";

pub fn run(release: bool, m2: bool) -> Result<()> {
    let mode = if release { "release" } else { "debug" };
    let features = if m2 { "hardware,board-m2" } else { "hardware" };

    println!();
    println!(
        "{}",
        format!(
            "🔨 Building {} firmware ({mode} mode, {})...",
            platform::config::APP_NAME,
            if m2 { "M2" } else { "M1" }
        )
        .cyan()
        .bold()
    );
    println!();

    let mut args = vec![
        "build",
        "-p",
        FIRMWARE_PACKAGE,
        "--bin",
        BINARY,
        "--target",
        TARGET,
        "--features",
        features,
    ];
    if release {
        args.push("--release");
    }
    step::run("Build", cargo(&args), OnFailure::Abort)?;

    let elf = format!("target/{TARGET}/{mode}/{BINARY}");
    show_binary_size(&elf);

    // probe-rs run streams RTT (defmt) until interrupted, so inherit stdio.
    println!("{}", format!("📡 Flashing to {}...", platform::config::APP_TARGET).cyan().bold());
    let status = Command::new("probe-rs")
        .args(["run", "--chip", CHIP, &elf])
        .status()
        .context("Failed to run probe-rs. Is probe-rs installed? (cargo install probe-rs-tools)")?;

    if !status.success() {
        anyhow::bail!("Flash failed - check that the probe is connected and the board is powered");
    }
    Ok(())
}

fn show_binary_size(elf: &str) {
    let Ok(out) = Command::new("rust-size").args(["-A", elf]).output() else {
        return;
    };
    if out.status.success() {
        println!("{}", "📊 Binary size:".cyan());
        for line in String::from_utf8_lossy(&out.stdout).lines() {
            println!("   {}", line.dimmed());
        }
        println!();
    }
}
