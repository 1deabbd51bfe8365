// Desktop/tooling crate — unwrap/expect/panic acceptable in non-embedded code.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod check;
mod flash;
mod step;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Cross-compilation target of the RP2350 Cortex-M33 cores.
pub const TARGET: &str = "thumbv8m.main-none-eabihf";

/// Package name of the firmware crate.
pub const FIRMWARE_PACKAGE: &str = "digger-firmware";

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Digger RP2350 development tasks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the firmware and run it on an RP2350 via probe-rs
    Flash {
        /// Build and flash release version
        #[arg(short, long)]
        release: bool,
        /// Use the M2 board pin layout
        #[arg(long)]
        m2: bool,
    },
    /// Check the hardware build, the host build, clippy and formatting
    Check,
    /// Run host tests (unit, integration, doc)
    Test {
        /// Run only unit tests
        #[arg(long)]
        unit: bool,
        /// Run only integration tests
        #[arg(long)]
        integration: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Flash { release, m2 } => flash::run(release, m2),
        Commands::Check => check::run(),
        Commands::Test { unit, integration } => test::run(unit, integration),
    }
}
