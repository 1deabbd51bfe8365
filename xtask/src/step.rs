use anyhow::{Context, Result};
use colored::Colorize;
use std::process::{Command, Output};
use std::time::Instant;

/// How a failed step affects the task.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum OnFailure {
    /// Print the output and abort.
    Abort,
    /// Print a warning and keep going.
    Warn,
}

/// `cargo` with `args`.
pub fn cargo(args: &[&str]) -> Command {
    let mut cmd = Command::new("cargo");
    cmd.args(args);
    cmd
}

/// Run `cmd` as one named step, printing a pass/fail line with its duration.
///
/// Returns the captured output when the step passed, `None` when it failed
/// under [`OnFailure::Warn`].
pub fn run(label: &str, mut cmd: Command, on_failure: OnFailure) -> Result<Option<Output>> {
    println!("{}", format!("  {label}...").cyan());
    let start = Instant::now();

    let output = cmd
        .output()
        .with_context(|| format!("Failed to run step: {label}"))?;

    if output.status.success() {
        println!(
            "{}",
            format!("  ✓ {label} passed in {:.2}s", start.elapsed().as_secs_f64()).green()
        );
        println!();
        return Ok(Some(output));
    }

    match on_failure {
        OnFailure::Abort => {
            eprintln!("{}", format!("  ✗ {label} failed").red().bold());
            eprintln!();
            eprintln!("{}", String::from_utf8_lossy(&output.stderr));
            eprintln!("{}", String::from_utf8_lossy(&output.stdout));
            anyhow::bail!("{label} failed");
        }
        OnFailure::Warn => {
            eprintln!("{}", format!("  ⚠ {label} reported problems").yellow().bold());
            eprintln!();
            eprintln!("{}", String::from_utf8_lossy(&output.stderr));
            println!();
            Ok(None)
        }
    }
}

/// The `test result:` line of a cargo test run, or a placeholder.
pub fn test_summary(stdout: &str) -> String {
    let passed: u32 = stdout
        .lines()
        .filter_map(|line| line.split("test result:").nth(1))
        .filter_map(|summary| summary.split_whitespace().nth(1)?.parse::<u32>().ok())
        .sum();
    if stdout.contains("test result:") {
        format!("({passed} passed)")
    } else {
        "(summary not available)".to_string()
    }
}
