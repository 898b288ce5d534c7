//! Terminal and JSON output.

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use netaudit::audit::{ComplianceReport, DiffOutcome, RemediationOutcome};
use netaudit::{BatchFailure, Error, FleetReport};
use serde::Serialize;

/// Print a device header
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print every device's result, or all of them as one JSON array.
pub fn report<R: Serialize>(
    report: &FleetReport<R>,
    json: bool,
    show: impl Fn(&R),
) -> Result<()> {
    if json {
        let records: Vec<DeviceRecord<'_, R>> = report
            .iter()
            .map(|(device, result)| DeviceRecord::new(device, result))
            .collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    for (device, result) in report.iter() {
        header(device);
        match result {
            Ok(value) => show(value),
            Err(e) => device_error(e),
        }
    }
    summary(report.len(), report.failures().count());
    Ok(())
}

#[derive(Serialize)]
struct DeviceRecord<'a, R> {
    device: &'a str,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a R>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    batch: Option<&'a BatchFailure>,
}

impl<'a, R> DeviceRecord<'a, R> {
    fn new(device: &'a str, result: &'a netaudit::Result<R>) -> Self {
        match result {
            Ok(value) => Self {
                device,
                ok: true,
                result: Some(value),
                error: None,
                batch: None,
            },
            Err(e) => Self {
                device,
                ok: false,
                result: None,
                error: Some(e.to_string()),
                batch: e.batch_failure(),
            },
        }
    }
}

fn device_error(e: &Error) {
    error(&e.to_string());
    if let Some(failure) = e.batch_failure() {
        for response in &failure.applied {
            println!("  {} {}", "applied".green(), response.command);
        }
        println!("  {} {}", "failed".red(), failure.failed.command);
        if let Some(output) = &failure.failed.output {
            for line in output.lines() {
                println!("    {}", line.dimmed());
            }
        }
        for command in &failure.not_attempted {
            println!("  {} {}", "skipped".yellow(), command);
        }
    }
}

fn summary(total: usize, failed: usize) {
    println!();
    if failed == 0 {
        println!("{} {total} device(s) done", "✓".green());
    } else {
        println!("{} {failed} of {total} device(s) failed", "✗".red());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineStyle {
    FileHeader,
    HunkHeader,
    Added,
    Removed,
    Context,
}

fn classify(line: &str) -> LineStyle {
    if line.starts_with("+++") || line.starts_with("---") {
        LineStyle::FileHeader
    } else if line.starts_with("@@") {
        LineStyle::HunkHeader
    } else if line.starts_with('+') {
        LineStyle::Added
    } else if line.starts_with('-') {
        LineStyle::Removed
    } else {
        LineStyle::Context
    }
}

/// Print a diff outcome as coloured unified text.
pub fn diff(outcome: &DiffOutcome, from_label: &str, to_label: &str) {
    let Some(diff) = outcome.diff() else {
        println!("  {}", "No differences".green());
        return;
    };

    for line in diff.to_unified(from_label, to_label).lines() {
        match classify(line) {
            LineStyle::FileHeader => println!("{}", line.bold()),
            LineStyle::HunkHeader => println!("{}", line.cyan()),
            LineStyle::Added => println!("{}", line.green()),
            LineStyle::Removed => println!("{}", line.red()),
            LineStyle::Context => println!("{line}"),
        }
    }
    let stats = diff.stats();
    println!(
        "  {} added, {} removed",
        stats.added.to_string().green(),
        stats.removed.to_string().red()
    );
}

pub fn compliance(report: &ComplianceReport) {
    if report.is_compliant() {
        println!("  {}", "Compliant".green());
        return;
    }
    for rule in &report.missing {
        println!("  {} {}", "[Missing]".red(), rule);
    }
}

pub fn remediation(outcome: &RemediationOutcome) {
    match outcome {
        RemediationOutcome::NoOp => println!("  {}", "Nothing to apply".dimmed()),
        RemediationOutcome::Applied(responses) => {
            for response in responses {
                println!("  {} {}", "applied".green(), response.command);
            }
        }
    }
}

/// Outcome of saving one device's running-config.
#[derive(Debug, Serialize)]
pub struct BackupRecord {
    pub device: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BackupRecord {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

pub fn backups(records: &[BackupRecord], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }

    for record in records {
        match (&record.path, &record.error) {
            (_, Some(e)) => error(&format!("{}: {e}", record.device)),
            (Some(path), None) => println!(
                "{} {}: running-config saved to {}",
                "✓".green(),
                record.device,
                path.display()
            ),
            (None, None) => {}
        }
    }
    summary(records.len(), records.iter().filter(|r| !r.is_ok()).count());
    Ok(())
}
