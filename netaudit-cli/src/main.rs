mod cli;
mod inventory;
mod render;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::info;
use netaudit::audit::{self, Policy};
use netaudit::{Fleet, Session};

use cli::{Cli, Command};
use inventory::Inventory;
use render::BackupRecord;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity; RUST_LOG still wins
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            render::error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every device succeeded.
async fn run(cli: Cli) -> Result<bool> {
    let devices = Inventory::load(&cli.inventory, cli.timeout)?.select(&cli.devices)?;
    if devices.is_empty() {
        bail!("No devices in inventory {}", cli.inventory.display());
    }
    let fleet = Fleet::new(devices).with_concurrency(cli.concurrency);
    let json = cli.json;

    match cli.command {
        Command::DiffStartup => {
            let report = fleet
                .run(async |session: &mut Session| {
                    audit::compare_running_vs_startup(session).await
                })
                .await;
            render::report(&report, json, |outcome| {
                render::diff(outcome, "startup-config", "running-config")
            })?;
            Ok(report.is_clean())
        }

        Command::DiffFile { path } => {
            let per_device = path.is_dir();
            let path = &path;
            let report = fleet
                .run(async |session: &mut Session| {
                    let reference = reference_file(path, per_device, session.name());
                    audit::compare_running_vs_file(session, &reference).await
                })
                .await;
            let label = path.display().to_string();
            render::report(&report, json, |outcome| {
                render::diff(outcome, &label, "running-config")
            })?;
            Ok(report.is_clean())
        }

        Command::CheckPolicy { policy } => {
            let policy = match policy {
                Some(path) => Policy::from_file(&path)?,
                None => Policy::hardening_baseline(),
            };
            info!("checking {} policy rule(s)", policy.len());
            let policy = &policy;
            let report = fleet
                .run(async |session: &mut Session| {
                    audit::evaluate_running_policy(session, policy).await
                })
                .await;
            render::report(&report, json, render::compliance)?;
            Ok(report.is_clean())
        }

        Command::Backup { dir } => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            let report = fleet
                .run(async |session: &mut Session| audit::fetch_running_config(session).await)
                .await;

            let records: Vec<BackupRecord> = report
                .into_iter()
                .map(|(device, result)| {
                    let saved = result.map_err(anyhow::Error::from).and_then(|config| {
                        let path = backup_path(&dir, &device);
                        std::fs::write(&path, config.to_string())
                            .with_context(|| format!("Failed to write {}", path.display()))?;
                        Ok(path)
                    });
                    match saved {
                        Ok(path) => BackupRecord {
                            device,
                            path: Some(path),
                            error: None,
                        },
                        Err(e) => BackupRecord {
                            device,
                            path: None,
                            error: Some(format!("{e:#}")),
                        },
                    }
                })
                .collect();
            render::backups(&records, json)?;
            Ok(records.iter().all(BackupRecord::is_ok))
        }

        Command::Remediate(intent) => {
            let remediation = intent.into_remediation()?;
            info!("remediation: {remediation}");
            let remediation = &remediation;
            let report = fleet
                .run(async |session: &mut Session| {
                    audit::apply_remediation(session, remediation).await
                })
                .await;
            render::report(&report, json, render::remediation)?;
            Ok(report.is_clean())
        }
    }
}

fn backup_path(dir: &Path, device: &str) -> PathBuf {
    dir.join(format!("{device}_running-config.txt"))
}

/// A directory holds one backup per device; a file is shared by all.
fn reference_file(path: &Path, per_device: bool, device: &str) -> PathBuf {
    if per_device {
        backup_path(path, device)
    } else {
        path.to_path_buf()
    }
}
