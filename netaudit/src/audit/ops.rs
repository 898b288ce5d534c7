//! One request/response operation per operator action.
//!
//! Each function takes an established session and returns a structured
//! result; rendering is left to the caller.

use std::path::Path;

use log::{debug, info};
use serde::Serialize;

use super::compliance::{ComplianceReport, Policy};
use super::differ::{self, DiffOutcome};
use super::remediation::Remediation;
use super::text::{ConfigSource, ConfigText};
use crate::error::Result;
use crate::session::{Response, Session};
use crate::transport::Transport;

/// What [`apply_remediation`] did.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", content = "responses", rename_all = "kebab-case")]
pub enum RemediationOutcome {
    /// Every command was accepted.
    Applied(Vec<Response>),
    /// The intent expanded to no commands; nothing was sent.
    NoOp,
}

/// Retrieve the running configuration.
pub async fn fetch_running_config<T: Transport>(session: &mut Session<T>) -> Result<ConfigText> {
    let command = session.platform().running_config_command.clone();
    let text = session.run_show(&command).await?;
    debug!("{}: running-config has {} lines", session.name(), text.lines().count());
    Ok(ConfigText::parse(ConfigSource::Running, &text))
}

/// Retrieve the startup configuration.
pub async fn fetch_startup_config<T: Transport>(session: &mut Session<T>) -> Result<ConfigText> {
    let command = session.platform().startup_config_command.clone();
    let text = session.run_show(&command).await?;
    Ok(ConfigText::parse(ConfigSource::Startup, &text))
}

/// Diff startup (reference) against running (candidate).
pub async fn compare_running_vs_startup<T: Transport>(
    session: &mut Session<T>,
) -> Result<DiffOutcome> {
    let running = fetch_running_config(session).await?;
    let startup = fetch_startup_config(session).await?;
    Ok(differ::diff(&startup, &running))
}

/// Diff a local file (reference) against running (candidate).
///
/// The file is read before the device is queried, so a missing file never
/// costs a round trip.
pub async fn compare_running_vs_file<T: Transport>(
    session: &mut Session<T>,
    path: &Path,
) -> Result<DiffOutcome> {
    let reference = ConfigText::from_file(path)?;
    let running = fetch_running_config(session).await?;
    Ok(differ::diff(&reference, &running))
}

/// Evaluate `policy` against the running configuration.
pub async fn evaluate_running_policy<T: Transport>(
    session: &mut Session<T>,
    policy: &Policy,
) -> Result<ComplianceReport> {
    let running = fetch_running_config(session).await?;
    let report = policy.evaluate(&running);
    info!(
        "{}: {} of {} policy rules missing",
        session.name(),
        report.missing.len(),
        policy.len()
    );
    Ok(report)
}

/// Push a remediation as one configuration batch.
pub async fn apply_remediation<T: Transport>(
    session: &mut Session<T>,
    remediation: &Remediation,
) -> Result<RemediationOutcome> {
    if remediation.is_noop() {
        info!("{}: {}: nothing to apply", session.name(), remediation);
        return Ok(RemediationOutcome::NoOp);
    }

    info!("{}: applying {}", session.name(), remediation);
    let responses = session.run_config_set(&remediation.batch()).await?;
    Ok(RemediationOutcome::Applied(responses))
}

#[cfg(test)]
mod tests {
    use std::net::IpAddr;

    use super::*;
    use crate::audit::DiffKind;
    use crate::error::Error;
    use crate::session::SessionState;
    use crate::session::test_support::{open, privileged_device};

    const RUNNING: &str = "show running-config\r\nBuilding configuration...\r\n\r\nhostname r1\r\nno cdp run\r\nlogging host 192.0.2.50\r\nend\r\n\r\nrouter#";

    #[tokio::test]
    async fn test_compare_running_vs_startup() {
        let script = privileged_device()
            .reply("show running-config", RUNNING)
            .reply(
                "show startup-config",
                "show startup-config\r\nBuilding configuration...\r\n\r\nhostname r1\r\nno cdp run\r\nend\r\n\r\nrouter#",
            );
        let (mut session, _handle) = open(script).await;

        let outcome = compare_running_vs_startup(&mut session).await.unwrap();
        let diff = outcome.diff().unwrap();

        let added: Vec<&str> = diff
            .entries()
            .filter(|e| e.kind == DiffKind::Added)
            .map(|e| e.text.as_str())
            .collect();
        assert_eq!(added, vec!["logging host 192.0.2.50"]);
        assert_eq!(diff.stats().removed, 0);
    }

    #[tokio::test]
    async fn test_hash_at_read_boundary_does_not_end_output() {
        let script = privileged_device()
            .reply_chunks(
                "show running-config",
                [
                    "show running-config\r\nhostname r1\r\nsnmp-server community pub#",
                    "lic RO\r\nbanner#\r\nlogging host 192.0.2.50\r\nend\r\n\r\nrouter#",
                ],
            )
            .reply(
                "show startup-config",
                "show startup-config\r\nhostname r1\r\nend\r\n\r\nrouter#",
            );
        let (mut session, _handle) = open(script).await;

        let running = fetch_running_config(&mut session).await.unwrap();
        assert!(running.contains_line("snmp-server community pub#lic RO"));
        assert!(running.contains_line("banner#"));
        assert!(running.contains_line("logging host 192.0.2.50"));

        let startup = fetch_startup_config(&mut session).await.unwrap();
        assert_eq!(startup.lines(), ["hostname r1", "end"]);
    }

    #[tokio::test]
    async fn test_compare_running_vs_missing_file_sends_nothing() {
        let (mut session, handle) = open(privileged_device()).await;

        let err = compare_running_vs_file(&mut session, Path::new("/nonexistent/r1.cfg"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Input { .. }));
        assert_eq!(handle.sent(), vec!["terminal length 0"]);
        assert_eq!(session.state(), SessionState::Privileged);
    }

    #[tokio::test]
    async fn test_evaluate_running_policy() {
        let script = privileged_device().reply("show running-config", RUNNING);
        let (mut session, _handle) = open(script).await;

        let policy = Policy::from_lines(["no cdp run", "service password-encryption"]);
        let report = evaluate_running_policy(&mut session, &policy).await.unwrap();

        assert_eq!(report.missing.len(), 1);
        assert_eq!(report.missing[0].to_string(), "service password-encryption");
    }

    #[tokio::test]
    async fn test_fetch_running_config_keeps_lines() {
        let script = privileged_device().reply("show running-config", RUNNING);
        let (mut session, _handle) = open(script).await;

        let running = fetch_running_config(&mut session).await.unwrap();

        assert_eq!(running.source(), &ConfigSource::Running);
        assert_eq!(running.lines()[0], "Building configuration...");
        assert!(running.contains_line("logging host 192.0.2.50"));
    }

    #[tokio::test]
    async fn test_apply_syslog_remediation() {
        let script = privileged_device()
            .reply("configure terminal", "configure terminal\r\nrouter(config)#")
            .reply("logging host 192.0.2.50", "logging host 192.0.2.50\r\nrouter(config)#")
            .reply("end", "end\r\nrouter#");
        let (mut session, handle) = open(script).await;

        let remediation = Remediation::SyslogHost {
            host: IpAddr::from([192, 0, 2, 50]),
        };
        let outcome = apply_remediation(&mut session, &remediation).await.unwrap();

        assert!(matches!(outcome, RemediationOutcome::Applied(ref r) if r.len() == 1));
        assert_eq!(handle.count("end"), 1);
    }

    #[tokio::test]
    async fn test_empty_acl_is_noop() {
        let (mut session, handle) = open(privileged_device()).await;

        let remediation = Remediation::AccessList {
            number: 101,
            rules: vec![],
            interface: "GigabitEthernet1".to_string(),
        };
        let outcome = apply_remediation(&mut session, &remediation).await.unwrap();

        assert!(matches!(outcome, RemediationOutcome::NoOp));
        assert_eq!(handle.count("configure terminal"), 0);
    }
}
