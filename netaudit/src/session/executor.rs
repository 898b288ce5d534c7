//! Exec and configuration command execution.

use std::fmt;
use std::time::Instant;

use log::{debug, info, warn};
use serde::Serialize;

use super::{ConfigMode, NegotiationStep, Response, Session, SessionState};
use crate::channel::Pattern;
use crate::error::{Error, Result};
use crate::transport::Transport;

/// Ordered configuration commands sent as one unit.
#[derive(Debug, Clone, Default)]
pub struct CommandBatch {
    commands: Vec<String>,
    prompt: Option<Pattern>,
}

impl CommandBatch {
    /// Create a batch from commands in execution order.
    pub fn new<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            commands: commands.into_iter().map(Into::into).collect(),
            prompt: None,
        }
    }

    /// Wait for `prompt` after each command instead of the platform's
    /// configuration prompt.
    pub fn with_prompt(mut self, prompt: Pattern) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Commands in execution order.
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Prompt override, if any.
    pub fn prompt(&self) -> Option<&Pattern> {
        self.prompt.as_ref()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// The command that stopped a batch.
#[derive(Debug, Clone, Serialize)]
pub struct FailedCommand {
    pub command: String,

    /// Failure marker or channel error.
    pub reason: String,

    /// Device output, when the device answered.
    pub output: Option<String>,
}

/// How far a failed batch got.
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    /// Commands that were accepted before the failure, in order.
    pub applied: Vec<Response>,

    /// The command that failed.
    pub failed: FailedCommand,

    /// Commands after the failed one, never sent.
    pub not_attempted: Vec<String>,
}

impl fmt::Display for BatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' failed ({}); {} applied, {} not attempted",
            self.failed.command,
            self.failed.reason,
            self.applied.len(),
            self.not_attempted.len()
        )
    }
}

impl<T: Transport> Session<T> {
    /// Run an exec command at the privileged prompt.
    ///
    /// Output carrying a platform failure marker comes back as a failed
    /// [`Response`], not as an error.
    pub async fn run_exec(&mut self, command: &str) -> Result<Response> {
        self.require(SessionState::Privileged)?;
        let prompt = self.privileged_prompt();
        self.execute(command, &prompt).await
    }

    /// Run an exec command whose output is required; a failure marker is an error.
    pub async fn run_show(&mut self, command: &str) -> Result<String> {
        let response = self.run_exec(command).await?;
        match response.failure_message {
            None => Ok(response.result),
            Some(message) => Err(Error::CommandRejected {
                command: command.to_string(),
                message,
            }),
        }
    }

    /// Apply a configuration batch.
    ///
    /// Commands run in order inside one configuration-mode scope, each
    /// waiting for the prompt before the next is sent. The first failure
    /// stops the batch. Configuration mode is exited exactly once whatever
    /// happens. Applied commands are not rolled back.
    pub async fn run_config_set(&mut self, batch: &CommandBatch) -> Result<Vec<Response>> {
        self.require(SessionState::Privileged)?;
        if batch.is_empty() {
            debug!("{}: empty batch, nothing to apply", self.name());
            return Ok(Vec::new());
        }

        let prompt = batch
            .prompt()
            .cloned()
            .unwrap_or_else(|| self.platform.config_prompt.clone());

        let mut config = ConfigMode::enter(self).await?;
        let mut applied = Vec::with_capacity(batch.len());
        let mut stopped = None;

        for (index, command) in batch.commands().iter().enumerate() {
            match config.send_expecting(command, &prompt).await {
                Ok(response) if response.is_success() => applied.push(response),
                Ok(response) => {
                    let failed = FailedCommand {
                        command: command.clone(),
                        reason: response.failure_message.unwrap_or_default(),
                        output: Some(response.result),
                    };
                    stopped = Some((index, failed));
                    break;
                }
                Err(e) => {
                    let failed = FailedCommand {
                        command: command.clone(),
                        reason: e.to_string(),
                        output: None,
                    };
                    stopped = Some((index, failed));
                    break;
                }
            }
        }

        let exit = config.exit().await;

        let Some((index, failed)) = stopped else {
            exit?;
            info!("{}: applied {} configuration commands", self.name(), applied.len());
            return Ok(applied);
        };

        if let Err(e) = exit {
            warn!(
                "{}: could not leave configuration mode after '{}' failed: {}",
                self.name(),
                failed.command,
                e
            );
            if self.is_connected() {
                self.teardown().await;
            }
        }

        let failure = Box::new(BatchFailure {
            applied,
            failed,
            not_attempted: batch.commands()[index + 1..].to_vec(),
        });
        warn!("{}: batch stopped: {}", self.name(), failure);

        if failure.applied.is_empty() {
            Err(Error::BatchRejected(failure))
        } else {
            Err(Error::PartialApply(failure))
        }
    }

    /// Send one command and collect its output up to `prompt`.
    pub(crate) async fn execute(&mut self, command: &str, prompt: &Pattern) -> Result<Response> {
        let start = Instant::now();
        self.send_step(NegotiationStep::Command, command).await?;
        let m = self
            .expect_step(NegotiationStep::Command, std::slice::from_ref(prompt))
            .await?;

        let response = Response::from_output(command, m.before, m.matched, start.elapsed());
        let failure = self
            .platform
            .detect_failure(&response.result)
            .map(str::to_string);
        if let Some(marker) = &failure {
            debug!("{}: '{}' rejected: {}", self.name(), command, marker);
        }

        Ok(response.with_failure(failure))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::test_support::{open, privileged_device};
    use crate::testing::ScriptBuilder;

    const INVALID: &str = "\r\n                 ^\r\n% Invalid input detected at '^' marker.\r\n\r\n";

    fn config_device() -> ScriptBuilder {
        privileged_device().reply(
            "configure terminal",
            "configure terminal\r\nEnter configuration commands, one per line.  End with CNTL/Z.\r\nrouter(config)#",
        )
    }

    #[tokio::test]
    async fn test_run_exec_normalizes_output() {
        let script = privileged_device().reply(
            "show clock",
            "show clock\r\n*10:15:02.113 UTC Fri Oct 16 2026\r\nrouter#",
        );
        let (mut session, _handle) = open(script).await;

        let response = session.run_exec("show clock").await.unwrap();

        assert!(response.is_success());
        assert_eq!(response.result, "*10:15:02.113 UTC Fri Oct 16 2026");
        assert_eq!(response.prompt, "router#");
    }

    #[tokio::test]
    async fn test_run_exec_failure_marker_is_failed_response() {
        let script = privileged_device()
            .reply("shw clock", &format!("shw clock{INVALID}router#"));
        let (mut session, _handle) = open(script).await;

        let response = session.run_exec("shw clock").await.unwrap();
        assert_eq!(response.failure_message.as_deref(), Some("% Invalid input"));
    }

    #[tokio::test]
    async fn test_run_show_rejects_failure_marker() {
        let script = privileged_device()
            .reply("shw clock", &format!("shw clock{INVALID}router#"));
        let (mut session, _handle) = open(script).await;

        let err = session.run_show("shw clock").await.unwrap_err();
        assert!(matches!(err, Error::CommandRejected { .. }));
        assert_eq!(session.state(), SessionState::Privileged);
    }

    #[tokio::test]
    async fn test_config_set_applies_in_order() {
        let script = config_device()
            .reply("interface Loopback0", "interface Loopback0\r\nrouter(config-if)#")
            .reply(
                "ip address 10.1.1.1 255.255.255.255",
                "ip address 10.1.1.1 255.255.255.255\r\nrouter(config-if)#",
            )
            .reply("end", "end\r\nrouter#");
        let (mut session, handle) = open(script).await;

        let batch = CommandBatch::new(["interface Loopback0", "ip address 10.1.1.1 255.255.255.255"]);
        let responses = session.run_config_set(&batch).await.unwrap();

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].command, "interface Loopback0");
        assert_eq!(
            handle.sent()[1..],
            [
                "configure terminal",
                "interface Loopback0",
                "ip address 10.1.1.1 255.255.255.255",
                "end"
            ]
        );
        assert_eq!(session.state(), SessionState::Privileged);
    }

    #[tokio::test]
    async fn test_second_command_failure_reports_partial_apply() {
        let script = config_device()
            .reply("interface Gi0/1", "interface Gi0/1\r\nrouter(config-if)#")
            .reply("ip addres 10.0.0.1", &format!("ip addres 10.0.0.1{INVALID}router(config-if)#"))
            .reply("end", "end\r\nrouter#");
        let (mut session, handle) = open(script).await;

        let batch = CommandBatch::new(["interface Gi0/1", "ip addres 10.0.0.1", "no shutdown"]);
        let err = session.run_config_set(&batch).await.unwrap_err();

        assert!(err.is_partial_apply());
        let failure = err.batch_failure().unwrap();
        assert_eq!(failure.applied.len(), 1);
        assert_eq!(failure.applied[0].command, "interface Gi0/1");
        assert_eq!(failure.failed.command, "ip addres 10.0.0.1");
        assert_eq!(failure.failed.reason, "% Invalid input");
        assert_eq!(failure.not_attempted, vec!["no shutdown"]);

        assert_eq!(handle.count("end"), 1);
        assert_eq!(handle.count("no shutdown"), 0);
        assert_eq!(session.state(), SessionState::Privileged);
    }

    #[tokio::test]
    async fn test_first_command_failure_is_rejection() {
        let script = config_device()
            .reply("hostnme r1", &format!("hostnme r1{INVALID}router(config)#"))
            .reply("end", "end\r\nrouter#");
        let (mut session, handle) = open(script).await;

        let batch = CommandBatch::new(["hostnme r1", "logging host 192.0.2.50"]);
        let err = session.run_config_set(&batch).await.unwrap_err();

        assert!(matches!(err, Error::BatchRejected(_)));
        assert_eq!(err.batch_failure().unwrap().not_attempted.len(), 1);
        assert_eq!(handle.count("end"), 1);
    }

    #[tokio::test]
    async fn test_timeout_mid_batch_disconnects() {
        let script = config_device()
            .reply("logging host 192.0.2.50", "logging host 192.0.2.50\r\nrouter(config)#")
            .reply("crypto map VPN 10 ipsec-isakmp", "");
        let (mut session, handle) = open(script).await;

        let batch = CommandBatch::new([
            "logging host 192.0.2.50",
            "crypto map VPN 10 ipsec-isakmp",
            "set peer 192.0.2.2",
        ]);
        let err = session.run_config_set(&batch).await.unwrap_err();

        assert!(err.is_partial_apply());
        assert_eq!(err.batch_failure().unwrap().not_attempted, vec!["set peer 192.0.2.2"]);
        assert_eq!(session.state(), SessionState::Disconnected);
        assert!(handle.closed());
        assert!(matches!(session.run_exec("show clock").await, Err(Error::Disconnected)));
    }

    #[tokio::test]
    async fn test_custom_batch_prompt() {
        let script = config_device()
            .reply(
                "banner motd #",
                "banner motd #\r\nEnter TEXT message.  End with the character '#'.\r\n",
            )
            .reply("Authorized access only#", "Authorized access only#\r\nrouter(config)#")
            .reply("end", "end\r\nrouter#");
        let (mut session, handle) = open(script).await;

        let prompt = Pattern::regex(r"(End with the character '#'\.|\(config\)#)\s*$").unwrap();
        let banner = CommandBatch::new(["banner motd #", "Authorized access only#"]).with_prompt(prompt);
        let responses = session.run_config_set(&banner).await.unwrap();

        assert_eq!(responses.len(), 2);
        assert!(responses[0].contains("Enter TEXT message"));
        assert_eq!(handle.count("end"), 1);
    }

    #[tokio::test]
    async fn test_empty_batch_sends_nothing() {
        let (mut session, handle) = open(privileged_device()).await;

        let responses = session.run_config_set(&CommandBatch::default()).await.unwrap();

        assert!(responses.is_empty());
        assert_eq!(handle.sent(), vec!["terminal length 0"]);
    }
}
