//! Authenticated, privilege-escalated sessions to one device.
//!
//! A [`Session`] is the product of the negotiation automaton: the transport
//! is open, login has succeeded, the channel sits at the privileged prompt and
//! paging is disabled. Everything above this layer (diffs, compliance,
//! remediation) is written in terms of [`Session::run_exec`] and
//! [`Session::run_config_set`].
//!
//! ```text
//! Disconnected → Connecting → AwaitingCredentials → Unprivileged ─┐
//!                                     │                            │ enable
//!                                     └──────────► Privileged ◄───┘
//!                                                  │    ▲
//!                               configure terminal │    │ end
//!                                                  ▼    │
//!                                                ConfigMode
//! ```
//!
//! Any failed expect is fatal: the transport is closed, the state becomes
//! `Disconnected` and every later operation fails with
//! [`Error::Disconnected`](crate::Error::Disconnected).

mod config_mode;
mod credentials;
mod executor;
mod negotiator;
mod response;

use std::fmt;

use log::{debug, warn};

pub use config_mode::ConfigMode;
pub use credentials::{DEFAULT_TIMEOUT, DeviceCredentials, DeviceCredentialsBuilder};
pub use executor::{BatchFailure, CommandBatch, FailedCommand};
pub use response::Response;

use crate::channel::{Channel, Match, Pattern};
use crate::error::{ChannelError, Error, Result};
use crate::platform::PlatformDefinition;
use crate::transport::{DeviceTransport, Transport};

/// Where a session is in the negotiation automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    /// Transport open, no prompt seen yet.
    Connecting,
    AwaitingCredentials,
    Unprivileged,
    Privileged,
    ConfigMode,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connecting => "connecting",
            SessionState::AwaitingCredentials => "awaiting credentials",
            SessionState::Unprivileged => "unprivileged",
            SessionState::Privileged => "privileged",
            SessionState::ConfigMode => "config mode",
        };
        f.write_str(name)
    }
}

/// The exchange that was running when a negotiation or command failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NegotiationStep {
    /// Waiting for the first prompt after the transport opened.
    Greeting,
    /// Answering the username prompt.
    Username,
    /// Answering the password prompt.
    Password,
    /// Sending `enable`.
    Enable,
    /// Answering the `enable` password prompt.
    EnableSecret,
    /// Turning off output paging.
    DisablePaging,
    /// Entering configuration mode.
    EnterConfig,
    /// Leaving configuration mode.
    ExitConfig,
    /// Running an exec or configuration command.
    Command,
}

impl fmt::Display for NegotiationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NegotiationStep::Greeting => "greeting",
            NegotiationStep::Username => "username",
            NegotiationStep::Password => "password",
            NegotiationStep::Enable => "enable",
            NegotiationStep::EnableSecret => "enable secret",
            NegotiationStep::DisablePaging => "disable paging",
            NegotiationStep::EnterConfig => "enter config",
            NegotiationStep::ExitConfig => "exit config",
            NegotiationStep::Command => "command",
        };
        f.write_str(name)
    }
}

/// An established session to one device.
///
/// Owns its transport exclusively. All operations take `&mut self`, so at
/// most one command is ever in flight.
pub struct Session<T = DeviceTransport> {
    credentials: DeviceCredentials,
    platform: PlatformDefinition,
    channel: Channel<T>,
    state: SessionState,
    /// The device's own privileged prompt, learned at login.
    prompt: Pattern,
}

impl Session<DeviceTransport> {
    /// Open the device's transport and negotiate up to the privileged prompt.
    pub async fn connect(credentials: DeviceCredentials) -> Result<Self> {
        let platform = crate::platform::builtin(credentials.platform())?;

        debug!(
            "{}: connecting to {}:{} over {}",
            credentials.name(),
            credentials.host(),
            credentials.port(),
            credentials.transport()
        );

        let transport = DeviceTransport::open(&credentials)
            .await
            .map_err(|source| match source {
                crate::error::TransportError::AuthenticationFailed { .. } => Error::Auth {
                    step: NegotiationStep::Password,
                },
                source => Error::Connect {
                    host: credentials.host().to_string(),
                    source,
                },
            })?;

        Self::establish(transport, credentials, platform).await
    }
}

impl<T: Transport> Session<T> {
    /// Current automaton state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the session can still run commands.
    pub fn is_connected(&self) -> bool {
        self.state != SessionState::Disconnected
    }

    /// Device name from the credentials.
    pub fn name(&self) -> &str {
        self.credentials.name()
    }

    /// Credentials this session was opened with.
    pub fn credentials(&self) -> &DeviceCredentials {
        &self.credentials
    }

    /// Platform definition in use.
    pub fn platform(&self) -> &PlatformDefinition {
        &self.platform
    }

    /// Close the transport. Idempotent.
    pub async fn disconnect(&mut self) {
        if self.state == SessionState::Disconnected {
            return;
        }
        debug!("{}: disconnecting", self.name());
        self.teardown().await;
    }

    /// Fail unless the session is in `expected`.
    pub(crate) fn require(&self, expected: SessionState) -> Result<()> {
        match self.state {
            actual if actual == expected => Ok(()),
            SessionState::Disconnected => Err(Error::Disconnected),
            actual => Err(Error::InvalidState { expected, actual }),
        }
    }

    /// Send a line; a write failure tears the session down.
    pub(crate) async fn send_step(&mut self, step: NegotiationStep, text: &str) -> Result<()> {
        if let Err(e) = self.channel.send(text).await {
            return Err(self.fail(step, e).await);
        }
        Ok(())
    }

    /// Like [`send_step`](Self::send_step) for passwords and secrets.
    pub(crate) async fn send_hidden_step(
        &mut self,
        step: NegotiationStep,
        text: &str,
    ) -> Result<()> {
        if let Err(e) = self.channel.send_hidden(text).await {
            return Err(self.fail(step, e).await);
        }
        Ok(())
    }

    /// Expect one of `patterns`; a timeout or closed channel tears the session down.
    pub(crate) async fn expect_step(
        &mut self,
        step: NegotiationStep,
        patterns: &[Pattern],
    ) -> Result<Match> {
        let timeout = self.credentials.timeout();
        match self.channel.expect(patterns, timeout).await {
            Ok(m) => Ok(m),
            Err(e) => Err(self.fail(step, e).await),
        }
    }

    /// Tear down after a channel failure and map it onto the session error.
    async fn fail(&mut self, step: NegotiationStep, error: ChannelError) -> Error {
        warn!("{}: {} failed: {}", self.name(), step, error);
        self.teardown().await;
        match error {
            ChannelError::Timeout(timeout) => Error::Timeout { step, timeout },
            ChannelError::Closed | ChannelError::Transport(_) => Error::ChannelClosed { step },
        }
    }

    /// Tear down after a rejected login or secret.
    pub(crate) async fn reject(&mut self, step: NegotiationStep) -> Error {
        warn!("{}: authentication rejected during {}", self.name(), step);
        self.teardown().await;
        Error::Auth { step }
    }

    pub(crate) async fn teardown(&mut self) {
        self.channel.close().await;
        self.state = SessionState::Disconnected;
    }
}

impl<T> Drop for Session<T> {
    fn drop(&mut self) {
        if self.state != SessionState::Disconnected {
            debug!(
                "{}: session dropped without disconnect",
                self.credentials.name()
            );
        }
    }
}
