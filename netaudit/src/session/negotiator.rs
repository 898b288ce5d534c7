//! Login, privilege escalation and paging suppression.

use log::{debug, info};
use secrecy::ExposeSecret;

use super::{NegotiationStep, Session, SessionState};
use crate::channel::{Channel, Pattern};
use crate::error::Result;
use crate::platform::PlatformDefinition;
use crate::session::DeviceCredentials;
use crate::transport::Transport;

/// What the device showed after a login step.
enum LoginPrompt {
    Username,
    Password,
    Unprivileged,
    Privileged,
}

impl<T: Transport> Session<T> {
    /// Drive an already-open transport up to the privileged prompt.
    ///
    /// Handles in-band login (Telnet), devices that greet with a prompt
    /// directly (SSH), and devices that start privileged. On any failure the
    /// transport is closed before the error is returned.
    pub async fn establish(
        transport: T,
        credentials: DeviceCredentials,
        platform: PlatformDefinition,
    ) -> Result<Self> {
        let mut session = Self::new(transport, credentials, platform);
        session.negotiate().await?;
        Ok(session)
    }

    /// Wrap an open transport; nothing is read or sent yet.
    pub(crate) fn new(transport: T, credentials: DeviceCredentials, platform: PlatformDefinition) -> Self {
        let prompt = platform.privileged_prompt.clone();
        Self {
            credentials,
            platform,
            channel: Channel::new(transport),
            state: SessionState::Connecting,
            prompt,
        }
    }

    pub(crate) async fn negotiate(&mut self) -> Result<()> {
        self.login().await?;
        if self.state == SessionState::Unprivileged {
            self.enable().await?;
        }
        self.disable_paging().await?;

        info!("{}: session established at {}", self.name(), self.prompt);
        Ok(())
    }

    async fn login(&mut self) -> Result<()> {
        let mut prompt = self.await_login_prompt(NegotiationStep::Greeting).await?;
        if matches!(prompt, LoginPrompt::Username | LoginPrompt::Password) {
            self.state = SessionState::AwaitingCredentials;
        }

        if let LoginPrompt::Username = prompt {
            debug!("{}: answering username prompt", self.name());
            let username = self.credentials.username().to_string();
            self.send_step(NegotiationStep::Username, &username).await?;
            prompt = self.await_login_prompt(NegotiationStep::Username).await?;
            if !matches!(prompt, LoginPrompt::Password) {
                return Err(self.reject(NegotiationStep::Username).await);
            }
        }

        if let LoginPrompt::Password = prompt {
            debug!("{}: answering password prompt", self.name());
            let password = self.credentials.password().expose_secret().to_owned();
            self.send_hidden_step(NegotiationStep::Password, &password).await?;
            prompt = self.await_login_prompt(NegotiationStep::Password).await?;
        }

        self.state = match prompt {
            LoginPrompt::Unprivileged => SessionState::Unprivileged,
            LoginPrompt::Privileged => SessionState::Privileged,
            LoginPrompt::Username | LoginPrompt::Password => {
                return Err(self.reject(NegotiationStep::Password).await);
            }
        };
        debug!("{}: logged in, {}", self.name(), self.state);
        Ok(())
    }

    /// Wait for the next login-relevant prompt. A failure marker is a rejection.
    async fn await_login_prompt(&mut self, step: NegotiationStep) -> Result<LoginPrompt> {
        let patterns = [
            self.platform.username_prompt.clone(),
            self.platform.password_prompt.clone(),
            self.platform.unprivileged_prompt.clone(),
            self.platform.privileged_prompt.clone(),
            self.platform.login_failure.clone(),
        ];

        let m = self.expect_step(step, &patterns).await?;
        match m.index {
            0 => Ok(LoginPrompt::Username),
            1 => Ok(LoginPrompt::Password),
            2 => Ok(LoginPrompt::Unprivileged),
            3 => Ok(LoginPrompt::Privileged),
            _ => Err(self.reject(step).await),
        }
    }

    /// Escalate from the unprivileged prompt. Exactly one `enable` is sent.
    async fn enable(&mut self) -> Result<()> {
        let command = self.platform.enable_command.clone();
        self.send_step(NegotiationStep::Enable, &command).await?;

        let patterns = [
            self.platform.password_prompt.clone(),
            self.platform.privileged_prompt.clone(),
            self.platform.unprivileged_prompt.clone(),
            self.platform.login_failure.clone(),
        ];
        let m = self.expect_step(NegotiationStep::Enable, &patterns).await?;

        match m.index {
            0 => {
                let secret = self.credentials.secret().expose_secret().to_owned();
                self.send_hidden_step(NegotiationStep::EnableSecret, &secret)
                    .await?;
                let after = [
                    self.platform.privileged_prompt.clone(),
                    self.platform.login_failure.clone(),
                    self.platform.password_prompt.clone(),
                    self.platform.unprivileged_prompt.clone(),
                ];
                let m = self
                    .expect_step(NegotiationStep::EnableSecret, &after)
                    .await?;
                if m.index != 0 {
                    return Err(self.reject(NegotiationStep::EnableSecret).await);
                }
            }
            1 => debug!("{}: enable accepted without a secret", self.name()),
            _ => return Err(self.reject(NegotiationStep::Enable).await),
        }

        self.state = SessionState::Privileged;
        Ok(())
    }

    async fn disable_paging(&mut self) -> Result<()> {
        let command = self.platform.disable_paging_command.clone();
        self.send_step(NegotiationStep::DisablePaging, &command)
            .await?;
        let m = self
            .expect_step(
                NegotiationStep::DisablePaging,
                &[self.platform.privileged_prompt.clone()],
            )
            .await?;
        self.learn_prompt(&m.matched);
        Ok(())
    }

    /// Pin the privileged prompt to the exact text the device just showed.
    ///
    /// Exec output is then only ever terminated by this device's own
    /// prompt at the start of a line.
    pub(crate) fn learn_prompt(&mut self, matched: &str) {
        let Some(base) = matched.trim().strip_suffix('#') else {
            return;
        };
        match Pattern::regex(&format!(r"(?m:^){}#\s*$", regex::escape(base))) {
            Ok(prompt) => {
                debug!("{}: privileged prompt is {:?}", self.name(), prompt.as_str());
                self.prompt = prompt;
            }
            Err(e) => debug!("{}: keeping platform prompt: {}", self.name(), e),
        }
    }

    /// Pattern a privileged-mode command ends with.
    pub(crate) fn privileged_prompt(&self) -> Pattern {
        self.prompt.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::Error;
    use crate::session::test_support::{credentials, open, privileged_device};
    use crate::testing::{ScriptBuilder, ScriptHandle, ScriptedTransport};

    async fn try_open(script: ScriptBuilder) -> (Result<Session<ScriptedTransport>>, ScriptHandle) {
        let (transport, handle) = script.build();
        let platform = crate::platform::builtin("cisco_ios").unwrap();
        let credentials = credentials(Duration::from_millis(100));
        (Session::establish(transport, credentials, platform).await, handle)
    }

    #[tokio::test]
    async fn test_privileged_greeting_skips_enable() {
        let (session, handle) = open(privileged_device()).await;

        assert_eq!(session.state(), SessionState::Privileged);
        assert_eq!(handle.sent(), vec!["terminal length 0"]);
        assert_eq!(handle.count("enable"), 0);
    }

    #[tokio::test]
    async fn test_unprivileged_greeting_enables_once() {
        let script = ScriptedTransport::new("\r\nrouter>")
            .reply("enable", "enable\r\nPassword: ")
            .reply("s3cret", "\r\nrouter#")
            .reply("terminal length 0", "terminal length 0\r\nrouter#");
        let (session, handle) = open(script).await;

        assert_eq!(session.state(), SessionState::Privileged);
        assert_eq!(handle.sent(), vec!["enable", "s3cret", "terminal length 0"]);
        assert_eq!(handle.count("enable"), 1);
    }

    #[tokio::test]
    async fn test_enable_without_secret_prompt() {
        let script = ScriptedTransport::new("switch>")
            .reply("enable", "enable\r\nswitch#")
            .reply("terminal length 0", "terminal length 0\r\nswitch#");
        let (session, handle) = open(script).await;

        assert_eq!(session.state(), SessionState::Privileged);
        assert_eq!(handle.sent(), vec!["enable", "terminal length 0"]);
    }

    #[tokio::test]
    async fn test_in_band_login() {
        let script = ScriptedTransport::new("\r\nUser Access Verification\r\n\r\nUsername: ")
            .reply("admin", "admin\r\nPassword: ")
            .reply("pw", "\r\nrouter>")
            .reply("enable", "enable\r\nPassword: ")
            .reply("s3cret", "\r\nrouter#")
            .reply("terminal length 0", "terminal length 0\r\nrouter#");
        let (session, handle) = open(script).await;

        assert_eq!(session.state(), SessionState::Privileged);
        assert_eq!(
            handle.sent(),
            vec!["admin", "pw", "enable", "s3cret", "terminal length 0"]
        );
    }

    #[tokio::test]
    async fn test_new_session_starts_connecting() {
        let script = ScriptedTransport::new("\r\nUsername: ")
            .reply("admin", "admin\r\nPassword: ")
            .reply("pw", "\r\nrouter#")
            .reply("terminal length 0", "terminal length 0\r\nrouter#");
        let (transport, _handle) = script.build();
        let platform = crate::platform::builtin("cisco_ios").unwrap();
        let mut session = Session::new(transport, credentials(Duration::from_millis(200)), platform);

        assert_eq!(session.state(), SessionState::Connecting);
        session.negotiate().await.unwrap();
        assert_eq!(session.state(), SessionState::Privileged);
    }

    #[tokio::test]
    async fn test_prompt_learned_from_device() {
        let (session, _handle) = open(privileged_device()).await;

        let prompt = session.privileged_prompt();
        assert!(prompt.matches_str("show clock\n10:00\nrouter#"));
        assert!(!prompt.matches_str("show clock\n10:00\nswitch#"));
        assert!(!prompt.matches_str("description uplink to router#"));
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let script = ScriptedTransport::new("Username: ")
            .reply("admin", "admin\r\nPassword: ")
            .reply("pw", "\r\n% Login invalid\r\n\r\nUsername: ");
        let (result, handle) = try_open(script).await;

        let err = result.err().unwrap();
        assert!(matches!(err, Error::Auth { step: NegotiationStep::Password }), "{err}");
        assert!(handle.closed());
    }

    #[tokio::test]
    async fn test_repeated_password_prompt_is_rejection() {
        let script = ScriptedTransport::new("Password: ").reply("pw", "\r\nPassword: ");
        let (result, handle) = try_open(script).await;

        assert!(matches!(result, Err(Error::Auth { step: NegotiationStep::Password })));
        assert!(handle.closed());
    }

    #[tokio::test]
    async fn test_enable_secret_rejected() {
        let script = ScriptedTransport::new("router>")
            .reply("enable", "enable\r\nPassword: ")
            .reply("s3cret", "\r\n% Access denied\r\n\r\nrouter>");
        let (result, handle) = try_open(script).await;

        assert!(matches!(result, Err(Error::Auth { step: NegotiationStep::EnableSecret })));
        assert_eq!(handle.count("enable"), 1);
        assert!(handle.closed());
    }

    #[tokio::test]
    async fn test_silent_device_times_out_and_closes() {
        let (result, handle) = try_open(ScriptedTransport::new("")).await;

        match result {
            Err(Error::Timeout { step, timeout }) => {
                assert_eq!(step, NegotiationStep::Greeting);
                assert_eq!(timeout, Duration::from_millis(100));
            }
            other => panic!("expected timeout, got {:?}", other.err()),
        }
        assert!(handle.closed());
    }

    #[tokio::test]
    async fn test_closed_during_paging() {
        let script = ScriptedTransport::new("router#")
            .reply("terminal length 0", "")
            .then_close();
        let (result, handle) = try_open(script).await;

        assert!(matches!(
            result,
            Err(Error::ChannelClosed { step: NegotiationStep::DisablePaging })
        ));
        assert!(handle.closed());
    }
}
