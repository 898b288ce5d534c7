//! Configuration mode scope.
//!
//! [`ConfigMode`] is an RAII guard over a privileged session. It holds
//! `&mut Session`, so nothing else can use the session while configuration
//! mode is open, and [`exit`](ConfigMode::exit) consumes it.
//!
//! ```rust,no_run
//! # async fn example(session: &mut netaudit::Session) -> netaudit::Result<()> {
//! let mut config = session.config_mode().await?;
//! let response = config.send("logging host 192.0.2.50").await;
//! config.exit().await?; // always attempted, whatever `send` returned
//! response?;
//! # Ok(())
//! # }
//! ```

use log::{debug, warn};

use super::{NegotiationStep, Response, Session, SessionState};
use crate::channel::Pattern;
use crate::error::{Error, Result};
use crate::transport::Transport;

/// A session inside configuration mode.
pub struct ConfigMode<'a, T: Transport> {
    session: &'a mut Session<T>,
    consumed: bool,
}

impl<'a, T: Transport> ConfigMode<'a, T> {
    /// Enter configuration mode from the privileged prompt.
    pub(crate) async fn enter(session: &'a mut Session<T>) -> Result<Self> {
        session.require(SessionState::Privileged)?;

        let command = session.platform.enter_config_command.clone();
        session
            .send_step(NegotiationStep::EnterConfig, &command)
            .await?;
        let prompt = session.platform.config_prompt.clone();
        session
            .expect_step(NegotiationStep::EnterConfig, &[prompt])
            .await?;

        session.state = SessionState::ConfigMode;
        debug!("{}: entered configuration mode", session.name());

        Ok(Self {
            session,
            consumed: false,
        })
    }

    /// Send a configuration command and wait for the configuration prompt.
    pub async fn send(&mut self, command: &str) -> Result<Response> {
        let prompt = self.session.platform.config_prompt.clone();
        self.send_expecting(command, &prompt).await
    }

    /// Send a configuration command and wait for `prompt`.
    pub async fn send_expecting(&mut self, command: &str, prompt: &Pattern) -> Result<Response> {
        self.session.require(SessionState::ConfigMode)?;
        self.session.execute(command, prompt).await
    }

    /// Leave configuration mode and return to the privileged prompt.
    ///
    /// A session torn down while in configuration mode cannot be exited;
    /// that case reports [`Error::Disconnected`] without touching the
    /// transport.
    pub async fn exit(mut self) -> Result<()> {
        self.consumed = true;

        if !self.session.is_connected() {
            return Err(Error::Disconnected);
        }

        let command = self.session.platform.exit_config_command.clone();
        self.session
            .send_step(NegotiationStep::ExitConfig, &command)
            .await?;
        // The hostname may have changed in configuration mode
        let prompt = self.session.platform.privileged_prompt.clone();
        let m = self
            .session
            .expect_step(NegotiationStep::ExitConfig, &[prompt])
            .await?;
        self.session.learn_prompt(&m.matched);

        self.session.state = SessionState::Privileged;
        debug!("{}: left configuration mode", self.session.name());
        Ok(())
    }
}

impl<T: Transport> Drop for ConfigMode<'_, T> {
    fn drop(&mut self) {
        if !self.consumed {
            warn!(
                "{}: ConfigMode dropped without exit, device left in configuration mode",
                self.session.name()
            );
        }
    }
}

impl<T: Transport> Session<T> {
    /// Enter configuration mode. The returned guard must be [`exit`](ConfigMode::exit)ed.
    pub async fn config_mode(&mut self) -> Result<ConfigMode<'_, T>> {
        ConfigMode::enter(self).await
    }
}
