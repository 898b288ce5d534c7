//! Platform definition for vendor-specific prompts and commands.

use crate::channel::Pattern;

/// Platform definition containing all vendor-specific configuration.
#[derive(Debug, Clone)]
pub struct PlatformDefinition {
    /// Platform name (e.g., "cisco_ios", "arista_eos").
    pub name: String,

    /// In-band login: username prompt.
    pub username_prompt: Pattern,

    /// In-band login and `enable`: password prompt.
    pub password_prompt: Pattern,

    /// Output that means a password or secret was rejected.
    pub login_failure: Pattern,

    /// Unprivileged exec prompt (`>`).
    pub unprivileged_prompt: Pattern,

    /// Privileged exec prompt (`#`), must not match the configuration prompt.
    pub privileged_prompt: Pattern,

    /// Configuration mode prompt, including sub-modes.
    pub config_prompt: Pattern,

    /// Command that escalates to privileged mode.
    pub enable_command: String,

    /// Command that turns off output paging.
    pub disable_paging_command: String,

    /// Command that enters configuration mode.
    pub enter_config_command: String,

    /// Command that leaves configuration mode from any sub-mode.
    pub exit_config_command: String,

    /// Exec command printing the running configuration.
    pub running_config_command: String,

    /// Exec command printing the startup configuration.
    pub startup_config_command: String,

    /// Substrings that indicate command failure.
    pub failed_when_contains: Vec<String>,
}

impl PlatformDefinition {
    /// Create a definition with generic `>`/`#` prompts and IOS-style commands.
    pub fn new(name: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            username_prompt: Pattern::regex(r"(?i)(user ?name|login):\s*$")?,
            password_prompt: Pattern::regex(r"(?i)password:\s*$")?,
            login_failure: Pattern::regex(
                r"(?i)(% ?(login invalid|access denied|bad secrets?)|authentication failed|login incorrect)",
            )?,
            unprivileged_prompt: Pattern::regex(r"(?m:^)[\w.\-@/:]{1,63}>\s*$")?,
            privileged_prompt: Pattern::regex(r"(?m:^)[\w.\-@/:]{1,63}#\s*$")?,
            config_prompt: Pattern::regex(r"(?m:^)[\w.\-@/:]{1,63}\(config[\w.\-@/:+]{0,63}\)#\s*$")?,
            enable_command: "enable".to_string(),
            disable_paging_command: "terminal length 0".to_string(),
            enter_config_command: "configure terminal".to_string(),
            exit_config_command: "end".to_string(),
            running_config_command: "show running-config".to_string(),
            startup_config_command: "show startup-config".to_string(),
            failed_when_contains: vec![],
        })
    }

    /// Replace the username prompt pattern.
    pub fn with_username_prompt(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.username_prompt = Pattern::regex(pattern)?;
        Ok(self)
    }

    /// Replace the configuration prompt pattern.
    pub fn with_config_prompt(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.config_prompt = Pattern::regex(pattern)?;
        Ok(self)
    }

    /// Set the paging-disable command.
    pub fn with_disable_paging(mut self, command: impl Into<String>) -> Self {
        self.disable_paging_command = command.into();
        self
    }

    /// Set the configuration-mode exit command.
    pub fn with_exit_config(mut self, command: impl Into<String>) -> Self {
        self.exit_config_command = command.into();
        self
    }

    /// Add a failure pattern.
    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_when_contains.push(pattern.into());
        self
    }

    /// The first failure marker contained in `output`, if any.
    pub fn detect_failure(&self, output: &str) -> Option<&str> {
        self.failed_when_contains
            .iter()
            .find(|marker| output.contains(marker.as_str()))
            .map(String::as_str)
    }
}
