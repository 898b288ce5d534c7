//! Cisco IOS / IOS-XE platform definition.
//!
//! # Prompt Examples
//!
//! ```text
//! Username:                          # in-band login (Telnet)
//! router>                            # unprivileged exec
//! router#                            # privileged exec
//! router(config)#                    # configuration mode
//! router(config-if)#                 # config sub-mode (interface)
//! ```
//!
//! # Mode Graph
//!
//! ```text
//! ┌────────┐  enable    ┌────────┐  configure terminal  ┌──────────────┐
//! │ router>├────────────► router#├──────────────────────► (config*)#   │
//! └────────┘            └────────┘◄─────────────────────┴──────────────┘
//!                                          end
//! ```

use crate::platform::PlatformDefinition;

/// Create the Cisco IOS platform definition.
pub fn platform() -> Result<PlatformDefinition, regex::Error> {
    Ok(PlatformDefinition::new("cisco_ios")?
        .with_failure_pattern("% Invalid input")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Ambiguous command")
        .with_failure_pattern("% Unknown command")
        .with_failure_pattern("% Unrecognized command")
        .with_failure_pattern("% Bad mask")
        .with_failure_pattern("% Error"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::PromptMatcher;

    #[test]
    fn test_unprivileged_prompt_match() {
        let platform = platform().unwrap();
        let prompt = &platform.unprivileged_prompt;

        assert!(prompt.is_match(b"router>"));
        assert!(prompt.is_match(b"\nR1-core.lab> "));
        assert!(!prompt.is_match(b"router#"));
        assert!(!prompt.is_match(b"router> more output"));
    }

    #[test]
    fn test_privileged_prompt_excludes_config() {
        let platform = platform().unwrap();
        let prompt = &platform.privileged_prompt;

        assert!(prompt.is_match(b"router#"));
        assert!(prompt.is_match(b"show clock\n12:00\nrouter# "));
        assert!(!prompt.is_match(b"router(config)#"));
        assert!(!prompt.is_match(b"router(config-if)#"));
    }

    #[test]
    fn test_config_prompt_match() {
        let platform = platform().unwrap();
        let prompt = &platform.config_prompt;

        assert!(prompt.is_match(b"router(config)#"));
        assert!(prompt.is_match(b"router(config-if)#"));
        assert!(prompt.is_match(b"router(config-router)# "));
        assert!(!prompt.is_match(b"router#"));
    }

    #[test]
    fn test_login_prompts() {
        let platform = platform().unwrap();

        assert!(platform.username_prompt.is_match(b"\nUser Access Verification\n\nUsername: "));
        assert!(platform.password_prompt.is_match(b"Password: "));
        assert!(platform.login_failure.is_match(b"% Login invalid\n"));
        assert!(platform.login_failure.is_match(b"% Bad secrets\n"));
        assert!(platform.login_failure.is_match(b"% Access denied\n"));
    }
}
