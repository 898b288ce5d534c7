//! Arista EOS platform definition.
//!
//! EOS follows the IOS mode model closely; it greets Telnet logins with
//! `login:` and names configuration sessions `(config-s-NAME)`.
//!
//! ```text
//! switch>                            # exec mode
//! switch#                            # privileged exec
//! switch(config)#                    # configuration mode
//! switch(config-if-Et1)#             # config sub-mode (interface)
//! ```

use crate::platform::PlatformDefinition;

/// Create the Arista EOS platform definition.
pub fn platform() -> Result<PlatformDefinition, regex::Error> {
    Ok(PlatformDefinition::new("arista_eos")?
        .with_username_prompt(r"(?i)login:\s*$")?
        .with_failure_pattern("% Ambiguous command")
        .with_failure_pattern("% Error")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Invalid input")
        .with_failure_pattern("% Cannot commit")
        .with_failure_pattern("% Unavailable command"))
}
