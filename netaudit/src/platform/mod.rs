//! Platform definitions for device families.
//!
//! A platform bundles everything the negotiator and executor need to know
//! about one family's command line: prompt patterns for each mode, the
//! commands that move between modes, and the markers that flag a rejected
//! command.

mod definition;
pub mod vendors;

pub use definition::PlatformDefinition;

use crate::error::{Error, Result};

/// Name of the platform used when a device does not specify one.
pub const DEFAULT_PLATFORM: &str = "cisco_ios";

/// Names of the built-in platforms.
pub const BUILTIN_PLATFORMS: &[&str] = &["cisco_ios", "arista_eos"];

/// Look up a built-in platform by name.
pub fn builtin(name: &str) -> Result<PlatformDefinition> {
    let platform = match name {
        "cisco_ios" => vendors::cisco_ios::platform()?,
        "arista_eos" => vendors::arista_eos::platform()?,
        _ => {
            return Err(Error::UnknownPlatform {
                name: name.to_string(),
            });
        }
    };
    Ok(platform)
}
