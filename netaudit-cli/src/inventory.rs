//! Device inventory files.
//!
//! ```yaml
//! devices:
//!   - name: core-1
//!     ip: 192.0.2.10
//!     username: admin
//!     password: cisco
//!     secret: class
//!     connection_type: ssh
//!   - name: access-1
//!     host: 192.0.2.20
//!     username: admin
//!     password: arista
//!     connection_type: telnet
//!     platform: arista_eos
//!     timeout: 10
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use netaudit::{DeviceCredentials, HostKeyVerification, TransportKind};
use serde::Deserialize;

use crate::cli::is_json;

#[derive(Deserialize)]
struct InventoryFile {
    #[serde(default)]
    devices: Vec<DeviceEntry>,
}

#[derive(Deserialize)]
struct DeviceEntry {
    name: String,
    #[serde(alias = "host")]
    ip: String,
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    secret: Option<String>,
    #[serde(default)]
    connection_type: TransportKind,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    platform: Option<String>,
    /// Seconds.
    #[serde(default)]
    timeout: Option<u64>,
    #[serde(default)]
    host_key_verification: Option<HostKeyVerification>,
}

impl DeviceEntry {
    fn into_credentials(self, timeout_override: Option<u64>) -> Result<DeviceCredentials> {
        let mut builder = DeviceCredentials::builder(&self.name, self.ip)
            .username(self.username)
            .password(self.password)
            .transport(self.connection_type);

        if let Some(secret) = self.secret {
            builder = builder.secret(secret);
        }
        if let Some(port) = self.port {
            builder = builder.port(port);
        }
        if let Some(platform) = self.platform {
            builder = builder.platform(platform);
        }
        if let Some(secs) = timeout_override.or(self.timeout) {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(mode) = self.host_key_verification {
            builder = builder.host_key_verification(mode);
        }

        builder
            .build()
            .with_context(|| format!("Invalid inventory entry '{}'", self.name))
    }
}

/// Validated devices, in file order.
pub struct Inventory {
    devices: Vec<DeviceCredentials>,
}

impl Inventory {
    pub fn load(path: &Path, timeout_override: Option<u64>) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read inventory {}", path.display()))?;
        let file: InventoryFile = if is_json(path) {
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse inventory {}", path.display()))?
        } else {
            serde_yaml::from_str(&text)
                .with_context(|| format!("Failed to parse inventory {}", path.display()))?
        };
        Self::from_entries(file.devices, timeout_override)
    }

    fn from_entries(entries: Vec<DeviceEntry>, timeout_override: Option<u64>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut devices = Vec::with_capacity(entries.len());
        for entry in entries {
            // Names become backup file names
            if entry.name.contains(['/', '\\']) || entry.name == "." || entry.name == ".." {
                bail!("Device name '{}' must not contain a path", entry.name);
            }
            if !seen.insert(entry.name.clone()) {
                bail!("Duplicate device name '{}' in inventory", entry.name);
            }
            devices.push(entry.into_credentials(timeout_override)?);
        }
        Ok(Self { devices })
    }

    /// Keep only the named devices, or everything when `names` is empty.
    pub fn select(self, names: &[String]) -> Result<Vec<DeviceCredentials>> {
        if names.is_empty() {
            return Ok(self.devices);
        }

        for name in names {
            if !self.devices.iter().any(|d| d.name() == name) {
                bail!("Device '{name}' is not in the inventory");
            }
        }
        Ok(self
            .devices
            .into_iter()
            .filter(|d| names.iter().any(|n| n == d.name()))
            .collect())
    }
}
