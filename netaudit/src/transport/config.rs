//! Transport configuration.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::session::DeviceCredentials;

/// How to reach a device's command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Interactive shell over SSH.
    #[default]
    Ssh,

    /// Raw Telnet socket with in-band login.
    Telnet,
}

impl TransportKind {
    /// Well-known port for this transport.
    pub fn default_port(self) -> u16 {
        match self {
            TransportKind::Ssh => 22,
            TransportKind::Telnet => 23,
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Ssh => f.write_str("ssh"),
            TransportKind::Telnet => f.write_str("telnet"),
        }
    }
}

/// Host key verification mode, analogous to OpenSSH's `StrictHostKeyChecking`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostKeyVerification {
    /// Reject unknown and changed keys. Connection fails if the host
    /// is not already in known_hosts.
    Strict,

    /// Accept and auto-learn unknown keys, but reject changed keys.
    /// This is the default and matches common SSH client behavior.
    #[default]
    AcceptNew,

    /// Accept all keys without checking. For testing and lab use only.
    Disabled,
}

/// SSH connection configuration.
#[derive(Debug)]
pub struct SshConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// SSH port (default: 22).
    pub port: u16,

    /// Username for authentication.
    pub username: String,

    /// Password for authentication.
    pub password: SecretString,

    /// Connection timeout.
    pub timeout: Duration,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,

    /// Host key verification mode.
    pub host_key_verification: HostKeyVerification,

    /// Path to known_hosts file.
    pub known_hosts_path: Option<PathBuf>,
}

impl SshConfig {
    /// Build the SSH settings for a device.
    pub fn from_credentials(credentials: &DeviceCredentials) -> Self {
        Self {
            host: credentials.host().to_string(),
            port: credentials.port(),
            username: credentials.username().to_string(),
            password: SecretString::from(credentials.password().expose_secret().to_owned()),
            timeout: credentials.timeout(),
            terminal_width: 511,
            terminal_height: 24,
            host_key_verification: credentials.host_key_verification().clone(),
            known_hosts_path: credentials.known_hosts_path().map(PathBuf::from),
        }
    }

    /// Get the socket address for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ports() {
        assert_eq!(TransportKind::Ssh.default_port(), 22);
        assert_eq!(TransportKind::Telnet.default_port(), 23);
    }

    #[test]
    fn test_transport_kind_deserializes_lowercase() {
        let kind: TransportKind = serde_json::from_str("\"telnet\"").unwrap();
        assert_eq!(kind, TransportKind::Telnet);
    }

    #[test]
    fn test_ssh_config_from_credentials() {
        let credentials = DeviceCredentials::builder("edge-1", "10.0.0.1")
            .username("admin")
            .password("pw")
            .build()
            .unwrap();
        let config = SshConfig::from_credentials(&credentials);

        assert_eq!(config.socket_addr(), "10.0.0.1:22");
        assert_eq!(config.password.expose_secret(), "pw");
        assert_eq!(config.host_key_verification, HostKeyVerification::AcceptNew);
    }
}
