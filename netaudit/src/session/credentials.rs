//! Device credentials and their builder.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::error::{Error, Result};
use crate::platform::{BUILTIN_PLATFORMS, DEFAULT_PLATFORM};
use crate::transport::{HostKeyVerification, TransportKind};

/// Default per-operation timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything needed to reach and log in to one device.
///
/// Immutable once built. Secrets are kept in [`SecretString`] and are
/// redacted from `Debug` output.
pub struct DeviceCredentials {
    name: String,
    host: String,
    port: u16,
    username: String,
    password: SecretString,
    secret: SecretString,
    transport: TransportKind,
    platform: String,
    timeout: Duration,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
}

impl DeviceCredentials {
    /// Start building credentials for device `name` at `host`.
    pub fn builder(name: impl Into<String>, host: impl Into<String>) -> DeviceCredentialsBuilder {
        DeviceCredentialsBuilder::new(name, host)
    }

    /// Inventory name of the device.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hostname or IP address.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port of the transport.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Login username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Login password.
    pub fn password(&self) -> &SecretString {
        &self.password
    }

    /// Privileged-mode (`enable`) secret.
    pub fn secret(&self) -> &SecretString {
        &self.secret
    }

    /// Transport used to reach the device.
    pub fn transport(&self) -> TransportKind {
        self.transport
    }

    /// Platform name, e.g. `cisco_ios`.
    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// Per-operation timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// SSH host key verification mode.
    pub fn host_key_verification(&self) -> &HostKeyVerification {
        &self.host_key_verification
    }

    /// Custom known_hosts file, if any.
    pub fn known_hosts_path(&self) -> Option<&Path> {
        self.known_hosts_path.as_deref()
    }
}

impl Clone for DeviceCredentials {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            password: SecretString::from(self.password.expose_secret().to_owned()),
            secret: SecretString::from(self.secret.expose_secret().to_owned()),
            transport: self.transport,
            platform: self.platform.clone(),
            timeout: self.timeout,
            host_key_verification: self.host_key_verification.clone(),
            known_hosts_path: self.known_hosts_path.clone(),
        }
    }
}

impl fmt::Debug for DeviceCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceCredentials")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("transport", &self.transport)
            .field("platform", &self.platform)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Builder for [`DeviceCredentials`].
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use netaudit::{DeviceCredentials, TransportKind};
///
/// let credentials = DeviceCredentials::builder("core-1", "192.0.2.10")
///     .username("admin")
///     .password("cisco")
///     .secret("class")
///     .transport(TransportKind::Telnet)
///     .timeout(Duration::from_secs(10))
///     .build()
///     .unwrap();
///
/// assert_eq!(credentials.port(), 23);
/// ```
#[derive(Debug)]
pub struct DeviceCredentialsBuilder {
    name: String,
    host: String,
    port: Option<u16>,
    username: String,
    password: SecretString,
    secret: SecretString,
    transport: TransportKind,
    platform: String,
    timeout: Duration,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
}

impl DeviceCredentialsBuilder {
    fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port: None,
            username: String::new(),
            password: SecretString::from(String::new()),
            secret: SecretString::from(String::new()),
            transport: TransportKind::default(),
            platform: DEFAULT_PLATFORM.to_string(),
            timeout: DEFAULT_TIMEOUT,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }

    /// Set the port (default: 22 for SSH, 23 for Telnet).
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the login username.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Set the login password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = SecretString::from(password.into());
        self
    }

    /// Set the privileged-mode secret.
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = SecretString::from(secret.into());
        self
    }

    /// Set the transport (default: SSH).
    pub fn transport(mut self, transport: TransportKind) -> Self {
        self.transport = transport;
        self
    }

    /// Set the platform name (default: `cisco_ios`).
    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    /// Set the per-operation timeout (default: 30 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the SSH host key verification mode.
    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Use a custom known_hosts file instead of `~/.ssh/known_hosts`.
    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    /// Validate and build the credentials.
    pub fn build(self) -> Result<DeviceCredentials> {
        let invalid = |message: String| Error::InvalidCredentials { message };

        if self.name.trim().is_empty() {
            return Err(invalid("device name is empty".to_string()));
        }
        if self.host.trim().is_empty() {
            return Err(invalid(format!("{}: host is empty", self.name)));
        }
        if self.username.is_empty() {
            return Err(invalid(format!("{}: username is empty", self.name)));
        }
        if self.timeout.is_zero() {
            return Err(invalid(format!("{}: timeout must be non-zero", self.name)));
        }
        if !BUILTIN_PLATFORMS.contains(&self.platform.as_str()) {
            return Err(invalid(format!(
                "{}: unknown platform '{}' (expected one of {})",
                self.name,
                self.platform,
                BUILTIN_PLATFORMS.join(", ")
            )));
        }

        Ok(DeviceCredentials {
            port: self.port.unwrap_or_else(|| self.transport.default_port()),
            name: self.name,
            host: self.host,
            username: self.username,
            password: self.password,
            secret: self.secret,
            transport: self.transport,
            platform: self.platform,
            timeout: self.timeout,
            host_key_verification: self.host_key_verification,
            known_hosts_path: self.known_hosts_path,
        })
    }
}
