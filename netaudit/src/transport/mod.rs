//! Byte transports the channel layer runs over.
//!
//! A transport is an already-open, byte-oriented interactive stream. SSH
//! authenticates at the protocol layer before the shell starts; Telnet is a
//! raw socket where login happens in-band. Both look the same from above.

pub mod config;
mod ssh;
mod telnet;

use std::future::Future;

use log::debug;
use tokio::net::TcpStream;

pub use config::{HostKeyVerification, SshConfig, TransportKind};
pub use ssh::SshTransport;
pub use telnet::TelnetTransport;

use crate::error::TransportError;
use crate::session::DeviceCredentials;

/// An open, interactive byte stream to a device.
///
/// `read` must be cancel-safe: the channel wraps it in a timeout and drops
/// the future when the deadline passes.
pub trait Transport: Send {
    /// Write raw bytes to the device.
    fn write(&mut self, data: &[u8]) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Read the next chunk of output. `None` means the remote end closed.
    fn read(&mut self) -> impl Future<Output = Result<Option<Vec<u8>>, TransportError>> + Send;

    /// Close the transport.
    fn close(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Either built-in transport, chosen at runtime from the device's
/// [`TransportKind`].
pub enum DeviceTransport {
    /// Interactive shell over SSH.
    Ssh(SshTransport),

    /// Raw Telnet over TCP.
    Telnet(TelnetTransport<TcpStream>),
}

impl DeviceTransport {
    /// Open the transport described by `credentials`.
    pub async fn open(credentials: &DeviceCredentials) -> Result<Self, TransportError> {
        match credentials.transport() {
            TransportKind::Ssh => {
                let transport = SshTransport::connect(SshConfig::from_credentials(credentials)).await?;
                Ok(DeviceTransport::Ssh(transport))
            }
            TransportKind::Telnet => {
                let addr = (credentials.host(), credentials.port());
                debug!("telnet: connecting to {}:{}", addr.0, addr.1);
                let stream = tokio::time::timeout(credentials.timeout(), TcpStream::connect(addr))
                    .await
                    .map_err(|_| TransportError::Timeout(credentials.timeout()))??;
                Ok(DeviceTransport::Telnet(TelnetTransport::new(stream)))
            }
        }
    }
}

impl Transport for DeviceTransport {
    async fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        match self {
            DeviceTransport::Ssh(t) => t.write(data).await,
            DeviceTransport::Telnet(t) => t.write(data).await,
        }
    }

    async fn read(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        match self {
            DeviceTransport::Ssh(t) => t.read().await,
            DeviceTransport::Telnet(t) => t.read().await,
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        match self {
            DeviceTransport::Ssh(t) => t.close().await,
            DeviceTransport::Telnet(t) => t.close().await,
        }
    }
}
