//! Error types for netaudit.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::session::{BatchFailure, NegotiationStep, SessionState};

/// Main error type for netaudit operations.
///
/// Low-level channel failures never escape as-is: the session layer maps them
/// onto `Timeout`, `ChannelClosed` or `Auth` together with the negotiation
/// step that was running.
#[derive(Error, Debug)]
pub enum Error {
    /// The transport could not be opened.
    #[error("Failed to connect to {host}: {source}")]
    Connect {
        host: String,
        #[source]
        source: TransportError,
    },

    /// Credentials or the privileged-mode secret were rejected.
    #[error("Authentication rejected during {step}")]
    Auth { step: NegotiationStep },

    /// An expected prompt did not appear in time.
    #[error("Timed out after {timeout:?} during {step}")]
    Timeout {
        step: NegotiationStep,
        timeout: Duration,
    },

    /// The remote end closed the channel or the transport failed.
    #[error("Channel closed during {step}")]
    ChannelClosed { step: NegotiationStep },

    /// A configuration batch failed after some commands already took effect.
    #[error("Batch partially applied: {0}")]
    PartialApply(Box<BatchFailure>),

    /// A configuration batch failed before any command took effect.
    #[error("Batch rejected: {0}")]
    BatchRejected(Box<BatchFailure>),

    /// A referenced local configuration or policy file could not be read.
    #[error("Cannot read '{}': {source}", path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Device credentials failed validation.
    #[error("Invalid credentials: {message}")]
    InvalidCredentials { message: String },

    /// A pattern (policy rule or prompt override) is not a valid regex.
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// No built-in platform with this name.
    #[error("Unknown platform '{name}'")]
    UnknownPlatform { name: String },

    /// The session was torn down by an earlier failure or disconnect.
    #[error("Session is disconnected")]
    Disconnected,

    /// The session is not in the state an operation requires.
    #[error("Session is in state {actual}, expected {expected}")]
    InvalidState {
        expected: SessionState,
        actual: SessionState,
    },

    /// An exec command's output carried a device failure marker.
    #[error("Command '{command}' rejected by device: {message}")]
    CommandRejected { command: String, message: String },
}

impl Error {
    /// Whether this error left a remediation batch half-applied.
    pub fn is_partial_apply(&self) -> bool {
        matches!(self, Error::PartialApply(_))
    }

    /// The batch report carried by batch errors.
    pub fn batch_failure(&self) -> Option<&BatchFailure> {
        match self {
            Error::PartialApply(failure) | Error::BatchRejected(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Transport layer errors (socket, SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed at the SSH protocol layer
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// Host key differs from the one recorded in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// Host is not in known_hosts and strict checking is enabled
    #[error("Host key for {host}:{port} is unknown")]
    HostKeyUnknown { host: String, port: u16 },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Channel layer errors (pattern matching over the transport).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// No pattern matched within the timeout
    #[error("Pattern not found within {0:?}")]
    Timeout(Duration),

    /// Transport reached end of stream
    #[error("Channel closed")]
    Closed,

    /// Transport failed while reading or writing
    #[error("Channel transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type alias using netaudit's Error.
pub type Result<T> = std::result::Result<T, Error>;
