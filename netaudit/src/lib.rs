//! # netaudit
//!
//! Async configuration auditing and change management for network devices
//! reachable over interactive command-line sessions (SSH or Telnet).
//!
//! ## Features
//!
//! - Async SSH via russh, raw Telnet with in-band option negotiation
//! - Prompt-driven session negotiation: login, `enable`, paging, config mode
//! - Expect-style channel with ANSI stripping and tail search
//! - Line-level config diffs (running vs startup, running vs file)
//! - Declarative compliance policies with a built-in hardening baseline
//! - Remediation intents applied as ordered config batches
//! - Bounded-concurrency fleet runner
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use netaudit::{DeviceCredentials, Session, audit};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), netaudit::Error> {
//!     let credentials = DeviceCredentials::builder("core-1", "192.0.2.10")
//!         .username("admin")
//!         .password("cisco")
//!         .secret("class")
//!         .build()?;
//!
//!     let mut session = Session::connect(credentials).await?;
//!
//!     let outcome = audit::compare_running_vs_startup(&mut session).await?;
//!     if let Some(diff) = outcome.diff() {
//!         print!("{}", diff.to_unified("startup-config", "running-config"));
//!     }
//!
//!     let report = audit::evaluate_running_policy(&mut session, &audit::Policy::hardening_baseline()).await?;
//!     println!("{report}");
//!
//!     session.disconnect().await;
//!     Ok(())
//! }
//! ```

pub mod audit;
pub mod channel;
pub mod error;
pub mod fleet;
pub mod platform;
pub mod session;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use fleet::{Fleet, FleetReport};
pub use platform::PlatformDefinition;
pub use session::{
    BatchFailure, CommandBatch, ConfigMode, DeviceCredentials, NegotiationStep, Response, Session,
    SessionState,
};
pub use transport::{HostKeyVerification, TransportKind};
