//! Configuration auditing: diffs, compliance and remediation.
//!
//! The pure parts ([`differ`], [`compliance`], [`remediation`]) work on
//! [`ConfigText`] values and never touch a device; [`ops`] wires them to a
//! live [`Session`](crate::Session).

pub mod compliance;
pub mod differ;
pub mod ops;
pub mod remediation;
mod text;

pub use compliance::{ComplianceReport, Policy, PolicyRule};
pub use differ::{Diff, DiffEntry, DiffKind, DiffOptions, DiffOutcome, DiffStats, Hunk};
pub use ops::{
    RemediationOutcome, apply_remediation, compare_running_vs_file, compare_running_vs_startup,
    evaluate_running_policy, fetch_running_config, fetch_startup_config,
};
pub use remediation::{AclAction, AclRule, OspfNetwork, Remediation};
pub use text::{ConfigSource, ConfigText};
