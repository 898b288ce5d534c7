//! Declarative compliance policies.
//!
//! A policy is an ordered list of rules. A rule is satisfied when the
//! configuration contains it as a whole line (literal rules) or has any line
//! matching it (pattern rules). The report lists unsatisfied rules in
//! declaration order.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use regex::Regex;
use serde::{Serialize, Serializer};

use super::text::ConfigText;
use crate::error::{Error, Result};

/// Prefix that turns a policy file line into a pattern rule.
pub const PATTERN_PREFIX: &str = "regex:";

/// The built-in hardening rules.
const HARDENING_BASELINE: &[&str] = &[
    "service password-encryption",
    "no ip http server",
    "no cdp run",
    "no ip source-route",
    "transport input ssh",
    "no transport input telnet",
];

/// One policy requirement.
#[derive(Debug, Clone)]
pub enum PolicyRule {
    /// The configuration must contain this exact line.
    Line(String),
    /// Some line of the configuration must match.
    Pattern(Regex),
}

impl PolicyRule {
    pub fn line(text: impl Into<String>) -> Self {
        PolicyRule::Line(text.into())
    }

    pub fn pattern(pattern: &str) -> Result<Self> {
        Ok(PolicyRule::Pattern(Regex::new(pattern)?))
    }

    fn is_satisfied(&self, lines: &HashSet<&str>) -> bool {
        match self {
            PolicyRule::Line(text) => lines.contains(text.as_str()),
            PolicyRule::Pattern(regex) => lines.iter().any(|line| regex.is_match(line)),
        }
    }
}

impl PartialEq for PolicyRule {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PolicyRule::Line(a), PolicyRule::Line(b)) => a == b,
            (PolicyRule::Pattern(a), PolicyRule::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl Eq for PolicyRule {}

impl fmt::Display for PolicyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyRule::Line(text) => f.write_str(text),
            PolicyRule::Pattern(regex) => write!(f, "{PATTERN_PREFIX}{}", regex.as_str()),
        }
    }
}

impl Serialize for PolicyRule {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// An ordered set of rules.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Policy {
    rules: Vec<PolicyRule>,
}

impl Policy {
    pub fn new(rules: Vec<PolicyRule>) -> Self {
        Self { rules }
    }

    /// Literal rules from `lines`, in order.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(lines.into_iter().map(PolicyRule::line).collect())
    }

    /// The built-in device hardening baseline.
    pub fn hardening_baseline() -> Self {
        Self::from_lines(HARDENING_BASELINE.iter().copied())
    }

    /// Parse a policy document: one rule per line.
    ///
    /// Blank lines and lines starting with `#` are skipped. A line starting
    /// with `regex:` is a pattern rule; any other line is a literal rule,
    /// kept verbatim.
    pub fn parse(text: &str) -> Result<Self> {
        let mut rules = Vec::new();
        for line in text.lines() {
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let rule = match line.strip_prefix(PATTERN_PREFIX) {
                Some(pattern) => PolicyRule::pattern(pattern.trim())?,
                None => PolicyRule::line(line),
            };
            rules.push(rule);
        }
        Ok(Self::new(rules))
    }

    /// Read and parse a policy file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Input {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluate this policy against `candidate`.
    pub fn evaluate(&self, candidate: &ConfigText) -> ComplianceReport {
        evaluate(self, candidate)
    }
}

/// Rules a configuration does not satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ComplianceReport {
    pub missing: Vec<PolicyRule>,
}

impl ComplianceReport {
    /// No rule is missing.
    pub fn is_compliant(&self) -> bool {
        self.missing.is_empty()
    }
}

impl fmt::Display for ComplianceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_compliant() {
            return f.write_str("compliant");
        }
        writeln!(f, "{} rule(s) missing:", self.missing.len())?;
        for rule in &self.missing {
            writeln!(f, "  [Missing] {rule}")?;
        }
        Ok(())
    }
}

/// Check every rule of `policy` against the lines of `candidate`.
pub fn evaluate(policy: &Policy, candidate: &ConfigText) -> ComplianceReport {
    let lines: HashSet<&str> = candidate.lines().iter().map(String::as_str).collect();

    let missing = policy
        .rules()
        .iter()
        .filter(|rule| !rule.is_satisfied(&lines))
        .cloned()
        .collect();

    ComplianceReport { missing }
}
