//! Configuration text with provenance.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};

/// Where a configuration snapshot came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigSource {
    Running,
    Startup,
    LocalFile(PathBuf),
    Policy,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Running => f.write_str("running-config"),
            ConfigSource::Startup => f.write_str("startup-config"),
            ConfigSource::LocalFile(path) => write!(f, "{}", path.display()),
            ConfigSource::Policy => f.write_str("policy"),
        }
    }
}

/// A configuration as ordered lines.
///
/// Lines are split on `\n` or `\r\n` and otherwise kept verbatim,
/// including indentation and trailing spaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigText {
    source: ConfigSource,
    lines: Vec<String>,
}

impl ConfigText {
    /// Split `text` into lines.
    pub fn parse(source: ConfigSource, text: &str) -> Self {
        Self {
            source,
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    /// Read a local configuration file in full.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Input {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(ConfigSource::LocalFile(path.to_path_buf()), &text))
    }

    pub fn source(&self) -> &ConfigSource {
        &self.source
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Whether `line` appears verbatim as a whole line.
    pub fn contains_line(&self, line: &str) -> bool {
        self.lines.iter().any(|l| l == line)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl fmt::Display for ConfigText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_handles_both_line_endings() {
        let text = ConfigText::parse(ConfigSource::Running, "hostname r1\r\n!\n interface Gi1 \n");

        assert_eq!(text.lines(), ["hostname r1", "!", " interface Gi1 "]);
        assert!(text.contains_line(" interface Gi1 "));
        assert!(!text.contains_line("interface Gi1"));
    }

    #[test]
    fn test_display_round_trips_lines() {
        let text = ConfigText::parse(ConfigSource::Startup, "a\nb");
        assert_eq!(text.to_string(), "a\nb\n");
    }

    #[test]
    fn test_missing_file_is_input_error() {
        let err = ConfigText::from_file("/nonexistent/netaudit/r1.cfg").unwrap_err();
        assert!(matches!(err, Error::Input { .. }));
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("netaudit-text-{}.cfg", std::process::id()));
        std::fs::write(&path, "hostname r1\nno cdp run\n").unwrap();

        let text = ConfigText::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(text.len(), 2);
        assert_eq!(text.source(), &ConfigSource::LocalFile(path));
    }
}
