//! Response type for command execution results.

use std::time::Duration;

use serde::Serialize;

/// Response from a command execution.
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    /// The command that was executed.
    pub command: String,

    /// The command output (normalized - command echo and trailing prompt removed).
    pub result: String,

    /// The raw output before normalization, without the prompt.
    pub raw_result: String,

    /// The prompt that was matched at the end.
    pub prompt: String,

    /// Time taken to execute the command.
    pub elapsed: Duration,

    /// Failure marker found in the output, if the device rejected the command.
    pub failure_message: Option<String>,
}

impl Response {
    /// Build a response from the output collected before `prompt`.
    pub(crate) fn from_output(
        command: &str,
        raw_result: String,
        prompt: String,
        elapsed: Duration,
    ) -> Self {
        Self {
            command: command.to_string(),
            result: normalize(&raw_result, command),
            raw_result,
            prompt: prompt.trim().to_string(),
            elapsed,
            failure_message: None,
        }
    }

    /// Mark the response failed with the marker found in its output.
    pub(crate) fn with_failure(mut self, failure_message: Option<String>) -> Self {
        self.failure_message = failure_message;
        self
    }

    /// Check if the response indicates success.
    pub fn is_success(&self) -> bool {
        self.failure_message.is_none()
    }

    /// Get the result lines as an iterator.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.result.lines()
    }

    /// Check if the result contains a substring.
    pub fn contains(&self, pattern: &str) -> bool {
        self.result.contains(pattern)
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.result)
    }
}

/// Strip the command echo from the front and the line break before the prompt.
pub(crate) fn normalize(raw: &str, command: &str) -> String {
    let trimmed = raw.trim_start_matches('\n');
    let output = trimmed
        .strip_prefix(command)
        .unwrap_or(trimmed)
        .trim_start_matches('\n');

    output.strip_suffix('\n').unwrap_or(output).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_echo_and_prompt_line() {
        let raw = "show clock\n*12:00:00.000 UTC Mon Mar 1 2027\n";
        assert_eq!(normalize(raw, "show clock"), "*12:00:00.000 UTC Mon Mar 1 2027");
    }

    #[test]
    fn test_normalize_without_echo() {
        assert_eq!(normalize("\nline one\nline two\n", "show x"), "line one\nline two");
        assert_eq!(normalize("", "end"), "");
    }

    #[test]
    fn test_normalize_keeps_inner_blank_lines() {
        let raw = "show run\nBuilding configuration...\n\nhostname r1\n";
        assert_eq!(
            normalize(raw, "show run"),
            "Building configuration...\n\nhostname r1"
        );
    }

    #[test]
    fn test_failed_response() {
        let response = Response::from_output(
            "shw ver",
            "shw ver\n% Invalid input detected at '^' marker.\n\n".to_string(),
            "router#".to_string(),
            Duration::from_millis(5),
        )
        .with_failure(Some("% Invalid input".to_string()));

        assert!(!response.is_success());
        assert!(response.contains("Invalid input"));
        assert_eq!(response.prompt, "router#");
    }
}
