//! Host configuration file parsing.

use std::fs;
use std::path::Path;

use crate::runner::ds::error::{ContainerError, Result};

pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Where recoverable diagnostics go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticsMode {
    /// Emit through the `log` facade.
    Log,
    /// Keep in memory until drained.
    Collect,
    /// Drop.
    Silent,
}

impl DiagnosticsMode {
    fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "log" => Ok(DiagnosticsMode::Log),
            "collect" => Ok(DiagnosticsMode::Collect),
            "silent" => Ok(DiagnosticsMode::Silent),
            other => Err(ContainerError::Config(format!(
                "unknown diagnostics mode '{}'",
                other
            ))),
        }
    }
}

/// Settings for a [`HostContext`](super::types::HostContext).
#[derive(Debug, Clone, PartialEq)]
pub struct HostConfig {
    pub diagnostics: DiagnosticsMode,
    /// Deepest nesting the codec will encode or decode.
    pub max_depth: usize,
}

impl HostConfig {
    pub fn new() -> Self {
        HostConfig {
            diagnostics: DiagnosticsMode::Log,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Load configuration from a TOML file.
    ///
    /// Expected format:
    /// ```toml
    /// [diagnostics]
    /// mode = "collect"
    ///
    /// [serialization]
    /// max_depth = 64
    /// ```
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ContainerError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string. Only flat `key = value` pairs under section
    /// headers are understood; unknown sections and keys are ignored.
    pub fn parse(content: &str) -> Result<Self> {
        let mut config = HostConfig::new();
        let mut current_section = String::new();

        for line in content.lines() {
            let line = strip_comment(line).trim();

            if line.is_empty() {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                current_section = line[1..line.len() - 1].trim().to_string();
                continue;
            }

            let (key, value) = match Self::parse_entry(line) {
                Some(entry) => entry,
                None => {
                    return Err(ContainerError::Config(format!(
                        "expected 'key = value', found '{}'",
                        line
                    )))
                }
            };

            match (current_section.as_str(), key.as_str()) {
                ("diagnostics", "mode") => {
                    config.diagnostics = DiagnosticsMode::parse(&value)?;
                }
                ("serialization", "max_depth") => {
                    config.max_depth = value.parse::<usize>().map_err(|_| {
                        ContainerError::Config(format!("max_depth must be a number, got '{}'", value))
                    })?;
                }
                _ => {}
            }
        }

        Ok(config)
    }

    /// Split `key = "value"` into its trimmed, unquoted parts.
    fn parse_entry(line: &str) -> Option<(String, String)> {
        let parts: Vec<&str> = line.splitn(2, '=').collect();
        if parts.len() != 2 {
            return None;
        }
        let key = parts[0].trim().trim_matches('"').to_string();
        let value = parts[1].trim().trim_matches('"').to_string();
        if key.is_empty() {
            return None;
        }
        Some((key, value))
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn strip_comment(line: &str) -> &str {
    let mut in_quotes = false;
    for (idx, c) in line.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '#' if !in_quotes => return &line[..idx],
            _ => {}
        }
    }
    line
}
