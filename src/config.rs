// Copyright 2025 Cowboy AI, LLC.

//! Configuration values read by the domain service
//!
//! The service never loads or persists configuration itself. A config
//! collaborator builds a [`CoreConfig`] (usually from a JSON document) and
//! passes it to [`DomainService::new`](crate::DomainService::new).

use crate::errors::{DomainError, DomainResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Output formats understood by the rendering collaborator
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON document
    Json,
    /// YAML document
    Yaml,
    /// Comma-separated values
    Csv,
    /// Aligned terminal table
    #[default]
    Table,
    /// Plain text
    Plain,
}

impl OutputFormat {
    /// Every supported format, in display order
    pub const ALL: [OutputFormat; 5] = [
        OutputFormat::Json,
        OutputFormat::Yaml,
        OutputFormat::Csv,
        OutputFormat::Table,
        OutputFormat::Plain,
    ];

    /// The selector string for this format
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
            OutputFormat::Csv => "csv",
            OutputFormat::Table => "table",
            OutputFormat::Plain => "plain",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        OutputFormat::ALL
            .into_iter()
            .find(|format| format.as_str() == wanted)
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "unknown output format '{s}' (expected one of json, yaml, csv, table, plain)"
                ))
            })
    }
}

/// Primitive settings the domain service reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CoreConfig {
    /// Seconds a command may run before the caller should time it out
    pub command_timeout_secs: u64,
    /// How many fresh attempts `retry_command` allows after a failure
    pub max_retries: u32,
    /// Exit code recorded for a command that timed out
    pub timeout_exit_code: i32,
    /// Default output format for rendered results
    pub output_format: OutputFormat,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            command_timeout_secs: 300,
            max_retries: 3,
            timeout_exit_code: 124,
            output_format: OutputFormat::default(),
        }
    }
}

impl CoreConfig {
    /// Parse and validate a JSON config document; missing keys take defaults
    pub fn from_json(json: &str) -> DomainResult<Self> {
        let config: CoreConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the command timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout_secs = timeout.as_secs();
        self
    }

    /// Set the retry budget
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the default output format
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// The command timeout as a `Duration`
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// Reject settings that would break the command lifecycle
    pub fn validate(&self) -> DomainResult<()> {
        if self.command_timeout_secs == 0 {
            return Err(DomainError::validation(
                "command_timeout_secs must be greater than zero",
            ));
        }
        if self.timeout_exit_code == 0 {
            return Err(DomainError::validation(
                "timeout_exit_code must be non-zero so timed out commands fail",
            ));
        }
        Ok(())
    }
}
