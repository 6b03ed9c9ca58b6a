// Copyright 2025 Cowboy AI, LLC.

//! The Command entity: one recorded invocation of an external process
//!
//! A command moves through `pending -> running -> completed | failed`.
//! Only [`DomainService`](crate::DomainService) drives those transitions;
//! everything public here is read-only.

use crate::entity::{BusinessRules, CommandMarker, Entity, EntityId};
use crate::errors::{DomainError, DomainResult};
use crate::state_machine::{State, StateTransitions};
use chrono::{DateTime, Duration, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type alias for command IDs
pub type CommandId = EntityId<CommandMarker>;

/// Lifecycle status of a [`Command`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    /// Created, not yet launched
    Pending,
    /// The external process has been launched
    Running,
    /// Finished with exit code 0
    Completed,
    /// Finished with a non-zero exit code
    Failed,
}

impl CommandStatus {
    /// Terminal status for a finished process
    pub fn for_exit_code(exit_code: i32) -> Self {
        if exit_code == 0 {
            CommandStatus::Completed
        } else {
            CommandStatus::Failed
        }
    }
}

impl State for CommandStatus {
    fn name(&self) -> &'static str {
        match self {
            CommandStatus::Pending => "pending",
            CommandStatus::Running => "running",
            CommandStatus::Completed => "completed",
            CommandStatus::Failed => "failed",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, CommandStatus::Completed | CommandStatus::Failed)
    }
}

impl StateTransitions for CommandStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use CommandStatus as S;
        matches!(
            (self, target),
            (S::Pending, S::Running) | (S::Running, S::Completed) | (S::Running, S::Failed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use CommandStatus as S;
        match self {
            S::Pending => vec![S::Running],
            S::Running => vec![S::Completed, S::Failed],
            S::Completed | S::Failed => vec![],
        }
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One invocation of an external process
///
/// `command_line` and `args` never change after creation. `exit_code`,
/// `output` and `error_output` are written once, by the completion
/// transition. A finished command is never reused; re-running means
/// creating a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Command {
    #[serde(flatten)]
    entity: Entity<CommandMarker>,
    command_line: String,
    #[serde(default)]
    args: Vec<String>,
    status: CommandStatus,
    #[serde(default)]
    exit_code: Option<i32>,
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    error_output: Option<String>,
}

impl Command {
    pub(crate) fn new(command_line: String, args: Vec<String>) -> Self {
        Self {
            entity: Entity::new(),
            command_line,
            args,
            status: CommandStatus::Pending,
            exit_code: None,
            output: None,
            error_output: None,
        }
    }

    /// Unique identifier assigned at creation
    pub fn id(&self) -> CommandId {
        self.entity.id
    }

    /// The invocation as typed by the user
    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    /// Arguments, in order
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Current lifecycle status
    pub fn status(&self) -> CommandStatus {
        self.status
    }

    /// Exit code, present once the command has finished
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Captured standard output
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    /// Captured standard error
    pub fn error_output(&self) -> Option<&str> {
        self.error_output.as_deref()
    }

    /// Creation timestamp
    pub fn created_at(&self) -> DateTime<Utc> {
        self.entity.created_at
    }

    /// Timestamp of the last transition
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.entity.updated_at
    }

    /// True once completed or failed
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// True only for a completed command
    pub fn is_success(&self) -> bool {
        self.status == CommandStatus::Completed
    }

    /// Time from creation to completion; `None` until the command finishes
    pub fn duration(&self) -> Option<Duration> {
        self.is_terminal()
            .then(|| self.entity.updated_at - self.entity.created_at)
    }

    /// The command as a keyed record for rendering
    pub fn to_record(&self) -> DomainResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub(crate) fn mark_running(&mut self) {
        self.status = CommandStatus::Running;
        self.entity.touch();
    }

    pub(crate) fn mark_finished(
        &mut self,
        exit_code: i32,
        output: String,
        error_output: Option<String>,
    ) {
        self.status = CommandStatus::for_exit_code(exit_code);
        self.exit_code = Some(exit_code);
        self.output = Some(output);
        self.error_output = error_output;
        self.entity.touch();
    }
}

impl BusinessRules for Command {
    fn check_invariants(&self) -> DomainResult<()> {
        if self.entity.id.is_nil() {
            return Err(DomainError::InvariantViolation(
                "command id cannot be empty".to_string(),
            ));
        }
        if self.command_line.trim().is_empty() {
            return Err(DomainError::validation("command line cannot be empty"));
        }
        if self.entity.updated_at < self.entity.created_at {
            return Err(DomainError::InvariantViolation(format!(
                "command {} was updated before it was created",
                self.entity.id
            )));
        }
        match (self.status.is_terminal(), self.exit_code) {
            (true, None) => Err(DomainError::BusinessRuleViolation {
                rule: format!("{} command must have an exit code", self.status),
            }),
            (false, Some(code)) => Err(DomainError::BusinessRuleViolation {
                rule: format!(
                    "{} command cannot have an exit code (found {code})",
                    self.status
                ),
            }),
            (true, Some(code)) if CommandStatus::for_exit_code(code) != self.status => {
                Err(DomainError::BusinessRuleViolation {
                    rule: format!(
                        "exit code {code} is inconsistent with status {}",
                        self.status
                    ),
                })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn command(line: &str) -> Command {
        Command::new(line.to_string(), vec![])
    }

    #[test]
    fn test_new_command_is_pending() {
        let cmd = Command::new("ls".to_string(), vec!["-la".to_string()]);

        assert_eq!(cmd.status(), CommandStatus::Pending);
        assert_eq!(cmd.exit_code(), None);
        assert_eq!(cmd.args(), ["-la".to_string()]);
        assert_eq!(cmd.created_at(), cmd.updated_at());
        assert!(cmd.duration().is_none());
        assert!(cmd.check_invariants().is_ok());
    }

    /// Test the status transition table
    ///
    /// ```mermaid
    /// graph LR
    ///     P[pending] --> R[running]
    ///     R --> C[completed]
    ///     R --> F[failed]
    /// ```
    #[test]
    fn test_status_transitions() {
        use CommandStatus as S;
        assert_eq!(S::Pending.valid_transitions(), vec![S::Running]);
        assert_eq!(S::Running.valid_transitions(), vec![S::Completed, S::Failed]);
        assert!(!S::Pending.can_transition_to(&S::Completed));
        assert!(!S::Running.can_transition_to(&S::Pending));
        assert!(S::Completed.is_terminal());
        assert!(S::Failed.is_terminal());
        assert!(!S::Running.is_terminal());
    }

    #[test]
    fn test_status_for_exit_code() {
        assert_eq!(CommandStatus::for_exit_code(0), CommandStatus::Completed);
        assert_eq!(CommandStatus::for_exit_code(1), CommandStatus::Failed);
        assert_eq!(CommandStatus::for_exit_code(-9), CommandStatus::Failed);
    }

    #[test]
    fn test_mark_finished_sets_results() {
        let mut cmd = command("false");
        cmd.mark_running();
        cmd.mark_finished(1, String::new(), Some("boom".to_string()));

        assert_eq!(cmd.status(), CommandStatus::Failed);
        assert_eq!(cmd.exit_code(), Some(1));
        assert_eq!(cmd.output(), Some(""));
        assert_eq!(cmd.error_output(), Some("boom"));
        assert!(cmd.duration().is_some());
        assert!(cmd.check_invariants().is_ok());
    }

    #[test]
    fn test_invariants_reject_exit_code_on_running_command() {
        let mut cmd = command("sleep 1");
        cmd.mark_running();
        cmd.exit_code = Some(0);

        let err = cmd.check_invariants().unwrap_err();
        assert!(err.to_string().contains("cannot have an exit code"));
    }

    #[test]
    fn test_invariants_reject_mismatched_exit_code() {
        let mut cmd = command("true");
        cmd.mark_running();
        cmd.mark_finished(0, "ok".to_string(), None);
        cmd.status = CommandStatus::Failed;

        let err = cmd.check_invariants().unwrap_err();
        assert!(err.to_string().contains("inconsistent"));
    }

    #[test]
    fn test_invariants_reject_blank_command_line() {
        let cmd = command("   ");
        let err = cmd.check_invariants().unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_record_shape() {
        let cmd = Command::new("echo".to_string(), vec!["hi".to_string()]);
        let record = cmd.to_record().unwrap();

        assert_eq!(record["id"], json!(cmd.id().to_string()));
        assert_eq!(record["command_line"], json!("echo"));
        assert_eq!(record["args"], json!(["hi"]));
        assert_eq!(record["status"], json!("pending"));
        assert_eq!(record["exit_code"], serde_json::Value::Null);
    }

    /// Unknown status strings are rejected at the serialization boundary
    #[test]
    fn test_unknown_status_is_rejected() {
        let cmd = command("echo");
        let mut record = cmd.to_record().unwrap();
        record["status"] = json!("exploded");

        assert!(serde_json::from_value::<Command>(record).is_err());
    }

    #[test]
    fn test_record_roundtrip_preserves_identity() {
        let cmd = command("echo");
        let back: Command = serde_json::from_value(cmd.to_record().unwrap()).unwrap();
        assert_eq!(back, cmd);
    }
}
