// Copyright 2025 Cowboy AI, LLC.

//! Domain service: the only component that mutates commands and sessions
//!
//! Every operation returns a [`DomainResult`]; a refused operation leaves the
//! entity untouched. The service does not spawn processes. An external
//! runner calls [`DomainService::start_execution`] before launching and
//! [`DomainService::complete_execution`] after the process exits.
//!
//! ```rust
//! use cim_cli::{CommandStatus, CoreConfig, DomainService};
//!
//! let service = DomainService::new(CoreConfig::default());
//! let mut session = service.create_session(Some("alice")).unwrap();
//! let mut command = service.create_command("echo hi").unwrap();
//!
//! service.add_command_to_session(&mut session, &command).unwrap();
//! service.start_execution(&mut command).unwrap();
//! service.complete_execution(&mut command, 0, "hi", None).unwrap();
//!
//! assert_eq!(session.commands_executed(), 1);
//! assert_eq!(command.status(), CommandStatus::Completed);
//! ```

use crate::command::{Command, CommandStatus};
use crate::config::CoreConfig;
use crate::entity::{AggregateRoot, BusinessRules};
use crate::errors::{DomainError, DomainResult};
use crate::session::{Session, SessionStatus, SharedSession};
use crate::state_machine::guard_transition;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Lifecycle operations for commands and sessions
#[derive(Debug, Clone, Default)]
pub struct DomainService {
    config: CoreConfig,
}

impl DomainService {
    /// Create a service reading the given configuration
    pub fn new(config: CoreConfig) -> Self {
        Self { config }
    }

    /// The configuration this service reads
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    // Command lifecycle

    /// Create a pending command with no arguments
    pub fn create_command(&self, command_line: impl Into<String>) -> DomainResult<Command> {
        self.create_command_with_args(command_line, Vec::new())
    }

    /// Create a pending command
    ///
    /// Fails if the command line is empty or whitespace-only.
    pub fn create_command_with_args(
        &self,
        command_line: impl Into<String>,
        args: Vec<String>,
    ) -> DomainResult<Command> {
        let command_line = command_line.into();
        if command_line.trim().is_empty() {
            warn!("rejected command with empty command line");
            return Err(DomainError::validation("command line cannot be empty"));
        }

        let command = Command::new(command_line, args);
        self.validate_business_rules(&command)?;

        info!(
            command_id = %command.id(),
            command_line = command.command_line(),
            args = command.args().len(),
            "command created"
        );
        Ok(command)
    }

    /// Move a pending command to running
    ///
    /// Starting a running or finished command always fails; re-running
    /// means creating a new command.
    pub fn start_execution<'c>(&self, command: &'c mut Command) -> DomainResult<&'c Command> {
        guard_transition(
            &command.status(),
            &CommandStatus::Running,
            "command must be pending to start",
        )
        .inspect_err(|_| {
            warn!(command_id = %command.id(), status = %command.status(), "refused to start command");
        })?;

        command.mark_running();
        info!(command_id = %command.id(), "command started");
        Ok(command)
    }

    /// Record the result of a running command
    ///
    /// Exit code 0 completes the command, anything else fails it.
    pub fn complete_execution<'c>(
        &self,
        command: &'c mut Command,
        exit_code: i32,
        output: impl Into<String>,
        error_output: Option<String>,
    ) -> DomainResult<&'c Command> {
        guard_transition(
            &command.status(),
            &CommandStatus::for_exit_code(exit_code),
            "command must be running to complete",
        )
        .inspect_err(|_| {
            warn!(command_id = %command.id(), status = %command.status(), "refused to complete command");
        })?;

        command.mark_finished(exit_code, output.into(), error_output);
        info!(
            command_id = %command.id(),
            exit_code,
            status = %command.status(),
            "command finished"
        );
        Ok(command)
    }

    /// Fail a running command that exceeded the configured timeout
    ///
    /// A timeout is always a failure, so a configured timeout exit code of 0
    /// is refused and the command is left untouched.
    pub fn fail_on_timeout<'c>(&self, command: &'c mut Command) -> DomainResult<&'c Command> {
        let exit_code = self.config.timeout_exit_code;
        if CommandStatus::for_exit_code(exit_code) != CommandStatus::Failed {
            return Err(DomainError::validation(format!(
                "timeout exit code must be non-zero (configured {exit_code})"
            )));
        }

        let message = format!(
            "command timed out after {}s",
            self.config.command_timeout_secs
        );
        let command = self.complete_execution(command, exit_code, "", Some(message))?;
        warn!(command_id = %command.id(), exit_code, "command timed out");
        Ok(command)
    }

    /// Create a fresh pending command that re-runs a failed one
    ///
    /// `attempt` is the number of retries already made; the configured
    /// `max_retries` bounds it. The failed command itself is not touched.
    pub fn retry_command(&self, failed: &Command, attempt: u32) -> DomainResult<Command> {
        if failed.status() != CommandStatus::Failed {
            return Err(DomainError::InvalidOperation {
                reason: format!(
                    "only failed commands can be retried (command {} is {})",
                    failed.id(),
                    failed.status()
                ),
            });
        }
        if attempt >= self.config.max_retries {
            return Err(DomainError::BusinessRuleViolation {
                rule: format!(
                    "retry limit of {} reached for command {}",
                    self.config.max_retries,
                    failed.id()
                ),
            });
        }

        let retry =
            self.create_command_with_args(failed.command_line(), failed.args().to_vec())?;
        debug!(previous = %failed.id(), retry = %retry.id(), attempt, "command retried");
        Ok(retry)
    }

    /// Re-check every invariant of a command or session
    pub fn validate_business_rules<E: BusinessRules>(&self, entity: &E) -> DomainResult<()> {
        entity.check_invariants()
    }

    // Session lifecycle

    /// Start an active session
    ///
    /// A user id is generated when none is supplied; an explicitly supplied
    /// blank user id is rejected.
    pub fn create_session(&self, user_id: Option<&str>) -> DomainResult<Session> {
        let user_id = match user_id {
            Some(id) if id.trim().is_empty() => {
                return Err(DomainError::validation("user id cannot be empty"));
            }
            Some(id) => id.trim().to_string(),
            None => generated_user_id(),
        };

        let session = Session::new(user_id);
        self.validate_business_rules(&session)?;

        info!(session_id = %session.id(), user_id = session.user_id(), "session created");
        Ok(session)
    }

    /// Append a command to a session and count it
    ///
    /// Appending to an ended session is permitted so the history stays
    /// complete. Adding the same command twice fails.
    pub fn add_command_to_session<'s>(
        &self,
        session: &'s mut Session,
        command: &Command,
    ) -> DomainResult<&'s Session> {
        if session.contains_command(command.id()) {
            return Err(DomainError::InvalidOperation {
                reason: format!(
                    "command {} already added to session {}",
                    command.id(),
                    session.id()
                ),
            });
        }
        if session.status() == SessionStatus::Ended {
            warn!(session_id = %session.id(), command_id = %command.id(), "adding command to ended session");
        }

        session.record_command(command);
        debug!(
            session_id = %session.id(),
            command_id = %command.id(),
            commands_executed = session.commands_executed(),
            "command added to session"
        );
        Ok(session)
    }

    /// Append a command to a session shared between callers
    ///
    /// Append and increment happen under the session's lock. Returns a
    /// snapshot of the session after the append.
    pub fn add_command_to_shared_session(
        &self,
        session: &SharedSession,
        command: &Command,
    ) -> DomainResult<Session> {
        let mut guard = session
            .lock()
            .map_err(|_| DomainError::internal("session lock poisoned"))?;
        self.add_command_to_session(&mut guard, command).cloned()
    }

    /// End a session
    ///
    /// Ending an already-ended session succeeds and leaves it unchanged.
    pub fn end_session<'s>(&self, session: &'s mut Session) -> DomainResult<&'s Session> {
        if session.status() == SessionStatus::Ended {
            debug!(session_id = %session.id(), "session already ended");
            return Ok(session);
        }

        guard_transition(
            &session.status(),
            &SessionStatus::Ended,
            "session must be active to end",
        )?;
        session.mark_ended();
        info!(
            session_id = %session.id(),
            commands_executed = session.commands_executed(),
            "session ended"
        );
        Ok(session)
    }
}

fn generated_user_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("user-{}", &id[..8])
}
