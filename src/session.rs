// Copyright 2025 Cowboy AI, LLC.

//! The Session aggregate: commands run by one actor within one time window

use crate::command::{Command, CommandId};
use crate::entity::{AggregateRoot, BusinessRules, EntityId, SessionMarker};
use crate::errors::{DomainError, DomainResult};
use crate::state_machine::{State, StateTransitions};
use chrono::{DateTime, Duration, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Type alias for session IDs
pub type SessionId = EntityId<SessionMarker>;

/// A session shared between concurrent callers
///
/// Appending through
/// [`DomainService::add_command_to_shared_session`](crate::DomainService::add_command_to_shared_session)
/// holds the lock across append and increment.
pub type SharedSession = Arc<Mutex<Session>>;

/// Lifecycle status of a [`Session`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Accepting commands, no end time yet
    Active,
    /// Ended; `end_time` is set
    Ended,
}

impl State for SessionStatus {
    fn name(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Ended => "ended",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Ended)
    }
}

impl StateTransitions for SessionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!((self, target), (SessionStatus::Active, SessionStatus::Ended))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            SessionStatus::Active => vec![SessionStatus::Ended],
            SessionStatus::Ended => vec![],
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Aggregate of the commands run by one actor
///
/// The session holds command IDs in the order they were added;
/// `commands_executed` always equals the number of IDs held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Session {
    id: SessionId,
    user_id: String,
    start_time: DateTime<Utc>,
    #[serde(default)]
    end_time: Option<DateTime<Utc>>,
    status: SessionStatus,
    #[serde(default)]
    commands: Vec<CommandId>,
    #[serde(default)]
    commands_executed: u64,
    #[serde(default)]
    version: u64,
}

impl Session {
    pub(crate) fn new(user_id: String) -> Self {
        Self {
            id: SessionId::new(),
            user_id,
            start_time: Utc::now(),
            end_time: None,
            status: SessionStatus::Active,
            commands: Vec::new(),
            commands_executed: 0,
            version: 0,
        }
    }

    /// The owning actor
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// When the session was created
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// When the session ended, if it has
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    /// Current lifecycle status
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// True until the session is ended
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Command IDs, in the order they were added
    pub fn commands(&self) -> &[CommandId] {
        &self.commands
    }

    /// Number of commands successfully added
    pub fn commands_executed(&self) -> u64 {
        self.commands_executed
    }

    /// Whether the command was added to this session
    pub fn contains_command(&self, id: CommandId) -> bool {
        self.commands.contains(&id)
    }

    /// Elapsed time, up to now for an active session
    pub fn duration(&self) -> Duration {
        self.end_time.unwrap_or_else(Utc::now) - self.start_time
    }

    /// The session as a keyed record for rendering
    pub fn to_record(&self) -> DomainResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub(crate) fn record_command(&mut self, command: &Command) {
        self.commands.push(command.id());
        self.commands_executed += 1;
        self.increment_version();
    }

    pub(crate) fn mark_ended(&mut self) {
        let now = Utc::now();
        self.end_time = Some(now.max(self.start_time));
        self.status = SessionStatus::Ended;
        self.increment_version();
    }
}

impl BusinessRules for Session {
    fn check_invariants(&self) -> DomainResult<()> {
        if self.id.is_nil() {
            return Err(DomainError::InvariantViolation(
                "session id cannot be empty".to_string(),
            ));
        }
        if self.user_id.trim().is_empty() {
            return Err(DomainError::InvariantViolation(format!(
                "session {} has no user id",
                self.id
            )));
        }
        match (self.status, self.end_time) {
            (SessionStatus::Active, Some(_)) => {
                return Err(DomainError::BusinessRuleViolation {
                    rule: "active session cannot have an end time".to_string(),
                })
            }
            (SessionStatus::Ended, None) => {
                return Err(DomainError::BusinessRuleViolation {
                    rule: "ended session must have an end time".to_string(),
                })
            }
            (SessionStatus::Ended, Some(end)) if end < self.start_time => {
                return Err(DomainError::BusinessRuleViolation {
                    rule: "session cannot end before it starts".to_string(),
                })
            }
            _ => {}
        }
        if self.commands_executed != self.commands.len() as u64 {
            return Err(DomainError::InvariantViolation(format!(
                "session {} counts {} executed commands but holds {}",
                self.id,
                self.commands_executed,
                self.commands.len()
            )));
        }
        Ok(())
    }
}

impl AggregateRoot for Session {
    type Id = SessionId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn increment_version(&mut self) {
        self.version += 1;
    }
}
