// Copyright 2025 Cowboy AI, LLC.

//! # CIM CLI
//!
//! Domain core for a command-line shell assistant.
//!
//! This crate models the lifecycle of shell commands and the sessions that
//! group them, validates raw input against named patterns, and routes
//! messages to registered handlers:
//! - **Command**: one shell invocation, `pending → running → completed | failed`
//! - **Session**: the commands run by one actor within one time window
//! - **DomainService**: the only component that mutates commands and sessions
//! - **PatternValidator**: field-keyed rules over raw string input
//! - **HandlerRegistry**: one handler per id, failures returned as values
//!
//! Nothing here spawns processes, renders output or touches the network.
//! An outer CLI layer drives the service and renders [`Command::to_record`]
//! and [`Session::to_record`] in the configured [`OutputFormat`].
//!
//! ## Design Principles
//!
//! 1. **Errors are values**: every operation returns a [`DomainResult`]
//! 2. **Controlled state**: enum statuses with guarded transitions
//! 3. **Identity**: phantom-typed UUIDs keep command and session ids apart

#![warn(missing_docs)]

mod command;
mod config;
mod entity;
mod errors;
mod handlers;
mod service;
mod session;
pub mod state_machine;
pub mod validation;

pub use command::{Command, CommandId, CommandStatus};
pub use config::{CoreConfig, OutputFormat};
pub use entity::{AggregateRoot, BusinessRules, Entity, EntityId};
pub use errors::{DomainError, DomainResult};
pub use handlers::{FnHandler, HandlerRegistry, HandlerType, MessageHandler, TypedHandler};
pub use service::DomainService;
pub use session::{Session, SessionId, SessionStatus, SharedSession};

/// Marker types for entity identifiers
pub mod markers {
    pub use crate::entity::{CommandMarker, SessionMarker};
}
