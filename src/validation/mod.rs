// Copyright 2025 Cowboy AI, LLC.

//! Pattern validation for raw external input
//!
//! Input from the command line or a prompt is checked here before it becomes
//! part of a [`Command`](crate::Command) or [`Session`](crate::Session).
//! Rules are keyed by field name and point either at a named
//! [`PatternKind`] or at a custom predicate.

mod patterns;
mod validator;

pub use patterns::PatternKind;
pub use validator::{PatternValidator, Predicate, Record, Rule};
