// Copyright 2025 Cowboy AI, LLC.

//! Handler registry: routes commands, queries and events to their handler
//!
//! Each handler id maps to exactly one handler. The registry never wraps a
//! handler's failure; it returns the handler's result verbatim. A handler
//! that panics is caught at the dispatch boundary and reported as
//! [`DomainError::InternalError`], so "errors are values" holds end to end.
//!
//! ```rust
//! use cim_cli::{HandlerRegistry, HandlerType};
//! use serde_json::json;
//!
//! let registry = HandlerRegistry::new();
//! registry
//!     .register_fn("h1", HandlerType::Command, |_| Ok(json!("ok")))
//!     .unwrap();
//!
//! assert_eq!(registry.dispatch("h1", &json!({"any": "thing"})).unwrap(), json!("ok"));
//! assert!(registry
//!     .register_fn("h1", HandlerType::Command, |_| Ok(json!("again")))
//!     .unwrap_err()
//!     .to_string()
//!     .contains("already registered"));
//! ```

use crate::errors::{DomainError, DomainResult};
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Kind of message a handler answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum HandlerType {
    /// Changes state
    Command,
    /// Reads state
    Query,
    /// Reacts to something that happened
    Event,
}

impl fmt::Display for HandlerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HandlerType::Command => "command",
            HandlerType::Query => "query",
            HandlerType::Event => "event",
        })
    }
}

/// A function from an inbound message to a result
pub trait MessageHandler: Send + Sync {
    /// Handle one message
    fn handle(&self, message: &Value) -> DomainResult<Value>;
}

/// Handler backed by a closure over raw JSON values
pub struct FnHandler<F> {
    f: F,
}

impl<F> FnHandler<F>
where
    F: Fn(&Value) -> DomainResult<Value> + Send + Sync,
{
    /// Wrap a closure
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> MessageHandler for FnHandler<F>
where
    F: Fn(&Value) -> DomainResult<Value> + Send + Sync,
{
    fn handle(&self, message: &Value) -> DomainResult<Value> {
        (self.f)(message)
    }
}

/// Handler over typed messages and responses
///
/// The inbound value is deserialized into `M` (a mismatch is a validation
/// failure) and the response is serialized back into JSON.
pub struct TypedHandler<M, R, F> {
    f: F,
    _types: PhantomData<fn(M) -> R>,
}

impl<M, R, F> TypedHandler<M, R, F>
where
    M: DeserializeOwned,
    R: Serialize,
    F: Fn(M) -> DomainResult<R> + Send + Sync,
{
    /// Wrap a typed closure
    pub fn new(f: F) -> Self {
        Self {
            f,
            _types: PhantomData,
        }
    }
}

impl<M, R, F> MessageHandler for TypedHandler<M, R, F>
where
    M: DeserializeOwned,
    R: Serialize,
    F: Fn(M) -> DomainResult<R> + Send + Sync,
{
    fn handle(&self, message: &Value) -> DomainResult<Value> {
        let message = M::deserialize(message)
            .map_err(|e| DomainError::validation(format!("malformed message: {e}")))?;
        let response = (self.f)(message)?;
        Ok(serde_json::to_value(response)?)
    }
}

#[derive(Clone)]
struct Registration {
    handler_type: HandlerType,
    handler: Arc<dyn MessageHandler>,
}

/// Command bus routing table: one handler per id
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RwLock<IndexMap<String, Registration>>,
}

impl HandlerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under a new id
    ///
    /// Fails if the id is empty or already taken; re-registering requires
    /// an explicit [`unregister`](Self::unregister) first.
    pub fn register<H>(
        &self,
        handler_id: impl Into<String>,
        handler_type: HandlerType,
        handler: H,
    ) -> DomainResult<()>
    where
        H: MessageHandler + 'static,
    {
        let handler_id = handler_id.into();
        if handler_id.trim().is_empty() {
            return Err(DomainError::validation("handler id cannot be empty"));
        }

        // Check and insert under one write lock.
        let mut handlers = self.write()?;
        if handlers.contains_key(&handler_id) {
            warn!(handler_id = %handler_id, "duplicate handler registration rejected");
            return Err(DomainError::AlreadyRegistered(handler_id));
        }
        debug!(handler_id = %handler_id, %handler_type, "handler registered");
        handlers.insert(
            handler_id,
            Registration {
                handler_type,
                handler: Arc::new(handler),
            },
        );
        Ok(())
    }

    /// Register a closure over raw JSON values
    pub fn register_fn<F>(
        &self,
        handler_id: impl Into<String>,
        handler_type: HandlerType,
        f: F,
    ) -> DomainResult<()>
    where
        F: Fn(&Value) -> DomainResult<Value> + Send + Sync + 'static,
    {
        self.register(handler_id, handler_type, FnHandler::new(f))
    }

    /// Register a closure over typed messages
    pub fn register_typed<M, R, F>(
        &self,
        handler_id: impl Into<String>,
        handler_type: HandlerType,
        f: F,
    ) -> DomainResult<()>
    where
        M: DeserializeOwned + 'static,
        R: Serialize + 'static,
        F: Fn(M) -> DomainResult<R> + Send + Sync + 'static,
    {
        self.register(handler_id, handler_type, TypedHandler::new(f))
    }

    /// Remove a handler
    pub fn unregister(&self, handler_id: &str) -> DomainResult<()> {
        match self.write()?.shift_remove(handler_id) {
            Some(_) => {
                debug!(handler_id, "handler unregistered");
                Ok(())
            }
            None => Err(DomainError::HandlerNotFound(handler_id.to_string())),
        }
    }

    /// Route a message to its handler and return the handler's result
    pub fn dispatch(&self, handler_id: &str, message: &Value) -> DomainResult<Value> {
        let registration = self.lookup(handler_id)?;
        Self::invoke(handler_id, &registration, message)
    }

    /// Dispatch to a command handler
    pub fn send(&self, handler_id: &str, message: &Value) -> DomainResult<Value> {
        self.dispatch_as(handler_id, HandlerType::Command, message)
    }

    /// Dispatch to a query handler
    pub fn query(&self, handler_id: &str, message: &Value) -> DomainResult<Value> {
        self.dispatch_as(handler_id, HandlerType::Query, message)
    }

    /// Dispatch to an event handler
    pub fn publish(&self, handler_id: &str, message: &Value) -> DomainResult<Value> {
        self.dispatch_as(handler_id, HandlerType::Event, message)
    }

    /// Type of the handler registered under an id
    pub fn handler_type(&self, handler_id: &str) -> Option<HandlerType> {
        self.read()
            .ok()?
            .get(handler_id)
            .map(|registration| registration.handler_type)
    }

    /// Whether an id is registered
    pub fn contains(&self, handler_id: &str) -> bool {
        self.handler_type(handler_id).is_some()
    }

    /// Registered ids, in registration order
    pub fn handler_ids(&self) -> Vec<String> {
        self.read()
            .map(|handlers| handlers.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.read().map(|handlers| handlers.len()).unwrap_or(0)
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn dispatch_as(
        &self,
        handler_id: &str,
        expected: HandlerType,
        message: &Value,
    ) -> DomainResult<Value> {
        let registration = self.lookup(handler_id)?;
        if registration.handler_type != expected {
            return Err(DomainError::InvalidOperation {
                reason: format!(
                    "handler '{handler_id}' handles {} messages, not {expected} messages",
                    registration.handler_type
                ),
            });
        }
        Self::invoke(handler_id, &registration, message)
    }

    // Clone the registration out so no lock is held while the handler runs;
    // a handler may register or unregister other handlers.
    fn lookup(&self, handler_id: &str) -> DomainResult<Registration> {
        self.read()?
            .get(handler_id)
            .cloned()
            .ok_or_else(|| DomainError::HandlerNotFound(handler_id.to_string()))
    }

    fn invoke(handler_id: &str, registration: &Registration, message: &Value) -> DomainResult<Value> {
        debug!(handler_id, handler_type = %registration.handler_type, "dispatching");
        panic::catch_unwind(AssertUnwindSafe(|| registration.handler.handle(message)))
            .unwrap_or_else(|payload| {
                let reason = panic_message(payload.as_ref());
                warn!(handler_id, %reason, "handler panicked");
                Err(DomainError::InternalError(format!(
                    "handler '{handler_id}' failed: {reason}"
                )))
            })
    }

    fn read(
        &self,
    ) -> DomainResult<std::sync::RwLockReadGuard<'_, IndexMap<String, Registration>>> {
        self.handlers
            .read()
            .map_err(|_| DomainError::internal("handler registry lock poisoned"))
    }

    fn write(
        &self,
    ) -> DomainResult<std::sync::RwLockWriteGuard<'_, IndexMap<String, Registration>>> {
        self.handlers
            .write()
            .map_err(|_| DomainError::internal("handler registry lock poisoned"))
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.handler_ids())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
