// Copyright 2025 Cowboy AI, LLC.

//! Entity types with identity and lifecycle

use chrono::{DateTime, Utc};
use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use uuid::Uuid;

/// Identity plus lifecycle timestamps shared by every entity
///
/// # Examples
///
/// ```rust
/// use cim_cli::{Entity, markers::CommandMarker};
///
/// let mut entity = Entity::<CommandMarker>::new();
/// assert_eq!(entity.created_at, entity.updated_at);
///
/// entity.touch();
/// assert!(entity.updated_at >= entity.created_at);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Entity<T> {
    /// The unique identifier for this entity
    pub id: EntityId<T>,
    /// When this entity was created
    pub created_at: DateTime<Utc>,
    /// When this entity was last updated
    pub updated_at: DateTime<Utc>,
}

impl<T> Entity<T> {
    /// Create a new entity with a generated ID
    pub fn new() -> Self {
        Self::with_id(EntityId::new())
    }

    /// Create an entity with a specific ID
    pub fn with_id(id: EntityId<T>) -> Self {
        let now = Utc::now();
        Self {
            id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh the update timestamp
    ///
    /// `updated_at` never moves backwards, even if the wall clock does.
    pub fn touch(&mut self) {
        let now = Utc::now();
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}

impl<T> Default for Entity<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A typed entity ID using phantom types for type safety
///
/// The phantom type parameter keeps command IDs and session IDs from being
/// mixed up at compile time. On the wire an ID is a bare UUID string.
///
/// ```rust
/// use cim_cli::{CommandId, SessionId};
///
/// let command_id = CommandId::new();
/// let session_id = SessionId::new();
///
/// // let _: CommandId = session_id; // does not compile
/// assert_ne!(command_id.as_uuid(), session_id.as_uuid());
/// ```
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId<T> {
    id: Uuid,
    #[serde(skip)]
    _phantom: PhantomData<T>,
}

impl<T> EntityId<T> {
    /// Create a new random entity ID
    pub fn new() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Create an entity ID from a UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self {
            id,
            _phantom: PhantomData,
        }
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.id
    }

    /// True for the all-zero UUID, which never identifies a live entity
    pub fn is_nil(&self) -> bool {
        self.id.is_nil()
    }
}

// Manual impls so the marker type needs no bounds.
impl<T> Clone for EntityId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for EntityId<T> {}

impl<T> PartialEq for EntityId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for EntityId<T> {}

impl<T> std::hash::Hash for EntityId<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for EntityId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntityId").field(&self.id).finish()
    }
}

impl<T> fmt::Display for EntityId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl<T> Default for EntityId<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<EntityId<T>> for Uuid {
    fn from(id: EntityId<T>) -> Self {
        id.id
    }
}

impl<T> JsonSchema for EntityId<T> {
    fn is_referenceable() -> bool {
        false
    }

    fn schema_name() -> String {
        "EntityId".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        Uuid::json_schema(gen)
    }
}

/// Marker trait for aggregate roots
///
/// Aggregate roots are the entry points for modifying aggregates.
/// All changes to entities within an aggregate must go through the root.
pub trait AggregateRoot: Sized {
    /// The type of ID for this aggregate
    type Id: Copy + Eq + Send + Sync;

    /// Get the aggregate's ID
    fn id(&self) -> Self::Id;

    /// Get the aggregate's version, bumped on every mutation
    fn version(&self) -> u64;

    /// Increment the version
    fn increment_version(&mut self);
}

/// Entities whose invariants can be re-checked at any time
///
/// [`DomainService::validate_business_rules`](crate::DomainService::validate_business_rules)
/// runs this at creation and whenever a caller wants a health check.
pub trait BusinessRules {
    /// Return the first violated invariant, if any
    fn check_invariants(&self) -> crate::errors::DomainResult<()>;
}

/// Marker for command entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct CommandMarker;

/// Marker for session aggregates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct SessionMarker;
