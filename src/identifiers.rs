// Copyright 2025 Cowboy AI, LLC.

//! Identifier types for objects and encapsulations

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Object ID - identity of a receiver, metaobject or context
///
/// Identity is assigned once at construction and never reused. It is what
/// diagnostics and error messages print in place of the object itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(Uuid);

impl ObjectId {
    /// Create a new random object ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from a UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ObjectId> for Uuid {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

/// Encapsulation ID - the hidden key a receiver stores its private context under
///
/// Every call to `encapsulate` mints a fresh one, so two encapsulations of
/// the same behaviour never share contexts on a receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncapsulationId(Uuid);

impl EncapsulationId {
    /// Create a new random encapsulation ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EncapsulationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EncapsulationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
