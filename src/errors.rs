// Copyright 2025 Cowboy AI, LLC.

//! Error types for metaobject operations

use thiserror::Error;

/// Errors that can occur while building, composing, or invoking metaobjects
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetaobjectError {
    /// Attach-time misconfiguration (empty method lists, missing delegate targets)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Delegation ancestors of composed metaobjects are unrelated
    #[error("Incompatible prototypes: {other} does not descend from {seed}")]
    IncompatiblePrototypes {
        /// Prototype seeded from the first input that has one
        seed: String,
        /// Offending prototype
        other: String,
    },

    /// A name resolves to both methods and plain data across inputs
    #[error("Ambiguous merge for '{name}': methods mixed with data")]
    AmbiguousMerge {
        /// Method name being merged
        name: String,
    },

    /// Attempt to modify or extend a frozen (encapsulated) metaobject
    #[error("Cannot modify '{name}': object is frozen")]
    Frozen {
        /// Slot that was targeted
        name: String,
    },

    /// Behaviour definition could not be encapsulated
    #[error("Malformed behaviour: {0}")]
    MalformedBehaviour(String),

    /// No slot with this name on the receiver or its ancestors
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// The slot exists but does not hold a method
    #[error("Not a method: {0}")]
    NotAMethod(String),

    /// The receiver behind a context has been dropped
    #[error("Receiver dropped: {0}")]
    ReceiverDropped(String),

    /// Error raised by a method body
    #[error("Method failed: {0}")]
    Method(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Result type for metaobject operations
pub type MetaobjectResult<T> = Result<T, MetaobjectError>;

impl From<serde_json::Error> for MetaobjectError {
    fn from(err: serde_json::Error) -> Self {
        MetaobjectError::SerializationError(err.to_string())
    }
}

impl MetaobjectError {
    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        MetaobjectError::Configuration(msg.into())
    }

    /// Create an error from inside a method body
    pub fn method(msg: impl Into<String>) -> Self {
        MetaobjectError::Method(msg.into())
    }

    /// Check if this is an attach-time configuration error
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, MetaobjectError::Configuration(_))
    }

    /// Check if this error aborted a composition
    pub fn is_composition_error(&self) -> bool {
        matches!(
            self,
            MetaobjectError::IncompatiblePrototypes { .. } | MetaobjectError::AmbiguousMerge { .. }
        )
    }

    /// Check if this is an immutability violation
    pub fn is_immutability_violation(&self) -> bool {
        matches!(self, MetaobjectError::Frozen { .. })
    }

    /// Check if this is a dispatch failure
    pub fn is_dispatch_error(&self) -> bool {
        matches!(
            self,
            MetaobjectError::MethodNotFound(_)
                | MetaobjectError::NotAMethod(_)
                | MetaobjectError::ReceiverDropped(_)
        )
    }
}
