//! # Error Types
//!
//! Two families of errors live here and they never mix:
//!
//! - [`DomainError`]: misuse of the API (wrong entity type, unmanaged class, unknown
//!   alias...). Returned as `Err` from public operations.
//! - [`StoreError`]: failures reported by the object store. The orchestrator never lets
//!   these escape; they are translated into [`Violation`](crate::framework::Violation)s
//!   and attached to the affected records.

use thiserror::Error;

use crate::framework::resource::Violation;

/// Caller-contract violations raised by domains and the registry.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An input did not hold the entity type managed by the domain.
    #[error("Expected a resource of type \"{expected}\", got \"{found}\"")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },

    /// The object store does not know the entity type.
    #[error("The class \"{0}\" is not managed by the object store")]
    UnmanagedClass(String),

    /// A batch was indexed past its end.
    #[error("The index {index} does not exist in a batch of {len} resource(s)")]
    OutOfRange { index: usize, len: usize },

    /// The alias is already bound to another entity type.
    #[error("The domain alias \"{0}\" is already registered")]
    DuplicateAlias(String),

    /// A domain for the entity type was already added to the registry.
    #[error("A domain is already registered for the class \"{0}\"")]
    DuplicateDomain(String),

    /// No entity type is bound to the alias.
    #[error("No domain is registered for the alias \"{0}\"")]
    UnknownAlias(String),

    /// The store lock was poisoned by a panic in another caller.
    #[error("The object store is unavailable")]
    StoreUnavailable,

    /// The registry lock was poisoned by a panic in another caller.
    #[error("The domain registry is unavailable")]
    RegistryUnavailable,

    /// Options passed to the entity factory were not a JSON object.
    #[error("Invalid entity options: {0}")]
    InvalidOptions(String),

    /// The entity factory could not build an instance.
    #[error("Failed to build entity: {0}")]
    Factory(#[from] serde_json::Error),

    /// Any other store failure surfacing outside of a batch.
    #[error("Object store error: {0}")]
    Store(#[source] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<StoreError> for DomainError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::UnmanagedClass(class) => DomainError::UnmanagedClass(class),
            other => DomainError::Store(other),
        }
    }
}

/// Failures reported by an [`ObjectStore`](crate::framework::ObjectStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// A driver-level failure, optionally caused by a lower-level one.
    #[error("{message}")]
    Driver {
        message: String,
        #[source]
        source: Option<Box<StoreError>>,
    },

    /// The store rejected the data with structured violations.
    #[error("{} constraint violation(s)", .0.len())]
    Constraints(Vec<Violation>),

    #[error("The class \"{0}\" is not a managed entity")]
    UnmanagedClass(String),

    #[error("There is no active transaction")]
    NoActiveTransaction,

    #[error("Failed to serialize entity: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Creates a root driver error.
    pub fn driver(message: impl Into<String>) -> Self {
        StoreError::Driver {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps this error in a higher-level driver error.
    pub fn wrap(self, message: impl Into<String>) -> Self {
        StoreError::Driver {
            message: message.into(),
            source: Some(Box::new(self)),
        }
    }
}

/// Errors raised while loading a [`DomainConfig`](crate::framework::DomainConfig).
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {var}: {reason}")]
    InvalidEnvValue { var: String, reason: String },
}
