//! Generic resource-domain framework.
//!
//! This module provides the building blocks for batch persistence of entities:
//! records and batches that report per-item outcomes, the orchestrator that runs
//! the operations, and the collaborators it drives.
//!
//! # Main Components
//!
//! - [`DomainEntity`] - Trait that persistent types implement to be managed by a domain
//! - [`Domain`] - Batch create/update/upsert/delete/undelete over one entity type
//! - [`ResourceRecord`] / [`ResourceBatch`] - Outcome of each item and of the batch
//! - [`TransactionCoordinator`] - Transaction boundaries of one batch
//! - [`ErrorTranslator`] - Driver errors to user-facing messages
//! - [`DomainRegistry`] - Domains cached by type, looked up by alias
//! - [`DomainError`] - Caller errors; data failures are [`Violation`]s
//!
//! # Testing
//!
//! See the [`mock`] module for the in-memory store and its failure injection.

pub mod batch;
pub mod config;
pub mod domain;
pub mod entity;
pub mod error;
pub mod events;
pub mod factory;
pub mod input;
pub mod mock;
pub mod registry;
pub mod resource;
pub mod store;
pub mod transaction;
pub mod translator;
pub mod validator;

// Re-export core types for convenience
pub use batch::{BatchStatus, ResourceBatch};
pub use config::DomainConfig;
pub use domain::Domain;
pub use entity::{default_alias, short_type_name, DomainEntity, Operation, SoftDeletable};
pub use error::{ConfigError, DomainError, StoreError};
pub use events::{event_name, EventDispatcher, EventPhase, EventSink, ResourceEvent};
pub use factory::{DefaultEntityFactory, EntityFactory};
pub use input::{Identifier, Input, Submission};
pub use registry::{DomainFactory, DomainRegistry};
pub use resource::{ResourceRecord, ResourceStatus, Violation};
pub use store::{EntityMetadata, ObjectStore};
pub use transaction::TransactionCoordinator;
pub use translator::ErrorTranslator;
pub use validator::{EntityValidator, Validator};
