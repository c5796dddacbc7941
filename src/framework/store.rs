//! # Object Store Contract
//!
//! The [`ObjectStore`] is the ORM-like collaborator the domains drive: a unit of work
//! (persist/remove/flush), an identity map (detach/clear), and a transaction.
//! [`MemoryStore`](crate::framework::mock::MemoryStore) is the in-memory
//! implementation used by the demo and the tests.

use crate::framework::entity::DomainEntity;
use crate::framework::error::StoreError;

/// Mapping information the store keeps for a managed entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMetadata {
    /// Short type name of the entity.
    pub class: &'static str,
    pub table: String,
    pub unique_fields: Vec<&'static str>,
}

/// Storage engine consumed by the orchestrator.
///
/// All calls are synchronous. A store is used by one batch at a time; the domains
/// hold it behind a mutex for the whole batch.
pub trait ObjectStore: Send + 'static {
    /// Mapping for `E`, or `StoreError::UnmanagedClass`.
    fn metadata<E: DomainEntity>(&self) -> Result<EntityMetadata, StoreError>;

    /// Loads an entity by identifier, soft-deleted rows included.
    fn find<E: DomainEntity>(&mut self, id: &E::Id) -> Result<Option<E>, StoreError>;

    /// Schedules the entity for insertion or update. Assigns an identifier to an
    /// entity that has none.
    fn persist<E: DomainEntity>(&mut self, entity: &mut E) -> Result<(), StoreError>;

    /// Schedules the entity for removal.
    fn remove<E: DomainEntity>(&mut self, entity: &E) -> Result<(), StoreError>;

    /// Writes every scheduled change.
    fn flush(&mut self) -> Result<(), StoreError>;

    /// Forgets scheduled changes for this entity.
    fn detach<E: DomainEntity>(&mut self, entity: &E);

    /// Forgets every scheduled change.
    fn clear(&mut self);

    fn begin(&mut self) -> Result<(), StoreError>;

    fn commit(&mut self) -> Result<(), StoreError>;

    fn rollback(&mut self) -> Result<(), StoreError>;

    fn in_transaction(&self) -> bool;
}
