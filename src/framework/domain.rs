//! # Domain Orchestrator
//!
//! [`Domain<E, S>`] runs create/update/upsert/delete/undelete over ordered batches of
//! entities of one type, on top of an [`ObjectStore`].
//!
//! ## Batch Algorithm
//!
//! 1. Inputs are converted into `Pending` records, in order.
//! 2. `<alias>.pre_<operation>s` is dispatched.
//! 3. A transaction is opened unless the batch auto-commits.
//! 4. Each record is checked, validated and staged:
//!    - after a failure, remaining records are `Canceled` (one transaction) or fail
//!      with [`PREVIOUS_ERROR_MESSAGE`] once a flush has failed (auto-commit);
//!    - auto-commit flushes every successful record on its own.
//! 5. The transaction is committed, or rolled back if any record failed. After a
//!    rollback every record that did not fail is `Canceled`. A failed commit
//!    marks every record `Error`.
//! 6. `<alias>.post_<operation>s` is dispatched.
//!
//! Single-item operations run a one-record batch in auto-commit mode.
//!
//! ## Example
//! ```ignore
//! let users = user_domain::new(store.clone(), events.clone());
//! let batch = users.creates(vec![alice, bob], false)?;
//! assert_eq!(batch.status(), BatchStatus::Successful);
//! ```

use chrono::Utc;
use paste::paste;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, info_span, warn};

use crate::framework::batch::ResourceBatch;
use crate::framework::entity::{short_type_name, DomainEntity, Operation};
use crate::framework::error::DomainError;
use crate::framework::events::{event_name, EventPhase, EventSink, ResourceEvent};
use crate::framework::factory::{DefaultEntityFactory, EntityFactory};
use crate::framework::input::{Identifier, Input};
use crate::framework::resource::{ResourceRecord, ResourceStatus, Violation};
use crate::framework::store::ObjectStore;
use crate::framework::transaction::TransactionCoordinator;
use crate::framework::validator::{EntityValidator, Validator};

pub const CREATE_WITH_ID_MESSAGE: &str =
    "The resource cannot be created because it has an identifier";
pub const UPDATE_WITHOUT_ID_MESSAGE: &str =
    "The resource cannot be updated because it has not an identifier";
pub const DELETE_WITHOUT_ID_MESSAGE: &str =
    "The resource cannot be deleted because it has not an identifier";
pub const UNDELETE_WITHOUT_ID_MESSAGE: &str =
    "The resource cannot be undeleted because it has not an identifier";
pub const UNDELETE_UNSUPPORTED_MESSAGE: &str = "The resource type can not be undeleted";
pub const PREVIOUS_ERROR_MESSAGE: &str = "Caused by previous internal database error";

/// Message for an undelete identifier that matches no row.
pub fn not_found_message(id: &impl fmt::Display) -> String {
    format!("The resource with the identifier \"{}\" does not exist", id)
}

// =============================================================================
// DOMAIN
// =============================================================================

/// Batch persistence orchestrator for entities of type `E`.
pub struct Domain<E: DomainEntity, S: ObjectStore> {
    class: &'static str,
    alias: String,
    store: Arc<Mutex<S>>,
    validator: Arc<dyn Validator<E>>,
    events: Arc<dyn EventSink<E>>,
    factory: Arc<dyn EntityFactory<E>>,
    debug: bool,
}

/// Generates the batch operation and its single-item form for the operations that
/// persist the entity as given.
macro_rules! persist_operations {
    ($($name:ident => $operation:ident),* $(,)?) => {
        paste! {
            $(
                #[doc = "Runs `" $name "` over a batch of entities or submissions."]
                pub fn [<$name s>]<I>(
                    &self,
                    inputs: impl IntoIterator<Item = I>,
                    auto_commit: bool,
                ) -> Result<ResourceBatch<E>, DomainError>
                where
                    I: Into<Input<E>>,
                {
                    let batch = Self::convert(inputs)?;
                    self.run(Operation::$operation, batch, auto_commit, false)
                }

                #[doc = "Runs `" $name "` on one entity or submission, in auto-commit mode."]
                pub fn $name(
                    &self,
                    input: impl Into<Input<E>>,
                ) -> Result<ResourceRecord<E>, DomainError> {
                    let input: Input<E> = input.into();
                    let batch = Self::convert([input])?;
                    self.single(Operation::$operation, batch, false)
                }
            )*
        }
    };
}

impl<E: DomainEntity, S: ObjectStore> Domain<E, S> {
    /// Builds a domain with the entity's own constraints as validator and the
    /// serde-based factory.
    pub fn new(
        alias: impl Into<String>,
        store: Arc<Mutex<S>>,
        events: Arc<dyn EventSink<E>>,
    ) -> Self {
        Self {
            class: short_type_name::<E>(),
            alias: alias.into(),
            store,
            validator: Arc::new(EntityValidator),
            events,
            factory: Arc::new(DefaultEntityFactory),
            debug: false,
        }
    }

    pub fn with_validator(mut self, validator: impl Validator<E> + 'static) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    pub fn with_factory(mut self, factory: impl EntityFactory<E> + 'static) -> Self {
        self.factory = Arc::new(factory);
        self
    }

    /// In debug mode untranslatable store errors keep their root message.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn class(&self) -> &'static str {
        self.class
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn store(&self) -> &Arc<Mutex<S>> {
        &self.store
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Builds a blank entity, with `options` (a JSON object or `null`) merged over
    /// the defaults.
    pub fn new_instance(&self, options: &Value) -> Result<E, DomainError> {
        self.factory.create(options)
    }

    persist_operations!(create => Create, update => Update, upsert => Upsert);

    /// Deletes a batch. With `soft`, soft-deletable entities are marked deleted
    /// instead of removed.
    pub fn deletes<I>(
        &self,
        inputs: impl IntoIterator<Item = I>,
        soft: bool,
        auto_commit: bool,
    ) -> Result<ResourceBatch<E>, DomainError>
    where
        I: Into<Input<E>>,
    {
        let batch = Self::convert(inputs)?;
        self.run(Operation::Delete, batch, auto_commit, soft)
    }

    pub fn delete(
        &self,
        input: impl Into<Input<E>>,
        soft: bool,
    ) -> Result<ResourceRecord<E>, DomainError> {
        let input: Input<E> = input.into();
        let batch = Self::convert([input])?;
        self.single(Operation::Delete, batch, soft)
    }

    /// Restores soft-deleted entities. Identifiers are loaded from the store,
    /// deleted rows included; unknown identifiers fail their record.
    pub fn undeletes<I>(
        &self,
        identifiers: impl IntoIterator<Item = I>,
        auto_commit: bool,
    ) -> Result<ResourceBatch<E>, DomainError>
    where
        I: Into<Identifier<E>>,
    {
        let batch = self.resolve(identifiers.into_iter().map(Into::into))?;
        self.run(Operation::Undelete, batch, auto_commit, false)
    }

    pub fn undelete(
        &self,
        identifier: impl Into<Identifier<E>>,
    ) -> Result<ResourceRecord<E>, DomainError> {
        let batch = self.resolve([identifier.into()])?;
        self.single(Operation::Undelete, batch, false)
    }

    // =========================================================================
    // EXECUTION
    // =========================================================================

    fn convert<I>(inputs: impl IntoIterator<Item = I>) -> Result<ResourceBatch<E>, DomainError>
    where
        I: Into<Input<E>>,
    {
        inputs.into_iter().map(|input| input.into().into_record()).collect()
    }

    fn resolve(
        &self,
        identifiers: impl IntoIterator<Item = Identifier<E>>,
    ) -> Result<ResourceBatch<E>, DomainError> {
        let mut store = self.lock_store()?;
        let mut tx = TransactionCoordinator::new(&mut *store, true, self.debug);
        let mut batch = ResourceBatch::new();

        for identifier in identifiers {
            let record = match identifier {
                Identifier::Entity(entity) => ResourceRecord::new(entity),
                Identifier::Id(id) => match tx.find::<E>(&id) {
                    Ok(Some(entity)) => ResourceRecord::new(entity),
                    Ok(None) => {
                        debug!(domain = %self.alias, %id, "Not found");
                        let message = not_found_message(&id);
                        let mut record = self.placeholder(id)?;
                        record.add_error(Violation::new(message));
                        record
                    }
                    Err(violations) => {
                        let mut record = self.placeholder(id)?;
                        record.add_errors(violations);
                        record
                    }
                },
            };
            batch.add(record);
        }
        Ok(batch)
    }

    fn placeholder(&self, id: E::Id) -> Result<ResourceRecord<E>, DomainError> {
        let mut entity = self.factory.create(&Value::Null)?;
        entity.set_id(id);
        Ok(ResourceRecord::new(entity))
    }

    fn single(
        &self,
        operation: Operation,
        batch: ResourceBatch<E>,
        soft: bool,
    ) -> Result<ResourceRecord<E>, DomainError> {
        let batch = self.run(operation, batch, true, soft)?;
        batch
            .into_records()
            .into_iter()
            .next()
            .ok_or(DomainError::OutOfRange { index: 0, len: 0 })
    }

    fn run(
        &self,
        operation: Operation,
        mut batch: ResourceBatch<E>,
        auto_commit: bool,
        soft: bool,
    ) -> Result<ResourceBatch<E>, DomainError> {
        let span = info_span!(
            "batch",
            domain = %self.alias,
            %operation,
            size = batch.len(),
            auto_commit
        );
        let _enter = span.enter();
        debug!(class = self.class, soft, "Batch started");

        self.dispatch(EventPhase::Pre, operation, &batch);
        {
            let mut store = self.lock_store()?;
            let mut tx = TransactionCoordinator::new(&mut *store, auto_commit, self.debug);
            self.execute(&mut tx, operation, &mut batch, soft);
        }
        self.dispatch(EventPhase::Post, operation, &batch);

        if batch.has_errors() {
            warn!(status = %batch.status(), "Batch completed with errors");
        } else {
            info!(status = %batch.status(), "Batch completed");
        }
        Ok(batch)
    }

    fn execute(
        &self,
        tx: &mut TransactionCoordinator<'_, S>,
        operation: Operation,
        batch: &mut ResourceBatch<E>,
        soft: bool,
    ) {
        let begin_errors = tx.begin();
        if !begin_errors.is_empty() {
            batch.fail_all(begin_errors);
            return;
        }

        let auto_commit = tx.is_auto_commit();
        let mut has_error = false;
        let mut has_flush_error = false;

        for (index, record) in batch.iter_mut().enumerate() {
            if has_error && !auto_commit {
                record.set_status(ResourceStatus::Canceled);
                continue;
            }
            if has_error && has_flush_error {
                record.add_error(Violation::new(PREVIOUS_ERROR_MESSAGE));
                record.set_status(ResourceStatus::Error);
                continue;
            }

            let status = self.apply(tx, record, operation, soft);

            if auto_commit && record.errors().is_empty() {
                let errors = tx.commit_one(record.entity());
                if !errors.is_empty() {
                    has_flush_error = true;
                    record.add_errors(errors);
                }
            }

            if record.errors().is_empty() {
                record.set_status(status);
            } else {
                warn!(index, errors = record.errors().len(), "Record failed");
                record.set_status(ResourceStatus::Error);
                has_error = true;
                tx.detach(record.entity());
            }
        }

        if !auto_commit {
            if has_error {
                tx.cancel_all();
                Self::cancel_staged(batch);
            } else {
                let errors = tx.commit_all();
                if !errors.is_empty() {
                    batch.fail_all(errors);
                }
            }
        }
    }

    /// After a rollback nothing was written: every record that did not fail
    /// is `Canceled`, and new entities lose their assigned identifier.
    fn cancel_staged(batch: &mut ResourceBatch<E>) {
        for record in batch.iter_mut() {
            match record.status() {
                ResourceStatus::Error => {}
                ResourceStatus::Created => {
                    record.entity_mut().clear_id();
                    record.set_status(ResourceStatus::Canceled);
                }
                _ => record.set_status(ResourceStatus::Canceled),
            }
        }
    }

    /// Checks, validates and stages one record. Returns the status the record
    /// gets if it ends up error-free.
    fn apply(
        &self,
        tx: &mut TransactionCoordinator<'_, S>,
        record: &mut ResourceRecord<E>,
        operation: Operation,
        soft: bool,
    ) -> ResourceStatus {
        let (effective, status) = match operation {
            Operation::Create => (Operation::Create, ResourceStatus::Created),
            Operation::Update => (Operation::Update, ResourceStatus::Updated),
            Operation::Upsert if record.entity().id().is_none() => {
                (Operation::Create, ResourceStatus::Created)
            }
            Operation::Upsert => (Operation::Update, ResourceStatus::Updated),
            Operation::Delete => (Operation::Delete, ResourceStatus::Deleted),
            Operation::Undelete => (Operation::Undelete, ResourceStatus::Undeleted),
        };

        record.add_errors(identity_errors(record.entity(), operation));
        if !record.errors().is_empty() {
            return status;
        }

        match effective {
            Operation::Create | Operation::Update => {
                let violations = self.validator.validate(record.entity(), effective);
                if !violations.is_empty() {
                    record.add_errors(violations);
                    return status;
                }
                let errors = tx.persist(record.entity_mut());
                record.add_errors(errors);
            }
            Operation::Delete => {
                let errors = match record.entity_mut().soft_deletion_mut() {
                    Some(entity) if soft && entity.is_deleted() => {
                        debug!("Already deleted, skipped");
                        Vec::new()
                    }
                    Some(entity) if soft => {
                        entity.set_deleted_at(Some(Utc::now()));
                        tx.persist(record.entity_mut())
                    }
                    _ => tx.remove(record.entity()),
                };
                record.add_errors(errors);
            }
            Operation::Undelete => {
                let restored = match record.entity_mut().soft_deletion_mut() {
                    Some(entity) if entity.is_deleted() => {
                        entity.set_deleted_at(None);
                        true
                    }
                    _ => false,
                };
                if restored {
                    let errors = tx.persist(record.entity_mut());
                    record.add_errors(errors);
                }
            }
            Operation::Upsert => {}
        }
        status
    }

    fn dispatch(&self, phase: EventPhase, operation: Operation, batch: &ResourceBatch<E>) {
        let name = event_name(&self.alias, phase, operation);
        debug!(event = %name, "Dispatch");
        let event = ResourceEvent {
            domain: &self.alias,
            class: self.class,
            operation,
            phase,
            batch,
        };
        self.events.dispatch(&name, &event);
    }

    fn lock_store(&self) -> Result<MutexGuard<'_, S>, DomainError> {
        self.store.lock().map_err(|_| DomainError::StoreUnavailable)
    }
}

/// Identifier (and capability) checks run before validation.
fn identity_errors<E: DomainEntity>(entity: &E, operation: Operation) -> Vec<Violation> {
    let has_id = entity.id().is_some();
    let mut errors = Vec::new();
    match operation {
        Operation::Create if has_id => errors.push(Violation::new(CREATE_WITH_ID_MESSAGE)),
        Operation::Update if !has_id => errors.push(Violation::new(UPDATE_WITHOUT_ID_MESSAGE)),
        Operation::Delete if !has_id => errors.push(Violation::new(DELETE_WITHOUT_ID_MESSAGE)),
        Operation::Undelete => {
            if !has_id {
                errors.push(Violation::new(UNDELETE_WITHOUT_ID_MESSAGE));
            }
            if entity.soft_deletion().is_none() {
                errors.push(Violation::new(UNDELETE_UNSUPPORTED_MESSAGE));
            }
        }
        _ => {}
    }
    errors
}

impl<E: DomainEntity, S: ObjectStore> Clone for Domain<E, S> {
    fn clone(&self) -> Self {
        Self {
            class: self.class,
            alias: self.alias.clone(),
            store: self.store.clone(),
            validator: self.validator.clone(),
            events: self.events.clone(),
            factory: self.factory.clone(),
            debug: self.debug,
        }
    }
}

impl<E: DomainEntity, S: ObjectStore> fmt::Debug for Domain<E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Domain")
            .field("class", &self.class)
            .field("alias", &self.alias)
            .field("debug", &self.debug)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::events::EventDispatcher;
    use crate::framework::mock::MemoryStore;
    use crate::model::{Product, ProductId, User, UserId};

    fn domain<E: DomainEntity>() -> Domain<E, MemoryStore> {
        let mut store = MemoryStore::new();
        store.manage::<User>("users").manage::<Product>("products");
        Domain::new(
            "test",
            Arc::new(Mutex::new(store)),
            Arc::new(EventDispatcher::new()),
        )
    }

    #[test]
    fn test_identity_errors() {
        let mut user = User::new("Alice", "alice@example.com");
        assert!(identity_errors(&user, Operation::Create).is_empty());
        assert_eq!(
            identity_errors(&user, Operation::Update),
            vec![Violation::new(UPDATE_WITHOUT_ID_MESSAGE)]
        );
        assert!(identity_errors(&user, Operation::Upsert).is_empty());

        user.id = Some(UserId(4));
        assert_eq!(
            identity_errors(&user, Operation::Create),
            vec![Violation::new(CREATE_WITH_ID_MESSAGE)]
        );
        assert_eq!(
            identity_errors(&user, Operation::Undelete),
            vec![Violation::new(UNDELETE_UNSUPPORTED_MESSAGE)]
        );

        let product = Product::new("Widget", 1.0, 1);
        assert_eq!(
            identity_errors(&product, Operation::Undelete),
            vec![Violation::new(UNDELETE_WITHOUT_ID_MESSAGE)]
        );
    }

    #[test]
    fn test_upsert_decides_status_from_identifier() {
        let users = domain::<User>();
        let created = users.upsert(User::new("Alice", "alice@example.com")).unwrap();
        assert_eq!(created.status(), ResourceStatus::Created);

        let mut alice = created.into_entity();
        alice.name = "Alice B.".to_string();
        let updated = users.upsert(alice).unwrap();
        assert_eq!(updated.status(), ResourceStatus::Updated);
    }

    #[test]
    fn test_undelete_unknown_id_reports_not_found_first() {
        let users = domain::<User>();
        let record = users.undelete(Identifier::Id(UserId(42))).unwrap();
        assert_eq!(record.status(), ResourceStatus::Error);
        assert_eq!(
            record.errors(),
            &[
                Violation::new(not_found_message(&UserId(42))),
                Violation::new(UNDELETE_UNSUPPORTED_MESSAGE),
            ]
        );

        let products = domain::<Product>();
        let record = products.undelete(Identifier::Id(ProductId(7))).unwrap();
        assert_eq!(
            record.errors(),
            &[Violation::new(
                "The resource with the identifier \"7\" does not exist"
            )]
        );
    }

    #[test]
    fn test_new_instance_merges_options() {
        let products = domain::<Product>();
        let product = products
            .new_instance(&serde_json::json!({ "name": "Gadget" }))
            .unwrap();
        assert_eq!(product.name, "Gadget");
        assert!(product.id.is_none());
    }
}
