//! # Transaction Coordinator
//!
//! Owns the transaction boundaries of one batch. In auto-commit mode every
//! successful record is flushed on its own ([`TransactionCoordinator::commit_one`]);
//! otherwise a single transaction spans the batch and is either committed
//! ([`TransactionCoordinator::commit_all`]) or rolled back
//! ([`TransactionCoordinator::cancel_all`]).
//!
//! Store failures never escape: they come back as translated [`Violation`]s.

use tracing::{debug, warn};

use crate::framework::entity::DomainEntity;
use crate::framework::error::StoreError;
use crate::framework::resource::Violation;
use crate::framework::store::ObjectStore;
use crate::framework::translator::ErrorTranslator;

pub struct TransactionCoordinator<'s, S: ObjectStore> {
    store: &'s mut S,
    auto_commit: bool,
    translator: ErrorTranslator,
}

impl<'s, S: ObjectStore> TransactionCoordinator<'s, S> {
    pub fn new(store: &'s mut S, auto_commit: bool, debug: bool) -> Self {
        Self {
            store,
            auto_commit,
            translator: ErrorTranslator::new(debug),
        }
    }

    pub fn is_auto_commit(&self) -> bool {
        self.auto_commit
    }

    /// Opens the batch transaction unless in auto-commit mode.
    pub fn begin(&mut self) -> Vec<Violation> {
        if self.auto_commit {
            return Vec::new();
        }
        match self.store.begin() {
            Ok(()) => {
                debug!("Transaction started");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "Begin failed");
                self.translator.violations(&e)
            }
        }
    }

    /// Loads an entity, soft-deleted rows included.
    pub fn find<E: DomainEntity>(&mut self, id: &E::Id) -> Result<Option<E>, Vec<Violation>> {
        self.store.find::<E>(id).map_err(|e| self.failure(e))
    }

    pub fn persist<E: DomainEntity>(&mut self, entity: &mut E) -> Vec<Violation> {
        match self.store.persist(entity) {
            Ok(()) => Vec::new(),
            Err(e) => self.failure(e),
        }
    }

    pub fn remove<E: DomainEntity>(&mut self, entity: &E) -> Vec<Violation> {
        match self.store.remove(entity) {
            Ok(()) => Vec::new(),
            Err(e) => self.failure(e),
        }
    }

    /// Flushes the staged change of one record and detaches the entity.
    pub fn commit_one<E: DomainEntity>(&mut self, entity: &E) -> Vec<Violation> {
        let result = self.store.flush();
        self.store.detach(entity);
        match result {
            Ok(()) => Vec::new(),
            Err(e) => self.failure(e),
        }
    }

    /// Flushes and commits the whole batch. On failure the transaction is rolled
    /// back and the translated error is returned.
    pub fn commit_all(&mut self) -> Vec<Violation> {
        let result = self.store.flush().and_then(|_| {
            if self.store.in_transaction() {
                self.store.commit()
            } else {
                Ok(())
            }
        });

        match result {
            Ok(()) => {
                self.store.clear();
                debug!("Transaction committed");
                Vec::new()
            }
            Err(e) => {
                self.rollback();
                self.store.clear();
                self.failure(e)
            }
        }
    }

    /// Rolls back the batch transaction and forgets every staged change.
    pub fn cancel_all(&mut self) {
        self.rollback();
        self.store.clear();
        debug!("Transaction canceled");
    }

    /// Forgets the staged change of a failed record.
    pub fn detach<E: DomainEntity>(&mut self, entity: &E) {
        self.store.detach(entity);
    }

    fn rollback(&mut self) {
        if self.store.in_transaction() {
            if let Err(e) = self.store.rollback() {
                warn!(error = %e, "Rollback failed");
            }
        }
    }

    fn failure(&self, error: StoreError) -> Vec<Violation> {
        warn!(error = %error, "Store operation failed");
        self.translator.violations(&error)
    }
}
