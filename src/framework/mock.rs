//! # Mock Framework
//!
//! An in-memory [`ObjectStore`] for the demo and for testing domains in isolation.
//!
//! [`MemoryStore`] keeps rows as JSON snapshots, stages changes in a unit of work
//! until [`flush`](ObjectStore::flush), enforces unique fields, and reports
//! failures the way a SQL driver does (a generic wrapper around a
//! `SQLSTATE[xxxxx]: detail` root cause).
//!
//! Failures can be injected with the expectation builders:
//!
//! ```ignore
//! let mut store = MemoryStore::new();
//! store.manage::<User>("users");
//! store.expect_flush().after(1).return_err(sql_error("08006", "Connection failure"));
//!
//! // First flush succeeds, second one fails...
//! store.verify(); // Ensures all expectations were met
//! ```
//!
//! Every call is recorded in a [`StoreCall`] log.

use serde_json::Value;
use std::any::TypeId;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use tracing::{debug, trace};

use crate::framework::entity::{short_type_name, DomainEntity};
use crate::framework::error::StoreError;
use crate::framework::store::{EntityMetadata, ObjectStore};

/// Builds a driver error the way SQL drivers chain them: a generic query error
/// caused by `SQLSTATE[<state>]: <detail>`.
pub fn sql_error(state: &str, detail: &str) -> StoreError {
    StoreError::driver(format!("SQLSTATE[{}]: {}", state, detail))
        .wrap("An exception occurred while executing a query")
}

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// Store call an injected failure is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    Begin,
    Flush,
    Commit,
}

struct Expectation {
    point: FailurePoint,
    skip: usize,
    error: StoreError,
}

/// Builder for an injected failure.
pub struct FailureBuilder<'a> {
    store: &'a mut MemoryStore,
    point: FailurePoint,
    skip: usize,
}

impl<'a> FailureBuilder<'a> {
    /// Lets `calls` calls succeed before failing.
    pub fn after(mut self, calls: usize) -> Self {
        self.skip = calls;
        self
    }

    pub fn return_err(self, error: StoreError) {
        self.store.expectations.push_back(Expectation {
            point: self.point,
            skip: self.skip,
            error,
        });
    }
}

/// One recorded store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Find { class: &'static str, id: String },
    Persist { class: &'static str, id: String },
    Remove { class: &'static str, id: String },
    Flush,
    Detach { class: &'static str },
    Clear,
    Begin,
    Commit,
    Rollback,
}

// =============================================================================
// MEMORY STORE
// =============================================================================

#[derive(Debug, Clone)]
enum Change {
    Save(Value),
    Delete,
}

#[derive(Debug, Clone)]
struct PendingChange {
    class: TypeId,
    key: String,
    change: Change,
}

#[derive(Debug, Clone)]
struct Table {
    metadata: EntityMetadata,
    rows: BTreeMap<String, Value>,
    sequence: u64,
}

/// In-memory object store with a unit of work and transactions.
#[derive(Default)]
pub struct MemoryStore {
    tables: HashMap<TypeId, Table>,
    pending: Vec<PendingChange>,
    snapshot: Option<HashMap<TypeId, Table>>,
    expectations: VecDeque<Expectation>,
    calls: Vec<StoreCall>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `E` to a table. Unique fields come from [`DomainEntity::unique_fields`].
    pub fn manage<E: DomainEntity>(&mut self, table: impl Into<String>) -> &mut Self {
        let metadata = EntityMetadata {
            class: short_type_name::<E>(),
            table: table.into(),
            unique_fields: E::unique_fields().to_vec(),
        };
        debug!(class = metadata.class, table = %metadata.table, "Managed");
        self.tables.insert(
            TypeId::of::<E>(),
            Table {
                metadata,
                rows: BTreeMap::new(),
                sequence: 0,
            },
        );
        self
    }

    pub fn expect_begin(&mut self) -> FailureBuilder<'_> {
        self.expect(FailurePoint::Begin)
    }

    pub fn expect_flush(&mut self) -> FailureBuilder<'_> {
        self.expect(FailurePoint::Flush)
    }

    pub fn expect_commit(&mut self) -> FailureBuilder<'_> {
        self.expect(FailurePoint::Commit)
    }

    /// Verifies that every injected failure was triggered.
    pub fn verify(&self) {
        if !self.expectations.is_empty() {
            panic!(
                "Not all expectations were met. {} remaining",
                self.expectations.len()
            );
        }
    }

    pub fn calls(&self) -> &[StoreCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Number of recorded calls matching `predicate`.
    pub fn count_calls(&self, predicate: impl Fn(&StoreCall) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }

    /// Stored rows of `E`, in key order.
    pub fn rows<E: DomainEntity>(&self) -> Vec<E> {
        self.tables
            .get(&TypeId::of::<E>())
            .map(|table| {
                table
                    .rows
                    .values()
                    .filter_map(|row| serde_json::from_value(row.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn count<E: DomainEntity>(&self) -> usize {
        self.tables
            .get(&TypeId::of::<E>())
            .map_or(0, |table| table.rows.len())
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn expect(&mut self, point: FailurePoint) -> FailureBuilder<'_> {
        FailureBuilder {
            store: self,
            point,
            skip: 0,
        }
    }

    /// Returns the injected error for this call, if any is due.
    fn injected(&mut self, point: FailurePoint) -> Result<(), StoreError> {
        let Some(index) = self.expectations.iter().position(|e| e.point == point) else {
            return Ok(());
        };
        if self.expectations[index].skip > 0 {
            self.expectations[index].skip -= 1;
            return Ok(());
        }
        match self.expectations.remove(index) {
            Some(expectation) => {
                trace!(?point, "Injected failure");
                Err(expectation.error)
            }
            None => Ok(()),
        }
    }

    fn table<E: DomainEntity>(&self) -> Result<&Table, StoreError> {
        self.tables
            .get(&TypeId::of::<E>())
            .ok_or_else(|| StoreError::UnmanagedClass(short_type_name::<E>().to_string()))
    }

    fn next_key<E: DomainEntity>(&mut self) -> Result<E::Id, StoreError> {
        let class = TypeId::of::<E>();
        let pending = &self.pending;
        let table = self
            .tables
            .get_mut(&class)
            .ok_or_else(|| StoreError::UnmanagedClass(short_type_name::<E>().to_string()))?;
        loop {
            table.sequence += 1;
            let id = E::Id::from(table.sequence);
            let key = id.to_string();
            let staged = pending.iter().any(|p| p.class == class && p.key == key);
            if !table.rows.contains_key(&key) && !staged {
                return Ok(id);
            }
        }
    }

    fn stage(&mut self, class: TypeId, key: String, change: Change) {
        self.pending.retain(|p| !(p.class == class && p.key == key));
        self.pending.push(PendingChange { class, key, change });
    }

    fn apply(
        tables: &mut HashMap<TypeId, Table>,
        pending: &[PendingChange],
    ) -> Result<(), StoreError> {
        for change in pending {
            let Some(table) = tables.get_mut(&change.class) else {
                continue;
            };
            match &change.change {
                Change::Save(row) => {
                    check_unique(table, &change.key, row)?;
                    table.rows.insert(change.key.clone(), row.clone());
                }
                Change::Delete => {
                    table.rows.remove(&change.key);
                }
            }
        }
        Ok(())
    }
}

fn check_unique(table: &Table, key: &str, row: &Value) -> Result<(), StoreError> {
    for field in &table.metadata.unique_fields {
        let value = match row.get(*field) {
            Some(Value::Null) | None => continue,
            Some(value) => value,
        };
        let taken = table
            .rows
            .iter()
            .any(|(other, existing)| other != key && existing.get(*field) == Some(value));
        if taken {
            return Err(sql_error(
                "23505",
                &format!(
                    "Unique violation: duplicate key value violates unique constraint \"{}_{}_unique\"",
                    table.metadata.table, field
                ),
            ));
        }
    }
    Ok(())
}

impl ObjectStore for MemoryStore {
    fn metadata<E: DomainEntity>(&self) -> Result<EntityMetadata, StoreError> {
        self.table::<E>().map(|table| table.metadata.clone())
    }

    fn find<E: DomainEntity>(&mut self, id: &E::Id) -> Result<Option<E>, StoreError> {
        let key = id.to_string();
        self.calls.push(StoreCall::Find {
            class: short_type_name::<E>(),
            id: key.clone(),
        });
        match self.table::<E>()?.rows.get(&key) {
            Some(row) => Ok(Some(serde_json::from_value(row.clone())?)),
            None => Ok(None),
        }
    }

    fn persist<E: DomainEntity>(&mut self, entity: &mut E) -> Result<(), StoreError> {
        self.table::<E>()?;
        if entity.id().is_none() {
            let id = self.next_key::<E>()?;
            entity.set_id(id);
        }
        let key = entity.id().map(|id| id.to_string()).unwrap_or_default();
        self.calls.push(StoreCall::Persist {
            class: short_type_name::<E>(),
            id: key.clone(),
        });
        let row = serde_json::to_value(&*entity)?;
        self.stage(TypeId::of::<E>(), key, Change::Save(row));
        Ok(())
    }

    fn remove<E: DomainEntity>(&mut self, entity: &E) -> Result<(), StoreError> {
        self.table::<E>()?;
        let key = entity.id().map(|id| id.to_string()).unwrap_or_default();
        self.calls.push(StoreCall::Remove {
            class: short_type_name::<E>(),
            id: key.clone(),
        });
        self.stage(TypeId::of::<E>(), key, Change::Delete);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        self.calls.push(StoreCall::Flush);
        let pending = std::mem::take(&mut self.pending);
        self.injected(FailurePoint::Flush)?;

        let mut tables = self.tables.clone();
        Self::apply(&mut tables, &pending)?;
        trace!(changes = pending.len(), "Flushed");
        self.tables = tables;
        Ok(())
    }

    fn detach<E: DomainEntity>(&mut self, entity: &E) {
        self.calls.push(StoreCall::Detach {
            class: short_type_name::<E>(),
        });
        if let Some(id) = entity.id() {
            let key = id.to_string();
            let class = TypeId::of::<E>();
            self.pending.retain(|p| !(p.class == class && p.key == key));
        }
    }

    fn clear(&mut self) {
        self.calls.push(StoreCall::Clear);
        self.pending.clear();
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        self.calls.push(StoreCall::Begin);
        self.injected(FailurePoint::Begin)?;
        if self.snapshot.is_some() {
            return Err(StoreError::driver("There is already an active transaction"));
        }
        self.snapshot = Some(self.tables.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.calls.push(StoreCall::Commit);
        if self.snapshot.is_none() {
            return Err(StoreError::NoActiveTransaction);
        }
        self.injected(FailurePoint::Commit)?;
        self.snapshot = None;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        self.calls.push(StoreCall::Rollback);
        let snapshot = self.snapshot.take().ok_or(StoreError::NoActiveTransaction)?;
        self.tables = snapshot;
        self.pending.clear();
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.snapshot.is_some()
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tables: Vec<(&str, usize)> = self
            .tables
            .values()
            .map(|table| (table.metadata.table.as_str(), table.rows.len()))
            .collect();
        f.debug_struct("MemoryStore")
            .field("tables", &tables)
            .field("pending", &self.pending.len())
            .field("in_transaction", &self.in_transaction())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::translator::ErrorTranslator;
    use crate::model::{Product, User, UserId};

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.manage::<User>("users").manage::<Product>("products");
        store
    }

    #[test]
    fn test_persist_assigns_id_and_flush_writes() {
        let mut store = store();
        let mut user = User::new("Alice", "alice@example.com");
        store.persist(&mut user).unwrap();
        assert_eq!(user.id, Some(UserId(1)));
        assert_eq!(store.count::<User>(), 0);

        store.flush().unwrap();
        assert_eq!(store.count::<User>(), 1);
        let found: Option<User> = store.find(&UserId(1)).unwrap();
        assert_eq!(found, Some(user));
    }

    #[test]
    fn test_unmanaged_class() {
        let mut store = MemoryStore::new();
        let mut user = User::new("Alice", "alice@example.com");
        assert!(matches!(
            store.persist(&mut user),
            Err(StoreError::UnmanagedClass(class)) if class == "User"
        ));
        assert!(store.metadata::<User>().is_err());
    }

    #[test]
    fn test_unique_violation_is_driver_error() {
        let mut store = store();
        let mut first = User::new("Alice", "alice@example.com");
        let mut second = User::new("Alicia", "alice@example.com");
        store.persist(&mut first).unwrap();
        store.flush().unwrap();
        store.persist(&mut second).unwrap();

        let error = store.flush().unwrap_err();
        assert_eq!(
            ErrorTranslator::default().translate(&error),
            "Unique violation: duplicate key value violates unique constraint \"users_email_unique\""
        );
        assert_eq!(store.count::<User>(), 1);
        assert_eq!(store.pending_count(), 0);
    }

    #[test]
    fn test_injected_flush_failure_after_calls() {
        let mut store = store();
        store
            .expect_flush()
            .after(1)
            .return_err(sql_error("08006", "Connection failure"));

        let mut first = User::new("Alice", "alice@example.com");
        store.persist(&mut first).unwrap();
        assert!(store.flush().is_ok());

        let mut second = User::new("Bob", "bob@example.com");
        store.persist(&mut second).unwrap();
        assert!(store.flush().is_err());
        assert_eq!(store.count::<User>(), 1);
        store.verify();
    }

    #[test]
    fn test_rollback_restores_rows() {
        let mut store = store();
        store.begin().unwrap();
        let mut product = Product::new("Widget", 2.5, 10);
        store.persist(&mut product).unwrap();
        store.flush().unwrap();
        assert_eq!(store.count::<Product>(), 1);

        store.rollback().unwrap();
        assert_eq!(store.count::<Product>(), 0);
        assert!(matches!(store.commit(), Err(StoreError::NoActiveTransaction)));
    }

    #[test]
    fn test_detach_and_remove() {
        let mut store = store();
        let mut user = User::new("Alice", "alice@example.com");
        store.persist(&mut user).unwrap();
        store.detach(&user);
        store.flush().unwrap();
        assert_eq!(store.count::<User>(), 0);

        store.persist(&mut user).unwrap();
        store.flush().unwrap();
        store.remove(&user).unwrap();
        store.flush().unwrap();
        assert_eq!(store.count::<User>(), 0);
        assert_eq!(
            store.count_calls(|call| matches!(call, StoreCall::Persist { .. })),
            2
        );
    }
}
