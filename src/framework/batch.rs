//! # Resource Batches
//!
//! A [`ResourceBatch`] is what every batch operation returns: the records in the
//! caller's input order, plus errors that belong to the batch as a whole (a failed
//! final commit cannot be pinned on a single record).

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::sync::OnceLock;

use crate::framework::error::DomainError;
use crate::framework::resource::{ResourceRecord, ResourceStatus, Violation};

/// Aggregate status of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    Canceled,
    Error,
    Successful,
    Mixed,
}

impl Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BatchStatus::Pending => "pending",
            BatchStatus::Canceled => "canceled",
            BatchStatus::Error => "error",
            BatchStatus::Successful => "successful",
            BatchStatus::Mixed => "mixed",
        };
        f.write_str(name)
    }
}

/// Ordered records of one batch call.
#[derive(Debug)]
pub struct ResourceBatch<E> {
    records: Vec<ResourceRecord<E>>,
    errors: Vec<Violation>,
    // Cached aggregate; reset on every mutable access to `records`.
    status: OnceLock<BatchStatus>,
}

impl<E> Default for ResourceBatch<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> ResourceBatch<E> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            errors: Vec::new(),
            status: OnceLock::new(),
        }
    }

    pub fn add(&mut self, record: ResourceRecord<E>) {
        self.invalidate();
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the record at `index`, or `OutOfRange`.
    pub fn get(&self, index: usize) -> Result<&ResourceRecord<E>, DomainError> {
        let len = self.records.len();
        self.records
            .get(index)
            .ok_or(DomainError::OutOfRange { index, len })
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut ResourceRecord<E>, DomainError> {
        self.invalidate();
        let len = self.records.len();
        self.records
            .get_mut(index)
            .ok_or(DomainError::OutOfRange { index, len })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResourceRecord<E>> {
        self.records.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, ResourceRecord<E>> {
        self.invalidate();
        self.records.iter_mut()
    }

    pub fn into_records(self) -> Vec<ResourceRecord<E>> {
        self.records
    }

    /// Batch-level errors (not attributable to one record).
    pub fn errors(&self) -> &[Violation] {
        &self.errors
    }

    pub fn add_batch_error(&mut self, violation: Violation) {
        self.errors.push(violation);
    }

    /// Attaches `violations` to the batch and marks every record `Error`.
    pub fn fail_all(&mut self, violations: impl IntoIterator<Item = Violation>) {
        self.errors.extend(violations);
        for record in self.iter_mut() {
            record.set_status(ResourceStatus::Error);
        }
    }

    /// Aggregate status of the contained records.
    ///
    /// - empty batch: `Successful`
    /// - every record `Pending`, `Canceled` or `Error`: that status
    /// - every record in a success status (any mix): `Successful`
    /// - only `Error` and `Canceled` records: `Error`
    /// - anything else: `Mixed`
    pub fn status(&self) -> BatchStatus {
        *self
            .status
            .get_or_init(|| Self::compute_status(&self.records))
    }

    /// True when the batch carries its own errors or any record failed.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
            || self
                .records
                .iter()
                .any(|r| r.status() == ResourceStatus::Error && !r.is_valid())
    }

    fn invalidate(&mut self) {
        self.status.take();
    }

    fn compute_status(records: &[ResourceRecord<E>]) -> BatchStatus {
        let Some(first) = records.first() else {
            return BatchStatus::Successful;
        };

        if records.iter().all(|r| r.status() == first.status()) {
            match first.status() {
                ResourceStatus::Pending => return BatchStatus::Pending,
                ResourceStatus::Canceled => return BatchStatus::Canceled,
                ResourceStatus::Error => return BatchStatus::Error,
                _ => {}
            }
        }

        if records.iter().all(|r| r.status().is_success()) {
            return BatchStatus::Successful;
        }

        // A canceled transactional batch: the failures plus what they canceled
        if records
            .iter()
            .all(|r| matches!(r.status(), ResourceStatus::Error | ResourceStatus::Canceled))
        {
            BatchStatus::Error
        } else {
            BatchStatus::Mixed
        }
    }
}

impl<E> FromIterator<ResourceRecord<E>> for ResourceBatch<E> {
    fn from_iter<I: IntoIterator<Item = ResourceRecord<E>>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
            errors: Vec::new(),
            status: OnceLock::new(),
        }
    }
}

impl<E> IntoIterator for ResourceBatch<E> {
    type Item = ResourceRecord<E>;
    type IntoIter = std::vec::IntoIter<ResourceRecord<E>>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a, E> IntoIterator for &'a ResourceBatch<E> {
    type Item = &'a ResourceRecord<E>;
    type IntoIter = std::slice::Iter<'a, ResourceRecord<E>>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch_with(statuses: &[ResourceStatus]) -> ResourceBatch<u32> {
        statuses
            .iter()
            .enumerate()
            .map(|(i, status)| {
                let mut record = ResourceRecord::new(i as u32);
                record.set_status(*status);
                record
            })
            .collect()
    }

    #[test]
    fn test_empty_batch_is_successful() {
        let batch: ResourceBatch<u32> = ResourceBatch::new();
        assert_eq!(batch.status(), BatchStatus::Successful);
        assert!(!batch.has_errors());
        assert!(batch.is_empty());
    }

    #[test]
    fn test_uniform_non_success_statuses() {
        use ResourceStatus::*;
        assert_eq!(batch_with(&[Pending, Pending]).status(), BatchStatus::Pending);
        assert_eq!(batch_with(&[Canceled]).status(), BatchStatus::Canceled);
        assert_eq!(batch_with(&[Error, Error]).status(), BatchStatus::Error);
    }

    #[test]
    fn test_mixed_success_statuses_are_successful() {
        use ResourceStatus::*;
        let batch = batch_with(&[Created, Updated, Deleted, Undeleted]);
        assert_eq!(batch.status(), BatchStatus::Successful);
    }

    #[test]
    fn test_mixed_statuses() {
        use ResourceStatus::*;
        assert_eq!(batch_with(&[Error, Created]).status(), BatchStatus::Mixed);
        assert_eq!(batch_with(&[Pending, Created]).status(), BatchStatus::Mixed);
        assert_eq!(batch_with(&[Canceled, Created]).status(), BatchStatus::Mixed);
        assert_eq!(batch_with(&[Pending, Canceled]).status(), BatchStatus::Mixed);
    }

    #[test]
    fn test_errors_with_canceled_records_are_error() {
        use ResourceStatus::*;
        assert_eq!(batch_with(&[Error, Canceled]).status(), BatchStatus::Error);
        assert_eq!(batch_with(&[Canceled, Error, Canceled]).status(), BatchStatus::Error);
        assert_eq!(batch_with(&[Error, Canceled, Created]).status(), BatchStatus::Mixed);
    }

    #[test]
    fn test_batch_is_shareable_across_threads() {
        let batch = batch_with(&[ResourceStatus::Created, ResourceStatus::Error]);
        let status = std::thread::scope(|scope| {
            scope.spawn(|| batch.status()).join().unwrap()
        });
        assert_eq!(status, BatchStatus::Mixed);
    }

    #[test]
    fn test_status_cache_is_invalidated_on_mutation() {
        let mut batch = batch_with(&[ResourceStatus::Created]);
        assert_eq!(batch.status(), BatchStatus::Successful);

        batch.get_mut(0).unwrap().set_status(ResourceStatus::Error);
        assert_eq!(batch.status(), BatchStatus::Error);

        batch.add(ResourceRecord::new(7));
        assert_eq!(batch.status(), BatchStatus::Mixed);
    }

    #[test]
    fn test_get_out_of_range() {
        let batch = batch_with(&[ResourceStatus::Created]);
        assert!(batch.get(0).is_ok());
        match batch.get(3) {
            Err(DomainError::OutOfRange { index, len }) => {
                assert_eq!(index, 3);
                assert_eq!(len, 1);
            }
            other => panic!("Expected OutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_has_errors() {
        let mut batch = batch_with(&[ResourceStatus::Created, ResourceStatus::Error]);
        assert!(batch.has_errors());

        let mut clean = batch_with(&[ResourceStatus::Created]);
        assert!(!clean.has_errors());
        clean.add_batch_error(Violation::new("commit failed"));
        assert!(clean.has_errors());

        batch.get_mut(1).unwrap().set_status(ResourceStatus::Canceled);
        assert!(!batch.has_errors());
    }

    #[test]
    fn test_fail_all() {
        let mut batch = batch_with(&[ResourceStatus::Created, ResourceStatus::Updated]);
        batch.fail_all(vec![Violation::new("Database invalid query")]);

        assert_eq!(batch.status(), BatchStatus::Error);
        assert_eq!(batch.errors().len(), 1);
        assert!(batch.iter().all(|r| r.status() == ResourceStatus::Error));
    }
}
