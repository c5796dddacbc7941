//! # Batch Inputs
//!
//! Batch operations accept either ready entities or form submissions. Both are
//! resolved once, when the batch is built, into `Pending` records so the
//! orchestration itself only ever sees entities.
//!
//! - [`Input`]: what create/update/upsert/delete accept.
//! - [`Submission`]: the type-erased result of binding a request payload to an
//!   entity, together with the binding errors.
//! - [`Identifier`]: what undelete accepts (an entity or its identifier).

use std::any::Any;
use std::fmt;

use crate::framework::entity::{short_type_name, DomainEntity};
use crate::framework::error::DomainError;
use crate::framework::resource::{ResourceRecord, Violation};

/// A form submission whose data is bound to some entity type.
pub struct Submission {
    data: Box<dyn Any + Send>,
    data_type: &'static str,
    errors: Vec<Violation>,
}

impl Submission {
    pub fn new<T: Any + Send>(data: T) -> Self {
        Self {
            data: Box::new(data),
            data_type: short_type_name::<T>(),
            errors: Vec::new(),
        }
    }

    /// Attaches binding errors; they end up on the resulting record.
    pub fn with_errors(mut self, errors: impl IntoIterator<Item = Violation>) -> Self {
        self.errors.extend(errors);
        self
    }

    pub fn add_error(&mut self, violation: Violation) {
        self.errors.push(violation);
    }

    pub fn errors(&self) -> &[Violation] {
        &self.errors
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Short name of the bound data type.
    pub fn data_type(&self) -> &'static str {
        self.data_type
    }

    /// Unwraps the submission into a record for `E`.
    ///
    /// Fails with `TypeMismatch` when the bound data is not an `E`.
    pub fn into_record<E: DomainEntity>(self) -> Result<ResourceRecord<E>, DomainError> {
        let Submission {
            data,
            data_type,
            errors,
        } = self;
        let entity = data.downcast::<E>().map_err(|_| DomainError::TypeMismatch {
            expected: short_type_name::<E>(),
            found: data_type.to_string(),
        })?;

        let mut record = ResourceRecord::new(*entity);
        record.add_errors(errors);
        Ok(record)
    }
}

impl fmt::Debug for Submission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Submission")
            .field("data_type", &self.data_type)
            .field("errors", &self.errors)
            .finish()
    }
}

/// One input item of a create/update/upsert/delete batch.
#[derive(Debug)]
pub enum Input<E> {
    Entity(E),
    Submission(Submission),
}

impl<E: DomainEntity> Input<E> {
    pub fn into_record(self) -> Result<ResourceRecord<E>, DomainError> {
        match self {
            Input::Entity(entity) => Ok(ResourceRecord::new(entity)),
            Input::Submission(submission) => submission.into_record(),
        }
    }
}

impl<E: DomainEntity> From<E> for Input<E> {
    fn from(entity: E) -> Self {
        Input::Entity(entity)
    }
}

impl<E> From<Submission> for Input<E> {
    fn from(submission: Submission) -> Self {
        Input::Submission(submission)
    }
}

/// One input item of an undelete batch.
#[derive(Debug)]
pub enum Identifier<E: DomainEntity> {
    /// Looked up in the object store, deleted rows included.
    Id(E::Id),
    Entity(E),
}

impl<E: DomainEntity> From<E> for Identifier<E> {
    fn from(entity: E) -> Self {
        Identifier::Entity(entity)
    }
}
