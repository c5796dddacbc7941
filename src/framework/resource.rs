//! # Resource Records
//!
//! A [`ResourceRecord`] is the outcome of one operation applied to one entity. It owns
//! the entity for the duration of the batch and collects every [`Violation`] raised
//! against it, whether by the validator or by the object store.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// A structured validation error: a message and an optional field path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Violation {
    /// A violation that is not attached to any field.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
            code: None,
        }
    }

    /// A violation attached to the field at `path`.
    pub fn at(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: Some(path.into()),
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}: {}", path, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Status of a single resource within a batch.
///
/// `Pending` is the only non-final state. `Canceled`, `Error` and the four success
/// statuses are never changed again once assigned, except by a late commit failure
/// which flips the whole batch to `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    Pending,
    Canceled,
    Error,
    Created,
    Updated,
    Deleted,
    Undeleted,
}

impl ResourceStatus {
    /// True for `Created`, `Updated`, `Deleted` and `Undeleted`.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            ResourceStatus::Created
                | ResourceStatus::Updated
                | ResourceStatus::Deleted
                | ResourceStatus::Undeleted
        )
    }
}

impl Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceStatus::Pending => "pending",
            ResourceStatus::Canceled => "canceled",
            ResourceStatus::Error => "error",
            ResourceStatus::Created => "created",
            ResourceStatus::Updated => "updated",
            ResourceStatus::Deleted => "deleted",
            ResourceStatus::Undeleted => "undeleted",
        };
        f.write_str(name)
    }
}

/// The tracked unit of work for one entity.
#[derive(Debug)]
pub struct ResourceRecord<E> {
    status: ResourceStatus,
    entity: E,
    errors: Vec<Violation>,
}

impl<E> ResourceRecord<E> {
    /// Wraps an entity in a `Pending` record.
    pub fn new(entity: E) -> Self {
        Self {
            status: ResourceStatus::Pending,
            entity,
            errors: Vec::new(),
        }
    }

    pub fn status(&self) -> ResourceStatus {
        self.status
    }

    pub fn set_status(&mut self, status: ResourceStatus) {
        self.status = status;
    }

    pub fn entity(&self) -> &E {
        &self.entity
    }

    pub fn entity_mut(&mut self) -> &mut E {
        &mut self.entity
    }

    pub fn into_entity(self) -> E {
        self.entity
    }

    pub fn errors(&self) -> &[Violation] {
        &self.errors
    }

    pub fn add_error(&mut self, violation: Violation) {
        self.errors.push(violation);
    }

    /// Appends violations; existing ones are kept.
    pub fn add_errors(&mut self, violations: impl IntoIterator<Item = Violation>) {
        self.errors.extend(violations);
    }

    /// True when no violation was recorded and the status is not `Error`.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.status != ResourceStatus::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_pending_and_valid() {
        let record = ResourceRecord::new("entity");
        assert_eq!(record.status(), ResourceStatus::Pending);
        assert!(record.errors().is_empty());
        assert!(record.is_valid());
    }

    #[test]
    fn test_add_errors_appends() {
        let mut record = ResourceRecord::new(1u32);
        record.add_error(Violation::new("first"));
        record.add_errors(vec![Violation::at("name", "second")]);

        assert_eq!(record.errors().len(), 2);
        assert_eq!(record.errors()[0].message, "first");
        assert_eq!(record.errors()[1].path.as_deref(), Some("name"));
        assert!(!record.is_valid());
    }

    #[test]
    fn test_error_status_is_invalid_without_violations() {
        let mut record = ResourceRecord::new(1u32);
        record.set_status(ResourceStatus::Error);
        assert!(!record.is_valid());
    }

    #[test]
    fn test_violation_display_and_serialization() {
        let violation = Violation::at("email", "This value is not a valid email address.")
            .with_code("invalid_email");
        assert_eq!(
            violation.to_string(),
            "email: This value is not a valid email address."
        );

        let json = serde_json::to_value(&violation).unwrap();
        assert_eq!(json["path"], "email");
        assert_eq!(json["code"], "invalid_email");

        let bare = serde_json::to_value(Violation::new("oops")).unwrap();
        assert!(bare.get("path").is_none());
    }

    #[test]
    fn test_success_statuses() {
        assert!(ResourceStatus::Created.is_success());
        assert!(ResourceStatus::Undeleted.is_success());
        assert!(!ResourceStatus::Canceled.is_success());
        assert!(!ResourceStatus::Pending.is_success());
        assert_eq!(ResourceStatus::Undeleted.to_string(), "undeleted");
    }
}
