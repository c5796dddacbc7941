//! # Entity Contract
//!
//! Defines the [`DomainEntity`] trait that every persistent type implements to be
//! managed by a [`Domain`](crate::framework::Domain), and the optional
//! [`SoftDeletable`] capability.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display};
use std::hash::Hash;

use crate::framework::resource::Violation;

/// The batch operations a domain performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Update,
    Upsert,
    Delete,
    Undelete,
}

impl Operation {
    /// Singular name, e.g. `create`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Upsert => "upsert",
            Operation::Delete => "delete",
            Operation::Undelete => "undelete",
        }
    }

    /// Batch name used in event names, e.g. `creates`.
    pub fn plural(&self) -> &'static str {
        match self {
            Operation::Create => "creates",
            Operation::Update => "updates",
            Operation::Upsert => "upserts",
            Operation::Delete => "deletes",
            Operation::Undelete => "undeletes",
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability of entities that are deleted by stamping a timestamp instead of
/// removing their row.
pub trait SoftDeletable {
    fn deleted_at(&self) -> Option<DateTime<Utc>>;

    fn set_deleted_at(&mut self, deleted_at: Option<DateTime<Utc>>);

    fn is_deleted(&self) -> bool {
        self.deleted_at().is_some()
    }
}

/// Trait that any persistent type must implement to be managed by a `Domain`.
///
/// # Associated Types
/// `Id` is the identifier type. The object store generates identifiers for new
/// entities from a sequence, hence the `From<u64>` bound; `Display` gives the key the
/// store files the row under.
///
/// # Provided Methods (Hooks)
/// - [`DomainEntity::unique_fields`]: fields the store enforces uniqueness on.
/// - [`DomainEntity::constraints`]: entity-declared validation rules, used by
///   [`EntityValidator`](crate::framework::EntityValidator).
/// - [`DomainEntity::soft_deletion`] / [`DomainEntity::soft_deletion_mut`]: return
///   `Some(self)` from both when the type implements [`SoftDeletable`].
///
/// The blank instance produced by `Default` is what the entity factory starts from.
pub trait DomainEntity: Serialize + DeserializeOwned + Default + Debug + Send + 'static {
    type Id: Clone + Debug + Display + Eq + Hash + From<u64> + Send + Sync;

    /// The identifier, or `None` for an entity that was never persisted.
    fn id(&self) -> Option<&Self::Id>;

    /// Assigns the identifier. Called by the store when persisting a new entity.
    fn set_id(&mut self, id: Self::Id);

    /// Drops an identifier whose row was rolled back.
    fn clear_id(&mut self);

    fn unique_fields() -> &'static [&'static str] {
        &[]
    }

    fn constraints(&self, _operation: Operation) -> Vec<Violation> {
        Vec::new()
    }

    fn soft_deletion(&self) -> Option<&dyn SoftDeletable> {
        None
    }

    fn soft_deletion_mut(&mut self) -> Option<&mut dyn SoftDeletable> {
        None
    }
}

/// Extracts the type name without its module path
/// (e.g. `User` instead of `resource_domain::model::user::User`).
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    // Generic arguments keep their paths.
    let head = full.split('<').next().unwrap_or(full);
    let start = head.rfind("::").map(|i| i + 2).unwrap_or(0);
    &full[start..]
}

/// Default alias for an entity type: its short name in snake case
/// (`BlogPost` -> `blog_post`).
pub fn default_alias<T: ?Sized>() -> String {
    let name = short_type_name::<T>();
    let mut alias = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                alias.push('_');
            }
            alias.push(c.to_ascii_lowercase());
        } else if c.is_ascii_alphanumeric() {
            alias.push(c);
        } else {
            break;
        }
    }
    alias
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BlogPost;

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<BlogPost>(), "BlogPost");
        assert_eq!(short_type_name::<String>(), "String");
        assert_eq!(short_type_name::<u32>(), "u32");
    }

    #[test]
    fn test_default_alias() {
        assert_eq!(default_alias::<BlogPost>(), "blog_post");
        assert_eq!(default_alias::<String>(), "string");
    }

    #[test]
    fn test_operation_names() {
        assert_eq!(Operation::Create.to_string(), "create");
        assert_eq!(Operation::Undelete.plural(), "undeletes");
    }
}
