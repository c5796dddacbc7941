use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a [`User`], generated by the object store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        UserId(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Represents a registered user in the system.
///
/// # Resource Domain
/// This struct implements the [`DomainEntity`](crate::framework::DomainEntity) trait,
/// allowing it to be managed by a [`Domain`](crate::framework::Domain).
/// The e-mail address is unique across users.
///
/// See [`impl DomainEntity for User`](#impl-DomainEntity-for-User) for the
/// validation rules.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<UserId>,
    pub name: String,
    pub email: String,
}

impl User {
    /// Creates a new, not yet persisted User.
    ///
    /// # Arguments
    /// * `name` - User's display name
    /// * `email` - User's email address
    ///
    /// # Notes
    /// The `id` field stays `None` until the object store persists the user.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
        }
    }
}
