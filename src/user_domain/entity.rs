//! DomainEntity trait implementation for the User type.
//!
//! See the trait implementation on [`User`] for the validation rules.

use crate::framework::{DomainEntity, Operation, Violation};
use crate::model::{User, UserId};

pub const BLANK_MESSAGE: &str = "This value should not be blank.";
pub const INVALID_EMAIL_MESSAGE: &str = "This value is not a valid email address.";

impl DomainEntity for User {
    type Id = UserId;

    fn id(&self) -> Option<&UserId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: UserId) {
        self.id = Some(id);
    }

    fn clear_id(&mut self) {
        self.id = None;
    }

    fn unique_fields() -> &'static [&'static str] {
        &["email"]
    }

    /// Validates the User entity.
    ///
    /// # Rules
    /// - `name`: must not be blank
    /// - `email`: must look like an address (`local@domain`)
    fn constraints(&self, _operation: Operation) -> Vec<Violation> {
        let mut violations = Vec::new();
        if self.name.trim().is_empty() {
            violations.push(Violation::at("name", BLANK_MESSAGE));
        }
        if !is_email(&self.email) {
            violations.push(Violation::at("email", INVALID_EMAIL_MESSAGE));
        }
        violations
    }
}

fn is_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}
