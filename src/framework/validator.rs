//! Validation collaborator.

use crate::framework::entity::{DomainEntity, Operation};
use crate::framework::resource::Violation;

/// Validates an entity before it is staged for persistence.
///
/// The operation is the effective one: an upsert is validated as `Create` or
/// `Update` depending on whether the entity has an identifier.
///
/// Closures `Fn(&E, Operation) -> Vec<Violation>` implement this trait.
pub trait Validator<E>: Send + Sync {
    fn validate(&self, entity: &E, operation: Operation) -> Vec<Violation>;
}

impl<E, F> Validator<E> for F
where
    F: Fn(&E, Operation) -> Vec<Violation> + Send + Sync,
{
    fn validate(&self, entity: &E, operation: Operation) -> Vec<Violation> {
        self(entity, operation)
    }
}

/// Default validator: the entity's own [`DomainEntity::constraints`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityValidator;

impl<E: DomainEntity> Validator<E> for EntityValidator {
    fn validate(&self, entity: &E, operation: Operation) -> Vec<Violation> {
        entity.constraints(operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::User;

    #[test]
    fn test_entity_validator_uses_constraints() {
        let user = User::new("", "alice@example.com");
        let violations = EntityValidator.validate(&user, Operation::Create);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path.as_deref(), Some("name"));
    }

    #[test]
    fn test_closure_validator() {
        let validator = |user: &User, operation: Operation| {
            if operation == Operation::Update && user.email.ends_with("@example.org") {
                vec![Violation::at("email", "Domain not allowed")]
            } else {
                Vec::new()
            }
        };
        let user = User::new("Bob", "bob@example.org");
        assert!(validator.validate(&user, Operation::Create).is_empty());
        assert_eq!(validator.validate(&user, Operation::Update).len(), 1);
    }
}
