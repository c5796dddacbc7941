//! Entity factory collaborator.

use serde_json::Value;

use crate::framework::entity::DomainEntity;
use crate::framework::error::DomainError;

/// Builds blank entity instances populated with defaults.
pub trait EntityFactory<E>: Send + Sync {
    /// `options` is a JSON object of field overrides, or `null`.
    fn create(&self, options: &Value) -> Result<E, DomainError>;
}

/// Starts from `E::default()` and merges the option fields over it through serde.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEntityFactory;

impl<E: DomainEntity> EntityFactory<E> for DefaultEntityFactory {
    fn create(&self, options: &Value) -> Result<E, DomainError> {
        let overrides = match options {
            Value::Null => return Ok(E::default()),
            Value::Object(map) => map,
            other => {
                return Err(DomainError::InvalidOptions(format!(
                    "expected a JSON object, got {}",
                    other
                )))
            }
        };

        let mut value = serde_json::to_value(E::default())?;
        match &mut value {
            Value::Object(fields) => {
                for (key, field) in overrides {
                    fields.insert(key.clone(), field.clone());
                }
            }
            _ => {
                return Err(DomainError::InvalidOptions(
                    "the entity does not serialize to a JSON object".to_string(),
                ))
            }
        }
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Product, User};
    use serde_json::json;

    #[test]
    fn test_null_options_give_default() {
        let user: User = DefaultEntityFactory.create(&Value::Null).unwrap();
        assert_eq!(user, User::default());
    }

    #[test]
    fn test_options_override_defaults() {
        let product: Product = DefaultEntityFactory
            .create(&json!({ "name": "Widget", "quantity": 4 }))
            .unwrap();
        assert_eq!(product.name, "Widget");
        assert_eq!(product.quantity, 4);
        assert_eq!(product.price, 0.0);
        assert!(product.id.is_none());
    }

    #[test]
    fn test_invalid_options() {
        let result: Result<User, _> = DefaultEntityFactory.create(&json!(["name"]));
        assert!(matches!(result, Err(DomainError::InvalidOptions(_))));

        let result: Result<Product, _> =
            DefaultEntityFactory.create(&json!({ "quantity": "many" }));
        assert!(matches!(result, Err(DomainError::Factory(_))));
    }
}
