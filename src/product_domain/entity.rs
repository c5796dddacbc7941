use chrono::{DateTime, Utc};

use crate::framework::{DomainEntity, Operation, SoftDeletable, Violation};
use crate::model::{Product, ProductId};

pub const BLANK_NAME_MESSAGE: &str = "This value should not be blank.";
pub const NEGATIVE_PRICE_MESSAGE: &str = "This value should be either positive or zero.";

impl DomainEntity for Product {
    type Id = ProductId;

    fn id(&self) -> Option<&ProductId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: ProductId) {
        self.id = Some(id);
    }

    fn clear_id(&mut self) {
        self.id = None;
    }

    fn constraints(&self, _operation: Operation) -> Vec<Violation> {
        let mut violations = Vec::new();
        if self.name.trim().is_empty() {
            violations.push(Violation::at("name", BLANK_NAME_MESSAGE));
        }
        if self.price < 0.0 || self.price.is_nan() {
            violations.push(Violation::at("price", NEGATIVE_PRICE_MESSAGE));
        }
        violations
    }

    fn soft_deletion(&self) -> Option<&dyn SoftDeletable> {
        Some(self)
    }

    fn soft_deletion_mut(&mut self) -> Option<&mut dyn SoftDeletable> {
        Some(self)
    }
}

impl SoftDeletable for Product {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn set_deleted_at(&mut self, deleted_at: Option<DateTime<Utc>>) {
        self.deleted_at = deleted_at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraints() {
        assert!(Product::new("Widget", 0.0, 0)
            .constraints(Operation::Create)
            .is_empty());

        let violations = Product::new("", -1.0, 3).constraints(Operation::Create);
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[1].path.as_deref(), Some("price"));
    }

    #[test]
    fn test_soft_deletion_capability() {
        let mut product = Product::new("Widget", 2.0, 1);
        assert!(!product.soft_deletion().map_or(true, |p| p.is_deleted()));

        if let Some(entity) = product.soft_deletion_mut() {
            entity.set_deleted_at(Some(Utc::now()));
        }
        assert!(product.deleted_at.is_some());
    }
}
