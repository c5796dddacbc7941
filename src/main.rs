//! # Resource Domain Demo
//!
//! Runs the sample domains on the in-memory store:
//! 1.  Creating a batch of [`User`]s, one of them invalid.
//! 2.  Creating a [`Product`], soft-deleting it and restoring it.
//! 3.  Listening to the domain events.

use resource_domain::framework::{DomainConfig, DomainError, Identifier, ResourceEvent};
use resource_domain::lifecycle::{setup_tracing, ResourceSystem};
use resource_domain::model::{Product, User};
use tracing::{info, warn};

fn main() -> Result<(), DomainError> {
    // Setup tracing once for the entire application
    setup_tracing();

    let config = DomainConfig::from_env()?;
    info!(?config, "Starting resource domain demo");

    let system = ResourceSystem::in_memory(config)?;
    system
        .events()
        .listen::<User, _>("user.post_creates", |event: &ResourceEvent<'_, User>| {
            info!(status = %event.batch.status(), size = event.batch.len(), "Users processed");
        });

    // Batch of users, the second one fails validation
    let users = vec![
        User::new("Alice", "alice@example.com"),
        User::new("", "bob"),
        User::new("Carol", "carol@example.com"),
    ];
    let batch = system.users().creates(users, system.auto_commit())?;
    for (index, record) in batch.iter().enumerate() {
        match record.errors() {
            [] => info!(index, status = %record.status(), "User"),
            errors => {
                for error in errors {
                    warn!(index, status = %record.status(), %error, "User");
                }
            }
        }
    }

    // Soft delete and restore a product
    let created = system.products().create(Product::new("Widget", 9.99, 25))?;
    info!(status = %created.status(), id = ?created.entity().id, "Product");

    let deleted = system.products().delete(created.into_entity(), true)?;
    info!(status = %deleted.status(), deleted_at = ?deleted.entity().deleted_at, "Product");

    let restored = system
        .products()
        .undelete(Identifier::Entity(deleted.into_entity()))?;
    info!(status = %restored.status(), deleted_at = ?restored.entity().deleted_at, "Product");

    info!("Demo completed");
    Ok(())
}
