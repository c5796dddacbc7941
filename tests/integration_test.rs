use std::sync::{Arc, Mutex};

use resource_domain::framework::mock::MemoryStore;
use resource_domain::framework::{
    BatchStatus, DomainConfig, DomainError, Identifier, ResourceStatus, Violation,
};
use resource_domain::lifecycle::ResourceSystem;
use resource_domain::model::{Product, User};

/// Full end-to-end test through the composition root.
#[test]
fn test_full_resource_system_integration() {
    let system =
        ResourceSystem::in_memory(DomainConfig::default()).expect("Failed to build system");
    assert_eq!(system.registry().aliases(), vec!["product", "user"]);

    // Batch of users, one transaction
    let batch = system
        .users()
        .creates(
            vec![
                User::new("Alice", "alice@example.com"),
                User::new("Bob", "bob@example.com"),
            ],
            system.auto_commit(),
        )
        .expect("Failed to create users");
    assert_eq!(batch.status(), BatchStatus::Successful);

    // Product lifecycle: create, soft delete, restore, hard delete
    let product = system
        .products()
        .create(Product::new("Super Widget", 25.50, 100))
        .expect("Failed to create product")
        .into_entity();
    let id = product.id.expect("Product should have an id");

    let deleted = system
        .products()
        .delete(product, true)
        .expect("Failed to delete product");
    assert_eq!(deleted.status(), ResourceStatus::Deleted);

    let restored = system
        .products()
        .undelete(Identifier::Id(id))
        .expect("Failed to undelete product");
    assert_eq!(restored.status(), ResourceStatus::Undeleted);

    system
        .products()
        .delete(restored.into_entity(), false)
        .expect("Failed to remove product");

    let store = system.store().lock().unwrap();
    assert_eq!(store.count::<User>(), 2);
    assert_eq!(store.count::<Product>(), 0);
}

#[test]
fn test_registry_resolves_system_domains() {
    let system = ResourceSystem::in_memory(DomainConfig::default()).unwrap();
    let registry = system.registry();

    let users = registry.get_by_alias::<User>("user").unwrap();
    assert!(Arc::ptr_eq(&users, system.users()));
    assert!(Arc::ptr_eq(&registry.get::<Product>().unwrap(), system.products()));
    assert_eq!(registry.class_for_alias("product"), Some("Product"));

    assert!(matches!(
        registry.get_by_alias::<Product>("user"),
        Err(DomainError::TypeMismatch { .. })
    ));
    assert!(matches!(
        registry.add(resource_domain::user_domain::new(
            system.store().clone(),
            system.events().clone()
        )),
        Err(DomainError::DuplicateDomain(_))
    ));
}

#[test]
fn test_unmanaged_store_is_rejected() {
    let mut store = MemoryStore::new();
    store.manage::<User>("users");

    let result = ResourceSystem::new(store, DomainConfig::default());
    assert!(matches!(
        result,
        Err(DomainError::UnmanagedClass(class)) if class == "Product"
    ));
}

#[test]
fn test_events_are_dispatched_around_batches() {
    let system = ResourceSystem::in_memory(DomainConfig::default()).unwrap();
    let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    let pre = log.clone();
    system.events().listen::<User, _>("user.pre_creates", move |event| {
        let statuses: Vec<String> = event
            .batch
            .iter()
            .map(|r| r.status().to_string())
            .collect();
        pre.lock()
            .unwrap()
            .push(format!("{} {} {:?}", event.domain, event.phase, statuses));
    });

    let post = log.clone();
    let store = system.store().clone();
    system.events().listen::<User, _>("user.post_creates", move |event| {
        // The store is released while listeners run
        let rows = store.lock().unwrap().count::<User>();
        post.lock().unwrap().push(format!(
            "{} {} {} rows={}",
            event.class,
            event.phase,
            event.batch.status(),
            rows
        ));
    });

    let other = log.clone();
    system
        .events()
        .listen::<Product, _>("product.pre_deletes", move |_| {
            other.lock().unwrap().push("product".to_string());
        });

    system
        .users()
        .creates(
            vec![User::new("Alice", "alice@example.com"), User::new("", "x")],
            true,
        )
        .unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "user pre [\"pending\", \"pending\"]".to_string(),
            "User post mixed rows=1".to_string(),
        ]
    );
}

#[test]
fn test_auto_commit_from_config() {
    let config = DomainConfig {
        debug: true,
        auto_commit: true,
    };
    let system = ResourceSystem::in_memory(config).unwrap();
    assert!(system.auto_commit());
    assert!(system.users().is_debug());

    let batch = system
        .users()
        .creates(
            vec![
                User::new("", "blank@example.com"),
                User::new("Alice", "alice@example.com"),
            ],
            system.auto_commit(),
        )
        .unwrap();
    assert_eq!(batch.status(), BatchStatus::Mixed);
    assert_eq!(
        batch.get(0).unwrap().errors(),
        &[Violation::at("name", "This value should not be blank.")]
    );
}

#[test]
fn test_new_instance_from_options() {
    let system = ResourceSystem::in_memory(DomainConfig::default()).unwrap();
    let product = system
        .products()
        .new_instance(&serde_json::json!({ "name": "Gizmo", "price": 3.5 }))
        .unwrap();
    assert_eq!(product.name, "Gizmo");
    assert_eq!(product.price, 3.5);

    let record = system.products().create(product).unwrap();
    assert_eq!(record.status(), ResourceStatus::Created);
}
