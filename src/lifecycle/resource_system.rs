use std::sync::{Arc, Mutex};
use tracing::info;

use crate::framework::mock::MemoryStore;
use crate::framework::{
    Domain, DomainConfig, DomainEntity, DomainError, DomainFactory, DomainRegistry,
    EventDispatcher, ObjectStore,
};
use crate::model::{Product, User};
use crate::{product_domain, user_domain};

/// The composition root of the resource domains.
///
/// `ResourceSystem` is responsible for:
/// - **Dependency Wiring**: One store and one event dispatcher shared by every domain
/// - **Registration**: The sample domains are added to a [`DomainRegistry`] under
///   their aliases
/// - **Configuration**: Debug mode and the default commit strategy come from
///   [`DomainConfig`]
///
/// # Example
///
/// ```ignore
/// let system = ResourceSystem::in_memory(DomainConfig::from_env()?)?;
///
/// system.events().listen::<User, _>("user.post_creates", |event| {
///     println!("{} users processed", event.batch.len());
/// });
///
/// let batch = system.users().creates(vec![alice, bob], system.auto_commit())?;
/// let record = system.products().delete(widget, true)?;
/// ```
pub struct ResourceSystem<S: ObjectStore = MemoryStore> {
    registry: DomainRegistry<S>,
    events: Arc<EventDispatcher>,
    config: DomainConfig,
    users: Arc<Domain<User, S>>,
    products: Arc<Domain<Product, S>>,
}

impl ResourceSystem<MemoryStore> {
    /// Creates a system on a fresh [`MemoryStore`] mapping `users` and `products`.
    pub fn in_memory(config: DomainConfig) -> Result<Self, DomainError> {
        let mut store = MemoryStore::new();
        store.manage::<User>("users").manage::<Product>("products");
        Self::new(store, config)
    }
}

impl<S: ObjectStore> ResourceSystem<S> {
    /// Creates a system on `store`, which must map both `User` and `Product`.
    pub fn new(store: S, config: DomainConfig) -> Result<Self, DomainError> {
        ensure_managed::<User, S>(&store)?;
        ensure_managed::<Product, S>(&store)?;

        let store = Arc::new(Mutex::new(store));
        let events = Arc::new(EventDispatcher::new());
        let registry = DomainRegistry::new(DomainFactory::new(
            store.clone(),
            events.clone(),
            config.debug,
        ));

        let users = registry
            .add(user_domain::new(store.clone(), events.clone()).with_debug(config.debug))?;
        let products = registry
            .add(product_domain::new(store, events.clone()).with_debug(config.debug))?;

        info!(aliases = ?registry.aliases(), ?config, "Resource system ready");
        Ok(Self {
            registry,
            events,
            config,
            users,
            products,
        })
    }

    pub fn users(&self) -> &Arc<Domain<User, S>> {
        &self.users
    }

    pub fn products(&self) -> &Arc<Domain<Product, S>> {
        &self.products
    }

    pub fn registry(&self) -> &DomainRegistry<S> {
        &self.registry
    }

    pub fn events(&self) -> &Arc<EventDispatcher> {
        &self.events
    }

    pub fn store(&self) -> &Arc<Mutex<S>> {
        self.registry.store()
    }

    pub fn config(&self) -> DomainConfig {
        self.config
    }

    /// Default commit strategy for batch calls.
    pub fn auto_commit(&self) -> bool {
        self.config.auto_commit
    }
}

fn ensure_managed<E: DomainEntity, S: ObjectStore>(store: &S) -> Result<(), DomainError> {
    store.metadata::<E>()?;
    Ok(())
}
