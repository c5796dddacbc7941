//! # Domain Registry
//!
//! Resolves domains by entity type or by alias. Domains are built lazily by a
//! [`DomainFactory`] bound to the shared store and event dispatcher, then cached:
//! one domain per entity type and registry.
//!
//! ```ignore
//! let registry = DomainRegistry::new(DomainFactory::new(store, events, false));
//! registry.register_alias::<User>("user")?;
//!
//! let users = registry.get::<User>()?;
//! let same = registry.get_by_alias::<User>("user")?;
//! assert!(Arc::ptr_eq(&users, &same));
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

use crate::framework::domain::Domain;
use crate::framework::entity::{default_alias, short_type_name, DomainEntity};
use crate::framework::error::DomainError;
use crate::framework::events::EventDispatcher;
use crate::framework::store::ObjectStore;

// =============================================================================
// DOMAIN FACTORY
// =============================================================================

/// Builds domains wired to one store and one event dispatcher.
pub struct DomainFactory<S: ObjectStore> {
    store: Arc<Mutex<S>>,
    events: Arc<EventDispatcher>,
    debug: bool,
}

impl<S: ObjectStore> DomainFactory<S> {
    pub fn new(store: Arc<Mutex<S>>, events: Arc<EventDispatcher>, debug: bool) -> Self {
        Self {
            store,
            events,
            debug,
        }
    }

    /// Builds a domain for `E`. Fails with `UnmanagedClass` when the store does not
    /// map `E`.
    pub fn create<E: DomainEntity>(
        &self,
        alias: impl Into<String>,
    ) -> Result<Domain<E, S>, DomainError> {
        self.store
            .lock()
            .map_err(|_| DomainError::StoreUnavailable)?
            .metadata::<E>()?;

        Ok(Domain::new(alias, self.store.clone(), self.events.clone()).with_debug(self.debug))
    }

    pub fn store(&self) -> &Arc<Mutex<S>> {
        &self.store
    }

    pub fn events(&self) -> &Arc<EventDispatcher> {
        &self.events
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

#[derive(Default)]
struct RegistryState {
    domains: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    /// alias -> (entity type, short class name)
    aliases: HashMap<String, (TypeId, &'static str)>,
    /// entity type -> alias its domain is built with
    primary: HashMap<TypeId, String>,
}

impl RegistryState {
    fn claim_alias<E: DomainEntity>(&mut self, alias: &str) -> Result<(), DomainError> {
        let type_id = TypeId::of::<E>();
        match self.aliases.get(alias) {
            Some((owner, _)) if *owner != type_id => {
                Err(DomainError::DuplicateAlias(alias.to_string()))
            }
            Some(_) => Ok(()),
            None => {
                self.aliases
                    .insert(alias.to_string(), (type_id, short_type_name::<E>()));
                self.primary
                    .entry(type_id)
                    .or_insert_with(|| alias.to_string());
                Ok(())
            }
        }
    }
}

/// Cache of domains keyed by entity type, with alias lookup.
pub struct DomainRegistry<S: ObjectStore> {
    factory: DomainFactory<S>,
    state: RwLock<RegistryState>,
}

impl<S: ObjectStore> DomainRegistry<S> {
    pub fn new(factory: DomainFactory<S>) -> Self {
        Self {
            factory,
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// Maps `alias` to `E`. The first alias of a type names its domain.
    pub fn register_alias<E: DomainEntity>(&self, alias: &str) -> Result<(), DomainError> {
        self.write()?.claim_alias::<E>(alias)?;
        debug!(alias, class = short_type_name::<E>(), "Alias registered");
        Ok(())
    }

    /// Registers a prebuilt domain, e.g. one with a custom validator.
    pub fn add<E: DomainEntity>(
        &self,
        domain: Domain<E, S>,
    ) -> Result<Arc<Domain<E, S>>, DomainError> {
        let type_id = TypeId::of::<E>();
        let mut state = self.write()?;
        if state.domains.contains_key(&type_id) {
            return Err(DomainError::DuplicateDomain(domain.class().to_string()));
        }
        state.claim_alias::<E>(domain.alias())?;

        let domain = Arc::new(domain);
        state.domains.insert(type_id, domain.clone());
        info!(alias = domain.alias(), class = domain.class(), "Domain added");
        Ok(domain)
    }

    pub fn contains<E: DomainEntity>(&self) -> bool {
        self.read()
            .map(|state| state.domains.contains_key(&TypeId::of::<E>()))
            .unwrap_or(false)
    }

    /// Returns the domain of `E`, building it on first use.
    pub fn get<E: DomainEntity>(&self) -> Result<Arc<Domain<E, S>>, DomainError> {
        let type_id = TypeId::of::<E>();
        if let Some(domain) = self.read()?.domains.get(&type_id).cloned() {
            return downcast::<E, S>(domain);
        }

        let mut state = self.write()?;
        if let Some(domain) = state.domains.get(&type_id).cloned() {
            return downcast::<E, S>(domain);
        }

        let alias = match state.primary.get(&type_id) {
            Some(alias) => alias.clone(),
            None => {
                let alias = default_alias::<E>();
                state.claim_alias::<E>(&alias)?;
                alias
            }
        };
        let domain = Arc::new(self.factory.create::<E>(alias)?);
        state.domains.insert(type_id, domain.clone());
        debug!(alias = domain.alias(), class = domain.class(), "Domain built");
        Ok(domain)
    }

    /// Returns the domain registered under `alias`, which must manage `E`.
    pub fn get_by_alias<E: DomainEntity>(
        &self,
        alias: &str,
    ) -> Result<Arc<Domain<E, S>>, DomainError> {
        let (type_id, class) = self
            .read()?
            .aliases
            .get(alias)
            .copied()
            .ok_or_else(|| DomainError::UnknownAlias(alias.to_string()))?;

        if type_id != TypeId::of::<E>() {
            return Err(DomainError::TypeMismatch {
                expected: short_type_name::<E>(),
                found: class.to_string(),
            });
        }
        self.get::<E>()
    }

    /// Class name registered under `alias`.
    pub fn class_for_alias(&self, alias: &str) -> Option<&'static str> {
        self.read()
            .ok()
            .and_then(|state| state.aliases.get(alias).map(|(_, class)| *class))
    }

    /// Registered aliases, sorted.
    pub fn aliases(&self) -> Vec<String> {
        let mut aliases: Vec<String> = self
            .read()
            .map(|state| state.aliases.keys().cloned().collect())
            .unwrap_or_default();
        aliases.sort();
        aliases
    }

    /// Drops the cached domain of `E`. Aliases stay registered.
    pub fn remove<E: DomainEntity>(&self) -> Result<bool, DomainError> {
        Ok(self.write()?.domains.remove(&TypeId::of::<E>()).is_some())
    }

    /// Drops every cached domain.
    pub fn clear(&self) -> Result<(), DomainError> {
        self.write()?.domains.clear();
        Ok(())
    }

    pub fn factory(&self) -> &DomainFactory<S> {
        &self.factory
    }

    pub fn store(&self) -> &Arc<Mutex<S>> {
        self.factory.store()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, RegistryState>, DomainError> {
        self.state.read().map_err(|_| DomainError::RegistryUnavailable)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, RegistryState>, DomainError> {
        self.state.write().map_err(|_| DomainError::RegistryUnavailable)
    }
}

fn downcast<E: DomainEntity, S: ObjectStore>(
    domain: Arc<dyn Any + Send + Sync>,
) -> Result<Arc<Domain<E, S>>, DomainError> {
    domain
        .downcast::<Domain<E, S>>()
        .map_err(|_| DomainError::TypeMismatch {
            expected: short_type_name::<Domain<E, S>>(),
            found: "unknown domain".to_string(),
        })
}
