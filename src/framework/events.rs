//! # Domain Events
//!
//! Every batch operation dispatches a `pre` and a `post` event named
//! `<alias>.<phase>_<operation>s` (e.g. `user.pre_creates`, `product.post_deletes`).
//! Dispatch is synchronous: listeners run in registration order before the batch
//! continues.
//!
//! [`EventDispatcher`] is the provided sink. Listeners are registered per event name
//! and typed by the entity, so a `User` listener only ever sees `User` batches.
//! Listeners must not register new listeners from inside a dispatch.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;
use tracing::{trace, warn};

use crate::framework::batch::ResourceBatch;
use crate::framework::entity::{DomainEntity, Operation};

/// Whether the event fires before or after the batch runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    Pre,
    Post,
}

impl fmt::Display for EventPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventPhase::Pre => f.write_str("pre"),
            EventPhase::Post => f.write_str("post"),
        }
    }
}

/// Builds the event name for a domain alias, e.g. `user.pre_creates`.
pub fn event_name(alias: &str, phase: EventPhase, operation: Operation) -> String {
    format!("{}.{}_{}", alias, phase, operation.plural())
}

/// Payload handed to listeners. Read-only view of the batch.
#[derive(Debug)]
pub struct ResourceEvent<'a, E> {
    /// Alias of the dispatching domain.
    pub domain: &'a str,
    /// Short type name of the entity.
    pub class: &'static str,
    pub operation: Operation,
    pub phase: EventPhase,
    pub batch: &'a ResourceBatch<E>,
}

/// Receives domain events. Fire-and-forget.
pub trait EventSink<E>: Send + Sync {
    fn dispatch(&self, name: &str, event: &ResourceEvent<'_, E>);
}

type Listener<E> = Box<dyn Fn(&ResourceEvent<'_, E>) + Send + Sync>;

/// Named, typed listener registry.
#[derive(Default)]
pub struct EventDispatcher {
    // Each entry holds a boxed `Listener<E>` for some `E`.
    listeners: RwLock<HashMap<String, Vec<Box<dyn Any + Send + Sync>>>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener for `name`, typed by the entity of the batches it sees.
    ///
    /// # Example
    /// ```ignore
    /// dispatcher.listen::<User, _>("user.post_creates", |event| {
    ///     println!("{} users processed", event.batch.len());
    /// });
    /// ```
    pub fn listen<E, F>(&self, name: impl Into<String>, listener: F)
    where
        E: DomainEntity,
        F: Fn(&ResourceEvent<'_, E>) + Send + Sync + 'static,
    {
        let name = name.into();
        let listener: Listener<E> = Box::new(listener);
        match self.listeners.write() {
            Ok(mut listeners) => listeners.entry(name).or_default().push(Box::new(listener)),
            Err(_) => warn!(event = %name, "Listener registry poisoned, listener dropped"),
        }
    }

    /// Number of listeners registered under `name`, all entity types included.
    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners
            .read()
            .map(|listeners| listeners.get(name).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

impl<E: DomainEntity> EventSink<E> for EventDispatcher {
    fn dispatch(&self, name: &str, event: &ResourceEvent<'_, E>) {
        let listeners = match self.listeners.read() {
            Ok(listeners) => listeners,
            Err(_) => {
                warn!(event = %name, "Listener registry poisoned, event dropped");
                return;
            }
        };

        let Some(registered) = listeners.get(name) else {
            trace!(event = %name, "No listeners");
            return;
        };

        for listener in registered {
            if let Some(listener) = listener.downcast_ref::<Listener<E>>() {
                listener(event);
            }
        }
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .listeners
            .read()
            .map(|listeners| listeners.keys().cloned().collect())
            .unwrap_or_default();
        f.debug_struct("EventDispatcher")
            .field("events", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::resource::ResourceRecord;
    use crate::model::{Product, User};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_event_name() {
        assert_eq!(
            event_name("user", EventPhase::Pre, Operation::Create),
            "user.pre_creates"
        );
        assert_eq!(
            event_name("blog_post", EventPhase::Post, Operation::Undelete),
            "blog_post.post_undeletes"
        );
    }

    #[test]
    fn test_dispatch_only_reaches_matching_type_and_name() {
        let dispatcher = EventDispatcher::new();
        let user_calls = Arc::new(AtomicUsize::new(0));
        let product_calls = Arc::new(AtomicUsize::new(0));

        let counter = user_calls.clone();
        dispatcher.listen::<User, _>("user.pre_creates", move |event| {
            counter.fetch_add(event.batch.len(), Ordering::SeqCst);
        });
        let counter = product_calls.clone();
        dispatcher.listen::<Product, _>("user.pre_creates", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let batch: ResourceBatch<User> =
            vec![ResourceRecord::new(User::new("Alice", "alice@example.com"))]
                .into_iter()
                .collect();
        let event = ResourceEvent {
            domain: "user",
            class: "User",
            operation: Operation::Create,
            phase: EventPhase::Pre,
            batch: &batch,
        };

        EventSink::<User>::dispatch(&dispatcher, "user.pre_creates", &event);
        EventSink::<User>::dispatch(&dispatcher, "user.post_creates", &event);

        assert_eq!(user_calls.load(Ordering::SeqCst), 1);
        assert_eq!(product_calls.load(Ordering::SeqCst), 0);
        assert_eq!(dispatcher.listener_count("user.pre_creates"), 2);
        assert_eq!(dispatcher.listener_count("user.post_creates"), 0);
    }
}
