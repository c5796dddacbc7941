//! User-specific resource logic and entity implementation.

pub mod entity;

pub use entity::*;

use crate::framework::{Domain, EventSink, ObjectStore};
use crate::model::User;
use std::sync::{Arc, Mutex};

/// Alias the user domain is registered under.
pub const ALIAS: &str = "user";

/// Creates a new User domain on the given store.
pub fn new<S: ObjectStore>(
    store: Arc<Mutex<S>>,
    events: Arc<dyn EventSink<User>>,
) -> Domain<User, S> {
    Domain::new(ALIAS, store, events)
}
