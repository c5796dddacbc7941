//! Product-specific resource logic: a soft-deletable catalog entry.

pub mod entity;

pub use entity::*;

use crate::framework::{Domain, EventSink, ObjectStore};
use crate::model::Product;
use std::sync::{Arc, Mutex};

/// Alias the product domain is registered under.
pub const ALIAS: &str = "product";

/// Creates a new Product domain on the given store.
pub fn new<S: ObjectStore>(
    store: Arc<Mutex<S>>,
    events: Arc<dyn EventSink<Product>>,
) -> Domain<Product, S> {
    Domain::new(ALIAS, store, events)
}
