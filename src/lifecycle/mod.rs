//! Composition root and observability setup.
//!
//! # Main Components
//!
//! - [`ResourceSystem`] - Wires the store, the event dispatcher and the registry
//!   together with the sample domains
//! - [`setup_tracing`] - Initializes the tracing/logging infrastructure

pub mod resource_system;
pub mod tracing;

pub use resource_system::*;
pub use tracing::*;
