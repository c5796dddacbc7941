//! # Observability & Tracing
//!
//! This module provides the tracing infrastructure for the resource domains.
//!
//! ## Overview
//!
//! The [`setup_tracing`] function initializes structured logging with the `tracing` crate.
//! Every batch runs inside a `batch` span carrying the domain alias, the operation,
//! the batch size and the commit strategy, so each log line can be tied to its batch.
//!
//! ## Configuration
//!
//! The framework uses a compact format that hides the crate/module prefix (`with_target(false)`).
//!
//! - **Configurable log levels** via `RUST_LOG` environment variable
//! - **Compact format** optimized for development
//!
//! ## What Gets Traced
//!
//! - **Batches**: start (`debug`), completion with the aggregate status (`info`, or
//!   `warn` when the batch carries errors)
//! - **Records**: failed records with their index and error count (`warn`)
//! - **Store**: transaction begin/commit/rollback (`debug`), failed store calls (`warn`)
//! - **Events**: dispatched event names (`debug`)
//!
//! ## Usage Examples
//!
//! ```bash
//! # Batch outcomes only
//! RUST_LOG=info cargo run
//!
//! # Transactions and dispatched events
//! RUST_LOG=debug cargo run
//!
//! # Filter to the framework
//! RUST_LOG=resource_domain::framework=debug cargo run
//! ```
//!
//! ## Workflow Trace Example
//!
//! **With `RUST_LOG=info`**, an auto-commit batch where the second user fails validation:
//!
//! ```text
//! WARN batch: Record failed index=1 errors=1 domain=user operation=create size=2 auto_commit=true
//! WARN batch: Batch completed with errors status=mixed domain=user operation=create size=2 auto_commit=true
//! ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // Module paths are noise; the batch span names the domain
        .compact() // Compact format shows spans inline (e.g., "batch: Batch completed")
        .init();
}
