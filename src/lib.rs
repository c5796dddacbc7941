#![doc(html_logo_url = "https://www.rust-lang.org/logos/rust-logo-128x128.png")]
#![doc(html_favicon_url = "https://www.rust-lang.org/favicon.ico")]
//! # Resource Domain
//!
//! > **Batch persistence of resources, with an outcome for every item.**
//!
//! This crate wraps an object store (an ORM-like unit of work) in *domains* that run
//! create, update, upsert, delete and undelete over ordered batches of entities. Each
//! item gets its own status and errors; the batch gets an aggregate status.
//!
//! ## 🏗️ Design Philosophy
//!
//! Web controllers turn payloads into entities and need to answer, per item, "did this
//! one make it, and if not, why?". The domain answers that question:
//! - **Per-item outcome**: every input becomes a [`ResourceRecord`](framework::ResourceRecord)
//!   with a status (`created`, `error`, `canceled`, ...) and its violations.
//! - **Two commit strategies**: one transaction for the whole batch (all or nothing), or
//!   auto-commit (every valid item is flushed on its own).
//! - **Readable errors**: driver errors are translated into messages a client can show.
//!
//! ## 🚀 Core Concepts
//!
//! ### Generics: The Power of `E`
//! You'll see `Domain<E: DomainEntity, S: ObjectStore>` everywhere. The batch algorithm
//! is written **once** and works for Users, Products, and anything else implementing
//! [`DomainEntity`](framework::DomainEntity).
//!
//! ### Statuses
//! ```text
//! PENDING --(validation fails)--------------------------------> ERROR
//! PENDING --(validation passes, store accepts)----------------> CREATED | UPDATED | DELETED | UNDELETED
//! PENDING --(earlier item failed, one transaction)------------> CANCELED
//! PENDING --(earlier flush failed, auto-commit)---------------> ERROR
//! CREATED | UPDATED | ... --(one transaction, rolled back)------> CANCELED
//! ```
//!
//! ### Mocking: Testing without a Database
//! [`MemoryStore`](framework::mock::MemoryStore) is a complete in-memory store with
//! injectable failures. See the [`framework::mock`] module.
//!
//! ## 👩‍💻 Architecture Notes
//!
//! ### 1. Type-Safe Error Handling
//! Caller mistakes (wrong entity type, unknown alias, unmapped class) are
//! [`DomainError`](framework::DomainError)s. Data failures never are: they end up as
//! [`Violation`](framework::Violation)s on the records and the batch.
//!
//! ### 2. Synchronous by Design
//! A batch holds the store for its whole run; events are dispatched synchronously
//! with the store released, so listeners may use it.
//!
//! ### 3. Observability
//! We use `tracing` everywhere with structured logging. Every batch runs in its own span.
//! See the [`lifecycle::tracing`] module for details.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Engine ([`framework`])
//! - **Role**: The generic orchestrator and its collaborators.
//! - **Key items**: [`Domain`](framework::Domain), [`ResourceBatch`](framework::ResourceBatch),
//!   [`TransactionCoordinator`](framework::TransactionCoordinator),
//!   [`DomainRegistry`](framework::DomainRegistry).
//!
//! ### 2. The Composition Root ([`lifecycle`])
//! - **Role**: Wires store, events and registry together.
//! - **Key items**: [`ResourceSystem`](lifecycle::ResourceSystem).
//!
//! ### 3. The Implementation ([`user_domain`], [`product_domain`])
//! - **Role**: Concrete implementations of the `DomainEntity` trait for the [`model`] types.
//!
//! ## 🚀 Quick Start
//!
//! ### Running the Demo
//!
//! ```bash
//! # Run with info logs
//! RUST_LOG=info cargo run
//!
//! # Untranslated store errors, one flush per item
//! RESOURCE_DOMAIN_DEBUG=1 RESOURCE_DOMAIN_AUTO_COMMIT=1 RUST_LOG=info cargo run
//! ```
//!
//! ### Running Tests
//!
//! ```bash
//! cargo test
//! ```

pub mod framework;
pub mod lifecycle;
pub mod model;
pub mod product_domain;
pub mod user_domain;
