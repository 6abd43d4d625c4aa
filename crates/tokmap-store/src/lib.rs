//! Binding storage and the identifier resolution service for tokmap.
//!
//! The service maps a [`NamespacedKey`](tokmap_types::NamespacedKey) to an
//! opaque [`Token`](tokmap_types::Token) and back. A key is bound at most
//! once; a token, once issued, always resolves to the same key.
//!
//! # Modules
//!
//! - [`error`] — Error types for store operations
//! - [`traits`] — The [`BindingStore`] trait defining the storage interface
//! - [`generator`] — [`TokenGenerator`] and the default [`UuidV4Generator`]
//! - [`memory`] — Volatile [`InMemoryBindingStore`]
//! - [`journal`] — [`JournalBindingStore`], persisted as JSON lines
//! - [`resolver`] — [`IdentifierResolver`], the service handlers talk to

pub mod error;
pub mod generator;
mod indices;
pub mod journal;
pub mod memory;
pub mod resolver;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use generator::{TokenGenerator, UuidV4Generator};
pub use journal::{JournalBindingStore, JournalOptions};
pub use memory::InMemoryBindingStore;
pub use resolver::{IdentifierResolver, DEFAULT_MAX_MINT_ATTEMPTS};
pub use traits::{BindingStore, Issued};
