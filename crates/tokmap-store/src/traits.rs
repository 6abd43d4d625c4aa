//! The [`BindingStore`] trait defining the storage interface.
//!
//! Any backend (in-memory, journaled file, database) implements this trait
//! to hold the key ↔ token bindings behind the resolver.

use tokmap_types::{Binding, NamespacedKey, Token};

use crate::error::StoreResult;
use crate::generator::TokenGenerator;

/// Result of an issue request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Issued {
    pub binding: Binding,
    /// `true` when this call created the binding, `false` when it already
    /// existed.
    pub created: bool,
}

impl Issued {
    pub fn token(&self) -> &Token {
        &self.binding.token
    }
}

/// Storage backend for bindings.
///
/// Implementations must be thread-safe (`Send + Sync`). The forward and
/// reverse indices must be updated as one unit: [`bind`](Self::bind) checks
/// for an existing binding, mints, and inserts under a single exclusive
/// section, so concurrent calls for the same unseen key create exactly one
/// binding.
pub trait BindingStore: Send + Sync {
    /// The token bound to `key`, if any.
    fn lookup(&self, key: &NamespacedKey) -> StoreResult<Option<Token>>;

    /// The key bound to `token`, if any. Accepts arbitrary strings.
    fn resolve(&self, token: &str) -> StoreResult<Option<NamespacedKey>>;

    /// Return the existing binding for `key`, or mint a fresh token with
    /// `generator` (at most `max_attempts` draws) and bind it.
    fn bind(
        &self,
        key: &NamespacedKey,
        generator: &dyn TokenGenerator,
        max_attempts: u32,
    ) -> StoreResult<Issued>;

    /// Number of bindings.
    fn len(&self) -> StoreResult<usize>;

    /// All bindings ordered by issue time.
    fn bindings(&self) -> StoreResult<Vec<Binding>>;

    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Whether [`bind`](Self::bind) may block on file I/O.
    fn is_durable(&self) -> bool {
        false
    }
}
