//! In-memory binding store.
//!
//! [`InMemoryBindingStore`] keeps both indices in one `RwLock`. Data is lost
//! when the store is dropped, which makes it the default for short-lived
//! processes where every token can be re-derived by issuing again.

use std::sync::RwLock;

use tokmap_types::{Binding, NamespacedKey, Token};

use crate::error::{StoreError, StoreResult};
use crate::generator::TokenGenerator;
use crate::indices::{Conflict, Indices};
use crate::traits::{BindingStore, Issued};

/// An in-memory implementation of [`BindingStore`].
#[derive(Debug, Default)]
pub struct InMemoryBindingStore {
    indices: RwLock<Indices>,
}

impl InMemoryBindingStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl BindingStore for InMemoryBindingStore {
    fn lookup(&self, key: &NamespacedKey) -> StoreResult<Option<Token>> {
        let indices = self.indices.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(indices.lookup(key).map(|b| b.token.clone()))
    }

    fn resolve(&self, token: &str) -> StoreResult<Option<NamespacedKey>> {
        let indices = self.indices.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(indices.resolve(token).cloned())
    }

    fn bind(
        &self,
        key: &NamespacedKey,
        generator: &dyn TokenGenerator,
        max_attempts: u32,
    ) -> StoreResult<Issued> {
        // Fast path: most requests are for keys that are already bound.
        {
            let indices = self.indices.read().map_err(|_| StoreError::LockPoisoned)?;
            if let Some(existing) = indices.lookup(key) {
                return Ok(Issued {
                    binding: existing.clone(),
                    created: false,
                });
            }
        }

        let mut indices = self.indices.write().map_err(|_| StoreError::LockPoisoned)?;
        // Another writer may have bound the key between the two locks.
        if let Some(existing) = indices.lookup(key) {
            return Ok(Issued {
                binding: existing.clone(),
                created: false,
            });
        }

        let token = indices.mint(generator, max_attempts)?;
        let binding = Binding::new(token, key.clone());
        match indices.insert(binding.clone()) {
            Ok(()) => Ok(Issued {
                binding,
                created: true,
            }),
            // Unreachable under the write lock: the key was checked and the
            // token was minted against the same snapshot.
            Err(Conflict::KeyBound(_)) | Err(Conflict::TokenBound(_)) => {
                Err(StoreError::TokenSpaceExhausted {
                    attempts: max_attempts,
                })
            }
        }
    }

    fn len(&self) -> StoreResult<usize> {
        let indices = self.indices.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(indices.len())
    }

    fn bindings(&self) -> StoreResult<Vec<Binding>> {
        let indices = self.indices.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(indices.bindings())
    }
}
