//! The forward/reverse index pair shared by every store backend.
//!
//! `Indices` is never exposed on its own: each backend keeps one behind a
//! single lock so both maps always move together.

use std::collections::HashMap;

use tokmap_types::{Binding, NamespacedKey, Token};

use crate::error::{StoreError, StoreResult};
use crate::generator::TokenGenerator;

#[derive(Debug, Default)]
pub(crate) struct Indices {
    forward: HashMap<NamespacedKey, Binding>,
    reverse: HashMap<Token, NamespacedKey>,
}

/// Why a binding could not be inserted.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Conflict {
    KeyBound(Token),
    TokenBound(NamespacedKey),
}

impl Indices {
    pub(crate) fn lookup(&self, key: &NamespacedKey) -> Option<&Binding> {
        self.forward.get(key)
    }

    pub(crate) fn resolve(&self, token: &str) -> Option<&NamespacedKey> {
        self.reverse.get(token)
    }

    /// Draw candidates until one is well formed and unbound.
    pub(crate) fn mint(
        &self,
        generator: &dyn TokenGenerator,
        max_attempts: u32,
    ) -> StoreResult<Token> {
        for attempt in 1..=max_attempts {
            let candidate = generator.generate();
            if !candidate.is_well_formed() {
                tracing::warn!(attempt, "generator produced a malformed token");
                continue;
            }
            if self.reverse.contains_key(&candidate) {
                tracing::warn!(attempt, token = candidate.short_id(), "token collision");
                continue;
            }
            return Ok(candidate);
        }
        Err(StoreError::TokenSpaceExhausted {
            attempts: max_attempts,
        })
    }

    /// Insert a binding into both maps.
    ///
    /// Re-inserting an identical binding is a no-op. Anything that would
    /// break the one-token-per-key or one-key-per-token rule is refused
    /// without touching either map.
    pub(crate) fn insert(&mut self, binding: Binding) -> Result<(), Conflict> {
        if let Some(existing) = self.forward.get(&binding.key) {
            if existing.token == binding.token {
                return Ok(());
            }
            return Err(Conflict::KeyBound(existing.token.clone()));
        }
        if let Some(owner) = self.reverse.get(&binding.token) {
            return Err(Conflict::TokenBound(owner.clone()));
        }
        self.reverse.insert(binding.token.clone(), binding.key.clone());
        self.forward.insert(binding.key.clone(), binding);
        Ok(())
    }

    pub(crate) fn len(&self) -> usize {
        self.forward.len()
    }

    /// All bindings ordered by issue time, then token.
    pub(crate) fn bindings(&self) -> Vec<Binding> {
        let mut all: Vec<Binding> = self.forward.values().cloned().collect();
        all.sort_by(|a, b| {
            a.issued_at
                .cmp(&b.issued_at)
                .then_with(|| a.token.cmp(&b.token))
        });
        all
    }
}
