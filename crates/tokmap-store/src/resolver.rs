//! The identifier resolution service.
//!
//! [`IdentifierResolver`] validates raw input, delegates to a
//! [`BindingStore`], and logs outcomes. One instance is created at startup
//! and shared by every request handler.

use std::sync::Arc;

use tokmap_types::{Binding, NamespacedKey};
use tracing::{debug, error, info};

use crate::error::{StoreError, StoreResult};
use crate::generator::{TokenGenerator, UuidV4Generator};
use crate::memory::InMemoryBindingStore;
use crate::traits::{BindingStore, Issued};

/// Default number of candidate tokens drawn before giving up.
pub const DEFAULT_MAX_MINT_ATTEMPTS: u32 = 8;

/// Issues opaque tokens for namespaced keys and resolves them back.
#[derive(Clone)]
pub struct IdentifierResolver {
    store: Arc<dyn BindingStore>,
    generator: Arc<dyn TokenGenerator>,
    max_mint_attempts: u32,
}

impl IdentifierResolver {
    pub fn new(store: Arc<dyn BindingStore>) -> Self {
        Self {
            store,
            generator: Arc::new(UuidV4Generator),
            max_mint_attempts: DEFAULT_MAX_MINT_ATTEMPTS,
        }
    }

    /// A resolver over a fresh [`InMemoryBindingStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryBindingStore::new()))
    }

    pub fn with_generator(mut self, generator: Arc<dyn TokenGenerator>) -> Self {
        self.generator = generator;
        self
    }

    /// Values below 1 are raised to 1.
    pub fn with_max_mint_attempts(mut self, attempts: u32) -> Self {
        self.max_mint_attempts = attempts.max(1);
        self
    }

    pub fn max_mint_attempts(&self) -> u32 {
        self.max_mint_attempts
    }

    /// Validate `kind` and `slug` from the wire and issue (or return) the
    /// token for that key.
    pub fn issue(&self, kind: &str, slug: &str) -> StoreResult<Issued> {
        let key = NamespacedKey::parse(kind, slug).map_err(|e| {
            debug!(kind, error = %e, "rejected issue request");
            StoreError::from(e)
        })?;
        self.issue_key(&key)
    }

    /// Issue (or return) the token for an already validated key.
    pub fn issue_key(&self, key: &NamespacedKey) -> StoreResult<Issued> {
        match self
            .store
            .bind(key, self.generator.as_ref(), self.max_mint_attempts)
        {
            Ok(issued) => {
                if issued.created {
                    info!(%key, token = issued.token().short_id(), "issued new token");
                }
                Ok(issued)
            }
            Err(e) => {
                error!(%key, error = %e, "failed to issue token");
                Err(e)
            }
        }
    }

    /// Look up the key behind `token`. Unknown tokens are `Ok(None)`.
    pub fn resolve(&self, token: &str) -> StoreResult<Option<NamespacedKey>> {
        let found = self.store.resolve(token)?;
        if found.is_none() {
            debug!(token, "token not found");
        }
        Ok(found)
    }

    /// Whether issuing may block on storage I/O.
    pub fn is_durable(&self) -> bool {
        self.store.is_durable()
    }

    pub fn len(&self) -> StoreResult<usize> {
        self.store.len()
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        self.store.is_empty()
    }

    pub fn bindings(&self) -> StoreResult<Vec<Binding>> {
        self.store.bindings()
    }
}

impl std::fmt::Debug for IdentifierResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentifierResolver")
            .field("max_mint_attempts", &self.max_mint_attempts)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;
    use tokmap_types::{Kind, TypeError};

    use super::*;
    use crate::generator::testing::ScriptedGenerator;

    #[test]
    fn one_piece_scenario() {
        let resolver = IdentifierResolver::in_memory();

        let t1 = resolver.issue("series", "one-piece").unwrap();
        assert!(t1.created);
        let again = resolver.issue("series", "one-piece").unwrap();
        assert!(!again.created);
        assert_eq!(t1.token(), again.token());

        let key = resolver.resolve(t1.token().as_str()).unwrap().unwrap();
        assert_eq!(key.kind, Kind::Series);
        assert_eq!(key.slug.as_str(), "one-piece");

        assert!(resolver.resolve("not-a-real-token").unwrap().is_none());
    }

    #[test]
    fn kind_is_part_of_the_key() {
        let resolver = IdentifierResolver::in_memory();
        let t1 = resolver.issue("series", "one-piece").unwrap();
        let t2 = resolver.issue("chapter", "one-piece").unwrap();
        assert_ne!(t1.token(), t2.token());
        assert_eq!(resolver.len().unwrap(), 2);
    }

    #[test]
    fn invalid_input_is_rejected_without_side_effects() {
        let resolver = IdentifierResolver::in_memory();

        let err = resolver.issue("manga", "one-piece").unwrap_err();
        assert!(err.is_invalid_input());
        assert!(matches!(
            err,
            StoreError::InvalidInput(TypeError::UnknownKind(_))
        ));

        let err = resolver.issue("series", "   ").unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(TypeError::EmptySlug)));

        assert!(resolver.is_empty().unwrap());
    }

    #[test]
    fn exhaustion_is_internal_error() {
        let resolver = IdentifierResolver::in_memory()
            .with_generator(Arc::new(ScriptedGenerator::new(&["dup"])))
            .with_max_mint_attempts(3);

        resolver.issue("series", "a").unwrap();
        let err = resolver.issue("series", "b").unwrap_err();
        assert!(!err.is_invalid_input());
        assert!(matches!(err, StoreError::TokenSpaceExhausted { attempts: 3 }));
    }

    #[test]
    fn in_memory_is_not_durable() {
        assert!(!IdentifierResolver::in_memory().is_durable());
    }

    #[test]
    fn zero_attempts_is_clamped() {
        let resolver = IdentifierResolver::in_memory().with_max_mint_attempts(0);
        assert_eq!(resolver.max_mint_attempts(), 1);
        assert!(resolver.issue("series", "a").is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_issue_creates_one_binding() {
        let resolver = IdentifierResolver::in_memory();
        let before = resolver.len().unwrap();

        let mut tasks = Vec::new();
        for _ in 0..64 {
            let r = resolver.clone();
            tasks.push(tokio::spawn(async move {
                r.issue("series", "race-condition").unwrap().binding.token
            }));
        }
        let mut tokens = HashSet::new();
        for task in tasks {
            tokens.insert(task.await.unwrap());
        }

        assert_eq!(tokens.len(), 1);
        assert_eq!(resolver.len().unwrap(), before + 1);
    }

    fn kind_strategy() -> impl Strategy<Value = &'static str> {
        prop_oneof![Just("series"), Just("chapter")]
    }

    proptest! {
        #[test]
        fn issue_is_idempotent_and_reversible(kind in kind_strategy(), slug in "[a-z0-9-]{1,40}") {
            let resolver = IdentifierResolver::in_memory();
            let first = resolver.issue(kind, &slug).unwrap();
            let second = resolver.issue(kind, &slug).unwrap();
            prop_assert_eq!(first.token(), second.token());

            let key = resolver.resolve(first.token().as_str()).unwrap().unwrap();
            prop_assert_eq!(key.kind.as_str(), kind);
            prop_assert_eq!(key.slug.as_str(), slug.as_str());
        }

        #[test]
        fn distinct_keys_get_distinct_tokens(
            keys in prop::collection::hash_set((kind_strategy(), "[a-z0-9-]{1,12}"), 1..50)
        ) {
            let resolver = IdentifierResolver::in_memory();
            let mut tokens = HashSet::new();
            for (kind, slug) in &keys {
                tokens.insert(resolver.issue(kind, slug).unwrap().binding.token);
            }
            prop_assert_eq!(tokens.len(), keys.len());
            prop_assert_eq!(resolver.len().unwrap(), keys.len());
        }
    }
}
