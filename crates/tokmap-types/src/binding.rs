use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::key::NamespacedKey;
use crate::token::Token;

/// The association between a namespaced key and the token issued for it.
///
/// Bindings are created once and never modified.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub token: Token,
    #[serde(flatten)]
    pub key: NamespacedKey,
    pub issued_at: DateTime<Utc>,
}

impl Binding {
    pub fn new(token: Token, key: NamespacedKey) -> Self {
        Self {
            token,
            key,
            issued_at: Utc::now(),
        }
    }
}
