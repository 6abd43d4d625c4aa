use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::kind::Kind;

/// Longest slug accepted, in bytes.
pub const MAX_SLUG_LEN: usize = 1024;

/// Human-readable catalog identifier, stored verbatim.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Validate and wrap a slug.
    ///
    /// Rejects empty and whitespace-only input and anything longer than
    /// [`MAX_SLUG_LEN`] bytes. Surrounding whitespace is kept as-is.
    pub fn new(raw: impl Into<String>) -> Result<Self, TypeError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(TypeError::EmptySlug);
        }
        if raw.len() > MAX_SLUG_LEN {
            return Err(TypeError::SlugTooLong {
                len: raw.len(),
                max: MAX_SLUG_LEN,
            });
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Slug {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

impl fmt::Debug for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slug({:?})", self.0)
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A slug qualified by its [`Kind`]. Two keys are equal only when both
/// fields match exactly.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NamespacedKey {
    pub kind: Kind,
    pub slug: Slug,
}

impl NamespacedKey {
    pub fn new(kind: Kind, slug: Slug) -> Self {
        Self { kind, slug }
    }

    /// Build a key from raw wire strings, validating both halves.
    pub fn parse(kind: &str, slug: impl Into<String>) -> Result<Self, TypeError> {
        Ok(Self {
            kind: kind.parse()?,
            slug: Slug::new(slug)?,
        })
    }
}

impl fmt::Display for NamespacedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.slug)
    }
}
