use thiserror::Error;

/// Errors produced when constructing key types from untrusted input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown kind: {0:?}")]
    UnknownKind(String),

    #[error("slug must not be empty or whitespace-only")]
    EmptySlug,

    #[error("slug too long: {len} bytes (max {max})")]
    SlugTooLong { len: usize, max: usize },
}
