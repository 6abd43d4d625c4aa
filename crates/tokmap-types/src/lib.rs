//! Foundation types for tokmap.
//!
//! A [`NamespacedKey`] names a catalog item by [`Kind`] and [`Slug`]. The
//! service hands out an opaque [`Token`] for each key and records the pair
//! as a [`Binding`].

pub mod binding;
pub mod error;
pub mod key;
pub mod kind;
pub mod token;

pub use binding::Binding;
pub use error::TypeError;
pub use key::{NamespacedKey, Slug, MAX_SLUG_LEN};
pub use kind::Kind;
pub use token::Token;
