//! RFC-8785-style deterministic canonical encoding.
//!
//! Every object that is signed or hashed anywhere in the workspace is first
//! converted to a [`CanonicalValue`] and encoded with [`CanonicalValue::encode`]
//! so that two honest parties always reproduce the same bytes, regardless of
//! field ordering or number formatting in whatever produced the original
//! value.

mod encode;
mod json;
mod parse;
mod value;

pub use value::CanonicalValue;

/// Errors raised while building or parsing a [`CanonicalValue`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CanonError {
    /// A forbidden type (float, null) appeared in the input.
    #[error("invalid input for canonicalization: {0}")]
    InvalidInput(String),

    /// An object carried the same key twice.
    #[error("duplicate key in object: {0}")]
    DuplicateKey(String),

    /// The byte string was not well-formed canonical JSON.
    #[error("malformed canonical bytes: {0}")]
    Malformed(String),
}

/// Canonicalize a [`serde_json::Value`], rejecting floats and nulls.
pub fn canonicalize_json(value: &serde_json::Value) -> Result<Vec<u8>, CanonError> {
    Ok(CanonicalValue::from_json(value)?.encode())
}
