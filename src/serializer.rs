//! Canonical serialization collaborator for the content-digest strategy.

use crate::error::{Error, Result};
use serde::Serialize;

/// Produces the canonical byte form of a value.
///
/// Values the caller considers equal must serialize to identical bytes;
/// the digest strategy is only as correct as this guarantee. Implementations
/// return `Error::Serialization` for values with no byte form.
pub trait CanonicalSerializer<T: ?Sized> {
    fn to_canonical_bytes(&self, value: &T) -> Result<Vec<u8>>;
}

/// `postcard` encoding of any `serde::Serialize` value.
///
/// Deterministic as long as the value's `Serialize` impl is; types that
/// serialize a `std::collections::HashMap` visit entries in hash order and
/// are not canonical. Prefer `BTreeMap` or sorted sequences in such values.
#[derive(Copy, Clone, Debug, Default)]
pub struct Postcard;

impl<T> CanonicalSerializer<T> for Postcard
where
    T: Serialize + ?Sized,
{
    fn to_canonical_bytes(&self, value: &T) -> Result<Vec<u8>> {
        postcard::to_allocvec(value).map_err(Error::serialization)
    }
}

impl<T, F> CanonicalSerializer<T> for F
where
    T: ?Sized,
    F: Fn(&T) -> Result<Vec<u8>>,
{
    fn to_canonical_bytes(&self, value: &T) -> Result<Vec<u8>> {
        self(value)
    }
}
