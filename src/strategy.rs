//! Surrogate key strategies: how a host value becomes a hashable key.
//!
//! A container fixes one strategy at construction. Every strategy is
//! deterministic within a process, but they disagree on what "the same value"
//! means:
//!
//! | strategy        | key                         | equal when                        |
//! |-----------------|-----------------------------|-----------------------------------|
//! | `ByReference`   | the `Rc` itself             | same allocation                   |
//! | `Numeric`       | `f64` (NaN == NaN, -0 == 0) | same number after coercion        |
//! | `Textual`       | owned text                  | byte-identical text               |
//! | `ContentDigest` | fingerprint of the bytes    | same canonical serialization      |
//!
//! Only `ContentDigest` can merge two different values, and only when their
//! fingerprints collide under `CollisionPolicy::Trust`.

use crate::digest::{CollisionPolicy, DigestAlgorithm, DigestConfig, Fingerprint};
use crate::error::{Error, Result};
use crate::serializer::{CanonicalSerializer, Postcard};
use crate::value::HostScalar;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use ordered_float::OrderedFloat;
use std::rc::Rc;

/// Maps host values of type `T` to surrogate keys.
pub trait KeyStrategy<T: ?Sized> {
    type Key: Eq + Hash;

    fn key_of(&self, value: &T) -> Result<Self::Key>;

    /// Name used in dumps and logs.
    fn name(&self) -> &'static str;

    /// Element count past which distinct values are likely to share a key.
    fn collision_bound(&self) -> Option<usize> {
        None
    }
}

/// Identity of an `Rc` allocation. Holding the `Rc` keeps the address from
/// being reused by another value while the key is stored.
pub struct RefKey<U: ?Sized>(Rc<U>);

impl<U: ?Sized> RefKey<U> {
    pub fn get(&self) -> &Rc<U> {
        &self.0
    }

    fn addr(&self) -> *const () {
        Rc::as_ptr(&self.0).cast::<()>()
    }
}

impl<U: ?Sized> PartialEq for RefKey<U> {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl<U: ?Sized> Eq for RefKey<U> {}

impl<U: ?Sized> Hash for RefKey<U> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.addr() as usize).hash(state);
    }
}

impl<U: ?Sized> fmt::Display for RefKey<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<object @ {:p}>", self.addr())
    }
}

impl<U: ?Sized> fmt::Debug for RefKey<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RefKey({:p})", self.addr())
    }
}

/// Keys `Rc<U>` values by allocation identity. Two structurally equal but
/// separately allocated values are different keys.
pub struct ByReference<U: ?Sized>(PhantomData<fn(&U)>);

impl<U: ?Sized> ByReference<U> {
    pub fn new() -> Self {
        ByReference(PhantomData)
    }
}

impl<U: ?Sized> Default for ByReference<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U: ?Sized> Clone for ByReference<U> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<U: ?Sized> fmt::Debug for ByReference<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ByReference")
    }
}

impl<U: ?Sized> KeyStrategy<Rc<U>> for ByReference<U> {
    type Key = RefKey<U>;

    #[inline]
    fn key_of(&self, value: &Rc<U>) -> Result<RefKey<U>> {
        Ok(RefKey(Rc::clone(value)))
    }

    fn name(&self) -> &'static str {
        "reference"
    }
}

/// Double-precision key. Every NaN is one key and `-0.0` equals `0.0`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NumberKey(OrderedFloat<f64>);

impl NumberKey {
    pub fn new(n: f64) -> Self {
        // Fold -0.0 into 0.0 so both hash alike.
        NumberKey(OrderedFloat(if n == 0.0 { 0.0 } else { n }))
    }

    pub fn get(self) -> f64 {
        self.0.into_inner()
    }
}

impl fmt::Display for NumberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Keys values by their numeric coercion.
#[derive(Copy, Clone, Debug, Default)]
pub struct Numeric;

impl<T: HostScalar + ?Sized> KeyStrategy<T> for Numeric {
    type Key = NumberKey;

    #[inline]
    fn key_of(&self, value: &T) -> Result<NumberKey> {
        value
            .as_number()
            .map(NumberKey::new)
            .ok_or_else(|| Error::type_conversion("number", value.type_name()))
    }

    fn name(&self) -> &'static str {
        "numeric"
    }
}

/// Owned text key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextKey(Box<str>);

impl TextKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

/// Keys values by their text coercion.
#[derive(Copy, Clone, Debug, Default)]
pub struct Textual;

impl<T: HostScalar + ?Sized> KeyStrategy<T> for Textual {
    type Key = TextKey;

    #[inline]
    fn key_of(&self, value: &T) -> Result<TextKey> {
        value
            .as_text()
            .map(|s| TextKey(Box::from(s)))
            .ok_or_else(|| Error::type_conversion("text", value.type_name()))
    }

    fn name(&self) -> &'static str {
        "textual"
    }
}

/// Fingerprint of a value's canonical bytes, optionally carrying the bytes
/// themselves so that colliding fingerprints can be told apart.
#[derive(Clone)]
pub struct DigestKey {
    fingerprint: Fingerprint,
    canonical: Option<Box<[u8]>>,
}

impl DigestKey {
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    pub fn canonical_bytes(&self) -> Option<&[u8]> {
        self.canonical.as_deref()
    }
}

impl PartialEq for DigestKey {
    fn eq(&self, other: &Self) -> bool {
        // Keys in one container are either all verified or all trusted.
        self.fingerprint == other.fingerprint
            && match (&self.canonical, &other.canonical) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            }
    }
}

impl Eq for DigestKey {}

impl Hash for DigestKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fingerprint.hash(state);
    }
}

impl fmt::Display for DigestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.fingerprint, f)
    }
}

impl fmt::Debug for DigestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("DigestKey");
        d.field("fingerprint", &self.fingerprint);
        if let Some(bytes) = &self.canonical {
            d.field("canonical_len", &bytes.len());
        }
        d.finish()
    }
}

/// Keys arbitrary values by `digest(serialize(value))`.
#[derive(Clone, Debug, Default)]
pub struct ContentDigest<Z = Postcard> {
    config: DigestConfig,
    serializer: Z,
}

impl ContentDigest<Postcard> {
    pub fn new(config: DigestConfig) -> Self {
        Self::with_serializer(config, Postcard)
    }
}

impl<Z> ContentDigest<Z> {
    pub fn with_serializer(config: DigestConfig, serializer: Z) -> Self {
        Self { config, serializer }
    }

    pub fn config(&self) -> &DigestConfig {
        &self.config
    }

    /// Key for bytes that are already canonical.
    pub fn key_of_bytes(&self, bytes: Vec<u8>) -> DigestKey {
        let fingerprint = self.config.algorithm.digest(&bytes);
        let canonical = match self.config.collisions {
            CollisionPolicy::Trust => None,
            CollisionPolicy::Verify => Some(bytes.into_boxed_slice()),
        };
        DigestKey {
            fingerprint,
            canonical,
        }
    }
}

impl<T, Z> KeyStrategy<T> for ContentDigest<Z>
where
    T: ?Sized,
    Z: CanonicalSerializer<T>,
{
    type Key = DigestKey;

    fn key_of(&self, value: &T) -> Result<DigestKey> {
        let bytes = self.serializer.to_canonical_bytes(value)?;
        Ok(self.key_of_bytes(bytes))
    }

    fn name(&self) -> &'static str {
        match self.config.algorithm {
            DigestAlgorithm::Sha256 => "sha256 digest",
            DigestAlgorithm::Fast32 => "fast32 digest",
        }
    }

    fn collision_bound(&self) -> Option<usize> {
        self.config.birthday_bound()
    }
}
