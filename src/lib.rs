//! surrogate-hash: hash sets and maps over values that cannot be hashed
//! directly, keyed through pluggable surrogate-key strategies.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: give host values of arbitrary shape (numbers, text, nested
//!   lists, opaque handles) set and map semantics by mapping each value to
//!   a hashable surrogate key, chosen per container.
//! - Layers:
//!   - KeyedTable<K, V, S>: structural storage. A slot map owns the entries
//!     and a `hashbrown::HashTable` indexes them by a stored hash; includes
//!     a debug-only reentrancy guard while the index is being probed.
//!   - KeyStrategy<T>: maps a `&T` to a key. Four ship with the crate:
//!     `ByReference` (identity), `Numeric`, `Textual`, and `ContentDigest`
//!     (canonical bytes, then SHA-256 or a 32-bit fast hash).
//!   - KeyedSet<T, S>: membership over a strategy's keys. Values are not
//!     retained; only keys are.
//!   - NamedMap<V>: text names to values, stored intact.
//!
//! Constraints
//! - Single-threaded: containers are `!Send`/`!Sync`; reference keys hold
//!   `Rc` clones so an address is never reused while its key is live.
//! - Keys are computed before anything is written. A value with no key
//!   fails its call and leaves the container unchanged, including in
//!   `KeyedSet::update` and the `NamedMap` batch operations.
//! - Bulk lookups report the index of the first failing element.
//! - A miss in `NamedMap` is `None`; a stored null value is `Some`.
//!
//! Reentrancy policy
//! - KeyedTable invokes user code only through `K: Eq/Hash` while probing.
//!   A debug-only guard panics if such code reenters the same table.
//!   Strategies and serializers run before the table is touched and may do
//!   anything.
//!
//! Hasher and rehashing invariants
//! - Each entry stores its `u64` hash; resizing uses the stored value, so
//!   `K: Hash` runs once per insert.
//!
//! Digest collisions
//! - Under `CollisionPolicy::Trust` a digest key is the fingerprint alone
//!   and two values with equal fingerprints are the same member. For a
//!   `b`-bit fingerprint collisions become likely near `2^(b/2)` distinct
//!   values: negligible for SHA-256, about 65k values for `Fast32`. A
//!   warning is logged when a set crosses that bound.
//! - `CollisionPolicy::Verify` also keeps the canonical bytes and compares
//!   them on fingerprint equality, trading memory for exact membership.
//!
//! Notes and non-goals
//! - Iteration and dump order is unspecified.
//! - Sets cannot return the values they were built from.
//! - No persistence across sessions and no thread-safe variants.

pub mod digest;
pub mod error;
pub mod keyed_set;
pub mod keyed_table;
mod keyed_table_proptest;
pub mod named_map;
mod reentrancy;
pub mod serializer;
pub mod strategy;
pub mod value;

// Public surface
pub use digest::{CollisionPolicy, DigestAlgorithm, DigestConfig, Fingerprint};
pub use error::{Error, NameConflict, Result};
pub use keyed_set::KeyedSet;
pub use named_map::NamedMap;
pub use serializer::{CanonicalSerializer, Postcard};
pub use strategy::{
    ByReference, ContentDigest, DigestKey, KeyStrategy, Numeric, NumberKey, RefKey, TextKey,
    Textual,
};
pub use value::{ExternalHandle, HostScalar, Value};
