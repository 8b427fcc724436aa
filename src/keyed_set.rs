//! KeyedSet: a hash set of host values, stored as surrogate keys.

use crate::digest::DigestConfig;
use crate::error::Result;
use crate::keyed_table::{InsertError, KeyedTable};
use crate::serializer::Postcard;
use crate::strategy::{ByReference, ContentDigest, KeyStrategy, Numeric, Textual};
use core::borrow::Borrow;
use core::fmt;
use core::hash::BuildHasher;
use core::marker::PhantomData;
use std::collections::hash_map::RandomState;
use std::rc::Rc;

/// Set of `T` values keyed by the strategy `S`.
///
/// Only membership is recoverable: a digest-keyed set cannot hand back the
/// values it was built from. Single-value operations either succeed or leave
/// the set unchanged. `update` computes every key before inserting any, so a
/// failing element also leaves the set unchanged.
pub struct KeyedSet<T, S, H = RandomState>
where
    T: ?Sized,
    S: KeyStrategy<T>,
{
    strategy: S,
    table: KeyedTable<S::Key, (), H>,
    _values: PhantomData<fn(&T)>,
}

impl<T: ?Sized> KeyedSet<T, Numeric>
where
    Numeric: KeyStrategy<T>,
{
    pub fn numeric() -> Self {
        Self::with_strategy(Numeric)
    }
}

impl<T: ?Sized> KeyedSet<T, Textual>
where
    Textual: KeyStrategy<T>,
{
    pub fn textual() -> Self {
        Self::with_strategy(Textual)
    }
}

impl<U: ?Sized> KeyedSet<Rc<U>, ByReference<U>> {
    pub fn by_reference() -> Self {
        Self::with_strategy(ByReference::new())
    }
}

impl<T: ?Sized> KeyedSet<T, ContentDigest<Postcard>>
where
    ContentDigest<Postcard>: KeyStrategy<T>,
{
    pub fn digest(config: DigestConfig) -> Self {
        Self::with_strategy(ContentDigest::new(config))
    }
}

impl<T, S> KeyedSet<T, S>
where
    T: ?Sized,
    S: KeyStrategy<T>,
{
    pub fn with_strategy(strategy: S) -> Self {
        Self::with_strategy_and_hasher(strategy, RandomState::new())
    }

    pub fn with_capacity(strategy: S, capacity: usize) -> Self {
        Self {
            strategy,
            table: KeyedTable::with_capacity_and_hasher(capacity, RandomState::new()),
            _values: PhantomData,
        }
    }

    /// Build a set from an initial batch. Fails without constructing
    /// anything if any value has no key.
    pub fn from_values<I>(strategy: S, values: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Borrow<T>,
    {
        let mut set = Self::with_strategy(strategy);
        set.update(values)?;
        log::debug!(
            "built {} set with {} entries",
            set.strategy.name(),
            set.len()
        );
        Ok(set)
    }
}

impl<T, S, H> KeyedSet<T, S, H>
where
    T: ?Sized,
    S: KeyStrategy<T>,
    H: BuildHasher,
{
    pub fn with_strategy_and_hasher(strategy: S, hasher: H) -> Self {
        Self {
            strategy,
            table: KeyedTable::with_hasher(hasher),
            _values: PhantomData,
        }
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn contains(&self, value: &T) -> Result<bool> {
        let key = self.strategy.key_of(value)?;
        Ok(self.table.contains_key(&key))
    }

    /// Add `value`. Returns `false` if an equal key was already present.
    pub fn insert(&mut self, value: &T) -> Result<bool> {
        let key = self.strategy.key_of(value)?;
        let before = self.len();
        let added = self.put(key);
        self.note_growth(before);
        Ok(added)
    }

    /// Remove `value`. Returns `false` if it was absent.
    pub fn remove(&mut self, value: &T) -> Result<bool> {
        let key = self.strategy.key_of(value)?;
        Ok(self.table.remove(&key).is_some())
    }

    /// Insert every value. Keys are computed up front; the first value
    /// without a key aborts the call before anything is inserted.
    pub fn update<I>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Borrow<T>,
    {
        let keys = self.keys_of(values)?;
        log::trace!("inserting {} values into {} set", keys.len(), self.strategy.name());
        let before = self.len();
        self.table.reserve(keys.len());
        for key in keys {
            self.put(key);
        }
        self.note_growth(before);
        Ok(())
    }

    /// Membership of each value, in input order. The first value without a
    /// key aborts the call and its index is reported.
    pub fn lookup<I>(&self, values: I) -> Result<Vec<bool>>
    where
        I: IntoIterator,
        I::Item: Borrow<T>,
    {
        let values = values.into_iter();
        let mut found = Vec::with_capacity(values.size_hint().0);
        for (i, value) in values.enumerate() {
            let key = self.strategy.key_of(value.borrow()).map_err(|e| e.at(i))?;
            found.push(self.table.contains_key(&key));
        }
        log::trace!("looked up {} values in {} set", found.len(), self.strategy.name());
        Ok(found)
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Stored surrogate keys, in unspecified order.
    pub fn keys(&self) -> impl Iterator<Item = &S::Key> + '_ {
        self.table.iter().map(|(_, k, _)| k)
    }

    /// Write a listing of the stored keys, in unspecified order.
    pub fn dump<W>(&self, out: &mut W) -> fmt::Result
    where
        W: fmt::Write,
        S::Key: fmt::Display,
    {
        writeln!(out, "*Hash Set* ({})\n", self.strategy.name())?;
        if self.is_empty() {
            return writeln!(out, "<empty>");
        }
        for key in self.keys() {
            writeln!(out, "{key}")?;
        }
        Ok(())
    }

    fn keys_of<I>(&self, values: I) -> Result<Vec<S::Key>>
    where
        I: IntoIterator,
        I::Item: Borrow<T>,
    {
        values
            .into_iter()
            .enumerate()
            .map(|(i, v)| self.strategy.key_of(v.borrow()).map_err(|e| e.at(i)))
            .collect()
    }

    fn put(&mut self, key: S::Key) -> bool {
        match self.table.insert(key, ()) {
            Ok(_) => true,
            Err(InsertError::DuplicateKey) => false,
        }
    }

    fn note_growth(&self, before: usize) {
        if let Some(bound) = self.strategy.collision_bound() {
            if before < bound && self.len() >= bound {
                log::warn!(
                    "{} set holds {} entries; past {} distinct values key collisions are likely",
                    self.strategy.name(),
                    self.len(),
                    bound
                );
            }
        }
    }
}

impl<T, S, H> fmt::Debug for KeyedSet<T, S, H>
where
    T: ?Sized,
    S: KeyStrategy<T>,
    S::Key: fmt::Debug,
    H: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.keys()).finish()
    }
}
