//! KeyedTable: the hashed storage layer shared by `KeyedSet` and `NamedMap`.
//!
//! Entries live in a generational slot map; a `hashbrown::HashTable` indexes
//! slots by the hash stored alongside each entry. The stored hash is reused on
//! resize, so `K: Hash` runs once per insert and never during rehashing.

use crate::reentrancy::OpTracker;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_table;
use hashbrown::HashTable;
use slotmap::{DefaultKey, SlotMap};
use std::collections::hash_map::RandomState;

/// Stable position of a live entry. Invalidated by removal; never aliases an
/// entry inserted later.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Slot(DefaultKey);

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    hash: u64,
}

pub struct KeyedTable<K, V, S = RandomState> {
    hasher: S,
    index: HashTable<DefaultKey>,
    slots: SlotMap<DefaultKey, Entry<K, V>>,
    busy: OpTracker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertError {
    DuplicateKey,
}

impl<K, V> KeyedTable<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, Default::default())
    }
}

impl<K, V> Default for KeyedTable<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over live entries in unspecified order.
pub struct Iter<'a, K, V> {
    it: slotmap::basic::Iter<'a, DefaultKey, Entry<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (Slot, &'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(k, e)| (Slot(k), &e.key, &e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

/// Iterator over live entries with mutable values.
pub struct IterMut<'a, K, V> {
    it: slotmap::basic::IterMut<'a, DefaultKey, Entry<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (Slot, &'a K, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it
            .next()
            .map(|(k, e)| (Slot(k), &e.key, &mut e.value))
    }
}

impl<K, V, S> KeyedTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(0, hasher)
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            hasher,
            index: HashTable::with_capacity(capacity),
            slots: SlotMap::with_capacity_and_key(capacity),
            busy: OpTracker::new(),
        }
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    fn probe<Q>(&self, q: &Q) -> Option<DefaultKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        self.index
            .find(hash, |&k| {
                self.slots
                    .get(k)
                    .map(|e| e.key.borrow() == q)
                    .unwrap_or(false)
            })
            .copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn reserve(&mut self, additional: usize) {
        let _g = self.busy.enter("reserve");
        let slots = &self.slots;
        self.index.reserve(additional, |&k| {
            slots.get(k).map(|e| e.hash).unwrap_or(0)
        });
        self.slots.reserve(additional);
    }

    pub fn find<Q>(&self, q: &Q) -> Option<Slot>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.busy.enter("find");
        self.probe(q).map(Slot)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.busy.enter("contains_key");
        self.probe(q).is_some()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.busy.enter("get");
        let k = self.probe(q)?;
        self.slots.get(k).map(|e| &e.value)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.busy.enter("get_mut");
        let k = self.probe(q)?;
        self.slots.get_mut(k).map(|e| &mut e.value)
    }

    /// Insert a new entry; an equal key already present is left untouched.
    pub fn insert(&mut self, key: K, value: V) -> Result<Slot, InsertError> {
        let _g = self.busy.enter("insert");
        let hash = self.make_hash(&key);
        let slots = &mut self.slots;
        match self.index.entry(
            hash,
            |&kk| slots.get(kk).map(|e| e.key == key).unwrap_or(false),
            |&kk| slots.get(kk).map(|e| e.hash).unwrap_or(0),
        ) {
            hash_table::Entry::Occupied(_) => Err(InsertError::DuplicateKey),
            hash_table::Entry::Vacant(v) => {
                let k = slots.insert(Entry { key, value, hash });
                let _ = v.insert(k);
                Ok(Slot(k))
            }
        }
    }

    /// Insert or overwrite. On overwrite the stored key is kept, the
    /// incoming key is dropped, and the previous value is returned.
    pub fn upsert(&mut self, key: K, value: V) -> (Slot, Option<V>) {
        let _g = self.busy.enter("upsert");
        let hash = self.make_hash(&key);
        let slots = &mut self.slots;
        match self.index.entry(
            hash,
            |&kk| slots.get(kk).map(|e| e.key == key).unwrap_or(false),
            |&kk| slots.get(kk).map(|e| e.hash).unwrap_or(0),
        ) {
            hash_table::Entry::Occupied(o) => {
                let k = *o.get();
                let prev = slots
                    .get_mut(k)
                    .map(|e| core::mem::replace(&mut e.value, value));
                (Slot(k), prev)
            }
            hash_table::Entry::Vacant(v) => {
                let k = slots.insert(Entry { key, value, hash });
                let _ = v.insert(k);
                (Slot(k), None)
            }
        }
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let slot = {
            let _g = self.busy.enter("remove");
            self.probe(q)?
        };
        self.remove_slot(Slot(slot))
    }

    pub fn remove_slot(&mut self, slot: Slot) -> Option<(K, V)> {
        let _g = self.busy.enter("remove_slot");
        let k = slot.0;
        let entry = self.slots.remove(k)?;
        if let Ok(o) = self.index.find_entry(entry.hash, |&kk| kk == k) {
            o.remove();
        }
        Some((entry.key, entry.value))
    }

    pub fn clear(&mut self) {
        let _g = self.busy.enter("clear");
        self.index.clear();
        self.slots.clear();
    }

    pub fn key(&self, slot: Slot) -> Option<&K> {
        let _g = self.busy.enter("key");
        self.slots.get(slot.0).map(|e| &e.key)
    }

    pub fn value(&self, slot: Slot) -> Option<&V> {
        let _g = self.busy.enter("value");
        self.slots.get(slot.0).map(|e| &e.value)
    }

    pub fn value_mut(&mut self, slot: Slot) -> Option<&mut V> {
        let _g = self.busy.enter("value_mut");
        self.slots.get_mut(slot.0).map(|e| &mut e.value)
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.slots.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.slots.iter_mut(),
        }
    }
}
