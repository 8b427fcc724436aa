//! NamedMap: text-keyed map that stores values intact.

use crate::error::{Error, NameConflict, Result};
use crate::keyed_table::{InsertError, KeyedTable};
use core::borrow::Borrow;
use core::fmt;
use core::hash::BuildHasher;
use std::collections::hash_map::RandomState;
use std::rc::Rc;

/// Canonical entry name. Allocated once on first insert and reused by every
/// later overwrite of the same name.
#[derive(Clone, PartialEq, Eq, Hash)]
struct Name(Rc<str>);

impl Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Map from entry name to value with last-write-wins inserts.
///
/// A miss is `None`, which is distinct from a stored null value such as
/// `Value::Null`.
pub struct NamedMap<V, H = RandomState> {
    table: KeyedTable<Name, V, H>,
}

impl<V> NamedMap<V> {
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: KeyedTable::with_capacity_and_hasher(capacity, RandomState::new()),
        }
    }

    /// Build from `(name, value)` pairs. Every entry needs a name; a
    /// repeated name keeps its last value.
    pub fn from_entries<I, N>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Option<N>, V)>,
        N: AsRef<str>,
    {
        let mut map = Self::new();
        map.update(entries)?;
        log::debug!("built map with {} entries", map.len());
        Ok(map)
    }

    /// Build from parallel name and value sequences of equal length.
    pub fn from_parts<NI, VI>(names: NI, values: VI) -> Result<Self>
    where
        NI: IntoIterator,
        NI::Item: AsRef<str>,
        VI: IntoIterator<Item = V>,
    {
        let mut map = Self::new();
        map.update_from_parts(names, values)?;
        log::debug!("built map with {} entries", map.len());
        Ok(map)
    }
}

impl<V> Default for NamedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, H> NamedMap<V, H>
where
    H: BuildHasher,
{
    pub fn with_hasher(hasher: H) -> Self {
        Self {
            table: KeyedTable::with_hasher(hasher),
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    /// Store `value` under `name`, returning the value it replaced.
    pub fn insert(&mut self, name: &str, value: V) -> Option<V> {
        match self.table.find(name) {
            Some(slot) => self
                .table
                .value_mut(slot)
                .map(|old| core::mem::replace(old, value)),
            None => {
                let inserted = self.table.insert(Name(Rc::from(name)), value);
                debug_assert!(
                    !matches!(inserted, Err(InsertError::DuplicateKey)),
                    "`{name}` missed by find but present on insert"
                );
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&V> {
        self.table.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut V> {
        self.table.get_mut(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<V> {
        self.table.remove(name).map(|(_, v)| v)
    }

    /// Insert every entry. All names are checked before the first write, so
    /// an unnamed entry leaves the map unchanged.
    pub fn update<I, N>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (Option<N>, V)>,
        N: AsRef<str>,
    {
        let named = entries
            .into_iter()
            .enumerate()
            .map(|(index, (name, value))| match name {
                Some(name) => Ok((name, value)),
                None => Err(Error::NameConflict {
                    index,
                    conflict: NameConflict::MissingName,
                }),
            })
            .collect::<Result<Vec<_>>>()
            .inspect_err(|e| log::debug!("rejected map batch: {e}"))?;
        self.apply(named);
        Ok(())
    }

    /// Insert `names[i] -> values[i]` for every `i`. Unequal lengths fail
    /// before the first write.
    pub fn update_from_parts<NI, VI>(&mut self, names: NI, values: VI) -> Result<()>
    where
        NI: IntoIterator,
        NI::Item: AsRef<str>,
        VI: IntoIterator<Item = V>,
    {
        let names: Vec<NI::Item> = names.into_iter().collect();
        let values: Vec<V> = values.into_iter().collect();
        if names.len() != values.len() {
            let e = Error::NameConflict {
                index: names.len().min(values.len()),
                conflict: NameConflict::LengthMismatch {
                    names: names.len(),
                    values: values.len(),
                },
            };
            log::debug!("rejected map batch: {e}");
            return Err(e);
        }
        self.apply(names.into_iter().zip(values).collect());
        Ok(())
    }

    /// Presence of each name, in input order.
    pub fn lookup<I>(&self, names: I) -> Vec<bool>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        names
            .into_iter()
            .map(|n| self.contains(n.as_ref()))
            .collect()
    }

    /// Value for each name, in input order; `None` where absent.
    pub fn retrieve<I>(&self, names: I) -> Vec<Option<&V>>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        names
            .into_iter()
            .map(|n| self.get(n.as_ref()))
            .collect()
    }

    /// Entries in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> + '_ {
        self.table.iter().map(|(_, n, v)| (&*n.0, v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.iter().map(|(n, _)| n)
    }

    /// Write a listing of every entry, rendering values with `render`.
    pub fn dump_with<W, F>(&self, out: &mut W, mut render: F) -> fmt::Result
    where
        W: fmt::Write,
        F: FnMut(&mut W, &V) -> fmt::Result,
    {
        writeln!(out, "*Hash Map*\n")?;
        if self.is_empty() {
            return writeln!(out, "<empty>");
        }
        for (name, value) in self.iter() {
            writeln!(out, "[[{name:?}]]")?;
            render(out, value)?;
            writeln!(out, "\n")?;
        }
        Ok(())
    }

    pub fn dump<W>(&self, out: &mut W) -> fmt::Result
    where
        W: fmt::Write,
        V: fmt::Display,
    {
        self.dump_with(out, |out, v| write!(out, "{v}"))
    }

    fn apply<N: AsRef<str>>(&mut self, entries: Vec<(N, V)>) {
        log::trace!("writing {} entries into map", entries.len());
        self.table.reserve(entries.len());
        for (name, value) in entries {
            self.insert(name.as_ref(), value);
        }
    }
}

impl<V, H> fmt::Debug for NamedMap<V, H>
where
    V: fmt::Debug,
    H: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
