#![cfg(test)]

// Property tests for KeyedTable kept inside the crate so the storage layer
// is checked without going through the set and map front ends.

use crate::keyed_table::{InsertError, KeyedTable, Slot};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations so indices shrink to earlier keys.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    Upsert(usize, i32),
    Remove(usize),
    RemoveSlot(usize),
    Find(usize),
    Contains(String),
    Mutate(usize, i32),
    Iterate,
    Clear,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            3 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Upsert(i, v)),
            2 => idx.clone().prop_map(Op::Remove),
            2 => idx.clone().prop_map(Op::RemoveSlot),
            2 => idx.clone().prop_map(Op::Find),
            2 => prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(Op::Contains),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
            1 => Just(Op::Iterate),
            1 => Just(Op::Clear),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Replays `ops` against a KeyedTable and a std HashMap model.
// Invariants exercised:
// - Duplicate inserts are rejected and leave the stored value untouched.
// - `upsert` returns the model's previous value and keeps the tracked slot.
// - `find`/`contains_key` parity; slots are stable while the entry lives.
// - Removal by key or by slot returns the owned pair and invalidates the slot.
// - `iter` yields each live entry once; `len`/`is_empty` parity after each op.
fn run<S: BuildHasher>(
    mut sut: KeyedTable<Key, i32, S>,
    pool: Vec<String>,
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<Key, i32> = HashMap::new();
    let mut live: HashMap<Key, Slot> = HashMap::new();
    let mut stale: Vec<Slot> = Vec::new();

    for op in ops {
        match op {
            Op::Insert(i, v) => {
                let k = key_from(&pool, i);
                let already = model.contains_key(&k);
                match sut.insert(k.clone(), v) {
                    Ok(s) => {
                        prop_assert!(!already, "insert must fail on duplicate");
                        prop_assert!(live.insert(k.clone(), s).is_none());
                        model.insert(k, v);
                    }
                    Err(InsertError::DuplicateKey) => {
                        prop_assert!(already, "duplicate error only when key exists");
                        prop_assert_eq!(sut.get(&k), model.get(&k));
                    }
                }
            }
            Op::Upsert(i, v) => {
                let k = key_from(&pool, i);
                let (s, prev) = sut.upsert(k.clone(), v);
                prop_assert_eq!(prev, model.insert(k.clone(), v));
                if let Some(&tracked) = live.get(&k) {
                    prop_assert_eq!(s, tracked);
                } else {
                    live.insert(k, s);
                }
            }
            Op::Remove(i) => {
                let k = key_from(&pool, i);
                let got = sut.remove(k.0.as_str());
                match model.remove(&k) {
                    Some(mv) => {
                        let (kk, vv) = got.expect("present in table");
                        prop_assert!(kk == k);
                        prop_assert_eq!(vv, mv);
                        stale.extend(live.remove(&k));
                    }
                    None => prop_assert!(got.is_none()),
                }
            }
            Op::RemoveSlot(i) => {
                let k = key_from(&pool, i);
                if let Some(s) = live.remove(&k) {
                    let (kk, vv) = sut.remove_slot(s).expect("live slot resolves");
                    prop_assert!(kk == k);
                    prop_assert_eq!(Some(vv), model.remove(&k));
                    stale.push(s);
                }
            }
            Op::Find(i) => {
                let k = key_from(&pool, i);
                let s = sut.find(&k);
                prop_assert_eq!(s.is_some(), model.contains_key(&k));
                if let Some(s) = s {
                    prop_assert_eq!(Some(&s), live.get(&k));
                    prop_assert_eq!(sut.key(s), Some(&k));
                }
            }
            Op::Contains(s) => {
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(sut.contains_key(s.as_str()), has_model);
            }
            Op::Mutate(i, d) => {
                let k = key_from(&pool, i);
                if let Some(&s) = live.get(&k) {
                    let vr = sut.value_mut(s).expect("live slot resolves");
                    *vr = vr.saturating_add(d);
                    if let Some(mv) = model.get_mut(&k) {
                        *mv = mv.saturating_add(d);
                    }
                }
            }
            Op::Iterate => {
                let s_keys: BTreeSet<_> = sut.iter().map(|(_, k, _)| k.clone()).collect();
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys, m_keys);
                for (s, k, v) in sut.iter() {
                    prop_assert_eq!(Some(&s), live.get(k));
                    prop_assert_eq!(Some(v), model.get(k));
                }
            }
            Op::Clear => {
                sut.clear();
                model.clear();
                stale.extend(live.drain().map(|(_, s)| s));
            }
        }

        for &s in &stale {
            prop_assert!(sut.value(s).is_none());
        }
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run(KeyedTable::new(), pool, ops)?;
    }
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run(KeyedTable::with_hasher(ConstBuildHasher), pool, ops)?;
    }
}
