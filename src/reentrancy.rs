//! Debug-only reentrancy detection for the storage layer.
//!
//! `KeyedTable` calls into user code only through `K: Eq`/`K: Hash` while
//! probing. That code must not call back into the same table while the
//! operation is in flight. In debug builds a nested entry panics naming both
//! operations; in release builds the tracker is zero-sized and `enter` is a
//! no-op. Strategies, serializers and print callbacks run before or after a
//! table operation, never inside one, and are not tracked.

#[cfg(debug_assertions)]
use core::cell::Cell;
use core::marker::PhantomData;

/// Per-table tracker. Guard each entry-point with
/// `let _g = self.busy.enter("op");`.
#[derive(Debug)]
pub(crate) struct OpTracker {
    #[cfg(debug_assertions)]
    active: Cell<Option<&'static str>>,
    // Tables are single-owner; keep the tracker !Send + !Sync.
    _local: PhantomData<*mut ()>,
}

impl OpTracker {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(None),
            _local: PhantomData,
        }
    }

    /// Mark `op` as in flight until the returned guard drops.
    #[inline]
    pub(crate) fn enter(&self, op: &'static str) -> OpGuard<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(outer) = self.active.get() {
                panic!("reentrant `{op}` while `{outer}` is in progress on the same table");
            }
            self.active.set(Some(op));
            return OpGuard { owner: self };
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = op;
            return OpGuard { _z: PhantomData };
        }
    }

    #[cfg(all(test, debug_assertions))]
    pub(crate) fn current(&self) -> Option<&'static str> {
        self.active.get()
    }
}

impl Default for OpTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Clears the in-flight marker on drop.
pub(crate) struct OpGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a OpTracker,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for OpGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            debug_assert!(self.owner.active.get().is_some());
            self.owner.active.set(None);
        }
    }
}
