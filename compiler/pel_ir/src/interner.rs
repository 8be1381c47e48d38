//! String interner backing `Name` handles.
//!
//! Thread-safe via a single `parking_lot::RwLock`; lookups of already
//! interned strings take the read path only. Interned strings are leaked
//! into `'static` storage so resolved `&str`s can be handed out without
//! holding the lock.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::Name;

#[derive(Default)]
struct InternTable {
    map: FxHashMap<&'static str, u32>,
    strings: Vec<&'static str>,
}

/// String interner: `&str` -> `Name` with dedup, and `Name` -> `&str`.
pub struct StringInterner {
    table: RwLock<InternTable>,
}

impl StringInterner {
    pub fn new() -> Self {
        let interner = StringInterner {
            table: RwLock::new(InternTable::default()),
        };
        // Seed index 0 so Name::EMPTY resolves to "".
        let empty = interner.intern("");
        debug_assert_eq!(empty, Name::EMPTY);
        interner
    }

    /// Intern a string, returning its stable handle.
    pub fn intern(&self, s: &str) -> Name {
        if let Some(&idx) = self.table.read().map.get(s) {
            return Name::from_raw(idx);
        }
        let mut table = self.table.write();
        // Re-check under the write lock; another thread may have won.
        if let Some(&idx) = table.map.get(s) {
            return Name::from_raw(idx);
        }
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let idx = u32::try_from(table.strings.len()).expect("interner capacity exceeded");
        table.strings.push(leaked);
        table.map.insert(leaked, idx);
        Name::from_raw(idx)
    }

    /// Resolve a handle back to its string.
    ///
    /// # Panics
    /// Panics if `name` was produced by a different interner.
    pub fn resolve(&self, name: Name) -> &'static str {
        self.table.read().strings[name.raw() as usize]
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle to a `StringInterner`.
#[derive(Clone)]
pub struct SharedInterner(Arc<StringInterner>);

impl SharedInterner {
    pub fn new() -> Self {
        SharedInterner(Arc::new(StringInterner::new()))
    }

    #[inline]
    pub fn intern(&self, s: &str) -> Name {
        self.0.intern(s)
    }

    #[inline]
    pub fn resolve(&self, name: Name) -> &'static str {
        self.0.resolve(name)
    }
}

impl Default for SharedInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SharedInterner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedInterner(..)")
    }
}
