//! String interning.
//!
//! Control sequence names are compared and hashed constantly during expansion.
//! The [Interner] stores each distinct name once and hands out a small integer key for it,
//! so tokens stay `Copy` and name comparisons are integer comparisons.
//! Interned strings are never freed.
//!
//! ```
//! # use texpand_stdext::collections::interner::Interner;
//! let mut interner: Interner = Default::default();
//! let def_1 = interner.get_or_intern("def");
//! let relax = interner.get_or_intern("relax");
//! let def_2 = interner.get_or_intern("def");
//! assert_eq!(def_1, def_2);
//! assert_ne!(def_1, relax);
//! assert_eq!(interner.resolve(relax), Some("relax"));
//! assert_eq!(interner.get("par"), None);
//! ```
//!
//! All strings live in a single buffer. The key of a string is derived from its position
//! in a vector of end offsets, and deduplication goes through a map from string hash to
//! the keys whose strings have that hash.
use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash, Hasher};
use std::num::NonZeroU32;

/// Keys handed out by an [Interner].
pub trait Key: Copy + Eq {
    /// Builds the key for the `index`-th interned string, starting at 0.
    fn try_from_usize(index: usize) -> Option<Self>;

    /// Inverse of [Key::try_from_usize].
    fn into_usize(self) -> usize;
}

impl Key for NonZeroU32 {
    fn try_from_usize(index: usize) -> Option<Self> {
        let index: u32 = index.try_into().ok()?;
        NonZeroU32::new(index.checked_add(1)?)
    }

    fn into_usize(self) -> usize {
        self.get() as usize - 1
    }
}

/// A string interner.
pub struct Interner<K = NonZeroU32, S = RandomState> {
    buffer: String,
    ends: Vec<usize>,
    dedup: HashMap<u64, Vec<K>>,
    hash_builder: S,
}

impl<K, S: Default> Default for Interner<K, S> {
    fn default() -> Self {
        Self {
            buffer: Default::default(),
            ends: Default::default(),
            dedup: Default::default(),
            hash_builder: Default::default(),
        }
    }
}

impl<K: Key, S: BuildHasher> Interner<K, S> {
    /// Interns the string, returning its key.
    ///
    /// # Panics
    ///
    /// Panics if the key type cannot represent the number of interned strings.
    pub fn get_or_intern(&mut self, s: &str) -> K {
        let hash = self.hash(s);
        if let Some(key) = self.find(hash, s) {
            return key;
        }
        let key = match K::try_from_usize(self.ends.len()) {
            Some(key) => key,
            None => panic!("string interner is out of keys"),
        };
        self.buffer.push_str(s);
        self.ends.push(self.buffer.len());
        self.dedup.entry(hash).or_default().push(key);
        key
    }

    /// Returns the key of the string, if it has been interned.
    pub fn get(&self, s: &str) -> Option<K> {
        self.find(self.hash(s), s)
    }

    /// Returns the string with the provided key.
    pub fn resolve(&self, key: K) -> Option<&str> {
        let i = key.into_usize();
        let end = *self.ends.get(i)?;
        let start = if i == 0 { 0 } else { self.ends[i - 1] };
        Some(&self.buffer[start..end])
    }

    /// Number of distinct strings interned.
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    /// Iterates over all (key, string) pairs in interning order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &str)> + '_ {
        (0..self.ends.len()).filter_map(|i| {
            let key = K::try_from_usize(i)?;
            Some((key, self.resolve(key)?))
        })
    }

    fn find(&self, hash: u64, s: &str) -> Option<K> {
        self.dedup
            .get(&hash)?
            .iter()
            .copied()
            .find(|key| self.resolve(*key) == Some(s))
    }

    fn hash(&self, s: &str) -> u64 {
        let mut hasher = self.hash_builder.build_hasher();
        s.hash(&mut hasher);
        hasher.finish()
    }
}
