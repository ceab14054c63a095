//! Associative containers whose mutations are undone when a group ends.
//!
//! TeX scopes almost every assignment to the current group: category codes,
//! command definitions, registers.
//! [GroupingContainer] adds exactly this behaviour to any container implementing [BackingContainer].
//! A group is opened with [begin_group](GroupingContainer::begin_group) and closed with
//! [end_group](GroupingContainer::end_group); every local insertion made in between is reverted
//! when the group closes.
//!
//! Two concrete containers are provided: [GroupingHashMap] and [GroupingVec].
//!
//! ```
//! # use texpand_stdext::collections::groupingmap::GroupingHashMap;
//! # use texpand_stdext::collections::groupingmap::Scope;
//! let mut cat_codes = GroupingHashMap::default();
//! cat_codes.insert('@', "letter", Scope::Local);
//! cat_codes.begin_group();
//! cat_codes.insert('@', "other", Scope::Local);
//! cat_codes.insert('#', "parameter", Scope::Local);
//! assert_eq!(cat_codes.get(&'@'), Some(&"other"));
//! assert_eq!(cat_codes.end_group(), Ok(()));
//! assert_eq!(cat_codes.get(&'@'), Some(&"letter"));
//! assert_eq!(cat_codes.get(&'#'), None);
//! ```
//!
//! A global insertion survives the end of every open group:
//! ```
//! # use texpand_stdext::collections::groupingmap::GroupingHashMap;
//! # use texpand_stdext::collections::groupingmap::Scope;
//! let mut cat_codes = GroupingHashMap::default();
//! cat_codes.begin_group();
//! cat_codes.insert('~', "active", Scope::Global);
//! assert_eq!(cat_codes.end_group(), Ok(()));
//! assert_eq!(cat_codes.get(&'~'), Some(&"active"));
//! ```
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;

/// Containers that can back a [GroupingContainer].
pub trait BackingContainer<K, V>: Default {
    fn insert(&mut self, k: K, v: V);

    fn get(&self, k: &K) -> Option<&V>;

    fn get_mut(&mut self, k: &K) -> Option<&mut V>;

    fn remove(&mut self, k: &K);

    /// Iterator over the (key, value) pairs in the container.
    type Iter<'a>: Iterator<Item = (K, &'a V)>
    where
        V: 'a,
        Self: 'a;

    fn iter(&self) -> Self::Iter<'_>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash + Clone, V> BackingContainer<K, V> for HashMap<K, V> {
    #[inline]
    fn insert(&mut self, k: K, v: V) {
        HashMap::insert(self, k, v);
    }
    #[inline]
    fn get(&self, k: &K) -> Option<&V> {
        HashMap::get(self, k)
    }
    #[inline]
    fn get_mut(&mut self, k: &K) -> Option<&mut V> {
        HashMap::get_mut(self, k)
    }
    #[inline]
    fn remove(&mut self, k: &K) {
        HashMap::remove(self, k);
    }
    type Iter<'a> = std::iter::Map<
        std::collections::hash_map::Iter<'a, K, V>,
        fn((&'a K, &'a V)) -> (K, &'a V),
    > where K: 'a, V: 'a;
    fn iter(&self) -> Self::Iter<'_> {
        HashMap::iter(self).map(clone_key)
    }
    fn len(&self) -> usize {
        HashMap::len(self)
    }
}

fn clone_key<'a, K: Clone, V>((k, v): (&'a K, &'a V)) -> (K, &'a V) {
    (k.clone(), v)
}

impl<V> BackingContainer<usize, V> for Vec<Option<V>> {
    #[inline]
    fn insert(&mut self, k: usize, v: V) {
        if k >= self.len() {
            self.resize_with(k + 1, Default::default);
        }
        self[k] = Some(v);
    }

    #[inline]
    fn get(&self, k: &usize) -> Option<&V> {
        <[Option<V>]>::get(self, *k).and_then(Option::as_ref)
    }

    #[inline]
    fn get_mut(&mut self, k: &usize) -> Option<&mut V> {
        <[Option<V>]>::get_mut(self, *k).and_then(Option::as_mut)
    }

    #[inline]
    fn remove(&mut self, k: &usize) {
        if let Some(slot) = <[Option<V>]>::get_mut(self, *k) {
            *slot = None;
        }
    }

    type Iter<'a> = std::iter::FilterMap<
        std::iter::Enumerate<std::slice::Iter<'a, Option<V>>>,
        fn((usize, &'a Option<V>)) -> Option<(usize, &'a V)>,
    > where V: 'a;
    fn iter(&self) -> Self::Iter<'_> {
        <[Option<V>]>::iter(self)
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|v| (i, v)))
    }

    fn len(&self) -> usize {
        <[Option<V>]>::iter(self).filter(|slot| slot.is_some()).count()
    }
}

/// Wrapper that gives a [BackingContainer] TeX group semantics.
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupingContainer<K, V, T> {
    backing_container: T,

    // One entry per open group. The outermost (global) group never needs undoing so it
    // has no entry.
    #[cfg_attr(
        feature = "serde",
        serde(bound(
            deserialize = "K: Eq + Hash + serde::Deserialize<'de>, V: serde::Deserialize<'de>"
        ))
    )]
    groups: Vec<HashMap<K, Undo<V>>>,
}

/// Grouping container backed by a [HashMap].
pub type GroupingHashMap<K, V> = GroupingContainer<K, V, HashMap<K, V>>;

/// Grouping container backed by a vector indexed by [usize] keys.
///
/// The vector grows as needed to hold the largest key inserted.
pub type GroupingVec<V> = GroupingContainer<usize, V, Vec<Option<V>>>;

/// The scope of an insertion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Scope {
    /// Reverted when the current group ends.
    Local,
    /// Survives the end of all currently open groups.
    Global,
}

#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
enum Undo<V> {
    Restore(V),
    Remove,
}

/// Returned by [GroupingContainer::end_group] when no group is open.
#[derive(Debug, PartialEq, Eq)]
pub struct NoGroupToEndError;

impl std::fmt::Display for NoGroupToEndError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "there is no group to end")
    }
}

impl std::error::Error for NoGroupToEndError {}

impl<K: Eq + Hash + Clone, V, T: BackingContainer<K, V>> GroupingContainer<K, V, T> {
    /// Inserts the value at the key in the provided scope.
    ///
    /// Returns whether a value already existed at the key.
    pub fn insert(&mut self, key: K, mut val: V, scope: Scope) -> bool {
        let group = match scope {
            Scope::Local => self.groups.last_mut(),
            Scope::Global => {
                for group in &mut self.groups {
                    group.remove(&key);
                }
                None
            }
        };
        match (self.backing_container.get_mut(&key), group) {
            (None, None) => {
                self.backing_container.insert(key, val);
                false
            }
            (None, Some(group)) => {
                group.insert(key.clone(), Undo::Remove);
                self.backing_container.insert(key, val);
                false
            }
            (Some(existing), None) => {
                *existing = val;
                true
            }
            (Some(existing), Some(group)) => {
                std::mem::swap(&mut val, existing);
                // Only the first write in a group records the value to restore.
                if let Entry::Vacant(entry) = group.entry(key) {
                    entry.insert(Undo::Restore(val));
                }
                true
            }
        }
    }

    #[inline]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.backing_container.get(key)
    }

    pub fn begin_group(&mut self) {
        self.groups.push(HashMap::new());
    }

    /// Ends the current group, undoing its local insertions.
    pub fn end_group(&mut self) -> Result<(), NoGroupToEndError> {
        let group = self.groups.pop().ok_or(NoGroupToEndError)?;
        for (key, undo) in group {
            match undo {
                Undo::Remove => self.backing_container.remove(&key),
                Undo::Restore(val) => self.backing_container.insert(key, val),
            }
        }
        Ok(())
    }

    /// Inserts each pair in the local scope.
    pub fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, val) in iter {
            self.insert(key, val, Scope::Local);
        }
    }

    /// Iterates over the currently visible (key, value) pairs.
    pub fn iter(&self) -> T::Iter<'_> {
        self.backing_container.iter()
    }

    /// Number of open groups, not counting the global group.
    pub fn depth(&self) -> usize {
        self.groups.len()
    }

    pub fn len(&self) -> usize {
        self.backing_container.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backing_container.is_empty()
    }
}

impl<K, V, T: Default> Default for GroupingContainer<K, V, T> {
    fn default() -> Self {
        Self {
            backing_container: Default::default(),
            groups: Default::default(),
        }
    }
}

impl<K: Eq + Hash, V: PartialEq, T: PartialEq> PartialEq for GroupingContainer<K, V, T> {
    fn eq(&self, other: &Self) -> bool {
        self.backing_container == other.backing_container && self.groups == other.groups
    }
}

impl<K: Eq + Hash, V: Eq, T: Eq> Eq for GroupingContainer<K, V, T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get() {
        let mut map = GroupingHashMap::default();
        assert!(!map.insert(3, "three", Scope::Local));
        assert!(map.insert(3, "drei", Scope::Local));
        assert_eq!(map.get(&3), Some(&"drei"));
        assert_eq!(map.get(&4), None);
    }

    #[test]
    fn local_insert_reverted() {
        let mut map = GroupingHashMap::default();
        map.insert(1, "a", Scope::Local);
        map.begin_group();
        map.insert(1, "b", Scope::Local);
        map.insert(1, "c", Scope::Local);
        map.insert(2, "d", Scope::Local);
        assert_eq!(map.end_group(), Ok(()));
        assert_eq!(map.get(&1), Some(&"a"));
        assert_eq!(map.get(&2), None);
    }

    #[test]
    fn nested_groups() {
        let mut map = GroupingHashMap::default();
        map.insert(1, 10, Scope::Local);
        map.begin_group();
        map.insert(1, 20, Scope::Local);
        map.begin_group();
        map.insert(1, 30, Scope::Local);
        assert_eq!(map.depth(), 2);
        assert_eq!(map.end_group(), Ok(()));
        assert_eq!(map.get(&1), Some(&20));
        assert_eq!(map.end_group(), Ok(()));
        assert_eq!(map.get(&1), Some(&10));
    }

    #[test]
    fn global_insert_erases_pending_reverts() {
        let mut map = GroupingHashMap::default();
        map.insert(1, 10, Scope::Local);
        map.begin_group();
        map.insert(1, 20, Scope::Local);
        map.begin_group();
        map.insert(1, 30, Scope::Global);
        assert_eq!(map.end_group(), Ok(()));
        assert_eq!(map.end_group(), Ok(()));
        assert_eq!(map.get(&1), Some(&30));
    }

    #[test]
    fn local_after_global_in_same_group() {
        let mut map = GroupingHashMap::default();
        map.begin_group();
        map.insert(1, 10, Scope::Global);
        map.insert(1, 20, Scope::Local);
        assert_eq!(map.end_group(), Ok(()));
        assert_eq!(map.get(&1), Some(&10));
    }

    #[test]
    fn end_group_without_group() {
        let mut map = GroupingHashMap::<u8, u8>::default();
        assert_eq!(map.end_group(), Err(NoGroupToEndError));
    }

    #[test]
    fn vec_backing_container() {
        let mut vec = GroupingVec::default();
        vec.insert(5, 'x', Scope::Local);
        vec.begin_group();
        vec.insert(2, 'y', Scope::Local);
        vec.insert(5, 'z', Scope::Local);
        assert_eq!(vec.len(), 2);
        let mut items: Vec<(usize, char)> = vec.iter().map(|(k, v)| (k, *v)).collect();
        items.sort();
        assert_eq!(items, vec![(2, 'y'), (5, 'z')]);
        assert_eq!(vec.end_group(), Ok(()));
        assert_eq!(vec.get(&2), None);
        assert_eq!(vec.get(&5), Some(&'x'));
        assert_eq!(vec.get(&500), None);
    }

    #[test]
    fn extend() {
        let mut map = GroupingHashMap::default();
        map.extend([("paganini", "black"), ("mint", "ginger")]);
        assert_eq!(map.get(&"paganini"), Some(&"black"));
        assert_eq!(map.len(), 2);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trip() {
        let mut map = GroupingHashMap::default();
        map.insert(1, 10, Scope::Local);
        map.begin_group();
        map.insert(1, 20, Scope::Local);
        let serialized = serde_json::to_string(&map).unwrap();
        let mut deserialized: GroupingHashMap<i32, i32> =
            serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, map);
        assert_eq!(deserialized.end_group(), Ok(()));
        assert_eq!(deserialized.get(&1), Some(&10));
    }
}
