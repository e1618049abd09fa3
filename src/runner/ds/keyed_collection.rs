use std::cell::RefCell;
use std::iter::FromIterator;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::runner::ds::array_key::ArrayKey;
use crate::runner::ds::value::{ArrayRef, HostValue, ValueRef};

/// A stored entry: either an owned value or an alias shared with other holders.
#[derive(Debug, Clone)]
pub enum Entry {
    Value(HostValue),
    Reference(ValueRef),
}

impl Entry {
    /// The stored value with references resolved. Array handles are shared with the entry, so
    /// this is for read-only traversal; `KeyedCollection::get` hands out detached copies.
    pub fn value(&self) -> HostValue {
        match self {
            Entry::Value(v) => v.clone(),
            Entry::Reference(r) => r.borrow().clone(),
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Entry::Reference(_))
    }
}

/// Insertion-ordered map from integer-or-string keys to values.
///
/// Arrays are held by value: storing one whose handle is held elsewhere stores a copy, and
/// reads hand out copies. Only reference entries alias.
///
/// Tracks the next free integer index the same way the host does for appends: one past the
/// largest integer key ever stored, never below zero. Removing entries does not lower it.
#[derive(Debug, Clone, Default)]
pub struct KeyedCollection {
    entries: IndexMap<ArrayKey, Entry>,
    next_index: i64,
}

impl KeyedCollection {
    pub fn new() -> Self {
        KeyedCollection {
            entries: IndexMap::new(),
            next_index: 0,
        }
    }

    /// A list: values keyed `0..n`.
    pub fn from_values(values: Vec<HostValue>) -> Self {
        let mut collection = KeyedCollection::new();
        for v in values {
            collection.append(v);
        }
        collection
    }

    pub fn into_ref(self) -> ArrayRef {
        Rc::new(RefCell::new(self))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn next_index(&self) -> i64 {
        self.next_index
    }

    pub fn contains_key(&self, key: &ArrayKey) -> bool {
        self.entries.contains_key(&*key.canonical())
    }

    pub fn get(&self, key: &ArrayKey) -> Option<HostValue> {
        self.get_entry(key).map(|e| e.value().detach())
    }

    pub fn get_entry(&self, key: &ArrayKey) -> Option<&Entry> {
        self.entries.get(&*key.canonical())
    }

    /// Entry at insertion position `idx`.
    pub fn get_index(&self, idx: usize) -> Option<(ArrayKey, HostValue)> {
        self.entries
            .get_index(idx)
            .map(|(k, e)| (k.clone(), e.value().detach()))
    }

    /// Stores `value` under `key`.
    ///
    /// A `HostValue::Reference` rebinds the entry to that alias. Any other value replaces an
    /// owned entry, or is written through when the entry is already a reference. A shared array
    /// is copied first; callers storing a collection's own handle into itself must `detach` it
    /// before borrowing the collection mutably.
    pub fn set(&mut self, key: ArrayKey, value: HostValue) {
        if let HostValue::Reference(r) = value {
            self.set_reference(key, r);
            return;
        }
        let key = key.into_canonical();
        let value = value.detach();
        self.bump_next_index(&key);
        match self.entries.get_mut(&key) {
            Some(Entry::Reference(r)) => {
                *r.borrow_mut() = value;
            }
            Some(slot) => {
                *slot = Entry::Value(value);
            }
            None => {
                self.entries.insert(key, Entry::Value(value));
            }
        }
    }

    pub fn set_reference(&mut self, key: ArrayKey, reference: ValueRef) {
        let key = key.into_canonical();
        self.bump_next_index(&key);
        self.entries.insert(key, Entry::Reference(reference));
    }

    /// Stores `value` under the next free integer key and returns that key.
    pub fn append(&mut self, value: HostValue) -> ArrayKey {
        let key = ArrayKey::Int(self.next_index);
        self.set(key.clone(), value);
        key
    }

    pub fn remove(&mut self, key: &ArrayKey) -> Option<HostValue> {
        self.entries
            .shift_remove(&*key.canonical())
            .map(|e| e.value())
    }

    pub fn keys(&self) -> Vec<ArrayKey> {
        self.entries.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ArrayKey, &Entry)> {
        self.entries.iter()
    }

    /// Snapshot of all entries with references resolved and arrays copied.
    pub fn to_entries(&self) -> Vec<(ArrayKey, HostValue)> {
        self.entries
            .iter()
            .map(|(k, e)| (k.clone(), e.value().detach()))
            .collect()
    }

    /// Copies owned values recursively; reference entries keep pointing at the same alias.
    pub fn deep_copy(&self) -> KeyedCollection {
        let entries = self
            .entries
            .iter()
            .map(|(k, e)| {
                let copied = match e {
                    Entry::Value(v) => Entry::Value(v.deep_copy()),
                    Entry::Reference(r) => Entry::Reference(r.clone()),
                };
                (k.clone(), copied)
            })
            .collect();
        KeyedCollection {
            entries,
            next_index: self.next_index,
        }
    }

    fn bump_next_index(&mut self, key: &ArrayKey) {
        if let ArrayKey::Int(i) = key {
            if *i >= self.next_index {
                self.next_index = i.saturating_add(1);
            }
        }
    }
}

impl FromIterator<(ArrayKey, HostValue)> for KeyedCollection {
    fn from_iter<T: IntoIterator<Item = (ArrayKey, HostValue)>>(iter: T) -> Self {
        let mut collection = KeyedCollection::new();
        for (k, v) in iter {
            collection.set(k, v);
        }
        collection
    }
}

impl PartialEq for KeyedCollection {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(other.entries.iter())
                .all(|((ka, ea), (kb, eb))| ka == kb && ea.value() == eb.value())
    }
}
