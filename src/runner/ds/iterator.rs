//! Iteration protocol for container storage.
//!
//! A [`HostIterator`] is a cursor: `rewind`, then read `key`/`current` while `valid`,
//! advancing with `next`. [`ArrayIterator`] is the built-in implementation used whenever no
//! other iterator class has been chosen.

use crate::runner::ds::array_key::ArrayKey;
use crate::runner::ds::value::HostValue;

pub const DEFAULT_ITERATOR_CLASS: &str = "ArrayIterator";

pub trait HostIterator {
    fn class_name(&self) -> &str;

    fn rewind(&mut self);

    fn valid(&self) -> bool;

    fn current(&self) -> Option<HostValue>;

    fn key(&self) -> Option<ArrayKey>;

    fn next(&mut self);
}

impl dyn HostIterator {
    /// Adapts the cursor to a standard iterator, starting with a rewind.
    pub fn into_entries(self: Box<Self>) -> HostEntries {
        HostEntries {
            inner: self,
            started: false,
        }
    }
}

pub struct HostEntries {
    inner: Box<dyn HostIterator>,
    started: bool,
}

impl Iterator for HostEntries {
    type Item = (ArrayKey, HostValue);

    fn next(&mut self) -> Option<Self::Item> {
        if self.started {
            self.inner.next();
        } else {
            self.inner.rewind();
            self.started = true;
        }
        if !self.inner.valid() {
            return None;
        }
        Some((self.inner.key()?, self.inner.current()?))
    }
}

/// Walks a collection by insertion position, or an object's visible fields.
///
/// The collection is read live on every step, so entries appended during iteration are
/// reached. An object's visible fields are taken once per rewind.
pub struct ArrayIterator {
    storage: HostValue,
    fields: Vec<(ArrayKey, HostValue)>,
    position: usize,
}

impl ArrayIterator {
    pub fn new(storage: HostValue) -> Self {
        let mut iterator = ArrayIterator {
            storage: storage.deref_value(),
            fields: Vec::new(),
            position: 0,
        };
        iterator.snapshot_fields();
        iterator
    }

    fn snapshot_fields(&mut self) {
        if let HostValue::Object(o) = &self.storage {
            self.fields = o
                .borrow()
                .as_host_object()
                .visible_fields()
                .into_iter()
                .map(|(name, value)| (ArrayKey::from_name(&name), value))
                .collect();
        }
    }

    pub fn len(&self) -> usize {
        match &self.storage {
            HostValue::Array(a) => a.borrow().len(),
            HostValue::Object(_) => self.fields.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry_at(&self, position: usize) -> Option<(ArrayKey, HostValue)> {
        match &self.storage {
            HostValue::Array(a) => a.borrow().get_index(position),
            HostValue::Object(_) => self.fields.get(position).cloned(),
            _ => None,
        }
    }
}

impl HostIterator for ArrayIterator {
    fn class_name(&self) -> &str {
        DEFAULT_ITERATOR_CLASS
    }

    fn rewind(&mut self) {
        self.position = 0;
        self.snapshot_fields();
    }

    fn valid(&self) -> bool {
        self.position < self.len()
    }

    fn current(&self) -> Option<HostValue> {
        self.entry_at(self.position).map(|(_, v)| v)
    }

    fn key(&self) -> Option<ArrayKey> {
        self.entry_at(self.position).map(|(k, _)| k)
    }

    fn next(&mut self) {
        self.position += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::runner::ds::error::Result;
    use crate::runner::ds::keyed_collection::KeyedCollection;
    use crate::runner::ds::object::{ClassInstance, HostObject, ObjectType, Visibility};

    /// Counts how often its fields are listed.
    struct Tally {
        inner: ClassInstance,
        listings: Rc<Cell<usize>>,
    }

    impl HostObject for Tally {
        fn class_name(&self) -> &str {
            self.inner.class_name()
        }

        fn has_property(&self, name: &str) -> bool {
            self.inner.has_property(name)
        }

        fn get_property(&self, name: &str) -> Result<Option<HostValue>> {
            self.inner.get_property(name)
        }

        fn set_property(&mut self, name: &str, value: HostValue) -> Result<()> {
            self.inner.set_property(name, value)
        }

        fn unset_property(&mut self, name: &str) -> Result<()> {
            self.inner.unset_property(name)
        }

        fn visible_fields(&self) -> Vec<(String, HostValue)> {
            self.listings.set(self.listings.get() + 1);
            self.inner.visible_fields()
        }
    }

    #[test]
    fn test_cursor_over_collection() {
        let c = KeyedCollection::from_values(vec![HostValue::from("a"), HostValue::from("b")]);
        let mut it = ArrayIterator::new(HostValue::from(c));
        it.rewind();
        assert!(it.valid());
        assert_eq!(it.key(), Some(ArrayKey::Int(0)));
        assert_eq!(it.current(), Some(HostValue::from("a")));
        it.next();
        it.next();
        assert!(!it.valid());
        assert_eq!(it.current(), None);
    }

    #[test]
    fn test_sees_entries_appended_while_iterating() {
        let array = KeyedCollection::from_values(vec![HostValue::Integer(1)]).into_ref();
        let mut it = ArrayIterator::new(HostValue::Array(array.clone()));
        it.rewind();
        it.next();
        assert!(!it.valid());
        array.borrow_mut().append(HostValue::Integer(2));
        assert!(it.valid());
        assert_eq!(it.current(), Some(HostValue::Integer(2)));
    }

    #[test]
    fn test_object_storage_yields_visible_fields() {
        let obj = ObjectType::new_instance(
            ClassInstance::new("Point")
                .with_field("x", HostValue::Integer(1), Visibility::Public)
                .with_field("secret", HostValue::Integer(2), Visibility::Private)
                .with_field("y", HostValue::Integer(3), Visibility::Public),
        );
        let it: Box<dyn HostIterator> = Box::new(ArrayIterator::new(HostValue::Object(obj)));
        let entries: Vec<_> = it.into_entries().collect();
        assert_eq!(
            entries,
            vec![
                (ArrayKey::from("x"), HostValue::Integer(1)),
                (ArrayKey::from("y"), HostValue::Integer(3)),
            ]
        );
    }

    #[test]
    fn test_object_fields_are_listed_once_per_rewind() {
        let listings = Rc::new(Cell::new(0));
        let mut inner = ClassInstance::new("Row");
        for name in &["a", "b", "c", "d"] {
            inner = inner.with_field(*name, HostValue::from(*name), Visibility::Public);
        }
        let obj = ObjectType::new_instance(Tally {
            inner,
            listings: listings.clone(),
        });
        let mut it = ArrayIterator::new(HostValue::Object(obj.clone()));
        let mut keys = Vec::new();
        it.rewind();
        while it.valid() {
            keys.push(it.key().unwrap());
            assert!(it.current().is_some());
            it.next();
        }
        assert_eq!(keys.len(), 4);
        assert_eq!(listings.get(), 2);

        obj.borrow_mut()
            .as_host_object_mut()
            .set_property("e", HostValue::Null)
            .unwrap();
        assert_eq!(it.len(), 4);
        it.rewind();
        assert_eq!(it.len(), 5);
        assert_eq!(listings.get(), 3);
    }
}
