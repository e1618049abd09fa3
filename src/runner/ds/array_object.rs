//! The dual-mode container.
//!
//! An [`ArrayObject`] wraps either a keyed collection or a host object and gives both the
//! same surface: indexed access, property access, counting, iteration and serialization.
//! Every operation looks at the storage mode first and then goes either to the collection or
//! to the object's property accessor.

use std::cmp::Ordering;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

use bitflags::bitflags;
use log::debug;

use crate::runner::ds::array_key::ArrayKey;
use crate::runner::ds::diagnostic::Diagnostic;
use crate::runner::ds::error::{ContainerError, Result};
use crate::runner::ds::iterator::{ArrayIterator, HostIterator, DEFAULT_ITERATOR_CLASS};
use crate::runner::ds::keyed_collection::{Entry, KeyedCollection};
use crate::runner::ds::operations::type_conversion::{to_array_key, to_property_name};
use crate::runner::ds::value::{ArrayRef, HostValue, ObjectRef};
use crate::runner::plugin::types::HostContext;

bitflags! {
    /// Behaviour switches. Bits without a name are kept as given and otherwise ignored.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ContainerFlags: i64 {
        /// Property listings show the overlay instead of the storage.
        const STD_PROP_LIST = 1;
        /// Property access goes to the storage, like indexed access.
        const ARRAY_AS_PROPS = 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Collection,
    Object,
}

impl Display for StorageMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            StorageMode::Collection => write!(f, "collection"),
            StorageMode::Object => write!(f, "object"),
        }
    }
}

/// The backing store. There is always exactly one.
#[derive(Clone)]
pub enum Storage {
    Collection(ArrayRef),
    Object(ObjectRef),
}

impl Storage {
    /// Picks the backing store for `input`.
    ///
    /// A plain object is not wrapped: its own field table becomes the collection, so writes
    /// through the container and through the object land in the same place.
    pub fn from_value(input: &HostValue) -> Result<Storage> {
        match input {
            HostValue::Null => Ok(Storage::Collection(KeyedCollection::new().into_ref())),
            HostValue::Array(a) => Ok(Storage::Collection(a.clone())),
            HostValue::Object(o) => {
                let fields = o.borrow().plain_fields();
                match fields {
                    Some(fields) => Ok(Storage::Collection(fields)),
                    None => Ok(Storage::Object(o.clone())),
                }
            }
            HostValue::Reference(r) => Storage::from_value(&r.borrow()),
            other => Err(ContainerError::InvalidArgument(format!(
                "expects an array or an object, {} given",
                other.type_name()
            ))),
        }
    }

    pub fn mode(&self) -> StorageMode {
        match self {
            Storage::Collection(_) => StorageMode::Collection,
            Storage::Object(_) => StorageMode::Object,
        }
    }

    pub fn as_value(&self) -> HostValue {
        match self {
            Storage::Collection(a) => HostValue::Array(a.clone()),
            Storage::Object(o) => HostValue::Object(o.clone()),
        }
    }
}

fn normalize_iterator_class(name: &str) -> Option<String> {
    if name.eq_ignore_ascii_case(DEFAULT_ITERATOR_CLASS) {
        None
    } else {
        Some(name.to_string())
    }
}

fn illegal_offset(index: &HostValue) -> ContainerError {
    ContainerError::IllegalOffset(index.type_name().to_string())
}

pub struct ArrayObject {
    storage: Storage,
    flags: ContainerFlags,
    overlay: Option<KeyedCollection>,
    iterator_class: Option<String>,
    ctx: Rc<HostContext>,
}

impl ArrayObject {
    /// Creates a container in a fresh default context.
    pub fn new(
        input: HostValue,
        flags: ContainerFlags,
        iterator_class: Option<&str>,
    ) -> Result<Self> {
        Self::new_in(HostContext::default().shared(), input, flags, iterator_class)
    }

    pub fn new_in(
        ctx: Rc<HostContext>,
        input: HostValue,
        flags: ContainerFlags,
        iterator_class: Option<&str>,
    ) -> Result<Self> {
        let storage = Storage::from_value(&input)?;
        Ok(ArrayObject {
            storage,
            flags,
            overlay: None,
            iterator_class: iterator_class.and_then(normalize_iterator_class),
            ctx,
        })
    }

    /// Rebuilds a container from the output of [`ArrayObject::serialize`].
    pub fn from_payload(ctx: Rc<HostContext>, payload: &str) -> Result<Self> {
        let mut container = Self::new_in(ctx, HostValue::Null, ContainerFlags::empty(), None)?;
        container.unserialize(payload)?;
        Ok(container)
    }

    pub fn context(&self) -> &Rc<HostContext> {
        &self.ctx
    }

    pub fn storage_mode(&self) -> StorageMode {
        self.storage.mode()
    }

    /// The current storage as one value, as iterators receive it.
    pub fn storage_value(&self) -> HostValue {
        self.storage.as_value()
    }

    pub fn overlay(&self) -> Option<&KeyedCollection> {
        self.overlay.as_ref()
    }

    pub fn offset_exists(&self, index: &HostValue) -> bool {
        match &self.storage {
            Storage::Collection(a) => match to_array_key(index) {
                Some(key) => a.borrow().contains_key(&key),
                None => false,
            },
            Storage::Object(o) => match to_property_name(index) {
                Some(name) => o.borrow().as_host_object().has_property(&name),
                None => false,
            },
        }
    }

    /// Reads an entry. A missing entry is reported and reads as null.
    pub fn offset_get(&self, index: &HostValue) -> Result<HostValue> {
        match &self.storage {
            Storage::Collection(a) => {
                let key = to_array_key(index).ok_or_else(|| illegal_offset(index))?;
                let found = a.borrow().get(&key);
                match found {
                    Some(v) => Ok(v),
                    None => {
                        self.ctx.report(Diagnostic::UndefinedIndex(key));
                        Ok(HostValue::Null)
                    }
                }
            }
            Storage::Object(o) => {
                let name = to_property_name(index).ok_or_else(|| illegal_offset(index))?;
                let found = o.borrow().as_host_object().get_property(&name)?;
                match found {
                    Some(v) => Ok(v),
                    None => {
                        self.ctx.report(Diagnostic::UndefinedProperty(name));
                        Ok(HostValue::Null)
                    }
                }
            }
        }
    }

    /// Writes an entry; a null index appends. A `HostValue::Reference` is stored as an alias.
    pub fn offset_set(&mut self, index: &HostValue, value: HostValue) -> Result<()> {
        if index.is_null() {
            self.append(value);
            return Ok(());
        }
        match &self.storage {
            Storage::Collection(a) => {
                let key = to_array_key(index).ok_or_else(|| illegal_offset(index))?;
                // Copy before borrowing: the value may be the storage itself.
                let value = value.detach();
                a.borrow_mut().set(key, value);
                Ok(())
            }
            Storage::Object(o) => {
                let name = to_property_name(index).ok_or_else(|| illegal_offset(index))?;
                o.borrow_mut().as_host_object_mut().set_property(&name, value)
            }
        }
    }

    pub fn offset_unset(&mut self, index: &HostValue) -> Result<()> {
        match &self.storage {
            Storage::Collection(a) => {
                let key = to_array_key(index).ok_or_else(|| illegal_offset(index))?;
                a.borrow_mut().remove(&key);
                Ok(())
            }
            Storage::Object(o) => {
                let name = to_property_name(index).ok_or_else(|| illegal_offset(index))?;
                o.borrow_mut().as_host_object_mut().unset_property(&name)
            }
        }
    }

    /// Entries in the collection, or visible fields of the object. The overlay never counts.
    pub fn count(&self) -> usize {
        match &self.storage {
            Storage::Collection(a) => a.borrow().len(),
            Storage::Object(o) => o.borrow().as_host_object().visible_fields().len(),
        }
    }

    fn props_are_entries(&self) -> bool {
        self.flags.contains(ContainerFlags::ARRAY_AS_PROPS)
    }

    /// Sets a dynamic property.
    ///
    /// Without `ARRAY_AS_PROPS` the value is copied into the overlay; a reference is copied as
    /// its target, the overlay holds no aliases.
    pub fn set_property(&mut self, name: &str, value: HostValue) -> Result<()> {
        if self.props_are_entries() {
            return self.offset_set(&HostValue::from(name), value);
        }
        self.overlay
            .get_or_insert_with(KeyedCollection::new)
            .set(ArrayKey::from_name(name), value.deep_copy());
        Ok(())
    }

    pub fn get_property(&self, name: &str) -> Result<HostValue> {
        if self.props_are_entries() {
            return self.offset_get(&HostValue::from(name));
        }
        let found = self
            .overlay
            .as_ref()
            .and_then(|overlay| overlay.get(&ArrayKey::from_name(name)));
        match found {
            Some(v) => Ok(v),
            None => {
                self.ctx
                    .report(Diagnostic::UndefinedProperty(name.to_string()));
                Ok(HostValue::Null)
            }
        }
    }

    pub fn has_property(&self, name: &str) -> bool {
        if self.props_are_entries() {
            return self.offset_exists(&HostValue::from(name));
        }
        self.overlay
            .as_ref()
            .map_or(false, |overlay| overlay.contains_key(&ArrayKey::from_name(name)))
    }

    pub fn unset_property(&mut self, name: &str) -> Result<()> {
        if self.props_are_entries() {
            return self.offset_unset(&HostValue::from(name));
        }
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.remove(&ArrayKey::from_name(name));
        }
        Ok(())
    }

    /// What a generic property listing of the container shows.
    pub fn properties(&self) -> Vec<(ArrayKey, HostValue)> {
        if self.flags.contains(ContainerFlags::STD_PROP_LIST) {
            return self
                .overlay
                .as_ref()
                .map(|overlay| overlay.to_entries())
                .unwrap_or_default();
        }
        self.storage_entries()
    }

    fn storage_entries(&self) -> Vec<(ArrayKey, HostValue)> {
        match &self.storage {
            Storage::Collection(a) => a.borrow().to_entries(),
            Storage::Object(o) => o
                .borrow()
                .as_host_object()
                .visible_fields()
                .into_iter()
                .map(|(name, value)| (ArrayKey::from_name(&name), value))
                .collect(),
        }
    }

    pub fn get_iterator(&self) -> Result<Box<dyn HostIterator>> {
        match &self.iterator_class {
            None => Ok(Box::new(ArrayIterator::new(self.storage_value()))),
            Some(name) => self.ctx.iterators.construct(name, self.storage_value()),
        }
    }

    /// Appends under the next integer key. Objects cannot be appended to; that is reported
    /// and the object is left alone.
    pub fn append(&mut self, value: HostValue) {
        match &self.storage {
            Storage::Collection(a) => {
                let value = value.detach();
                a.borrow_mut().append(value);
            }
            Storage::Object(_) => self.ctx.report(Diagnostic::UnsupportedOperation(
                "Cannot append properties to objects, use offset_set() instead".to_string(),
            )),
        }
    }

    /// Replaces the storage and returns the previous one.
    pub fn exchange_array(&mut self, input: HostValue) -> Result<HostValue> {
        let storage = Storage::from_value(&input)?;
        let previous = self.storage_value();
        debug!(
            "exchanging {} storage for {} storage",
            self.storage.mode(),
            storage.mode()
        );
        self.storage = storage;
        Ok(previous)
    }

    pub fn get_array_copy(&self) -> KeyedCollection {
        match &self.storage {
            Storage::Collection(a) => a.borrow().deep_copy(),
            Storage::Object(_) => self.storage_entries().into_iter().collect(),
        }
    }

    pub fn get_flags(&self) -> ContainerFlags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: ContainerFlags) {
        self.flags = flags;
    }

    pub fn get_iterator_class(&self) -> &str {
        self.iterator_class
            .as_deref()
            .unwrap_or(DEFAULT_ITERATOR_CLASS)
    }

    /// Names the iterator type [`ArrayObject::get_iterator`] builds. The name is checked only
    /// when an iterator is requested.
    pub fn set_iterator_class(&mut self, name: &str) {
        self.iterator_class = normalize_iterator_class(name);
    }

    pub fn asort(&mut self) -> Result<()> {
        Err(ContainerError::NotImplemented("ArrayObject::asort".to_string()))
    }

    pub fn ksort(&mut self) -> Result<()> {
        Err(ContainerError::NotImplemented("ArrayObject::ksort".to_string()))
    }

    pub fn natsort(&mut self) -> Result<()> {
        Err(ContainerError::NotImplemented("ArrayObject::natsort".to_string()))
    }

    pub fn natcasesort(&mut self) -> Result<()> {
        Err(ContainerError::NotImplemented(
            "ArrayObject::natcasesort".to_string(),
        ))
    }

    pub fn uasort<F>(&mut self, _compare: F) -> Result<()>
    where
        F: Fn(&HostValue, &HostValue) -> Ordering,
    {
        Err(ContainerError::NotImplemented("ArrayObject::uasort".to_string()))
    }

    pub fn uksort<F>(&mut self, _compare: F) -> Result<()>
    where
        F: Fn(&ArrayKey, &ArrayKey) -> Ordering,
    {
        Err(ContainerError::NotImplemented("ArrayObject::uksort".to_string()))
    }

    /// Encodes `[flags, storage, overlay, iterator class]` with the context codec.
    pub fn serialize(&self) -> Result<String> {
        let mut slots = KeyedCollection::new();
        slots.append(HostValue::Integer(self.flags.bits()));
        slots.append(self.storage_value());
        slots.append(HostValue::from(self.overlay.clone().unwrap_or_default()));
        slots.append(match &self.iterator_class {
            Some(name) => HostValue::from(name.as_str()),
            None => HostValue::Null,
        });
        self.ctx.encode(&HostValue::from(slots))
    }

    /// Restores state written by [`ArrayObject::serialize`].
    ///
    /// Every slot is checked before anything is assigned, so a rejected payload leaves the
    /// container as it was.
    pub fn unserialize(&mut self, payload: &str) -> Result<()> {
        let decoded = self.ctx.decode(payload)?;
        let slots = decoded
            .as_array()
            .ok_or_else(|| ContainerError::malformed("expected an array of slots"))?;
        let slots = slots.borrow();
        // The decoded payload is ours alone, so its handles are taken without copying.
        let slot = |index: i64| slots.get_entry(&ArrayKey::Int(index)).map(Entry::value);

        let flags = match slot(0) {
            Some(HostValue::Integer(bits)) => ContainerFlags::from_bits_retain(bits),
            _ => return Err(ContainerError::malformed("slot 0 must hold the flags")),
        };
        let storage = match slot(1) {
            Some(HostValue::Array(a)) => Storage::Collection(a),
            Some(HostValue::Object(o)) => Storage::Object(o),
            _ => {
                return Err(ContainerError::malformed(
                    "slot 1 must hold an array or an object",
                ))
            }
        };
        let overlay = match slot(2) {
            Some(HostValue::Array(a)) => {
                let members = a.borrow().clone();
                if members.is_empty() {
                    None
                } else {
                    Some(members)
                }
            }
            _ => return Err(ContainerError::malformed("slot 2 must hold the members")),
        };
        let iterator_class = match slot(3) {
            None | Some(HostValue::Null) => None,
            Some(HostValue::String(name)) => normalize_iterator_class(&name),
            _ => {
                return Err(ContainerError::malformed(
                    "slot 3 must hold an iterator class name",
                ))
            }
        };

        debug!(
            "restored {} storage with flags {:#x}",
            storage.mode(),
            flags.bits()
        );
        self.flags = flags;
        self.storage = storage;
        self.overlay = overlay;
        self.iterator_class = iterator_class;
        Ok(())
    }
}

impl Display for ArrayObject {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let overlay = match &self.overlay {
            Some(overlay) => HostValue::from(overlay.clone()),
            None => HostValue::new_array(),
        };
        write!(
            f,
            "ArrayObject {{ flags: {}, mode: {}, storage: {}, overlay: {}, iterator: {} }}",
            self.flags.bits(),
            self.storage.mode(),
            self.storage_value(),
            overlay,
            self.get_iterator_class()
        )
    }
}
