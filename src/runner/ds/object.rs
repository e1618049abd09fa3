use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::runner::ds::array_key::ArrayKey;
use crate::runner::ds::error::{ContainerError, Result};
use crate::runner::ds::keyed_collection::KeyedCollection;
use crate::runner::ds::value::{ArrayRef, HostValue, ObjectRef};

pub const PLAIN_OBJECT_CLASS: &str = "stdClass";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

/// A field as stored, including hidden ones. Used when an object is encoded or rebuilt.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectField {
    pub name: String,
    pub value: HostValue,
    pub visibility: Visibility,
}

impl ObjectField {
    pub fn public<S: Into<String>>(name: S, value: HostValue) -> Self {
        ObjectField {
            name: name.into(),
            value,
            visibility: Visibility::Public,
        }
    }
}

/// Dynamic property access and introspection on an arbitrary host object, as seen from
/// outside the object.
pub trait HostObject {
    fn class_name(&self) -> &str;

    fn has_property(&self, name: &str) -> bool;

    /// `Ok(None)` when the property does not exist.
    fn get_property(&self, name: &str) -> Result<Option<HostValue>>;

    fn set_property(&mut self, name: &str, value: HostValue) -> Result<()>;

    fn unset_property(&mut self, name: &str) -> Result<()>;

    /// Fields observable from outside, in declaration order.
    fn visible_fields(&self) -> Vec<(String, HostValue)>;

    fn all_fields(&self) -> Vec<ObjectField> {
        self.visible_fields()
            .into_iter()
            .map(|(name, value)| ObjectField::public(name, value))
            .collect()
    }

    /// Puts back a field produced by [`HostObject::all_fields`], bypassing access checks.
    fn restore_field(&mut self, field: ObjectField) -> Result<()> {
        self.set_property(&field.name, field.value)
    }
}

/// The generic property bag. Its fields live in a keyed collection that may be shared.
pub struct PlainObject {
    fields: ArrayRef,
}

impl PlainObject {
    pub fn new() -> Self {
        PlainObject {
            fields: KeyedCollection::new().into_ref(),
        }
    }

    pub fn with_fields(fields: ArrayRef) -> Self {
        PlainObject { fields }
    }

    /// The object's own field table. Writes through the returned handle are writes to the
    /// object.
    pub fn fields(&self) -> ArrayRef {
        self.fields.clone()
    }
}

impl Default for PlainObject {
    fn default() -> Self {
        Self::new()
    }
}

impl HostObject for PlainObject {
    fn class_name(&self) -> &str {
        PLAIN_OBJECT_CLASS
    }

    fn has_property(&self, name: &str) -> bool {
        self.fields.borrow().contains_key(&ArrayKey::from_name(name))
    }

    fn get_property(&self, name: &str) -> Result<Option<HostValue>> {
        Ok(self.fields.borrow().get(&ArrayKey::from_name(name)))
    }

    fn set_property(&mut self, name: &str, value: HostValue) -> Result<()> {
        // The value may be this object's own field table.
        let value = value.detach();
        self.fields
            .borrow_mut()
            .set(ArrayKey::from_name(name), value);
        Ok(())
    }

    fn unset_property(&mut self, name: &str) -> Result<()> {
        self.fields.borrow_mut().remove(&ArrayKey::from_name(name));
        Ok(())
    }

    fn visible_fields(&self) -> Vec<(String, HostValue)> {
        self.fields
            .borrow()
            .to_entries()
            .into_iter()
            .map(|(k, v)| (k.to_name(), v))
            .collect()
    }
}

struct FieldSlot {
    value: HostValue,
    visibility: Visibility,
}

/// An instance of a named class with declared fields. Writing an undeclared name adds a
/// public field; protected and private fields cannot be touched from outside.
pub struct ClassInstance {
    class_name: String,
    fields: IndexMap<String, FieldSlot>,
}

impl ClassInstance {
    pub fn new<S: Into<String>>(class_name: S) -> Self {
        ClassInstance {
            class_name: class_name.into(),
            fields: IndexMap::new(),
        }
    }

    pub fn with_field<S: Into<String>>(
        mut self,
        name: S,
        value: HostValue,
        visibility: Visibility,
    ) -> Self {
        self.fields.insert(
            name.into(),
            FieldSlot {
                value: value.detach(),
                visibility,
            },
        );
        self
    }

    fn check_access(&self, name: &str) -> Result<Option<&FieldSlot>> {
        match self.fields.get(name) {
            Some(slot) if slot.visibility != Visibility::Public => {
                Err(ContainerError::InaccessibleProperty {
                    class: self.class_name.to_string(),
                    name: name.to_string(),
                })
            }
            slot => Ok(slot),
        }
    }
}

impl HostObject for ClassInstance {
    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn has_property(&self, name: &str) -> bool {
        matches!(
            self.fields.get(name),
            Some(FieldSlot {
                visibility: Visibility::Public,
                ..
            })
        )
    }

    fn get_property(&self, name: &str) -> Result<Option<HostValue>> {
        Ok(self
            .check_access(name)?
            .map(|slot| slot.value.clone().detach()))
    }

    fn set_property(&mut self, name: &str, value: HostValue) -> Result<()> {
        self.check_access(name)?;
        let value = value.detach();
        match self.fields.get_mut(name) {
            Some(slot) => slot.value = value,
            None => {
                self.fields.insert(
                    name.to_string(),
                    FieldSlot {
                        value,
                        visibility: Visibility::Public,
                    },
                );
            }
        }
        Ok(())
    }

    fn unset_property(&mut self, name: &str) -> Result<()> {
        self.check_access(name)?;
        self.fields.shift_remove(name);
        Ok(())
    }

    fn visible_fields(&self) -> Vec<(String, HostValue)> {
        self.fields
            .iter()
            .filter(|(_, slot)| slot.visibility == Visibility::Public)
            .map(|(name, slot)| (name.to_string(), slot.value.clone().detach()))
            .collect()
    }

    fn all_fields(&self) -> Vec<ObjectField> {
        self.fields
            .iter()
            .map(|(name, slot)| ObjectField {
                name: name.to_string(),
                value: slot.value.clone(),
                visibility: slot.visibility,
            })
            .collect()
    }

    fn restore_field(&mut self, field: ObjectField) -> Result<()> {
        self.fields.insert(
            field.name,
            FieldSlot {
                value: field.value,
                visibility: field.visibility,
            },
        );
        Ok(())
    }
}

pub enum ObjectType {
    Plain(PlainObject),
    Instance(Box<dyn HostObject>),
}

impl ObjectType {
    pub fn new_plain() -> ObjectRef {
        ObjectType::Plain(PlainObject::new()).into_ref()
    }

    pub fn new_instance<O: HostObject + 'static>(object: O) -> ObjectRef {
        ObjectType::Instance(Box::new(object)).into_ref()
    }

    pub fn into_ref(self) -> ObjectRef {
        Rc::new(RefCell::new(self))
    }

    /// The field table of a plain object; `None` for every other kind.
    pub fn plain_fields(&self) -> Option<ArrayRef> {
        match self {
            ObjectType::Plain(p) => Some(p.fields()),
            ObjectType::Instance(_) => None,
        }
    }

    pub fn as_host_object(&self) -> &dyn HostObject {
        match self {
            ObjectType::Plain(p) => p as &dyn HostObject,
            ObjectType::Instance(o) => &**o,
        }
    }

    pub fn as_host_object_mut(&mut self) -> &mut dyn HostObject {
        match self {
            ObjectType::Plain(p) => p as &mut dyn HostObject,
            ObjectType::Instance(o) => &mut **o,
        }
    }
}
