use std::cell::RefCell;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

use crate::runner::ds::keyed_collection::KeyedCollection;
use crate::runner::ds::object::ObjectType;
use crate::runner::ds::operations::test_and_comparison::equal_value;
use crate::runner::ds::operations::type_conversion::{
    TYPE_STR_ARRAY, TYPE_STR_BOOLEAN, TYPE_STR_FLOAT, TYPE_STR_INTEGER, TYPE_STR_NULL,
    TYPE_STR_OBJECT, TYPE_STR_REFERENCE, TYPE_STR_STRING,
};

/// Shared handle to a keyed collection.
pub type ArrayRef = Rc<RefCell<KeyedCollection>>;

/// Shared handle to a host object. Objects are never owned by the values that hold them.
pub type ObjectRef = Rc<RefCell<ObjectType>>;

/// A by-reference slot; every holder of the `Rc` sees writes made through any other.
pub type ValueRef = Rc<RefCell<HostValue>>;

pub enum HostValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(ArrayRef),
    Object(ObjectRef),
    Reference(ValueRef),
}

impl HostValue {
    pub fn new_array() -> Self {
        HostValue::Array(KeyedCollection::new().into_ref())
    }

    pub fn from_collection(collection: KeyedCollection) -> Self {
        HostValue::Array(collection.into_ref())
    }

    pub fn new_reference(value: HostValue) -> Self {
        HostValue::Reference(Rc::new(RefCell::new(value)))
    }

    pub fn is_null(&self) -> bool {
        match self {
            HostValue::Null => true,
            HostValue::Reference(r) => r.borrow().is_null(),
            _ => false,
        }
    }

    /// The value itself, or for a reference the value it currently points at.
    pub fn deref_value(&self) -> HostValue {
        match self {
            HostValue::Reference(r) => r.borrow().deref_value(),
            v => v.clone(),
        }
    }

    pub fn as_array(&self) -> Option<ArrayRef> {
        match self {
            HostValue::Array(a) => Some(a.clone()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<ObjectRef> {
        match self {
            HostValue::Object(o) => Some(o.clone()),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            HostValue::Null => TYPE_STR_NULL,
            HostValue::Boolean(_) => TYPE_STR_BOOLEAN,
            HostValue::Integer(_) => TYPE_STR_INTEGER,
            HostValue::Float(_) => TYPE_STR_FLOAT,
            HostValue::String(_) => TYPE_STR_STRING,
            HostValue::Array(_) => TYPE_STR_ARRAY,
            HostValue::Object(_) => TYPE_STR_OBJECT,
            HostValue::Reference(_) => TYPE_STR_REFERENCE,
        }
    }

    /// Copies arrays recursively. Object handles and reference entries inside arrays stay
    /// shared; a top level reference is replaced by a copy of its target.
    pub fn deep_copy(&self) -> HostValue {
        match self {
            HostValue::Array(a) => HostValue::Array(a.borrow().deep_copy().into_ref()),
            HostValue::Reference(r) => r.borrow().deep_copy(),
            v => v.clone(),
        }
    }

    /// Prepares a value to be stored by value. An array whose handle is also held elsewhere is
    /// copied, so later writes through that handle cannot reach the stored entry. Anything else,
    /// references included, is returned as is.
    pub fn detach(self) -> HostValue {
        match self {
            HostValue::Array(a) if Rc::strong_count(&a) > 1 => {
                let copy = a.borrow().deep_copy();
                HostValue::Array(copy.into_ref())
            }
            v => v,
        }
    }
}

impl Clone for HostValue {
    fn clone(&self) -> Self {
        match self {
            HostValue::Null => HostValue::Null,
            HostValue::Boolean(b) => HostValue::Boolean(*b),
            HostValue::Integer(i) => HostValue::Integer(*i),
            HostValue::Float(f) => HostValue::Float(*f),
            HostValue::String(s) => HostValue::String(s.to_string()),
            HostValue::Array(a) => HostValue::Array(a.clone()),
            HostValue::Object(o) => HostValue::Object(o.clone()),
            HostValue::Reference(r) => HostValue::Reference(r.clone()),
        }
    }
}

impl Default for HostValue {
    fn default() -> Self {
        HostValue::Null
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Boolean(b)
    }
}

impl From<i64> for HostValue {
    fn from(i: i64) -> Self {
        HostValue::Integer(i)
    }
}

impl From<f64> for HostValue {
    fn from(f: f64) -> Self {
        HostValue::Float(f)
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::String(s.to_string())
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::String(s)
    }
}

impl From<KeyedCollection> for HostValue {
    fn from(collection: KeyedCollection) -> Self {
        HostValue::from_collection(collection)
    }
}

impl Display for HostValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Null => write!(f, "{}", TYPE_STR_NULL),
            HostValue::Boolean(b) => write!(f, "bool({})", b),
            HostValue::Integer(i) => write!(f, "{}", i),
            HostValue::Float(n) => {
                if n.is_finite() && n.fract() == 0.0 {
                    write!(f, "{:.1}", n)
                } else {
                    write!(f, "{}", n)
                }
            }
            HostValue::String(s) => write!(f, "{:?}", s),
            HostValue::Array(a) => {
                let a = a.borrow();
                write!(f, "[")?;
                for (idx, (key, entry)) in a.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} => {}", key, entry.value())?;
                }
                write!(f, "]")
            }
            HostValue::Object(o) => {
                let o = o.borrow();
                let obj = o.as_host_object();
                write!(f, "{} {{", obj.class_name())?;
                for (idx, (name, value)) in obj.visible_fields().iter().enumerate() {
                    if idx > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " {}: {}", name, value)?;
                }
                write!(f, " }}")
            }
            HostValue::Reference(r) => write!(f, "&{}", r.borrow()),
        }
    }
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Null => write!(f, "HostValue::Null"),
            HostValue::Boolean(b) => write!(f, "HostValue::Boolean({})", b),
            HostValue::Integer(i) => write!(f, "HostValue::Integer({})", i),
            HostValue::Float(n) => write!(f, "HostValue::Float({:?})", n),
            HostValue::String(s) => write!(f, "HostValue::String({:?})", s),
            HostValue::Array(_) => write!(f, "HostValue::Array({})", self),
            HostValue::Object(_) => write!(f, "HostValue::Object({})", self),
            HostValue::Reference(r) => write!(f, "HostValue::Reference({:?})", r.borrow()),
        }
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        equal_value(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::array_key::ArrayKey;

    #[test]
    fn test_deep_copy_detaches_nested_arrays() {
        let inner = KeyedCollection::from_values(vec![HostValue::Integer(1)]).into_ref();
        let outer = KeyedCollection::from_values(vec![HostValue::Array(inner.clone())]);
        let original = HostValue::from_collection(outer);

        let copy = original.deep_copy();
        let stored_inner = original
            .as_array()
            .unwrap()
            .borrow()
            .get_entry(&ArrayKey::Int(0))
            .unwrap()
            .value();
        stored_inner.as_array().unwrap().borrow_mut().append(HostValue::Integer(2));

        let copied_inner = copy
            .as_array()
            .unwrap()
            .borrow()
            .get(&ArrayKey::Int(0))
            .unwrap();
        assert_eq!(copied_inner.as_array().unwrap().borrow().len(), 1);
        assert_ne!(original, copy);
    }

    #[test]
    fn test_detach_copies_only_shared_arrays() {
        let shared = KeyedCollection::from_values(vec![HostValue::Integer(1)]).into_ref();
        let detached = HostValue::Array(shared.clone()).detach();
        assert!(!Rc::ptr_eq(&detached.as_array().unwrap(), &shared));
        assert_eq!(detached, HostValue::Array(shared.clone()));

        let unshared = HostValue::new_array();
        let handle = unshared.as_array().unwrap().as_ptr();
        assert_eq!(unshared.detach().as_array().unwrap().as_ptr(), handle);

        let r = HostValue::new_reference(HostValue::new_array());
        assert!(matches!(r.detach(), HostValue::Reference(_)));
    }

    #[test]
    fn test_deep_copy_of_reference_copies_target() {
        let r = HostValue::new_reference(HostValue::from("x"));
        let copy = r.deep_copy();
        assert_eq!(copy, HostValue::from("x"));
        assert_eq!(copy.type_name(), TYPE_STR_STRING);
    }

    #[test]
    fn test_integer_and_float_are_distinct() {
        assert_ne!(HostValue::Integer(1), HostValue::Float(1.0));
        assert_eq!(HostValue::Float(1.5), HostValue::Float(1.5));
    }

    #[test]
    fn test_display() {
        let c = KeyedCollection::from_values(vec![HostValue::Integer(1), HostValue::from("a")]);
        assert_eq!(HostValue::from(c).to_string(), "[0 => 1, 1 => \"a\"]");
        assert_eq!(HostValue::Float(2.0).to_string(), "2.0");
        assert_eq!(HostValue::Null.to_string(), "null");
    }
}
