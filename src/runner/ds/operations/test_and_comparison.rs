use std::rc::Rc;

use crate::runner::ds::value::{ArrayRef, HostValue, ObjectRef};

pub fn same_object(a: &ObjectRef, b: &ObjectRef) -> bool {
    Rc::ptr_eq(a, b)
}

pub fn same_array(a: &ArrayRef, b: &ArrayRef) -> bool {
    Rc::ptr_eq(a, b)
}

/// Identity comparison: scalars by value, arrays, objects and references by handle.
pub fn same_value(a: &HostValue, b: &HostValue) -> bool {
    match (a, b) {
        (HostValue::Array(x), HostValue::Array(y)) => same_array(x, y),
        (HostValue::Object(x), HostValue::Object(y)) => same_object(x, y),
        (HostValue::Reference(x), HostValue::Reference(y)) => Rc::ptr_eq(x, y),
        _ => equal_value(a, b),
    }
}

/// Strict equality: same type and value, arrays compared entry by entry in order, objects by
/// handle. References compare by their targets.
pub fn equal_value(a: &HostValue, b: &HostValue) -> bool {
    match (a, b) {
        (HostValue::Null, HostValue::Null) => true,
        (HostValue::Boolean(x), HostValue::Boolean(y)) => x == y,
        (HostValue::Integer(x), HostValue::Integer(y)) => x == y,
        (HostValue::Float(x), HostValue::Float(y)) => x == y || (x.is_nan() && y.is_nan()),
        (HostValue::String(x), HostValue::String(y)) => x == y,
        (HostValue::Array(x), HostValue::Array(y)) => {
            same_array(x, y) || *x.borrow() == *y.borrow()
        }
        (HostValue::Object(x), HostValue::Object(y)) => same_object(x, y),
        (HostValue::Reference(x), _) => equal_value(&x.borrow(), b),
        (_, HostValue::Reference(y)) => equal_value(a, &y.borrow()),
        _ => false,
    }
}
