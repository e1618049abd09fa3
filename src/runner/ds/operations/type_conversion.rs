use crate::runner::ds::array_key::ArrayKey;
use crate::runner::ds::value::HostValue;

pub const TYPE_STR_NULL: &str = "null";
pub const TYPE_STR_BOOLEAN: &str = "boolean";
pub const TYPE_STR_INTEGER: &str = "integer";
pub const TYPE_STR_FLOAT: &str = "float";
pub const TYPE_STR_STRING: &str = "string";
pub const TYPE_STR_ARRAY: &str = "array";
pub const TYPE_STR_OBJECT: &str = "object";
pub const TYPE_STR_REFERENCE: &str = "reference";

/// Parses `s` when it is the canonical decimal spelling of an `i64`: optional `-`, no
/// leading zeros, no `+`, no `-0`, no surrounding whitespace.
pub fn canonical_integer_string(s: &str) -> Option<i64> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    if s.starts_with('-') && digits == "0" {
        return None;
    }
    s.parse::<i64>().ok()
}

/// Converts an index value to a collection key. Arrays and objects are not valid keys.
pub fn to_array_key(v: &HostValue) -> Option<ArrayKey> {
    match v {
        HostValue::Null => Some(ArrayKey::Str(String::new())),
        HostValue::Boolean(b) => Some(ArrayKey::Int(if *b { 1 } else { 0 })),
        HostValue::Integer(i) => Some(ArrayKey::Int(*i)),
        HostValue::Float(f) => {
            if f.is_finite() {
                Some(ArrayKey::Int(f.trunc() as i64))
            } else {
                Some(ArrayKey::Int(0))
            }
        }
        HostValue::String(s) => Some(ArrayKey::from_name(s)),
        HostValue::Array(_) => None,
        HostValue::Object(_) => None,
        HostValue::Reference(r) => to_array_key(&r.borrow()),
    }
}

/// Converts an index value to a dynamic property name.
pub fn to_property_name(v: &HostValue) -> Option<String> {
    to_array_key(v).map(|k| k.to_name())
}
