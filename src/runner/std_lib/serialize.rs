//! Value codec.
//!
//! Values are written in a length-prefixed text form:
//!
//! ```text
//! N;                      null
//! b:1;                    boolean
//! i:42;                   integer
//! d:0.5;                  float (also INF, -INF, NAN)
//! s:5:"hello";            string, length in bytes
//! a:2:{i:0;N;s:1:"k";b:0;}
//! O:8:"stdClass":1:{s:1:"x";i:5;}
//! ```
//!
//! Object fields that are not public carry their visibility in the encoded name: protected
//! fields as `\0*\0name`, private ones as `\0Class\0name`. References are written as the value
//! they point at.

use crate::runner::ds::array_key::ArrayKey;
use crate::runner::ds::error::{ContainerError, Result};
use crate::runner::ds::keyed_collection::KeyedCollection;
use crate::runner::ds::object::{ObjectField, Visibility};
use crate::runner::ds::value::HostValue;
use crate::runner::plugin::config::DEFAULT_MAX_DEPTH;
use crate::runner::plugin::registry::ClassRegistry;

pub trait SerializationCodec {
    fn encode(&self, value: &HostValue, max_depth: usize) -> Result<String>;

    /// Decodes one complete value. Objects are constructed through `classes`.
    fn decode(&self, payload: &str, classes: &ClassRegistry, max_depth: usize)
        -> Result<HostValue>;
}

/// The default codec, see the module docs for the format.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl SerializationCodec for TextCodec {
    fn encode(&self, value: &HostValue, max_depth: usize) -> Result<String> {
        let mut out = String::new();
        encode_value(&mut out, value, 0, max_depth)?;
        Ok(out)
    }

    fn decode(
        &self,
        payload: &str,
        classes: &ClassRegistry,
        max_depth: usize,
    ) -> Result<HostValue> {
        let mut decoder = Decoder {
            input: payload.as_bytes(),
            pos: 0,
            classes,
            max_depth,
        };
        let value = decoder.parse_value(0)?;
        if decoder.pos != decoder.input.len() {
            return Err(ContainerError::malformed(format!(
                "unexpected trailing data at offset {}",
                decoder.pos
            )));
        }
        Ok(value)
    }
}

/// Encode with the default codec and limits.
pub fn serialize(value: &HostValue) -> Result<String> {
    TextCodec.encode(value, DEFAULT_MAX_DEPTH)
}

/// Decode with the default codec, core classes and limits.
pub fn unserialize(payload: &str) -> Result<HostValue> {
    TextCodec.decode(payload, &ClassRegistry::with_core(), DEFAULT_MAX_DEPTH)
}

fn encode_value(out: &mut String, value: &HostValue, depth: usize, max_depth: usize) -> Result<()> {
    if depth > max_depth {
        return Err(ContainerError::NestingTooDeep(max_depth));
    }
    match value {
        HostValue::Null => out.push_str("N;"),
        HostValue::Boolean(b) => out.push_str(if *b { "b:1;" } else { "b:0;" }),
        HostValue::Integer(i) => out.push_str(&format!("i:{};", i)),
        HostValue::Float(f) => out.push_str(&format!("d:{};", encode_float(*f))),
        HostValue::String(s) => encode_string(out, s),
        HostValue::Array(a) => {
            let a = a.borrow();
            out.push_str(&format!("a:{}:{{", a.len()));
            for (key, entry) in a.iter() {
                encode_key(out, key);
                encode_value(out, &entry.value(), depth + 1, max_depth)?;
            }
            out.push('}');
        }
        HostValue::Object(o) => {
            let o = o.borrow();
            let obj = o.as_host_object();
            let class = obj.class_name();
            let fields = obj.all_fields();
            out.push_str(&format!(
                "O:{}:\"{}\":{}:{{",
                class.len(),
                class,
                fields.len()
            ));
            for field in &fields {
                encode_string(out, &mangle_field_name(class, field));
                encode_value(out, &field.value, depth + 1, max_depth)?;
            }
            out.push('}');
        }
        HostValue::Reference(r) => encode_value(out, &r.borrow(), depth, max_depth)?,
    }
    Ok(())
}

fn encode_float(f: f64) -> String {
    if f.is_nan() {
        "NAN".to_string()
    } else if f.is_infinite() {
        if f > 0.0 {
            "INF".to_string()
        } else {
            "-INF".to_string()
        }
    } else {
        f.to_string()
    }
}

fn encode_string(out: &mut String, s: &str) {
    out.push_str(&format!("s:{}:\"{}\";", s.len(), s));
}

fn encode_key(out: &mut String, key: &ArrayKey) {
    match key {
        ArrayKey::Int(i) => out.push_str(&format!("i:{};", i)),
        ArrayKey::Str(s) => encode_string(out, s),
    }
}

fn mangle_field_name(class: &str, field: &ObjectField) -> String {
    match field.visibility {
        Visibility::Public => field.name.to_string(),
        Visibility::Protected => format!("\0*\0{}", field.name),
        Visibility::Private => format!("\0{}\0{}", class, field.name),
    }
}

fn unmangle_field(raw: String, value: HostValue) -> ObjectField {
    if let Some(rest) = raw.strip_prefix('\0') {
        if let Some(idx) = rest.find('\0') {
            let visibility = if &rest[..idx] == "*" {
                Visibility::Protected
            } else {
                Visibility::Private
            };
            return ObjectField {
                name: rest[idx + 1..].to_string(),
                value,
                visibility,
            };
        }
    }
    ObjectField::public(raw, value)
}

struct Decoder<'a> {
    input: &'a [u8],
    pos: usize,
    classes: &'a ClassRegistry,
    max_depth: usize,
}

impl<'a> Decoder<'a> {
    fn next_byte(&mut self) -> Result<u8> {
        match self.input.get(self.pos) {
            Some(b) => {
                self.pos += 1;
                Ok(*b)
            }
            None => Err(ContainerError::malformed("unexpected end of payload")),
        }
    }

    fn expect(&mut self, expected: u8) -> Result<()> {
        let offset = self.pos;
        let found = self.next_byte()?;
        if found == expected {
            Ok(())
        } else {
            Err(ContainerError::malformed(format!(
                "expected '{}' at offset {}, found '{}'",
                expected as char, offset, found as char
            )))
        }
    }

    /// Reads up to `terminator` and consumes it.
    fn read_until(&mut self, terminator: u8) -> Result<&'a str> {
        let input: &'a [u8] = self.input;
        let start = self.pos;
        let len = input[start..]
            .iter()
            .position(|b| *b == terminator)
            .ok_or_else(|| {
                ContainerError::malformed(format!(
                    "missing '{}' after offset {}",
                    terminator as char, start
                ))
            })?;
        self.pos = start + len + 1;
        std::str::from_utf8(&input[start..start + len])
            .map_err(|_| ContainerError::malformed(format!("invalid UTF-8 at offset {}", start)))
    }

    fn read_int(&mut self, terminator: u8) -> Result<i64> {
        let raw = self.read_until(terminator)?;
        raw.parse::<i64>()
            .map_err(|_| ContainerError::malformed(format!("invalid integer '{}'", raw)))
    }

    fn read_len(&mut self, terminator: u8) -> Result<usize> {
        let raw = self.read_until(terminator)?;
        raw.parse::<usize>()
            .map_err(|_| ContainerError::malformed(format!("invalid length '{}'", raw)))
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let input: &'a [u8] = self.input;
        let start = self.pos;
        let end = start
            .checked_add(len)
            .filter(|end| *end <= input.len())
            .ok_or_else(|| ContainerError::malformed("string runs past end of payload"))?;
        self.pos = end;
        Ok(&input[start..end])
    }

    /// `<len>:"<bytes>"`, the part shared by strings and class names.
    fn read_quoted(&mut self) -> Result<String> {
        let len = self.read_len(b':')?;
        self.expect(b'"')?;
        let offset = self.pos;
        let bytes = self.read_bytes(len)?;
        self.expect(b'"')?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| ContainerError::malformed(format!("invalid UTF-8 at offset {}", offset)))
    }

    fn parse_value(&mut self, depth: usize) -> Result<HostValue> {
        if depth > self.max_depth {
            return Err(ContainerError::NestingTooDeep(self.max_depth));
        }
        let offset = self.pos;
        match self.next_byte()? {
            b'N' => {
                self.expect(b';')?;
                Ok(HostValue::Null)
            }
            b'b' => {
                self.expect(b':')?;
                match self.read_until(b';')? {
                    "0" => Ok(HostValue::Boolean(false)),
                    "1" => Ok(HostValue::Boolean(true)),
                    other => Err(ContainerError::malformed(format!(
                        "invalid boolean '{}'",
                        other
                    ))),
                }
            }
            b'i' => {
                self.expect(b':')?;
                Ok(HostValue::Integer(self.read_int(b';')?))
            }
            b'd' => {
                self.expect(b':')?;
                let raw = self.read_until(b';')?;
                parse_float(raw).map(HostValue::Float)
            }
            b's' => {
                self.expect(b':')?;
                let s = self.read_quoted()?;
                self.expect(b';')?;
                Ok(HostValue::String(s))
            }
            b'a' => {
                self.expect(b':')?;
                let count = self.read_len(b':')?;
                self.expect(b'{')?;
                let mut collection = KeyedCollection::new();
                for _ in 0..count {
                    let key = self.parse_key()?;
                    let value = self.parse_value(depth + 1)?;
                    collection.set(key, value);
                }
                self.expect(b'}')?;
                Ok(HostValue::Array(collection.into_ref()))
            }
            b'O' => {
                self.expect(b':')?;
                let class = self.read_quoted()?;
                self.expect(b':')?;
                let count = self.read_len(b':')?;
                self.expect(b'{')?;
                let obj = self.classes.construct(&class);
                for _ in 0..count {
                    let name = self.parse_key()?.to_name();
                    let value = self.parse_value(depth + 1)?;
                    obj.borrow_mut()
                        .as_host_object_mut()
                        .restore_field(unmangle_field(name, value))?;
                }
                self.expect(b'}')?;
                Ok(HostValue::Object(obj))
            }
            other => Err(ContainerError::malformed(format!(
                "unexpected '{}' at offset {}",
                other as char, offset
            ))),
        }
    }

    fn parse_key(&mut self) -> Result<ArrayKey> {
        let offset = self.pos;
        match self.next_byte()? {
            b'i' => {
                self.expect(b':')?;
                Ok(ArrayKey::Int(self.read_int(b';')?))
            }
            b's' => {
                self.expect(b':')?;
                let s = self.read_quoted()?;
                self.expect(b';')?;
                Ok(ArrayKey::from_name(&s))
            }
            other => Err(ContainerError::malformed(format!(
                "invalid key type '{}' at offset {}",
                other as char, offset
            ))),
        }
    }
}

fn parse_float(raw: &str) -> Result<f64> {
    match raw {
        "INF" => Ok(f64::INFINITY),
        "-INF" => Ok(f64::NEG_INFINITY),
        "NAN" => Ok(f64::NAN),
        _ => raw
            .parse::<f64>()
            .map_err(|_| ContainerError::malformed(format!("invalid float '{}'", raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::object::{ClassInstance, ObjectType, PlainObject};

    #[test]
    fn test_scalars() {
        assert_eq!(serialize(&HostValue::Null).unwrap(), "N;");
        assert_eq!(serialize(&HostValue::Boolean(true)).unwrap(), "b:1;");
        assert_eq!(serialize(&HostValue::Integer(-12)).unwrap(), "i:-12;");
        assert_eq!(serialize(&HostValue::Float(0.5)).unwrap(), "d:0.5;");
        assert_eq!(serialize(&HostValue::Float(f64::NEG_INFINITY)).unwrap(), "d:-INF;");
        assert_eq!(serialize(&HostValue::from("héllo")).unwrap(), "s:6:\"héllo\";");
    }

    #[test]
    fn test_string_length_is_authoritative() {
        let v = unserialize("s:5:\"a\";b\";c\";").unwrap_err();
        assert!(matches!(v, ContainerError::MalformedPayload(_)));
        assert_eq!(
            unserialize("s:6:\"a\";b\"c\";").unwrap(),
            HostValue::from("a\";b\"c")
        );
    }

    #[test]
    fn test_array_layout() {
        let mut c = KeyedCollection::new();
        c.append(HostValue::Null);
        c.set(ArrayKey::from("k"), HostValue::Boolean(false));
        let encoded = serialize(&HostValue::from(c)).unwrap();
        assert_eq!(encoded, "a:2:{i:0;N;s:1:\"k\";b:0;}");
    }

    #[test]
    fn test_numeric_string_keys_decode_as_int() {
        let decoded = unserialize("a:1:{s:1:\"7\";i:1;}").unwrap();
        let a = decoded.as_array().unwrap();
        assert_eq!(a.borrow().keys(), vec![ArrayKey::Int(7)]);
    }

    #[test]
    fn test_plain_object() {
        let obj = ObjectType::new_plain();
        obj.borrow_mut()
            .as_host_object_mut()
            .set_property("x", HostValue::Integer(5))
            .unwrap();
        let encoded = serialize(&HostValue::Object(obj)).unwrap();
        assert_eq!(encoded, "O:8:\"stdClass\":1:{s:1:\"x\";i:5;}");

        let decoded = unserialize(&encoded).unwrap().as_object().unwrap();
        let decoded = decoded.borrow();
        assert!(decoded.plain_fields().is_some());
        assert_eq!(
            decoded.as_host_object().get_property("x"),
            Ok(Some(HostValue::Integer(5)))
        );
    }

    #[test]
    fn test_hidden_fields_keep_visibility() {
        let obj = ObjectType::new_instance(
            ClassInstance::new("Account")
                .with_field("owner", HostValue::from("ann"), Visibility::Public)
                .with_field("kind", HostValue::from("s"), Visibility::Protected)
                .with_field("balance", HostValue::Integer(10), Visibility::Private),
        );
        let encoded = serialize(&HostValue::Object(obj)).unwrap();
        assert!(encoded.contains("s:7:\"\0*\0kind\";"));
        assert!(encoded.contains("s:16:\"\0Account\0balance\";"));

        let decoded = unserialize(&encoded).unwrap().as_object().unwrap();
        let decoded = decoded.borrow();
        let obj = decoded.as_host_object();
        assert_eq!(obj.class_name(), "Account");
        assert_eq!(obj.visible_fields().len(), 1);
        let fields = obj.all_fields();
        assert_eq!(fields[1].visibility, Visibility::Protected);
        assert_eq!(fields[2].name, "balance");
        assert_eq!(fields[2].visibility, Visibility::Private);
    }

    #[test]
    fn test_registered_class_is_used() {
        let mut classes = ClassRegistry::with_core();
        classes.register("Bag", || ObjectType::Plain(PlainObject::new()));
        let decoded = TextCodec
            .decode("O:3:\"Bag\":0:{}", &classes, DEFAULT_MAX_DEPTH)
            .unwrap();
        assert!(decoded.as_object().unwrap().borrow().plain_fields().is_some());
    }

    #[test]
    fn test_references_encode_their_target() {
        let mut c = KeyedCollection::new();
        c.append(HostValue::new_reference(HostValue::Integer(3)));
        assert_eq!(serialize(&HostValue::from(c)).unwrap(), "a:1:{i:0;i:3;}");
    }

    #[test]
    fn test_malformed_payloads() {
        for payload in &[
            "",
            "i:;",
            "i:12",
            "b:2;",
            "d:abc;",
            "s:3:\"ab\";",
            "a:1:{i:0;}",
            "a:1:{d:0.5;i:1;}",
            "N;N;",
            "x:1;",
            "O:3:\"Bag\":1:{}",
        ] {
            assert!(
                matches!(unserialize(payload), Err(ContainerError::MalformedPayload(_))),
                "payload {:?} should be rejected",
                payload
            );
        }
    }

    #[test]
    fn test_depth_limit_stops_cycles() {
        let obj = ObjectType::new_plain();
        obj.borrow_mut()
            .as_host_object_mut()
            .set_property("me", HostValue::Object(obj.clone()))
            .unwrap();
        assert_eq!(
            TextCodec.encode(&HostValue::Object(obj), 8),
            Err(ContainerError::NestingTooDeep(8))
        );

        assert_eq!(
            TextCodec.decode("a:1:{i:0;a:1:{i:0;a:0:{}}}", &ClassRegistry::with_core(), 1),
            Err(ContainerError::NestingTooDeep(1))
        );
    }

    #[test]
    fn test_special_floats_decode() {
        assert_eq!(unserialize("d:INF;").unwrap(), HostValue::Float(f64::INFINITY));
        assert_eq!(unserialize("d:NAN;").unwrap(), HostValue::Float(f64::NAN));
        assert_eq!(unserialize("d:1e3;").unwrap(), HostValue::Float(1000.0));
    }
}
