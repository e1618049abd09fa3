//! # arrayshim - dual-mode container for a dynamic scripting host
//!
//! A container value that acts both as an ordered keyed collection and as an object with
//! properties:
//! - Indexed access with host-style key normalization (`"5"` and `5` are the same key)
//! - Property access routed to the storage or to a separate overlay, by flag
//! - Collection storage, or object storage through a property accessor
//! - Pluggable iterators, resolved by name
//! - A length-prefixed text codec for `serialize` / `unserialize`
//!
//! ## Quick Start
//!
//! ### Indexed access
//!
//! ```
//! use arrayshim::runner::ds::array_object::{ArrayObject, ContainerFlags};
//! use arrayshim::runner::ds::value::HostValue;
//!
//! let mut container = ArrayObject::new(HostValue::Null, ContainerFlags::empty(), None).unwrap();
//! container.offset_set(&HostValue::from("a"), HostValue::Integer(1)).unwrap();
//! container.append(HostValue::from("tail"));
//!
//! assert_eq!(container.count(), 2);
//! assert_eq!(container.offset_get(&HostValue::from("a")).unwrap(), HostValue::Integer(1));
//! assert!(container.offset_exists(&HostValue::Integer(0)));
//! ```
//!
//! ### Wrapping an object
//!
//! ```
//! use arrayshim::runner::ds::array_object::{ArrayObject, ContainerFlags, StorageMode};
//! use arrayshim::runner::ds::object::{ClassInstance, ObjectType, Visibility};
//! use arrayshim::runner::ds::value::HostValue;
//!
//! let point = ObjectType::new_instance(
//!     ClassInstance::new("Point")
//!         .with_field("x", HostValue::Integer(3), Visibility::Public)
//!         .with_field("secret", HostValue::Integer(0), Visibility::Private),
//! );
//! let container =
//!     ArrayObject::new(HostValue::Object(point), ContainerFlags::ARRAY_AS_PROPS, None).unwrap();
//!
//! assert_eq!(container.storage_mode(), StorageMode::Object);
//! assert_eq!(container.count(), 1);
//! assert_eq!(container.get_property("x").unwrap(), HostValue::Integer(3));
//! ```
//!
//! ### Serialization
//!
//! ```
//! use arrayshim::runner::ds::array_object::{ArrayObject, ContainerFlags};
//! use arrayshim::runner::ds::value::HostValue;
//!
//! let mut container = ArrayObject::new(HostValue::Null, ContainerFlags::empty(), None).unwrap();
//! container.append(HostValue::Integer(1));
//! let payload = container.serialize().unwrap();
//! assert_eq!(payload, "a:4:{i:0;i:0;i:1;a:1:{i:0;i:1;}i:2;a:0:{}i:3;N;}");
//!
//! let restored = ArrayObject::from_payload(container.context().clone(), &payload).unwrap();
//! assert_eq!(restored.count(), 1);
//! ```
//!
//! ## Host Context
//!
//! Containers take every host capability from a shared
//! [`HostContext`](runner::plugin::types::HostContext): the value codec, the class and
//! iterator registries, the diagnostic sink and the codec nesting limit. Recoverable
//! conditions such as reading a missing key go to the diagnostic sink and the operation
//! returns its fallback value; fatal ones are returned as
//! [`ContainerError`](runner::ds::error::ContainerError).
//!
//! ## Architecture
//!
//! - **[`runner::ds`]** - Values, keyed collections, host objects, iterators, the container
//! - **[`runner::plugin`]** - Host context, registries and configuration
//! - **[`runner::std_lib`]** - Text codec, driver registry, observer protocol

#[macro_use]
extern crate lazy_static;

pub mod runner;
