//! Host capabilities and how they are configured.
//!
//! A container never reaches out to global state. Everything it needs from the host is held
//! by a [`HostContext`](types::HostContext):
//!
//! ```text
//! HostContext
//! ├── codec        SerializationCodec used by serialize/unserialize
//! ├── classes      ClassRegistry, builds objects named in payloads
//! ├── iterators    IteratorRegistry, builds the iterator named by the container
//! ├── diagnostics  DiagnosticSink receiving recoverable conditions
//! └── max_depth    nesting limit for the codec
//! ```
//!
//! ### Key Components
//!
//! - **[`ClassRegistry`]**: case-insensitive class name to object factory
//! - **[`IteratorRegistry`]**: case-insensitive iterator name to iterator factory
//! - **[`HostConfig`]**: settings read from a small TOML file
//!
//! ## Example: Custom Iterator
//!
//! ```
//! use arrayshim::runner::ds::array_key::ArrayKey;
//! use arrayshim::runner::ds::array_object::{ArrayObject, ContainerFlags};
//! use arrayshim::runner::ds::iterator::{ArrayIterator, HostIterator};
//! use arrayshim::runner::ds::keyed_collection::KeyedCollection;
//! use arrayshim::runner::ds::value::HostValue;
//! use arrayshim::runner::plugin::registry::IteratorRegistry;
//! use arrayshim::runner::plugin::types::HostContext;
//!
//! let mut iterators = IteratorRegistry::with_core();
//! iterators.register("ForwardIterator", |storage| {
//!     Box::new(ArrayIterator::new(storage)) as Box<dyn HostIterator>
//! });
//! let ctx = HostContext::new().with_iterators(iterators).shared();
//!
//! let input = HostValue::from(KeyedCollection::from_values(vec![HostValue::Integer(7)]));
//! let container =
//!     ArrayObject::new_in(ctx, input, ContainerFlags::empty(), Some("ForwardIterator")).unwrap();
//! let keys: Vec<ArrayKey> = container
//!     .get_iterator()
//!     .unwrap()
//!     .into_entries()
//!     .map(|(k, _)| k)
//!     .collect();
//! assert_eq!(keys, vec![ArrayKey::Int(0)]);
//! ```

pub mod config;
pub mod registry;
pub mod types;

pub use config::{DiagnosticsMode, HostConfig};
pub use registry::{ClassRegistry, IteratorRegistry};
pub use types::HostContext;
